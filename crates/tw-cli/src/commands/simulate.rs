use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use log::info;
use tw_simulation::settings::SIZE_KEY;
use tw_simulation::{Difficulty, MapSettings, SimEventKind, TerrainBuilder, World, WorldConfig};

/// Arguments of `tw simulate`.
pub struct Options {
    pub ticks: u64,
    pub seed: u64,
    pub size: Option<i32>,
    pub difficulty: String,
    pub depth: i32,
    pub save: Option<PathBuf>,
    pub verbose: bool,
}

pub fn run(opts: &Options) -> Result<(), String> {
    let difficulty: Difficulty = opts.difficulty.parse().map_err(|e| format!("{e}"))?;
    let mut settings = MapSettings::new().with_difficulty(difficulty);
    if let Some(size) = opts.size {
        settings.set(SIZE_KEY, i64::from(size));
    }
    let config = WorldConfig::default().with_seed(opts.seed).with_max_events(2_000);

    let mut world = World::generate(config, Box::new(settings), &TerrainBuilder::default())
        .map_err(|e| format!("world generation failed: {e}"))?;
    world.travel(opts.depth).map_err(|e| e.to_string())?;
    let summary = world
        .run(opts.ticks)
        .map_err(|e| format!("simulation error: {e}"))?;
    info!("ran {} ticks", summary.ticks);

    // Header
    let size = world.current_level().map_or(0, |l| l.grid().width());
    println!(
        "  {} {}",
        "Simulation".bold(),
        format!(
            "({} ticks, seed={}, size={size}, difficulty={difficulty})",
            opts.ticks, opts.seed
        )
        .dimmed()
    );
    println!(
        "  {} spawned, {} evicted, {} removed, {} events logged",
        summary.spawned,
        summary.evicted,
        summary.removed,
        world.events().len()
    );
    println!("  Time of day: {}", world.clock().time_of_day());
    println!();

    // Events
    if opts.verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in world.events().events() {
            let tick_label = format!("[tick {:>4}]", event.tick).dimmed();
            let desc = colorize_event(&event.kind, &event.description);
            println!("  {tick_label} {desc}");
        }
        if world.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    } else {
        print_notable(&world);
    }

    println!("  {}", "Levels".bold().underline());
    println!();
    println!(
        "{}",
        super::level_table(world.levels().rev(), Some(world.current_depth()))
    );
    println!();

    if let Some(path) = &opts.save {
        let depth = world.current_depth();
        let json = world
            .snapshot(depth)
            .and_then(|s| s.to_json())
            .map_err(|e| format!("cannot snapshot depth {depth}: {e}"))?;
        fs::write(path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
        println!("  Saved depth {depth} to {}", path.display());
    }

    Ok(())
}

/// Counts per event label, then the events worth reading one by one.
fn print_notable(world: &World) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in world.events().events() {
        *counts.entry(event.kind.label()).or_default() += 1;
    }
    let notable: Vec<_> = world
        .events()
        .events()
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                SimEventKind::EvictionStall { .. }
                    | SimEventKind::EntityFault { .. }
                    | SimEventKind::PlacementFailed { .. }
                    | SimEventKind::DungeonCleared { .. }
            )
        })
        .collect();

    if counts.is_empty() {
        return;
    }
    println!("  {}", "Events".bold().underline());
    for (label, count) in &counts {
        println!("  {count:>6}  {label}");
    }
    println!();
    if !notable.is_empty() {
        println!("  {}", "Notable Events".bold().underline());
        for event in &notable {
            let tag = match event.kind {
                SimEventKind::EntityFault { .. } => "FAULT".red().bold(),
                SimEventKind::DungeonCleared { .. } => "CLEAR".green().bold(),
                _ => " WARN".yellow().bold(),
            };
            println!("  {tag}  {}", event.description);
        }
        println!();
    }
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::EntityDied { .. } | SimEventKind::EntityFault { .. } => description.red().bold(),
        SimEventKind::EvictionStall { .. } | SimEventKind::PlacementFailed { .. } => description.yellow(),
        SimEventKind::Evicted { .. } => description.red(),
        SimEventKind::Spawned { .. } => description.green(),
        SimEventKind::ChestUnlocked { .. } | SimEventKind::DungeonCleared { .. } => description.cyan(),
        SimEventKind::LevelChanged { .. } => description.blue(),
        SimEventKind::LevelGenerated { .. }
        | SimEventKind::StructurePlaced { .. }
        | SimEventKind::AmbientCue { .. }
        | SimEventKind::Custom { .. } => description.normal(),
    }
}
