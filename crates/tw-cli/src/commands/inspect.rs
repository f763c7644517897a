use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use tw_core::tile;
use tw_simulation::{EidSource, EntityFactory, Level, LevelSnapshot};

pub fn run(file: &Path) -> Result<(), String> {
    let json = fs::read_to_string(file).map_err(|e| format!("cannot read {}: {e}", file.display()))?;
    let snapshot = LevelSnapshot::from_json(&json).map_err(|e| e.to_string())?;

    let mut tags: BTreeMap<String, usize> = BTreeMap::new();
    for record in &snapshot.entities {
        *tags.entry(record.tag.clone()).or_default() += 1;
    }

    let mut level =
        Level::from_snapshot(snapshot, &EntityFactory::standard(), EidSource::new()).map_err(|e| e.to_string())?;
    level.registry_mut().resolve_pending_adds();

    let grid = level.grid();
    println!(
        "  {} {}",
        level.name().bold(),
        format!(
            "(depth {}, {}x{}, seed={})",
            level.depth(),
            grid.width(),
            grid.height(),
            grid.seed()
        )
        .dimmed()
    );
    println!(
        "  {} entities, {} locked dungeon chests",
        level.registry().len(),
        level.chest_count()
    );
    println!();

    if !tags.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Entity", "Count"]);
        for (tag, count) in &tags {
            table.add_row(vec![tag.clone(), count.to_string()]);
        }
        println!("{table}");
        println!();
    }

    let mut tiles: BTreeMap<u16, usize> = BTreeMap::new();
    for &id in grid.tile_ids() {
        *tiles.entry(id).or_default() += 1;
    }
    let mut ranked: Vec<_> = tiles.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let cells = grid.tile_ids().len().max(1);
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Tile", "Cells", "Share"]);
    for (id, count) in ranked {
        table.add_row(vec![
            tile::tile(id).name.to_string(),
            count.to_string(),
            format!("{:.1}%", count as f64 * 100.0 / cells as f64),
        ]);
    }
    println!("{table}");

    Ok(())
}
