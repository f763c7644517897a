use comfy_table::{ContentArrangement, Table};
use tw_core::tile::{TILES, TileTick};

pub fn run() -> Result<(), String> {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Spawn", "Pass", "Light", "Tick"]);

    for def in &TILES {
        let tick = match def.tick {
            TileTick::Inert => "-".to_string(),
            TileTick::Spread { into, one_in } => {
                format!("spreads over {} (1/{one_in})", tw_core::tile::tile(into).name)
            }
            TileTick::Grow { max_stage, one_in } => format!("grows to {max_stage} (1/{one_in})"),
            TileTick::Settle => "settles".to_string(),
        };
        table.add_row(vec![
            def.id.to_string(),
            def.name.to_string(),
            yes_no(def.may_spawn).to_string(),
            yes_no(def.may_pass).to_string(),
            def.light_radius.to_string(),
            tick,
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} tiles", TILES.len());
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
