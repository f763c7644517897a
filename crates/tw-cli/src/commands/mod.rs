pub mod inspect;
pub mod simulate;
pub mod tiles;

use comfy_table::{ContentArrangement, Table};
use tw_simulation::Level;

/// Per-level summary table. The level at `current` is starred.
fn level_table<'a>(levels: impl Iterator<Item = &'a Level>, current: Option<i32>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Level", "Depth", "Entities", "Mobs", "Cap", "Chests"]);

    for level in levels {
        let name = if current == Some(level.depth()) {
            format!("{} *", level.name())
        } else {
            level.name().to_string()
        };
        table.add_row(vec![
            name,
            level.depth().to_string(),
            level.registry().len().to_string(),
            level.mob_count().to_string(),
            level.max_mob_count().to_string(),
            level.chest_count().to_string(),
        ]);
    }
    table
}
