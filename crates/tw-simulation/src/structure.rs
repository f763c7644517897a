use tw_core::grid::TileGrid;
use tw_core::tile::{self, TileId};

use crate::error::{SimError, SimResult};

/// Layout characters and the tiles they stand for. `.` leaves a cell untouched.
pub const LEGEND: &[(char, &str)] = &[
    ('W', "Obsidian Wall"),
    ('O', "Obsidian"),
    ('B', "Stone Bricks"),
    ('P', "Wood Planks"),
    ('D', "Dirt"),
    ('G', "Grass"),
    ('F', "Farmland"),
    ('H', "Wheat"),
    ('T', "Torch"),
    ('C', "Cloud"),
    ('S', "Sky Grass"),
    ('L', "Sky Lawn"),
];

/// One stamped cell, relative to the footprint centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Horizontal offset from the centre.
    pub dx: i32,
    /// Vertical offset from the centre.
    pub dy: i32,
    /// Tile stamped at the cell.
    pub tile: TileId,
}

/// A fixed tile footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    name: String,
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Structure {
    /// Parse an ASCII layout. Every row must have the same length and use legend characters.
    pub fn parse(name: &str, rows: &[&str]) -> SimResult<Self> {
        let invalid = |reason: String| SimError::InvalidStructure {
            name: name.to_string(),
            reason,
        };
        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 {
            return Err(invalid("layout is empty".into()));
        }
        let (w, h) = (width as i32, rows.len() as i32);
        let mut cells = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(invalid(format!("row {row} is not {width} wide")));
            }
            for (col, ch) in line.chars().enumerate() {
                if ch == '.' {
                    continue;
                }
                let tile = LEGEND
                    .iter()
                    .find(|(c, _)| *c == ch)
                    .and_then(|(_, name)| tile::by_name(name))
                    .ok_or_else(|| invalid(format!("unknown layout character '{ch}'")))?;
                cells.push(Cell {
                    dx: col as i32 - w / 2,
                    dy: row as i32 - h / 2,
                    tile: tile.id,
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            width: w,
            height: h,
            cells,
        })
    }

    /// Name used in errors and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Footprint width in tiles.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Footprint height in tiles.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Every non-blank cell.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Stamp the footprint centred on `(x, y)`. Cells outside the grid are dropped.
    pub fn draw(&self, grid: &mut TileGrid, x: i32, y: i32) {
        for cell in &self.cells {
            grid.set_tile(x + cell.dx, y + cell.dy, tile::tile(cell.tile));
        }
    }

    /// Whether the footprint centred on `(x, y)` stays inside the grid and
    /// overwrites no stairs.
    pub fn fits(&self, grid: &TileGrid, x: i32, y: i32) -> bool {
        self.cells.iter().all(|c| {
            let (cx, cy) = (x + c.dx, y + c.dy);
            grid.in_bounds(cx, cy) && !grid.tile(cx, cy).is_stairs()
        })
    }
}

const DUNGEON_GATE: &[&str] = &[
    "WWWOWWW",
    "WOOOOOW",
    "WOOOOOW",
    "OOOOOOO",
    "WOOOOOW",
    "WOOOOOW",
    "WWWOWWW",
];

const SKY_DUNGEON: &[&str] = &[
    "CCCCCCC",
    "CBBBBBC",
    "CBPPPBC",
    "CBPPPBC",
    "CBPPPBC",
    "CBBPBBC",
    "CCCCCCC",
];

const MOB_DUNGEON_CENTER: &[&str] = &[
    "BBBBB",
    "BPPPB",
    "BPPPB",
    "BPPPB",
    "BBBBB",
];

const MOB_DUNGEON_VERTICAL: &[&str] = &["BPB", "BPB", "BPB", "BPB", "BPB"];

const MOB_DUNGEON_HORIZONTAL: &[&str] = &["BBBBB", "PPPPP", "BBBBB"];

const VILLAGE: &[&str] = &[
    ".......D..BBBBB",
    ".......D..BPPPB",
    ".......D..BPPPB",
    ".......D..BPPPB",
    ".......D..BBPBB",
    ".......D....D..",
    "......PPP...D..",
    "DDDDDDPPPDDDDDD",
    "..D...PPP......",
    "BBPBB..D.......",
    "BPPPB..D.......",
    "BPPPB..D.......",
    "BPPPB..D.......",
    "BBBBB..D.......",
    ".......D.......",
];

const VILLAGE_CROPS: &[&str] = &[
    ".......D..BBBBB",
    ".HHHHH.D..BPPPB",
    ".HHHHH.D..BPPPB",
    ".HHHHH.D..BPPPB",
    ".HHHHH.D..BBPBB",
    ".HHHHH.D....D..",
    "......PPP...D..",
    "DDDDDDPPPDDDDDD",
    "..D...PPP......",
    "BBPBB..D.HHHHH.",
    "BPPPB..D.HHHHH.",
    "BPPPB..D.HHHHH.",
    "BPPPB..D.HHHHH.",
    "BBBBB..D.HHHHH.",
    ".......D.......",
];

/// Every footprint the generators use.
#[derive(Debug, Clone)]
pub struct StructureCatalogue {
    /// Stairs down into the dungeon.
    pub dungeon_gate: Structure,
    /// Sky temple holding the boss.
    pub sky_dungeon: Structure,
    /// Spawner dungeon core.
    pub mob_dungeon_center: Structure,
    /// North spawner wing.
    pub mob_dungeon_north: Structure,
    /// South spawner wing.
    pub mob_dungeon_south: Structure,
    /// East spawner wing.
    pub mob_dungeon_east: Structure,
    /// West spawner wing.
    pub mob_dungeon_west: Structure,
    /// Village houses.
    pub village: Structure,
    /// Village fields.
    pub village_crops: Structure,
}

impl StructureCatalogue {
    /// Parse the built-in footprints.
    pub fn standard() -> SimResult<Self> {
        Ok(Self {
            dungeon_gate: Structure::parse("dungeon gate", DUNGEON_GATE)?,
            sky_dungeon: Structure::parse("sky dungeon", SKY_DUNGEON)?,
            mob_dungeon_center: Structure::parse("mob dungeon", MOB_DUNGEON_CENTER)?,
            mob_dungeon_north: Structure::parse("mob dungeon north wing", MOB_DUNGEON_VERTICAL)?,
            mob_dungeon_south: Structure::parse("mob dungeon south wing", MOB_DUNGEON_VERTICAL)?,
            mob_dungeon_east: Structure::parse("mob dungeon east wing", MOB_DUNGEON_HORIZONTAL)?,
            mob_dungeon_west: Structure::parse("mob dungeon west wing", MOB_DUNGEON_HORIZONTAL)?,
            village: Structure::parse("village", VILLAGE)?,
            village_crops: Structure::parse("village with crops", VILLAGE_CROPS)?,
        })
    }
}
