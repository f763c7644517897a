use std::fmt;

/// Catalogue index of a tile.
pub type TileId = u16;

/// Shared reference to a catalogue entry.
pub type Tile = &'static TileDef;

/// What a tile does when the level's sampled tile tick lands on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileTick {
    /// Nothing happens.
    Inert,
    /// With probability `1/one_in`, convert one orthogonal neighbour of kind `into` into this tile.
    Spread {
        /// Tile this one grows over.
        into: TileId,
        /// Inverse probability per tick.
        one_in: u32,
    },
    /// With probability `1/one_in`, advance the tile's data by one stage up to `max_stage`.
    Grow {
        /// Final growth stage.
        max_stage: u16,
        /// Inverse probability per tick.
        one_in: u32,
    },
    /// Data 1 settles into Cloud, data 2 into Ferrosite, with probability 1/4.
    Settle,
}

/// Static description of one tile kind.
#[derive(Debug, PartialEq, Eq)]
pub struct TileDef {
    /// Catalogue index.
    pub id: TileId,
    /// Display name, unique within the catalogue.
    pub name: &'static str,
    /// Whether mobs may be spawned on this tile.
    pub may_spawn: bool,
    /// Whether entities may walk onto this tile.
    pub may_pass: bool,
    /// Light emitted, in tiles.
    pub light_radius: u8,
    /// Behaviour under the sampled tile tick.
    pub tick: TileTick,
}

impl TileDef {
    /// Return `true` for the stair tiles, which structure placement never overwrites.
    pub fn is_stairs(&self) -> bool {
        self.name.to_ascii_lowercase().contains("stairs")
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for TileDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Tile ids by name.
#[allow(missing_docs)]
pub mod ids {
    use super::TileId;

    pub const CONNECTOR: TileId = 0;
    pub const GRASS: TileId = 1;
    pub const DIRT: TileId = 2;
    pub const SAND: TileId = 3;
    pub const WATER: TileId = 4;
    pub const LAVA: TileId = 5;
    pub const ROCK: TileId = 6;
    pub const HARD_ROCK: TileId = 7;
    pub const TREE: TileId = 8;
    pub const FLOWER: TileId = 9;
    pub const SNOW: TileId = 10;
    pub const STAIRS_UP: TileId = 11;
    pub const STAIRS_DOWN: TileId = 12;
    pub const TORCH: TileId = 13;
    pub const FARMLAND: TileId = 14;
    pub const WHEAT: TileId = 15;
    pub const WOOD_PLANKS: TileId = 16;
    pub const STONE_BRICKS: TileId = 17;
    pub const OBSIDIAN: TileId = 18;
    pub const OBSIDIAN_WALL: TileId = 19;
    pub const IRON_ORE: TileId = 20;
    pub const GOLD_ORE: TileId = 21;
    pub const CLOUD: TileId = 22;
    pub const SKY_GRASS: TileId = 23;
    pub const SKY_LAWN: TileId = 24;
    pub const INFINITE_FALL: TileId = 25;
    pub const FERROSITE: TileId = 26;
    pub const CLOUD_CACTUS: TileId = 27;
}

const fn def(
    id: TileId,
    name: &'static str,
    may_spawn: bool,
    may_pass: bool,
    light_radius: u8,
    tick: TileTick,
) -> TileDef {
    TileDef {
        id,
        name,
        may_spawn,
        may_pass,
        light_radius,
        tick,
    }
}

use TileTick::Inert;

/// The tile catalogue, indexed by [`TileId`].
pub static TILES: [TileDef; 28] = [
    def(ids::CONNECTOR, "Connector Tile", false, false, 0, Inert),
    def(ids::GRASS, "Grass", true, true, 0, TileTick::Spread { into: ids::DIRT, one_in: 40 }),
    def(ids::DIRT, "Dirt", true, true, 0, Inert),
    def(ids::SAND, "Sand", true, true, 0, Inert),
    def(ids::WATER, "Water", false, false, 0, Inert),
    def(ids::LAVA, "Lava", false, false, 4, Inert),
    def(ids::ROCK, "Rock", false, false, 0, Inert),
    def(ids::HARD_ROCK, "Hard Rock", false, false, 0, Inert),
    def(ids::TREE, "Tree", false, false, 0, Inert),
    def(ids::FLOWER, "Flower", true, true, 0, Inert),
    def(ids::SNOW, "Snow", true, true, 0, Inert),
    def(ids::STAIRS_UP, "Stairs Up", false, true, 0, Inert),
    def(ids::STAIRS_DOWN, "Stairs Down", false, true, 0, Inert),
    def(ids::TORCH, "Torch", false, true, 5, Inert),
    def(ids::FARMLAND, "Farmland", false, true, 0, Inert),
    def(ids::WHEAT, "Wheat", false, true, 0, TileTick::Grow { max_stage: 50, one_in: 2 }),
    def(ids::WOOD_PLANKS, "Wood Planks", false, true, 0, Inert),
    def(ids::STONE_BRICKS, "Stone Bricks", false, false, 0, Inert),
    def(ids::OBSIDIAN, "Obsidian", true, true, 0, Inert),
    def(ids::OBSIDIAN_WALL, "Obsidian Wall", false, false, 0, Inert),
    def(ids::IRON_ORE, "Iron Ore", false, false, 0, Inert),
    def(ids::GOLD_ORE, "Gold Ore", false, false, 0, Inert),
    def(ids::CLOUD, "Cloud", true, true, 0, Inert),
    def(ids::SKY_GRASS, "Sky Grass", true, true, 0, Inert),
    def(ids::SKY_LAWN, "Sky Lawn", true, true, 0, TileTick::Spread { into: ids::SKY_GRASS, one_in: 40 }),
    def(ids::INFINITE_FALL, "Infinite Fall", false, false, 0, TileTick::Settle),
    def(ids::FERROSITE, "Ferrosite", true, true, 0, Inert),
    def(ids::CLOUD_CACTUS, "Cloud Cactus", false, false, 0, Inert),
];

/// Look up a tile by id; unknown ids resolve to the void sentinel.
pub fn tile(id: TileId) -> Tile {
    TILES.get(usize::from(id)).unwrap_or(&TILES[0])
}

/// The void sentinel returned for out-of-range reads.
pub fn connector() -> Tile {
    &TILES[ids::CONNECTOR as usize]
}

/// Look up a tile by name, ignoring ASCII case.
pub fn by_name(name: &str) -> Option<Tile> {
    TILES.iter().find(|t| t.is_named(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_positions() {
        for (i, t) in TILES.iter().enumerate() {
            assert_eq!(usize::from(t.id), i, "{} is out of place", t.name);
        }
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in TILES.iter().enumerate() {
            for b in &TILES[i + 1..] {
                assert!(!a.is_named(b.name), "duplicate tile name {}", a.name);
            }
        }
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(by_name("grass").map(|t| t.id), Some(ids::GRASS));
        assert_eq!(by_name("STAIRS DOWN").map(|t| t.id), Some(ids::STAIRS_DOWN));
        assert!(by_name("marble").is_none());
    }

    #[test]
    fn unknown_id_is_connector() {
        assert_eq!(tile(9999).name, "Connector Tile");
        assert_eq!(connector().id, ids::CONNECTOR);
    }

    #[test]
    fn stairs_are_reserved() {
        assert!(tile(ids::STAIRS_UP).is_stairs());
        assert!(tile(ids::STAIRS_DOWN).is_stairs());
        assert!(!tile(ids::STONE_BRICKS).is_stairs());
    }

    #[test]
    fn spread_targets_exist() {
        for t in &TILES {
            if let TileTick::Spread { into, one_in } = t.tick {
                assert_ne!(tile(into).id, ids::CONNECTOR);
                assert!(one_in > 0);
            }
        }
    }
}
