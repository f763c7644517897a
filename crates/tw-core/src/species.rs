use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::tile::{Tile, TileId, ids};

/// How a species relates to players and to population control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// Attacks players; filtered out under Peaceful.
    Hostile,
    /// Wanders; spawned in daylight.
    Passive,
    /// Decorative; spawned on calm nights.
    Ambient,
    /// Lives in villages; never evicted.
    Villager,
    /// Unique level guardian; never evicted.
    Boss,
}

impl Disposition {
    /// Whether population control may remove a mob of this disposition.
    pub fn is_evictable(self) -> bool {
        matches!(self, Self::Hostile | Self::Passive | Self::Ambient)
    }

    /// Whether Peaceful difficulty suppresses this disposition.
    pub fn is_hostile(self) -> bool {
        matches!(self, Self::Hostile | Self::Boss)
    }

    /// Whether spawn checks skip the minimum player distance.
    pub fn ignores_player_distance(self) -> bool {
        matches!(self, Self::Passive | Self::Ambient)
    }
}

/// Tiles a species may be spawned on, on top of the tile's own `may_spawn` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnGround {
    /// Any tile that allows spawning.
    Any,
    /// Only the listed tiles.
    Only(&'static [TileId]),
}

/// Start-position constraints for one species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnProfile {
    /// Minimum distance to the closest player, in sub-tile units.
    pub player_distance: i32,
    /// Base solo radius; multiplied by the level's monster density.
    pub solo_radius: i32,
    /// Allowed ground.
    pub ground: SpawnGround,
}

impl SpawnProfile {
    /// Return `true` if a mob of this profile may appear on the tile.
    pub fn allows(&self, t: Tile) -> bool {
        t.may_spawn
            && match self.ground {
                SpawnGround::Any => true,
                SpawnGround::Only(list) => list.contains(&t.id),
            }
    }
}

/// Static data for one species.
#[derive(Debug)]
pub struct SpeciesInfo {
    /// Species this entry describes.
    pub species: Species,
    /// Display name.
    pub name: &'static str,
    /// Relation to players and population control.
    pub disposition: Disposition,
    /// Hitbox half-width in sub-tile units.
    pub xr: i32,
    /// Hitbox half-height in sub-tile units.
    pub yr: i32,
    /// Hit points at spawn.
    pub max_health: i32,
    /// Ticks before the mob despawns on its own; 0 means never.
    pub lifetime: u32,
    /// A new random walk starts with probability `1/walk_chance` per idle tick.
    pub walk_chance: u32,
    /// Ticks a random walk lasts.
    pub walk_duration: u32,
    /// Sub-tile units moved per tick.
    pub speed: i32,
    /// Light emitted, in tiles.
    pub light_radius: u8,
    /// Where and how the species spawns.
    pub spawn: SpawnProfile,
}

/// Every creature the world can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Species {
    Zombie,
    Skeleton,
    Creeper,
    Slime,
    OldGolem,
    Snake,
    Knight,
    Cow,
    Chicken,
    Pig,
    Sheep,
    GuiMan,
    Goat,
    Firefly,
    Phyg,
    Sheepuff,
    Cleric,
    Librarian,
    AirWizard,
}

const PASTURE: &[TileId] = &[ids::GRASS, ids::FLOWER];
const FROST: &[TileId] = &[ids::SNOW];
const SKY: &[TileId] = &[ids::SKY_GRASS, ids::SKY_LAWN, ids::CLOUD];

const HOSTILE: SpawnProfile = SpawnProfile {
    player_distance: 60,
    solo_radius: 13,
    ground: SpawnGround::Any,
};
const PASSIVE: SpawnProfile = SpawnProfile {
    player_distance: 80,
    solo_radius: 15,
    ground: SpawnGround::Only(PASTURE),
};
const FROST_PASSIVE: SpawnProfile = SpawnProfile {
    ground: SpawnGround::Only(FROST),
    ..PASSIVE
};
const SKY_PASSIVE: SpawnProfile = SpawnProfile {
    ground: SpawnGround::Only(SKY),
    ..PASSIVE
};
const AMBIENT: SpawnProfile = SpawnProfile {
    player_distance: 80,
    solo_radius: 10,
    ground: SpawnGround::Only(PASTURE),
};
const RESIDENT: SpawnProfile = SpawnProfile {
    player_distance: 0,
    solo_radius: 0,
    ground: SpawnGround::Any,
};

const fn info(
    species: Species,
    name: &'static str,
    disposition: Disposition,
    (xr, yr): (i32, i32),
    max_health: i32,
    lifetime: u32,
    spawn: SpawnProfile,
) -> SpeciesInfo {
    let (walk_chance, walk_duration, speed, light_radius) = match disposition {
        Disposition::Hostile => (40, 60, 1, 0),
        Disposition::Passive => (80, 40, 1, 0),
        Disposition::Ambient => (10, 20, 1, 1),
        Disposition::Villager => (120, 30, 1, 0),
        Disposition::Boss => (30, 50, 2, 0),
    };
    SpeciesInfo {
        species,
        name,
        disposition,
        xr,
        yr,
        max_health,
        lifetime,
        walk_chance,
        walk_duration,
        speed,
        light_radius,
        spawn,
    }
}

use Disposition::{Ambient, Boss, Hostile, Passive, Villager};

const ENEMY_LIFE: u32 = 7_200;
const PASSIVE_LIFE: u32 = 18_000;

static INFO: [SpeciesInfo; 19] = [
    info(Species::Zombie, "Zombie", Hostile, (4, 3), 5, ENEMY_LIFE, HOSTILE),
    info(Species::Skeleton, "Skeleton", Hostile, (4, 3), 6, ENEMY_LIFE, HOSTILE),
    info(Species::Creeper, "Creeper", Hostile, (4, 3), 10, ENEMY_LIFE, HOSTILE),
    info(Species::Slime, "Slime", Hostile, (4, 3), 1, ENEMY_LIFE, HOSTILE),
    info(Species::OldGolem, "Old Golem", Hostile, (6, 6), 20, ENEMY_LIFE, HOSTILE),
    info(Species::Snake, "Snake", Hostile, (4, 3), 3, ENEMY_LIFE, HOSTILE),
    info(Species::Knight, "Knight", Hostile, (4, 3), 9, ENEMY_LIFE, HOSTILE),
    info(Species::Cow, "Cow", Passive, (4, 3), 10, PASSIVE_LIFE, PASSIVE),
    info(Species::Chicken, "Chicken", Passive, (3, 3), 4, PASSIVE_LIFE, PASSIVE),
    info(Species::Pig, "Pig", Passive, (4, 3), 10, PASSIVE_LIFE, PASSIVE),
    info(Species::Sheep, "Sheep", Passive, (4, 3), 10, PASSIVE_LIFE, PASSIVE),
    info(Species::GuiMan, "Gui Man", Passive, (4, 3), 10, PASSIVE_LIFE, FROST_PASSIVE),
    info(Species::Goat, "Goat", Passive, (4, 3), 10, PASSIVE_LIFE, FROST_PASSIVE),
    info(Species::Firefly, "Firefly", Ambient, (2, 2), 1, 3_600, AMBIENT),
    info(Species::Phyg, "Phyg", Passive, (4, 3), 10, PASSIVE_LIFE, SKY_PASSIVE),
    info(Species::Sheepuff, "Sheepuff", Passive, (4, 3), 10, PASSIVE_LIFE, SKY_PASSIVE),
    info(Species::Cleric, "Cleric", Villager, (4, 3), 10, 0, RESIDENT),
    info(Species::Librarian, "Librarian", Villager, (4, 3), 10, 0, RESIDENT),
    info(Species::AirWizard, "Air Wizard", Boss, (4, 3), 2_000, 0, RESIDENT),
];

impl Species {
    /// Every species in catalogue order.
    pub const ALL: [Species; 19] = [
        Species::Zombie,
        Species::Skeleton,
        Species::Creeper,
        Species::Slime,
        Species::OldGolem,
        Species::Snake,
        Species::Knight,
        Species::Cow,
        Species::Chicken,
        Species::Pig,
        Species::Sheep,
        Species::GuiMan,
        Species::Goat,
        Species::Firefly,
        Species::Phyg,
        Species::Sheepuff,
        Species::Cleric,
        Species::Librarian,
        Species::AirWizard,
    ];

    /// Static data for this species.
    pub fn info(self) -> &'static SpeciesInfo {
        &INFO[self as usize]
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Relation to players and population control.
    pub fn disposition(self) -> Disposition {
        self.info().disposition
    }

    /// Look up a species by display name, ignoring ASCII case.
    pub fn by_name(name: &str) -> Option<Species> {
        INFO.iter()
            .find(|i| i.name.eq_ignore_ascii_case(name))
            .map(|i| i.species)
    }
}

impl FromStr for Species {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Species::by_name(s).ok_or_else(|| CoreError::UnknownSpecies(s.to_string()))
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
