use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{Rect, TilePos, to_tile};
use crate::species::{Disposition, Species};

/// Stable numeric identity of an entity, kept across detach, re-attach and saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Eid(pub u32);

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// State carried by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Dungeon keys held.
    pub keys: u32,
    /// Hit points left.
    pub health: i32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self { keys: 0, health: 10 }
    }
}

/// An in-progress random walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walk {
    /// Horizontal step per tick, `-1..=1`.
    pub xa: i32,
    /// Vertical step per tick, `-1..=1`.
    pub ya: i32,
    /// Ticks left before the mob stops.
    pub remaining: u32,
}

/// State carried by a mob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobState {
    /// What kind of creature this is.
    pub species: Species,
    /// Mob level, `1..=5`.
    pub level: u8,
    /// Hit points left; the mob dies at 0.
    pub health: i32,
    /// Ticks lived so far.
    pub age: u32,
    /// Current wander, if any.
    #[serde(default)]
    pub walk: Walk,
}

/// State carried by an ordinary chest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestState {
    /// Name of the loot table rolled when the chest is first opened.
    pub loot_table: Option<String>,
    /// Level passed to the loot roll.
    pub loot_level: i32,
}

/// State carried by a dungeon chest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonChestState {
    /// Whether a key is still needed to open it.
    pub locked: bool,
}

/// State carried by a mob spawner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnerState {
    /// Species released.
    pub species: Species,
    /// Level of the mobs released.
    pub level: u8,
    /// Ticks until the next spawn attempt.
    pub cooldown: u32,
}

/// What an entity is, with the state specific to that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "fields", rename_all = "snake_case")]
pub enum EntityKind {
    /// A player, driven from outside the level tick.
    Player(PlayerState),
    /// A creature.
    Mob(MobState),
    /// A plain storage chest.
    Chest(ChestState),
    /// A locked chest counted by the dungeon level.
    DungeonChest(DungeonChestState),
    /// A block that periodically produces mobs.
    Spawner(SpawnerState),
    /// A light source.
    Lantern,
}

impl EntityKind {
    /// Stable tag used by persistence.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Player(_) => "player",
            Self::Mob(_) => "mob",
            Self::Chest(_) => "chest",
            Self::DungeonChest(_) => "dungeon_chest",
            Self::Spawner(_) => "spawner",
            Self::Lantern => "lantern",
        }
    }

    /// Hitbox half-extents for a freshly created entity of this kind.
    fn radii(&self) -> (i32, i32) {
        match self {
            Self::Player(_) => (4, 3),
            Self::Mob(mob) => (mob.species.info().xr, mob.species.info().yr),
            Self::Chest(_) | Self::DungeonChest(_) | Self::Spawner(_) | Self::Lantern => (3, 3),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mob(mob) => write!(f, "{} (lvl {})", mob.species, mob.level),
            Self::Spawner(sp) => write!(f, "spawner of {}", sp.species),
            Self::DungeonChest(dc) if dc.locked => write!(f, "dungeon chest (locked)"),
            Self::DungeonChest(_) => write!(f, "dungeon chest"),
            other => f.write_str(other.tag()),
        }
    }
}

/// A positioned object on a layer.
///
/// Coordinates are sub-tile units. An entity that no registry owns is
/// flagged `removed` and has no `level`; attaching clears the flag and sets
/// the back-reference to the owning layer's depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Assigned on first attach.
    pub eid: Option<Eid>,
    /// Horizontal position in sub-tile units.
    pub x: i32,
    /// Vertical position in sub-tile units.
    pub y: i32,
    /// Hitbox half-width.
    pub xr: i32,
    /// Hitbox half-height.
    pub yr: i32,
    /// Depth of the owning layer.
    pub level: Option<i32>,
    /// Set once the entity is dead or detached.
    pub removed: bool,
    /// Kind and kind-specific state.
    pub kind: EntityKind,
}

impl Entity {
    /// Create a detached entity at the origin.
    pub fn new(kind: EntityKind) -> Self {
        let (xr, yr) = kind.radii();
        Self {
            eid: None,
            x: 0,
            y: 0,
            xr,
            yr,
            level: None,
            removed: true,
            kind,
        }
    }

    /// A player with default state.
    pub fn player() -> Self {
        Self::new(EntityKind::Player(PlayerState::default()))
    }

    /// A mob at full health.
    pub fn mob(species: Species, level: u8) -> Self {
        Self::new(EntityKind::Mob(MobState {
            species,
            level,
            health: species.info().max_health,
            age: 0,
            walk: Walk::default(),
        }))
    }

    /// A chest that rolls `loot_table` at `loot_level` when opened.
    pub fn chest(loot_table: Option<&str>, loot_level: i32) -> Self {
        Self::new(EntityKind::Chest(ChestState {
            loot_table: loot_table.map(str::to_string),
            loot_level,
        }))
    }

    /// A locked dungeon chest.
    pub fn dungeon_chest() -> Self {
        Self::new(EntityKind::DungeonChest(DungeonChestState { locked: true }))
    }

    /// A spawner block for `species`.
    pub fn spawner(species: Species, level: u8) -> Self {
        Self::new(EntityKind::Spawner(SpawnerState {
            species,
            level,
            cooldown: 0,
        }))
    }

    /// A lantern.
    pub fn lantern() -> Self {
        Self::new(EntityKind::Lantern)
    }

    /// Move to the given sub-tile position.
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Current hitbox.
    pub fn hitbox(&self) -> Rect {
        Rect::center_dims(self.x, self.y, self.xr * 2, self.yr * 2)
    }

    /// Tile under the entity's centre.
    pub fn tile_pos(&self) -> TilePos {
        TilePos::new(to_tile(self.x), to_tile(self.y))
    }

    /// Persistence tag of the kind.
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Whether this is a player.
    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    /// Whether this is a mob.
    pub fn is_mob(&self) -> bool {
        matches!(self.kind, EntityKind::Mob(_))
    }

    /// Species of a mob, `None` for every other kind.
    pub fn species(&self) -> Option<Species> {
        match &self.kind {
            EntityKind::Mob(mob) => Some(mob.species),
            _ => None,
        }
    }

    /// Disposition of a mob's species.
    pub fn disposition(&self) -> Option<Disposition> {
        self.species().map(Species::disposition)
    }

    /// Whether population control may remove this entity.
    pub fn is_evictable(&self) -> bool {
        self.disposition().is_some_and(Disposition::is_evictable)
    }

    /// Whether this entity blocks other solid entities.
    pub fn is_solid(&self) -> bool {
        !matches!(self.disposition(), Some(Disposition::Ambient))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.eid {
            Some(eid) => write!(f, "{} {eid}", self.kind),
            None => write!(f, "{} (unattached)", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entities_start_detached() {
        let e = Entity::mob(Species::Zombie, 2);
        assert!(e.removed);
        assert!(e.level.is_none());
        assert!(e.eid.is_none());
        assert_eq!(e.to_string(), "Zombie (lvl 2) (unattached)");
    }

    #[test]
    fn mob_takes_species_radii_and_health() {
        let golem = Entity::mob(Species::OldGolem, 1);
        assert_eq!((golem.xr, golem.yr), (6, 6));
        match &golem.kind {
            EntityKind::Mob(m) => assert_eq!(m.health, 20),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn hitbox_is_centered() {
        let e = Entity::chest(None, 0).with_position(88, 88);
        assert_eq!(e.hitbox(), Rect::new(85, 85, 91, 91));
        assert_eq!(e.tile_pos(), TilePos::new(5, 5));
    }

    #[test]
    fn tags_are_stable() {
        assert_eq!(Entity::player().tag(), "player");
        assert_eq!(Entity::mob(Species::Cow, 1).tag(), "mob");
        assert_eq!(Entity::chest(Some("villagehouse"), 1).tag(), "chest");
        assert_eq!(Entity::dungeon_chest().tag(), "dungeon_chest");
        assert_eq!(Entity::spawner(Species::Slime, 1).tag(), "spawner");
        assert_eq!(Entity::lantern().tag(), "lantern");
    }

    #[test]
    fn eviction_protection() {
        assert!(Entity::mob(Species::Zombie, 1).is_evictable());
        assert!(!Entity::mob(Species::Librarian, 1).is_evictable());
        assert!(!Entity::player().is_evictable());
        assert!(!Entity::dungeon_chest().is_evictable());
    }

    #[test]
    fn fireflies_are_not_solid() {
        assert!(!Entity::mob(Species::Firefly, 1).is_solid());
        assert!(Entity::lantern().is_solid());
    }

    #[test]
    fn kind_serializes_with_tag_and_fields() {
        let kind = Entity::spawner(Species::Skeleton, 3).kind;
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["tag"], "spawner");
        assert_eq!(json["fields"]["species"], "skeleton");
        let back: EntityKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, kind);
    }
}
