use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tw_core::entity::{Eid, Entity, EntityKind};
use tw_core::grid::TileGrid;
use tw_core::tile::TileId;

use crate::error::{SimError, SimResult};
use crate::level::Level;
use crate::registry::EidSource;

/// One saved entity: its kind tag, identity, position and kind-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Persistence tag of the entity kind.
    pub tag: String,
    /// Identity of the entity.
    pub eid: Eid,
    /// Horizontal position in sub-tile units.
    pub x: i32,
    /// Vertical position in sub-tile units.
    pub y: i32,
    /// Kind-specific state.
    #[serde(default)]
    pub fields: Value,
}

impl EntityRecord {
    /// Record an attached entity.
    pub fn capture(entity: &Entity) -> SimResult<Self> {
        let eid = entity
            .eid
            .ok_or_else(|| SimError::InvalidSnapshot(format!("{} has no identity", entity.tag())))?;
        let fields = match serde_json::to_value(&entity.kind)? {
            Value::Object(mut map) => map.remove("fields").unwrap_or(Value::Null),
            _ => Value::Null,
        };
        Ok(Self {
            tag: entity.tag().to_string(),
            eid,
            x: entity.x,
            y: entity.y,
            fields,
        })
    }

    /// Deserialize the kind-specific fields.
    pub fn fields<T: DeserializeOwned>(&self) -> SimResult<T> {
        Ok(serde_json::from_value(self.fields.clone())?)
    }
}

/// Saved state of one level.
///
/// `tiles` and `data` are the grid's raw arrays, row-major, `width * height` long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    /// Depth of the level.
    pub depth: i32,
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
    /// Seed the level was generated from.
    pub seed: u64,
    /// Locked dungeon chests left.
    pub chest_count: u32,
    /// Tile ids, row-major.
    pub tiles: Vec<TileId>,
    /// Per-tile data, row-major.
    pub data: Vec<u16>,
    /// Every saveable entity.
    pub entities: Vec<EntityRecord>,
}

impl LevelSnapshot {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builds an entity's kind from a record.
pub type EntityCtor = fn(&EntityRecord) -> SimResult<EntityKind>;

/// Tag-keyed constructors used when loading entities.
#[derive(Clone, Default)]
pub struct EntityFactory {
    ctors: HashMap<String, EntityCtor>,
}

impl fmt::Debug for EntityFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.ctors.keys().collect();
        tags.sort();
        f.debug_struct("EntityFactory").field("tags", &tags).finish()
    }
}

impl EntityFactory {
    /// A factory knowing no tags.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A factory for every built-in entity kind.
    pub fn standard() -> Self {
        Self::empty()
            .with("player", |r| Ok(EntityKind::Player(r.fields()?)))
            .with("mob", |r| Ok(EntityKind::Mob(r.fields()?)))
            .with("chest", |r| Ok(EntityKind::Chest(r.fields()?)))
            .with("dungeon_chest", |r| Ok(EntityKind::DungeonChest(r.fields()?)))
            .with("spawner", |r| Ok(EntityKind::Spawner(r.fields()?)))
            .with("lantern", |_| Ok(EntityKind::Lantern))
    }

    /// Register or replace the constructor for `tag`.
    pub fn register(&mut self, tag: &str, ctor: EntityCtor) {
        self.ctors.insert(tag.to_string(), ctor);
    }

    /// Register a constructor for `tag`, replacing any earlier one.
    pub fn with(mut self, tag: &str, ctor: EntityCtor) -> Self {
        self.register(tag, ctor);
        self
    }

    /// Whether a constructor is registered for `tag`.
    pub fn knows(&self, tag: &str) -> bool {
        self.ctors.contains_key(tag)
    }

    /// Rebuild a detached entity from its record.
    pub fn build(&self, record: &EntityRecord) -> SimResult<Entity> {
        let ctor = self.ctors.get(&record.tag).ok_or_else(|| SimError::UnknownEntityTag {
            tag: record.tag.clone(),
            eid: record.eid,
        })?;
        let mut entity = Entity::new(ctor(record)?).with_position(record.x, record.y);
        entity.eid = Some(record.eid);
        Ok(entity)
    }
}

impl Level {
    /// Capture tiles, counters and every entity a save should keep.
    pub fn to_snapshot(&self) -> SimResult<LevelSnapshot> {
        let entities = self
            .registry
            .entities_to_save()
            .into_iter()
            .map(EntityRecord::capture)
            .collect::<SimResult<Vec<_>>>()?;
        Ok(LevelSnapshot {
            depth: self.depth,
            width: self.grid.width(),
            height: self.grid.height(),
            seed: self.grid.seed(),
            chest_count: self.chest_count,
            tiles: self.grid.tile_ids().to_vec(),
            data: self.grid.tile_data().to_vec(),
            entities,
        })
    }

    /// Rebuild a level from a snapshot.
    ///
    /// Entities are re-inserted with `add` and join the active set at the
    /// next resolution point.
    pub fn from_snapshot(snapshot: LevelSnapshot, factory: &EntityFactory, eids: EidSource) -> SimResult<Self> {
        let LevelSnapshot {
            depth,
            width,
            height,
            seed,
            chest_count,
            tiles,
            data,
            entities,
        } = snapshot;
        let grid = TileGrid::from_raw(width, height, depth, seed, tiles, data)?;
        for record in &entities {
            eids.observe(record.eid);
        }
        let mut level = Level::from_grid(grid, eids);
        level.chest_count = chest_count;
        for record in &entities {
            let entity = factory.build(record)?;
            level.registry.add(entity);
        }
        debug!("restored depth {depth} with {} entities", entities.len());
        level.publish(0);
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tw_core::entity::MobState;
    use tw_core::species::Species;
    use tw_core::tile::{self, ids};

    fn sample_level() -> Level {
        let mut grid = TileGrid::filled(20, 20, -4, 99, tile::tile(ids::OBSIDIAN)).unwrap();
        grid.set_tile_with_data(3, 4, tile::tile(ids::WHEAT), 17);
        let mut level = Level::from_grid(grid, EidSource::new());
        level.set_chest_count(1);
        level.registry_mut().add_at_tile(Entity::dungeon_chest(), 5, 5);
        level.registry_mut().add_at_tile(Entity::mob(Species::Knight, 3), 8, 8);
        level.registry_mut().add_at_tile(Entity::lantern(), 2, 2);
        level
    }

    #[test]
    fn records_carry_kind_fields() {
        let mut mob = Entity::mob(Species::Snake, 2).with_position(40, 56);
        mob.eid = Some(Eid(7));
        let record = EntityRecord::capture(&mob).unwrap();
        assert_eq!(record.tag, "mob");
        assert_eq!(record.eid, Eid(7));
        let state: MobState = record.fields().unwrap();
        assert_eq!(state.species, Species::Snake);
        assert_eq!(state.level, 2);
    }

    #[test]
    fn detached_entities_cannot_be_recorded() {
        let err = EntityRecord::capture(&Entity::lantern()).unwrap_err();
        assert!(matches!(err, SimError::InvalidSnapshot(_)));
    }

    #[test]
    fn snapshot_restores_tiles_and_entities() {
        let level = sample_level();
        let json = level.to_snapshot().unwrap().to_json().unwrap();
        let snapshot = LevelSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot.entities.len(), 3);

        let eids = EidSource::new();
        let mut restored = Level::from_snapshot(snapshot, &EntityFactory::standard(), eids.clone()).unwrap();
        assert_eq!(restored.grid().tile(3, 4).id, ids::WHEAT);
        assert_eq!(restored.grid().data(3, 4), 17);
        assert_eq!(restored.chest_count(), 1);
        assert_eq!(restored.registry().len(), 0);
        restored.registry_mut().resolve_pending_adds();
        assert_eq!(restored.registry().len(), 3);

        let original: Vec<_> = level
            .registry()
            .entities_to_save()
            .into_iter()
            .map(|e| (e.eid, e.x, e.y, e.kind.clone()))
            .collect();
        let mut back: Vec<_> = restored
            .registry()
            .iter()
            .map(|(_, e)| (e.eid, e.x, e.y, e.kind.clone()))
            .collect();
        back.sort_by_key(|(eid, ..)| *eid);
        assert_eq!(back, original);
        // Fresh identities never collide with restored ones.
        assert!(eids.next_eid() > Eid(3));
    }

    #[test]
    fn duplicate_identities_in_a_snapshot_are_split() {
        let mut snapshot = sample_level().to_snapshot().unwrap();
        let dup = snapshot.entities[0].eid;
        snapshot.entities[1].eid = dup;
        let mut restored = Level::from_snapshot(snapshot, &EntityFactory::standard(), EidSource::new()).unwrap();
        restored.registry_mut().resolve_pending_adds();

        let mut eids: Vec<_> = restored.registry().iter().filter_map(|(_, e)| e.eid).collect();
        eids.sort();
        eids.dedup();
        assert_eq!(eids.len(), 3);
        assert!(eids.contains(&dup));
        assert_eq!(eids.last(), Some(&Eid(4)));
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let mut snapshot = sample_level().to_snapshot().unwrap();
        snapshot.entities[0].tag = "boat".into();
        let err = Level::from_snapshot(snapshot, &EntityFactory::standard(), EidSource::new()).unwrap_err();
        assert!(matches!(err, SimError::UnknownEntityTag { ref tag, .. } if tag == "boat"));
    }

    #[test]
    fn custom_tags_can_be_registered() {
        let factory = EntityFactory::empty().with("crate", |_| Ok(EntityKind::Lantern));
        assert!(factory.knows("crate"));
        assert!(!factory.knows("mob"));
        let record = EntityRecord {
            tag: "crate".into(),
            eid: Eid(1),
            x: 24,
            y: 24,
            fields: Value::Null,
        };
        let entity = factory.build(&record).unwrap();
        assert_eq!(entity.eid, Some(Eid(1)));
        assert_eq!((entity.x, entity.y), (24, 24));
    }

    #[test]
    fn mismatched_arrays_are_rejected() {
        let mut snapshot = sample_level().to_snapshot().unwrap();
        snapshot.data.pop();
        let err = Level::from_snapshot(snapshot, &EntityFactory::standard(), EidSource::new()).unwrap_err();
        assert!(matches!(err, SimError::Core(_)));
    }
}
