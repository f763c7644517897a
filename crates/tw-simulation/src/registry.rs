use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use log::{trace, warn};
use slotmap::{SlotMap, new_key_type};
use tw_core::entity::{Eid, Entity};
use tw_core::geom::{Rect, tile_center};

use crate::error::SimError;

new_key_type! {
    /// Generational handle to an entity slot on one layer.
    pub struct EntityId;
}

/// Horizontal half-width of the window in which a player protects mobs from eviction.
pub const NEAR_PLAYER_X: i32 = 128;
/// Vertical half-height of the same window.
pub const NEAR_PLAYER_Y: i32 = 76;

/// Shared counter handing out entity identities.
///
/// Every layer of a world holds a clone, so identities stay unique when an
/// entity moves between layers.
#[derive(Debug, Clone, Default)]
pub struct EidSource(Arc<AtomicU32>);

impl EidSource {
    /// A source starting at the first identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused identity.
    pub fn next_eid(&self) -> Eid {
        Eid(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Make sure identities handed out later never collide with `eid`.
    pub fn observe(&self, eid: Eid) {
        self.0.fetch_max(eid.0, Ordering::Relaxed);
    }
}

/// Where an attached entity is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Queued; becomes active at the next resolution point.
    PendingAdd,
    /// In the active collection.
    Active,
    /// Queued for detachment at the end of the tick.
    PendingRemove,
}

#[derive(Debug)]
struct Slot {
    /// `None` while the entity is checked out for its own tick.
    entity: Option<Entity>,
    state: Lifecycle,
    /// Whether the id is in the active collection.
    member: bool,
}

/// Per-layer ownership of entities.
///
/// Structural changes never happen mid-iteration: `add` and `remove` only
/// queue work, and the scheduler applies the queues at its two resolution
/// points. Queries see the active collection only.
#[derive(Debug)]
pub struct EntityRegistry {
    depth: i32,
    arena: SlotMap<EntityId, Slot>,
    active: Vec<EntityId>,
    players: Vec<EntityId>,
    pending_add: Vec<EntityId>,
    pending_remove: Vec<EntityId>,
    /// Identities of every attached entity, whatever its lifecycle.
    held: HashSet<Eid>,
    eids: EidSource,
}

impl EntityRegistry {
    /// An empty registry for `depth` drawing identities from `eids`.
    pub fn new(depth: i32, eids: EidSource) -> Self {
        Self {
            depth,
            arena: SlotMap::with_key(),
            active: Vec::new(),
            players: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
            held: HashSet::new(),
            eids,
        }
    }

    /// Depth of the owning level.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// The identity counter this layer draws from.
    pub fn eid_source(&self) -> EidSource {
        self.eids.clone()
    }

    /// Attach a detached entity. It joins the active collection at the next resolution point.
    ///
    /// An entity whose identity is already attached here gets a fresh one.
    pub fn add(&mut self, mut entity: Entity) -> EntityId {
        let eid = match entity.eid {
            Some(eid) if self.held.contains(&eid) => {
                let fresh = self.eids.next_eid();
                warn!("layer {}: {eid} is already attached, re-identified as {fresh}", self.depth);
                fresh
            }
            Some(eid) => {
                self.eids.observe(eid);
                eid
            }
            None => self.eids.next_eid(),
        };
        self.held.insert(eid);
        entity.eid = Some(eid);
        entity.level = Some(self.depth);
        entity.removed = false;
        let id = self.arena.insert(Slot {
            entity: Some(entity),
            state: Lifecycle::PendingAdd,
            member: false,
        });
        self.pending_add.push(id);
        trace!("layer {}: queued {eid} for add", self.depth);
        id
    }

    /// Attach an entity at a sub-tile position.
    pub fn add_at(&mut self, entity: Entity, x: i32, y: i32) -> EntityId {
        self.add(entity.with_position(x, y))
    }

    /// Attach an entity centred on a tile.
    pub fn add_at_tile(&mut self, entity: Entity, xt: i32, yt: i32) -> EntityId {
        self.add_at(entity, tile_center(xt), tile_center(yt))
    }

    /// Re-position an attached entity and cancel any pending removal.
    ///
    /// Never produces a second pending-add entry. Returns `false` for a
    /// handle this layer does not own.
    pub fn readd(&mut self, id: EntityId, x: i32, y: i32) -> bool {
        let depth = self.depth;
        let Some(slot) = self.arena.get_mut(id) else {
            warn!("{}", SimError::EntityLayerMismatch(format!("{id:?}"), depth));
            return false;
        };
        if let Some(entity) = slot.entity.as_mut() {
            entity.x = x;
            entity.y = y;
            entity.level = Some(depth);
            entity.removed = false;
        }
        if slot.state == Lifecycle::PendingRemove {
            self.pending_remove.retain(|p| *p != id);
            if slot.member {
                slot.state = Lifecycle::Active;
            } else {
                slot.state = Lifecycle::PendingAdd;
                if !self.pending_add.contains(&id) {
                    self.pending_add.push(id);
                }
            }
        }
        true
    }

    /// Queue an entity for detachment at the end of the tick.
    ///
    /// Repeated calls leave a single pending entry. A handle this layer does
    /// not own is logged and ignored.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.arena.get_mut(id) else {
            warn!(
                "{}",
                SimError::EntityLayerMismatch(format!("{id:?}"), self.depth)
            );
            return false;
        };
        match slot.state {
            Lifecycle::PendingRemove => return true,
            Lifecycle::PendingAdd => self.pending_add.retain(|p| *p != id),
            Lifecycle::Active => {}
        }
        slot.state = Lifecycle::PendingRemove;
        self.pending_remove.push(id);
        true
    }

    /// Move every pending add into the active collection. Returns how many joined.
    pub fn resolve_pending_adds(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_add);
        let mut added = 0;
        for id in pending {
            let Some(slot) = self.arena.get_mut(id) else {
                continue;
            };
            if slot.state != Lifecycle::PendingAdd {
                continue;
            }
            slot.state = Lifecycle::Active;
            if slot.member {
                continue;
            }
            slot.member = true;
            self.active.push(id);
            if slot.entity.as_ref().is_some_and(Entity::is_player) {
                self.players.push(id);
            }
            added += 1;
        }
        if added > 0 {
            trace!("layer {}: {added} entities became active", self.depth);
        }
        added
    }

    /// Detach every entity queued for removal and hand them back.
    ///
    /// Returned entities have no level and are flagged removed; their
    /// handles become stale.
    pub fn resolve_pending_removes(&mut self) -> Vec<Entity> {
        if self.pending_remove.is_empty() {
            return Vec::new();
        }
        let pending = std::mem::take(&mut self.pending_remove);
        let mut gone = HashSet::with_capacity(pending.len());
        let mut detached = Vec::with_capacity(pending.len());
        for id in pending {
            let Some(slot) = self.arena.remove(id) else {
                continue;
            };
            if slot.member {
                gone.insert(id);
            }
            if let Some(mut entity) = slot.entity {
                if let Some(eid) = entity.eid {
                    self.held.remove(&eid);
                }
                entity.level = None;
                entity.removed = true;
                detached.push(entity);
            }
        }
        self.active.retain(|id| !gone.contains(id));
        self.players.retain(|id| !gone.contains(id));
        trace!("layer {}: detached {} entities", self.depth, detached.len());
        detached
    }

    /// Take an entity out of its slot for the duration of its own tick.
    pub(crate) fn checkout(&mut self, id: EntityId) -> Option<Entity> {
        self.arena.get_mut(id)?.entity.take()
    }

    /// Put a checked-out entity back.
    pub(crate) fn checkin(&mut self, id: EntityId, entity: Entity) {
        if let Some(slot) = self.arena.get_mut(id) {
            slot.entity = Some(entity);
        }
    }

    /// Entity behind `id`, if still in the arena.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)?.entity.as_ref()
    }

    /// Entity behind `id`, mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.arena.get_mut(id)?.entity.as_mut()
    }

    /// Lifecycle state, or `None` if the handle is not attached here.
    pub fn lifecycle(&self, id: EntityId) -> Option<Lifecycle> {
        self.arena.get(id).map(|s| s.state)
    }

    /// Whether the id is in the active collection (including entities queued for removal).
    pub fn is_active(&self, id: EntityId) -> bool {
        self.arena.get(id).is_some_and(|s| s.member)
    }

    /// Find the handle of an attached entity by identity.
    pub fn find(&self, eid: Eid) -> Option<EntityId> {
        self.arena
            .iter()
            .find(|(_, s)| s.entity.as_ref().and_then(|e| e.eid) == Some(eid))
            .map(|(id, _)| id)
    }

    /// Active handles in insertion order.
    pub fn active_ids(&self) -> &[EntityId] {
        &self.active
    }

    /// Players on this layer.
    pub fn players(&self) -> &[EntityId] {
        &self.players
    }

    /// Entities waiting to join the active set.
    pub fn pending_adds(&self) -> &[EntityId] {
        &self.pending_add
    }

    /// Entities waiting to be detached.
    pub fn pending_removes(&self) -> &[EntityId] {
        &self.pending_remove
    }

    /// Number of active entities.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no entity is active.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Active entities with their handles, skipping any that are checked out.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.active
            .iter()
            .filter_map(|&id| self.get(id).map(|e| (id, e)))
    }

    /// Active entities whose hitbox intersects the rectangle.
    pub fn entities_in_rect(&self, area: &Rect) -> Vec<EntityId> {
        self.iter()
            .filter(|(_, e)| e.hitbox().intersects(area))
            .map(|(id, _)| id)
            .collect()
    }

    /// Active entities standing on tiles `xt0..=xt1` by `yt0..=yt1` that pass the filter.
    pub fn entities_in_tiles(
        &self,
        xt0: i32,
        yt0: i32,
        xt1: i32,
        yt1: i32,
        filter: impl Fn(&Entity) -> bool,
    ) -> Vec<EntityId> {
        self.iter()
            .filter(|(_, e)| {
                let t = e.tile_pos();
                t.x >= xt0 && t.x <= xt1 && t.y >= yt0 && t.y <= yt1 && filter(e)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Active entities passing the filter.
    pub fn entities_of(&self, filter: impl Fn(&Entity) -> bool) -> Vec<EntityId> {
        self.iter()
            .filter(|(_, e)| filter(e))
            .map(|(id, _)| id)
            .collect()
    }

    /// Count active entities passing the filter.
    pub fn count(&self, filter: impl Fn(&Entity) -> bool) -> usize {
        self.iter().filter(|(_, e)| filter(e)).count()
    }

    /// Whether any active entity stands on the tile.
    pub fn is_entity_on_tile(&self, xt: i32, yt: i32) -> bool {
        self.iter().any(|(_, e)| {
            let t = e.tile_pos();
            t.x == xt && t.y == yt
        })
    }

    /// The player with the smallest squared distance to the point.
    pub fn closest_player(&self, x: i32, y: i32) -> Option<EntityId> {
        self.players
            .iter()
            .filter_map(|&id| self.get(id).map(|p| (id, p)))
            .min_by_key(|(_, p)| {
                let dx = i64::from(p.x - x);
                let dy = i64::from(p.y - y);
                dx * dx + dy * dy
            })
            .map(|(id, _)| id)
    }

    /// Whether a player stands within the eviction protection window around the point.
    pub fn near_player(&self, x: i32, y: i32) -> bool {
        self.players
            .iter()
            .filter_map(|&id| self.get(id))
            .any(|p| (p.x - x).abs() < NEAR_PLAYER_X && (p.y - y).abs() < NEAR_PLAYER_Y)
    }

    /// Entities a save should persist: active ones and pending adds, minus pending removals.
    pub fn entities_to_save(&self) -> Vec<&Entity> {
        self.active
            .iter()
            .chain(self.pending_add.iter())
            .filter(|id| self.lifecycle(**id) != Some(Lifecycle::PendingRemove))
            .filter_map(|&id| self.get(id))
            .collect()
    }
}
