use std::fmt;

use rand::Rng;
use rand::rngs::StdRng;
use tw_core::entity::{Eid, Entity, EntityKind, Walk};
use tw_core::grid::TileGrid;
use tw_core::species::Disposition;

use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEventKind};
use crate::movement::move_entity;
use crate::registry::{EntityId, EntityRegistry};
use crate::settings::Difficulty;

/// Hostile mobs notice players closer than this on both axes.
pub const CHASE_RANGE: i32 = 128;
/// Spawners only work while a player is closer than this on both axes.
pub const SPAWNER_RANGE: i32 = 128;
/// Spawners stop while this many of their species stand within 8 tiles.
pub const SPAWNER_CROWD: usize = 4;
const SPAWNER_COOLDOWN: std::ops::Range<u32> = 200..500;
const LANTERN_LIGHT: u8 = 9;

/// Everything an entity's behaviour may touch while it runs.
///
/// The entity itself is checked out of `registry` for the duration of the
/// call, so queries never return it.
pub struct EntityCtx<'a> {
    /// Handle of the entity being run.
    pub id: EntityId,
    /// Depth of the layer.
    pub depth: i32,
    /// Current world tick.
    pub tick: u64,
    /// Difficulty as configured this tick.
    pub difficulty: Difficulty,
    /// Tiles of the layer.
    pub grid: &'a mut TileGrid,
    /// Every other entity on the layer.
    pub registry: &'a mut EntityRegistry,
    /// Layer RNG.
    pub rng: &'a mut StdRng,
    /// World event log.
    pub events: &'a mut EventLog,
    /// Locked dungeon chests left on the layer.
    pub chest_count: &'a mut u32,
}

impl EntityCtx<'_> {
    /// Emit a simulation event at the current tick.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events.emit(self.tick, kind, description);
    }
}

/// Runs one entity for one tick.
pub type TickFn = fn(&mut Entity, &mut EntityCtx<'_>) -> SimResult<()>;
/// Arguments are the target, then the acting player.
pub type InteractFn = fn(&mut Entity, &mut Entity, &mut EntityCtx<'_>) -> bool;
/// Light an entity currently emits, in tiles.
pub type LightFn = fn(&Entity) -> u8;

/// Per-kind behaviour table.
#[derive(Clone, Copy)]
pub struct Behavior {
    /// Name used in errors and logs.
    pub name: &'static str,
    /// Per-tick update.
    pub tick: TickFn,
    /// Response to a player interaction.
    pub interact: InteractFn,
    /// Light emitted.
    pub light_radius: LightFn,
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior").field("name", &self.name).finish()
    }
}

static PLAYER: Behavior = Behavior {
    name: "player",
    tick: idle,
    interact: refuse,
    light_radius: dark,
};

static MOB: Behavior = Behavior {
    name: "mob",
    tick: mob_tick,
    interact: refuse,
    light_radius: mob_light,
};

static CHEST: Behavior = Behavior {
    name: "chest",
    tick: idle,
    interact: open_chest,
    light_radius: dark,
};

static DUNGEON_CHEST: Behavior = Behavior {
    name: "dungeon chest",
    tick: idle,
    interact: unlock_dungeon_chest,
    light_radius: dark,
};

static SPAWNER: Behavior = Behavior {
    name: "spawner",
    tick: spawner_tick,
    interact: refuse,
    light_radius: dark,
};

static LANTERN: Behavior = Behavior {
    name: "lantern",
    tick: idle,
    interact: refuse,
    light_radius: lantern_light,
};

/// Behaviour table for an entity kind.
pub fn behavior(kind: &EntityKind) -> &'static Behavior {
    match kind {
        EntityKind::Player(_) => &PLAYER,
        EntityKind::Mob(_) => &MOB,
        EntityKind::Chest(_) => &CHEST,
        EntityKind::DungeonChest(_) => &DUNGEON_CHEST,
        EntityKind::Spawner(_) => &SPAWNER,
        EntityKind::Lantern => &LANTERN,
    }
}

fn mismatch(eid: Option<Eid>, tag: &str, behavior: &'static str) -> SimError {
    let entity = match eid {
        Some(eid) => format!("{tag} {eid}"),
        None => tag.to_string(),
    };
    SimError::BehaviorMismatch { entity, behavior }
}

fn idle(_entity: &mut Entity, _ctx: &mut EntityCtx<'_>) -> SimResult<()> {
    Ok(())
}

fn refuse(_target: &mut Entity, _player: &mut Entity, _ctx: &mut EntityCtx<'_>) -> bool {
    false
}

fn dark(_entity: &Entity) -> u8 {
    0
}

fn lantern_light(_entity: &Entity) -> u8 {
    LANTERN_LIGHT
}

fn mob_light(entity: &Entity) -> u8 {
    entity.species().map_or(0, |s| s.info().light_radius)
}

/// Direction towards the closest player, if one is within chase range.
fn chase_direction(entity: &Entity, registry: &EntityRegistry) -> Option<(i32, i32)> {
    let player = registry.get(registry.closest_player(entity.x, entity.y)?)?;
    let (dx, dy) = (player.x - entity.x, player.y - entity.y);
    (dx.abs() < CHASE_RANGE && dy.abs() < CHASE_RANGE).then(|| (dx.signum(), dy.signum()))
}

fn mob_tick(entity: &mut Entity, ctx: &mut EntityCtx<'_>) -> SimResult<()> {
    let (eid, tag) = (entity.eid, entity.tag());
    let EntityKind::Mob(mob) = &mut entity.kind else {
        return Err(mismatch(eid, tag, MOB.name));
    };
    let species = mob.species;
    let info = species.info();

    let cause = if mob.health <= 0 {
        Some("slain")
    } else if info.lifetime > 0 && mob.age >= info.lifetime {
        Some("expired")
    } else {
        None
    };
    if let Some(cause) = cause {
        entity.removed = true;
        if let Some(eid) = eid {
            let depth = ctx.depth;
            ctx.emit(
                SimEventKind::EntityDied {
                    depth,
                    entity: eid,
                    cause: cause.to_string(),
                },
                format!("{species} {eid} {cause}"),
            );
        }
        return Ok(());
    }

    mob.age += 1;
    let mut walk = mob.walk;

    let chase = if species.disposition().is_hostile() {
        chase_direction(entity, ctx.registry)
    } else {
        None
    };

    if let Some((xa, ya)) = chase {
        walk = Walk { xa, ya, remaining: 0 };
        move_entity(entity, xa * info.speed, ya * info.speed, ctx.grid, ctx.registry);
    } else if walk.remaining > 0 {
        walk.remaining -= 1;
        if !move_entity(entity, walk.xa * info.speed, walk.ya * info.speed, ctx.grid, ctx.registry) {
            walk.remaining = 0;
        }
    } else if ctx.rng.random_range(0..info.walk_chance) == 0 {
        walk = Walk {
            xa: ctx.rng.random_range(-1..=1),
            ya: ctx.rng.random_range(-1..=1),
            remaining: info.walk_duration,
        };
    }

    if let EntityKind::Mob(mob) = &mut entity.kind {
        mob.walk = walk;
    }
    Ok(())
}

fn spawner_tick(entity: &mut Entity, ctx: &mut EntityCtx<'_>) -> SimResult<()> {
    let (eid, tag) = (entity.eid, entity.tag());
    let EntityKind::Spawner(state) = &mut entity.kind else {
        return Err(mismatch(eid, tag, SPAWNER.name));
    };
    if state.species.disposition() == Disposition::Boss {
        return Err(SimError::InvalidEntityState {
            entity: eid.map_or_else(|| tag.to_string(), |eid| format!("{tag} {eid}")),
            reason: format!("spawners cannot release {}", state.species),
        });
    }
    if state.cooldown > 0 {
        state.cooldown -= 1;
        return Ok(());
    }
    state.cooldown = ctx.rng.random_range(SPAWNER_COOLDOWN);
    let (species, level) = (state.species, state.level);

    if ctx.difficulty == Difficulty::Peaceful && species.disposition().is_hostile() {
        return Ok(());
    }
    let (x, y) = (entity.x, entity.y);
    let player_near = ctx
        .registry
        .closest_player(x, y)
        .and_then(|p| ctx.registry.get(p))
        .is_some_and(|p| (p.x - x).abs() < SPAWNER_RANGE && (p.y - y).abs() < SPAWNER_RANGE);
    if !player_near {
        return Ok(());
    }

    let t = entity.tile_pos();
    let crowd = ctx
        .registry
        .entities_in_tiles(t.x - 8, t.y - 8, t.x + 8, t.y + 8, |e| {
            e.species() == Some(species)
        })
        .len();
    if crowd >= SPAWNER_CROWD {
        return Ok(());
    }

    for _ in 0..4 {
        let xt = t.x + ctx.rng.random_range(-1..=1);
        let yt = t.y + ctx.rng.random_range(-1..=1);
        if (xt, yt) == (t.x, t.y) || !ctx.grid.tile(xt, yt).may_pass {
            continue;
        }
        let id = ctx.registry.add_at_tile(Entity::mob(species, level), xt, yt);
        if let Some(new_eid) = ctx.registry.get(id).and_then(|e| e.eid) {
            let depth = ctx.depth;
            ctx.emit(
                SimEventKind::Spawned {
                    depth,
                    entity: new_eid,
                    species: species.name().to_string(),
                },
                format!("spawner released {species} {new_eid}"),
            );
        }
        break;
    }
    Ok(())
}

fn open_chest(_target: &mut Entity, player: &mut Entity, _ctx: &mut EntityCtx<'_>) -> bool {
    player.is_player()
}

fn unlock_dungeon_chest(target: &mut Entity, player: &mut Entity, ctx: &mut EntityCtx<'_>) -> bool {
    let EntityKind::DungeonChest(chest) = &mut target.kind else {
        return false;
    };
    let EntityKind::Player(holder) = &mut player.kind else {
        return false;
    };
    if !chest.locked {
        return true;
    }
    if holder.keys == 0 {
        return false;
    }
    holder.keys -= 1;
    chest.locked = false;
    *ctx.chest_count = ctx.chest_count.saturating_sub(1);

    let remaining = *ctx.chest_count;
    let depth = ctx.depth;
    if let Some(eid) = target.eid {
        ctx.emit(
            SimEventKind::ChestUnlocked {
                depth,
                entity: eid,
                remaining,
            },
            format!("dungeon chest {eid} unlocked, {remaining} left"),
        );
    }
    if remaining == 0 {
        ctx.emit(SimEventKind::DungeonCleared { depth }, "every dungeon chest is open");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EidSource;
    use rand::SeedableRng;
    use tw_core::entity::{MobState, PlayerState};
    use tw_core::geom::tile_center;
    use tw_core::species::Species;
    use tw_core::tile::{self, ids};

    struct Harness {
        grid: TileGrid,
        registry: EntityRegistry,
        rng: StdRng,
        events: EventLog,
        chest_count: u32,
        difficulty: Difficulty,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                grid: TileGrid::filled(32, 32, -1, 0, tile::tile(ids::DIRT)).unwrap(),
                registry: EntityRegistry::new(-1, EidSource::new()),
                rng: StdRng::seed_from_u64(17),
                events: EventLog::new(0),
                chest_count: 0,
                difficulty: Difficulty::Normal,
            }
        }

        fn attach(&mut self, entity: Entity) -> (EntityId, Entity) {
            let id = self.registry.add(entity);
            self.registry.resolve_pending_adds();
            let entity = self.registry.checkout(id).unwrap();
            (id, entity)
        }

        fn run(&mut self, id: EntityId, entity: &mut Entity) -> SimResult<()> {
            let mut ctx = EntityCtx {
                id,
                depth: -1,
                tick: 1,
                difficulty: self.difficulty,
                grid: &mut self.grid,
                registry: &mut self.registry,
                rng: &mut self.rng,
                events: &mut self.events,
                chest_count: &mut self.chest_count,
            };
            (behavior(&entity.kind).tick)(entity, &mut ctx)
        }

        fn interact(&mut self, id: EntityId, target: &mut Entity, player: &mut Entity) -> bool {
            let mut ctx = EntityCtx {
                id,
                depth: -4,
                tick: 1,
                difficulty: self.difficulty,
                grid: &mut self.grid,
                registry: &mut self.registry,
                rng: &mut self.rng,
                events: &mut self.events,
                chest_count: &mut self.chest_count,
            };
            (behavior(&target.kind).interact)(target, player, &mut ctx)
        }
    }

    #[test]
    fn mobs_expire_past_their_lifetime() {
        let mut h = Harness::new();
        let mut mob = Entity::mob(Species::Firefly, 1);
        if let EntityKind::Mob(m) = &mut mob.kind {
            m.age = Species::Firefly.info().lifetime;
        }
        let (id, mut mob) = h.attach(mob.with_position(200, 200));
        h.run(id, &mut mob).unwrap();
        assert!(mob.removed);
        assert_eq!(h.events.count_where(|k| matches!(k, SimEventKind::EntityDied { .. })), 1);
    }

    #[test]
    fn residents_never_expire() {
        let mut h = Harness::new();
        let mut cleric = Entity::mob(Species::Cleric, 1);
        if let EntityKind::Mob(m) = &mut cleric.kind {
            m.age = 10_000_000;
        }
        let (id, mut cleric) = h.attach(cleric.with_position(200, 200));
        h.run(id, &mut cleric).unwrap();
        assert!(!cleric.removed);
    }

    #[test]
    fn dead_mobs_remove_themselves() {
        let mut h = Harness::new();
        let mut mob = Entity::mob(Species::Zombie, 1);
        if let EntityKind::Mob(m) = &mut mob.kind {
            m.health = 0;
        }
        let (id, mut mob) = h.attach(mob.with_position(200, 200));
        h.run(id, &mut mob).unwrap();
        assert!(mob.removed);
    }

    #[test]
    fn hostile_mobs_chase_nearby_players() {
        let mut h = Harness::new();
        h.registry.add_at(Entity::player(), 260, 200);
        let (id, mut zombie) = h.attach(Entity::mob(Species::Zombie, 1).with_position(200, 200));
        for _ in 0..10 {
            h.run(id, &mut zombie).unwrap();
        }
        assert_eq!(zombie.x, 210);
        assert_eq!(zombie.y, 200);
    }

    #[test]
    fn passive_mobs_wander_eventually() {
        let mut h = Harness::new();
        let (id, mut cow) = h.attach(Entity::mob(Species::Cow, 1).with_position(256, 256));
        for _ in 0..2_000 {
            h.run(id, &mut cow).unwrap();
        }
        assert_ne!((cow.x, cow.y), (256, 256));
        match &cow.kind {
            EntityKind::Mob(MobState { age, .. }) => assert_eq!(*age, 2_000),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn spawner_releases_mobs_near_players() {
        let mut h = Harness::new();
        h.registry.add_at_tile(Entity::player(), 12, 10);
        let (id, mut spawner) = h.attach(Entity::spawner(Species::Slime, 2).with_position(tile_center(10), tile_center(10)));
        h.run(id, &mut spawner).unwrap();
        assert_eq!(h.registry.pending_adds().len(), 1);
        let mob = h.registry.get(h.registry.pending_adds()[0]).unwrap();
        assert_eq!(mob.species(), Some(Species::Slime));
        let t = mob.tile_pos();
        assert!((t.x - 10).abs() <= 1 && (t.y - 10).abs() <= 1);
        match &spawner.kind {
            EntityKind::Spawner(s) => assert!(s.cooldown >= 200),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn spawner_waits_without_players() {
        let mut h = Harness::new();
        let (id, mut spawner) = h.attach(Entity::spawner(Species::Slime, 2).with_position(tile_center(10), tile_center(10)));
        h.run(id, &mut spawner).unwrap();
        assert!(h.registry.pending_adds().is_empty());
    }

    #[test]
    fn spawner_respects_crowding() {
        let mut h = Harness::new();
        h.registry.add_at_tile(Entity::player(), 12, 10);
        for i in 0..4 {
            h.registry.add_at_tile(Entity::mob(Species::Slime, 1), 14, 6 + i);
        }
        let (id, mut spawner) = h.attach(Entity::spawner(Species::Slime, 2).with_position(tile_center(10), tile_center(10)));
        h.run(id, &mut spawner).unwrap();
        assert!(h.registry.pending_adds().is_empty());
    }

    #[test]
    fn peaceful_spawners_stay_quiet() {
        let mut h = Harness::new();
        h.difficulty = Difficulty::Peaceful;
        h.registry.add_at_tile(Entity::player(), 12, 10);
        let (id, mut spawner) = h.attach(Entity::spawner(Species::Zombie, 2).with_position(tile_center(10), tile_center(10)));
        h.run(id, &mut spawner).unwrap();
        assert!(h.registry.pending_adds().is_empty());
    }

    #[test]
    fn mismatched_behaviour_is_an_error() {
        let mut h = Harness::new();
        let (id, mut lantern) = h.attach(Entity::lantern());
        let mut ctx = EntityCtx {
            id,
            depth: -1,
            tick: 1,
            difficulty: Difficulty::Normal,
            grid: &mut h.grid,
            registry: &mut h.registry,
            rng: &mut h.rng,
            events: &mut h.events,
            chest_count: &mut h.chest_count,
        };
        let err = (MOB.tick)(&mut lantern, &mut ctx).unwrap_err();
        assert!(matches!(err, SimError::BehaviorMismatch { behavior: "mob", .. }));
    }

    #[test]
    fn dungeon_chest_needs_a_key() {
        let mut h = Harness::new();
        h.chest_count = 2;
        let (id, mut chest) = h.attach(Entity::dungeon_chest());
        let mut player = Entity::player();
        assert!(!h.interact(id, &mut chest, &mut player));
        assert_eq!(h.chest_count, 2);

        player.kind = EntityKind::Player(PlayerState { keys: 1, health: 10 });
        assert!(h.interact(id, &mut chest, &mut player));
        assert_eq!(h.chest_count, 1);
        assert!(matches!(player.kind, EntityKind::Player(PlayerState { keys: 0, .. })));
        assert_eq!(h.events.count_where(|k| matches!(k, SimEventKind::DungeonCleared { .. })), 0);
    }

    #[test]
    fn last_dungeon_chest_clears_the_dungeon() {
        let mut h = Harness::new();
        h.chest_count = 1;
        let (id, mut chest) = h.attach(Entity::dungeon_chest());
        let mut player = Entity::new(EntityKind::Player(PlayerState { keys: 3, health: 10 }));
        assert!(h.interact(id, &mut chest, &mut player));
        assert_eq!(h.chest_count, 0);
        assert_eq!(h.events.count_where(|k| matches!(k, SimEventKind::DungeonCleared { depth: -4 })), 1);
        assert!(h.interact(id, &mut chest, &mut player));
        assert!(matches!(player.kind, EntityKind::Player(PlayerState { keys: 2, .. })));
    }

    #[test]
    fn lanterns_glow() {
        let lantern = Entity::lantern();
        assert_eq!((behavior(&lantern.kind).light_radius)(&lantern), 9);
        let fly = Entity::mob(Species::Firefly, 1);
        assert_eq!((behavior(&fly.kind).light_radius)(&fly), 1);
    }
}
