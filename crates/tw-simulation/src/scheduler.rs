use log::{info, trace, warn};
use rand::Rng;
use tw_core::entity::Eid;
use tw_core::species::Disposition;

use crate::behavior::{EntityCtx, behavior};
use crate::context::TickContext;
use crate::event::SimEventKind;
use crate::level::{Level, monster_density};
use crate::registry::{EntityId, EntityRegistry, Lifecycle};
use crate::settings::Difficulty;
use crate::spawn::SpawnEnv;
use crate::trigger::TriggerContext;

/// Minimum eviction draws per tick, however few entities are active.
pub const MIN_EVICTION_ATTEMPTS: usize = 64;

/// How much of the tick sequence a level runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// Every step: triggers, tiles, entities, eviction and spawning.
    Full,
    /// Bookkeeping and ambience only: cap, pending adds, triggers, mob count,
    /// eviction and pending removes.
    Partial,
}

/// Population cap for a difficulty at a depth.
pub fn mob_cap(difficulty: Difficulty, depth: i32) -> u32 {
    let cap = 140 + 140 * difficulty.index();
    match depth {
        1 => cap / 2,
        0 | -4 => cap * 2 / 3,
        _ => cap,
    }
}

/// What one eviction pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Identities removed by the pass.
    pub evicted: Vec<Eid>,
    /// Victim samples drawn.
    pub attempts: usize,
    /// The attempt budget ran out with the population still over the cap.
    pub stalled: bool,
}

/// Queue random evictable mobs for removal until `mob_count` is within `max`.
///
/// Mobs near a player, protected kinds and entities already pending
/// removal are never picked. Gives up after
/// `attempt_factor * active` draws (at least [`MIN_EVICTION_ATTEMPTS`]).
pub fn evict_excess<R: Rng>(
    registry: &mut EntityRegistry,
    rng: &mut R,
    mob_count: &mut u32,
    max: u32,
    attempt_factor: u32,
) -> EvictionReport {
    let mut report = EvictionReport::default();
    if *mob_count <= max {
        return report;
    }
    let candidates = registry.active_ids().to_vec();
    if candidates.is_empty() {
        report.stalled = true;
        return report;
    }
    let budget = (attempt_factor as usize * candidates.len()).max(MIN_EVICTION_ATTEMPTS);
    while *mob_count > max {
        if report.attempts >= budget {
            report.stalled = true;
            break;
        }
        report.attempts += 1;
        let id = candidates[rng.random_range(0..candidates.len())];
        if registry.lifecycle(id) != Some(Lifecycle::Active) {
            continue;
        }
        let Some(entity) = registry.get(id) else {
            continue;
        };
        if !entity.is_evictable() || registry.near_player(entity.x, entity.y) {
            continue;
        }
        let eid = entity.eid;
        if registry.remove(id) {
            *mob_count -= 1;
            report.evicted.extend(eid);
        }
    }
    report
}

/// Summary of one level tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Depth of the level.
    pub depth: i32,
    /// Which pipeline ran.
    pub mode: TickMode,
    /// Entities that joined the active set at the start of the tick.
    pub added: usize,
    /// Sampled tiles whose state changed.
    pub tiles_changed: usize,
    /// Hostile population after eviction.
    pub mob_count: u32,
    /// Hostile cap for this tick.
    pub max_mob_count: u32,
    /// Entities removed by the eviction pass.
    pub evicted: usize,
    /// The eviction budget ran out over the cap.
    pub stalled: bool,
    /// Entities detached at the end of the tick.
    pub removed: usize,
    /// Mobs spawned by the population pass.
    pub spawned: usize,
    /// Entities whose behaviour failed this tick.
    pub faults: usize,
}

impl TickReport {
    fn new(depth: i32, mode: TickMode) -> Self {
        Self {
            depth,
            mode,
            added: 0,
            tiles_changed: 0,
            mob_count: 0,
            max_mob_count: 0,
            evicted: 0,
            stalled: false,
            removed: 0,
            spawned: 0,
            faults: 0,
        }
    }
}

impl Level {
    /// Advance this level by one tick.
    pub fn tick(&mut self, mode: TickMode, ctx: &mut TickContext<'_>) -> TickReport {
        let mut report = TickReport::new(self.depth, mode);
        let difficulty = ctx.difficulty();
        self.max_mob_count = mob_cap(difficulty, self.depth);
        report.max_mob_count = self.max_mob_count;

        report.added = self.registry.resolve_pending_adds();
        if report.added > 0 {
            self.publish(ctx.tick());
        }

        self.run_triggers(ctx);
        if mode == TickMode::Full {
            report.tiles_changed = self.tick_tiles();
            self.mob_count = self.tick_entities(ctx, &mut report);
        } else {
            self.mob_count = self.count_mobs();
        }

        let eviction = evict_excess(
            &mut self.registry,
            &mut self.rng,
            &mut self.mob_count,
            self.max_mob_count,
            ctx.config.eviction_attempt_factor,
        );
        let depth = self.depth;
        for &eid in &eviction.evicted {
            ctx.emit(
                SimEventKind::Evicted { depth, entity: eid },
                format!("{eid} evicted from depth {depth}"),
            );
        }
        report.evicted = eviction.evicted.len();
        if eviction.stalled {
            warn!(
                "depth {depth}: eviction stalled at {}/{} mobs after {} attempts",
                self.mob_count, self.max_mob_count, eviction.attempts
            );
            ctx.emit(
                SimEventKind::EvictionStall {
                    depth,
                    mob_count: self.mob_count,
                    max_mob_count: self.max_mob_count,
                },
                "every excess mob is protected",
            );
            report.stalled = true;
        }

        report.removed = self.registry.resolve_pending_removes().len();

        if mode == TickMode::Full && self.mob_count < self.max_mob_count {
            report.spawned = self.spawn(ctx, difficulty);
        }
        report.mob_count = self.mob_count;

        self.publish(ctx.tick());
        report
    }

    fn run_triggers(&mut self, ctx: &mut TickContext<'_>) {
        for trigger in ctx.triggers.iter_mut() {
            let mut tctx = TriggerContext {
                depth: self.depth,
                clock: ctx.clock,
                settings: ctx.settings,
                events: &mut *ctx.events,
                rng: &mut self.rng,
            };
            if let Err(err) = trigger.tick(&mut tctx) {
                warn!("depth {}: trigger {} failed: {err}", self.depth, trigger.name());
            }
        }
    }

    /// Tick `(w * h) / 50` tiles at random coordinates.
    fn tick_tiles(&mut self) -> usize {
        let (w, h) = (self.grid.width(), self.grid.height());
        let samples = (w * h) / 50;
        let mut changed = 0;
        for _ in 0..samples {
            let x = self.rng.random_range(0..w);
            let y = self.rng.random_range(0..h);
            if self.grid.tick_tile(x, y, &mut self.rng) {
                changed += 1;
            }
        }
        changed
    }

    /// Run every active entity's behaviour and return the surviving mob count.
    fn tick_entities(&mut self, ctx: &mut TickContext<'_>, report: &mut TickReport) -> u32 {
        let depth = self.depth;
        let tick = ctx.tick();
        let difficulty = ctx.difficulty();
        let mut mobs = 0;

        for id in self.registry.active_ids().to_vec() {
            if self.registry.lifecycle(id) != Some(Lifecycle::Active) {
                continue;
            }
            let Some(mut entity) = self.registry.checkout(id) else {
                continue;
            };
            let stale = entity.removed || entity.level != Some(depth);
            if !stale && ctx.controlled != Some(id) {
                let mut ectx = EntityCtx {
                    id,
                    depth,
                    tick,
                    difficulty,
                    grid: &mut self.grid,
                    registry: &mut self.registry,
                    rng: &mut self.rng,
                    events: &mut *ctx.events,
                    chest_count: &mut self.chest_count,
                };
                if let Err(err) = (behavior(&entity.kind).tick)(&mut entity, &mut ectx) {
                    warn!("depth {depth}: {entity} failed its tick: {err}");
                    if let Some(eid) = entity.eid {
                        ctx.emit(
                            SimEventKind::EntityFault {
                                depth,
                                entity: eid,
                                message: err.to_string(),
                            },
                            format!("{entity} skipped"),
                        );
                    }
                    report.faults += 1;
                }
                if entity.removed && entity.disposition() == Some(Disposition::Boss) && !ctx.flags.air_wizard_beaten {
                    info!("depth {depth}: {entity} was beaten");
                    ctx.flags.air_wizard_beaten = true;
                }
            }
            let gone = entity.removed || entity.level != Some(depth);
            let is_mob = entity.is_mob();
            self.registry.checkin(id, entity);
            if gone {
                trace!("depth {depth}: {id:?} left during its tick");
                self.registry.remove(id);
            } else if is_mob {
                mobs += 1;
            }
        }
        mobs
    }

    fn count_mobs(&self) -> u32 {
        let count = self
            .registry
            .iter()
            .filter(|(id, e)| e.is_mob() && self.registry.lifecycle(*id) == Some(Lifecycle::Active))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn spawn(&mut self, ctx: &mut TickContext<'_>, difficulty: Difficulty) -> usize {
        let env = SpawnEnv {
            depth: self.depth,
            monster_density: monster_density(self.depth),
            mob_count: self.mob_count,
            max_mob_count: self.max_mob_count,
            time: ctx.clock.time_of_day(),
            difficulty,
            flags: ctx.flags,
        };
        let outcome = ctx
            .planner
            .try_spawn(&self.grid, &mut self.registry, &mut self.rng, &env);
        for &id in &outcome.spawned {
            self.announce_spawn(ctx, id);
        }
        outcome.spawned.len()
    }

    fn announce_spawn(&self, ctx: &mut TickContext<'_>, id: EntityId) {
        let Some(entity) = self.registry.get(id) else {
            return;
        };
        if let (Some(eid), Some(species)) = (entity.eid, entity.species()) {
            let depth = self.depth;
            ctx.emit(
                SimEventKind::Spawned {
                    depth,
                    entity: eid,
                    species: species.name().to_string(),
                },
                format!("{species} {eid} spawned on depth {depth}"),
            );
        }
    }
}
