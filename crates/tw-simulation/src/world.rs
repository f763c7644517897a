use std::collections::BTreeMap;
use std::fmt;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tw_core::entity::{Eid, Entity};
use tw_core::species::Disposition;
use tw_core::tile::ids;

use crate::behavior::{EntityCtx, behavior};
use crate::clock::DayClock;
use crate::config::WorldConfig;
use crate::context::{TickContext, WorldFlags};
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEventKind};
use crate::level::{BOTTOM_DEPTH, Level, TOP_DEPTH};
use crate::mapgen::MapBuilder;
use crate::movement::move_entity;
use crate::persist::LevelSnapshot;
use crate::placement::{GenContext, StructurePlacer};
use crate::registry::{EidSource, EntityId};
use crate::scheduler::{TickMode, TickReport};
use crate::settings::{GameMode, SIZE_KEY, Settings};
use crate::spawn::SpawnPlanner;
use crate::structure::StructureCatalogue;
use crate::trigger::{MusicTrigger, Trigger};

/// Movement requested for the player this tick, in sub-tile units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerIntent {
    /// Horizontal movement.
    pub dx: i32,
    /// Vertical movement.
    pub dy: i32,
}

impl PlayerIntent {
    /// Move by `(dx, dy)`.
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// No movement.
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Totals accumulated over [`World::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// World ticks run.
    pub ticks: u64,
    /// Mobs spawned.
    pub spawned: usize,
    /// Mobs evicted over the cap.
    pub evicted: usize,
    /// Entities detached.
    pub removed: usize,
    /// Level ticks whose eviction stalled.
    pub stalls: usize,
    /// Behaviour failures isolated.
    pub faults: usize,
}

impl RunSummary {
    fn absorb(&mut self, report: &TickReport) {
        self.spawned += report.spawned;
        self.evicted += report.evicted;
        self.removed += report.removed;
        self.faults += report.faults;
        if report.stalled {
            self.stalls += 1;
        }
    }
}

/// The whole world: every level plus the state shared between them.
///
/// Owns the clock, world RNG, event log, settings, triggers and the player
/// handle. Drives the per-tick sequence: level change, player intent, clock,
/// then a full tick of the current level and partial ticks of the rest.
pub struct World {
    levels: BTreeMap<i32, Level>,
    current: i32,
    player: Option<EntityId>,
    clock: DayClock,
    rng: StdRng,
    events: EventLog,
    config: WorldConfig,
    settings: Box<dyn Settings>,
    triggers: Vec<Box<dyn Trigger>>,
    planner: SpawnPlanner,
    flags: WorldFlags,
    eids: EidSource,
    pending_level_change: Option<i32>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.clock.tick())
            .field("current", &self.current)
            .field("levels", &self.levels.len())
            .field("triggers", &self.triggers.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl World {
    /// Generate every level from the top down and place the player on the surface.
    ///
    /// Level size is the settings' `size` when one is given, else
    /// `config.world_size`.
    pub fn generate(config: WorldConfig, settings: Box<dyn Settings>, builder: &dyn MapBuilder) -> SimResult<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut events = EventLog::new(config.max_events);
        let catalogue = StructureCatalogue::standard()?;
        let size = if settings.get(SIZE_KEY).is_some() {
            settings.size()
        } else {
            config.world_size
        };
        let flags = WorldFlags::default();
        let eids = EidSource::new();

        let mut levels = BTreeMap::new();
        for depth in (BOTTOM_DEPTH..=TOP_DEPTH).rev() {
            let seed: u64 = rng.random();
            let parent = if depth <= 0 { levels.get(&(depth + 1)) } else { None };
            let mut ctx = GenContext {
                tick: 0,
                placer: StructurePlacer::new(config.placement_attempts),
                catalogue: &catalogue,
                flags,
                events: &mut events,
            };
            let level = Level::generate(size, size, seed, depth, parent, builder, eids.clone(), &mut ctx)?;
            levels.insert(depth, level);
        }
        info!("world generated: {} levels of {size}x{size}, seed {}", levels.len(), config.seed);

        let mut world = Self {
            levels,
            current: 0,
            player: None,
            clock: DayClock::new(config.day_length),
            rng,
            events,
            planner: SpawnPlanner::new(config.spawn_factor, config.spawn_attempts),
            config,
            settings,
            triggers: vec![Box::new(MusicTrigger::new())],
            flags,
            eids,
            pending_level_change: None,
        };
        world.place_player_on_surface()?;
        Ok(world)
    }

    /// Assemble a world from levels built elsewhere. No player is placed.
    pub fn from_levels(
        config: WorldConfig,
        settings: Box<dyn Settings>,
        levels: Vec<Level>,
        current: i32,
    ) -> SimResult<Self> {
        let levels: BTreeMap<i32, Level> = levels.into_iter().map(|l| (l.depth, l)).collect();
        if !levels.contains_key(&current) {
            return Err(SimError::NoSuchLevel(current));
        }
        let eids = levels
            .values()
            .next()
            .map(|l| l.registry.eid_source())
            .unwrap_or_default();
        Ok(Self {
            levels,
            current,
            player: None,
            clock: DayClock::new(config.day_length),
            rng: StdRng::seed_from_u64(config.seed),
            events: EventLog::new(config.max_events),
            planner: SpawnPlanner::new(config.spawn_factor, config.spawn_attempts),
            config,
            settings,
            triggers: vec![Box::new(MusicTrigger::new())],
            flags: WorldFlags::default(),
            eids,
            pending_level_change: None,
        })
    }

    fn place_player_on_surface(&mut self) -> SimResult<()> {
        let surface = self.levels.get(&0).ok_or(SimError::NoSuchLevel(0))?;
        let grass = surface.grid.matching_tiles(|t, _, _| t.id == ids::GRASS);
        if grass.is_empty() {
            return Err(SimError::GenerationFailure {
                depth: 0,
                reason: "no grass to start the player on".into(),
            });
        }
        let start = grass[self.rng.random_range(0..grass.len())];
        self.current = 0;
        self.add_player(start.x, start.y)?;
        debug!("player starts at {start}");
        Ok(())
    }

    /// Put a fresh player centred on a tile of the current level.
    pub fn add_player(&mut self, xt: i32, yt: i32) -> SimResult<EntityId> {
        let level = self
            .levels
            .get_mut(&self.current)
            .ok_or(SimError::NoSuchLevel(self.current))?;
        let id = level.registry.add_at_tile(Entity::player(), xt, yt);
        self.player = Some(id);
        Ok(id)
    }

    /// Advance the world by one tick.
    pub fn tick(&mut self, intent: PlayerIntent) -> SimResult<Vec<TickReport>> {
        if let Some(to) = self.pending_level_change.take() {
            self.move_player(to)?;
        }
        self.apply_intent(intent);
        self.clock.advance();

        let mut ctx = TickContext {
            clock: &self.clock,
            config: &self.config,
            settings: self.settings.as_ref(),
            flags: self.flags,
            planner: &self.planner,
            triggers: &mut self.triggers,
            events: &mut self.events,
            controlled: self.player,
        };

        let mut reports = Vec::with_capacity(self.levels.len());
        let current = self
            .levels
            .get_mut(&self.current)
            .ok_or(SimError::NoSuchLevel(self.current))?;
        reports.push(current.tick(TickMode::Full, &mut ctx));

        ctx.controlled = None;
        for (&depth, level) in self.levels.iter_mut() {
            if depth != self.current {
                reports.push(level.tick(TickMode::Partial, &mut ctx));
            }
        }
        self.flags = ctx.flags;
        Ok(reports)
    }

    /// Run `n` idle ticks.
    pub fn run(&mut self, n: u64) -> SimResult<RunSummary> {
        let mut summary = RunSummary::default();
        for _ in 0..n {
            for report in self.tick(PlayerIntent::idle())? {
                summary.absorb(&report);
            }
            summary.ticks += 1;
        }
        Ok(summary)
    }

    fn apply_intent(&mut self, intent: PlayerIntent) {
        if intent == PlayerIntent::idle() {
            return;
        }
        let (Some(id), Some(level)) = (self.player, self.levels.get_mut(&self.current)) else {
            return;
        };
        let Some(mut player) = level.registry.checkout(id) else {
            return;
        };
        move_entity(&mut player, intent.dx, intent.dy, &level.grid, &level.registry);
        level.registry.checkin(id, player);
    }

    /// Ask for the player to take the stairs at the start of the next tick.
    ///
    /// `dir` is +1 for up, -1 for down. Returns the target depth, or `None`
    /// when there is no level that way.
    pub fn schedule_level_change(&mut self, dir: i32) -> Option<i32> {
        let to = (self.current + dir.signum()).clamp(BOTTOM_DEPTH, TOP_DEPTH);
        if to == self.current || !self.levels.contains_key(&to) {
            return None;
        }
        self.pending_level_change = Some(to);
        Some(to)
    }

    /// Move the player to the level at `depth` right away.
    pub fn travel(&mut self, depth: i32) -> SimResult<()> {
        if depth == self.current {
            return Ok(());
        }
        self.pending_level_change = None;
        self.move_player(depth)
    }

    /// Detach the player from the current level and queue it on `to`, keeping its identity.
    fn move_player(&mut self, to: i32) -> SimResult<()> {
        if !self.levels.contains_key(&to) {
            return Err(SimError::NoSuchLevel(to));
        }
        let from = self.current;
        let Some(id) = self.player else {
            self.current = to;
            return Ok(());
        };
        let source = self.levels.get_mut(&from).ok_or(SimError::NoSuchLevel(from))?;
        let eid = source
            .registry
            .get(id)
            .and_then(|p| p.eid)
            .ok_or_else(|| SimError::EntityNotFound(format!("player {id:?}")))?;
        source.registry.remove(id);
        let player = source
            .registry
            .resolve_pending_removes()
            .into_iter()
            .find(|e| e.eid == Some(eid))
            .ok_or_else(|| SimError::EntityNotFound(eid.to_string()))?;
        source.publish(self.clock.tick());

        let pos = player.tile_pos();
        let target = self.levels.get_mut(&to).ok_or(SimError::NoSuchLevel(to))?;
        self.player = Some(target.registry.add_at_tile(player, pos.x, pos.y));
        self.current = to;
        info!("player {eid} moved from depth {from} to {to}");
        self.events.emit(
            self.clock.tick(),
            SimEventKind::LevelChanged { entity: eid, from, to },
            format!("{eid} took the stairs to depth {to}"),
        );
        Ok(())
    }

    /// The player interacts with `target` on the current level.
    ///
    /// Returns whether the target accepted the interaction.
    pub fn interact(&mut self, target: EntityId) -> bool {
        let Some(player_id) = self.player else {
            return false;
        };
        if player_id == target {
            return false;
        }
        let Some(level) = self.levels.get_mut(&self.current) else {
            return false;
        };
        let Some(mut player) = level.registry.checkout(player_id) else {
            return false;
        };
        let Some(mut entity) = level.registry.checkout(target) else {
            level.registry.checkin(player_id, player);
            return false;
        };
        let mut ectx = EntityCtx {
            id: target,
            depth: level.depth,
            tick: self.clock.tick(),
            difficulty: self.settings.difficulty(),
            grid: &mut level.grid,
            registry: &mut level.registry,
            rng: &mut level.rng,
            events: &mut self.events,
            chest_count: &mut level.chest_count,
        };
        let accepted = (behavior(&entity.kind).interact)(&mut entity, &mut player, &mut ectx);
        level.registry.checkin(target, entity);
        level.registry.checkin(player_id, player);
        accepted
    }

    /// Queue every hostile mob on every level for removal.
    ///
    /// Bosses stay unless the mode is Creative, where they can be summoned
    /// again. Returns how many were queued.
    pub fn remove_all_enemies(&mut self) -> usize {
        let bosses_too = self.settings.mode() == GameMode::Creative;
        let mut removed = 0;
        for level in self.levels.values_mut() {
            let hostile = level.registry.entities_of(|e| match e.disposition() {
                Some(Disposition::Hostile) => true,
                Some(Disposition::Boss) => bosses_too,
                _ => false,
            });
            for id in hostile {
                if level.registry.remove(id) {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            warn!("removed {removed} enemies from every level");
        }
        removed
    }

    /// Register a trigger. Triggers run in registration order.
    pub fn add_trigger<T: Trigger + 'static>(&mut self, trigger: T) {
        self.triggers.push(Box::new(trigger));
    }

    /// Access a trigger by downcasting to a concrete type.
    pub fn get_trigger<T: Trigger + 'static>(&self) -> Option<&T> {
        self.triggers
            .iter()
            .find_map(|t| t.as_any().downcast_ref::<T>())
    }

    /// Access a trigger mutably by downcasting to a concrete type.
    pub fn get_trigger_mut<T: Trigger + 'static>(&mut self) -> Option<&mut T> {
        self.triggers
            .iter_mut()
            .find_map(|t| t.as_any_mut().downcast_mut::<T>())
    }

    /// Swap the settings collaborator; takes effect on the next tick.
    pub fn replace_settings(&mut self, settings: Box<dyn Settings>) {
        self.settings = settings;
    }

    /// Session settings.
    pub fn settings(&self) -> &dyn Settings {
        self.settings.as_ref()
    }

    /// Progress flags.
    pub fn flags(&self) -> WorldFlags {
        self.flags
    }

    /// Progress flags, mutably.
    pub fn flags_mut(&mut self) -> &mut WorldFlags {
        &mut self.flags
    }

    /// World event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Day clock.
    pub fn clock(&self) -> &DayClock {
        &self.clock
    }

    /// Day clock, mutably.
    pub fn clock_mut(&mut self) -> &mut DayClock {
        &mut self.clock
    }

    /// Configuration the world was built with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Depth the player is on.
    pub fn current_depth(&self) -> i32 {
        self.current
    }

    /// Level the player is on.
    pub fn current_level(&self) -> Option<&Level> {
        self.levels.get(&self.current)
    }

    /// Level the player is on, mutably.
    pub fn current_level_mut(&mut self) -> Option<&mut Level> {
        self.levels.get_mut(&self.current)
    }

    /// Level at `depth`.
    pub fn level(&self, depth: i32) -> Option<&Level> {
        self.levels.get(&depth)
    }

    /// Level at `depth`, mutably.
    pub fn level_mut(&mut self, depth: i32) -> Option<&mut Level> {
        self.levels.get_mut(&depth)
    }

    /// Every level, deepest first.
    pub fn levels(&self) -> impl DoubleEndedIterator<Item = &Level> + '_ {
        self.levels.values()
    }

    /// Handle of the player on the current level.
    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Identity of the player.
    pub fn player_eid(&self) -> Option<Eid> {
        self.player_entity().and_then(|p| p.eid)
    }

    /// The player entity.
    pub fn player_entity(&self) -> Option<&Entity> {
        self.current_level()?.registry.get(self.player?)
    }

    /// The player entity, mutably.
    pub fn player_entity_mut(&mut self) -> Option<&mut Entity> {
        let id = self.player?;
        self.levels.get_mut(&self.current)?.registry.get_mut(id)
    }

    /// Identity source shared by every level.
    pub fn eids(&self) -> &EidSource {
        &self.eids
    }

    /// Save the level at `depth`.
    pub fn snapshot(&self, depth: i32) -> SimResult<LevelSnapshot> {
        self.levels
            .get(&depth)
            .ok_or(SimError::NoSuchLevel(depth))?
            .to_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::RawMap;
    use crate::settings::{Difficulty, MapSettings};
    use tw_core::entity::{EntityKind, PlayerState};
    use tw_core::geom::tile_center;
    use tw_core::species::Species;

    /// Grass everywhere, one Stairs Down per level on row 4 at a column unique to its depth.
    #[derive(Debug)]
    struct Flat;

    fn stair_column(depth: i32) -> i32 {
        12 + 2 * depth
    }

    impl MapBuilder for Flat {
        fn build(&self, width: i32, height: i32, depth: i32, _seed: u64) -> Option<RawMap> {
            let cells = (width * height) as usize;
            let fill = if depth == BOTTOM_DEPTH { ids::OBSIDIAN } else { ids::GRASS };
            let mut tiles = vec![fill; cells];
            if (-3..=1).contains(&depth) {
                tiles[(stair_column(depth) + 4 * width) as usize] = ids::STAIRS_DOWN;
            }
            Some(RawMap {
                tiles,
                data: vec![0; cells],
            })
        }
    }

    fn world() -> World {
        let config = WorldConfig::default().with_seed(3).with_world_size(32);
        World::generate(config, Box::new(MapSettings::new()), &Flat).unwrap()
    }

    #[test]
    fn generates_every_depth_with_player_on_surface() {
        let world = world();
        let depths: Vec<_> = world.levels().map(Level::depth).collect();
        assert_eq!(depths, vec![-4, -3, -2, -1, 0, 1, 2]);
        assert_eq!(world.current_depth(), 0);
        let player = world.player_entity().unwrap();
        assert!(player.is_player());
        let surface = world.level(0).unwrap();
        let pos = player.tile_pos();
        assert_eq!(surface.grid().tile(pos.x, pos.y).id, ids::GRASS);
    }

    #[test]
    fn settings_size_overrides_config() {
        let settings = MapSettings::new().with(SIZE_KEY, 48_i64);
        let config = WorldConfig::default().with_world_size(32);
        let world = World::generate(config, Box::new(settings), &Flat).unwrap();
        assert_eq!(world.level(-2).unwrap().grid().width(), 48);
    }

    #[test]
    fn stairs_are_linked_between_levels() {
        let world = world();
        for depth in -3..=0 {
            let x = stair_column(depth + 1);
            let level = world.level(depth).unwrap();
            assert_eq!(level.grid().tile(x, 4).id, ids::STAIRS_UP, "depth {depth}");
        }
    }

    #[test]
    fn ticks_advance_clock_and_cover_every_level() {
        let mut world = world();
        let reports = world.tick(PlayerIntent::idle()).unwrap();
        assert_eq!(world.clock().tick(), 1);
        assert_eq!(reports.len(), 7);
        assert_eq!(reports[0].depth, 0);
        assert_eq!(reports[0].mode, TickMode::Full);
        assert!(reports[1..].iter().all(|r| r.mode == TickMode::Partial));
    }

    #[test]
    fn intent_moves_the_player() {
        let mut world = world();
        world.tick(PlayerIntent::idle()).unwrap();
        let before = world.player_entity().unwrap().x;
        world.tick(PlayerIntent::new(1, 0)).unwrap();
        let after = world.player_entity().unwrap().x;
        // Flat ground; only the world edge could block a one-unit step.
        assert!(after == before + 1 || before >= tile_center(31));
    }

    #[test]
    fn level_change_keeps_identity() {
        let mut world = world();
        world.tick(PlayerIntent::idle()).unwrap();
        let eid = world.player_eid().unwrap();
        assert_eq!(world.schedule_level_change(-1), Some(-1));
        assert_eq!(world.current_depth(), 0);
        world.tick(PlayerIntent::idle()).unwrap();
        assert_eq!(world.current_depth(), -1);
        assert_eq!(world.player_eid(), Some(eid));
        assert_eq!(world.level(0).unwrap().registry().players().len(), 0);
        assert_eq!(world.level(-1).unwrap().registry().players().len(), 1);
        assert_eq!(
            world
                .events()
                .count_where(|k| matches!(k, SimEventKind::LevelChanged { from: 0, to: -1, .. })),
            1
        );
    }

    #[test]
    fn level_change_stops_at_the_edges() {
        let mut world = world();
        world.travel(TOP_DEPTH).unwrap();
        assert_eq!(world.schedule_level_change(1), None);
        world.travel(BOTTOM_DEPTH).unwrap();
        assert_eq!(world.schedule_level_change(-1), None);
        assert_eq!(world.schedule_level_change(1), Some(-3));
    }

    #[test]
    fn interacting_unlocks_dungeon_chests() {
        let mut world = world();
        world.travel(BOTTOM_DEPTH).unwrap();
        let dungeon = world.current_level_mut().unwrap();
        dungeon.set_chest_count(1);
        let chest = dungeon.registry_mut().add_at_tile(Entity::dungeon_chest(), 3, 3);
        world.tick(PlayerIntent::idle()).unwrap();

        assert!(!world.interact(chest), "no key yet");
        if let Some(EntityKind::Player(state)) = world.player_entity_mut().map(|p| &mut p.kind) {
            *state = PlayerState { keys: 1, ..PlayerState::default() };
        }
        assert!(world.interact(chest));
        assert_eq!(world.current_level().unwrap().chest_count(), 0);
        assert_eq!(
            world
                .events()
                .count_where(|k| matches!(k, SimEventKind::DungeonCleared { depth: -4 })),
            1
        );
    }

    fn hostile_world() -> World {
        let mut world = world();
        let cave = world.level_mut(-1).unwrap();
        cave.registry_mut().add_at_tile(Entity::mob(Species::Zombie, 1), 2, 2);
        cave.registry_mut().add_at_tile(Entity::mob(Species::Slime, 1), 4, 2);
        world.tick(PlayerIntent::idle()).unwrap();
        world
    }

    fn wizards(world: &World) -> usize {
        world
            .level(1)
            .unwrap()
            .registry()
            .count(|e| e.species() == Some(Species::AirWizard))
    }

    fn cave_hostiles(world: &World) -> usize {
        world
            .level(-1)
            .unwrap()
            .registry()
            .count(|e| e.disposition() == Some(Disposition::Hostile))
    }

    fn hostiles_everywhere(world: &World) -> usize {
        world
            .levels()
            .map(|l| l.registry().count(|e| e.disposition() == Some(Disposition::Hostile)))
            .sum()
    }

    #[test]
    fn remove_all_enemies_spares_the_boss() {
        let mut world = hostile_world();
        assert_eq!(wizards(&world), 1);
        assert_eq!(cave_hostiles(&world), 2);

        world.replace_settings(Box::new(MapSettings::new().with_difficulty(Difficulty::Hard)));
        let expected = hostiles_everywhere(&world);
        assert!(expected >= 2);
        assert_eq!(world.remove_all_enemies(), expected);
        world.tick(PlayerIntent::idle()).unwrap();
        assert_eq!(cave_hostiles(&world), 0);
        assert_eq!(wizards(&world), 1);
    }

    #[test]
    fn remove_all_enemies_in_creative_takes_the_boss_too() {
        let mut world = hostile_world();
        world.replace_settings(Box::new(MapSettings::new().with_mode(GameMode::Creative)));
        assert_eq!(wizards(&world), 1);
        let expected = hostiles_everywhere(&world) + 1;
        assert_eq!(world.remove_all_enemies(), expected);
        world.tick(PlayerIntent::idle()).unwrap();
        assert_eq!(cave_hostiles(&world), 0);
        assert_eq!(wizards(&world), 0);
    }

    #[test]
    fn beating_the_air_wizard_is_remembered() {
        let mut world = world();
        world.travel(1).unwrap();
        world.tick(PlayerIntent::idle()).unwrap();
        assert!(!world.flags().air_wizard_beaten);

        let sky = world.current_level_mut().unwrap();
        let wizard = sky
            .registry()
            .entities_of(|e| e.species() == Some(Species::AirWizard));
        assert_eq!(wizard.len(), 1);
        if let Some(EntityKind::Mob(m)) = sky.registry_mut().get_mut(wizard[0]).map(|e| &mut e.kind) {
            m.health = 0;
        }
        world.tick(PlayerIntent::idle()).unwrap();
        assert!(world.flags().air_wizard_beaten);
        assert_eq!(wizards(&world), 0);
    }

    #[test]
    fn triggers_are_found_by_type() {
        let mut world = world();
        assert!(world.get_trigger::<MusicTrigger>().is_some());
        world.get_trigger_mut::<MusicTrigger>().unwrap();
    }

    #[test]
    fn from_levels_requires_the_current_depth() {
        let err = World::from_levels(WorldConfig::default(), Box::new(MapSettings::new()), Vec::new(), 0).unwrap_err();
        assert!(matches!(err, SimError::NoSuchLevel(0)));
    }
}
