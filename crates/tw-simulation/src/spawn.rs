use log::trace;
use rand::Rng;
use tw_core::entity::Entity;
use tw_core::geom::{Rect, tile_center};
use tw_core::grid::TileGrid;
use tw_core::species::{Disposition, Species};

use crate::clock::TimeOfDay;
use crate::context::WorldFlags;
use crate::registry::{EntityId, EntityRegistry};
use crate::settings::Difficulty;

/// Fraction of attempts skipped at the current population, scaled by `spawn_factor`.
///
/// Rises with the square of the population: 0 when the level is empty and
/// `spawn_factor` when it is at the cap.
pub fn skip_chance(spawn_factor: u32, mob_count: u32, max_mob_count: u32) -> u32 {
    if max_mob_count == 0 {
        return spawn_factor;
    }
    let count = u64::from(mob_count);
    let max = u64::from(max_mob_count);
    let chance = u64::from(spawn_factor) * count * count / (max * max);
    u32::try_from(chance).unwrap_or(u32::MAX)
}

/// Roll against a skip chance: `true` unless the chance is 0 or a draw in `[0, chance)` hits 0.
pub fn should_skip<R: Rng>(rng: &mut R, chance: u32) -> bool {
    chance > 0 && rng.random_range(0..chance) != 0
}

/// Roll a mob level for a spawn at `depth`.
pub fn roll_level<R: Rng>(rng: &mut R, depth: i32) -> u8 {
    let (min, max) = match depth {
        d if d < 0 => {
            let bonus = i32::from(rng.random_range(0..4) == 0 && d != -4);
            (1, -d + bonus)
        }
        d if d > 0 => (4, 4),
        _ => (1, 1),
    };
    u8::try_from(rng.random_range(min..=max)).unwrap_or(1)
}

/// Base solo radius of a species at a depth and time.
pub fn solo_radius(species: Species, depth: i32, time: TimeOfDay) -> i32 {
    let base = species.info().spawn.solo_radius;
    match species.disposition() {
        Disposition::Hostile if depth == -4 => 15,
        Disposition::Passive if time != TimeOfDay::Night => base + 5,
        _ => base,
    }
}

/// One band of a spawn table: selectors below `below` pick `group`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnEntry {
    /// Exclusive upper bound of the selector band.
    pub below: u32,
    /// Species picked in the band.
    pub group: &'static [Species],
}

/// How the level of a spawned mob is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelRule {
    /// Use the level rolled for the attempt.
    Rolled,
    /// Always spawn at this level.
    Fixed(u8),
}

/// A spawn table together with the conditions under which it is consulted.
#[derive(Debug, Clone, Copy)]
pub struct SpawnRule {
    /// Name used in logs.
    pub name: &'static str,
    /// Depths the rule covers.
    pub depths: &'static [i32],
    /// Times of day the rule applies; empty means always.
    pub times: &'static [TimeOfDay],
    /// Required value of the `nice_night` flag, if any.
    pub nice_night: Option<bool>,
    /// Required value of the `air_wizard_beaten` flag, if any.
    pub wizard_beaten: Option<bool>,
    /// How the mob level is chosen.
    pub level: LevelRule,
    /// Selector bands, ascending.
    pub entries: &'static [SpawnEntry],
}

impl SpawnRule {
    /// Whether the rule is consulted for `depth` at `time`.
    pub fn applies(&self, depth: i32, time: TimeOfDay, flags: &WorldFlags) -> bool {
        self.depths.contains(&depth)
            && (self.times.is_empty() || self.times.contains(&time))
            && self.nice_night.is_none_or(|v| v == flags.nice_night)
            && self.wizard_beaten.is_none_or(|v| v == flags.air_wizard_beaten)
    }

    /// Group picked by a selector in `[0, 100)`.
    pub fn select(&self, selector: u32) -> Option<&'static [Species]> {
        self.entries
            .iter()
            .find(|e| selector < e.below)
            .map(|e| e.group)
            .filter(|g| !g.is_empty())
    }
}

use Species::*;
use TimeOfDay::{Day, Evening, Morning, Night};

const fn entry(below: u32, group: &'static [Species]) -> SpawnEntry {
    SpawnEntry { below, group }
}

const CAVES: &[SpawnEntry] = &[
    entry(41, &[Slime]),
    entry(76, &[Zombie]),
    entry(82, &[Creeper]),
    entry(85, &[Skeleton]),
    entry(100, &[OldGolem]),
];

const SKY_NIGHT: &[SpawnEntry] = &[
    entry(23, &[Phyg, Sheepuff]),
    entry(41, &[Slime]),
    entry(76, &[Zombie]),
    entry(82, &[Creeper]),
    entry(85, &[Skeleton]),
    entry(100, &[OldGolem]),
];

const SKY_DAY: &[SpawnEntry] = &[
    entry(34, &[Phyg, Sheepuff]),
    entry(41, &[Slime]),
    entry(76, &[Zombie]),
    entry(82, &[Creeper]),
    entry(85, &[Skeleton]),
    entry(100, &[OldGolem]),
];

const SURFACE_NIGHT: &[SpawnEntry] = &[entry(76, &[Zombie]), entry(85, &[Creeper]), entry(100, &[Skeleton])];

const LAVA_CAVES: &[SpawnEntry] = &[
    entry(41, &[Slime, Slime]),
    entry(76, &[Zombie, Zombie]),
    entry(82, &[Creeper, Creeper]),
    entry(85, &[Skeleton, Skeleton]),
    entry(100, &[OldGolem, OldGolem]),
];

const DUNGEON: &[SpawnEntry] = &[entry(41, &[Snake]), entry(85, &[Knight]), entry(100, &[Snake])];

const VOID: &[SpawnEntry] = &[entry(41, &[Skeleton])];

const PASTURE: &[SpawnEntry] = &[
    entry(50, &[Sheep]),
    entry(56, &[Pig]),
    entry(64, &[Chicken]),
    entry(100, &[Cow]),
];

const FROST: &[SpawnEntry] = &[entry(51, &[GuiMan]), entry(100, &[Goat])];

const FIREFLIES: &[SpawnEntry] = &[entry(75, &[Firefly]), entry(76, &[]), entry(100, &[Firefly])];

const fn rule(name: &'static str, depths: &'static [i32], entries: &'static [SpawnEntry]) -> SpawnRule {
    SpawnRule {
        name,
        depths,
        times: &[],
        nice_night: None,
        wizard_beaten: None,
        level: LevelRule::Rolled,
        entries,
    }
}

/// The standard spawn tables, consulted in order.
pub static STANDARD_RULES: &[SpawnRule] = &[
    SpawnRule {
        times: &[Night],
        nice_night: Some(false),
        ..rule("surface night", &[0], SURFACE_NIGHT)
    },
    rule("caves", &[-1, -2], CAVES),
    rule("lava caves", &[-3], LAVA_CAVES),
    rule("dungeon", &[-4], DUNGEON),
    SpawnRule {
        level: LevelRule::Fixed(1),
        ..rule("void", &[2], VOID)
    },
    SpawnRule {
        times: &[Morning, Day],
        ..rule("pasture", &[0], PASTURE)
    },
    SpawnRule {
        times: &[Morning, Day],
        ..rule("frost", &[0], FROST)
    },
    SpawnRule {
        times: &[Night],
        nice_night: Some(true),
        ..rule("fireflies", &[0], FIREFLIES)
    },
    SpawnRule {
        times: &[Night],
        wizard_beaten: Some(true),
        ..rule("sky night", &[1], SKY_NIGHT)
    },
    SpawnRule {
        times: &[Morning, Day, Evening],
        wizard_beaten: Some(true),
        ..rule("sky", &[1], SKY_DAY)
    },
    SpawnRule {
        wizard_beaten: Some(false),
        ..rule("sky (guarded)", &[1], CAVES)
    },
];

/// Population and environment of the level being populated.
#[derive(Debug, Clone, Copy)]
pub struct SpawnEnv {
    /// Depth of the level.
    pub depth: i32,
    /// Spawn density for the depth.
    pub monster_density: i32,
    /// Hostile population.
    pub mob_count: u32,
    /// Hostile cap.
    pub max_mob_count: u32,
    /// Current time of day.
    pub time: TimeOfDay,
    /// Configured difficulty.
    pub difficulty: Difficulty,
    /// World progress flags.
    pub flags: WorldFlags,
}

/// What one spawn invocation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnOutcome {
    /// The throttle roll skipped the whole invocation.
    pub skipped: bool,
    /// Candidate positions tried.
    pub attempts: u32,
    /// Mobs queued for addition.
    pub spawned: Vec<EntityId>,
}

/// Whether `species` may start at sub-tile `(x, y)`.
///
/// The tile must suit the species, no active entity may stand within the
/// solo square, and hostile species keep their distance from players.
pub fn check_start_pos(
    grid: &TileGrid,
    registry: &EntityRegistry,
    species: Species,
    x: i32,
    y: i32,
    env: &SpawnEnv,
) -> bool {
    let info = species.info();
    if !info.spawn.allows(grid.tile(x >> 4, y >> 4)) {
        return false;
    }

    if !species.disposition().ignores_player_distance()
        && let Some(player) = registry.closest_player(x, y).and_then(|id| registry.get(id))
    {
        let dx = i64::from(player.x - x);
        let dy = i64::from(player.y - y);
        let min = i64::from(info.spawn.player_distance);
        if dx * dx + dy * dy < min * min {
            return false;
        }
    }

    let r = env.monster_density * solo_radius(species, env.depth, env.time);
    registry
        .entities_in_rect(&Rect::center_dims(x, y, r * 2, r * 2))
        .is_empty()
}

/// Decides when and where new mobs appear on a level.
#[derive(Debug, Clone)]
pub struct SpawnPlanner {
    rules: Vec<SpawnRule>,
    spawn_factor: u32,
    attempts: u32,
}

impl SpawnPlanner {
    /// A planner with the standard tables.
    pub fn new(spawn_factor: u32, attempts: u32) -> Self {
        Self::with_rules(STANDARD_RULES.to_vec(), spawn_factor, attempts)
    }

    /// A planner consulting custom tables.
    pub fn with_rules(rules: Vec<SpawnRule>, spawn_factor: u32, attempts: u32) -> Self {
        Self {
            rules,
            spawn_factor,
            attempts,
        }
    }

    /// Tables consulted by this planner.
    pub fn rules(&self) -> &[SpawnRule] {
        &self.rules
    }

    /// Run one spawn invocation.
    ///
    /// Rolls the throttle first, then samples up to `attempts` candidate
    /// tiles and stops at the first one that produced a mob. New mobs are
    /// queued; they join the level at the next resolution point.
    pub fn try_spawn<R: Rng>(
        &self,
        grid: &TileGrid,
        registry: &mut EntityRegistry,
        rng: &mut R,
        env: &SpawnEnv,
    ) -> SpawnOutcome {
        let mut outcome = SpawnOutcome::default();
        if env.max_mob_count == 0 {
            outcome.skipped = true;
            return outcome;
        }
        let chance = skip_chance(self.spawn_factor, env.mob_count, env.max_mob_count);
        if should_skip(rng, chance) {
            outcome.skipped = true;
            return outcome;
        }

        let peaceful = env.difficulty == Difficulty::Peaceful;
        for _ in 0..self.attempts {
            outcome.attempts += 1;
            let x = tile_center(rng.random_range(0..grid.width()));
            let y = tile_center(rng.random_range(0..grid.height()));
            let selector = rng.random_range(0..100);
            let rolled = roll_level(rng, env.depth);

            for rule in self.rules.iter().filter(|r| r.applies(env.depth, env.time, &env.flags)) {
                let Some(group) = rule.select(selector) else {
                    continue;
                };
                let level = match rule.level {
                    LevelRule::Rolled => rolled,
                    LevelRule::Fixed(level) => level,
                };
                for &species in group {
                    if peaceful && species.disposition().is_hostile() {
                        continue;
                    }
                    if !check_start_pos(grid, registry, species, x, y, env) {
                        continue;
                    }
                    let id = registry.add_at(Entity::mob(species, level), x, y);
                    trace!("depth {}: {} queued {species} at ({x}, {y})", env.depth, rule.name);
                    outcome.spawned.push(id);
                }
            }
            if !outcome.spawned.is_empty() {
                break;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EidSource;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tw_core::tile::{self, ids};

    fn env(depth: i32) -> SpawnEnv {
        SpawnEnv {
            depth,
            monster_density: 8,
            mob_count: 0,
            max_mob_count: 100,
            time: TimeOfDay::Day,
            difficulty: Difficulty::Normal,
            flags: WorldFlags::default(),
        }
    }

    fn ground(t: tw_core::tile::TileId, depth: i32) -> (TileGrid, EntityRegistry) {
        (
            TileGrid::filled(64, 64, depth, 0, tile::tile(t)).unwrap(),
            EntityRegistry::new(depth, EidSource::new()),
        )
    }

    fn rule_named(name: &str) -> SpawnRule {
        *STANDARD_RULES.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn skip_chance_endpoints() {
        assert_eq!(skip_chance(100, 0, 100), 0);
        assert_eq!(skip_chance(100, 100, 100), 100);
        assert_eq!(skip_chance(100, 50, 100), 25);
        assert_eq!(skip_chance(100, 10, 0), 100);
    }

    #[test]
    fn zero_chance_never_skips() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(!should_skip(&mut rng, 0));
        }
        let always_passes = (0..100).all(|_| !should_skip(&mut rng, 1));
        assert!(always_passes);
    }

    fn passes(seed: u64, chance: u32, draws: u32) -> u32 {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..draws).map(|_| u32::from(!should_skip(&mut rng, chance))).sum()
    }

    #[test]
    fn full_level_passes_about_one_in_a_hundred() {
        let passed = passes(11, skip_chance(100, 100, 100), 10_000);
        assert!((50..=150).contains(&passed), "{passed} of 10000 passed");
    }

    #[test]
    fn half_full_level_passes_about_one_in_twenty_five() {
        let chance = skip_chance(100, 50, 100);
        assert_eq!(chance, 25);
        let passed = passes(12, chance, 10_000);
        assert!((300..=500).contains(&passed), "{passed} of 10000 passed");
    }

    #[test]
    fn level_rolls_follow_depth() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            assert_eq!(roll_level(&mut rng, 0), 1);
            assert_eq!(roll_level(&mut rng, 1), 4);
            assert!((1..=4).contains(&roll_level(&mut rng, -3)));
            assert!((1..=4).contains(&roll_level(&mut rng, -4)));
        }
        let max_at_three = (0..400).map(|_| roll_level(&mut rng, -3)).max();
        assert_eq!(max_at_three, Some(4));
    }

    #[test]
    fn solo_radius_adjustments() {
        assert_eq!(solo_radius(Zombie, -1, Night), 13);
        assert_eq!(solo_radius(Zombie, -4, Night), 15);
        assert_eq!(solo_radius(Cow, 0, Night), 15);
        assert_eq!(solo_radius(Cow, 0, Day), 20);
        assert_eq!(solo_radius(Firefly, 0, Night), 10);
    }

    #[test]
    fn cave_table_thresholds() {
        let caves = rule_named("caves");
        assert_eq!(caves.select(0), Some(&[Slime][..]));
        assert_eq!(caves.select(40), Some(&[Slime][..]));
        assert_eq!(caves.select(41), Some(&[Zombie][..]));
        assert_eq!(caves.select(84), Some(&[Skeleton][..]));
        assert_eq!(caves.select(99), Some(&[OldGolem][..]));
    }

    #[test]
    fn void_only_spawns_below_41() {
        let void = rule_named("void");
        assert_eq!(void.select(40), Some(&[Skeleton][..]));
        assert_eq!(void.select(41), None);
        assert_eq!(void.level, LevelRule::Fixed(1));
    }

    #[test]
    fn fireflies_skip_selector_75() {
        let flies = rule_named("fireflies");
        assert_eq!(flies.select(74), Some(&[Firefly][..]));
        assert_eq!(flies.select(75), None);
        assert_eq!(flies.select(76), Some(&[Firefly][..]));
    }

    #[test]
    fn rules_respect_time_and_flags() {
        let calm = WorldFlags {
            nice_night: true,
            ..WorldFlags::default()
        };
        let night = rule_named("surface night");
        assert!(night.applies(0, Night, &WorldFlags::default()));
        assert!(!night.applies(0, Night, &calm));
        assert!(!night.applies(0, Evening, &WorldFlags::default()));
        assert!(rule_named("fireflies").applies(0, Night, &calm));
        assert!(!rule_named("pasture").applies(0, Evening, &calm));

        let beaten = WorldFlags {
            air_wizard_beaten: true,
            ..WorldFlags::default()
        };
        assert!(rule_named("sky night").applies(1, Night, &beaten));
        assert!(!rule_named("sky night").applies(1, Night, &WorldFlags::default()));
        assert!(rule_named("sky (guarded)").applies(1, Day, &WorldFlags::default()));
        assert_eq!(rule_named("sky").select(33), Some(&[Phyg, Sheepuff][..]));
        assert_eq!(rule_named("sky").select(34), Some(&[Slime][..]));
    }

    #[test]
    fn start_pos_keeps_hostiles_away_from_players() {
        let (grid, mut registry) = ground(ids::DIRT, -1);
        registry.add_at(Entity::player(), 200, 200);
        registry.resolve_pending_adds();
        let e = SpawnEnv {
            monster_density: 0,
            ..env(-1)
        };
        assert!(!check_start_pos(&grid, &registry, Zombie, 200, 240, &e));
        assert!(check_start_pos(&grid, &registry, Zombie, 200, 260, &e));
    }

    #[test]
    fn start_pos_lets_passives_near_players() {
        let (grid, mut registry) = ground(ids::GRASS, 0);
        registry.add_at(Entity::player(), 200, 200);
        registry.resolve_pending_adds();
        let e = SpawnEnv {
            monster_density: 0,
            ..env(0)
        };
        assert!(check_start_pos(&grid, &registry, Cow, 200, 220, &e));
    }

    #[test]
    fn start_pos_requires_a_lonely_spot() {
        let (grid, mut registry) = ground(ids::DIRT, -1);
        registry.add_at(Entity::lantern(), 500, 500);
        registry.resolve_pending_adds();
        let e = env(-1);
        // 8 * 13 = 104 sub-tile units either side.
        assert!(!check_start_pos(&grid, &registry, Slime, 500 + 100, 500, &e));
        assert!(check_start_pos(&grid, &registry, Slime, 500 + 110, 500, &e));
    }

    #[test]
    fn start_pos_checks_ground() {
        let (mut grid, registry) = ground(ids::GRASS, 0);
        grid.set_tile(3, 3, tile::tile(ids::SAND));
        let e = env(0);
        assert!(!check_start_pos(&grid, &registry, Cow, tile_center(3), tile_center(3), &e));
        assert!(check_start_pos(&grid, &registry, Zombie, tile_center(3), tile_center(3), &e));
    }

    #[test]
    fn planner_stops_after_first_success() {
        let (grid, mut registry) = ground(ids::DIRT, -1);
        let planner = SpawnPlanner::new(100, 15);
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = planner.try_spawn(&grid, &mut registry, &mut rng, &env(-1));
        assert!(!outcome.skipped);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.spawned.len(), 1);
        assert_eq!(registry.pending_adds(), outcome.spawned.as_slice());
    }

    #[test]
    fn lava_caves_spawn_pairs() {
        let (grid, mut registry) = ground(ids::DIRT, -3);
        let planner = SpawnPlanner::new(100, 15);
        let mut rng = StdRng::seed_from_u64(8);
        let outcome = planner.try_spawn(&grid, &mut registry, &mut rng, &env(-3));
        assert_eq!(outcome.spawned.len(), 2);
        let species: Vec<_> = outcome
            .spawned
            .iter()
            .map(|id| registry.get(*id).unwrap().species())
            .collect();
        assert_eq!(species[0], species[1]);
    }

    #[test]
    fn planner_gives_up_after_its_attempts() {
        let (grid, mut registry) = ground(ids::ROCK, -1);
        let planner = SpawnPlanner::new(100, 15);
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = planner.try_spawn(&grid, &mut registry, &mut rng, &env(-1));
        assert_eq!(outcome.attempts, 15);
        assert!(outcome.spawned.is_empty());
        assert!(registry.pending_adds().is_empty());
    }

    #[test]
    fn zero_cap_skips() {
        let (grid, mut registry) = ground(ids::DIRT, -1);
        let planner = SpawnPlanner::new(100, 15);
        let mut rng = StdRng::seed_from_u64(3);
        let e = SpawnEnv {
            max_mob_count: 0,
            ..env(-1)
        };
        let outcome = planner.try_spawn(&grid, &mut registry, &mut rng, &e);
        assert!(outcome.skipped);
        assert_eq!(outcome.attempts, 0);
    }

    #[test]
    fn peaceful_filters_hostiles_everywhere() {
        let (grid, mut registry) = ground(ids::DIRT, -1);
        let planner = SpawnPlanner::new(100, 50);
        let mut rng = StdRng::seed_from_u64(3);
        let e = SpawnEnv {
            difficulty: Difficulty::Peaceful,
            ..env(-1)
        };
        for _ in 0..20 {
            let outcome = planner.try_spawn(&grid, &mut registry, &mut rng, &e);
            assert!(outcome.spawned.is_empty());
        }
    }

    proptest! {
        #[test]
        fn skip_chance_never_decreases(max in 1u32..500, count in 0u32..1000) {
            prop_assert!(skip_chance(100, count, max) <= skip_chance(100, count + 1, max));
        }

        #[test]
        fn skip_chance_is_bounded_below_the_cap(max in 1u32..500, count in 0u32..500) {
            prop_assume!(count <= max);
            prop_assert!(skip_chance(100, count, max) <= 100);
        }
    }
}
