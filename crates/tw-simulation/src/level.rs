use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tw_core::grid::TileGrid;

use crate::error::{SimError, SimResult};
use crate::event::SimEventKind;
use crate::mapgen::MapBuilder;
use crate::placement::{self, GenContext, Site};
use crate::registry::{EidSource, EntityRegistry};
use crate::view::{LevelView, ViewHandle, ViewPublisher};

/// Highest level of the world.
pub const TOP_DEPTH: i32 = 2;
/// Deepest level of the world.
pub const BOTTOM_DEPTH: i32 = -4;

/// Display name of the level at `depth`.
pub fn level_name(depth: i32) -> &'static str {
    match depth {
        2 => "The Void",
        1 => "Heaven",
        0 => "Surface",
        -1 => "Iron",
        -2 => "Gold",
        -3 => "Lava",
        -4 => "Dungeon",
        _ => "Unknown",
    }
}

/// Exclusion multiplier around spawn candidates.
pub fn monster_density(depth: i32) -> i32 {
    if depth == 0 || depth == -4 { 8 } else { 9 }
}

/// One layer of the world: its tiles, its entities and its population counters.
#[derive(Debug)]
pub struct Level {
    pub(crate) depth: i32,
    pub(crate) grid: TileGrid,
    pub(crate) registry: EntityRegistry,
    pub(crate) rng: StdRng,
    pub(crate) mob_count: u32,
    pub(crate) max_mob_count: u32,
    pub(crate) chest_count: u32,
    pub(crate) publisher: ViewPublisher,
}

impl Level {
    /// Wrap an existing grid. The level starts with no entities.
    pub fn from_grid(grid: TileGrid, eids: EidSource) -> Self {
        let depth = grid.depth();
        Self {
            depth,
            rng: StdRng::seed_from_u64(grid.seed()),
            registry: EntityRegistry::new(depth, eids),
            grid,
            mob_count: 0,
            max_mob_count: 0,
            chest_count: 0,
            publisher: ViewPublisher::new(LevelView::empty(depth)),
        }
    }

    /// Build a level from scratch: terrain, structures and stairs linked to `parent`.
    ///
    /// A builder that produces no map, or arrays of the wrong length, fails
    /// with [`SimError::GenerationFailure`].
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        width: i32,
        height: i32,
        seed: u64,
        depth: i32,
        parent: Option<&Level>,
        builder: &dyn MapBuilder,
        eids: EidSource,
        ctx: &mut GenContext<'_>,
    ) -> SimResult<Self> {
        let raw = builder
            .build(width, height, depth, seed)
            .ok_or_else(|| SimError::GenerationFailure {
                depth,
                reason: "map builder returned no map".into(),
            })?;
        let grid = TileGrid::from_raw(width, height, depth, seed, raw.tiles, raw.data).map_err(|e| {
            SimError::GenerationFailure {
                depth,
                reason: e.to_string(),
            }
        })?;
        let mut level = Self::from_grid(grid, eids);

        let mut site = level.site();
        if (-3..0).contains(&depth) {
            placement::generate_spawner_dungeons(&mut site, ctx);
        }
        if depth == 0 {
            placement::generate_villages(&mut site, ctx);
        }
        match parent {
            Some(parent) => {
                placement::link_stairs(&mut site, &parent.grid, ctx);
            }
            None if depth == 1 => placement::generate_sky_dungeon(&mut site, ctx),
            None => {}
        }
        if depth == BOTTOM_DEPTH {
            placement::generate_dungeon_chests(&mut site, ctx);
        }
        placement::ensure_air_wizard(&mut site, ctx.flags);

        ctx.events.emit(
            ctx.tick,
            SimEventKind::LevelGenerated { depth },
            format!("{} generated", level_name(depth)),
        );
        info!(
            "generated {} ({width}x{height}, depth {depth}, {} entities queued)",
            level_name(depth),
            level.registry.pending_adds().len()
        );
        level.publish(ctx.tick);
        Ok(level)
    }

    pub(crate) fn site(&mut self) -> Site<'_> {
        Site {
            grid: &mut self.grid,
            registry: &mut self.registry,
            rng: &mut self.rng,
            chest_count: &mut self.chest_count,
        }
    }

    /// Depth of this level.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Display name for the depth.
    pub fn name(&self) -> &'static str {
        level_name(self.depth)
    }

    /// Tiles of the level.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Tiles of the level, mutably.
    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    /// Entities of the level.
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Entities of the level, mutably.
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Mobs counted during the last tick.
    pub fn mob_count(&self) -> u32 {
        self.mob_count
    }

    /// Population cap computed at the start of the last tick.
    pub fn max_mob_count(&self) -> u32 {
        self.max_mob_count
    }

    /// Locked dungeon chests left on this level.
    pub fn chest_count(&self) -> u32 {
        self.chest_count
    }

    /// Overwrite the locked dungeon chest counter.
    pub fn set_chest_count(&mut self, count: u32) {
        self.chest_count = count;
    }

    /// Spawn density for this depth.
    pub fn monster_density(&self) -> i32 {
        monster_density(self.depth)
    }

    /// Reseed the level's own random stream.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Publish the current state to readers.
    pub fn publish(&self, tick: u64) {
        let previous = self.publisher.current();
        self.publisher
            .publish(LevelView::capture(tick, &self.grid, &self.registry, &previous));
    }

    /// Handle for reading published views from another thread.
    pub fn view_handle(&self) -> ViewHandle {
        self.publisher.handle()
    }
}
