use log::{debug, info, warn};
use rand::Rng;
use rand::rngs::StdRng;
use tw_core::entity::{Entity, EntityKind};
use tw_core::geom::TilePos;
use tw_core::grid::{AreaExclusion, TileGrid};
use tw_core::species::Species;
use tw_core::tile::{self, TileId, ids};

use crate::context::WorldFlags;
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEventKind};
use crate::registry::{EntityId, EntityRegistry};
use crate::structure::{Structure, StructureCatalogue};

/// Extra anchor check on top of the base tile and footprint tests.
pub type AnchorCheck<'a> = &'a dyn Fn(&TileGrid, i32, i32) -> bool;

/// One structure to place.
pub struct PlacementRequest<'a> {
    /// Name used in logs and failures.
    pub name: &'a str,
    /// Footprint to stamp; `None` places only the secondary entities.
    pub structure: Option<&'a Structure>,
    /// Tile the anchor must sit on.
    pub base: TileId,
    /// Extra anchor check.
    pub accept: Option<AnchorCheck<'a>>,
    /// Shift from the sampled anchor to the stamped origin.
    pub offset: (i32, i32),
    /// Entities added at tile offsets from the origin.
    pub secondaries: Vec<(i32, i32, Entity)>,
}

impl<'a> PlacementRequest<'a> {
    /// A request to anchor on `base` with nothing to draw yet.
    pub fn new(name: &'a str, base: TileId) -> Self {
        Self {
            name,
            structure: None,
            base,
            accept: None,
            offset: (0, 0),
            secondaries: Vec::new(),
        }
    }

    /// Stamp this footprint.
    pub fn with_structure(mut self, structure: &'a Structure) -> Self {
        self.structure = Some(structure);
        self
    }

    /// Require `accept` to pass at the anchor.
    pub fn with_check(mut self, accept: AnchorCheck<'a>) -> Self {
        self.accept = Some(accept);
        self
    }

    /// Stamp at the anchor shifted by `(dx, dy)`.
    pub fn with_offset(mut self, dx: i32, dy: i32) -> Self {
        self.offset = (dx, dy);
        self
    }

    /// Add `entity` at a tile offset from the origin.
    pub fn with_secondary(mut self, dx: i32, dy: i32, entity: Entity) -> Self {
        self.secondaries.push((dx, dy, entity));
        self
    }
}

/// Where a structure landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Sampled anchor tile.
    pub anchor: TilePos,
    /// Anchor plus the request offset; footprint and secondaries are relative to it.
    pub origin: TilePos,
    /// Anchor samples used, including the successful one.
    pub attempts: u32,
    /// Secondary entities, queued for addition.
    pub entities: Vec<EntityId>,
}

/// Bounded anchor search.
#[derive(Debug, Clone, Copy)]
pub struct StructurePlacer {
    max_attempts: u32,
}

impl StructurePlacer {
    /// A placer allowing `max_attempts` anchor samples per structure.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Anchor samples allowed per structure.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Sample anchors until one is valid, then stamp the footprint and add
    /// the secondary entities there.
    pub fn place<R: Rng>(
        &self,
        grid: &mut TileGrid,
        registry: &mut EntityRegistry,
        rng: &mut R,
        request: PlacementRequest<'_>,
    ) -> SimResult<Placement> {
        for attempt in 1..=self.max_attempts {
            let x = rng.random_range(0..grid.width());
            let y = rng.random_range(0..grid.height());
            if grid.tile(x, y).id != request.base {
                continue;
            }
            let (ox, oy) = (x + request.offset.0, y + request.offset.1);
            if request.structure.is_some_and(|s| !s.fits(grid, ox, oy)) {
                continue;
            }
            if request.accept.is_some_and(|accept| !accept(grid, x, y)) {
                continue;
            }
            debug!("{} anchored at ({x}, {y}) after {attempt} samples", request.name);
            let entities = stamp(grid, registry, x, y, request);
            return Ok(Placement {
                anchor: TilePos::new(x, y),
                origin: TilePos::new(ox, oy),
                attempts: attempt,
                entities,
            });
        }
        Err(SimError::PlacementFailure {
            structure: request.name.to_string(),
            attempts: self.max_attempts,
        })
    }
}

/// Stamp a request at a fixed anchor with no checks.
pub fn stamp(
    grid: &mut TileGrid,
    registry: &mut EntityRegistry,
    x: i32,
    y: i32,
    request: PlacementRequest<'_>,
) -> Vec<EntityId> {
    let (x, y) = (x + request.offset.0, y + request.offset.1);
    if let Some(structure) = request.structure {
        structure.draw(grid, x, y);
    }
    request
        .secondaries
        .into_iter()
        .map(|(dx, dy, entity)| registry.add_at_tile(entity, x + dx, y + dy))
        .collect()
}

/// Shared inputs for level construction.
pub struct GenContext<'a> {
    /// World tick stamped on generation events.
    pub tick: u64,
    /// Anchor search used by every generator.
    pub placer: StructurePlacer,
    /// Structure footprints.
    pub catalogue: &'a StructureCatalogue,
    /// World progress flags.
    pub flags: WorldFlags,
    /// World event log.
    pub events: &'a mut EventLog,
}

impl GenContext<'_> {
    fn placed(&mut self, depth: i32, structure: &str, at: TilePos) {
        self.events.emit(
            self.tick,
            SimEventKind::StructurePlaced {
                depth,
                structure: structure.to_string(),
                x: at.x,
                y: at.y,
            },
            format!("{structure} placed at {at} on depth {depth}"),
        );
    }

    fn failed(&mut self, depth: i32, err: &SimError) {
        warn!("depth {depth}: {err}");
        if let SimError::PlacementFailure { structure, attempts } = err {
            self.events.emit(
                self.tick,
                SimEventKind::PlacementFailed {
                    depth,
                    structure: structure.clone(),
                    attempts: *attempts,
                },
                err.to_string(),
            );
        }
    }
}

/// The mutable parts of a level under construction.
pub struct Site<'a> {
    /// Tiles under construction.
    pub grid: &'a mut TileGrid,
    /// Entities of the level.
    pub registry: &'a mut EntityRegistry,
    /// Level RNG.
    pub rng: &'a mut StdRng,
    /// Locked dungeon chest counter.
    pub chest_count: &'a mut u32,
}

impl Site<'_> {
    fn depth(&self) -> i32 {
        self.grid.depth()
    }
}

/// Spawner dungeons dug into the dirt of a cave level.
pub fn generate_spawner_dungeons(site: &mut Site<'_>, ctx: &mut GenContext<'_>) -> usize {
    let depth = site.depth();
    if depth >= 0 {
        return 0;
    }
    let count = 18 / -depth * (site.grid.width() / 128);
    let catalogue = ctx.catalogue;
    let mut placed = 0;
    for _ in 0..count {
        let species = match site.rng.random_range(0..5) {
            1 => Species::Skeleton,
            0 | 2 => Species::Slime,
            _ => Species::Zombie,
        };
        let level = u8::try_from(-depth).unwrap_or(u8::MAX);
        let mut request = PlacementRequest::new("mob dungeon", ids::DIRT)
            .with_structure(&catalogue.mob_dungeon_center)
            .with_secondary(0, 0, Entity::spawner(species, level));
        for dx in [-1, 1] {
            if site.rng.random_bool(0.5) {
                request = request.with_secondary(dx, -1, Entity::chest(Some("minidungeon"), -depth));
            }
        }
        match ctx.placer.place(site.grid, site.registry, site.rng, request) {
            Ok(placement) => {
                let TilePos { x, y } = placement.anchor;
                draw_dungeon_wings(site.grid, catalogue, x, y);
                ctx.placed(depth, "mob dungeon", placement.anchor);
                placed += 1;
            }
            Err(err) => ctx.failed(depth, &err),
        }
    }
    info!("depth {depth}: {placed}/{count} spawner dungeons");
    placed
}

/// Open a wing on each side of the dungeon centred at `(x, y)` whose
/// neighbouring tile four out is still dirt. Wings are drawn five out.
pub fn draw_dungeon_wings(grid: &mut TileGrid, catalogue: &StructureCatalogue, x: i32, y: i32) -> usize {
    let wings = [
        ((0, -1), &catalogue.mob_dungeon_north),
        ((0, 1), &catalogue.mob_dungeon_south),
        ((1, 0), &catalogue.mob_dungeon_east),
        ((-1, 0), &catalogue.mob_dungeon_west),
    ];
    let mut drawn = 0;
    for ((ux, uy), wing) in wings {
        let (wx, wy) = (x + 5 * ux, y + 5 * uy);
        if grid.tile(x + 4 * ux, y + 4 * uy).id == ids::DIRT && wing.fits(grid, wx, wy) {
            wing.draw(grid, wx, wy);
            drawn += 1;
        }
    }
    drawn
}

/// Minimum tile distance between consecutive village anchors, on either axis.
pub const VILLAGE_SPACING: i32 = 48;

/// Two or three villages on surface grass.
pub fn generate_villages(site: &mut Site<'_>, ctx: &mut GenContext<'_>) -> usize {
    let depth = site.depth();
    let count = site.rng.random_range(2..4);
    let catalogue = ctx.catalogue;
    let mut last = TilePos::new(8, 8);
    let mut placed = 0;
    for _ in 0..count {
        let crops = site.rng.random_bool(0.5);
        let structure = if crops {
            &catalogue.village_crops
        } else {
            &catalogue.village
        };
        let spaced = move |_: &TileGrid, x: i32, y: i32| {
            (x - last.x).abs() > VILLAGE_SPACING || (y - last.y).abs() > VILLAGE_SPACING
        };
        let (xo, yo) = (site.rng.random_range(-8..0), site.rng.random_range(-8..0));
        let second_chest_level = site.rng.random_range(0..10);
        let request = PlacementRequest::new(structure.name(), ids::GRASS)
            .with_structure(structure)
            .with_check(&spaced)
            .with_offset(xo, yo)
            .with_secondary(0, 0, Entity::mob(Species::Cleric, 1))
            .with_secondary(0, 0, Entity::mob(Species::Librarian, 1))
            .with_secondary(5, -5, Entity::mob(Species::Librarian, 1))
            .with_secondary(-5, 4, Entity::mob(Species::Cleric, 1))
            .with_secondary(5, -6, Entity::chest(Some("villagehouse"), 1))
            .with_secondary(-5, 4, Entity::chest(Some("villagehouse"), second_chest_level));
        match ctx.placer.place(site.grid, site.registry, site.rng, request) {
            Ok(placement) => {
                last = placement.anchor;
                ctx.placed(depth, structure.name(), placement.anchor);
                placed += 1;
            }
            Err(err) => ctx.failed(depth, &err),
        }
    }
    info!("depth {depth}: {placed}/{count} villages");
    placed
}

/// Locked chests a dungeon level of this width holds.
pub fn dungeon_chest_target(width: i32) -> u32 {
    u32::try_from(10 * (width / 128)).unwrap_or(0)
}

/// Top up locked dungeon chests until the level holds its target count.
pub fn generate_dungeon_chests(site: &mut Site<'_>, ctx: &mut GenContext<'_>) -> u32 {
    let depth = site.depth();
    let existing = site
        .registry
        .entities_to_save()
        .into_iter()
        .filter(|e| matches!(e.kind, EntityKind::DungeonChest(_)))
        .count();
    *site.chest_count = u32::try_from(existing).unwrap_or(u32::MAX);
    let target = dungeon_chest_target(site.grid.width());
    let mut added = 0;
    while *site.chest_count < target {
        let request =
            PlacementRequest::new("dungeon chest", ids::OBSIDIAN).with_secondary(0, 0, Entity::dungeon_chest());
        match ctx.placer.place(site.grid, site.registry, site.rng, request) {
            Ok(_) => {
                *site.chest_count += 1;
                added += 1;
            }
            Err(err) => {
                ctx.failed(depth, &err);
                break;
            }
        }
    }
    debug!("depth {depth}: {} dungeon chests", site.chest_count);
    added
}

/// Sky dungeon at the centre of the sky level.
pub fn generate_sky_dungeon(site: &mut Site<'_>, ctx: &mut GenContext<'_>) {
    let depth = site.depth();
    let (x, y) = (site.grid.width() / 2, site.grid.height() / 2);
    let request = PlacementRequest::new("sky dungeon", ids::CLOUD).with_structure(&ctx.catalogue.sky_dungeon);
    stamp(site.grid, site.registry, x, y, request);
    ctx.placed(depth, "sky dungeon", TilePos::new(x, y));
}

/// Add the Air Wizard to the sky level unless it was beaten or is already there.
pub fn ensure_air_wizard(site: &mut Site<'_>, flags: WorldFlags) -> Option<EntityId> {
    if site.depth() != 1 || flags.air_wizard_beaten {
        return None;
    }
    let present = site
        .registry
        .entities_to_save()
        .into_iter()
        .any(|e| e.species() == Some(Species::AirWizard));
    if present {
        return None;
    }
    let (x, y) = (site.grid.width() / 2, site.grid.height() / 2);
    Some(site.registry.add_at_tile(Entity::mob(Species::AirWizard, 1), x, y))
}

/// Turn every Stairs Down of the level above into Stairs Up here.
///
/// Returns how many stairs were linked.
pub fn link_stairs(site: &mut Site<'_>, parent: &TileGrid, ctx: &mut GenContext<'_>) -> usize {
    let depth = site.depth();
    let stairs = parent.matching_tiles(|t, _, _| t.id == ids::STAIRS_DOWN);
    let ring = if depth == 0 { ids::HARD_ROCK } else { ids::DIRT };
    for pos in &stairs {
        if depth == -4 {
            let (cx, cy) = (site.grid.width() / 2, site.grid.height() / 2);
            ctx.catalogue.dungeon_gate.draw(site.grid, cx, cy);
            ctx.placed(depth, "dungeon gate", TilePos::new(cx, cy));
        } else {
            site.grid
                .set_area_tiles(pos.x, pos.y, 1, tile::tile(ring), 0, &AreaExclusion::Stairs);
        }
        site.grid.set_tile(pos.x, pos.y, tile::tile(ids::STAIRS_UP));
    }
    debug!("depth {depth}: linked {} stairs", stairs.len());
    stairs.len()
}
