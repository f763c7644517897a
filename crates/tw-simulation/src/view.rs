use std::sync::{Arc, RwLock};

use tw_core::entity::Eid;
use tw_core::geom::Rect;
use tw_core::grid::TileGrid;
use tw_core::tile::{self, Tile, TileId};

use crate::behavior;
use crate::registry::{EntityId, EntityRegistry};

/// What a renderer needs to know about one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityView {
    /// Arena handle.
    pub id: EntityId,
    /// Identity, if the entity is saveable.
    pub eid: Option<Eid>,
    /// Persistence tag of the kind.
    pub tag: &'static str,
    /// Human-readable description of the entity.
    pub label: String,
    /// Horizontal position in sub-tile units.
    pub x: i32,
    /// Vertical position in sub-tile units.
    pub y: i32,
    /// Horizontal hitbox radius.
    pub xr: i32,
    /// Vertical hitbox radius.
    pub yr: i32,
    /// Light emitted, 0 when dark.
    pub light_radius: u8,
}

impl EntityView {
    /// Hitbox in sub-tile units.
    pub fn hitbox(&self) -> Rect {
        Rect::center_dims(self.x, self.y, self.xr * 2, self.yr * 2)
    }
}

/// An immutable picture of one layer, taken at a tick boundary.
#[derive(Debug, Clone)]
pub struct LevelView {
    /// World tick the view was taken at.
    pub tick: u64,
    /// Depth of the layer.
    pub depth: i32,
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
    revision: u64,
    tiles: Arc<[TileId]>,
    data: Arc<[u16]>,
    entities: Vec<EntityView>,
}

impl LevelView {
    /// A view with no tiles and no entities.
    pub fn empty(depth: i32) -> Self {
        Self {
            tick: 0,
            depth,
            width: 0,
            height: 0,
            revision: 0,
            tiles: Arc::from(Vec::new()),
            data: Arc::from(Vec::new()),
            entities: Vec::new(),
        }
    }

    /// Capture the layer's current state. Tile arrays are shared with
    /// `previous` when the grid has not changed since it was taken.
    pub fn capture(tick: u64, grid: &TileGrid, registry: &EntityRegistry, previous: &LevelView) -> Self {
        let unchanged = previous.width == grid.width()
            && previous.height == grid.height()
            && previous.revision == grid.revision()
            && !previous.tiles.is_empty();
        let (tiles, data) = if unchanged {
            (Arc::clone(&previous.tiles), Arc::clone(&previous.data))
        } else {
            (Arc::from(grid.tile_ids()), Arc::from(grid.tile_data()))
        };
        let entities = registry
            .iter()
            .map(|(id, e)| EntityView {
                id,
                eid: e.eid,
                tag: e.tag(),
                label: e.kind.to_string(),
                x: e.x,
                y: e.y,
                xr: e.xr,
                yr: e.yr,
                light_radius: (behavior::behavior(&e.kind).light_radius)(e),
            })
            .collect();
        Self {
            tick,
            depth: grid.depth(),
            width: grid.width(),
            height: grid.height(),
            revision: grid.revision(),
            tiles,
            data,
            entities,
        }
    }

    /// Every entity on the layer.
    pub fn entities(&self) -> &[EntityView] {
        &self.entities
    }

    /// Entities whose hitbox intersects the rectangle.
    pub fn entities_in_rect(&self, area: &Rect) -> Vec<&EntityView> {
        self.entities
            .iter()
            .filter(|e| e.hitbox().intersects(area))
            .collect()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height)
            .then(|| (x as usize) + (y as usize) * (self.width as usize))
    }

    /// Tile at a position, void outside the layer.
    pub fn tile_at(&self, x: i32, y: i32) -> Tile {
        self.index(x, y)
            .and_then(|i| self.tiles.get(i))
            .map_or_else(tile::connector, |&id| tile::tile(id))
    }

    /// Data of the tile at `(x, y)`, 0 out of range.
    pub fn data_at(&self, x: i32, y: i32) -> u16 {
        self.index(x, y)
            .and_then(|i| self.data.get(i).copied())
            .unwrap_or(0)
    }

    /// In-range tiles of the rectangle around `(cx, cy)`.
    pub fn area_tiles(&self, cx: i32, cy: i32, rx: i32, ry: i32) -> Vec<Tile> {
        let mut out = Vec::new();
        for y in (cy - ry)..=(cy + ry) {
            for x in (cx - rx)..=(cx + rx) {
                if self.index(x, y).is_some() {
                    out.push(self.tile_at(x, y));
                }
            }
        }
        out
    }

    /// Light emitted by the tile at `(x, y)`.
    pub fn tile_light_radius(&self, x: i32, y: i32) -> u8 {
        self.tile_at(x, y).light_radius
    }

    /// Entities that emit light.
    pub fn light_sources(&self) -> impl Iterator<Item = &EntityView> + '_ {
        self.entities.iter().filter(|e| e.light_radius > 0)
    }
}

type Slot = Arc<RwLock<Arc<LevelView>>>;

/// Writer side of a layer's published view.
#[derive(Debug)]
pub struct ViewPublisher {
    slot: Slot,
}

impl ViewPublisher {
    /// A publisher holding `initial`.
    pub fn new(initial: LevelView) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Replace the published view. Readers holding the old one keep it.
    pub fn publish(&self, view: LevelView) {
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(view);
    }

    /// The most recently published view.
    pub fn current(&self) -> Arc<LevelView> {
        read(&self.slot)
    }

    /// A cloneable reader handle.
    pub fn handle(&self) -> ViewHandle {
        ViewHandle {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Reader side of a layer's published view. Safe to move to another thread.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    slot: Slot,
}

impl ViewHandle {
    /// The most recently published view.
    pub fn current(&self) -> Arc<LevelView> {
        read(&self.slot)
    }
}

fn read(slot: &Slot) -> Arc<LevelView> {
    let guard = slot.read().unwrap_or_else(|e| e.into_inner());
    Arc::clone(&guard)
}
