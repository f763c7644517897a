use std::fmt;

use serde::{Deserialize, Serialize};

/// Edge length of one tile in sub-tile units.
pub const TILE_SIZE: i32 = 16;

/// Shift converting sub-tile units to tile coordinates.
pub const TILE_SHIFT: i32 = 4;

/// Tile coordinate containing the given sub-tile coordinate.
pub fn to_tile(v: i32) -> i32 {
    v >> TILE_SHIFT
}

/// Sub-tile coordinate of the centre of the given tile.
pub fn tile_center(t: i32) -> i32 {
    (t << TILE_SHIFT) + TILE_SIZE / 2
}

/// A tile coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Create a tile position.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Sub-tile coordinates of this tile's centre.
    pub fn center(self) -> (i32, i32) {
        (tile_center(self.x), tile_center(self.y))
    }

    /// Offset this position by a tile delta.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle in sub-tile units, half-open on the right and bottom.
///
/// Rectangles whose edges merely touch do not intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x0: i32,
    /// Top edge.
    pub y0: i32,
    /// Right edge.
    pub x1: i32,
    /// Bottom edge.
    pub y1: i32,
}

impl Rect {
    /// Create a rectangle from its corner coordinates.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a rectangle centred on `(cx, cy)` with the given full width and height.
    pub fn center_dims(cx: i32, cy: i32, w: i32, h: i32) -> Self {
        let x0 = cx - w / 2;
        let y0 = cy - h / 2;
        Self::new(x0, y0, x0 + w, y0 + h)
    }

    /// Square of half-size `r` centred on `(cx, cy)`.
    pub fn around(cx: i32, cy: i32, r: i32) -> Self {
        Self::new(cx - r, cy - r, cx + r, cy + r)
    }

    /// Rectangle covering the tiles `xt0..=xt1` by `yt0..=yt1`.
    pub fn from_tiles(xt0: i32, yt0: i32, xt1: i32, yt1: i32) -> Self {
        Self::new(
            xt0 << TILE_SHIFT,
            yt0 << TILE_SHIFT,
            (xt1 + 1) << TILE_SHIFT,
            (yt1 + 1) << TILE_SHIFT,
        )
    }

    /// Return `true` if the two rectangles share interior area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Return `true` if the point lies inside the rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Translate by a sub-tile delta.
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }

    /// Width in sub-tile units.
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    /// Height in sub-tile units.
    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }
}
