use rand::Rng;

use crate::error::{CoreError, CoreResult};
use crate::geom::TilePos;
use crate::tile::{self, Tile, TileId, TileTick, ids};

/// Which tiles `set_area_tiles` leaves alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AreaExclusion {
    /// Skip any tile whose name contains "stairs".
    #[default]
    Stairs,
    /// Skip stairs and any tile whose name is listed (case-insensitive).
    Blacklist(Vec<String>),
    /// Overwrite everything in range.
    None,
}

impl AreaExclusion {
    fn skips(&self, t: Tile) -> bool {
        match self {
            AreaExclusion::Stairs => t.is_stairs(),
            AreaExclusion::Blacklist(names) => t.is_stairs() || names.iter().any(|n| t.is_named(n)),
            AreaExclusion::None => false,
        }
    }
}

/// Dense tile storage for one layer: a tile id and a data word per cell.
///
/// All reads clamp: out-of-range coordinates return the void sentinel
/// (`"Connector Tile"`, data 0) and out-of-range writes are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    depth: i32,
    seed: u64,
    tiles: Vec<TileId>,
    data: Vec<u16>,
    revision: u64,
}

impl TileGrid {
    /// Create a grid where every cell holds the void sentinel.
    pub fn new(width: i32, height: i32, depth: i32, seed: u64) -> CoreResult<Self> {
        Self::filled(width, height, depth, seed, tile::connector())
    }

    /// Create a grid where every cell holds `fill` with data 0.
    pub fn filled(width: i32, height: i32, depth: i32, seed: u64, fill: Tile) -> CoreResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        let cells = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            depth,
            seed,
            tiles: vec![fill.id; cells],
            data: vec![0; cells],
            revision: 0,
        })
    }

    /// Rebuild a grid from raw row-major arrays.
    pub fn from_raw(
        width: i32,
        height: i32,
        depth: i32,
        seed: u64,
        tiles: Vec<TileId>,
        data: Vec<u16>,
    ) -> CoreResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if tiles.len() != expected || data.len() != expected {
            return Err(CoreError::RawLength {
                expected,
                tiles: tiles.len(),
                data: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depth,
            seed,
            tiles,
            data,
            revision: 0,
        })
    }

    /// Width in tiles.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Depth of the layer this grid belongs to.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Seed the grid was generated from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Counter bumped by every write that changes a cell.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Raw tile ids in row-major order.
    pub fn tile_ids(&self) -> &[TileId] {
        &self.tiles
    }

    /// Raw data words in row-major order.
    pub fn tile_data(&self) -> &[u16] {
        &self.data
    }

    /// Whether `(x, y)` is inside the grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| (x as usize) + (y as usize) * (self.width as usize))
    }

    /// Tile at `(x, y)`, or the void sentinel when out of range.
    pub fn tile(&self, x: i32, y: i32) -> Tile {
        match self.index(x, y) {
            Some(i) => tile::tile(self.tiles[i]),
            None => tile::connector(),
        }
    }

    /// Data word at `(x, y)`, or 0 when out of range.
    pub fn data(&self, x: i32, y: i32) -> u16 {
        self.index(x, y).map_or(0, |i| self.data[i])
    }

    /// Set a tile and reset its data to 0.
    pub fn set_tile(&mut self, x: i32, y: i32, t: Tile) {
        self.set_tile_with_data(x, y, t, 0);
    }

    /// Set a tile together with its data word.
    pub fn set_tile_with_data(&mut self, x: i32, y: i32, t: Tile, data: u16) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.tiles[i] != t.id || self.data[i] != data {
            self.tiles[i] = t.id;
            self.data[i] = data;
            self.revision += 1;
        }
    }

    /// Overwrite the data word of an in-range cell.
    pub fn set_data(&mut self, x: i32, y: i32, data: u16) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.data[i] != data {
            self.data[i] = data;
            self.revision += 1;
        }
    }

    /// In-range positions of the rectangle `[cx - rx, cx + rx] x [cy - ry, cy + ry]`.
    pub fn area_positions(&self, cx: i32, cy: i32, rx: i32, ry: i32) -> Vec<TilePos> {
        let mut out = Vec::new();
        for y in (cy - ry)..=(cy + ry) {
            for x in (cx - rx)..=(cx + rx) {
                if self.in_bounds(x, y) {
                    out.push(TilePos::new(x, y));
                }
            }
        }
        out
    }

    /// Tiles of the rectangle, one entry per in-range position.
    pub fn area_tiles(&self, cx: i32, cy: i32, rx: i32, ry: i32) -> Vec<Tile> {
        self.area_positions(cx, cy, rx, ry)
            .into_iter()
            .map(|p| self.tile(p.x, p.y))
            .collect()
    }

    /// Fill the square of radius `r` around `(cx, cy)`, skipping cells the exclusion protects.
    pub fn set_area_tiles(
        &mut self,
        cx: i32,
        cy: i32,
        r: i32,
        t: Tile,
        data: u16,
        exclusion: &AreaExclusion,
    ) {
        for y in (cy - r)..=(cy + r) {
            for x in (cx - r)..=(cx + r) {
                if self.in_bounds(x, y) && !exclusion.skips(self.tile(x, y)) {
                    self.set_tile_with_data(x, y, t, data);
                }
            }
        }
    }

    /// All positions whose tile satisfies the predicate, in row-major order.
    pub fn matching_tiles(&self, mut pred: impl FnMut(Tile, i32, i32) -> bool) -> Vec<TilePos> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if pred(self.tile(x, y), x, y) {
                    out.push(TilePos::new(x, y));
                }
            }
        }
        out
    }

    /// Number of cells holding the given tile.
    pub fn count(&self, id: TileId) -> usize {
        self.tiles.iter().filter(|&&t| t == id).count()
    }

    /// Run the tile's own behaviour at `(x, y)`. Returns `true` if anything changed.
    pub fn tick_tile<R: Rng>(&mut self, x: i32, y: i32, rng: &mut R) -> bool {
        let here = self.tile(x, y);
        let before = self.revision;
        match here.tick {
            TileTick::Inert => {}
            TileTick::Spread { into, one_in } => {
                if rng.random_range(0..one_in) == 0 {
                    let (dx, dy) = match rng.random_range(0..4) {
                        0 => (1, 0),
                        1 => (-1, 0),
                        2 => (0, 1),
                        _ => (0, -1),
                    };
                    if self.tile(x + dx, y + dy).id == into {
                        self.set_tile(x + dx, y + dy, here);
                    }
                }
            }
            TileTick::Grow { max_stage, one_in } => {
                let stage = self.data(x, y);
                if stage < max_stage && rng.random_range(0..one_in) == 0 {
                    self.set_data(x, y, stage + 1);
                }
            }
            TileTick::Settle => {
                let into = match self.data(x, y) {
                    1 => Some(ids::CLOUD),
                    2 => Some(ids::FERROSITE),
                    _ => None,
                };
                if let Some(into) = into
                    && rng.random_range(0..4) == 0
                {
                    self.set_tile(x, y, tile::tile(into));
                }
            }
        }
        self.revision != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn grass_grid(w: i32, h: i32) -> TileGrid {
        TileGrid::filled(w, h, 0, 1, tile::tile(ids::GRASS)).unwrap()
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(matches!(
            TileGrid::new(0, 10, 0, 0),
            Err(CoreError::InvalidDimensions { width: 0, height: 10 })
        ));
    }

    #[test]
    fn set_and_get_inside_bounds() {
        let mut grid = TileGrid::new(10, 10, 0, 0).unwrap();
        grid.set_tile(5, 5, tile::tile(ids::GRASS));
        assert_eq!(grid.tile(5, 5).name, "Grass");
        assert_eq!(grid.tile(4, 5).name, "Connector Tile");
    }

    #[test]
    fn out_of_range_reads_are_void() {
        let grid = grass_grid(10, 10);
        assert_eq!(grid.tile(-1, 0).name, "Connector Tile");
        assert_eq!(grid.tile(10, 3).name, "Connector Tile");
        assert_eq!(grid.data(3, 10), 0);
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let mut grid = grass_grid(4, 4);
        let before = grid.clone();
        grid.set_tile(4, 0, tile::tile(ids::ROCK));
        grid.set_data(-1, 2, 7);
        assert_eq!(grid, before);
    }

    #[test]
    fn data_is_returned_verbatim() {
        let mut grid = grass_grid(4, 4);
        grid.set_tile_with_data(1, 1, tile::tile(ids::WHEAT), 0xBEEF);
        assert_eq!(grid.data(1, 1), 0xBEEF);
        grid.set_tile(1, 1, tile::tile(ids::DIRT));
        assert_eq!(grid.data(1, 1), 0);
    }

    #[test]
    fn area_tiles_only_cover_in_range_cells() {
        let grid = grass_grid(10, 10);
        assert_eq!(grid.area_tiles(0, 0, 1, 1).len(), 4);
        assert_eq!(grid.area_tiles(5, 5, 1, 2).len(), 15);
        assert!(grid.area_positions(-5, -5, 1, 1).is_empty());
    }

    #[test]
    fn set_area_skips_stairs() {
        let mut grid = grass_grid(10, 10);
        grid.set_tile(5, 5, tile::tile(ids::STAIRS_DOWN));
        grid.set_area_tiles(5, 5, 1, tile::tile(ids::HARD_ROCK), 0, &AreaExclusion::Stairs);
        assert_eq!(grid.tile(5, 5).id, ids::STAIRS_DOWN);
        assert_eq!(grid.tile(4, 4).id, ids::HARD_ROCK);
        assert_eq!(grid.count(ids::HARD_ROCK), 8);
    }

    #[test]
    fn set_area_blacklist_is_case_insensitive() {
        let mut grid = grass_grid(5, 5);
        grid.set_tile(2, 1, tile::tile(ids::TREE));
        let exclusion = AreaExclusion::Blacklist(vec!["tree".into()]);
        grid.set_area_tiles(2, 2, 1, tile::tile(ids::DIRT), 0, &exclusion);
        assert_eq!(grid.tile(2, 1).id, ids::TREE);
        assert_eq!(grid.count(ids::DIRT), 8);
    }

    #[test]
    fn set_area_none_overwrites_stairs() {
        let mut grid = grass_grid(5, 5);
        grid.set_tile(2, 2, tile::tile(ids::STAIRS_UP));
        grid.set_area_tiles(2, 2, 0, tile::tile(ids::DIRT), 0, &AreaExclusion::None);
        assert_eq!(grid.tile(2, 2).id, ids::DIRT);
    }

    #[test]
    fn matching_tiles_finds_every_hit() {
        let mut grid = grass_grid(6, 6);
        grid.set_tile(1, 2, tile::tile(ids::STAIRS_DOWN));
        grid.set_tile(4, 5, tile::tile(ids::STAIRS_DOWN));
        let hits = grid.matching_tiles(|t, _, _| t.id == ids::STAIRS_DOWN);
        assert_eq!(hits, vec![TilePos::new(1, 2), TilePos::new(4, 5)]);
    }

    #[test]
    fn from_raw_validates_lengths() {
        let err = TileGrid::from_raw(3, 3, 0, 0, vec![0; 9], vec![0; 8]).unwrap_err();
        assert!(matches!(err, CoreError::RawLength { expected: 9, tiles: 9, data: 8 }));
        let ok = TileGrid::from_raw(3, 3, -1, 4, vec![ids::DIRT; 9], vec![0; 9]).unwrap();
        assert_eq!(ok.tile(2, 2).id, ids::DIRT);
        assert_eq!(ok.depth(), -1);
    }

    #[test]
    fn revision_tracks_real_changes_only() {
        let mut grid = grass_grid(3, 3);
        grid.set_tile(1, 1, tile::tile(ids::GRASS));
        assert_eq!(grid.revision(), 0);
        grid.set_tile(1, 1, tile::tile(ids::DIRT));
        assert_eq!(grid.revision(), 1);
    }

    #[test]
    fn wheat_grows_to_its_final_stage() {
        let mut grid = grass_grid(1, 1);
        grid.set_tile(0, 0, tile::tile(ids::WHEAT));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            grid.tick_tile(0, 0, &mut rng);
        }
        assert_eq!(grid.data(0, 0), 50);
    }

    #[test]
    fn infinite_fall_without_data_never_settles() {
        let mut grid = TileGrid::filled(2, 1, 2, 0, tile::tile(ids::INFINITE_FALL)).unwrap();
        grid.set_data(1, 0, 2);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            grid.tick_tile(0, 0, &mut rng);
            grid.tick_tile(1, 0, &mut rng);
        }
        assert_eq!(grid.tile(0, 0).id, ids::INFINITE_FALL);
        assert_eq!(grid.tile(1, 0).id, ids::FERROSITE);
    }

    #[test]
    fn grass_spreads_onto_dirt() {
        let mut grid = TileGrid::filled(3, 3, 0, 0, tile::tile(ids::DIRT)).unwrap();
        grid.set_tile(1, 1, tile::tile(ids::GRASS));
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5000 {
            grid.tick_tile(1, 1, &mut rng);
        }
        assert_eq!(grid.count(ids::GRASS), 5);
    }

    proptest! {
        #[test]
        fn reads_never_panic(w in 1i32..40, h in 1i32..40, x in -100i32..100, y in -100i32..100) {
            let grid = grass_grid(w, h);
            let t = grid.tile(x, y);
            if grid.in_bounds(x, y) {
                prop_assert_eq!(t.id, ids::GRASS);
            } else {
                prop_assert_eq!(t.id, ids::CONNECTOR);
                prop_assert_eq!(grid.data(x, y), 0);
            }
        }

        #[test]
        fn raw_arrays_rebuild_the_same_grid(w in 1i32..20, h in 1i32..20, cells in proptest::collection::vec((0u16..28, any::<u16>()), 400)) {
            let mut grid = TileGrid::new(w, h, 0, 5).unwrap();
            for (i, (t, d)) in cells.iter().enumerate().take((w * h) as usize) {
                let i = i as i32;
                grid.set_tile_with_data(i % w, i / w, tile::tile(*t), *d);
            }
            let rebuilt = TileGrid::from_raw(w, h, 0, 5, grid.tile_ids().to_vec(), grid.tile_data().to_vec()).unwrap();
            prop_assert_eq!(rebuilt.tile_ids(), grid.tile_ids());
            prop_assert_eq!(rebuilt.tile_data(), grid.tile_data());
        }

        #[test]
        fn area_positions_are_in_range(w in 1i32..30, h in 1i32..30, cx in -10i32..40, cy in -10i32..40, r in 0i32..6) {
            let grid = grass_grid(w, h);
            for p in grid.area_positions(cx, cy, r, r) {
                prop_assert!(grid.in_bounds(p.x, p.y));
                prop_assert!((p.x - cx).abs() <= r && (p.y - cy).abs() <= r);
            }
        }
    }
}
