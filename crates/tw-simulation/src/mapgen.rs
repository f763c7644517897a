use std::fmt;

use log::debug;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tw_core::tile::{TileId, ids};

/// Smallest level edge the terrain builder accepts.
pub const MIN_LEVEL_SIZE: i32 = 16;

/// Raw tile and data arrays, row-major, `width * height` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMap {
    /// Tile ids, row-major.
    pub tiles: Vec<TileId>,
    /// Per-tile data, row-major.
    pub data: Vec<u16>,
}

/// Produces the initial tiles of a level.
///
/// Returning `None` aborts level construction.
pub trait MapBuilder: fmt::Debug {
    /// Build a `width` x `height` map for `depth`, or `None` when generation failed.
    fn build(&self, width: i32, height: i32, depth: i32, seed: u64) -> Option<RawMap>;
}

/// Noise-driven terrain with one style per depth band.
#[derive(Debug, Clone, Copy)]
pub struct TerrainBuilder {
    max_tries: u32,
}

impl Default for TerrainBuilder {
    fn default() -> Self {
        Self { max_tries: 8 }
    }
}

impl TerrainBuilder {
    /// A builder with the default retry count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds tried before giving up on a level.
    pub fn with_max_tries(mut self, tries: u32) -> Self {
        self.max_tries = tries.max(1);
        self
    }
}

impl MapBuilder for TerrainBuilder {
    fn build(&self, width: i32, height: i32, depth: i32, seed: u64) -> Option<RawMap> {
        if width < MIN_LEVEL_SIZE || height < MIN_LEVEL_SIZE {
            return None;
        }
        for attempt in 0..u64::from(self.max_tries) {
            let mut canvas = Canvas::new(width, height, seed.wrapping_add(attempt));
            match depth {
                2 => canvas.void(),
                1 => canvas.sky(),
                0 => canvas.surface(),
                -3 => canvas.caves(ids::LAVA, None),
                -4 => canvas.dungeon(),
                -1 => canvas.caves(ids::WATER, Some(ids::IRON_ORE)),
                -2 => canvas.caves(ids::WATER, Some(ids::GOLD_ORE)),
                _ => return None,
            }
            if validate(&canvas, depth) {
                debug!("depth {depth}: terrain accepted after {} tries", attempt + 1);
                return Some(canvas.into_raw());
            }
        }
        debug!("depth {depth}: no valid terrain in {} tries", self.max_tries);
        None
    }
}

/// Whether a finished map meets the layout guarantees for its depth.
fn validate(canvas: &Canvas, depth: i32) -> bool {
    let cells = canvas.tiles.len();
    let stairs = canvas.count(ids::STAIRS_DOWN);
    match depth {
        0 => stairs >= 2 && canvas.count(ids::GRASS) >= cells / 20,
        1 => stairs >= 2 && canvas.count(ids::CLOUD) >= cells / 10,
        -1 | -2 => stairs >= 2 && canvas.count(ids::ROCK) >= cells / 10,
        -3 => {
            stairs == 1
                && canvas.get(canvas.width / 2, canvas.height / 2) == ids::STAIRS_DOWN
                && canvas.count(ids::ROCK) >= cells / 10
        }
        -4 => stairs == 0 && canvas.count(ids::OBSIDIAN) >= cells / 4,
        _ => true,
    }
}

struct Canvas {
    width: i32,
    height: i32,
    tiles: Vec<TileId>,
    data: Vec<u16>,
    rng: StdRng,
    seed: u32,
}

impl Canvas {
    fn new(width: i32, height: i32, seed: u64) -> Self {
        let cells = (width * height) as usize;
        Self {
            width,
            height,
            tiles: vec![ids::CONNECTOR; cells],
            data: vec![0; cells],
            rng: StdRng::seed_from_u64(seed),
            seed: (seed ^ (seed >> 32)) as u32,
        }
    }

    fn field(&self, salt: u32, frequency: f64) -> Fbm<Perlin> {
        Fbm::<Perlin>::new(self.seed.wrapping_add(salt))
            .set_octaves(4)
            .set_frequency(frequency)
            .set_lacunarity(2.0)
            .set_persistence(0.5)
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (x + y * self.width) as usize
    }

    fn get(&self, x: i32, y: i32) -> TileId {
        self.tiles[self.index(x, y)]
    }

    fn set(&mut self, x: i32, y: i32, id: TileId) {
        let i = self.index(x, y);
        self.tiles[i] = id;
        self.data[i] = 0;
    }

    fn count(&self, id: TileId) -> usize {
        self.tiles.iter().filter(|&&t| t == id).count()
    }

    /// Fill every cell from a function of the two noise samples at that cell.
    fn paint(&mut self, a: &Fbm<Perlin>, b: &Fbm<Perlin>, pick: impl Fn(f64, f64) -> (TileId, u16)) {
        for y in 0..self.height {
            for x in 0..self.width {
                let p = [f64::from(x) + 0.5, f64::from(y) + 0.5];
                let (id, data) = pick(a.get(p), b.get(p));
                let i = self.index(x, y);
                self.tiles[i] = id;
                self.data[i] = data;
            }
        }
    }

    /// Scatter `id` over cells currently holding `on`, each with probability `chance`.
    fn sprinkle(&mut self, on: TileId, id: TileId, chance: f64) {
        for i in 0..self.tiles.len() {
            if self.tiles[i] == on && self.rng.random_bool(chance) {
                self.tiles[i] = id;
                self.data[i] = 0;
            }
        }
    }

    /// Put down `count` Stairs Down on interior cells accepted by `ground`.
    fn stairs(&mut self, count: usize, ground: impl Fn(TileId) -> bool) {
        let mut placed = 0;
        for _ in 0..count * 500 {
            if placed == count {
                break;
            }
            let x = self.rng.random_range(2..self.width - 2);
            let y = self.rng.random_range(2..self.height - 2);
            if ground(self.get(x, y)) {
                self.set(x, y, ids::STAIRS_DOWN);
                placed += 1;
            }
        }
    }

    fn stairs_count(&self) -> usize {
        ((self.width * self.height) as usize / 2048).max(2)
    }

    fn surface(&mut self) {
        let elevation = self.field(0, 0.04);
        let climate = self.field(1, 0.02);
        self.paint(&elevation, &climate, |e, c| {
            let id = if e < -0.35 {
                ids::WATER
            } else if e < -0.25 {
                ids::SAND
            } else if e > 0.45 {
                ids::ROCK
            } else if c < -0.4 {
                ids::SNOW
            } else if c > 0.35 {
                ids::SAND
            } else if e > 0.25 {
                ids::TREE
            } else {
                ids::GRASS
            };
            (id, 0)
        });
        self.sprinkle(ids::GRASS, ids::FLOWER, 0.02);
        self.sprinkle(ids::GRASS, ids::TREE, 0.03);
        let count = self.stairs_count();
        self.stairs(count, |t| t == ids::ROCK);
        let missing = count.saturating_sub(self.count(ids::STAIRS_DOWN));
        self.stairs(missing, |t| t != ids::WATER);
    }

    fn caves(&mut self, liquid: TileId, ore: Option<TileId>) {
        let tunnels = self.field(10, 0.06);
        let pools = self.field(11, 0.08);
        self.paint(&tunnels, &pools, |t, p| {
            let id = if t > 0.1 {
                if p > 0.45 { liquid } else { ids::DIRT }
            } else if t < -0.5 {
                ids::HARD_ROCK
            } else {
                ids::ROCK
            };
            (id, 0)
        });
        if let Some(ore) = ore {
            self.sprinkle(ids::ROCK, ore, 0.03);
        }
        if liquid == ids::LAVA {
            let (cx, cy) = (self.width / 2, self.height / 2);
            for y in cy - 1..=cy + 1 {
                for x in cx - 1..=cx + 1 {
                    self.set(x, y, ids::DIRT);
                }
            }
            self.set(cx, cy, ids::STAIRS_DOWN);
        } else {
            let count = self.stairs_count();
            self.stairs(count, |t| t == ids::DIRT || t == ids::ROCK);
        }
    }

    fn dungeon(&mut self) {
        let walls = self.field(20, 0.09);
        let pools = self.field(21, 0.05);
        self.paint(&walls, &pools, |w, p| {
            let id = if p > 0.55 {
                ids::LAVA
            } else if w > 0.3 {
                ids::OBSIDIAN_WALL
            } else {
                ids::OBSIDIAN
            };
            (id, 0)
        });
    }

    fn sky(&mut self) {
        let clouds = self.field(30, 0.05);
        let lawns = self.field(31, 0.07);
        self.paint(&clouds, &lawns, |c, l| {
            let id = if c < -0.2 {
                ids::INFINITE_FALL
            } else if l > 0.4 {
                ids::SKY_LAWN
            } else if l > 0.2 {
                ids::SKY_GRASS
            } else {
                ids::CLOUD
            };
            (id, 0)
        });
        self.sprinkle(ids::CLOUD, ids::CLOUD_CACTUS, 0.01);
        let count = self.stairs_count();
        self.stairs(count, |t| t == ids::CLOUD);
    }

    fn void(&mut self) {
        let ore = self.field(40, 0.08);
        let drift = self.field(41, 0.03);
        self.paint(&ore, &drift, |o, d| {
            if o > 0.55 {
                (ids::FERROSITE, 0)
            } else if o > 0.4 {
                (ids::INFINITE_FALL, 2)
            } else if d > 0.3 {
                (ids::INFINITE_FALL, 1)
            } else {
                (ids::INFINITE_FALL, 0)
            }
        });
    }

    fn into_raw(self) -> RawMap {
        RawMap {
            tiles: self.tiles,
            data: self.data,
        }
    }
}
