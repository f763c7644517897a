//! Core types for Tiefenwelt: tiles, tile grids, and entity data.
//!
//! This crate defines the data model the simulation kernel operates on. It
//! holds no scheduling or spawning logic: a [`TileGrid`] can be built and
//! queried on its own, and an [`Entity`] is plain data until a level's
//! registry takes ownership of it.

/// Entity data: identifiers, tagged kinds, and per-kind state.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Sub-tile coordinates, tile positions, and rectangles.
pub mod geom;
/// Dense per-layer tile storage with bounds-clamped access.
pub mod grid;
/// The creature catalogue.
pub mod species;
/// The tile catalogue and per-tile behaviour.
pub mod tile;

/// Re-export entity types.
pub use entity::{Eid, Entity, EntityKind};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export geometry types.
pub use geom::{Rect, TilePos};
/// Re-export grid types.
pub use grid::{AreaExclusion, TileGrid};
/// Re-export species types.
pub use species::{Disposition, Species};
/// Re-export tile types.
pub use tile::{Tile, TileId};
