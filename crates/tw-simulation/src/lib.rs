//! Tick-driven simulation kernel for Tiefenwelt.
//!
//! A [`World`] owns a stack of [`Level`]s, one per depth. Each level pairs a
//! [`tw_core::TileGrid`] with an [`EntityRegistry`] whose structural changes
//! are deferred to fixed resolution points in the tick. Levels are generated
//! by a [`MapBuilder`] and decorated with structures; populations are kept in
//! check by the [`SpawnPlanner`] and by eviction against a difficulty-driven
//! cap. Readers on other threads see published [`LevelView`]s instead of live
//! state.

/// Per-kind behaviour tables: tick, interact, light.
pub mod behavior;
/// Day clock and time-of-day bands.
pub mod clock;
/// Configuration types for building and running a world.
pub mod config;
/// Mutable context passed to a level each tick.
pub mod context;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types and the event log.
pub mod event;
/// One world layer: grid, registry and counters.
pub mod level;
/// Map builders producing raw level terrain.
pub mod mapgen;
/// Tile and entity collision for moving entities.
pub mod movement;
/// Level snapshots and the tag-keyed entity factory.
pub mod persist;
/// Bounded structure placement and the level generators built on it.
pub mod placement;
/// Per-layer entity ownership with deferred add and remove.
pub mod registry;
/// The level tick sequence and population cap enforcement.
pub mod scheduler;
/// Settings collaborator: key lookup with typed accessors.
pub mod settings;
/// Spawn tables and the spawn planner.
pub mod spawn;
/// Multi-tile footprints parsed from ASCII layouts.
pub mod structure;
/// Ambient hooks run once per full level tick.
pub mod trigger;
/// Read-only level views published for other threads.
pub mod view;
/// The world context object tying levels together.
pub mod world;

/// Re-export of [`clock::DayClock`] and [`clock::TimeOfDay`].
pub use clock::{DayClock, TimeOfDay};
/// Re-export of [`config::WorldConfig`].
pub use config::WorldConfig;
/// Re-exports of [`context::TickContext`] and [`context::WorldFlags`].
pub use context::{TickContext, WorldFlags};
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of [`event::EventLog`], [`event::SimEvent`], and [`event::SimEventKind`].
pub use event::{EventLog, SimEvent, SimEventKind};
/// Re-export of [`level::Level`].
pub use level::Level;
/// Re-exports of [`mapgen::MapBuilder`], [`mapgen::RawMap`], and [`mapgen::TerrainBuilder`].
pub use mapgen::{MapBuilder, RawMap, TerrainBuilder};
/// Re-exports of the persistence types.
pub use persist::{EntityFactory, EntityRecord, LevelSnapshot};
/// Re-exports of [`placement::PlacementRequest`] and [`placement::StructurePlacer`].
pub use placement::{PlacementRequest, StructurePlacer};
/// Re-exports of the registry types.
pub use registry::{EidSource, EntityId, EntityRegistry, Lifecycle};
/// Re-exports of [`scheduler::TickMode`] and [`scheduler::TickReport`].
pub use scheduler::{TickMode, TickReport};
/// Re-exports of the settings collaborator.
pub use settings::{Difficulty, MapSettings, Settings};
/// Re-export of [`spawn::SpawnPlanner`].
pub use spawn::SpawnPlanner;
/// Re-exports of [`structure::Structure`] and [`structure::StructureCatalogue`].
pub use structure::{Structure, StructureCatalogue};
/// Re-export of [`trigger::Trigger`].
pub use trigger::Trigger;
/// Re-exports of [`view::LevelView`] and [`view::ViewHandle`].
pub use view::{LevelView, ViewHandle};
/// Re-exports of the world context object.
pub use world::{PlayerIntent, RunSummary, World};
