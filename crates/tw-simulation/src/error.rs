use tw_core::CoreError;
use tw_core::entity::Eid;

/// Result alias for kernel operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised by the simulation kernel.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A level could not be built.
    #[error("failed to generate level at depth {depth}: {reason}")]
    GenerationFailure {
        /// Depth of the level.
        depth: i32,
        /// What went wrong.
        reason: String,
    },

    /// No valid anchor was found within the attempt bound.
    #[error("could not place {structure} after {attempts} attempts")]
    PlacementFailure {
        /// Name of the structure.
        structure: String,
        /// Anchor samples tried.
        attempts: u32,
    },

    /// A structure template could not be parsed.
    #[error("structure {name} is malformed: {reason}")]
    InvalidStructure {
        /// Name of the structure.
        name: String,
        /// What is wrong with the template.
        reason: String,
    },

    /// An entity handle was used on a layer that does not own it.
    #[error("entity {0} is not registered on layer {1}")]
    EntityLayerMismatch(String, i32),

    /// An entity that should exist is gone.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// An entity was dispatched to the behaviour of another kind.
    #[error("{entity} cannot run {behavior} behaviour")]
    BehaviorMismatch {
        /// The entity.
        entity: String,
        /// Name of the behaviour table.
        behavior: &'static str,
    },

    /// An entity holds state its behaviour cannot run with.
    #[error("{entity} is in an invalid state: {reason}")]
    InvalidEntityState {
        /// The entity.
        entity: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The world has no level at the requested depth.
    #[error("no level at depth {0}")]
    NoSuchLevel(i32),

    /// A level snapshot is inconsistent.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A saved entity names a kind the factory does not know.
    #[error("unknown entity tag \"{tag}\" for {eid}")]
    UnknownEntityTag {
        /// The unknown tag.
        tag: String,
        /// Identity of the saved entity.
        eid: Eid,
    },

    /// Snapshot (de)serialization failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] serde_json::Error),

    /// A tile grid operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}
