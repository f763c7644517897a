/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or decoding core data.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A grid was requested with a zero or negative dimension.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width in tiles.
        width: i32,
        /// Requested height in tiles.
        height: i32,
    },

    /// Raw tile arrays do not cover the grid exactly.
    #[error("raw map arrays do not match {expected} cells (tiles: {tiles}, data: {data})")]
    RawLength {
        /// Number of cells the grid dimensions require.
        expected: usize,
        /// Length of the supplied tile-id array.
        tiles: usize,
        /// Length of the supplied tile-data array.
        data: usize,
    },

    /// A tile name did not match any catalogue entry.
    #[error("unknown tile: \"{0}\"")]
    UnknownTile(String),

    /// A species name did not match any catalogue entry.
    #[error("unknown species: \"{0}\"")]
    UnknownSpecies(String),
}
