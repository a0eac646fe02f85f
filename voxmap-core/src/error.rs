use std::fmt;

use crate::coords::ChunkKey;

/// Per-chunk failures surfaced by the map core.
///
/// None of these are fatal: they travel inside `anyhow::Error` and callers
/// that care about the kind can `downcast_ref::<MapError>()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The provider has no data for this chunk (outside the loaded world).
    ChunkUnavailable(ChunkKey),
    /// The provider raised an error while sampling this chunk.
    SamplerFailure { key: ChunkKey, reason: String },
    /// A fill color could not be split into exactly three channels.
    MalformedColor(String),
    /// Sample arrays did not hold one entry per block column.
    InvalidSamples { heights: usize, colors: usize },
    /// A view operation was attempted before attach or after dispose.
    ViewNotActive,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::ChunkUnavailable(key) => write!(f, "chunk {} is not available", key),
            MapError::SamplerFailure { key, reason } => {
                write!(f, "sampler failed for chunk {}: {}", key, reason)
            }
            MapError::MalformedColor(raw) => write!(f, "malformed color {:?}", raw),
            MapError::InvalidSamples { heights, colors } => write!(
                f,
                "expected 256 heights and colors, got {} heights and {} colors",
                heights, colors
            ),
            MapError::ViewNotActive => write!(f, "map view has no attached canvas"),
        }
    }
}

impl std::error::Error for MapError {}
