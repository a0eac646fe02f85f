//! Core types of the voxel map: chunk keys, fill colors, per-chunk samples
//! and the shading pass that turns samples into map colors.

pub mod color;
pub mod coords;
pub mod error;
pub mod samples;
pub mod shading;

pub use color::{FillColor, Rgb, Rgba};
pub use coords::{CHUNK_AREA, CHUNK_SIZE, ChunkKey};
pub use error::MapError;
pub use samples::ChunkSamples;
pub use shading::{NeighborEdges, SHADE_STEP, shade_chunk};
