use anyhow::Result;
use voxmap_core::ChunkSamples;

/// Produces the surface samples of whole chunks.
pub trait WorldGenerator: Send + Sync {
    fn generate_chunk(&self, x: i32, z: i32) -> Result<ChunkSamples>;

    /// Y of the surface at one block column.
    fn surface_y(&self, block_x: i32, block_z: i32) -> i32;
}

pub mod builder;
pub mod flat;
pub mod palette;
pub mod terrain;
pub mod world;

pub use world::GeneratedWorld;
