use anyhow::Result;
use async_trait::async_trait;
use voxmap_core::{ChunkKey, ChunkSamples};

pub mod cache;
pub mod loader;

pub use cache::{ChunkCache, ChunkEvent, ChunkRecord, ReadyChunk};
pub use loader::ChunkLoader;

/// What the world provider returned for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Samples(ChunkSamples),
    /// The chunk lies outside the currently loaded world.
    Unavailable,
}

/// The world provider, as seen by the map.
///
/// `request_chunk_samples` resolves once per call and may resolve out of
/// order relative to other calls. An `Err` is a transient provider failure;
/// retrying is the provider's business, the map records it as unavailable.
#[async_trait]
pub trait ChunkSampler: Send + Sync {
    async fn request_chunk_samples(&self, key: ChunkKey) -> Result<SampleOutcome>;

    /// Y of the highest solid block in a column.
    fn highest_block_y(&self, block_x: i32, block_z: i32) -> i32;
}
