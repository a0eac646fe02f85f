//! A generated world exposed to the map as a `ChunkSampler`.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;
use voxmap_cache::{ChunkSampler, SampleOutcome};
use voxmap_core::{ChunkKey, ChunkSamples};

use crate::WorldGenerator;

const DEFAULT_CACHE_CHUNKS: usize = 1024;

pub struct GeneratedWorld {
    generator: Arc<dyn WorldGenerator>,
    // Chunks beyond this distance from the origin are not "loaded".
    loaded_radius: Option<i32>,
    latency: Duration,
    samples: Mutex<LruCache<ChunkKey, ChunkSamples>>,
}

impl GeneratedWorld {
    pub fn new(generator: Arc<dyn WorldGenerator>) -> Self {
        Self {
            generator,
            loaded_radius: None,
            latency: Duration::ZERO,
            samples: Mutex::new(LruCache::new(
                NonZeroUsize::new(DEFAULT_CACHE_CHUNKS).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Report chunks farther than `radius` chunks (Chebyshev) from the
    /// origin as unavailable.
    pub fn with_loaded_radius(mut self, radius: i32) -> Self {
        self.loaded_radius = Some(radius);
        self
    }

    /// Delay every request, like a provider waiting on disk or network.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn is_loaded(&self, key: ChunkKey) -> bool {
        self.loaded_radius
            .is_none_or(|r| key.x.abs() <= r && key.z.abs() <= r)
    }
}

#[async_trait]
impl ChunkSampler for GeneratedWorld {
    async fn request_chunk_samples(&self, key: ChunkKey) -> Result<SampleOutcome> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if !self.is_loaded(key) {
            return Ok(SampleOutcome::Unavailable);
        }

        if let Some(samples) = self.samples.lock().await.get(&key) {
            return Ok(SampleOutcome::Samples(samples.clone()));
        }

        let samples = self.generator.generate_chunk(key.x, key.z)?;
        log::debug!("generated chunk {}", key);
        self.samples.lock().await.put(key, samples.clone());
        Ok(SampleOutcome::Samples(samples))
    }

    fn highest_block_y(&self, block_x: i32, block_z: i32) -> i32 {
        self.generator.surface_y(block_x, block_z)
    }
}
