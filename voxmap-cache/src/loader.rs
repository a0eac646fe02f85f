use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use voxmap_benchmark::MapMetrics;
use voxmap_core::{ChunkKey, MapError};

use crate::cache::{ChunkCache, ChunkEvent};
use crate::{ChunkSampler, SampleOutcome};

/// Dispatches chunk requests onto the runtime and settles them in the shared
/// cache.
///
/// Every mutation of the cache (request, resolution, eviction) goes through
/// the one mutex held here. Settled chunks are announced on a broadcast
/// channel; each view keeps its own receiver.
#[derive(Clone)]
pub struct ChunkLoader {
    cache: Arc<Mutex<ChunkCache>>,
    sampler: Arc<dyn ChunkSampler>,
    runtime: Handle,
    events: broadcast::Sender<ChunkEvent>,
    metrics: Arc<MapMetrics>,
}

impl ChunkLoader {
    pub fn new(
        sampler: Arc<dyn ChunkSampler>,
        runtime: Handle,
        metrics: Arc<MapMetrics>,
        shade_step: u8,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            cache: Arc::new(Mutex::new(ChunkCache::new(shade_step))),
            sampler,
            runtime,
            events,
            metrics,
        }
    }

    pub fn sampler(&self) -> &Arc<dyn ChunkSampler> {
        &self.sampler
    }

    pub fn metrics(&self) -> &Arc<MapMetrics> {
        &self.metrics
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChunkEvent> {
        self.events.subscribe()
    }

    /// Locks the cache. A panic while the lock was held cannot leave a
    /// record half-written, so a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, ChunkCache> {
        self.cache.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            log::error!("chunk cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Requests `key` unless it already has a record. Takes the locked cache
    /// so a whole view pass runs under one lock.
    pub fn ensure_requested(&self, cache: &mut ChunkCache, key: ChunkKey) -> bool {
        cache.ensure_requested(key, |key| self.dispatch(key))
    }

    pub fn evict(&self, center: ChunkKey, threshold: f64) -> usize {
        let evicted = self.lock().evict(center, threshold);
        self.metrics.record_evictions(evicted);
        evicted
    }

    pub fn invalidate(&self, key: ChunkKey) -> bool {
        self.lock().invalidate(key)
    }

    /// Requests the sampler still owes.
    pub fn pending(&self) -> usize {
        self.lock().in_flight()
    }

    fn dispatch(&self, key: ChunkKey) {
        self.metrics.record_request_issued();
        let loader = self.clone();
        self.runtime.spawn(async move {
            let start = Instant::now();
            let sampler = loader.sampler.clone();
            // A panicking sampler still has to settle the key.
            let outcome = match loader.runtime.spawn(async move { sampler.request_chunk_samples(key).await }).await {
                Ok(outcome) => outcome,
                Err(err) => Err(MapError::SamplerFailure {
                    key,
                    reason: err.to_string(),
                }
                .into()),
            };
            loader.metrics.record_request_resolved(start.elapsed());
            loader.resolve(key, outcome);
        });
    }

    /// Settles `key` and announces the result.
    pub fn resolve(&self, key: ChunkKey, outcome: anyhow::Result<SampleOutcome>) {
        match &outcome {
            Ok(SampleOutcome::Samples(_)) => {}
            Ok(SampleOutcome::Unavailable) => self.metrics.record_unavailable(),
            Err(_) => self.metrics.record_sampler_failure(),
        }

        let event = self.lock().on_request_resolved(key, outcome);
        match event {
            // No receivers just means no view is open right now.
            Some(event) => {
                let _ = self.events.send(event);
            }
            None => self.metrics.record_stale_resolution(),
        }
    }
}
