//! Chunk cache and request lifecycle.
//!
//! Records move `Unrequested -> Requested -> Ready | Unavailable` and only go
//! back to `Unrequested` through eviction or invalidation. The cache itself
//! is not synchronized; `ChunkLoader` keeps it behind one mutex.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use voxmap_core::samples::{height_column, height_row};
use voxmap_core::{CHUNK_AREA, CHUNK_SIZE, ChunkKey, FillColor, NeighborEdges, shade_chunk};

use crate::SampleOutcome;

/// A chunk whose colors have been through the shading pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyChunk {
    heights: Box<[u8; CHUNK_AREA]>,
    colors: Box<[FillColor; CHUNK_AREA]>,
}

impl ReadyChunk {
    pub fn heights(&self) -> &[u8; CHUNK_AREA] {
        &self.heights
    }

    pub fn colors(&self) -> &[FillColor; CHUNK_AREA] {
        &self.colors
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChunkRecord {
    Unrequested,
    Requested,
    Unavailable,
    Ready(Arc<ReadyChunk>),
}

static UNREQUESTED: ChunkRecord = ChunkRecord::Unrequested;

/// Emitted when a request settles into a terminal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkEvent {
    Ready(ChunkKey),
    Unavailable(ChunkKey),
}

impl ChunkEvent {
    pub fn key(self) -> ChunkKey {
        match self {
            ChunkEvent::Ready(key) | ChunkEvent::Unavailable(key) => key,
        }
    }
}

pub struct ChunkCache {
    records: HashMap<ChunkKey, ChunkRecord>,
    // Requests the sampler still owes us, including ones whose record was
    // evicted while they were out.
    in_flight: HashSet<ChunkKey>,
    shade_step: u8,
}

impl ChunkCache {
    pub fn new(shade_step: u8) -> Self {
        Self {
            records: HashMap::new(),
            in_flight: HashSet::new(),
            shade_step,
        }
    }

    pub fn get(&self, key: ChunkKey) -> &ChunkRecord {
        self.records.get(&key).unwrap_or(&UNREQUESTED)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Requests the sampler still owes, evicted or not.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Moves an `Unrequested` key to `Requested` and calls `request` for it.
    ///
    /// Returns true only when `request` was called. A key already past
    /// `Unrequested` is left untouched, and a key whose earlier request is
    /// still out (it was evicted meanwhile) goes back to `Requested` without
    /// a second request.
    pub fn ensure_requested(&mut self, key: ChunkKey, request: impl FnOnce(ChunkKey)) -> bool {
        if self.records.contains_key(&key) {
            return false;
        }
        self.records.insert(key, ChunkRecord::Requested);
        if !self.in_flight.insert(key) {
            log::debug!("chunk {} re-adopted its outstanding request", key);
            return false;
        }
        log::debug!("chunk {} requested", key);
        request(key);
        true
    }

    /// Settles a request. Returns `None` when the record was evicted while
    /// the request was out; the result is dropped.
    pub fn on_request_resolved(
        &mut self,
        key: ChunkKey,
        outcome: anyhow::Result<SampleOutcome>,
    ) -> Option<ChunkEvent> {
        self.in_flight.remove(&key);
        if self.get(key) != &ChunkRecord::Requested {
            log::debug!("chunk {} resolved after eviction, dropping result", key);
            return None;
        }

        let (record, event) = match outcome {
            Ok(SampleOutcome::Samples(samples)) => {
                let colors = shade_chunk(&samples, &self.neighbor_edges(key), self.shade_step);
                let ready = ReadyChunk {
                    heights: Box::new(*samples.heights()),
                    colors,
                };
                (ChunkRecord::Ready(Arc::new(ready)), ChunkEvent::Ready(key))
            }
            Ok(SampleOutcome::Unavailable) => {
                log::debug!("chunk {} is outside the loaded world", key);
                (ChunkRecord::Unavailable, ChunkEvent::Unavailable(key))
            }
            Err(e) => {
                log::warn!("sampler failed for chunk {}: {:#}", key, e);
                (ChunkRecord::Unavailable, ChunkEvent::Unavailable(key))
            }
        };
        self.records.insert(key, record);
        Some(event)
    }

    /// Removes every record farther than `threshold` chunks from `center`.
    pub fn evict(&mut self, center: ChunkKey, threshold: f64) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| key.distance(center) <= threshold);
        let evicted = before - self.records.len();
        if evicted > 0 {
            log::debug!("evicted {} chunk(s) beyond {:.1} of {}", evicted, threshold, center);
        }
        evicted
    }

    /// Drops one record so the next view pass requests it again.
    pub fn invalidate(&mut self, key: ChunkKey) -> bool {
        self.records.remove(&key).is_some()
    }

    /// Edge heights of whichever adjacent chunks are ready.
    pub fn neighbor_edges(&self, key: ChunkKey) -> NeighborEdges {
        const LAST: usize = CHUNK_SIZE as usize - 1;
        let heights = |k: ChunkKey| match self.get(k) {
            ChunkRecord::Ready(chunk) => Some(chunk.heights()),
            _ => None,
        };
        NeighborEdges {
            north: heights(key.offset(0, -1)).map(|h| height_row(h, LAST)),
            south: heights(key.offset(0, 1)).map(|h| height_row(h, 0)),
            west: heights(key.offset(-1, 0)).map(|h| height_column(h, LAST)),
            east: heights(key.offset(1, 0)).map(|h| height_column(h, 0)),
        }
    }
}
