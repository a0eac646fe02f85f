//! Chunk key space: world <-> chunk <-> column conversions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Blocks per chunk edge.
pub const CHUNK_SIZE: i32 = 16;
/// Block columns per chunk (16 x 16).
pub const CHUNK_AREA: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// A chunk coordinate on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    pub x: i32,
    pub z: i32,
}

impl ChunkKey {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the block column at integer world coordinates.
    pub fn from_block(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x.div_euclid(CHUNK_SIZE),
            z: block_z.div_euclid(CHUNK_SIZE),
        }
    }

    /// Chunk containing a floating world position.
    pub fn from_world(world_x: f64, world_z: f64) -> Self {
        Self {
            x: (world_x / CHUNK_SIZE as f64).floor() as i32,
            z: (world_z / CHUNK_SIZE as f64).floor() as i32,
        }
    }

    /// World coordinates of the chunk's north-west block column.
    pub fn origin(self) -> (i32, i32) {
        (self.x * CHUNK_SIZE, self.z * CHUNK_SIZE)
    }

    /// Euclidean distance in chunk units.
    pub fn distance(self, other: ChunkKey) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dz = (self.z - other.z) as f64;
        dx.hypot(dz)
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// Packs both coordinates into one integer: X in the high 32 bits.
    pub fn pack(self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.z as u32 as u64)
    }

    pub fn unpack(packed: u64) -> Self {
        Self {
            x: (packed >> 32) as u32 as i32,
            z: packed as u32 as i32,
        }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

impl FromStr for ChunkKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (x, z) = s
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("chunk key {:?} is not in x,z form", s))?;
        Ok(Self {
            x: x.trim().parse()?,
            z: z.trim().parse()?,
        })
    }
}

/// Row-major (z-major) index of a chunk-local column.
#[inline]
pub fn column_index(local_x: usize, local_z: usize) -> usize {
    local_z * CHUNK_SIZE as usize + local_x
}

/// Chunk-local (x, z) of a row-major column index.
#[inline]
pub fn column_coords(index: usize) -> (usize, usize) {
    (index % CHUNK_SIZE as usize, index / CHUNK_SIZE as usize)
}

/// Position of a world block inside its chunk.
#[inline]
pub fn local_coord(block: i32) -> usize {
    block.rem_euclid(CHUNK_SIZE) as usize
}
