use anyhow::Result;
use voxmap_core::{CHUNK_SIZE, ChunkKey, ChunkSamples};

use crate::WorldGenerator;
use crate::builder::ColumnBuilder;

pub const SEA_LEVEL: i32 = 62;
const BASE_HEIGHT: f64 = 66.0;

/// Seeded rolling terrain: two octaves of value noise over a hashed lattice.
pub struct TerrainGenerator {
    seed: u64,
}

impl TerrainGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Ground height of a column, before water is added on top.
    pub fn ground_height(&self, block_x: i32, block_z: i32) -> i32 {
        let (x, z) = (block_x as f64, block_z as f64);
        let hills = (self.value_noise(x / 64.0, z / 64.0) - 0.5) * 48.0;
        let bumps = (self.value_noise(x / 16.0 + 1000.0, z / 16.0) - 0.5) * 8.0;
        ((BASE_HEIGHT + hills + bumps).round() as i32).clamp(1, 254)
    }

    fn surface_block(ground: i32) -> &'static str {
        match ground {
            y if y < SEA_LEVEL => "minecraft:water",
            y if y < SEA_LEVEL + 3 => "minecraft:sand",
            y if y < 84 => "minecraft:grass_block",
            y if y < 92 => "minecraft:stone",
            _ => "minecraft:snow_block",
        }
    }

    fn lattice(&self, ix: i64, iz: i64) -> f64 {
        // splitmix64 over the seeded lattice point
        let mut h = self.seed
            ^ (ix as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (iz as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        h ^= h >> 31;
        (h >> 11) as f64 / (1u64 << 53) as f64
    }

    fn value_noise(&self, x: f64, z: f64) -> f64 {
        let (x0, z0) = (x.floor(), z.floor());
        let (ix, iz) = (x0 as i64, z0 as i64);
        let smooth = |t: f64| t * t * (3.0 - 2.0 * t);
        let (tx, tz) = (smooth(x - x0), smooth(z - z0));

        let top = lerp(self.lattice(ix, iz), self.lattice(ix + 1, iz), tx);
        let bottom = lerp(self.lattice(ix, iz + 1), self.lattice(ix + 1, iz + 1), tx);
        lerp(top, bottom, tz)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl WorldGenerator for TerrainGenerator {
    fn generate_chunk(&self, x: i32, z: i32) -> Result<ChunkSamples> {
        let mut builder = ColumnBuilder::new();
        let (origin_x, origin_z) = ChunkKey::new(x, z).origin();

        for local_z in 0..CHUNK_SIZE {
            for local_x in 0..CHUNK_SIZE {
                let ground = self.ground_height(origin_x + local_x, origin_z + local_z);
                let block = Self::surface_block(ground);
                let surface = ground.max(SEA_LEVEL) as u8;
                builder.set_column(local_x as u8, local_z as u8, surface, block);
            }
        }

        builder.build()
    }

    fn surface_y(&self, block_x: i32, block_z: i32) -> i32 {
        self.ground_height(block_x, block_z).max(SEA_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxmap_core::coords::column_index;

    #[test]
    fn test_same_seed_same_terrain() {
        let a = TerrainGenerator::new(42).generate_chunk(3, -2).unwrap();
        let b = TerrainGenerator::new(42).generate_chunk(3, -2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_surface_query_matches_chunk() {
        let generator = TerrainGenerator::new(7);
        let samples = generator.generate_chunk(-1, 2).unwrap();
        // column (5, 9) of chunk (-1, 2) is block (-11, 41)
        assert_eq!(
            samples.heights()[column_index(5, 9)] as i32,
            generator.surface_y(-11, 41)
        );
    }

    #[test]
    fn test_heights_stay_in_range() {
        let generator = TerrainGenerator::new(1);
        for x in (-500..500).step_by(37) {
            for z in (-500..500).step_by(41) {
                let y = generator.surface_y(x, z);
                assert!((SEA_LEVEL..=254).contains(&y), "({x}, {z}) -> {y}");
            }
        }
    }

    #[test]
    fn test_water_is_flat() {
        assert_eq!(TerrainGenerator::surface_block(SEA_LEVEL - 5), "minecraft:water");
        assert_eq!(TerrainGenerator::surface_block(100), "minecraft:snow_block");
    }
}
