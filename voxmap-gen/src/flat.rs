use anyhow::Result;
use voxmap_core::ChunkSamples;

use crate::WorldGenerator;
use crate::builder::ColumnBuilder;

pub const FLAT_SURFACE_Y: u8 = 64;

pub struct FlatGenerator;

impl WorldGenerator for FlatGenerator {
    fn generate_chunk(&self, _x: i32, _z: i32) -> Result<ChunkSamples> {
        let mut builder = ColumnBuilder::new();

        // 1. Grass everywhere
        builder.fill(FLAT_SURFACE_Y, "minecraft:grass_block");

        // 2. A stone pillar at (8, 8) so shading has something to show
        builder.set_column(8, 8, FLAT_SURFACE_Y + 10, "minecraft:stone");

        builder.build()
    }

    fn surface_y(&self, block_x: i32, block_z: i32) -> i32 {
        if block_x.rem_euclid(16) == 8 && block_z.rem_euclid(16) == 8 {
            (FLAT_SURFACE_Y + 10) as i32
        } else {
            FLAT_SURFACE_Y as i32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pillar_matches_surface_query() {
        let samples = FlatGenerator.generate_chunk(-3, 7).unwrap();
        assert_eq!(samples.height_at(8, 8) as i32, FlatGenerator.surface_y(-40, 120));
        assert_eq!(samples.height_at(0, 0) as i32, FlatGenerator.surface_y(-48, 112));
    }
}
