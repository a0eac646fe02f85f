use std::collections::HashMap;

use anyhow::Result;
use voxmap_core::coords::column_index;
use voxmap_core::{CHUNK_AREA, ChunkSamples};

use crate::palette::block_color;

/// Collects the surface block of every column in one chunk.
#[derive(Default)]
pub struct ColumnBuilder {
    // Key: (x, z) chunk-local, Value: (surface y, block name)
    custom_columns: HashMap<(u8, u8), (u8, String)>,

    // Fallback for every column not set explicitly.
    floor: Option<(u8, String)>,
}

impl ColumnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the surface of a single column (x: 0..15, z: 0..15)
    pub fn set_column(&mut self, x: u8, z: u8, y: u8, name: &str) {
        if x < 16 && z < 16 {
            self.custom_columns.insert((x, z), (y, name.to_string()));
        }
    }

    /// Give every column the same surface, dropping per-column overrides
    pub fn fill(&mut self, y: u8, name: &str) {
        self.floor = Some((y, name.to_string()));
        self.custom_columns.clear();
    }

    pub fn build(self) -> Result<ChunkSamples> {
        let mut heights = vec![0u8; CHUNK_AREA];
        let mut colors = Vec::with_capacity(CHUNK_AREA);

        // Row-major: Index = z*16 + x
        for z in 0..16u8 {
            for x in 0..16u8 {
                let surface = self.custom_columns.get(&(x, z)).or(self.floor.as_ref());
                let (y, name) = match surface {
                    Some((y, name)) => (*y, name.as_str()),
                    None => (0, "minecraft:bedrock"),
                };
                heights[column_index(x as usize, z as usize)] = y;
                colors.push(block_color(name));
            }
        }

        Ok(ChunkSamples::new(heights, colors)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_then_override() {
        let mut builder = ColumnBuilder::new();
        builder.fill(64, "minecraft:grass_block");
        builder.set_column(8, 8, 74, "minecraft:stone");
        let samples = builder.build().unwrap();

        assert_eq!(samples.height_at(8, 8), 74);
        assert_eq!(samples.colors()[column_index(8, 8)].as_str(), "rgb(112,112,112)");
        assert_eq!(samples.height_at(0, 0), 64);
        assert_eq!(samples.colors()[0].as_str(), "rgb(127,178,56)");
    }

    #[test]
    fn test_out_of_range_column_ignored() {
        let mut builder = ColumnBuilder::new();
        builder.set_column(16, 0, 99, "minecraft:stone");
        let samples = builder.build().unwrap();
        assert!(samples.heights().iter().all(|&h| h == 0));
    }
}
