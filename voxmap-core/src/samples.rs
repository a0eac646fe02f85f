use crate::color::FillColor;
use crate::coords::{CHUNK_AREA, CHUNK_SIZE, column_index};
use crate::error::MapError;

const EDGE: usize = CHUNK_SIZE as usize;

/// Raw per-column samples for one chunk, row-major (z-major).
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSamples {
    heights: Box<[u8; CHUNK_AREA]>,
    colors: Box<[FillColor; CHUNK_AREA]>,
}

impl ChunkSamples {
    /// Builds samples from provider output, rejecting anything that is not
    /// exactly one height and one color per column.
    pub fn new(heights: Vec<u8>, colors: Vec<FillColor>) -> Result<Self, MapError> {
        let invalid = MapError::InvalidSamples {
            heights: heights.len(),
            colors: colors.len(),
        };
        let heights: Box<[u8; CHUNK_AREA]> = heights.into_boxed_slice().try_into().map_err(|_| invalid.clone())?;
        let colors: Box<[FillColor; CHUNK_AREA]> = colors.into_boxed_slice().try_into().map_err(|_| invalid)?;
        Ok(Self { heights, colors })
    }

    /// Every column at the same height and color.
    pub fn uniform(height: u8, color: FillColor) -> Self {
        Self {
            heights: Box::new([height; CHUNK_AREA]),
            colors: Box::new(std::array::from_fn(|_| color.clone())),
        }
    }

    pub fn heights(&self) -> &[u8; CHUNK_AREA] {
        &self.heights
    }

    pub fn colors(&self) -> &[FillColor; CHUNK_AREA] {
        &self.colors
    }

    pub fn height_at(&self, local_x: usize, local_z: usize) -> u8 {
        self.heights[column_index(local_x, local_z)]
    }

    /// Heights of the z = 0 row.
    pub fn north_row(&self) -> [u8; EDGE] {
        height_row(&self.heights, 0)
    }

    /// Heights of the z = 15 row.
    pub fn south_row(&self) -> [u8; EDGE] {
        height_row(&self.heights, EDGE - 1)
    }

    /// Heights of the x = 0 column.
    pub fn west_column(&self) -> [u8; EDGE] {
        height_column(&self.heights, 0)
    }

    /// Heights of the x = 15 column.
    pub fn east_column(&self) -> [u8; EDGE] {
        height_column(&self.heights, EDGE - 1)
    }
}

/// One row (fixed z) of a row-major height grid.
pub fn height_row(heights: &[u8; CHUNK_AREA], local_z: usize) -> [u8; EDGE] {
    std::array::from_fn(|x| heights[column_index(x, local_z)])
}

/// One column (fixed x) of a row-major height grid.
pub fn height_column(heights: &[u8; CHUNK_AREA], local_x: usize) -> [u8; EDGE] {
    std::array::from_fn(|z| heights[column_index(local_x, z)])
}
