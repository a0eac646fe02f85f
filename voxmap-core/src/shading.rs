//! Directional shading of a chunk's surface colors.
//!
//! A column is darkened when a neighbor to the north (z - 1), east (x + 1) or
//! north-east is strictly taller, otherwise lightened when a neighbor to the
//! south, west or south-west is strictly taller. Neighbors outside the chunk
//! come from the adjacent chunks' edge samples; a missing neighbor counts as
//! height 0. When an edge column is shaded because of a column across the
//! border, the same shade is also given to the next column inward.

use crate::color::FillColor;
use crate::coords::{CHUNK_AREA, CHUNK_SIZE, column_coords, column_index};
use crate::samples::ChunkSamples;

/// Per-channel shift applied by one shade step.
pub const SHADE_STEP: u8 = 20;

const EDGE: usize = CHUNK_SIZE as usize;

const DARKER_OFFSETS: [(i32, i32); 3] = [(0, -1), (1, 0), (1, -1)];
const LIGHTER_OFFSETS: [(i32, i32); 3] = [(0, 1), (-1, 0), (-1, 1)];

/// Edge heights borrowed from the four adjacent chunks, when they are loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighborEdges {
    /// South row of the chunk at z - 1.
    pub north: Option<[u8; EDGE]>,
    /// North row of the chunk at z + 1.
    pub south: Option<[u8; EDGE]>,
    /// East column of the chunk at x - 1.
    pub west: Option<[u8; EDGE]>,
    /// West column of the chunk at x + 1.
    pub east: Option<[u8; EDGE]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shade {
    Flat,
    Darker,
    Lighter,
}

struct Neighborhood<'a> {
    samples: &'a ChunkSamples,
    edges: &'a NeighborEdges,
}

impl Neighborhood<'_> {
    fn height(&self, x: i32, z: i32) -> u8 {
        let inside = |v: i32| (0..CHUNK_SIZE).contains(&v);
        match (inside(x), inside(z)) {
            (true, true) => self.samples.height_at(x as usize, z as usize),
            (true, false) if z < 0 => edge(self.edges.north, x),
            (true, false) => edge(self.edges.south, x),
            (false, true) if x < 0 => edge(self.edges.west, z),
            (false, true) => edge(self.edges.east, z),
            // diagonal chunks are never consulted
            (false, false) => 0,
        }
    }

    /// First offset whose column is strictly taller than (x, z).
    fn taller(&self, x: i32, z: i32, offsets: &[(i32, i32)]) -> Option<(i32, i32)> {
        let own = self.height(x, z);
        offsets
            .iter()
            .copied()
            .filter(|&(dx, dz)| self.height(x + dx, z + dz) > own)
            .min_by_key(|&(dx, dz)| inside_chunk(x + dx, z + dz))
    }
}

fn edge(row: Option<[u8; EDGE]>, i: i32) -> u8 {
    row.map_or(0, |r| r[i as usize])
}

fn inside_chunk(x: i32, z: i32) -> bool {
    (0..CHUNK_SIZE).contains(&x) && (0..CHUNK_SIZE).contains(&z)
}

/// Index of the column one step inward from (x, z), away from the border
/// crossed by (dx, dz).
fn inward(x: i32, z: i32, dx: i32, dz: i32) -> usize {
    let (ix, iz) = if (0..CHUNK_SIZE).contains(&(x + dx)) {
        (x, z - dz)
    } else {
        (x - dx, z)
    };
    column_index(ix as usize, iz as usize)
}

/// Shades `samples` against its neighbors. Pure: the same samples and edges
/// always give the same colors.
pub fn shade_chunk(
    samples: &ChunkSamples,
    edges: &NeighborEdges,
    step: u8,
) -> Box<[FillColor; CHUNK_AREA]> {
    let hood = Neighborhood { samples, edges };
    let mut shades = [Shade::Flat; CHUNK_AREA];
    let mut bleed = Vec::new();

    for (i, shade) in shades.iter_mut().enumerate() {
        let (x, z) = column_coords(i);
        let (x, z) = (x as i32, z as i32);
        let hit = match hood.taller(x, z, &DARKER_OFFSETS) {
            Some(offset) => Some((Shade::Darker, offset)),
            None => hood.taller(x, z, &LIGHTER_OFFSETS).map(|o| (Shade::Lighter, o)),
        };
        if let Some((kind, (dx, dz))) = hit {
            *shade = kind;
            if !inside_chunk(x + dx, z + dz) {
                bleed.push((inward(x, z, dx, dz), kind));
            }
        }
    }

    // Bleed only fills columns that have no shade of their own.
    for (i, kind) in bleed {
        if shades[i] == Shade::Flat {
            shades[i] = kind;
        }
    }

    let colors = samples.colors();
    let mut malformed = 0usize;
    let shaded: Box<[FillColor; CHUNK_AREA]> = Box::new(std::array::from_fn(|i| {
        let color = &colors[i];
        let adjusted = match shades[i] {
            Shade::Flat => return color.clone(),
            Shade::Darker => color.darker(step),
            Shade::Lighter => color.lighter(step),
        };
        adjusted.unwrap_or_else(|_| {
            malformed += 1;
            color.clone()
        })
    }));

    if malformed > 0 {
        log::warn!("{} column(s) left unshaded: malformed fill color", malformed);
    }
    shaded
}
