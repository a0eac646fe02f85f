//! Which chunks a camera sees, and where world points land on the canvas.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use voxmap_core::{CHUNK_SIZE, ChunkKey};

/// Smallest zoom scale; zooming out further shows nothing new.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest box, in world units, a single draw will scan.
pub const MAX_MAP_SIZE: f64 = 8192.0;

// Keeps chunk origins and block coordinates inside i32.
const CHUNK_LIMIT: i64 = (i32::MAX / CHUNK_SIZE) as i64 - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Circular minimap: clipped to the radius, distant markers culled or
    /// pinned to the rim, compass labels, optional heading.
    Bounded,
    /// Full map: the whole canvas, markers drawn where they are.
    Unbounded,
}

/// Chunk indices overlapping `[center - half, center + half]`, padded by one.
fn chunk_span(center: f64, half: f64) -> RangeInclusive<i32> {
    let chunk = CHUNK_SIZE as f64;
    let lo = (((center - half) / chunk).floor() as i64).saturating_sub(1);
    let hi = (((center + half) / chunk).ceil() as i64).saturating_add(1);
    let lo = lo.clamp(-CHUNK_LIMIT, CHUNK_LIMIT) as i32;
    let hi = hi.clamp(-CHUNK_LIMIT, CHUNK_LIMIT) as i32;
    lo..=hi
}

fn span_len(span: &RangeInclusive<i32>) -> usize {
    usize::try_from(*span.end() as i64 - *span.start() as i64 + 1).unwrap_or(0)
}

/// Every chunk key overlapping the square of side `map_size` centered on the
/// camera, padded by one chunk on each side. Row-major, north to south.
///
/// `map_size` is capped at `MAX_MAP_SIZE`.
pub fn visible_keys(camera_x: f64, camera_z: f64, map_size: f64) -> Vec<ChunkKey> {
    let map_size = if map_size.is_finite() { map_size.clamp(0.0, MAX_MAP_SIZE) } else { 0.0 };
    let half = map_size / 2.0;
    let xs = chunk_span(camera_x, half);
    let zs = chunk_span(camera_z, half);

    let capacity = span_len(&xs).checked_mul(span_len(&zs)).unwrap_or(0);
    let mut keys = Vec::with_capacity(capacity);
    for z in zs {
        for x in xs.clone() {
            keys.push(ChunkKey::new(x, z));
        }
    }
    keys
}

/// Per-view layout choices that outlive a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub mode: ViewMode,
    /// Scale over the default map size, at least `MIN_ZOOM`.
    pub zoom: f64,
    /// Explicit world units across the visible diameter; overrides `zoom`.
    pub map_size: Option<f64>,
    /// Clockwise rotation of a bounded map about its center, in radians.
    pub heading: f64,
    /// Minimap radius = min(width, height) / divisor.
    pub radius_divisor: f64,
}

impl ViewSettings {
    pub fn new(mode: ViewMode, radius_divisor: f64) -> Self {
        Self {
            mode,
            zoom: 1.0,
            map_size: None,
            heading: 0.0,
            radius_divisor,
        }
    }
}

/// One frame's camera, zoom and canvas geometry.
///
/// Painting happens in map coordinates: the canvas before the heading is
/// applied. Screen coordinates are map coordinates rotated by `heading`
/// about the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub camera_x: f64,
    pub camera_z: f64,
    /// World units across the visible diameter.
    pub map_size: f64,
    /// Canvas pixels per world unit (whole number, at least 1).
    pub pixels_per_unit: f64,
    pub width: u32,
    pub height: u32,
    /// Visible radius in pixels.
    pub radius: f64,
    pub mode: ViewMode,
    /// Always zero for the full map.
    pub heading: f64,
}

impl Viewport {
    /// Lays out a canvas. The full map always uses half the shorter side as
    /// its radius; the minimap divides it by `radius_divisor`.
    pub fn new(camera_x: f64, camera_z: f64, width: u32, height: u32, settings: &ViewSettings) -> Self {
        let short_side = width.min(height) as f64;
        let radius = match settings.mode {
            ViewMode::Bounded => (short_side / settings.radius_divisor).floor(),
            ViewMode::Unbounded => (short_side / 2.0).floor(),
        };
        let zoom = settings.zoom.max(MIN_ZOOM);
        let map_size = settings
            .map_size
            .unwrap_or(radius * 2.0 / zoom)
            .clamp(1.0, MAX_MAP_SIZE);
        let pixels_per_unit = (radius * 2.0 / map_size).floor().max(1.0);
        let heading = match settings.mode {
            ViewMode::Bounded if settings.heading.is_finite() => settings.heading,
            _ => 0.0,
        };
        Self {
            camera_x,
            camera_z,
            map_size,
            pixels_per_unit,
            width,
            height,
            radius,
            mode: settings.mode,
            heading,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Map position of world (0, 0), snapped to whole pixels so block cells
    /// and tiles share exact edges.
    pub fn origin(&self) -> (f64, f64) {
        let (cx, cy) = self.center();
        (
            (cx - self.camera_x * self.pixels_per_unit).round(),
            (cy - self.camera_z * self.pixels_per_unit).round(),
        )
    }

    /// World units the chunk scan has to cover.
    pub fn scan_size(&self) -> f64 {
        let size = match self.mode {
            ViewMode::Bounded => self.map_size,
            ViewMode::Unbounded => self.width.max(self.height) as f64 / self.pixels_per_unit,
        };
        size.min(MAX_MAP_SIZE)
    }

    pub fn visible_keys(&self) -> Vec<ChunkKey> {
        visible_keys(self.camera_x, self.camera_z, self.scan_size())
    }

    pub fn contains_key(&self, key: ChunkKey) -> bool {
        let half = self.scan_size() / 2.0;
        chunk_span(self.camera_x, half).contains(&key.x) && chunk_span(self.camera_z, half).contains(&key.z)
    }

    pub fn camera_key(&self) -> ChunkKey {
        ChunkKey::from_world(self.camera_x, self.camera_z)
    }

    pub fn world_to_map(&self, world_x: f64, world_z: f64) -> (f64, f64) {
        let (ox, oy) = self.origin();
        (ox + world_x * self.pixels_per_unit, oy + world_z * self.pixels_per_unit)
    }

    pub fn map_to_world(&self, map_x: f64, map_y: f64) -> (f64, f64) {
        let (ox, oy) = self.origin();
        ((map_x - ox) / self.pixels_per_unit, (map_y - oy) / self.pixels_per_unit)
    }

    pub fn map_to_screen(&self, map_x: f64, map_y: f64) -> (f64, f64) {
        self.rotate(map_x, map_y, self.heading)
    }

    pub fn screen_to_map(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        self.rotate(screen_x, screen_y, -self.heading)
    }

    pub fn world_to_screen(&self, world_x: f64, world_z: f64) -> (f64, f64) {
        let (mx, my) = self.world_to_map(world_x, world_z);
        self.map_to_screen(mx, my)
    }

    pub fn screen_to_world(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        let (mx, my) = self.screen_to_map(screen_x, screen_y);
        self.map_to_world(mx, my)
    }

    fn rotate(&self, x: f64, y: f64, angle: f64) -> (f64, f64) {
        if angle == 0.0 {
            return (x, y);
        }
        let (cx, cy) = self.center();
        let (sin, cos) = angle.sin_cos();
        let (dx, dy) = (x - cx, y - cy);
        (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
    }

    /// Whether a point lies inside the drawn area. The radius circle is
    /// unchanged by the heading, so map and screen points both work.
    pub fn is_inside(&self, x: f64, y: f64) -> bool {
        match self.mode {
            ViewMode::Bounded => {
                let (cx, cy) = self.center();
                (x - cx).hypot(y - cy) <= self.radius
            }
            ViewMode::Unbounded => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::f64::consts::FRAC_PI_2;

    fn layout(mode: ViewMode, zoom: f64, map_size: Option<f64>) -> ViewSettings {
        ViewSettings {
            zoom,
            map_size,
            ..ViewSettings::new(mode, 2.2)
        }
    }

    #[test]
    fn test_visible_keys_cover_box() {
        let cameras = [(0.0, 0.0), (7.5, -3.2), (-100.0, 250.0), (15.99, 16.0), (-16.0, -0.01)];
        for (cx, cz) in cameras {
            for map_size in [1.0, 16.0, 37.0, 256.0] {
                let keys: HashSet<_> = visible_keys(cx, cz, map_size).into_iter().collect();
                let half = map_size / 2.0;
                let steps = 20;
                for i in 0..=steps {
                    for j in 0..=steps {
                        let wx = cx - half + map_size * i as f64 / steps as f64;
                        let wz = cz - half + map_size * j as f64 / steps as f64;
                        let key = ChunkKey::from_world(wx, wz);
                        assert!(keys.contains(&key), "{key} missing for camera ({cx}, {cz}) size {map_size}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_visible_keys_are_rectangular() {
        let keys = visible_keys(-40.0, 70.0, 100.0);
        let min_x = keys.iter().map(|k| k.x).min().unwrap();
        let max_x = keys.iter().map(|k| k.x).max().unwrap();
        let min_z = keys.iter().map(|k| k.z).min().unwrap();
        let max_z = keys.iter().map(|k| k.z).max().unwrap();
        let unique: HashSet<_> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());
        assert_eq!(keys.len() as i32, (max_x - min_x + 1) * (max_z - min_z + 1));
    }

    #[test]
    fn test_edges_floor_and_ceil_then_pad() {
        let keys = visible_keys(0.0, 0.0, 16.0);
        assert_eq!(keys.first(), Some(&ChunkKey::new(-2, -2)));
        assert_eq!(keys.last(), Some(&ChunkKey::new(2, 2)));
        assert_eq!(keys.len(), 25);

        let keys = visible_keys(8.0, 8.0, 2.0);
        assert_eq!(keys.len(), 16);
        assert!(keys.contains(&ChunkKey::new(-1, -1)));
        assert!(keys.contains(&ChunkKey::new(2, 2)));
    }

    #[test]
    fn test_huge_boxes_are_capped() {
        let keys = visible_keys(0.0, 0.0, 1.0e6);
        let side = (MAX_MAP_SIZE / CHUNK_SIZE as f64) as usize + 3;
        assert_eq!(keys.len(), side * side);

        assert_eq!(visible_keys(0.0, 0.0, f64::INFINITY).len(), 9);
        let far = visible_keys(1.0e12, -1.0e12, 64.0);
        assert!(!far.is_empty());
        assert!(far.iter().all(|k| (k.x as i64).abs() <= CHUNK_LIMIT && (k.z as i64).abs() <= CHUNK_LIMIT));
    }

    #[test]
    fn test_minimap_layout() {
        let v = Viewport::new(0.0, 0.0, 282, 282, &layout(ViewMode::Bounded, 1.0, None));
        assert_eq!(v.radius, 128.0);
        assert_eq!(v.map_size, 256.0);
        assert_eq!(v.pixels_per_unit, 1.0);

        let zoomed = Viewport::new(0.0, 0.0, 282, 282, &layout(ViewMode::Bounded, 4.0, None));
        assert_eq!(zoomed.map_size, 64.0);
        assert_eq!(zoomed.pixels_per_unit, 4.0);

        let out = Viewport::new(0.0, 0.0, 282, 282, &layout(ViewMode::Bounded, 0.001, None));
        assert!((out.map_size - 2560.0).abs() < 1e-6);
        let capped = Viewport::new(0.0, 0.0, 282, 282, &layout(ViewMode::Bounded, 1.0, Some(1.0e9)));
        assert_eq!(capped.map_size, MAX_MAP_SIZE);
    }

    #[test]
    fn test_full_map_layout() {
        let v = Viewport::new(0.0, 0.0, 64, 64, &layout(ViewMode::Unbounded, 1.0, Some(16.0)));
        assert_eq!(v.radius, 32.0);
        assert_eq!(v.pixels_per_unit, 4.0);
        assert_eq!(v.scan_size(), 16.0);
    }

    #[test]
    fn test_screen_world_inverse() {
        let v = Viewport::new(100.0, -50.0, 200, 100, &layout(ViewMode::Unbounded, 1.0, Some(25.0)));
        let (sx, sy) = v.world_to_screen(110.0, -45.0);
        assert_eq!(v.screen_to_world(sx, sy), (110.0, -45.0));
        assert_eq!(v.world_to_screen(100.0, -50.0), (100.0, 50.0));
    }

    #[test]
    fn test_heading_rotates_about_center() {
        let settings = ViewSettings {
            heading: FRAC_PI_2,
            ..ViewSettings::new(ViewMode::Bounded, 2.0)
        };
        let v = Viewport::new(0.0, 0.0, 100, 100, &settings);
        // A point east of the camera ends up below the center.
        let (sx, sy) = v.world_to_screen(10.0, 0.0);
        assert!((sx - 50.0).abs() < 1e-9);
        assert!(sy > 50.0);

        let (wx, wz) = v.screen_to_world(sx, sy);
        assert!((wx - 10.0).abs() < 1e-9 && wz.abs() < 1e-9);

        let full = Viewport::new(0.0, 0.0, 100, 100, &ViewSettings { mode: ViewMode::Unbounded, ..settings });
        assert_eq!(full.heading, 0.0);
    }

    #[test]
    fn test_contains_key_matches_scan() {
        let v = Viewport::new(30.0, -30.0, 128, 128, &layout(ViewMode::Bounded, 1.0, None));
        for key in v.visible_keys() {
            assert!(v.contains_key(key));
        }
        assert!(!v.contains_key(ChunkKey::new(50, 50)));
    }
}
