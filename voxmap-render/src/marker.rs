use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use voxmap_core::FillColor;

use crate::config::RenderConfig;
use crate::viewport::{ViewMode, Viewport};

/// A named point of interest. Read-only to the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub color: Option<FillColor>,
    #[serde(default)]
    pub disabled: bool,
    /// World the marker belongs to; `None` shows it everywhere.
    #[serde(default)]
    pub world: Option<String>,
}

impl Marker {
    pub fn new(name: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z,
            color: None,
            disabled: false,
            world: None,
        }
    }

    pub fn fill<'a>(&'a self, config: &'a RenderConfig) -> &'a FillColor {
        if self.disabled {
            return &config.disabled_marker_color;
        }
        match &self.color {
            Some(color) if !color.as_str().trim().is_empty() => color,
            _ => &config.marker_color,
        }
    }

    pub fn belongs_to(&self, world: Option<&str>) -> bool {
        match (self.world.as_deref(), world) {
            (Some(own), Some(current)) => own == current,
            _ => true,
        }
    }
}

/// The external marker list. The map only reads it, once per draw.
pub trait MarkerSource: Send + Sync {
    fn markers(&self) -> Vec<Marker>;
}

impl MarkerSource for Vec<Marker> {
    fn markers(&self) -> Vec<Marker> {
        self.clone()
    }
}

impl MarkerSource for RwLock<Vec<Marker>> {
    fn markers(&self) -> Vec<Marker> {
        self.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Where and how large a marker is drawn, in map coordinates (before the
/// view's heading is applied).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedMarker {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    /// Pinned to the rim of the minimap.
    pub clamped: bool,
}

/// Projects a marker onto the canvas, or `None` when a bounded view culls it.
///
/// In bounded mode markers farther than `map_size` world units are skipped,
/// and those past the visible radius are pulled onto the rim along their
/// bearing from the center and drawn smaller.
pub fn project(marker: &Marker, viewport: &Viewport) -> Option<ProjectedMarker> {
    let ppu = viewport.pixels_per_unit;
    let (mx, my) = viewport.world_to_map(marker.x, marker.z);

    match viewport.mode {
        ViewMode::Unbounded => Some(ProjectedMarker {
            x: mx,
            y: my,
            radius: ppu,
            clamped: false,
        }),
        ViewMode::Bounded => {
            let world_distance = (marker.x - viewport.camera_x).hypot(marker.z - viewport.camera_z);
            if world_distance > viewport.map_size {
                return None;
            }
            let (cx, cy) = viewport.center();
            let (px, py) = (mx - cx, my - cy);
            if px.hypot(py) > viewport.radius {
                let angle = py.atan2(px);
                Some(ProjectedMarker {
                    x: cx + viewport.radius * angle.cos(),
                    y: cy + viewport.radius * angle.sin(),
                    radius: ppu * 1.5,
                    clamped: true,
                })
            } else {
                Some(ProjectedMarker {
                    x: mx,
                    y: my,
                    radius: ppu * 2.0,
                    clamped: false,
                })
            }
        }
    }
}

/// First marker strictly within `hit_radius` world units of `(x, z)`.
pub fn marker_near(markers: &[Marker], x: f64, z: f64, hit_radius: f64) -> Option<&Marker> {
    markers.iter().find(|m| (m.x - x).hypot(m.z - z) < hit_radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::ViewSettings;

    fn minimap() -> Viewport {
        // radius 128 px, map size 256, one pixel per unit
        Viewport::new(0.0, 0.0, 282, 282, &ViewSettings::new(ViewMode::Bounded, 2.2))
    }

    #[test]
    fn test_far_marker_is_skipped() {
        let marker = Marker::new("far", 500.0, 0.0, 500.0);
        assert_eq!(project(&marker, &minimap()), None);
    }

    #[test]
    fn test_marker_clamped_to_rim() {
        let viewport = minimap();
        let (cx, cy) = viewport.center();
        for (x, z) in [(200.0, 0.0), (-150.0, 90.0), (0.0, -255.0), (130.0, 130.0)] {
            let projected = project(&Marker::new("rim", x, 64.0, z), &viewport).unwrap();
            assert!(projected.clamped);
            assert_eq!(projected.radius, 1.5);

            let (ox, oy) = (projected.x - cx, projected.y - cy);
            assert!((ox.hypot(oy) - viewport.radius).abs() < 1e-9);
            // Same bearing as the marker.
            assert!((oy.atan2(ox) - z.atan2(x)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_marker_inside_radius() {
        let viewport = minimap();
        let projected = project(&Marker::new("near", 10.0, 64.0, -20.0), &viewport).unwrap();
        assert!(!projected.clamped);
        assert_eq!(projected.radius, 2.0);
        assert_eq!((projected.x, projected.y), (151.0, 121.0));
    }

    #[test]
    fn test_unbounded_never_culls() {
        let settings = ViewSettings {
            map_size: Some(16.0),
            ..ViewSettings::new(ViewMode::Unbounded, 2.2)
        };
        let viewport = Viewport::new(0.0, 0.0, 64, 64, &settings);
        let projected = project(&Marker::new("far", 500.0, 0.0, 500.0), &viewport).unwrap();
        assert_eq!(projected.radius, 4.0);
        assert_eq!((projected.x, projected.y), (2032.0, 2032.0));
    }

    #[test]
    fn test_fill_and_world() {
        let config = RenderConfig::default();
        let mut marker = Marker::new("home", 0.0, 0.0, 0.0);
        assert_eq!(marker.fill(&config).as_str(), "#d3d3d3");
        marker.color = Some(FillColor::new(""));
        assert_eq!(marker.fill(&config).as_str(), "#d3d3d3");
        marker.color = Some(FillColor::new("#ff0000"));
        assert_eq!(marker.fill(&config).as_str(), "#ff0000");
        marker.disabled = true;
        assert_eq!(marker.fill(&config).as_str(), "rgba(255, 255, 255, 0.4)");

        marker.world = Some("overworld".into());
        assert!(marker.belongs_to(Some("overworld")));
        assert!(!marker.belongs_to(Some("nether")));
        assert!(marker.belongs_to(None));
    }

    #[test]
    fn test_marker_near() {
        let markers = vec![Marker::new("a", 10.0, 0.0, 10.0), Marker::new("b", 11.0, 0.0, 10.0)];
        assert_eq!(marker_near(&markers, 10.5, 10.5, 2.0).map(|m| m.name.as_str()), Some("a"));
        assert_eq!(marker_near(&markers, 13.0, 10.0, 2.0), None);
    }

    #[test]
    fn test_marker_json() {
        let markers: Vec<Marker> = serde_json::from_str(
            r#"[{ "name": "spawn", "x": 0, "y": 70, "z": 0 },
                { "name": "mine", "x": -40.5, "y": 12, "z": 88, "color": "rgb(200, 40, 40)", "disabled": true }]"#,
        )
        .unwrap();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].color, None);
        assert!(markers[1].disabled);
        assert_eq!(RwLock::new(markers.clone()).markers(), markers);
    }
}
