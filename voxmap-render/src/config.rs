use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use voxmap_core::{FillColor, SHADE_STEP};

/// Tunables of the map renderer. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Cached chunks farther than this (in chunks) from the camera are
    /// dropped on the next draw.
    pub evict_distance_chunks: f64,
    /// Minimap radius = min(width, height) / divisor.
    pub minimap_radius_divisor: f64,
    pub shade_step: u8,
    /// Buffered chunk notifications per view before it lags.
    pub event_capacity: usize,
    pub placeholder_color: FillColor,
    pub unavailable_color: FillColor,
    pub marker_color: FillColor,
    pub disabled_marker_color: FillColor,
    pub marker_stroke_color: FillColor,
    pub label_color: FillColor,
    /// World distance within which a point hits an existing marker.
    pub marker_hit_radius: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            evict_distance_chunks: 32.0,
            minimap_radius_divisor: 2.2,
            shade_step: SHADE_STEP,
            event_capacity: 256,
            placeholder_color: FillColor::new("rgb(200, 200, 200)"),
            unavailable_color: FillColor::new("rgb(90, 90, 90)"),
            marker_color: FillColor::new("#d3d3d3"),
            disabled_marker_color: FillColor::new("rgba(255, 255, 255, 0.4)"),
            marker_stroke_color: FillColor::new("rgb(0, 0, 0)"),
            label_color: FillColor::new("rgb(255, 255, 255)"),
            marker_hit_radius: 2.0,
        }
    }
}

impl RenderConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read render config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse render config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.minimap_radius_divisor >= 1.0) {
            anyhow::bail!("minimap_radius_divisor must be at least 1, got {}", self.minimap_radius_divisor);
        }
        if !(self.evict_distance_chunks > 0.0) {
            anyhow::bail!("evict_distance_chunks must be positive, got {}", self.evict_distance_chunks);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r##"{ "evict_distance_chunks": 8, "unavailable_color": "#202020" }"##).unwrap();
        assert_eq!(config.evict_distance_chunks, 8.0);
        assert_eq!(config.unavailable_color.as_str(), "#202020");
        assert_eq!(config.shade_step, 20);
        assert_eq!(config.minimap_radius_divisor, 2.2);
    }

    #[test]
    fn test_load_and_validate() {
        let path = std::env::temp_dir().join(format!("voxmap-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "minimap_radius_divisor": 0.5 }"#).unwrap();
        let err = RenderConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("minimap_radius_divisor"));

        std::fs::write(&path, "{}").unwrap();
        assert_eq!(RenderConfig::load(&path).unwrap(), RenderConfig::default());
        std::fs::remove_file(&path).unwrap();

        assert!(RenderConfig::load(Path::new("/nonexistent/voxmap.json")).is_err());
    }
}
