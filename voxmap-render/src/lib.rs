//! Drawing side of the voxel map: layout, marker projection, canvases and
//! the `MapView` that ties them to the chunk loader.

pub mod canvas;
pub mod config;
pub mod marker;
pub mod view;
pub mod viewport;

pub use canvas::{Canvas, Label, PixelCanvas, Rect};
pub use config::RenderConfig;
pub use marker::{Marker, MarkerSource, ProjectedMarker, marker_near, project};
pub use view::{MapView, PlacedPoint};
pub use viewport::{MAX_MAP_SIZE, MIN_ZOOM, ViewMode, ViewSettings, Viewport, visible_keys};
