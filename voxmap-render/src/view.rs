//! The map view: paints visible chunks, the compass and markers onto an
//! attached canvas and keeps the picture current as chunks arrive.

use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use voxmap_cache::{ChunkEvent, ChunkLoader, ChunkRecord};
use voxmap_core::coords::column_coords;
use voxmap_core::{CHUNK_AREA, CHUNK_SIZE, ChunkKey, FillColor, MapError};

use crate::canvas::{Canvas, Rect};
use crate::config::RenderConfig;
use crate::marker::{self, Marker, MarkerSource, ProjectedMarker};
use crate::viewport::{MAX_MAP_SIZE, MIN_ZOOM, ViewMode, ViewSettings, Viewport};

const COMPASS: [(&str, f64); 4] = [("N", -FRAC_PI_2), ("E", 0.0), ("S", FRAC_PI_2), ("W", PI)];

enum ViewState<C> {
    Uninitialized,
    Active(C),
    Disposed,
}

/// A world block picked on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedPoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// One rendered map. Several views may share a `ChunkLoader`; each gets its
/// own notification receiver when a canvas is first attached.
pub struct MapView<C: Canvas> {
    loader: ChunkLoader,
    markers: Arc<dyn MarkerSource>,
    config: RenderConfig,
    settings: ViewSettings,
    world: Option<String>,
    state: ViewState<C>,
    events: Option<broadcast::Receiver<ChunkEvent>>,
    viewport: Option<Viewport>,
}

impl<C: Canvas> MapView<C> {
    pub fn new(loader: ChunkLoader, markers: Arc<dyn MarkerSource>, config: RenderConfig, mode: ViewMode) -> Self {
        let settings = ViewSettings::new(mode, config.minimap_radius_divisor);
        Self {
            loader,
            markers,
            config,
            settings,
            world: None,
            state: ViewState::Uninitialized,
            events: None,
            viewport: None,
        }
    }

    /// Attaches (or swaps) the drawing surface. The first attach subscribes
    /// to chunk notifications; a swap redraws at the last camera.
    pub fn attach_canvas(&mut self, canvas: C) -> Result<()> {
        match self.state {
            ViewState::Disposed => return Err(MapError::ViewNotActive.into()),
            ViewState::Uninitialized => {
                log::info!("Map view attached ({}x{}, {:?})", canvas.width(), canvas.height(), self.settings.mode);
                self.events = Some(self.loader.subscribe());
            }
            ViewState::Active(_) => log::debug!("Swapping map canvas"),
        }
        self.state = ViewState::Active(canvas);
        self.redraw()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ViewState::Active(_))
    }

    pub fn canvas(&self) -> Option<&C> {
        match &self.state {
            ViewState::Active(canvas) => Some(canvas),
            _ => None,
        }
    }

    pub fn settings(&self) -> ViewSettings {
        self.settings
    }

    /// Layout of the last full draw.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn pending_requests(&self) -> usize {
        self.loader.pending()
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> Result<()> {
        self.settings.mode = mode;
        self.redraw()
    }

    /// Zoom factor over the default map size, raised to at least
    /// `MIN_ZOOM`. Clears any explicit map size.
    pub fn set_zoom(&mut self, scale: f64) -> Result<()> {
        if !(scale > 0.0 && scale.is_finite()) {
            anyhow::bail!("zoom must be a positive number, got {}", scale);
        }
        self.settings.zoom = scale.max(MIN_ZOOM);
        self.settings.map_size = None;
        self.redraw()
    }

    /// World units across the visible diameter, at most `MAX_MAP_SIZE`.
    pub fn set_map_size(&mut self, size: f64) -> Result<()> {
        if !(size > 0.0 && size.is_finite()) {
            anyhow::bail!("map size must be a positive number, got {}", size);
        }
        self.settings.map_size = Some(size.min(MAX_MAP_SIZE));
        self.redraw()
    }

    /// Rotates the minimap about its center (radians, clockwise on screen).
    /// The full map ignores it.
    pub fn set_heading(&mut self, angle: f64) -> Result<()> {
        if !angle.is_finite() {
            anyhow::bail!("heading must be finite, got {}", angle);
        }
        self.settings.heading = angle;
        self.redraw()
    }

    /// Only markers of this world (or of no world) are drawn.
    pub fn set_world(&mut self, world: Option<String>) -> Result<()> {
        self.world = world;
        self.redraw()
    }

    /// Full draw centered on the camera.
    pub fn draw(&mut self, camera_x: f64, camera_z: f64) -> Result<()> {
        let start = Instant::now();
        let ViewState::Active(canvas) = &mut self.state else {
            return Err(MapError::ViewNotActive.into());
        };
        let viewport = Viewport::new(camera_x, camera_z, canvas.width(), canvas.height(), &self.settings);

        let threshold = self
            .config
            .evict_distance_chunks
            .max((viewport.scan_size() / (2.0 * CHUNK_SIZE as f64) + 2.0) * SQRT_2);
        let evicted = self.loader.evict(viewport.camera_key(), threshold);
        if evicted > 0 {
            log::debug!("Evicted {} chunks around {}", evicted, viewport.camera_key());
        }

        let metrics = self.loader.metrics();
        let tiles: Vec<(ChunkKey, ChunkRecord)> = {
            let mut cache = self.loader.lock();
            viewport
                .visible_keys()
                .into_iter()
                .map(|key| {
                    self.loader.ensure_requested(&mut cache, key);
                    let record = cache.get(key).clone();
                    if matches!(record, ChunkRecord::Ready(_)) {
                        metrics.record_cache_hit();
                    } else {
                        metrics.record_cache_miss();
                    }
                    (key, record)
                })
                .collect()
        };

        canvas.set_clip(None);
        canvas.set_rotation(viewport.heading);
        canvas.clear();
        for (key, record) in &tiles {
            paint_tile(canvas, &viewport, &self.config, *key, record);
        }
        let markers = self.markers.markers();
        for projected in draw_overlay(canvas, &viewport, &self.config, &markers, self.world.as_deref(), None) {
            metrics.record_marker(projected.clamped);
        }

        metrics.record_full_draw(start.elapsed());
        self.viewport = Some(viewport);
        Ok(())
    }

    /// Draws again at the last camera, if there was a draw.
    pub fn redraw(&mut self) -> Result<()> {
        match self.viewport {
            Some(viewport) if self.is_active() => self.draw(viewport.camera_x, viewport.camera_z),
            _ => Ok(()),
        }
    }

    /// Repaints one settled chunk, then the parts of markers that overlap
    /// it, leaving the canvas as a full draw would. Returns whether the
    /// chunk was on screen.
    pub fn on_chunk_ready(&mut self, key: ChunkKey) -> Result<bool> {
        let ViewState::Active(canvas) = &mut self.state else {
            return Err(MapError::ViewNotActive.into());
        };
        let Some(viewport) = self.viewport else {
            return Ok(false);
        };
        if !viewport.contains_key(key) {
            return Ok(false);
        }

        let record = self.loader.lock().get(key).clone();
        let tile = tile_rect(&viewport, key);
        canvas.set_rotation(viewport.heading);
        canvas.set_clip(None);
        canvas.clear_rect(tile);
        paint_tile(canvas, &viewport, &self.config, key, &record);

        let markers = self.markers.markers();
        canvas.set_clip(Some(tile));
        draw_overlay(canvas, &viewport, &self.config, &markers, self.world.as_deref(), Some(tile));
        canvas.set_clip(None);
        self.loader.metrics().record_tile_repaint();
        Ok(true)
    }

    /// Handles every notification already queued. A lagged receiver has
    /// missed some, so the whole map is redrawn instead.
    pub fn pump_events(&mut self) -> Result<usize> {
        let mut repainted = 0;
        loop {
            let events = self.events.as_mut().ok_or(MapError::ViewNotActive)?;
            match events.try_recv() {
                Ok(event) => {
                    if self.on_chunk_ready(event.key())? {
                        repainted += 1;
                    }
                }
                Err(TryRecvError::Lagged(missed)) => {
                    log::warn!("Map view missed {} chunk notifications, redrawing", missed);
                    self.redraw()?;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(repainted),
            }
        }
    }

    /// Waits for the next settled chunk and repaints it. `None` once the
    /// loader is gone.
    pub async fn wait_for_chunk(&mut self) -> Result<Option<ChunkKey>> {
        loop {
            let events = self.events.as_mut().ok_or(MapError::ViewNotActive)?;
            match events.recv().await {
                Ok(event) => {
                    self.on_chunk_ready(event.key())?;
                    return Ok(Some(event.key()));
                }
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("Map view missed {} chunk notifications, redrawing", missed);
                    self.redraw()?;
                }
                Err(RecvError::Closed) => return Ok(None),
            }
        }
    }

    /// The world block under a canvas point, with its surface height.
    pub fn place_marker_at_screen_point(&self, screen_x: f64, screen_y: f64) -> Result<PlacedPoint> {
        if !self.is_active() {
            return Err(MapError::ViewNotActive.into());
        }
        let viewport = self.viewport.ok_or(MapError::ViewNotActive)?;
        let (world_x, world_z) = viewport.screen_to_world(screen_x, screen_y);
        let (x, z) = (world_x.floor() as i32, world_z.floor() as i32);
        let y = self.loader.sampler().highest_block_y(x, z);
        Ok(PlacedPoint { x, y, z })
    }

    /// An existing marker of the current world close to `(x, z)`.
    pub fn marker_near(&self, x: f64, z: f64) -> Option<Marker> {
        let markers: Vec<Marker> = self
            .markers
            .markers()
            .into_iter()
            .filter(|m| m.belongs_to(self.world.as_deref()))
            .collect();
        marker::marker_near(&markers, x, z, self.config.marker_hit_radius).cloned()
    }

    /// Stops listening and hands the canvas back. The view cannot be reused.
    pub fn dispose(&mut self) -> Option<C> {
        self.events = None;
        match std::mem::replace(&mut self.state, ViewState::Disposed) {
            ViewState::Active(canvas) => {
                log::info!("Map view disposed");
                Some(canvas)
            }
            _ => None,
        }
    }
}

fn paint_tile<C: Canvas>(canvas: &mut C, viewport: &Viewport, config: &RenderConfig, key: ChunkKey, record: &ChunkRecord) {
    let (ox, oz) = key.origin();
    let uniform = match record {
        ChunkRecord::Ready(chunk) => {
            for (index, color) in chunk.colors().iter().enumerate() {
                let (lx, lz) = column_coords(index);
                paint_block(canvas, viewport, ox + lx as i32, oz + lz as i32, color);
            }
            return;
        }
        ChunkRecord::Unavailable => &config.unavailable_color,
        ChunkRecord::Requested | ChunkRecord::Unrequested => &config.placeholder_color,
    };
    for index in 0..CHUNK_AREA {
        let (lx, lz) = column_coords(index);
        paint_block(canvas, viewport, ox + lx as i32, oz + lz as i32, uniform);
    }
}

fn tile_rect(viewport: &Viewport, key: ChunkKey) -> Rect {
    let (ox, oz) = key.origin();
    let (x, y) = viewport.world_to_map(ox as f64, oz as f64);
    let size = CHUNK_SIZE as f64 * viewport.pixels_per_unit;
    Rect::new(x, y, size, size)
}

fn paint_block<C: Canvas>(canvas: &mut C, viewport: &Viewport, block_x: i32, block_z: i32, color: &FillColor) {
    let ppu = viewport.pixels_per_unit;
    let (mx, my) = viewport.world_to_map(block_x as f64, block_z as f64);
    // Cells inside the minimap circle are on the canvas at any heading.
    if mx + ppu <= 0.0 || my + ppu <= 0.0 || mx >= canvas.width() as f64 || my >= canvas.height() as f64 {
        return;
    }
    if !viewport.is_inside(mx + ppu / 2.0, my + ppu / 2.0) {
        return;
    }
    canvas.fill_rect(Rect::new(mx, my, ppu, ppu), color);
}

/// Compass (bounded only) then markers. With `within`, markers that cannot
/// touch that rectangle are skipped. Returns the markers drawn.
fn draw_overlay<C: Canvas>(
    canvas: &mut C,
    viewport: &Viewport,
    config: &RenderConfig,
    markers: &[Marker],
    world: Option<&str>,
    within: Option<Rect>,
) -> Vec<ProjectedMarker> {
    let (cx, cy) = viewport.center();
    if viewport.mode == ViewMode::Bounded {
        let size = viewport.radius / 4.0;
        for (label, angle) in COMPASS {
            let x = cx + viewport.radius * angle.cos();
            let y = cy + viewport.radius * angle.sin();
            canvas.draw_label(label, x, y, size, &config.label_color);
        }
    }

    let mut drawn = Vec::new();
    for marker in markers.iter().filter(|m| m.belongs_to(world)) {
        let Some(projected) = marker::project(marker, viewport) else {
            continue;
        };
        let reach = projected.radius + viewport.pixels_per_unit / 2.0 + 1.0;
        if let Some(rect) = within {
            let bounds = Rect::new(projected.x - reach, projected.y - reach, reach * 2.0, reach * 2.0);
            if !overlaps(&rect, &bounds) {
                continue;
            }
        }
        canvas.fill_circle(
            projected.x,
            projected.y,
            projected.radius,
            marker.fill(config),
            &config.marker_stroke_color,
            viewport.pixels_per_unit,
        );
        drawn.push(projected);
    }
    drawn
}

fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
}
