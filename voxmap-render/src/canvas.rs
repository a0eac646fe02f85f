use std::io::{self, Write};
use std::ops::Range;

use voxmap_core::{FillColor, Rgba};

/// Axis-aligned rectangle in map coordinates. Covers a pixel when the
/// pixel's center lies inside, left and top edges included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// The drawing surface a map view paints on.
///
/// Coordinates passed in are map coordinates; the surface rotates them about
/// its center by the current rotation and drops anything outside the clip.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Makes the whole surface transparent, regardless of rotation and clip.
    fn clear(&mut self);

    /// Rotation (radians, clockwise on screen) for everything drawn after.
    fn set_rotation(&mut self, angle: f64);

    /// Limits fills and clears to `clip`. Labels are not clipped.
    fn set_clip(&mut self, clip: Option<Rect>);

    /// Makes the rectangle fully transparent.
    fn clear_rect(&mut self, rect: Rect);

    fn fill_rect(&mut self, rect: Rect, color: &FillColor);

    /// Filled circle with a stroke of `line_width` centered on its edge.
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, fill: &FillColor, stroke: &FillColor, line_width: f64);

    /// Text centered on `(x, y)`.
    fn draw_label(&mut self, text: &str, x: f64, y: f64, size: f64, color: &FillColor);
}

/// A recorded label, anchored in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: FillColor,
}

/// In-memory RGBA canvas. Labels are recorded rather than rasterized and
/// are dropped by any clear that covers their anchor.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
    labels: Vec<Label>,
    rotation: f64,
    clip: Option<Rect>,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; width as usize * height as usize],
            labels: Vec::new(),
            rotation: 0.0,
            clip: None,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Row-major RGBA pixels.
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Binary PPM (P6), transparent pixels composited over black.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut row = Vec::with_capacity(self.width as usize * 3);
        for line in self.pixels.chunks(self.width.max(1) as usize) {
            row.clear();
            for [r, g, b, a] in line {
                let a = *a as u16;
                row.extend([r, g, b].map(|c| (*c as u16 * a / 255) as u8));
            }
            out.write_all(&row)?;
        }
        Ok(())
    }

    fn rotate(&self, x: f64, y: f64, angle: f64) -> (f64, f64) {
        if angle == 0.0 {
            return (x, y);
        }
        let (cx, cy) = (self.width as f64 / 2.0, self.height as f64 / 2.0);
        let (sin, cos) = angle.sin_cos();
        let (dx, dy) = (x - cx, y - cy);
        (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
    }

    fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        self.rotate(x, y, self.rotation)
    }

    fn to_map(&self, x: f64, y: f64) -> (f64, f64) {
        self.rotate(x, y, -self.rotation)
    }

    fn pixel_range(lo: f64, hi: f64, limit: u32) -> Range<u32> {
        let from = lo.floor().clamp(0.0, limit as f64) as u32;
        let to = hi.ceil().clamp(0.0, limit as f64) as u32;
        from..to
    }

    fn unclipped(&self, map_x: f64, map_y: f64) -> bool {
        self.clip.is_none_or(|clip| clip.contains(map_x, map_y))
    }

    /// Pixels whose centers fall inside `rect` and the clip.
    fn covered(&self, rect: Rect) -> Vec<(u32, u32)> {
        let corners = [
            (rect.x, rect.y),
            (rect.x + rect.w, rect.y),
            (rect.x, rect.y + rect.h),
            (rect.x + rect.w, rect.y + rect.h),
        ]
        .map(|(x, y)| self.to_screen(x, y));
        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

        let mut out = Vec::new();
        for py in Self::pixel_range(min_y, max_y, self.height) {
            for px in Self::pixel_range(min_x, max_x, self.width) {
                let (mx, my) = self.to_map(px as f64 + 0.5, py as f64 + 0.5);
                if rect.contains(mx, my) && self.unclipped(mx, my) {
                    out.push((px, py));
                }
            }
        }
        out
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba) {
        let pixel = &mut self.pixels[(y * self.width + x) as usize];
        let alpha = color.alpha;
        let src = [color.rgb.r, color.rgb.g, color.rgb.b];
        for (dst, src) in pixel.iter_mut().zip(src) {
            *dst = (src as f32 * alpha + *dst as f32 * (1.0 - alpha)).round() as u8;
        }
        pixel[3] = (255.0 * alpha + pixel[3] as f32 * (1.0 - alpha)).round() as u8;
    }

    fn parse(color: &FillColor) -> Option<Rgba> {
        match color.parse_rgba() {
            Ok(rgba) => Some(rgba),
            Err(e) => {
                log::debug!("skipping fill: {}", e);
                None
            }
        }
    }
}

impl Canvas for PixelCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.pixels.fill([0; 4]);
        self.labels.clear();
    }

    fn set_rotation(&mut self, angle: f64) {
        self.rotation = if angle.is_finite() { angle } else { 0.0 };
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn clear_rect(&mut self, rect: Rect) {
        for (px, py) in self.covered(rect) {
            self.pixels[(py * self.width + px) as usize] = [0; 4];
        }
        let rotation = self.rotation;
        let (cx, cy) = (self.width as f64 / 2.0, self.height as f64 / 2.0);
        self.labels.retain(|l| {
            let (sin, cos) = (-rotation).sin_cos();
            let (dx, dy) = (l.x - cx, l.y - cy);
            !rect.contains(cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: &FillColor) {
        let Some(rgba) = Self::parse(color) else {
            return;
        };
        for (px, py) in self.covered(rect) {
            self.blend(px, py, rgba);
        }
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, fill: &FillColor, stroke: &FillColor, line_width: f64) {
        let fill = Self::parse(fill);
        let stroke = Self::parse(stroke);
        let outer = radius + line_width / 2.0;
        let (sx, sy) = self.to_screen(x, y);
        for py in Self::pixel_range(sy - outer, sy + outer + 1.0, self.height) {
            for px in Self::pixel_range(sx - outer, sx + outer + 1.0, self.width) {
                let (cx, cy) = (px as f64 + 0.5, py as f64 + 0.5);
                let d = (cx - sx).hypot(cy - sy);
                let color = if d <= radius {
                    fill
                } else if d <= outer {
                    stroke
                } else {
                    None
                };
                let Some(color) = color else {
                    continue;
                };
                let (mx, my) = self.to_map(cx, cy);
                if self.unclipped(mx, my) {
                    self.blend(px, py, color);
                }
            }
        }
    }

    fn draw_label(&mut self, text: &str, x: f64, y: f64, size: f64, color: &FillColor) {
        let (x, y) = self.to_screen(x, y);
        // Drawing the same text at the same spot again overwrites it.
        self.labels.retain(|l| !(l.text == text && l.x == x && l.y == y));
        self.labels.push(Label {
            text: text.to_string(),
            x,
            y,
            size,
            color: color.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_fill_and_clear() {
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.fill_rect(Rect::new(2.0, 2.0, 4.0, 4.0), &FillColor::new("rgb(10, 20, 30)"));
        assert_eq!(canvas.pixel(2, 2), Some([10, 20, 30, 255]));
        assert_eq!(canvas.pixel(5, 5), Some([10, 20, 30, 255]));
        assert_eq!(canvas.pixel(6, 6), Some([0, 0, 0, 0]));

        canvas.clear_rect(Rect::new(2.0, 2.0, 1.0, 1.0));
        assert_eq!(canvas.pixel(2, 2), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(9, 0), None);
    }

    #[test]
    fn test_offscreen_rect_is_clipped() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.fill_rect(Rect::new(-10.0, -10.0, 12.0, 12.0), &FillColor::new("#fff"));
        canvas.fill_rect(Rect::new(100.0, 0.0, 4.0, 4.0), &FillColor::new("#fff"));
        assert_eq!(canvas.pixel(1, 1), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_adjacent_rects_share_no_pixels() {
        let mut canvas = PixelCanvas::new(8, 1);
        let half = FillColor::new("rgba(255, 255, 255, 0.5)");
        canvas.fill_rect(Rect::new(0.25, 0.0, 3.5, 1.0), &half);
        canvas.fill_rect(Rect::new(3.75, 0.0, 3.5, 1.0), &half);
        for x in 0..8 {
            let alpha = canvas.pixel(x, 0).unwrap()[3];
            assert!(alpha == 0 || alpha == 128, "pixel {x} blended twice");
        }
    }

    #[test]
    fn test_alpha_blend() {
        let mut canvas = PixelCanvas::new(1, 1);
        canvas.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &FillColor::new("rgb(0, 0, 0)"));
        canvas.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &FillColor::new("rgba(255, 255, 255, 0.4)"));
        assert_eq!(canvas.pixel(0, 0), Some([102, 102, 102, 255]));
    }

    #[test]
    fn test_malformed_fill_is_skipped() {
        let mut canvas = PixelCanvas::new(2, 2);
        canvas.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), &FillColor::new("papayawhip"));
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_circle_stroke() {
        let mut canvas = PixelCanvas::new(20, 20);
        canvas.fill_circle(10.0, 10.0, 4.0, &FillColor::new("#ff0000"), &FillColor::new("#000"), 2.0);
        assert_eq!(canvas.pixel(10, 10), Some([255, 0, 0, 255]));
        // 4.5 px from the center: inside the stroke band.
        assert_eq!(canvas.pixel(14, 10), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(17, 10), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_clip_limits_fills() {
        let mut canvas = PixelCanvas::new(6, 6);
        canvas.set_clip(Some(Rect::new(0.0, 0.0, 2.0, 2.0)));
        canvas.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), &FillColor::new("#fff"));
        canvas.fill_circle(2.0, 2.0, 2.0, &FillColor::new("#f00"), &FillColor::new("#000"), 1.0);
        assert_eq!(canvas.pixel(1, 1), Some([255, 0, 0, 255]));
        // Corner pixel sits in the stroke band.
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(1, 0), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(2, 2), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(3, 1), Some([0, 0, 0, 0]));

        canvas.set_clip(None);
        canvas.fill_rect(Rect::new(3.0, 3.0, 1.0, 1.0), &FillColor::new("#fff"));
        assert_eq!(canvas.pixel(3, 3), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_rotated_fill() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.set_rotation(FRAC_PI_2);
        canvas.fill_rect(Rect::new(6.0, 4.0, 3.0, 2.0), &FillColor::new("#fff"));
        // Right of center before rotation, below it after.
        assert_eq!(canvas.pixel(4, 7), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(7, 5), Some([0, 0, 0, 0]));

        canvas.draw_label("N", 5.0, 0.0, 2.0, &FillColor::new("#fff"));
        let label = &canvas.labels()[0];
        assert!((label.x - 10.0).abs() < 1e-9 && (label.y - 5.0).abs() < 1e-9);

        canvas.clear();
        assert!(canvas.pixels().iter().all(|p| *p == [0; 4]));
        assert!(canvas.labels().is_empty());
    }

    #[test]
    fn test_ppm_header() {
        let mut canvas = PixelCanvas::new(2, 1);
        canvas.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &FillColor::new("rgb(1, 2, 3)"));
        canvas.draw_label("N", 1.0, 0.0, 4.0, &FillColor::new("#fff"));
        canvas.draw_label("N", 1.0, 0.0, 4.0, &FillColor::new("#fff"));
        assert_eq!(canvas.labels().len(), 1);

        let mut out = Vec::new();
        canvas.write_ppm(&mut out).unwrap();
        assert_eq!(&out[..11], b"P6\n2 1\n255\n");
        assert_eq!(&out[11..], &[1, 2, 3, 0, 0, 0]);
    }
}
