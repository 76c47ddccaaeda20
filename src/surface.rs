//! Drawing surface: the paint/path primitives the renderers emit and an
//! `image` backed rasterizer for them.

use std::path::Path as FsPath;

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::error::VisualizerError;

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    fn lerp(self, other: Color, t: f32) -> Color {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Axis-aligned rectangle in canvas coordinates (fractional edges allowed).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fill style for rectangles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Horizontal gradient: `from` at `x0`, `to` at `x1`, extended flat beyond.
    LinearGradient {
        x0: f32,
        x1: f32,
        from: Color,
        to: Color,
    },
}

impl Paint {
    fn color_at(&self, x: f32) -> Color {
        match *self {
            Paint::Solid(color) => color,
            Paint::LinearGradient { x0, x1, from, to } => {
                let span = x1 - x0;
                if span == 0.0 {
                    return to;
                }
                from.lerp(to, ((x - x0) / span).clamp(0.0, 1.0))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineJoin {
    Round,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub join: LineJoin,
}

/// Open or closed polyline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    points: Vec<(f32, f32)>,
}

impl Path {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn line_to(&mut self, point: (f32, f32)) {
        self.points.push(point);
    }

    /// Connect back to the first vertex.
    pub fn close(&mut self) {
        if let Some(&first) = self.points.first() {
            self.points.push(first);
        }
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.points.len() > 1 && self.points.first() == self.points.last()
    }
}

/// Drawing-surface handle injected into the renderers.
pub trait Surface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn fill_rect(&mut self, rect: Rect, paint: &Paint);
    fn stroke_path(&mut self, path: &Path, stroke: &Stroke);
}

/// Canvas backed by an RGBA image buffer. Contents persist between frames.
pub struct ImageSurface {
    img: RgbaImage,
    coverage: Vec<f32>,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let img = ImageBuffer::from_pixel(width, height, to_rgba(background));
        Self {
            coverage: vec![0.0; (width * height) as usize],
            img,
        }
    }

    #[cfg(test)]
    pub fn image(&self) -> &RgbaImage {
        &self.img
    }

    pub fn save(&self, path: &FsPath) -> Result<(), VisualizerError> {
        self.img.save(path)?;
        Ok(())
    }

    fn blend(&mut self, x: u32, y: u32, color: Color, coverage: f32) {
        let alpha = color.a as f32 / 255.0 * coverage.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let dst = self.img.get_pixel_mut(x, y);
        let src = [color.r, color.g, color.b];
        for (d, s) in dst.0.iter_mut().zip(src) {
            *d = (s as f32 * alpha + *d as f32 * (1.0 - alpha)).round() as u8;
        }
        let da = dst.0[3] as f32 / 255.0;
        dst.0[3] = ((alpha + da * (1.0 - alpha)) * 255.0).round() as u8;
    }
}

fn to_rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

/// Overlap of the pixel span `[p, p + 1)` with `[lo, hi)`.
fn span_coverage(p: u32, lo: f32, hi: f32) -> f32 {
    let p = p as f32;
    (hi.min(p + 1.0) - lo.max(p)).clamp(0.0, 1.0)
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

impl Surface for ImageSurface {
    fn width(&self) -> f32 {
        self.img.width() as f32
    }

    fn height(&self) -> f32 {
        self.img.height() as f32
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        let (width, height) = self.img.dimensions();
        let x0 = rect.x.min(rect.x + rect.width);
        let x1 = rect.x.max(rect.x + rect.width);
        let y0 = rect.y.min(rect.y + rect.height);
        let y1 = rect.y.max(rect.y + rect.height);
        if x1 <= 0.0 || y1 <= 0.0 {
            return;
        }

        let px_start = x0.max(0.0).floor() as u32;
        let px_end = (x1.ceil() as u32).min(width);
        let py_start = y0.max(0.0).floor() as u32;
        let py_end = (y1.ceil() as u32).min(height);

        for y in py_start..py_end {
            let cov_y = span_coverage(y, y0, y1);
            for x in px_start..px_end {
                let cov = cov_y * span_coverage(x, x0, x1);
                if cov <= 0.0 {
                    continue;
                }
                let color = paint.color_at(x as f32 + 0.5);
                self.blend(x, y, color, cov);
            }
        }
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) {
        let points = path.points();
        if points.is_empty() {
            return;
        }
        let (width, height) = self.img.dimensions();
        let half = stroke.width / 2.0;
        let reach = half + 1.0;

        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for &(x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let bx0 = (min_x - reach).max(0.0).floor() as u32;
        let by0 = (min_y - reach).max(0.0).floor() as u32;
        let bx1 = ((max_x + reach).max(0.0).ceil() as u32).min(width);
        let by1 = ((max_y + reach).max(0.0).ceil() as u32).min(height);

        // Capsules around every segment give round joins and caps. Coverage is
        // accumulated as a maximum so overlapping segments blend only once.
        let segments: Vec<_> = if points.len() == 1 {
            vec![(points[0], points[0])]
        } else {
            points.windows(2).map(|w| (w[0], w[1])).collect()
        };
        for (a, b) in segments {
            let sx0 = ((a.0.min(b.0) - reach).max(0.0).floor() as u32).max(bx0);
            let sy0 = ((a.1.min(b.1) - reach).max(0.0).floor() as u32).max(by0);
            let sx1 = ((a.0.max(b.0) + reach).max(0.0).ceil() as u32).min(bx1);
            let sy1 = ((a.1.max(b.1) + reach).max(0.0).ceil() as u32).min(by1);
            for y in sy0..sy1 {
                for x in sx0..sx1 {
                    let d = segment_distance((x as f32 + 0.5, y as f32 + 0.5), a, b);
                    let cov = (half + 0.5 - d).clamp(0.0, 1.0);
                    let slot = &mut self.coverage[(y * width + x) as usize];
                    if cov > *slot {
                        *slot = cov;
                    }
                }
            }
        }

        for y in by0..by1 {
            for x in bx0..bx1 {
                let idx = (y * width + x) as usize;
                let cov = std::mem::take(&mut self.coverage[idx]);
                if cov > 0.0 {
                    self.blend(x, y, stroke.color, cov);
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::{Paint, Path, Rect, Stroke, Surface};

    /// Surface that records draw calls instead of rasterizing.
    pub(crate) struct RecordingSurface {
        pub width: f32,
        pub height: f32,
        pub rects: Vec<(Rect, Paint)>,
        pub paths: Vec<(Path, Stroke)>,
    }

    impl RecordingSurface {
        pub fn new(width: f32, height: f32) -> Self {
            Self {
                width,
                height,
                rects: Vec::new(),
                paths: Vec::new(),
            }
        }
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> f32 {
            self.width
        }

        fn height(&self) -> f32 {
            self.height
        }

        fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
            self.rects.push((rect, *paint));
        }

        fn stroke_path(&mut self, path: &Path, stroke: &Stroke) {
            self.paths.push((path.clone(), *stroke));
        }
    }
}
