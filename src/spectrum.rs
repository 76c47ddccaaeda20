//! Rotating gear-toothed spectrum rings.

use crate::config::{RingConfig, SpectrumConfig};
use crate::geometry::point_on_circle;
use crate::surface::{Color, LineJoin, Path, Stroke, Surface};

/// Angle (degrees) both rings start from before rotation.
const BASE_PHASE: f64 = 120.0;

/// Which way frequency magnitude displaces a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bulge {
    Outward,
    Inward,
}

#[derive(Clone, Copy, Debug)]
struct Ring {
    config: RingConfig,
    bulge: Bulge,
}

impl Ring {
    fn radius(&self, magnitude: u8) -> f32 {
        let push = self.config.wave * (magnitude as f32 / 255.0);
        match self.bulge {
            Bulge::Outward => self.config.radius + push,
            Bulge::Inward => self.config.radius - push,
        }
    }

    /// Rotation offset in degrees at `playback_time` seconds.
    fn phase(&self, playback_time: f64) -> f32 {
        (BASE_PHASE + playback_time * self.config.rotate as f64) as f32
    }
}

pub struct SpectrumRenderer {
    outer: Ring,
    inner: Ring,
    stroke: Stroke,
}

impl SpectrumRenderer {
    pub fn new(config: &SpectrumConfig) -> Self {
        Self {
            outer: Ring {
                config: config.outer,
                bulge: Bulge::Outward,
            },
            inner: Ring {
                config: config.inner,
                bulge: Bulge::Inward,
            },
            stroke: Stroke {
                color: Color::from(config.color),
                width: config.line_width,
                join: LineJoin::Round,
            },
        }
    }

    /// Stroke the outer ring, then the inner ring, centered on the canvas.
    pub fn draw<S: Surface>(&self, surface: &mut S, frequencies: &[u8], playback_time: f64) {
        let center = (surface.width() / 2.0, surface.height() / 2.0);
        for ring in [&self.outer, &self.inner] {
            let path = ring_path(ring, center, frequencies, playback_time);
            surface.stroke_path(&path, &self.stroke);
        }
    }

    #[cfg(test)]
    fn paths(&self, center: (f32, f32), frequencies: &[u8], playback_time: f64) -> [Path; 2] {
        [
            ring_path(&self.outer, center, frequencies, playback_time),
            ring_path(&self.inner, center, frequencies, playback_time),
        ]
    }
}

/// Closed path with four vertices per used bin. Only the lower half of the
/// bins is used; the upper half mirrors it.
fn ring_path(ring: &Ring, center: (f32, f32), frequencies: &[u8], playback_time: f64) -> Path {
    let used = frequencies.len() / 2;
    let mut path = Path::with_capacity(used * 4 + 1);
    if used == 0 {
        return path;
    }

    let angle_step = 360.0 / frequencies.len() as f32 * 2.0;
    let phase = ring.phase(playback_time);
    let base = ring.config.radius;
    let at = |radius: f32, step: f32| {
        point_on_circle(center.0, center.1, radius, angle_step * step + phase)
    };

    for (i, &magnitude) in frequencies[..used].iter().enumerate() {
        let i = i as f32;
        let radius = ring.radius(magnitude);
        path.line_to(at(radius, i));
        path.line_to(at(radius, i + 0.4));
        path.line_to(at(base, i + 0.6));
        path.line_to(at(base, i + 0.8));
    }
    path.close();
    path
}

#[cfg(test)]
mod tests {
    use super::SpectrumRenderer;
    use crate::config::SpectrumConfig;
    use crate::geometry::point_on_circle;
    use crate::surface::LineJoin;
    use crate::surface::recording::RecordingSurface;

    fn distance(p: (f32, f32), center: (f32, f32)) -> f32 {
        ((p.0 - center.0).powi(2) + (p.1 - center.1).powi(2)).sqrt()
    }

    #[test]
    fn rings_close_on_first_vertex() {
        let renderer = SpectrumRenderer::new(&SpectrumConfig::default());
        let frequencies: Vec<u8> = (0..64).map(|i| (i * 37 % 256) as u8).collect();
        for path in renderer.paths((150.0, 250.0), &frequencies, 3.7) {
            let first = path.points()[0];
            let last = *path.points().last().unwrap();
            assert!(path.is_closed());
            assert!((first.0 - last.0).abs() < 1e-4 && (first.1 - last.1).abs() < 1e-4);
            assert_eq!(path.points().len(), 32 * 4 + 1);
        }
    }

    #[test]
    fn magnitude_pushes_outer_out_and_inner_in() {
        let config = SpectrumConfig::default();
        let renderer = SpectrumRenderer::new(&config);
        let center = (0.0, 0.0);
        let mut frequencies = vec![0u8; 64];
        frequencies[0] = 255;
        let [outer, inner] = renderer.paths(center, &frequencies, 0.0);

        assert!((distance(outer.points()[0], center) - 120.0).abs() < 1e-3);
        assert!((distance(outer.points()[1], center) - 120.0).abs() < 1e-3);
        assert!((distance(outer.points()[2], center) - 100.0).abs() < 1e-3);
        assert!((distance(outer.points()[4], center) - 100.0).abs() < 1e-3);

        assert!((distance(inner.points()[0], center) - 80.0).abs() < 1e-3);
        assert!((distance(inner.points()[3], center) - 95.0).abs() < 1e-3);
    }

    #[test]
    fn upper_half_of_bins_is_ignored() {
        let renderer = SpectrumRenderer::new(&SpectrumConfig::default());
        let mut loud_top = vec![0u8; 64];
        loud_top[32..].fill(255);
        let quiet = vec![0u8; 64];
        assert_eq!(
            renderer.paths((0.0, 0.0), &loud_top, 1.0),
            renderer.paths((0.0, 0.0), &quiet, 1.0)
        );
    }

    #[test]
    fn rotation_follows_playback_time_per_ring() {
        let config = SpectrumConfig::default();
        let renderer = SpectrumRenderer::new(&config);
        let frequencies = vec![0u8; 64];
        let [outer, inner] = renderer.paths((0.0, 0.0), &frequencies, 2.0);

        // Outer spins at -10 deg/s, inner at +20 deg/s, both from 120 deg.
        assert_eq!(outer.points()[0], point_on_circle(0.0, 0.0, 100.0, 100.0));
        assert_eq!(inner.points()[0], point_on_circle(0.0, 0.0, 95.0, 160.0));
        // Bin 1 starts one angle step (11.25 deg) later.
        assert_eq!(outer.points()[4], point_on_circle(0.0, 0.0, 100.0, 111.25));
    }

    #[test]
    fn draw_strokes_both_rings_around_canvas_center() {
        let renderer = SpectrumRenderer::new(&SpectrumConfig::default());
        let mut surface = RecordingSurface::new(300.0, 500.0);
        renderer.draw(&mut surface, &[128; 64], 0.5);

        assert_eq!(surface.paths.len(), 2);
        for (path, stroke) in &surface.paths {
            assert_eq!(stroke.join, LineJoin::Round);
            assert!(stroke.color.a < 255);
            let r = distance(path.points()[2], (150.0, 250.0));
            assert!((r - 100.0).abs() < 1e-3 || (r - 95.0).abs() < 1e-3);
        }
        assert!(surface.rects.is_empty());
    }

    #[test]
    fn empty_frame_draws_empty_paths() {
        let renderer = SpectrumRenderer::new(&SpectrumConfig::default());
        let [outer, inner] = renderer.paths((0.0, 0.0), &[], 0.0);
        assert!(outer.points().is_empty() && inner.points().is_empty());
    }
}
