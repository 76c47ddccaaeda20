//! Scrolling mirrored-bar waveform.
//!
//! The history is drawn oldest-first from the top of the canvas to the bottom,
//! so new frames enter at the bottom edge and the picture scrolls upwards.

use crate::history::MIDLINE;
use crate::surface::{Color, Paint, Rect, Surface};

/// Deviation of one bar above and below the midline, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarLevels {
    pub left: f32,
    pub right: f32,
}

impl BarLevels {
    /// Right side measures the peak above 128, left side the trough below it.
    pub fn of(group: &[u8]) -> Self {
        let max = group.iter().copied().fold(MIDLINE, u8::max);
        let min = group.iter().copied().fold(MIDLINE, u8::min);
        let mid = MIDLINE as f32;
        Self {
            right: ((max as f32 - mid) / mid).clamp(0.0, 1.0),
            left: ((mid - min as f32) / mid).clamp(0.0, 1.0),
        }
    }
}

/// Accent color for a bar of the given level: `rgb(255 * ratio, 166, 0)`.
pub fn accent_color(ratio: f32) -> Color {
    Color::rgb((255.0 * ratio.clamp(0.0, 1.0)).round() as u8, 166, 0)
}

pub struct WaveformRenderer {
    background: Color,
    samples_per_bar: usize,
}

impl WaveformRenderer {
    pub fn new(background: Color, samples_per_bar: usize) -> Self {
        Self {
            background,
            samples_per_bar,
        }
    }

    /// Clear the canvas and draw every complete bar of `history`.
    ///
    /// Trailing samples that do not fill a whole bar are not drawn.
    pub fn draw<S: Surface>(&self, surface: &mut S, history: &[u8]) {
        let width = surface.width();
        let height = surface.height();
        surface.fill_rect(
            Rect {
                x: 0.0,
                y: 0.0,
                width,
                height,
            },
            &Paint::Solid(self.background),
        );

        let bar_count = history.len() / self.samples_per_bar;
        if bar_count == 0 {
            return;
        }
        let bar_height = height / bar_count as f32;
        let center = width / 2.0;

        for (i, group) in history.chunks_exact(self.samples_per_bar).enumerate() {
            let levels = BarLevels::of(group);
            let y = i as f32 * bar_height;

            if levels.right > 0.0 {
                let extent = center * levels.right;
                surface.fill_rect(
                    Rect {
                        x: center,
                        y,
                        width: extent,
                        height: bar_height,
                    },
                    &Paint::LinearGradient {
                        x0: center,
                        x1: center + extent,
                        from: self.background,
                        to: accent_color(levels.right),
                    },
                );
            }
            if levels.left > 0.0 {
                let extent = center * levels.left;
                surface.fill_rect(
                    Rect {
                        x: center - extent,
                        y,
                        width: extent,
                        height: bar_height,
                    },
                    &Paint::LinearGradient {
                        x0: center,
                        x1: center - extent,
                        from: self.background,
                        to: accent_color(levels.left),
                    },
                );
            }
        }
    }
}
