//! Render configuration: canvas size, waveform history, spectrum rings.

use std::path::Path;

use serde::Deserialize;

use crate::error::VisualizerError;

/// Immutable configuration resolved once at startup.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub canvas: CanvasConfig,
    pub waveform: WaveformConfig,
    pub spectrum: SpectrumConfig,
}

/// Drawing surface settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width (pixels).
    pub width: u32,
    /// Canvas height (pixels).
    pub height: u32,
    /// Background color as RGBA.
    pub background: [u8; 4],
    /// Display refresh rate (frames per second).
    pub fps: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 500,
            background: [0, 0, 0, 255],
            fps: 60,
        }
    }
}

/// Scrolling waveform settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaveformConfig {
    /// How many time-domain frames the history keeps.
    pub frames_retained: usize,
    /// Samples per time-domain frame (TIME_BUFFER_LENGTH).
    pub samples_per_frame: usize,
    /// Samples merged into one drawn bar.
    pub samples_per_bar: usize,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            frames_retained: 200,
            samples_per_frame: 256,
            samples_per_bar: 64,
        }
    }
}

impl WaveformConfig {
    /// Total number of samples held by the history buffer.
    pub fn capacity(&self) -> usize {
        self.frames_retained * self.samples_per_frame
    }
}

/// Rotating spectrum ring settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpectrumConfig {
    /// FFT size, also the frequency frame length (FREQ_BUFFER_LENGTH).
    pub fft_size: usize,
    /// Analyser smoothing time constant in [0, 1).
    pub smoothing: f32,
    /// Magnitude mapped to byte 0 (dB).
    pub min_db: f32,
    /// Magnitude mapped to byte 255 (dB).
    pub max_db: f32,
    /// Stroke width of both rings (pixels).
    pub line_width: f32,
    /// Stroke color as RGBA (translucent).
    pub color: [u8; 4],
    pub inner: RingConfig,
    pub outer: RingConfig,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            fft_size: 64,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
            line_width: 2.0,
            color: [255, 255, 255, 153],
            inner: RingConfig {
                radius: 95.0,
                wave: 15.0,
                rotate: 20.0,
            },
            outer: RingConfig {
                radius: 100.0,
                wave: 20.0,
                rotate: -10.0,
            },
        }
    }
}

/// One ring of the spectrum display.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct RingConfig {
    /// Base radius (pixels).
    pub radius: f32,
    /// Maximum displacement at full magnitude (pixels).
    pub wave: f32,
    /// Rotation speed in degrees per second; the sign picks the direction.
    pub rotate: f32,
}

impl RenderConfig {
    /// Load a TOML file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, VisualizerError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, VisualizerError> {
        toml::from_str(content).map_err(|e| VisualizerError::Config(e.to_string()))
    }

    /// Reject configurations the renderers cannot work with.
    pub fn validate(&self) -> Result<(), VisualizerError> {
        let fail = |msg: &str| Err(VisualizerError::Config(msg.to_string()));

        if self.canvas.width == 0 || self.canvas.height == 0 {
            return fail("canvas width and height must be positive");
        }
        if self.canvas.fps == 0 {
            return fail("fps must be positive");
        }
        let wave = &self.waveform;
        if wave.frames_retained == 0 || wave.samples_per_frame == 0 || wave.samples_per_bar == 0 {
            return fail("waveform sizes must be positive");
        }
        if wave.samples_per_bar > wave.capacity() {
            return fail("samples_per_bar exceeds the waveform history capacity");
        }
        let spec = &self.spectrum;
        if spec.fft_size < 2 || !spec.fft_size.is_power_of_two() {
            return fail("fft_size must be an even power of two");
        }
        if !(0.0..1.0).contains(&spec.smoothing) {
            return fail("smoothing must be in [0, 1)");
        }
        if spec.min_db >= spec.max_db {
            return fail("min_db must be below max_db");
        }
        if spec.line_width <= 0.0 {
            return fail("line_width must be positive");
        }
        Ok(())
    }
}
