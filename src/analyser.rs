//! Per-frame time-domain and frequency-domain byte frames (rustfft)

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::decode::DecodedAudio;

/// Supplies the sample frames the renderers consume.
///
/// Frame lengths are fixed when the source is constructed.
pub trait AnalysisSource {
    fn time_buffer_length(&self) -> usize;
    fn freq_buffer_length(&self) -> usize;
    /// Raw amplitudes centered at 128.
    fn time_domain_frame(&mut self) -> &[u8];
    /// Per-bin magnitudes scaled to 0..=255.
    fn frequency_frame(&mut self) -> &[u8];
    /// Seconds of playback; frozen while suspended.
    fn current_playback_time(&self) -> f64;
}

/// Analyser tuning shared by every graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyserSettings {
    pub time_buffer_length: usize,
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_db: f32,
    pub max_db: f32,
}

/// Analyser over a fully decoded buffer, read at an arbitrary playback time.
pub struct Analyser {
    audio: DecodedAudio,
    settings: AnalyserSettings,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    time_frame: Vec<u8>,
    freq_frame: Vec<u8>,
}

impl Analyser {
    pub fn new(audio: DecodedAudio, settings: AnalyserSettings) -> Self {
        let n = settings.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            window: (0..n).map(|i| blackman_window(i, n)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); n],
            smoothed: vec![0.0; n],
            time_frame: vec![128; settings.time_buffer_length],
            freq_frame: vec![0; n],
            scratch,
            fft,
            audio,
            settings,
        }
    }

    pub fn settings(&self) -> &AnalyserSettings {
        &self.settings
    }

    /// Sample at absolute index, silence outside the buffer.
    fn sample(&self, index: i64) -> f32 {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.audio.samples.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    fn position(&self, time: f64) -> i64 {
        (time * self.audio.sample_rate as f64).floor() as i64
    }

    /// Fill the time-domain frame with the samples just before `time`.
    pub fn update_time_domain(&mut self, time: f64) -> &[u8] {
        let n = self.time_frame.len() as i64;
        let start = self.position(time) - n;
        for i in 0..self.time_frame.len() {
            let x = self.sample(start + i as i64);
            self.time_frame[i] = time_domain_byte(x);
        }
        &self.time_frame
    }

    /// Fill the frequency frame from the FFT of the samples just before `time`.
    ///
    /// All `fft_size` bins are produced; for a real signal the upper half
    /// mirrors the lower one.
    pub fn update_frequency(&mut self, time: f64) -> &[u8] {
        let n = self.settings.fft_size;
        let start = self.position(time) - n as i64;
        for i in 0..n {
            let x = self.sample(start + i as i64) * self.window[i];
            self.buffer[i] = Complex::new(x, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let tau = self.settings.smoothing;
        let scale = 1.0 / n as f32;
        for (k, value) in self.buffer.iter().enumerate() {
            let magnitude = value.norm() * scale;
            self.smoothed[k] = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            self.freq_frame[k] =
                magnitude_byte(self.smoothed[k], self.settings.min_db, self.settings.max_db);
        }
        &self.freq_frame
    }
}

/// Blackman window with alpha = 0.16.
fn blackman_window(i: usize, n: usize) -> f32 {
    let alpha = 0.16;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    let x = 2.0 * std::f32::consts::PI * i as f32 / n as f32;
    a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
}

fn time_domain_byte(x: f32) -> u8 {
    (128.0 * (1.0 + x)).floor().clamp(0.0, 255.0) as u8
}

/// Linear map of the magnitude in decibels from `[min_db, max_db]` onto 0..=255.
fn magnitude_byte(magnitude: f32, min_db: f32, max_db: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    (255.0 * (db - min_db) / (max_db - min_db))
        .floor()
        .clamp(0.0, 255.0) as u8
}
