//! Soundtrack rebuild, WAV output (hound) and MP4 muxing (ffmpeg)

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::VisualizerError;

/// What the display showed at one refresh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRecord {
    /// Playback time at the refresh (seconds).
    pub playback_time: f64,
    /// Whether playback was advancing during the refresh.
    pub running: bool,
}

/// Build an audio track aligned with the rendered frames.
///
/// Frame `k` owns output samples `[round(k * sr / fps), round((k + 1) * sr / fps))`.
/// Running frames copy source audio from their playback time; suspended frames
/// are silent.
pub fn render_soundtrack(
    samples: &[f32],
    sample_rate: u32,
    fps: u32,
    frames: &[FrameRecord],
) -> Vec<f32> {
    let per_frame = sample_rate as f64 / fps as f64;
    let boundary = |k: usize| (k as f64 * per_frame).round() as usize;
    let mut out = Vec::with_capacity(boundary(frames.len()));

    for (k, frame) in frames.iter().enumerate() {
        let len = boundary(k + 1) - boundary(k);
        if !frame.running {
            out.extend(std::iter::repeat_n(0.0, len));
            continue;
        }
        let start = (frame.playback_time * sample_rate as f64).round() as usize;
        out.extend((start..start + len).map(|i| samples.get(i).copied().unwrap_or(0.0)));
    }
    out
}

/// Write mono f32 samples (-1.0 to 1.0) to a 16-bit WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16)?;
    }
    writer.finalize()
}

/// Check that `ffmpeg` can be spawned.
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg").arg("-version").output().is_ok()
}

/// Pull the last `frame=N` count out of ffmpeg's status output.
fn parse_frame_progress(status: &str) -> Option<u64> {
    status.rmatch_indices("frame=").find_map(|(i, _)| {
        let digits: String = status[i + 6..]
            .chars()
            .skip_while(|c| *c == ' ')
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    })
}

/// Encode `frame_%06d.png` from `frames_dir` with `wav` into `output`.
pub fn mux(
    frames_dir: &Path,
    wav: &Path,
    fps: u32,
    output: &Path,
    total_frames: u64,
) -> Result<(), VisualizerError> {
    let pb = ProgressBar::new(total_frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.green/black} {pos}/{len} encoding")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut child = Command::new("ffmpeg")
        .args(["-y", "-framerate", &fps.to_string(), "-i"])
        .arg(frames_dir.join("frame_%06d.png"))
        .arg("-i")
        .arg(wav)
        .args([
            "-c:v", "libx264", "-c:a", "aac", "-shortest", "-pix_fmt", "yuv420p",
        ])
        .arg(output)
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("failed to take ffmpeg stderr"))?;
    let reader_pb = pb.clone();
    let reader = std::thread::spawn(move || {
        let mut buf = [0u8; 512];
        let mut tail = Vec::<u8>::new();
        let mut last_pos = 0u64;
        while let Ok(n) = stderr.read(&mut buf) {
            if n == 0 {
                break;
            }
            tail.extend_from_slice(&buf[..n]);
            if tail.len() > 4096 {
                tail.drain(..tail.len() - 1024);
            }
            if let Some(pos) = parse_frame_progress(&String::from_utf8_lossy(&tail)) {
                let pos = pos.min(total_frames);
                if pos > last_pos {
                    last_pos = pos;
                    reader_pb.set_position(pos);
                }
            }
        }
    });

    let status = child.wait()?;
    if reader.join().is_err() {
        tracing::warn!("ffmpeg progress reader panicked");
    }
    pb.finish_with_message("Encoding done");

    if !status.success() {
        return Err(std::io::Error::other(format!("ffmpeg failed with {}", status)).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{FrameRecord, parse_frame_progress, render_soundtrack, write_wav};

    fn running(playback_time: f64) -> FrameRecord {
        FrameRecord {
            playback_time,
            running: true,
        }
    }

    #[test]
    fn running_frames_copy_source_audio() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let frames = [running(0.0), running(0.1), running(0.2)];
        let out = render_soundtrack(&samples, 100, 10, &frames);
        assert_eq!(out, samples[..30].to_vec());
    }

    #[test]
    fn suspended_frames_are_silent() {
        let samples = vec![1.0f32; 100];
        let frames = [
            running(0.0),
            FrameRecord {
                playback_time: 0.1,
                running: false,
            },
            running(0.1),
        ];
        let out = render_soundtrack(&samples, 100, 10, &frames);
        assert_eq!(out.len(), 30);
        assert!(out[..10].iter().all(|&s| s == 1.0));
        assert!(out[10..20].iter().all(|&s| s == 0.0));
        assert!(out[20..].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn fractional_frame_lengths_add_up() {
        let samples = vec![0.5f32; 44100];
        let frames: Vec<_> = (0..60).map(|k| running(k as f64 / 60.0)).collect();
        let out = render_soundtrack(&samples, 44100, 60, &frames);
        assert_eq!(out.len(), 44100);
    }

    #[test]
    fn reading_past_the_end_pads_with_silence() {
        let samples = vec![1.0f32; 5];
        let out = render_soundtrack(&samples, 100, 10, &[running(0.0)]);
        assert_eq!(out.len(), 10);
        assert_eq!(out.iter().filter(|&&s| s == 1.0).count(), 5);
    }

    #[test]
    fn frame_progress_uses_latest_status() {
        assert_eq!(parse_frame_progress("frame=   12 fps=0.0 frame=  345 fps=30"), Some(345));
        assert_eq!(parse_frame_progress("frame=7"), Some(7));
        assert_eq!(parse_frame_progress("Input #0, image2"), None);
    }

    #[test]
    fn wav_round_trip_keeps_length() {
        let path = std::env::temp_dir().join(format!(
            "audio-visualizer-wav-{}.wav",
            std::process::id()
        ));
        write_wav(&path, &[0.0, 0.5, -0.5, 2.0], 8000).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        std::fs::remove_file(&path).ok();

        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(samples, vec![0, 16383, -16383, 32767]);
    }
}
