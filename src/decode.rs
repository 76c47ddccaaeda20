//! Audio file → mono PCM decoding (symphonia)

use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::error::{UserNotice, VisualizerError};

/// File extensions accepted as audio.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "oga", "m4a", "aac"];

/// Decoded audio (mono PCM and sample rate).
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    /// Mono PCM samples (f32, -1.0 to 1.0).
    pub samples: Vec<f32>,
    /// Sample rate (Hz).
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Reject files that are not audio before reading them.
pub fn check_audio_file(path: &Path) -> Result<(), UserNotice> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext {
        Some(ext) if AUDIO_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(UserNotice::UnsupportedFileType(path.display().to_string())),
    }
}

/// Decode an audio file and return mono PCM.
/// Multi-channel audio is averaged down to mono.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, VisualizerError> {
    let src = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| VisualizerError::Decode(format!("format probe error: {}", e)))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| VisualizerError::Decode("no audio track found".into()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut decoder = get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| VisualizerError::Decode(format!("decoder creation error: {}", e)))?;

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| VisualizerError::Decode("missing sample rate".into()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped = 0usize;

    loop {
        let packet = match probed.format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(VisualizerError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("skipping undecodable packet: {}", e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(VisualizerError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut sample_buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buffer.copy_interleaved_ref(decoded);

        let slice = sample_buffer.samples();
        if channels == 1 {
            samples.extend_from_slice(slice);
        } else {
            samples.extend(
                slice
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }
    }

    if skipped > 0 {
        tracing::warn!("{} packets could not be decoded and were skipped", skipped);
    }
    tracing::info!(
        "decoded {} samples at {} Hz from {}",
        samples.len(),
        sample_rate,
        path.display()
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}
