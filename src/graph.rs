//! Playback/analysis graph built for each loaded source.

use crate::analyser::{AnalysisSource, Analyser, AnalyserSettings};
use crate::decode::DecodedAudio;
use crate::error::VisualizerError;
use crate::transport::{HostClock, PlaybackTransport, TransportState, VirtualTransport};

/// Everything the render loop needs from one decoded source.
pub trait AudioGraph: PlaybackTransport + AnalysisSource {}

impl<T: PlaybackTransport + AnalysisSource> AudioGraph for T {}

/// Constructs a fresh graph from a decoded buffer.
pub trait GraphBuilder {
    type Graph: AudioGraph;

    fn build(&mut self, audio: DecodedAudio) -> Result<Self::Graph, VisualizerError>;
}

/// Transport and analyser sharing one virtual playback clock.
pub struct OfflineGraph {
    transport: VirtualTransport,
    analyser: Analyser,
}

impl PlaybackTransport for OfflineGraph {
    fn start(&mut self) {
        self.transport.start();
    }

    fn suspend(&mut self) {
        self.transport.suspend();
    }

    fn resume(&mut self) {
        self.transport.resume();
    }

    fn close(&mut self) {
        self.transport.close();
    }

    fn state(&self) -> TransportState {
        self.transport.state()
    }
}

impl AnalysisSource for OfflineGraph {
    fn time_buffer_length(&self) -> usize {
        self.analyser.settings().time_buffer_length
    }

    fn freq_buffer_length(&self) -> usize {
        self.analyser.settings().fft_size
    }

    fn time_domain_frame(&mut self) -> &[u8] {
        let time = self.transport.current_time();
        self.analyser.update_time_domain(time)
    }

    fn frequency_frame(&mut self) -> &[u8] {
        let time = self.transport.current_time();
        self.analyser.update_frequency(time)
    }

    fn current_playback_time(&self) -> f64 {
        self.transport.current_time()
    }
}

/// Builds [`OfflineGraph`]s on the driver's host clock.
pub struct OfflineGraphBuilder {
    clock: HostClock,
    settings: AnalyserSettings,
}

impl OfflineGraphBuilder {
    pub fn new(clock: HostClock, settings: AnalyserSettings) -> Self {
        Self { clock, settings }
    }
}

impl GraphBuilder for OfflineGraphBuilder {
    type Graph = OfflineGraph;

    fn build(&mut self, audio: DecodedAudio) -> Result<OfflineGraph, VisualizerError> {
        if audio.sample_rate == 0 {
            return Err(VisualizerError::Decode("decoded audio has no sample rate".into()));
        }
        tracing::debug!(
            "building graph: {} samples at {} Hz",
            audio.samples.len(),
            audio.sample_rate
        );
        Ok(OfflineGraph {
            transport: VirtualTransport::new(self.clock.clone()),
            analyser: Analyser::new(audio, self.settings),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{GraphBuilder, OfflineGraphBuilder};
    use crate::analyser::{AnalysisSource, AnalyserSettings};
    use crate::decode::DecodedAudio;
    use crate::transport::{HostClock, PlaybackTransport, TransportState};

    fn settings() -> AnalyserSettings {
        AnalyserSettings {
            time_buffer_length: 16,
            fft_size: 8,
            smoothing: 0.0,
            min_db: -100.0,
            max_db: -30.0,
        }
    }

    #[test]
    fn frames_follow_the_transport_clock() {
        let clock = HostClock::new();
        let mut builder = OfflineGraphBuilder::new(clock.clone(), settings());
        let audio = DecodedAudio {
            samples: vec![0.5; 1000],
            sample_rate: 100,
        };
        let mut graph = builder.build(audio).unwrap();
        assert_eq!(graph.time_buffer_length(), 16);
        assert_eq!(graph.freq_buffer_length(), 8);

        clock.advance(1.0);
        assert!(graph.time_domain_frame().iter().all(|&s| s == 128));

        graph.start();
        clock.advance(1.0);
        assert_eq!(graph.state(), TransportState::Running);
        assert_eq!(graph.current_playback_time(), 1.0);
        assert!(graph.time_domain_frame().iter().all(|&s| s == 192));
        assert_eq!(graph.frequency_frame().len(), 8);
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let mut builder = OfflineGraphBuilder::new(HostClock::new(), settings());
        let audio = DecodedAudio {
            samples: vec![0.0; 10],
            sample_rate: 0,
        };
        assert!(builder.build(audio).is_err());
    }
}
