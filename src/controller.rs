//! Playback/render loop controller.
//!
//! Owns the per-source render context and the single "schedule next frame"
//! call site. A frame is requested only by `schedule_next`,
//! which is reached from `play`, from resuming in `toggle`, and from the tail
//! of a rendered frame. Cancellation always happens before a context is
//! replaced or torn down.

use std::fmt;

use crate::analyser::AnalysisSource;
use crate::config::RenderConfig;
use crate::decode::DecodedAudio;
use crate::error::{UserNotice, VisualizerError};
use crate::graph::GraphBuilder;
use crate::history::WaveformHistory;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::spectrum::SpectrumRenderer;
use crate::surface::{Color, Surface};
use crate::transport::{PlaybackTransport, TransportState};
use crate::waveform::WaveformRenderer;

/// Animation scheduling state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// No source, or a source that has not been played yet. Nothing renders.
    Idle,
    /// One frame is scheduled per display refresh.
    Running,
    /// Playback paused, no frames scheduled.
    Suspended,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

/// What a play/pause control needs to render itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub audio_started: bool,
    pub transport_state: Option<TransportState>,
}

impl PlaybackStatus {
    pub fn label(&self) -> &'static str {
        match (self.audio_started, self.transport_state) {
            (true, Some(TransportState::Running)) => "Pause",
            _ => "Play",
        }
    }
}

/// Everything built for one loaded source.
struct RenderContext<G> {
    graph: G,
    audio_started: bool,
}

pub struct LoopController<B: GraphBuilder, S: FrameScheduler> {
    builder: B,
    scheduler: S,
    waveform: WaveformRenderer,
    spectrum: SpectrumRenderer,
    history: WaveformHistory,
    context: Option<RenderContext<B::Graph>>,
    pending: Option<FrameHandle>,
    state: LoopState,
}

impl<B: GraphBuilder, S: FrameScheduler> LoopController<B, S> {
    pub fn new(config: &RenderConfig, builder: B, scheduler: S) -> Self {
        Self {
            builder,
            scheduler,
            waveform: WaveformRenderer::new(
                Color::from(config.canvas.background),
                config.waveform.samples_per_bar,
            ),
            spectrum: SpectrumRenderer::new(&config.spectrum),
            history: WaveformHistory::new(
                config.waveform.frames_retained,
                config.waveform.samples_per_frame,
            ),
            context: None,
            pending: None,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            audio_started: self.context.as_ref().is_some_and(|c| c.audio_started),
            transport_state: self.context.as_ref().map(|c| c.graph.state()),
        }
    }

    pub fn playback_time(&self) -> Option<f64> {
        self.context.as_ref().map(|c| c.graph.current_playback_time())
    }

    #[cfg(test)]
    pub fn history(&self) -> Option<&[u8]> {
        self.context.as_ref().map(|_| self.history.read())
    }

    #[cfg(test)]
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Replace the current source: cancel, tear down, rebuild, arm in `Idle`.
    pub fn load_source(&mut self, audio: DecodedAudio) -> Result<(), VisualizerError> {
        self.teardown();
        let graph = self.builder.build(audio)?;
        if graph.time_buffer_length() != self.history.frame_len() {
            tracing::warn!(
                "analysis frames hold {} samples but the history expects {}",
                graph.time_buffer_length(),
                self.history.frame_len()
            );
        }
        self.history.reset();
        tracing::debug!(
            "source loaded, loop armed ({} history samples, {} frequency bins)",
            self.history.capacity(),
            graph.freq_buffer_length()
        );
        self.context = Some(RenderContext {
            graph,
            audio_started: false,
        });
        Ok(())
    }

    /// Start playback of the armed source.
    pub fn play(&mut self) -> Result<(), UserNotice> {
        let Some(context) = self.context.as_mut() else {
            return Err(UserNotice::NoSource);
        };
        if self.state != LoopState::Idle || context.audio_started {
            return Err(UserNotice::AlreadyStarted);
        }
        context.graph.start();
        context.audio_started = true;
        self.set_state(LoopState::Running);
        self.schedule_next();
        Ok(())
    }

    /// Pause a running loop or resume a suspended one, following the
    /// transport's reported state.
    pub fn toggle(&mut self) -> Result<(), UserNotice> {
        let Some(context) = self.context.as_mut() else {
            return Err(UserNotice::NoSource);
        };
        if !context.audio_started {
            return Err(UserNotice::NotStarted);
        }
        match context.graph.state() {
            TransportState::Running => {
                context.graph.suspend();
                self.cancel_pending();
                self.set_state(LoopState::Suspended);
            }
            TransportState::Suspended => {
                context.graph.resume();
                self.set_state(LoopState::Running);
                self.schedule_next();
            }
            TransportState::Closed => return Err(UserNotice::TransportClosed),
        }
        Ok(())
    }

    /// The single play/pause control: start if never started, else toggle.
    pub fn toggle_play_status(&mut self) -> Result<(), UserNotice> {
        if self.status().audio_started {
            self.toggle()
        } else {
            self.play()
        }
    }

    /// Run every frame callback due at this display refresh.
    ///
    /// Returns the number of frames rendered.
    pub fn tick<D: Surface>(&mut self, surface: &mut D) -> Result<usize, VisualizerError> {
        let mut rendered = 0;
        for handle in self.scheduler.take_due() {
            let current = self.pending == Some(handle);
            debug_assert!(current, "stale frame callback {:?}", handle);
            if !current {
                tracing::error!("stale frame callback {:?} ignored", handle);
                continue;
            }
            self.pending = None;
            self.render_frame(surface)?;
            rendered += 1;
        }
        Ok(rendered)
    }

    /// Cancel any pending frame, then release the playback graph.
    pub fn shutdown(&mut self) {
        self.teardown();
    }

    fn render_frame<D: Surface>(&mut self, surface: &mut D) -> Result<(), VisualizerError> {
        if self.state != LoopState::Running {
            return Ok(());
        }
        let Some(context) = self.context.as_mut() else {
            return Ok(());
        };

        self.history.append(context.graph.time_domain_frame())?;
        self.waveform.draw(surface, self.history.read());

        let playback_time = context.graph.current_playback_time();
        self.spectrum
            .draw(surface, context.graph.frequency_frame(), playback_time);

        self.schedule_next();
        Ok(())
    }

    fn schedule_next(&mut self) {
        self.cancel_pending();
        self.pending = Some(self.scheduler.request_frame());
        tracing::trace!("{} frame(s) pending", self.scheduler.pending_count());
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    fn teardown(&mut self) {
        self.cancel_pending();
        if let Some(mut context) = self.context.take() {
            context.graph.close();
            tracing::debug!("previous playback graph closed");
        }
        self.set_state(LoopState::Idle);
    }

    fn set_state(&mut self, state: LoopState) {
        if self.state != state {
            tracing::debug!("loop {} -> {}", self.state, state);
            self.state = state;
        }
    }
}

impl<B: GraphBuilder, S: FrameScheduler> Drop for LoopController<B, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
