//! Vsync loop: advances the host clock one refresh at a time and lets the
//! controller render whatever is due.

use crate::controller::{LoopController, LoopState};
use crate::encode::FrameRecord;
use crate::error::VisualizerError;
use crate::graph::GraphBuilder;
use crate::scheduler::FrameScheduler;
use crate::surface::Surface;
use crate::transport::{HostClock, TransportState};

/// Play the loaded source to its end, one display refresh per iteration.
///
/// `toggles` are host times (seconds) at which the play/pause control is
/// pressed. `present` receives the canvas after every refresh; the canvas is
/// not cleared while suspended, so it keeps showing the last rendered frame.
pub fn drive<B, S, D, F>(
    controller: &mut LoopController<B, S>,
    clock: &HostClock,
    surface: &mut D,
    duration: f64,
    fps: u32,
    toggles: &[f64],
    mut present: F,
) -> Result<Vec<FrameRecord>, VisualizerError>
where
    B: GraphBuilder,
    S: FrameScheduler,
    D: Surface,
    F: FnMut(u64, &D) -> Result<(), VisualizerError>,
{
    if let Some(bad) = toggles.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(VisualizerError::Config(format!(
            "toggle time {} is not a finite, non-negative number of seconds",
            bad
        )));
    }

    let dt = 1.0 / fps as f64;
    let mut toggles = toggles.to_vec();
    toggles.sort_by(f64::total_cmp);
    let mut next_toggle = toggles.into_iter().peekable();
    let mut frames = Vec::new();

    if let Err(notice) = controller.play() {
        tracing::warn!("{}", notice);
        return Ok(frames);
    }

    loop {
        let playback_time = controller.playback_time().unwrap_or(0.0);
        if playback_time >= duration {
            break;
        }
        match controller.state() {
            LoopState::Idle => break,
            LoopState::Suspended if next_toggle.peek().is_none() => {
                tracing::warn!(
                    "playback left suspended at {:.2}s with no further toggles, stopping",
                    playback_time
                );
                break;
            }
            _ => {}
        }

        let running = controller.status().transport_state == Some(TransportState::Running);
        clock.advance(dt);
        while next_toggle.next_if(|&t| t <= clock.now()).is_some() {
            match controller.toggle_play_status() {
                Ok(()) => tracing::info!(
                    "toggled at {:.2}s, now {}",
                    clock.now(),
                    controller.status().label()
                ),
                Err(notice) => tracing::warn!("{}", notice),
            }
        }

        controller.tick(surface)?;
        present(frames.len() as u64, surface)?;
        frames.push(FrameRecord {
            playback_time,
            running,
        });
    }

    tracing::info!("rendered {} refreshes", frames.len());
    Ok(frames)
}
