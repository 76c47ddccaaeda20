//! Playback transport and the host clock that drives it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Host time in seconds, shared between the vsync driver and every transport.
///
/// Single-threaded: only the driver advances it.
#[derive(Clone, Debug, Default)]
pub struct HostClock(Rc<Cell<f64>>);

impl HostClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.0.get()
    }

    pub fn advance(&self, secs: f64) {
        self.0.set(self.0.get() + secs);
    }
}

/// State reported by the playback transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Closed,
    Running,
    Suspended,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Running => write!(f, "running"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

pub trait PlaybackTransport {
    fn start(&mut self);
    fn suspend(&mut self);
    fn resume(&mut self);
    fn close(&mut self);
    fn state(&self) -> TransportState;
}

/// Transport whose playback time follows the host clock while running.
#[derive(Debug)]
pub struct VirtualTransport {
    clock: HostClock,
    state: TransportState,
    started: bool,
    /// Playback time accumulated before the current running span.
    elapsed: f64,
    /// Host time at which the current running span began.
    resumed_at: f64,
}

impl VirtualTransport {
    /// A fresh transport is suspended at time zero until `start`.
    pub fn new(clock: HostClock) -> Self {
        Self {
            clock,
            state: TransportState::Suspended,
            started: false,
            elapsed: 0.0,
            resumed_at: 0.0,
        }
    }

    pub fn current_time(&self) -> f64 {
        match self.state {
            TransportState::Running => self.elapsed + (self.clock.now() - self.resumed_at),
            _ => self.elapsed,
        }
    }

    fn run(&mut self) {
        self.resumed_at = self.clock.now();
        self.state = TransportState::Running;
    }

    fn freeze(&mut self, state: TransportState) {
        self.elapsed = self.current_time();
        self.state = state;
    }
}

impl PlaybackTransport for VirtualTransport {
    fn start(&mut self) {
        if self.started || self.state == TransportState::Closed {
            tracing::debug!("start ignored, transport is {}", self.state);
            return;
        }
        self.started = true;
        self.run();
    }

    fn suspend(&mut self) {
        if self.state != TransportState::Running {
            tracing::debug!("suspend ignored, transport is {}", self.state);
            return;
        }
        self.freeze(TransportState::Suspended);
    }

    fn resume(&mut self) {
        if self.state != TransportState::Suspended || !self.started {
            tracing::debug!("resume ignored, transport is {}", self.state);
            return;
        }
        self.run();
    }

    fn close(&mut self) {
        if self.state != TransportState::Closed {
            self.freeze(TransportState::Closed);
        }
    }

    fn state(&self) -> TransportState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::{HostClock, PlaybackTransport, TransportState, VirtualTransport};

    #[test]
    fn time_is_frozen_until_started() {
        let clock = HostClock::new();
        let transport = VirtualTransport::new(clock.clone());
        clock.advance(2.0);
        assert_eq!(transport.state(), TransportState::Suspended);
        assert_eq!(transport.current_time(), 0.0);
    }

    #[test]
    fn time_advances_only_while_running() {
        let clock = HostClock::new();
        clock.advance(1.0);
        let mut transport = VirtualTransport::new(clock.clone());
        transport.start();
        clock.advance(0.5);
        assert_eq!(transport.current_time(), 0.5);

        transport.suspend();
        clock.advance(3.0);
        assert_eq!(transport.state(), TransportState::Suspended);
        assert_eq!(transport.current_time(), 0.5);

        transport.resume();
        clock.advance(0.25);
        assert_eq!(transport.current_time(), 0.75);
    }

    #[test]
    fn resume_before_start_is_ignored() {
        let clock = HostClock::new();
        let mut transport = VirtualTransport::new(clock.clone());
        transport.resume();
        clock.advance(1.0);
        assert_eq!(transport.state(), TransportState::Suspended);
        assert_eq!(transport.current_time(), 0.0);
    }

    #[test]
    fn second_start_does_not_rewind() {
        let clock = HostClock::new();
        let mut transport = VirtualTransport::new(clock.clone());
        transport.start();
        clock.advance(1.0);
        transport.start();
        clock.advance(1.0);
        assert_eq!(transport.current_time(), 2.0);
    }

    #[test]
    fn close_is_terminal() {
        let clock = HostClock::new();
        let mut transport = VirtualTransport::new(clock.clone());
        transport.start();
        clock.advance(1.0);
        transport.close();
        transport.resume();
        transport.start();
        clock.advance(1.0);
        assert_eq!(transport.state(), TransportState::Closed);
        assert_eq!(transport.current_time(), 1.0);
    }
}
