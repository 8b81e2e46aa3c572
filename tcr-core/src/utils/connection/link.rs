//! Controller-side link state machine.
//!
//! The wire to the rover is a single WebSocket, and this machine owns the
//! connect/reconnect policy around it. Close and error both land back in
//! `Disconnected` and arm exactly one retry; a successful open cancels any
//! armed retry. Timekeeping belongs to the caller, every operation takes a
//! millisecond clock so the machine can be driven from any timer or from
//! tests.

use crate::utils::wire::ControlError;

/// Delay between a drop and the next connection attempt. Retries repeat at
/// this fixed cadence until one succeeds.
pub const RECONNECT_DELAY_MS: u64 = 200;

/// Connection lifecycle of the control link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Open,
}

/// Reconnecting wrapper around one control WebSocket.
#[derive(Debug)]
pub struct ControlLink {
    state: LinkState,
    retry_at: Option<u64>,
}

impl ControlLink {
    pub fn new() -> Self {
        Self {
            state: LinkState::Disconnected,
            retry_at: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Ask for a connection attempt.
    ///
    /// Returns true when the caller should actually dial. While an attempt
    /// is in flight or the link is open this is a no-op, so repeated calls
    /// never stack sockets or timers.
    pub fn connect(&mut self) -> bool {
        match self.state {
            LinkState::Connecting | LinkState::Open => false,
            LinkState::Disconnected => {
                self.state = LinkState::Connecting;
                true
            }
        }
    }

    /// The transport finished its handshake.
    ///
    /// Cancels any armed retry. Returns true when this call moved the link
    /// into `Open`, which is the caller's cue to attach the video stream to
    /// the page again.
    pub fn opened(&mut self) -> bool {
        self.retry_at = None;
        let fresh = self.state != LinkState::Open;
        self.state = LinkState::Open;
        fresh
    }

    /// The transport dropped.
    ///
    /// Lands in `Disconnected` and arms one retry for
    /// `now_ms + RECONNECT_DELAY_MS`, unless a retry is already armed.
    pub fn closed(&mut self, now_ms: u64) {
        self.state = LinkState::Disconnected;
        if self.retry_at.is_none() {
            self.retry_at = Some(now_ms + RECONNECT_DELAY_MS);
        }
    }

    /// The transport reported a fault.
    ///
    /// Errors always travel the close path, the same way a socket's error
    /// handler ends by closing it.
    pub fn errored(&mut self, error: ControlError, now_ms: u64) {
        tracing::warn!(?error, "control link error");
        self.closed(now_ms);
    }

    /// Consume an armed retry whose deadline has passed.
    ///
    /// Returns true when the caller should dial now; the retry is spent
    /// either way once its deadline elapses.
    pub fn poll_reconnect(&mut self, now_ms: u64) -> bool {
        match self.retry_at {
            Some(deadline) if now_ms >= deadline => {
                self.retry_at = None;
                self.connect()
            }
            _ => false,
        }
    }
}
