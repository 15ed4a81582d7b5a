//! Connection lifecycle state machine
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Closed | Errored
//!                     ^                          |
//!                     +------ backoff delay -----+
//! ```
//!
//! Pure bookkeeping; the manager drives the I/O and asks this type what the
//! next delay is.

use serde::Serialize;
use std::time::Duration;

use super::backoff::BackoffSchedule;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Not started, or torn down
    Disconnected,
    /// Open in progress
    Connecting,
    /// Open and receiving frames
    Connected,
    /// Closed; a reconnect is scheduled
    Closed,
    /// Transport error seen; a close always follows
    Errored,
}

impl ConnectionState {
    /// Only `Connected` counts as connected for the indicator
    #[inline(always)]
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

#[derive(Debug, Clone)]
pub struct LinkState {
    state: ConnectionState,
    /// Closures since the last successful open
    retries: usize,
    schedule: BackoffSchedule,
}

impl LinkState {
    pub fn new(schedule: BackoffSchedule) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            retries: 0,
            schedule,
        }
    }

    /// Begin an open attempt
    pub fn connecting(&mut self) -> ConnectionState {
        self.state = ConnectionState::Connecting;
        self.state
    }

    /// Open succeeded: reset the retry counter
    pub fn opened(&mut self) -> ConnectionState {
        self.state = ConnectionState::Connected;
        self.retries = 0;
        self.state
    }

    /// Transport error. Does not schedule anything by itself; `closed` must follow.
    pub fn errored(&mut self) -> ConnectionState {
        self.state = ConnectionState::Errored;
        self.state
    }

    /// Socket closed. Returns the delay before the next open attempt.
    pub fn closed(&mut self) -> Duration {
        let delay = self.schedule.delay_for(self.retries);
        self.retries = self.retries.saturating_add(1);
        self.state = ConnectionState::Closed;
        delay
    }

    /// Explicit teardown
    pub fn shut_down(&mut self) -> ConnectionState {
        self.state = ConnectionState::Disconnected;
        self.state
    }

    #[inline(always)]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[inline(always)]
    pub fn retries(&self) -> usize {
        self.retries
    }

    #[inline(always)]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }
}
