//! Reconnect backoff schedule

use std::time::Duration;

/// Ordered list of reconnect delays. Attempts past the end hold at the last entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    delays: Vec<Duration>,
}

impl BackoffSchedule {
    /// `None` if the schedule is empty
    pub fn new(delays: Vec<Duration>) -> Option<Self> {
        if delays.is_empty() {
            return None;
        }
        Some(Self { delays })
    }

    pub fn from_millis(delays: &[u64]) -> Option<Self> {
        Self::new(delays.iter().copied().map(Duration::from_millis).collect())
    }

    /// Delay before the reconnect that follows `retry` earlier closures
    #[inline]
    pub fn delay_for(&self, retry: usize) -> Duration {
        let idx = retry.min(self.delays.len() - 1);
        self.delays[idx]
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self {
            delays: vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(5),
            ],
        }
    }
}
