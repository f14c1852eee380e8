use std::time::Duration;

/// Exponential reconnect delay.
///
/// Starts at [`Backoff::INITIAL`], doubles after every failed or ended
/// cycle up to [`Backoff::MAX`], and snaps back to the initial value as
/// soon as a stream starts successfully.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub const INITIAL: Duration = Duration::from_secs(1);
    pub const MAX: Duration = Duration::from_secs(30);

    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay the next failure will wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Record a failure: returns the delay to wait now and doubles the
    /// next one, capped at the maximum.
    pub fn on_failure(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Record a successful stream start.
    pub fn on_success(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Self::INITIAL, Self::MAX)
    }
}
