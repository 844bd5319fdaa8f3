//! # Exponential Backoff
//!
//! Provides the doubling backoff used between demand cache sync attempts.
//! The first pause is short because a freshly-established CRD usually syncs
//! within a couple of attempts; the cap keeps a struggling API server from
//! pushing pauses past the poll interval.
//!
//! Sequence with a 500ms start and 10s cap: 500ms, 1s, 2s, 4s, 8s, 10s (max).

use std::time::Duration;

/// Exponential backoff calculator
///
/// Generates backoff durations that double on each step, starting at
/// `initial` and capped at `max`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Initial backoff value (for reset)
    initial: Duration,
    /// Current backoff value
    current: Duration,
    /// Maximum backoff value
    max: Duration,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff with the given initial and maximum
    /// durations.
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            current: initial,
            max,
        }
    }

    /// Get the next backoff duration and advance the sequence.
    ///
    /// Returns the current value and doubles it for the next call, capped at
    /// `max`.
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        self.current = std::cmp::min(self.current.saturating_mul(2), self.max);
        result
    }

    /// Reset the backoff to the initial state.
    #[allow(dead_code)] // Utility method, may be useful in the future
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_sequence() {
        let mut backoff = ExponentialBackoff::new(Duration::from_millis(500), Duration::from_secs(10));

        // Sync retry sequence: 500ms, 1s, 2s, 4s
        assert_eq!(backoff.next_backoff(), Duration::from_millis(500));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(4));
    }

    #[test]
    fn test_exponential_backoff_max_cap() {
        let mut backoff = ExponentialBackoff::new(Duration::from_millis(500), Duration::from_secs(10));

        assert_eq!(backoff.next_backoff(), Duration::from_millis(500));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(4));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(8));
        // Next would be 16s, but should be capped at 10s
        assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
        // Should stay at max
        assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
    }

    #[test]
    fn test_exponential_backoff_reset() {
        let mut backoff = ExponentialBackoff::new(Duration::from_millis(500), Duration::from_secs(10));

        assert_eq!(backoff.next_backoff(), Duration::from_millis(500));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));

        backoff.reset();

        // Should restart from the beginning after success
        assert_eq!(backoff.next_backoff(), Duration::from_millis(500));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
    }
}
