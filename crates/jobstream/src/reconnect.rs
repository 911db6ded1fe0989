//! Reconnect backoff state.

use std::time::Duration;

use rand::Rng;

/// The floor is the base retry interval divided by this factor.
const FLOOR_DIVISOR: u32 = 32;

/// Exponential backoff between reconnect attempts.
///
/// The interval starts at `retry / 32`, doubles after every retryable failure
/// and never exceeds `retry`. [`reset()`](Backoff::reset) drops it back to the
/// floor after a clean disconnect or a completed stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Backoff {
    floor: Duration,
    maximum: Duration,
    current: Duration,
    jitter: f64,
}

impl Backoff {
    /// Create a backoff bounded by `retry`, starting at its floor.
    pub fn new(retry: Duration) -> Self {
        let floor = match retry / FLOOR_DIVISOR {
            floor if floor.is_zero() => retry,
            floor => floor,
        };
        Self {
            floor,
            maximum: retry,
            current: floor,
            jitter: 0.0,
        }
    }

    /// Blend a random fraction into every [`delay()`](Backoff::delay).
    ///
    /// `0.0` keeps delays exact, `1.0` makes them uniform in `0..=interval`.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Interval after a reset: `retry / 32`.
    pub fn floor(&self) -> Duration {
        self.floor
    }

    /// Upper bound of the interval: the base retry interval.
    pub fn maximum(&self) -> Duration {
        self.maximum
    }

    /// The interval the next wait will be based on.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Return to the floor.
    pub fn reset(&mut self) {
        self.current = self.floor;
    }

    /// Double the interval, capped at the maximum.
    pub fn advance(&mut self) {
        self.current = self
            .current
            .checked_mul(2)
            .unwrap_or(self.maximum)
            .min(self.maximum);
    }

    /// How long to wait before the next attempt.
    pub fn delay(&self) -> Duration {
        let base = self.current.min(self.maximum);
        if self.jitter == 0.0 {
            return base;
        }

        let base = base.as_secs_f64();
        let mut rng = rand::rng();
        let randomized = rng.random_range(0.0..=base);
        let blended = base * (1.0 - self.jitter) + randomized * self.jitter;
        Duration::from_secs_f64(blended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_is_thirty_second_of_retry() {
        let backoff = Backoff::new(Duration::from_secs(2));
        assert_eq!(backoff.floor(), Duration::from_micros(62_500));
        assert_eq!(backoff.maximum(), Duration::from_secs(2));
        assert_eq!(backoff.current(), backoff.floor());
        assert_eq!(backoff.delay(), Duration::from_micros(62_500));
    }

    #[test]
    fn test_doubles_until_capped() {
        let retry = Duration::from_millis(320);
        let mut backoff = Backoff::new(retry);
        let floor = backoff.floor();

        for k in 0..10u32 {
            let expected = (floor * 2u32.pow(k)).min(retry);
            assert_eq!(backoff.delay(), expected, "after {k} failures");
            backoff.advance();
        }
        assert_eq!(backoff.current(), retry);
    }

    #[test]
    fn test_reset_returns_to_floor() {
        let mut backoff = Backoff::new(Duration::from_secs(2));
        backoff.advance();
        backoff.advance();
        assert_eq!(backoff.current(), Duration::from_millis(250));

        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_micros(62_500));
    }

    #[test]
    fn test_short_retry_floor_is_exact_fraction() {
        let retry = Duration::from_millis(16);
        let mut backoff = Backoff::new(retry);
        assert_eq!(backoff.floor(), Duration::from_micros(500));
        for k in 0..8u32 {
            let expected = (Duration::from_micros(500) * 2u32.pow(k)).min(retry);
            assert_eq!(backoff.delay(), expected, "after {k} failures");
            backoff.advance();
        }

        // Below 32ns the division would reach zero.
        let backoff = Backoff::new(Duration::from_nanos(20));
        assert_eq!(backoff.floor(), Duration::from_nanos(20));
    }

    #[test]
    fn test_jitter_stays_within_interval() {
        let backoff = Backoff::new(Duration::from_secs(2)).with_jitter(1.0);
        for _ in 0..50 {
            assert!(backoff.delay() <= backoff.current());
        }
    }

    #[test]
    fn test_jitter_is_clamped() {
        let backoff = Backoff::new(Duration::from_secs(1)).with_jitter(7.0);
        assert!(backoff.delay() <= Duration::from_secs(1));
    }
}
