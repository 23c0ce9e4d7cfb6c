//! Fixed dispatch cadence for a worker

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Ticks once per dispatch period
///
/// The first tick fires one full period after creation. A late tick delays
/// the following ones instead of bursting to catch up, so the offered load
/// never exceeds one request per period.
pub struct DispatchCadence {
    interval: Interval,
    period: Duration,
}

impl DispatchCadence {
    /// Create a cadence; must be called from within a tokio runtime
    ///
    /// A zero period is raised to one millisecond.
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { interval, period }
    }

    /// Wait for the next dispatch slot
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Configured period
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl std::fmt::Debug for DispatchCadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCadence")
            .field("period", &self.period)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_period() {
        let start = Instant::now();
        let mut cadence = DispatchCadence::new(Duration::from_millis(100));
        cadence.tick().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(102));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_are_spaced_by_period() {
        let start = Instant::now();
        let mut cadence = DispatchCadence::new(Duration::from_millis(50));
        for _ in 0..4 {
            cadence.tick().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(210));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_raised() {
        let cadence = DispatchCadence::new(Duration::ZERO);
        assert_eq!(cadence.period(), Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debug_format() {
        let cadence = DispatchCadence::new(Duration::from_millis(10));
        let debug = format!("{:?}", cadence);
        assert!(debug.contains("DispatchCadence"));
        assert!(debug.contains("10ms"));
    }
}
