//! Worker statistics tracking

use std::time::Instant;

use crate::outcome::RequestOutcome;

/// Statistics tracked by each worker
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Requests issued so far
    pub dispatched: usize,

    /// Requests that resolved (response, error or timeout)
    pub resolved: usize,

    /// Responses below 400
    pub successes: usize,

    /// Responses of 400 and above
    pub failures: usize,

    /// Transport errors and timeouts
    pub connection_failures: usize,

    /// Worker start time
    pub started_at: Option<Instant>,

    /// Worker end time
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Claim the next dispatch index
    pub fn record_dispatch(&mut self) -> usize {
        let index = self.dispatched;
        self.dispatched += 1;
        index
    }

    /// Count a resolved request
    pub fn record_outcome(&mut self, outcome: &RequestOutcome) {
        self.resolved += 1;
        if outcome.is_connection_failure {
            self.connection_failures += 1;
        } else if outcome.is_error {
            self.failures += 1;
        } else {
            self.successes += 1;
        }
    }

    /// Requests dispatched but not resolved yet
    pub fn in_flight(&self) -> usize {
        self.dispatched.saturating_sub(self.resolved)
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Resolved requests per second
    pub fn requests_per_second(&self) -> f64 {
        self.elapsed()
            .map(|d| {
                let secs = d.as_secs_f64();
                if secs > 0.0 {
                    self.resolved as f64 / secs
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_stats_defaults() {
        let stats = WorkerStats::default();
        assert_eq!(stats.dispatched, 0);
        assert_eq!(stats.resolved, 0);
        assert_eq!(stats.in_flight(), 0);
        assert!(stats.started_at.is_none());
        assert!(stats.ended_at.is_none());
    }

    #[test]
    fn test_record_dispatch_returns_sequential_indices() {
        let mut stats = WorkerStats::new();
        assert_eq!(stats.record_dispatch(), 0);
        assert_eq!(stats.record_dispatch(), 1);
        assert_eq!(stats.record_dispatch(), 2);
        assert_eq!(stats.in_flight(), 3);
    }

    #[test]
    fn test_record_outcome_classification() {
        let mut stats = WorkerStats::new();
        stats.record_outcome(&RequestOutcome::response(200, 0, 0));
        stats.record_outcome(&RequestOutcome::response(503, 0, 1));
        stats.record_outcome(&RequestOutcome::transport_error("ECONNREFUSED", 0, 2));
        stats.record_outcome(&RequestOutcome::timeout(0, 3));

        assert_eq!(stats.resolved, 4);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.connection_failures, 2);
    }

    #[test]
    fn test_worker_stats_start_stop() {
        let mut stats = WorkerStats::new();
        assert!(stats.elapsed().is_none());

        stats.start();
        assert!(stats.elapsed().is_some());

        std::thread::sleep(std::time::Duration::from_millis(10));
        stats.stop();

        let elapsed = stats.elapsed().unwrap();
        assert!(elapsed >= std::time::Duration::from_millis(10));
    }
}
