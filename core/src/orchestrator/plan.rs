//! Work partitioning across workers

use crate::config::{SimulationSpec, DEFAULT_THREADS};

/// Per-worker quotas of one simulation
///
/// For a bounded run of `S` requests with `threads` requested workers, at
/// most `min(threads, S)` workers are spawned. Each gets `floor(S / T)`
/// requests and worker 0 also takes the remainder, so the quotas always add
/// up to `S`. Unbounded runs get [`DEFAULT_THREADS`] workers without quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPlan {
    quotas: Vec<Option<usize>>,
}

impl WorkPlan {
    /// Partition `sample` requests (0 = unbounded) over `requested_threads`
    pub fn new(sample: usize, requested_threads: usize) -> Self {
        if sample == 0 {
            return Self {
                quotas: vec![None; DEFAULT_THREADS],
            };
        }

        let threads = requested_threads.clamp(1, sample);
        let base = sample / threads;
        let remainder = sample - base * threads;

        let quotas = (0..threads)
            .map(|index| {
                if index == 0 {
                    Some(base + remainder)
                } else {
                    Some(base)
                }
            })
            .collect();

        Self { quotas }
    }

    /// Plan for a simulation spec
    pub fn for_spec(spec: &SimulationSpec) -> Self {
        Self::new(spec.sample, spec.requested_threads())
    }

    /// Number of workers to spawn
    pub fn worker_count(&self) -> usize {
        self.quotas.len()
    }

    /// Quota of every worker, by index
    pub fn quotas(&self) -> &[Option<usize>] {
        &self.quotas
    }

    /// Sum of all quotas, `None` when unbounded
    pub fn total(&self) -> Option<usize> {
        self.quotas.iter().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let plan = WorkPlan::new(10, 2);
        assert_eq!(plan.quotas(), &[Some(5), Some(5)]);
        assert_eq!(plan.total(), Some(10));
    }

    #[test]
    fn test_remainder_goes_to_first_worker() {
        let plan = WorkPlan::new(10, 3);
        assert_eq!(plan.quotas(), &[Some(4), Some(3), Some(3)]);
        assert_eq!(plan.total(), Some(10));
    }

    #[test]
    fn test_workers_capped_by_sample() {
        let plan = WorkPlan::new(2, 3);
        assert_eq!(plan.worker_count(), 2);
        assert_eq!(plan.quotas(), &[Some(1), Some(1)]);
    }

    #[test]
    fn test_single_worker() {
        let plan = WorkPlan::new(2, 1);
        assert_eq!(plan.quotas(), &[Some(2)]);
    }

    #[test]
    fn test_unbounded_uses_two_workers_without_quota() {
        for threads in [1, 2, 8] {
            let plan = WorkPlan::new(0, threads);
            assert_eq!(plan.quotas(), &[None, None]);
            assert_eq!(plan.total(), None);
        }
    }

    #[test]
    fn test_quotas_always_sum_to_sample() {
        for sample in 1..=60 {
            for threads in 1..=12 {
                let plan = WorkPlan::new(sample, threads);
                assert_eq!(plan.total(), Some(sample), "sample={sample} threads={threads}");
                assert_eq!(plan.worker_count(), threads.min(sample));
                assert!(plan.quotas().iter().all(|q| q.unwrap() >= 1));
            }
        }
    }

    #[test]
    fn test_for_spec_normalizes_zero_threads() {
        let spec = SimulationSpec::new("http://localhost/", "GET")
            .with_sample(7)
            .with_threads(0);
        let plan = WorkPlan::for_spec(&spec);
        assert_eq!(plan.quotas(), &[Some(4), Some(3)]);
    }
}
