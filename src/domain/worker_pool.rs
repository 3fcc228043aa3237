//! Bounded fan-out of independent units of work.
//!
//! Each submitted unit runs on a dedicated rayon pool and sends its result
//! through an mpsc channel; the caller drains the channel once every unit
//! has finished. Results arrive in completion order.

use crate::domain::error::RsRankError;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::mpsc;

pub const DEFAULT_CONCURRENCY: usize = 10;

pub struct WorkerPool {
    pool: ThreadPool,
    width: usize,
}

impl WorkerPool {
    pub fn new(width: usize) -> Result<Self, RsRankError> {
        if width == 0 {
            return Err(RsRankError::WorkerPool {
                reason: "pool width must be at least 1".into(),
            });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|i| format!("rsrank-worker-{i}"))
            .build()
            .map_err(|e| RsRankError::WorkerPool {
                reason: e.to_string(),
            })?;
        Ok(Self { pool, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Run `work` once per item and collect every result.
    ///
    /// Blocks until all units complete. There is no mid-batch cancellation.
    pub fn run<T, R, F>(&self, items: Vec<T>, work: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let (tx, rx) = mpsc::channel();
        let work = &work;

        self.pool.scope(move |scope| {
            for item in items {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    // The receiver outlives the scope, so the send cannot fail.
                    let _ = tx.send(work(item));
                });
            }
        });

        rx.into_iter().collect()
    }
}

/// Success and failure counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn record(&mut self, ok: bool) {
        self.attempted += 1;
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn success_ratio(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.attempted as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn zero_width_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(RsRankError::WorkerPool { .. })
        ));
    }

    #[test]
    fn runs_every_item_once() {
        let pool = WorkerPool::new(4).unwrap();
        let results = pool.run((0..100).collect(), |i: u32| i * 2);
        assert_eq!(results.len(), 100);
        let unique: HashSet<u32> = results.into_iter().collect();
        let expected: HashSet<u32> = (0..100).map(|i| i * 2).collect();
        assert_eq!(unique, expected);
    }

    #[test]
    fn borrows_shared_input() {
        let pool = WorkerPool::new(2).unwrap();
        let base = vec![10, 20, 30];
        let mut results = pool.run(vec![0usize, 1, 2], |i| base[i] + 1);
        results.sort();
        assert_eq!(results, vec![11, 21, 31]);
    }

    #[test]
    fn empty_batch() {
        let pool = WorkerPool::new(1).unwrap();
        let results: Vec<u8> = pool.run(Vec::<u8>::new(), |x| x);
        assert!(results.is_empty());
    }

    #[test]
    fn batch_stats_ratio() {
        let mut stats = BatchStats::default();
        assert_eq!(stats.success_ratio(), 0.0);
        stats.record(true);
        stats.record(false);
        stats.record(true);
        stats.record(true);
        assert_eq!(stats.attempted, 4);
        assert_eq!(stats.failed, 1);
        assert!((stats.success_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
