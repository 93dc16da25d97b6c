//! Worker pools for concurrent derivative estimation.
//!
//! The solver never reaches for a process-wide pool. Callers inject one of
//! three handles at construction:
//!
//! - [`WorkerPool::Inline`]: evaluate on the calling thread (default)
//! - [`WorkerPool::Dedicated`]: build a Rayon pool of `n` threads at the start
//!   of each `run()`, owned by that run and shut down when it returns
//! - [`WorkerPool::Shared`]: use a caller-owned Rayon pool; the solver only
//!   borrows it and never shuts it down
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pricer_optimiser::solvers::WorkerPool;
//!
//! assert_eq!(WorkerPool::with_threads(1).number_of_threads(), 1);
//! assert_eq!(WorkerPool::with_threads(4).number_of_threads(), 4);
//!
//! let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap());
//! let shared = WorkerPool::shared(Arc::clone(&pool));
//! assert_eq!(shared.number_of_threads(), 2);
//! ```

use std::sync::Arc;

use pricer_core::types::SolverError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Handle describing where finite-difference evaluations run.
#[derive(Debug, Clone, Default)]
pub enum WorkerPool {
    /// Sequential evaluation on the calling thread.
    #[default]
    Inline,
    /// A pool of the given size, created and torn down by each run.
    Dedicated(usize),
    /// A caller-supplied pool, shared and never shut down by the solver.
    Shared(Arc<ThreadPool>),
}

impl WorkerPool {
    /// Pool handle for `number_of_threads` workers.
    ///
    /// One thread (or zero) means inline evaluation.
    pub fn with_threads(number_of_threads: usize) -> Self {
        if number_of_threads <= 1 {
            Self::Inline
        } else {
            Self::Dedicated(number_of_threads)
        }
    }

    /// Handle for a caller-owned pool.
    pub fn shared(pool: Arc<ThreadPool>) -> Self {
        Self::Shared(pool)
    }

    /// Maximum number of concurrent objective evaluations.
    pub fn number_of_threads(&self) -> usize {
        match self {
            Self::Inline => 1,
            Self::Dedicated(n) => *n,
            Self::Shared(pool) => pool.current_num_threads(),
        }
    }

    /// Whether the pool is supplied (and owned) by the caller.
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }

    /// Acquire the pool for the duration of one run.
    pub(crate) fn lease(&self) -> Result<PoolLease, SolverError> {
        match self {
            Self::Inline => Ok(PoolLease::Inline),
            Self::Dedicated(n) => ThreadPoolBuilder::new()
                .num_threads(*n)
                .thread_name(|i| format!("lm-jacobian-{}", i))
                .build()
                .map(PoolLease::Owned)
                .map_err(|e| SolverError::WorkerPool(e.to_string())),
            Self::Shared(pool) => Ok(PoolLease::Shared(Arc::clone(pool))),
        }
    }
}

/// A pool held for the duration of one run.
///
/// Dropping an `Owned` lease shuts its threads down; dropping a `Shared`
/// lease only releases this run's reference.
#[derive(Debug)]
pub(crate) enum PoolLease {
    Inline,
    Owned(ThreadPool),
    Shared(Arc<ThreadPool>),
}

impl PoolLease {
    /// Evaluate `task(0..n)` and collect the results in index order.
    ///
    /// Blocks until every task has finished. The first error (in index
    /// order for inline evaluation, arbitrary otherwise) is returned.
    pub(crate) fn map_indexed<T, F>(&self, n: usize, task: F) -> Result<Vec<T>, SolverError>
    where
        T: Send,
        F: Fn(usize) -> Result<T, SolverError> + Send + Sync,
    {
        match self {
            Self::Inline => (0..n).map(task).collect(),
            Self::Owned(pool) => run_in_pool(pool, n, &task),
            Self::Shared(pool) => run_in_pool(pool, n, &task),
        }
    }
}

fn run_in_pool<T, F>(pool: &ThreadPool, n: usize, task: &F) -> Result<Vec<T>, SolverError>
where
    T: Send,
    F: Fn(usize) -> Result<T, SolverError> + Send + Sync,
{
    pool.install(|| (0..n).into_par_iter().map(task).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_with_threads() {
        assert!(matches!(WorkerPool::with_threads(0), WorkerPool::Inline));
        assert!(matches!(WorkerPool::with_threads(1), WorkerPool::Inline));
        assert!(matches!(WorkerPool::with_threads(3), WorkerPool::Dedicated(3)));
    }

    #[test]
    fn test_default_is_inline() {
        assert!(matches!(WorkerPool::default(), WorkerPool::Inline));
        assert_eq!(WorkerPool::default().number_of_threads(), 1);
    }

    #[test]
    fn test_map_indexed_preserves_order() {
        for handle in [WorkerPool::Inline, WorkerPool::Dedicated(4)] {
            let lease = handle.lease().unwrap();
            let squares = lease.map_indexed(16, |i| Ok(i * i)).unwrap();
            assert_eq!(squares, (0..16).map(|i| i * i).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_map_indexed_propagates_error() {
        let lease = WorkerPool::Dedicated(2).lease().unwrap();
        let result: Result<Vec<usize>, _> = lease.map_indexed(8, |i| {
            if i == 5 {
                Err(SolverError::objective("bad quote"))
            } else {
                Ok(i)
            }
        });
        assert_eq!(result, Err(SolverError::objective("bad quote")));
    }

    #[test]
    fn test_map_indexed_runs_every_task() {
        let counter = AtomicUsize::new(0);
        let lease = WorkerPool::Dedicated(3).lease().unwrap();
        lease
            .map_indexed(10, |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_shared_pool_survives_lease() {
        let pool = Arc::new(ThreadPoolBuilder::new().num_threads(2).build().unwrap());
        let handle = WorkerPool::shared(Arc::clone(&pool));
        assert!(handle.is_shared());
        {
            let lease = handle.lease().unwrap();
            lease.map_indexed(4, |i| Ok(i)).unwrap();
        }
        // The caller's pool is still usable after the lease is gone.
        assert_eq!(pool.install(|| 21 * 2), 42);
        assert_eq!(Arc::strong_count(&pool), 2);
    }

    #[test]
    fn test_dedicated_threads_are_named() {
        let lease = WorkerPool::Dedicated(2).lease().unwrap();
        let names = lease
            .map_indexed(2, |_| {
                Ok(std::thread::current()
                    .name()
                    .unwrap_or_default()
                    .to_string())
            })
            .unwrap();
        assert!(names.iter().all(|n| n.starts_with("lm-jacobian-")));
    }
}
