use std::ops::Range;
use std::sync::OnceLock;

use smet_base::iter::range_chunks;

use crate::env::env_usize;

/// A wrapper around the Rayon thread pool used to run assignments.
///
/// On platforms where threads are not supported (eg. WebAssembly) this runs
/// work directly on the calling thread.
pub struct ThreadPool {
    /// The wrapped thread pool, or None if we failed to construct one.
    pool: Option<rayon::ThreadPool>,
}

impl ThreadPool {
    /// Run a function in the thread pool.
    ///
    /// This corresponds to [`rayon::ThreadPool::install`], except on platforms
    /// where threading is not supported, where it just runs `op` directly.
    pub fn run<R: Send, Op: FnOnce() -> R + Send>(&self, op: Op) -> R {
        if let Some(pool) = self.pool.as_ref() {
            pool.install(op)
        } else {
            op()
        }
    }

    /// Create a thread pool with a given number of threads.
    pub fn with_num_threads(num_threads: usize) -> ThreadPool {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|index| format!("smet-{}", index))
            .build();

        ThreadPool { pool: pool.ok() }
    }

    /// Return the number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool
            .as_ref()
            .map(|p| p.current_num_threads())
            .unwrap_or(1)
    }

    /// Call `body(worker_id, index)` for every index in `range`.
    ///
    /// The range is split into one contiguous chunk per worker. Chunks run
    /// concurrently in no particular order. Returns once every chunk has
    /// completed.
    pub fn submit<F>(&self, range: Range<usize>, body: F)
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let chunks = range_chunks(range, self.num_threads());
        self.run(|| {
            chunks.par_for_each(|worker_id, chunk| {
                for index in chunk {
                    body(worker_id, index);
                }
            })
        })
    }
}

/// Return the optimal number of cores to use for maximum performance.
fn optimal_core_count() -> usize {
    num_cpus::get_physical().max(1)
}

/// Return the [Rayon][rayon] thread pool which is used for parallel
/// assignments.
///
/// The thread count is the number of physical cores. It can be overridden at
/// the process level by setting the `SMET_NUM_THREADS` environment variable,
/// whose value is clamped to the range between 1 and the logical core count.
///
/// Individual assignments can use a different pool via
/// [`AssignOptions`](crate::AssignOptions).
///
/// [rayon]: https://github.com/rayon-rs/rayon
pub fn thread_pool() -> &'static ThreadPool {
    static THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();
    THREAD_POOL.get_or_init(|| {
        let num_threads = env_usize("SMET_NUM_THREADS")
            .map(|n| n.clamp(1, num_cpus::get()))
            .unwrap_or_else(optimal_core_count);
        tracing::debug!(num_threads, "creating thread pool");
        ThreadPool::with_num_threads(num_threads)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::{optimal_core_count, thread_pool, ThreadPool};

    #[test]
    fn test_optimal_core_count() {
        let max_cores = num_cpus::get_physical();
        let opt_cores = optimal_core_count();
        assert!(opt_cores >= 1 && opt_cores <= max_cores.max(1));
    }

    #[test]
    fn test_submit_visits_each_index_once() {
        let pool = ThreadPool::with_num_threads(3);
        let visited = Mutex::new(vec![0; 50]);
        let max_worker = AtomicUsize::new(0);

        pool.submit(10..60, |worker, index| {
            visited.lock().unwrap()[index - 10] += 1;
            max_worker.fetch_max(worker, Ordering::Relaxed);
        });

        assert!(visited.into_inner().unwrap().iter().all(|&n| n == 1));
        assert!(max_worker.load(Ordering::Relaxed) < pool.num_threads());
    }

    #[test]
    fn test_submit_empty_range() {
        let calls = AtomicUsize::new(0);
        thread_pool().submit(4..4, |_, _| {
            calls.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }
}
