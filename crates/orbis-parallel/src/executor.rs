//! Chunked parallel-for over `[start, end)`.

use std::any::Any;
use std::thread;

use orbis_config::ParallelConfig;
use tracing::{debug, trace};

use crate::permits::WorkerPermits;
use crate::task::ParallelTask;

/// Errors surfaced by [`ParallelForExecutor::parallel_for`].
///
/// Any error means the loop did not complete; no partial result is meaningful.
#[derive(Debug, thiserror::Error)]
pub enum ParallelError {
    /// A worker thread panicked while running its chunk.
    #[error("worker for chunk {chunk} panicked: {message}")]
    WorkerPanicked {
        /// Zero-based chunk index of the failed worker.
        chunk: usize,
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Runs index-parallel loops on up to `parallelism` threads.
///
/// Construct once per process and pass by reference; the worker permit pool is
/// shared by every loop run through the same executor.
pub struct ParallelForExecutor {
    parallelism: usize,
    multicore: bool,
    permits: WorkerPermits,
}

impl ParallelForExecutor {
    /// Creates an executor for `parallelism` hardware threads.
    ///
    /// A `parallelism` of 0 is treated as 1.
    pub fn new(parallelism: usize, multicore: bool) -> Self {
        let parallelism = parallelism.max(1);
        Self {
            parallelism,
            multicore,
            permits: WorkerPermits::new(parallelism - 1),
        }
    }

    /// Creates an executor from configuration, detecting the core count with
    /// `num_cpus` unless `threads` overrides it.
    pub fn from_config(config: &ParallelConfig) -> Self {
        let parallelism = config.threads.unwrap_or_else(num_cpus::get);
        debug!(
            parallelism,
            multicore = config.multicore,
            "Created parallel-for executor"
        );
        Self::new(parallelism, config.multicore)
    }

    /// An executor that always runs on the calling thread.
    pub fn sequential() -> Self {
        Self::new(1, false)
    }

    /// Number of chunks a multicore loop is split into.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Whether loops may use worker threads at all.
    pub fn is_multicore(&self) -> bool {
        self.multicore && self.parallelism > 1
    }

    /// Maximum number of worker threads alive at once (excluding callers).
    pub fn max_workers(&self) -> usize {
        self.permits.capacity()
    }

    /// Runs `task.run(i)` exactly once for every `i` in `[start, end)`.
    ///
    /// In sequential mode indices are visited in increasing order on the calling
    /// thread. Otherwise no ordering holds between indices. The call returns only
    /// after every index has been processed.
    ///
    /// # Errors
    ///
    /// Returns [`ParallelError::WorkerPanicked`] if any worker panicked and
    /// [`ParallelError::Spawn`] if a worker could not be started. A panic in the
    /// caller's own chunk propagates as a panic.
    pub fn parallel_for<T: ParallelTask>(
        &self,
        start: usize,
        end: usize,
        task: &mut T,
    ) -> Result<(), ParallelError> {
        if end <= start {
            return Ok(());
        }

        let len = end - start;
        let chunk_len = len / self.parallelism;
        if !self.is_multicore() || chunk_len == 0 {
            trace!(start, end, "Running parallel-for sequentially");
            for index in start..end {
                task.run(index);
            }
            return Ok(());
        }

        let worker_count = self.parallelism - 1;
        let caller_start = start + worker_count * chunk_len;
        trace!(
            start,
            end,
            chunk_len,
            worker_count,
            caller_len = end - caller_start,
            "Splitting parallel-for"
        );

        thread::scope(|scope| {
            let mut workers = Vec::with_capacity(worker_count);

            for chunk in 0..worker_count {
                let lo = start + chunk * chunk_len;
                let hi = lo + chunk_len;
                let mut worker_task = task.copy();
                let permit = self.permits.acquire();

                let handle = thread::Builder::new()
                    .name(format!("parallel-for-{chunk}"))
                    .spawn_scoped(scope, move || {
                        let _permit = permit;
                        for index in lo..hi {
                            worker_task.run(index);
                        }
                    })
                    .map_err(ParallelError::Spawn)?;
                workers.push((chunk, handle));
            }

            for index in caller_start..end {
                task.run(index);
            }

            let mut result = Ok(());
            for (chunk, handle) in workers {
                if let Err(payload) = handle.join()
                    && result.is_ok()
                {
                    result = Err(ParallelError::WorkerPanicked {
                        chunk,
                        message: panic_message(payload.as_ref()),
                    });
                }
            }
            result
        })
    }
}

impl Default for ParallelForExecutor {
    fn default() -> Self {
        Self::from_config(&ParallelConfig::default())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnTask;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Counts visits per index into a shared array of atomics.
    fn visit_counts(executor: &ParallelForExecutor, n: usize) -> Vec<usize> {
        let counts: Vec<AtomicUsize> = (0..n).map(|_| AtomicUsize::new(0)).collect();
        let counts_ref = &counts;
        let mut task = FnTask(move |i: usize| {
            counts_ref[i].fetch_add(1, Ordering::Relaxed);
        });
        executor.parallel_for(0, n, &mut task).unwrap();
        counts.into_iter().map(AtomicUsize::into_inner).collect()
    }

    /// Records visited indices privately; copies start empty and report back on drop.
    struct RecordingTask {
        visited: Vec<usize>,
        sink: Arc<Mutex<Vec<usize>>>,
        copies: Arc<AtomicUsize>,
    }

    impl ParallelTask for RecordingTask {
        fn run(&mut self, index: usize) {
            self.visited.push(index);
        }

        fn copy(&self) -> Self {
            self.copies.fetch_add(1, Ordering::Relaxed);
            Self {
                visited: Vec::new(),
                sink: Arc::clone(&self.sink),
                copies: Arc::clone(&self.copies),
            }
        }
    }

    impl Drop for RecordingTask {
        fn drop(&mut self) {
            self.sink.lock().unwrap().extend(self.visited.drain(..));
        }
    }

    fn recording_task() -> RecordingTask {
        RecordingTask {
            visited: Vec::new(),
            sink: Arc::new(Mutex::new(Vec::new())),
            copies: Arc::new(AtomicUsize::new(0)),
        }
    }

    const SIZES: [usize; 10] = [0, 1, 2, 3, 7, 8, 64, 1000, 4096, 4099];

    #[test]
    fn test_every_index_visited_once_multicore() {
        let executor = ParallelForExecutor::new(4, true);
        for n in SIZES {
            let counts = visit_counts(&executor, n);
            assert!(
                counts.iter().all(|&c| c == 1),
                "n={n}: some index not visited exactly once"
            );
        }
    }

    #[test]
    fn test_every_index_visited_once_sequential() {
        let executor = ParallelForExecutor::new(4, false);
        for n in SIZES {
            let counts = visit_counts(&executor, n);
            assert!(counts.iter().all(|&c| c == 1), "n={n}");
        }
    }

    #[test]
    fn test_modes_produce_identical_results() {
        let multi = ParallelForExecutor::new(8, true);
        let single = ParallelForExecutor::new(8, false);
        for n in SIZES {
            let out_multi: Vec<AtomicUsize> = (0..n).map(|_| AtomicUsize::new(0)).collect();
            let out_single: Vec<AtomicUsize> = (0..n).map(|_| AtomicUsize::new(0)).collect();
            let (a, b) = (&out_multi, &out_single);
            multi
                .parallel_for(0, n, &mut FnTask(move |i: usize| a[i].store(i * i + 1, Ordering::Relaxed)))
                .unwrap();
            single
                .parallel_for(0, n, &mut FnTask(move |i: usize| b[i].store(i * i + 1, Ordering::Relaxed)))
                .unwrap();
            let a: Vec<usize> = out_multi.into_iter().map(AtomicUsize::into_inner).collect();
            let b: Vec<usize> = out_single.into_iter().map(AtomicUsize::into_inner).collect();
            assert_eq!(a, b, "n={n}");
        }
    }

    #[test]
    fn test_disabled_multicore_runs_in_order() {
        let executor = ParallelForExecutor::new(16, false);
        let mut task = recording_task();
        executor.parallel_for(5, 2005, &mut task).unwrap();
        assert_eq!(task.visited, (5..2005).collect::<Vec<_>>());
        assert_eq!(task.copies.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_single_core_runs_in_order() {
        let executor = ParallelForExecutor::new(1, true);
        let mut task = recording_task();
        executor.parallel_for(0, 300, &mut task).unwrap();
        assert_eq!(task.visited, (0..300).collect::<Vec<_>>());
    }

    #[test]
    fn test_workers_get_own_copies_and_caller_absorbs_remainder() {
        let executor = ParallelForExecutor::new(4, true);
        let mut task = recording_task();
        let sink = Arc::clone(&task.sink);
        executor.parallel_for(0, 103, &mut task).unwrap();

        assert_eq!(task.copies.load(Ordering::Relaxed), 3);
        // 103 / 4 = 25 per worker, the caller takes 75..103.
        assert_eq!(task.visited, (75..103).collect::<Vec<_>>());

        drop(task);
        let mut all = sink.lock().unwrap().clone();
        all.sort_unstable();
        assert_eq!(all, (0..103).collect::<Vec<_>>());
    }

    #[test]
    fn test_fewer_indices_than_threads_stays_on_caller() {
        let executor = ParallelForExecutor::new(8, true);
        let mut task = recording_task();
        executor.parallel_for(0, 5, &mut task).unwrap();
        assert_eq!(task.visited, vec![0, 1, 2, 3, 4]);
        assert_eq!(task.copies.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_empty_and_inverted_ranges_do_nothing() {
        let executor = ParallelForExecutor::new(4, true);
        let mut task = recording_task();
        executor.parallel_for(10, 10, &mut task).unwrap();
        executor.parallel_for(10, 3, &mut task).unwrap();
        assert!(task.visited.is_empty());
    }

    #[test]
    fn test_thread_count_bounded_by_parallelism() {
        let executor = ParallelForExecutor::new(3, true);
        let threads = Mutex::new(HashSet::new());
        let threads_ref = &threads;
        let mut task = FnTask(move |_i: usize| {
            threads_ref
                .lock()
                .unwrap()
                .insert(std::thread::current().id());
        });
        executor.parallel_for(0, 3000, &mut task).unwrap();
        let distinct = threads.lock().unwrap().len();
        assert!(distinct <= 3, "used {distinct} threads");
        assert_eq!(executor.max_workers(), 2);
        assert_eq!(executor.permits.in_use(), 0, "permits leaked");
    }

    #[test]
    fn test_worker_panic_fails_whole_call() {
        let executor = ParallelForExecutor::new(4, true);
        let mut task = FnTask(|i: usize| {
            if i == 0 {
                panic!("bad texel");
            }
        });
        let err = executor.parallel_for(0, 400, &mut task).unwrap_err();
        match err {
            ParallelError::WorkerPanicked { chunk, message } => {
                assert_eq!(chunk, 0);
                assert_eq!(message, "bad texel");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(executor.permits.in_use(), 0, "permit not returned");
    }

    #[test]
    fn test_concurrent_callers_share_executor() {
        let executor = ParallelForExecutor::new(4, true);
        let total = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..3 {
                scope.spawn(|| {
                    let total_ref = &total;
                    let mut task = FnTask(move |_i: usize| {
                        total_ref.fetch_add(1, Ordering::Relaxed);
                    });
                    executor.parallel_for(0, 1000, &mut task).unwrap();
                });
            }
        });
        assert_eq!(total.load(Ordering::Relaxed), 3000);
    }

    #[test]
    fn test_from_config_respects_overrides() {
        let config = ParallelConfig {
            multicore: false,
            threads: Some(6),
        };
        let executor = ParallelForExecutor::from_config(&config);
        assert_eq!(executor.parallelism(), 6);
        assert!(!executor.is_multicore());
        assert!(!ParallelForExecutor::sequential().is_multicore());
    }
}
