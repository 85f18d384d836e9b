//! Fork/join execution of visitor expansions.
//!
//! A visitor hands its continuations to a [`WorkAllocator`] and blocks until
//! every one has finished. The fork-join allocator spreads them over rayon
//! workers; the serial allocator runs them in order on the calling thread,
//! which keeps tests deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::error::ReachError;

/// One unit of forked work.
pub type Job<'s> = Box<dyn FnOnce() -> Result<(), ReachError> + Send + 's>;

/// Cooperative cancellation flag shared by an allocator and its callers.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask all running work to stop. Jobs not yet started are skipped.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the allocator can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// `Err(Interrupted)` once interrupted.
    pub fn check(&self) -> Result<(), ReachError> {
        if self.is_interrupted() {
            Err(ReachError::Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Runs a batch of jobs with join semantics.
pub trait WorkAllocator: Send + Sync {
    /// Run every job and return once all have finished.
    ///
    /// Returns the first error any job produced. After an error or an
    /// interrupt, jobs that have not started yet are skipped, but running
    /// ones are always joined before this returns.
    fn run_all<'s>(&self, jobs: Vec<Job<'s>>) -> Result<(), ReachError>;

    fn interrupt_handle(&self) -> &InterruptHandle;
}

/// Parallel allocator over a rayon pool.
pub struct ForkJoinAllocator {
    pool: Option<ThreadPool>,
    interrupt: InterruptHandle,
}

impl ForkJoinAllocator {
    /// Use the global rayon pool.
    pub fn new() -> Self {
        Self {
            pool: None,
            interrupt: InterruptHandle::new(),
        }
    }

    /// Use a dedicated pool with `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("reach-worker-{i}"))
            .build()?;
        Ok(Self {
            pool: Some(pool),
            interrupt: InterruptHandle::new(),
        })
    }

    pub fn current_num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl Default for ForkJoinAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkAllocator for ForkJoinAllocator {
    fn run_all<'s>(&self, jobs: Vec<Job<'s>>) -> Result<(), ReachError> {
        self.interrupt.check()?;
        if jobs.len() <= 1 {
            return jobs.into_iter().try_for_each(|job| job());
        }

        let interrupt = &self.interrupt;
        let run = move || {
            jobs.into_par_iter().try_for_each(|job| {
                interrupt.check()?;
                job()
            })
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn interrupt_handle(&self) -> &InterruptHandle {
        &self.interrupt
    }
}

/// Runs each job immediately, in order, on the calling thread.
#[derive(Debug, Default)]
pub struct SerialAllocator {
    interrupt: InterruptHandle,
}

impl SerialAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkAllocator for SerialAllocator {
    fn run_all<'s>(&self, jobs: Vec<Job<'s>>) -> Result<(), ReachError> {
        for job in jobs {
            self.interrupt.check()?;
            job()?;
        }
        Ok(())
    }

    fn interrupt_handle(&self) -> &InterruptHandle {
        &self.interrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn counting_jobs(n: usize, counter: &AtomicUsize) -> Vec<Job<'_>> {
        (0..n)
            .map(|_| {
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }) as Job<'_>
            })
            .collect()
    }

    #[test]
    fn serial_runs_in_order() {
        let order = Mutex::new(Vec::new());
        let jobs: Vec<Job<'_>> = (0..5)
            .map(|i| {
                let order = &order;
                Box::new(move || {
                    order.lock().unwrap().push(i);
                    Ok(())
                }) as Job<'_>
            })
            .collect();
        SerialAllocator::new().run_all(jobs).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn serial_stops_at_first_error() {
        let counter = AtomicUsize::new(0);
        let mut jobs = counting_jobs(2, &counter);
        jobs.insert(1, Box::new(|| Err(ReachError::Interrupted)));
        let result = SerialAllocator::new().run_all(jobs);
        assert!(matches!(result, Err(ReachError::Interrupted)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fork_join_joins_every_job() {
        let counter = AtomicUsize::new(0);
        let allocator = ForkJoinAllocator::with_threads(4).unwrap();
        allocator.run_all(counting_jobs(100, &counter)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(allocator.current_num_threads(), 4);
    }

    #[test]
    fn nested_forks_complete_before_parent_returns() {
        let counter = AtomicUsize::new(0);
        let allocator = ForkJoinAllocator::with_threads(2).unwrap();
        let outer: Vec<Job<'_>> = (0..4)
            .map(|_| {
                let allocator = &allocator;
                let counter = &counter;
                Box::new(move || allocator.run_all(counting_jobs(8, counter))) as Job<'_>
            })
            .collect();
        allocator.run_all(outer).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn interrupted_allocator_runs_nothing() {
        let counter = AtomicUsize::new(0);
        let allocator = ForkJoinAllocator::new();
        allocator.interrupt_handle().interrupt();
        let result = allocator.run_all(counting_jobs(10, &counter));
        assert!(matches!(result, Err(ReachError::Interrupted)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        allocator.interrupt_handle().reset();
        allocator.run_all(counting_jobs(10, &counter)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn interrupt_from_a_job_stops_siblings() {
        let counter = AtomicUsize::new(0);
        let allocator = SerialAllocator::new();
        let handle = allocator.interrupt_handle().clone();
        let mut jobs = counting_jobs(3, &counter);
        jobs.insert(
            1,
            Box::new(move || {
                handle.interrupt();
                Ok(())
            }),
        );
        assert!(allocator.run_all(jobs).is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
