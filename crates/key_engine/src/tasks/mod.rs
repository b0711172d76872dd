//! Worker thread pool with cooperative interruption
//!
//! A fixed pool of workers drains a shared task queue. Every task receives a
//! [`StopToken`] and long-running tasks are expected to poll it. Stopping the
//! pool sets the token and wakes the workers; tasks already queued are still
//! drained before the workers exit, so `stop` is a flush, not a discard.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::core::{EngineError, EngineResult};

/// Owner side of a stop flag
///
/// Hands out [`StopToken`]s sharing the flag and is the only way to request
/// the stop. The pool owns one internally; code running periodic work
/// outside a pool creates its own.
pub struct StopSource {
    token: StopToken,
}

impl Default for StopSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSource {
    /// Create a source with the stop not yet requested
    pub fn new() -> Self {
        Self {
            token: StopToken {
                flag: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    /// A token observing this source
    pub fn token(&self) -> StopToken {
        self.token.clone()
    }

    /// Signal every token handed out
    pub fn request_stop(&self) {
        self.token.flag.store(true, Ordering::SeqCst);
    }

    /// Whether the stop has been requested
    pub fn is_stop_requested(&self) -> bool {
        self.token.is_stop_requested()
    }
}

/// Cooperative interruption flag handed to every task
#[derive(Clone)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// Whether a stop has been requested
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

type Task = Box<dyn FnOnce(&StopToken) + Send + 'static>;

struct PoolShared {
    queue: Mutex<VecDeque<Task>>,
    available: Condvar,
}

/// Fixed-size worker pool over a mutex/condvar task queue
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    source: StopSource,
    workers: Vec<JoinHandle<()>>,
    enabled: bool,
}

impl ThreadPool {
    /// Spawn a pool with `worker_count` threads (at least one)
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        });
        let source = StopSource::new();

        let workers = (0..worker_count)
            .map(|i| {
                let shared = Arc::clone(&shared);
                let token = source.token();
                std::thread::Builder::new()
                    .name(format!("key-worker-{i}"))
                    .spawn(move || worker_loop(&shared, &token))
                    .expect("failed to spawn pool worker")
            })
            .collect();

        log::debug!("thread pool started with {worker_count} workers");
        Self {
            shared,
            source,
            workers,
            enabled: true,
        }
    }

    /// Whether the pool still accepts work
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of worker threads
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue a task for execution
    ///
    /// Fails once the pool has been stopped.
    pub fn enqueue<F>(&self, task: F) -> EngineResult<()>
    where
        F: FnOnce(&StopToken) + Send + 'static,
    {
        if !self.enabled {
            return Err(EngineError::Tasks(
                "cannot enqueue tasks on a stopped thread pool".into(),
            ));
        }
        {
            let mut queue = self.shared.queue.lock().unwrap();
            queue.push_back(Box::new(task));
        }
        self.shared.available.notify_one();
        Ok(())
    }

    /// Request stop, flush the queue and join all workers
    pub fn stop(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.source.request_stop();
        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("thread pool worker panicked");
            }
        }
        log::debug!("thread pool stopped");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: &PoolShared, token: &StopToken) {
    loop {
        let task = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if let Some(task) = queue.pop_front() {
                    break Some(task);
                }
                if token.is_stop_requested() {
                    break None;
                }
                queue = shared.available.wait(queue).unwrap();
            }
        };
        match task {
            Some(task) => task(token),
            None => return,
        }
    }
}

/// Run `f` every `interval` until the token is set
///
/// With `immediately` the first call happens before the first wait.
pub fn do_periodically<F>(token: &StopToken, f: F, interval: Duration, immediately: bool)
where
    F: Fn(),
{
    if immediately && !token.is_stop_requested() {
        f();
    }
    while !token.is_stop_requested() {
        interruptible_sleep(token, interval);
        if token.is_stop_requested() {
            return;
        }
        f();
    }
}

/// Run `f` once after `delay`, unless the token is set first
pub fn do_later<F>(token: &StopToken, f: F, delay: Duration)
where
    F: FnOnce(),
{
    interruptible_sleep(token, delay);
    if !token.is_stop_requested() {
        f();
    }
}

// Sleep in short slices so a stop request is observed promptly.
fn interruptible_sleep(token: &StopToken, total: Duration) {
    const SLICE: Duration = Duration::from_millis(10);
    let mut remaining = total;
    while remaining > Duration::ZERO {
        if token.is_stop_requested() {
            return;
        }
        let nap = remaining.min(SLICE);
        std::thread::sleep(nap);
        remaining = remaining.saturating_sub(nap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn executes_queued_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = ThreadPool::new(4);
        for _ in 0..32 {
            let counter = Arc::clone(&counter);
            pool.enqueue(move |_token| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.stop();
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn stop_flushes_pending_work() {
        // single worker guarantees a backlog exists when stop is called
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = ThreadPool::new(1);
        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            pool.enqueue(move |_token| {
                std::thread::sleep(Duration::from_millis(1));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.stop();
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn enqueue_after_stop_fails() {
        let mut pool = ThreadPool::new(2);
        pool.stop();
        assert!(pool.enqueue(|_token| {}).is_err());
        assert!(!pool.is_enabled());
    }

    #[test]
    fn periodic_task_stops_on_token() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = ThreadPool::new(1);
        {
            let counter = Arc::clone(&counter);
            pool.enqueue(move |token| {
                do_periodically(
                    token,
                    || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    },
                    Duration::from_millis(5),
                    true,
                );
            })
            .unwrap();
        }
        std::thread::sleep(Duration::from_millis(30));
        pool.stop();
        assert!(counter.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn do_later_skips_when_stopped() {
        let ran = Arc::new(AtomicBool::new(false));
        let source = StopSource::new();
        source.request_stop();
        let flag = Arc::clone(&ran);
        do_later(
            &source.token(),
            move || flag.store(true, Ordering::SeqCst),
            Duration::from_millis(5),
        );
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn standalone_source_interrupts_periodic_work() {
        // periodic work can run off its own source, no pool involved
        let counter = Arc::new(AtomicUsize::new(0));
        let source = StopSource::new();
        let token = source.token();
        let worker_counter = Arc::clone(&counter);
        let worker = std::thread::spawn(move || {
            do_periodically(
                &token,
                || {
                    worker_counter.fetch_add(1, Ordering::SeqCst);
                },
                Duration::from_millis(5),
                true,
            );
        });
        std::thread::sleep(Duration::from_millis(20));
        source.request_stop();
        worker.join().unwrap();
        assert!(source.is_stop_requested());
        assert!(counter.load(Ordering::SeqCst) >= 1);
    }
}
