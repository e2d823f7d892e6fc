//! Outbound dispatch governor.
//!
//! The upstream rate limit is per API credential, so all upstream calls in
//! the process funnel through one [`RateGovernor`]: a FIFO queue drained by a
//! single loop that enforces a minimum spacing between dispatch starts.
//!
//! The governor is an owned handle, not a module-level singleton; tests build
//! as many independent instances as they need.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Serializes upstream calls through one FIFO queue with minimum spacing.
///
/// Cloning yields another handle to the same queue and watermark.
#[derive(Clone)]
pub struct RateGovernor {
    inner: Arc<Inner>,
}

struct Inner {
    min_interval: Duration,
    queue: Mutex<VecDeque<Job>>,
    /// Set while a drain loop is running; guarantees at most one.
    draining: AtomicBool,
    /// Start time of the most recently dispatched task.
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateGovernor {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                min_interval,
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                last_dispatch: Mutex::new(None),
            }),
        }
    }

    /// Queue a unit of work and await its outcome.
    ///
    /// Tasks are dispatched strictly in submission order, never less than
    /// `min_interval` apart, and each runs to completion before the next is
    /// dispatched. A task's failure is reported only through its own return
    /// value; the queue keeps draining. A panicking task re-raises the panic
    /// on its own submitter and leaves the queue running. There is no
    /// cancellation: once submitted, the task will run even if this future is
    /// dropped.
    pub async fn submit<T, F, Fut>(&self, task: F) -> T
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let outcome = task().await;
            // The receiver may have been dropped; the work still counted
            // against the rate limit either way.
            let _ = tx.send(outcome);
        });

        {
            let mut queue = self.inner.queue.lock().expect("lock poisoned");
            queue.push_back(job);
            trace!(depth = queue.len(), "Task queued");
        }
        self.spawn_drain_if_idle();

        // The drain loop runs every queued job exactly once, so the sender
        // side is dropped without sending only if the task panicked.
        rx.await.expect("governed task panicked")
    }

    /// Number of tasks waiting for dispatch.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.inner.queue.lock().expect("lock poisoned").len()
    }

    fn spawn_drain_if_idle(&self) {
        if self
            .inner
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(drain(inner));
        }
    }
}

/// The single drain loop. Runs until the queue is observed empty after the
/// draining flag has been cleared, so a submission racing the shutdown is
/// picked up by exactly one loop.
async fn drain(inner: Arc<Inner>) {
    loop {
        let job = inner.queue.lock().expect("lock poisoned").pop_front();

        let Some(job) = job else {
            inner.draining.store(false, Ordering::Release);
            if inner.queue.lock().expect("lock poisoned").is_empty() {
                return;
            }
            // A submit slipped in between the pop and the flag clear. Try to
            // take the loop back; if another drain already has it, defer.
            if inner
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }
            continue;
        };

        let wait = {
            let last = inner.last_dispatch.lock().expect("lock poisoned");
            match *last {
                Some(started) => inner.min_interval.saturating_sub(started.elapsed()),
                None => Duration::ZERO,
            }
        };
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Spacing upstream dispatch");
            sleep(wait).await;
        }

        *inner.last_dispatch.lock().expect("lock poisoned") = Some(Instant::now());
        // Run the job in its own task so a panic is contained there; the
        // submitter sees it through its dropped channel, and the loop keeps
        // draining.
        if tokio::spawn(job).await.is_err() {
            warn!("Governed task panicked");
        }
    }
}
