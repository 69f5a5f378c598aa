// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Supervised execution of asynchronous reads.
//!
//! Every read on an asynchronous node becomes one job on a [`TaskGroup`]:
//!
//! - a `TaskTracker` tracks each job so the owner can wait for all of them,
//! - an optional `Semaphore` caps how many handlers run at the same time
//!   (`max_concurrency == 0` means no cap),
//! - a `CancellationToken` stops jobs that have not started yet.
//!
//! Handlers are plain synchronous closures that may block, so jobs run on the
//! tokio blocking pool. When a read happens outside any tokio runtime and no
//! handle was pinned, the group starts a small background runtime of its own
//! on first use and keeps it for its lifetime. A panicking handler is caught by the join and logged;
//! it never takes down the group or other jobs.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime as TokioRuntime};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::errors::DispatchError;
use crate::observability::messages::dispatch::{
    DispatchPanicked, DispatchScheduled, DispatchSkipped, FallbackRuntimeStarted,
    ShutdownCompleted,
};
use crate::observability::messages::StructuredLog;

pub struct TaskGroup {
    tracker: TaskTracker,
    token: CancellationToken,
    semaphore: Option<Arc<Semaphore>>,
    max_concurrency: usize,
    grace: Duration,
    handle: Option<Handle>,
    fallback: OnceLock<TokioRuntime>,
    in_flight: Arc<AtomicUsize>,
}

const FALLBACK_WORKERS: usize = 1;

/// Decrements the in-flight counter when a job ends, however it ends.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl TaskGroup {
    pub fn new(max_concurrency: usize, grace: Duration) -> Self {
        let semaphore = match max_concurrency {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };
        Self {
            tracker: TaskTracker::new(),
            token: CancellationToken::new(),
            semaphore,
            max_concurrency,
            grace,
            handle: None,
            fallback: OnceLock::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Pin the group to a runtime instead of the one current at each spawn.
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Pinned handle, else the caller's runtime, else the group's own.
    fn resolve_handle(&self, node_id: &str) -> Result<Handle, DispatchError> {
        if let Some(handle) = self.handle.clone() {
            return Ok(handle);
        }
        if let Ok(handle) = Handle::try_current() {
            return Ok(handle);
        }
        if let Some(rt) = self.fallback.get() {
            return Ok(rt.handle().clone());
        }

        let rt = Builder::new_multi_thread()
            .worker_threads(FALLBACK_WORKERS)
            .thread_name("signalflow-dispatch")
            .enable_all()
            .build()
            .map_err(|e| {
                DispatchSkipped {
                    node_id,
                    reason: &format!("no tokio runtime available: {e}"),
                }
                .log();
                DispatchError::RuntimeUnavailable {
                    node_id: node_id.to_string(),
                }
            })?;
        FallbackRuntimeStarted {
            worker_threads: FALLBACK_WORKERS,
        }
        .log();
        // A concurrent first spawn may have won; its runtime is the one kept.
        let _ = self.fallback.set(rt);
        self.fallback
            .get()
            .map(|rt| rt.handle().clone())
            .ok_or_else(|| DispatchError::RuntimeUnavailable {
                node_id: node_id.to_string(),
            })
    }

    /// Submit `job` on behalf of `node_id`. Returns without waiting for it.
    ///
    /// Outside any tokio runtime the job runs on the group's own background
    /// runtime. Fails only when that runtime cannot be started; the job is
    /// dropped.
    pub fn spawn<F>(&self, node_id: &str, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = self.resolve_handle(node_id)?;

        let in_flight = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        DispatchScheduled { node_id, in_flight }.log();

        let guard = InFlight(Arc::clone(&self.in_flight));
        let token = self.token.clone();
        let semaphore = self.semaphore.clone();
        let node_id = node_id.to_string();

        self.tracker.spawn_on(
            async move {
                let _guard = guard;

                let _permit = match semaphore {
                    Some(sem) => tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            DispatchSkipped { node_id: &node_id, reason: "task group cancelled" }.log();
                            return;
                        }
                        permit = sem.acquire_owned() => match permit {
                            Ok(permit) => Some(permit),
                            Err(_) => {
                                DispatchSkipped { node_id: &node_id, reason: "semaphore closed" }.log();
                                return;
                            }
                        }
                    },
                    None => None,
                };

                if token.is_cancelled() {
                    DispatchSkipped {
                        node_id: &node_id,
                        reason: "task group cancelled",
                    }
                    .log();
                    return;
                }

                if let Err(err) = tokio::task::spawn_blocking(job).await {
                    if err.is_panic() {
                        let message = panic_message(err.into_panic());
                        DispatchPanicked {
                            node_id: &node_id,
                            message: &message,
                        }
                        .log();
                    }
                }
            },
            &handle,
        );
        Ok(())
    }

    /// Jobs submitted and not yet finished, including those waiting for a permit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Stop every job that has not started its handler yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until every submitted job has finished. The group stays usable.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel pending work and wait for running handlers within the configured grace.
    pub async fn shutdown(&self) -> Result<(), DispatchError> {
        self.shutdown_within(self.grace).await
    }

    pub async fn shutdown_within(&self, grace: Duration) -> Result<(), DispatchError> {
        self.token.cancel();
        self.tracker.close();

        let outcome = tokio::time::timeout(grace, self.tracker.wait()).await;
        let in_flight = if outcome.is_ok() { 0 } else { self.in_flight() };
        ShutdownCompleted { grace, in_flight }.log();

        match outcome {
            Ok(()) => Ok(()),
            Err(_) => Err(DispatchError::GraceExceeded { grace, in_flight }),
        }
    }
}

impl Drop for TaskGroup {
    fn drop(&mut self) {
        // Never blocks, so the group may be dropped from async code or from
        // one of its own jobs.
        if let Some(rt) = self.fallback.take() {
            rt.shutdown_background();
        }
    }
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new(
            crate::config::consts::default_max_concurrency(),
            Duration::from_millis(crate::config::consts::DEFAULT_SHUTDOWN_GRACE_MS),
        )
    }
}

impl std::fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGroup")
            .field("max_concurrency", &self.max_concurrency)
            .field("grace", &self.grace)
            .field("in_flight", &self.in_flight())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
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
    use std::sync::mpsc;

    #[test]
    fn spawn_outside_tokio_runs_on_the_group_runtime() {
        let group = TaskGroup::new(2, Duration::from_secs(1));
        let (tx, rx) = mpsc::channel::<String>();

        for i in 0..3 {
            let tx = tx.clone();
            group
                .spawn("plain", move || {
                    let name = std::thread::current().name().unwrap_or_default().to_string();
                    let _ = tx.send(format!("{i}:{name}"));
                })
                .unwrap();
        }

        let mut seen: Vec<String> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        seen.sort();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].starts_with("0:"));

        // drain still covers jobs on the group's own runtime
        let rt = group.fallback.get().expect("background runtime started");
        rt.block_on(group.drain());
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn drain_waits_for_every_job() {
        let group = TaskGroup::new(0, Duration::from_secs(1));
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let done = Arc::clone(&done);
            group
                .spawn("worker", move || {
                    std::thread::sleep(Duration::from_millis(5));
                    done.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        group.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 8);
        assert_eq!(group.in_flight(), 0);

        // still accepts work after a drain
        let done2 = Arc::clone(&done);
        group
            .spawn("worker", move || {
                done2.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        group.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn max_concurrency_bounds_running_handlers() {
        let group = TaskGroup::new(2, Duration::from_secs(1));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            group
                .spawn("bounded", move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        group.drain().await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_handler_does_not_poison_the_group() {
        let group = TaskGroup::new(1, Duration::from_secs(1));
        let after = Arc::new(AtomicUsize::new(0));

        group.spawn("faulty", || panic!("handler bug")).unwrap();
        let counter = Arc::clone(&after);
        group
            .spawn("healthy", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        group.drain().await;
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_reports_stuck_work() {
        let group = TaskGroup::new(0, Duration::from_millis(50));
        let (release_tx, release_rx) = mpsc::channel::<()>();

        group
            .spawn("stuck", move || {
                let _ = release_rx.recv_timeout(Duration::from_secs(5));
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = group.shutdown().await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::GraceExceeded {
                grace: Duration::from_millis(50),
                in_flight: 1,
            }
        );

        release_tx.send(()).unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_skips_jobs_waiting_for_a_permit() {
        let group = TaskGroup::new(1, Duration::from_secs(1));
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let ran = Arc::new(AtomicUsize::new(0));

        group
            .spawn("holder", move || {
                let _ = started_tx.send(());
                let _ = release_rx.recv_timeout(Duration::from_secs(5));
            })
            .unwrap();
        started_rx.await.unwrap();

        let counter = Arc::clone(&ran);
        group
            .spawn("waiter", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        group.cancel();
        release_tx.send(()).unwrap();
        group.shutdown().await.unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(group.is_cancelled());
    }
}
