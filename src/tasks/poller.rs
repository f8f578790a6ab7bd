//! Completion polling.
//!
//! A wait runs in cycles. Each cycle re-fetches every task through its
//! `Self` link concurrently, hands the fresh tasks (in input order) to the
//! optional [`TaskProgressHandler`], and ends the wait once every task
//! reports `IsCompleted`. Otherwise it checks the deadline and sleeps for the
//! poll interval.
//!
//! ```text
//!            +-------------------------------+
//!            v                               |
//! start -> fetch all -> progress -> all completed? -- yes --> Ok(tasks)
//!                                       | no
//!                                 deadline passed? -- yes --> Err(Timeout)
//!                                       | no
//!                                     sleep --------------------+
//! ```
//!
//! - An empty task set returns immediately without any request.
//! - The first failing fetch aborts the cycle and the wait.
//! - The deadline is only checked after a full cycle, so the in-flight cycle
//!   always finishes.
//! - A [`CancellationToken`](tokio_util::sync::CancellationToken) in the
//!   [`WaitOptions`] interrupts both the fetch fan-out and the sleep.
//!
//! Time is measured with the tokio clock.

use std::future::Future;

use async_trait::async_trait;
use futures::future::try_join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::TaskRepository;
use crate::config::WaitOptions;
use crate::error::{Error, Result};
use crate::types::TaskResource;

/// Receives the freshly fetched tasks after every poll cycle.
///
/// The poller awaits the handler before continuing, so cycles never overlap.
/// Any `Fn(Vec<TaskResource>) -> impl Future<Output = ()>` closure is a
/// handler.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use octopus_client::{TaskProgressHandler, TaskResource};
///
/// let cycles = Arc::new(AtomicUsize::new(0));
/// let counter = cycles.clone();
/// let handler = move |tasks: Vec<TaskResource>| {
///     let counter = counter.clone();
///     async move {
///         counter.fetch_add(1, Ordering::SeqCst);
///         println!("{} tasks polled", tasks.len());
///     }
/// };
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// handler.on_progress(&[]).await;
/// # });
/// assert_eq!(cycles.load(Ordering::SeqCst), 1);
/// ```
#[async_trait]
pub trait TaskProgressHandler: Send + Sync {
    /// Called once per cycle with the latest tasks, in input order.
    async fn on_progress(&self, tasks: &[TaskResource]);
}

#[async_trait]
impl<F, Fut> TaskProgressHandler for F
where
    F: Fn(Vec<TaskResource>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_progress(&self, tasks: &[TaskResource]) {
        (self)(tasks.to_vec()).await
    }
}

impl TaskRepository {
    /// Waits until every task in `tasks` has completed.
    ///
    /// Returns the final state of each task, in input order.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] when the configured timeout passes first.
    /// - [`Error::Cancelled`] when the cancellation token fires.
    /// - Any error from re-fetching a task.
    pub async fn wait_for_completion(
        &self,
        tasks: &[TaskResource],
        options: &WaitOptions,
    ) -> Result<Vec<TaskResource>> {
        self.wait_for_completion_with_progress(tasks, options, None)
            .await
    }

    /// Waits for a single task to complete and returns its final state.
    pub async fn wait_for_task(
        &self,
        task: &TaskResource,
        options: &WaitOptions,
    ) -> Result<TaskResource> {
        let latest = self
            .wait_for_completion(std::slice::from_ref(task), options)
            .await?;
        Ok(latest.into_iter().next().unwrap_or_else(|| task.clone()))
    }

    /// Like [`wait_for_completion`](Self::wait_for_completion), reporting each
    /// cycle to `progress`.
    pub async fn wait_for_completion_with_progress(
        &self,
        tasks: &[TaskResource],
        options: &WaitOptions,
        progress: Option<&dyn TaskProgressHandler>,
    ) -> Result<Vec<TaskResource>> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let timeout = options.effective_timeout();
        let cancellation = options.cancellation.clone().unwrap_or_else(CancellationToken::new);
        let mut cycle: u64 = 0;

        loop {
            cycle += 1;

            let latest = tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    return Err(Error::Cancelled { elapsed: started.elapsed() });
                }
                fetched = try_join_all(tasks.iter().map(|task| self.refresh(task))) => fetched?,
            };

            if let Some(handler) = progress {
                handler.on_progress(&latest).await;
            }

            let completed = latest.iter().filter(|task| task.is_completed).count();
            tracing::debug!(
                cycle,
                completed,
                total = latest.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "poll cycle finished"
            );
            if completed == latest.len() {
                return Ok(latest);
            }

            if let Some(timeout) = timeout {
                let elapsed = started.elapsed();
                if elapsed > timeout {
                    return Err(Error::Timeout { elapsed });
                }
            }

            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    return Err(Error::Cancelled { elapsed: started.elapsed() });
                }
                _ = tokio::time::sleep(options.poll_interval) => {}
            }
        }
    }
}
