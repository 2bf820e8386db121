// ── Task tracker ──
//
// Drives a `TaskHandle` to a terminal verdict. All three asynchronous
// shapes (task id, business-API execution, event status) are polled the
// same way: fixed interval, one overall deadline, cooperative cancellation.

use std::time::Duration;

use catc_api::types::task::{TaskInfo, error_text};
use catc_api::{CatalystClient, TaskHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::CoreError;

/// Callback fed with task progress strings while a task is pending.
pub type ProgressFn = dyn Fn(&str) + Send + Sync;

/// Progress texts that mean the task is done even before `endTime` is set.
const SUCCESS_HINTS: &[&str] = &[
    "successfully",
    "Successfully",
    "Task completed",
    "Group is deleted successfully",
    "Group is updated successfully",
    "Service domain is deleted successfully",
];

const BATCH_OPERATION: &str = "Batch Operation";

/// One poll's reading of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reading {
    Succeeded(String),
    Failed(String),
    Pending(Option<String>),
}

/// Polls one handle until it succeeds, fails, times out or is cancelled.
pub struct TaskTracker<'a> {
    client: &'a CatalystClient,
    poll_interval: Duration,
    timeout: Duration,
    cancel: &'a CancellationToken,
    progress: Option<&'a ProgressFn>,
}

impl<'a> TaskTracker<'a> {
    pub fn new(
        client: &'a CatalystClient,
        poll_interval: Duration,
        timeout: Duration,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            client,
            poll_interval,
            timeout,
            cancel,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Option<&'a ProgressFn>) -> Self {
        self.progress = progress;
        self
    }

    /// Wait for `handle` to reach a terminal state.
    ///
    /// `task` is the logical operation name used in errors and logs.
    /// Returns the final progress text on success.
    pub async fn wait(&self, task: &str, handle: &TaskHandle) -> Result<String, CoreError> {
        match handle {
            TaskHandle::Done => return Ok("completed".to_owned()),
            TaskHandle::Rejected(reason) => {
                error!(task, %reason, "controller rejected request");
                return Err(CoreError::TaskFailure {
                    task: task.to_owned(),
                    reason: reason.clone(),
                });
            }
            TaskHandle::Task(_) | TaskHandle::Execution(_) | TaskHandle::EventStatus(_) => {}
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            match self.read(handle).await? {
                Reading::Succeeded(detail) => {
                    debug!(task, %detail, "task finished");
                    return Ok(detail);
                }
                Reading::Failed(reason) => {
                    error!(task, %reason, "task failed");
                    return Err(CoreError::TaskFailure {
                        task: task.to_owned(),
                        reason,
                    });
                }
                Reading::Pending(progress) => {
                    if let (Some(report), Some(text)) = (self.progress, progress.as_deref()) {
                        report(text);
                    }
                }
            }

            if Instant::now() + self.poll_interval > deadline {
                error!(task, timeout_secs = self.timeout.as_secs(), "task timed out");
                return Err(CoreError::Timeout {
                    task: task.to_owned(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(CoreError::Cancelled),
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    async fn read(&self, handle: &TaskHandle) -> Result<Reading, CoreError> {
        match handle {
            TaskHandle::Task(id) => {
                let info = self.client.get_task_by_id(id).await?;
                if info.is_error {
                    return Ok(Reading::Failed(self.task_failure_reason(id, &info).await));
                }
                Ok(read_task(info))
            }
            TaskHandle::Execution(id) => {
                let status = self.client.get_business_api_execution_details(id).await?;
                Ok(match status.status.as_deref() {
                    Some(s) if s.eq_ignore_ascii_case("SUCCESS") => {
                        Reading::Succeeded(status.bapi_name.unwrap_or_else(|| s.to_owned()))
                    }
                    Some(s) if s.eq_ignore_ascii_case("FAILURE") => Reading::Failed(
                        status
                            .bapi_error
                            .unwrap_or_else(|| "business API execution failed".to_owned()),
                    ),
                    other => Reading::Pending(other.map(str::to_owned)),
                })
            }
            TaskHandle::EventStatus(id) => {
                let status = self.client.get_status_api_for_events(id).await?;
                Ok(match status.api_status.as_deref() {
                    Some(s) if s.eq_ignore_ascii_case("SUCCESS") => Reading::Succeeded(
                        error_text(status.status_message.as_ref()).unwrap_or_else(|| s.to_owned()),
                    ),
                    Some(s) if s.eq_ignore_ascii_case("FAILURE") => Reading::Failed(
                        error_text(status.error_message.as_ref())
                            .unwrap_or_else(|| "event API reported FAILURE".to_owned()),
                    ),
                    other => Reading::Pending(other.map(str::to_owned)),
                })
            }
            TaskHandle::Done => Ok(Reading::Succeeded("completed".to_owned())),
            TaskHandle::Rejected(reason) => Ok(Reading::Failed(reason.clone())),
        }
    }

    /// Prefer the first concrete sub-task error over the umbrella reason.
    async fn task_failure_reason(&self, id: &str, info: &TaskInfo) -> String {
        let fallback = info
            .failure_reason
            .clone()
            .or_else(|| info.progress.clone())
            .unwrap_or_else(|| "task reported an error".to_owned());

        match self.client.get_task_tree(id).await {
            Ok(tree) => tree
                .into_iter()
                .filter(|node| node.is_error)
                .filter_map(|node| node.failure_reason)
                .find(|reason| !reason.contains(BATCH_OPERATION))
                .unwrap_or(fallback),
            Err(e) => {
                debug!(error = %e, "task tree unavailable");
                fallback
            }
        }
    }
}

fn read_task(info: TaskInfo) -> Reading {
    let progress = info.progress.unwrap_or_default();
    let hinted = SUCCESS_HINTS.iter().any(|hint| progress.contains(hint));
    if info.end_time.is_some() || hinted {
        Reading::Succeeded(progress)
    } else {
        Reading::Pending((!progress.is_empty()).then_some(progress))
    }
}
