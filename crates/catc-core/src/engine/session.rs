// Per-run context handed to every profile call.

use catc_api::{CatalystClient, TaskHandle};
use tokio_util::sync::CancellationToken;

use crate::capability::Capabilities;
use crate::config::{EngineSettings, State};
use crate::error::CoreError;
use crate::task::{ProgressFn, TaskTracker};

/// Borrowed view of the engine for the duration of one run.
pub(crate) struct Session<'a> {
    pub client: &'a CatalystClient,
    pub caps: Capabilities,
    pub settings: &'a EngineSettings,
    pub cancel: &'a CancellationToken,
    pub progress: Option<&'a ProgressFn>,
}

impl Session<'_> {
    pub fn state(&self) -> State {
        self.settings.state
    }

    /// Block until `handle` resolves, honouring the run's poll settings.
    pub async fn wait(&self, task: &str, handle: &TaskHandle) -> Result<String, CoreError> {
        TaskTracker::new(
            self.client,
            self.settings.task_poll_interval,
            self.settings.task_timeout,
            self.cancel,
        )
        .with_progress(self.progress)
        .wait(task, handle)
        .await
    }
}
