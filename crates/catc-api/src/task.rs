// Task and status endpoints
//
// Mutations hand back one of three kinds of handle; these are the
// endpoints that resolve them.

use crate::client::CatalystClient;
use crate::error::Error;
use crate::types::Envelope;
use crate::types::task::{EventApiStatus, ExecutionStatus, ReleaseSummary, TaskInfo, TaskTreeNode};

impl CatalystClient {
    /// `GET /dna/intent/api/v1/task/{id}`
    pub async fn get_task_by_id(&self, task_id: &str) -> Result<TaskInfo, Error> {
        let env: Envelope<TaskInfo> = self
            .get(
                "task.get_task_by_id",
                &format!("dna/intent/api/v1/task/{task_id}"),
                &[],
            )
            .await?;
        Ok(env.response)
    }

    /// `GET /dna/intent/api/v1/task/{id}/tree`
    pub async fn get_task_tree(&self, task_id: &str) -> Result<Vec<TaskTreeNode>, Error> {
        let env: Envelope<Vec<TaskTreeNode>> = self
            .get(
                "task.get_task_tree",
                &format!("dna/intent/api/v1/task/{task_id}/tree"),
                &[],
            )
            .await?;
        Ok(env.response)
    }

    /// `GET /dna/intent/api/v1/event/api-status/{executionId}`
    pub async fn get_status_api_for_events(
        &self,
        execution_id: &str,
    ) -> Result<EventApiStatus, Error> {
        self.get(
            "event_management.get_status_api_for_events",
            &format!("dna/intent/api/v1/event/api-status/{execution_id}"),
            &[],
        )
        .await
    }

    /// `GET /dna/intent/api/v1/dnacaap/management/execution-status/{executionId}`
    pub async fn get_business_api_execution_details(
        &self,
        execution_id: &str,
    ) -> Result<ExecutionStatus, Error> {
        self.get(
            "task.get_business_api_execution_details",
            &format!("dna/intent/api/v1/dnacaap/management/execution-status/{execution_id}"),
            &[],
        )
        .await
    }

    /// `GET /dna/intent/api/v1/dnac-release`
    pub async fn get_release_summary(&self) -> Result<ReleaseSummary, Error> {
        let env: Envelope<ReleaseSummary> = self
            .get(
                "platform.get_release_summary",
                "dna/intent/api/v1/dnac-release",
                &[],
            )
            .await?;
        Ok(env.response)
    }
}
