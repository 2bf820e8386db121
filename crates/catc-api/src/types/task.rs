// Asynchronous task types and mutation-response classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /dna/intent/api/v1/task/{id}` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub data: Option<String>,
}

/// One node of `GET /dna/intent/api/v1/task/{id}/tree`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTreeNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

/// `GET /dna/intent/api/v1/event/api-status/{executionId}` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventApiStatus {
    #[serde(default)]
    pub api_status: Option<String>,
    #[serde(default)]
    pub error_message: Option<Value>,
    #[serde(default)]
    pub status_message: Option<Value>,
}

/// Business API execution status (legacy site endpoints).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub bapi_error: Option<String>,
    #[serde(default)]
    pub bapi_name: Option<String>,
}

/// `GET /dna/intent/api/v1/dnac-release` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSummary {
    #[serde(default)]
    pub display_version: Option<String>,
    #[serde(default)]
    pub installed_version: Option<String>,
}

/// How the outcome of a mutation is obtained.
///
/// Every mutating endpoint answers in one of a few shapes; this enum is
/// the single place those shapes are told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskHandle {
    /// `response.taskId`, polled via the task-by-id endpoint.
    Task(String),
    /// `executionId` for the business API, polled via execution status.
    Execution(String),
    /// `statusUri` / `executionId` from the event endpoints, polled via the
    /// status api for events.
    EventStatus(String),
    /// Synchronous success.
    Done,
    /// Synchronous failure with the controller-reported reason.
    Rejected(String),
}

impl TaskHandle {
    /// Classify a decoded mutation response body.
    pub fn classify(body: &Value) -> Self {
        if let Some(task_id) = body
            .get("response")
            .and_then(|r| r.get("taskId"))
            .and_then(Value::as_str)
        {
            return Self::Task(task_id.to_owned());
        }

        if let Some(status_uri) = body.get("statusUri").and_then(Value::as_str) {
            return Self::EventStatus(trailing_segment(status_uri).to_owned());
        }

        if let Some(execution_id) = body.get("executionId").and_then(Value::as_str) {
            let via_bapi = body
                .get("executionStatusUrl")
                .and_then(Value::as_str)
                .is_some_and(|url| url.contains("/dnacaap/"));
            return if via_bapi {
                Self::Execution(execution_id.to_owned())
            } else {
                Self::EventStatus(execution_id.to_owned())
            };
        }

        if let Some(status) = body.get("apiStatus").and_then(Value::as_str) {
            return if status.eq_ignore_ascii_case("SUCCESS") {
                Self::Done
            } else {
                Self::Rejected(error_text(body.get("errorMessage")).unwrap_or_else(|| {
                    format!("controller reported apiStatus {status}")
                }))
            };
        }

        Self::Done
    }
}

fn trailing_segment(uri: &str) -> &str {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(uri)
}

/// Flatten the controller's `errorMessage` shapes (string, `{errors: [...]}`,
/// arbitrary object) into one line.
pub fn error_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => match map.get("errors") {
            Some(Value::Array(errors)) if !errors.is_empty() => Some(
                errors
                    .iter()
                    .map(|e| e.as_str().map_or_else(|| e.to_string(), str::to_owned))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ if map.is_empty() => None,
            _ => Some(Value::Object(map.clone()).to_string()),
        },
        other => Some(other.to_string()),
    }
}
