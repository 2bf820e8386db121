// Wire types for the Catalyst Center intent API.
//
// Field names follow the controller's camelCase JSON. Types that double as
// request bodies skip `None` fields on serialization so partial payloads
// never clobber controller defaults.

pub mod event;
pub mod itsm;
pub mod network;
pub mod sda;
pub mod secret;
pub mod site;
pub mod task;

pub use secret::Secret;

use serde::{Deserialize, Serialize};

/// The standard `{ "response": ..., "version": ... }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub response: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The `{ "apiStatus", "errorMessage", "statusMessage": ... }` envelope used
/// by the event configuration endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEnvelope<T> {
    #[serde(default)]
    pub api_status: Option<String>,
    #[serde(default)]
    pub error_message: Option<serde_json::Value>,
    pub status_message: T,
}
