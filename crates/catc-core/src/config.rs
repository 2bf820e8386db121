// ── Runtime configuration ──
//
// These types describe *how* to reach a controller and *how* the engine
// paces its work. They never touch disk: `catc-config` builds them from the
// input document and hands them in.

use std::time::Duration;

use catc_api::ControllerVersion;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

/// The goal a run pursues for every item.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum State {
    /// Bring every item into being and into agreement.
    #[default]
    Merged,
    /// Remove every item.
    Deleted,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (`verify: false`, self-signed controllers).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g., `https://10.0.0.1:443`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Release to assume instead of asking the controller.
    pub version: Option<ControllerVersion>,
}

/// How the engine paces and checks its work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub state: State,
    /// Re-observe every processed item after apply.
    pub config_verify: bool,
    /// Fabric VLANs per create/update request.
    pub fabric_vlan_batch_size: usize,
    /// Anycast gateways per create/update request.
    pub anycast_gateway_batch_size: usize,
    pub task_poll_interval: Duration,
    /// Overall deadline for one task.
    pub task_timeout: Duration,
}

impl EngineSettings {
    pub const MAX_BATCH_SIZE: usize = 100;
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            state: State::Merged,
            config_verify: false,
            fabric_vlan_batch_size: 20,
            anycast_gateway_batch_size: 20,
            task_poll_interval: Duration::from_secs(2),
            task_timeout: Duration::from_secs(1200),
        }
    }
}
