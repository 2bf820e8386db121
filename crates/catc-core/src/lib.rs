//! Declarative reconciliation engine for Cisco Catalyst Center.
//!
//! Given a desired-state document, this crate brings the controller into
//! agreement with it (or removes what it names) and reports what it did:
//!
//! - **[`validate`]** checks and coerces the raw `config` list into typed
//!   [`ConfigElement`]s, collecting every offending field before any remote
//!   call is made.
//! - **[`Engine`]** authenticates, derives [`Capabilities`] from the
//!   controller release, orders the elements by dependency and drives one
//!   pass per kind: resolve references, observe, diff, apply in batches,
//!   wait on controller tasks, optionally verify.
//! - **[`Report`]** enumerates created, updated, unchanged, deleted, absent
//!   and failed items per kind, with a one-line summary.
//!
//! Supported kinds cover the site hierarchy, SDA fabric VLANs, layer-3
//! virtual networks and anycast gateways, event destinations, event
//! notifications and ITSM integration settings.

pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;

mod lookup;
mod profiles;
mod task;
mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use capability::{Capabilities, Surface};
pub use config::{ControllerConfig, EngineSettings, State, TlsVerification};
pub use engine::Engine;
pub use engine::report::{Failure, KindReport, Report};
pub use error::{CoreError, Violation};
pub use model::{ConfigElement, ResourceKind, plan};
pub use task::ProgressFn;
pub use validate::validate;

pub use catc_api::ControllerVersion;
