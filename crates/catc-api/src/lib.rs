// catc-api: Async Rust client for the Cisco Catalyst Center intent API

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;
pub mod version;

mod event_management;
mod itsm;
mod network_settings;
mod sda;
mod sites;
mod task;

pub use client::CatalystClient;
pub use error::Error;
pub use event_management::{DESTINATION_PAGE_SIZE, EVENT_PAGE_SIZE};
pub use sites::image_content_type;
pub use transport::{TlsMode, TransportConfig};
pub use types::task::TaskHandle;
pub use version::{ControllerVersion, ParseVersionError};
