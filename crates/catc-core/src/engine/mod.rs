// ── Reconciliation engine ──
//
// Owns the authenticated client for one run. `run` orders the validated
// elements by dependency, refuses surfaces the controller cannot serve,
// then drives one pass per element and folds the outcomes into a report.

pub(crate) mod profile;
pub(crate) mod report;
pub(crate) mod session;

use std::sync::Arc;

use catc_api::transport::{TlsMode, TransportConfig};
use catc_api::types::event::SubscriptionChannel;
use catc_api::{CatalystClient, ControllerVersion};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::capability::{Capabilities, Surface};
use crate::config::{ControllerConfig, EngineSettings, State, TlsVerification};
use crate::error::CoreError;
use crate::model::{ConfigElement, ResourceKind, SiteSpec, plan};
use crate::profiles::anycast::AnycastGatewayProfile;
use crate::profiles::destination::{
    EmailDestinationProfile, SnmpDestinationProfile, SyslogDestinationProfile,
    WebhookDestinationProfile,
};
use crate::profiles::fabric_vlan::FabricVlanProfile;
use crate::profiles::itsm::ItsmProfile;
use crate::profiles::notification::{EmailNotificationProfile, NotificationProfile};
use crate::profiles::site::SiteProfile;
use crate::profiles::virtual_network::VirtualNetworkProfile;
use crate::task::ProgressFn;
use crate::validate::validate;

use self::profile::{PassOutcome, run_pass};
use self::report::{Report, ReportBuilder};
use self::session::Session;

/// A connected reconciliation engine.
pub struct Engine {
    client: CatalystClient,
    caps: Capabilities,
    settings: EngineSettings,
    cancel: CancellationToken,
    progress: Option<Arc<ProgressFn>>,
}

impl Engine {
    /// Authenticate against the controller and learn its release.
    ///
    /// The release comes from `config.version` when given; otherwise it is
    /// read from the controller.
    pub async fn connect(config: &ControllerConfig, settings: EngineSettings) -> Result<Self, CoreError> {
        let transport = build_transport(config);
        let client = CatalystClient::login(
            config.url.as_str(),
            &config.username,
            &config.password,
            &transport,
        )
        .await?;
        debug!(url = %config.url, "authenticated");

        let version = match config.version {
            Some(version) => version,
            None => detect_version(&client).await?,
        };
        info!(%version, "connected to Catalyst Center");
        Ok(Self::with_client(client, version, settings))
    }

    /// Wrap an already authenticated client.
    pub fn with_client(client: CatalystClient, version: ControllerVersion, settings: EngineSettings) -> Self {
        Self {
            client,
            caps: Capabilities::from_version(version),
            settings,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Token that interrupts pending task polls and stops the run between passes.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receive task progress strings while mutations are pending.
    #[must_use]
    pub fn on_progress(mut self, progress: Arc<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Validate a raw `config` list, then run it.
    pub async fn apply(&self, config: &Value) -> Result<Report, CoreError> {
        let elements = validate(config, self.settings.state)?;
        self.run(elements).await
    }

    /// Reconcile validated elements.
    ///
    /// Fails before any remote call when the controller is too old for a
    /// requested surface. Item and pass failures land in the report.
    pub async fn run(&self, elements: Vec<ConfigElement>) -> Result<Report, CoreError> {
        let passes = plan(elements, self.settings.state);
        self.gate(&passes)?;

        let session = Session {
            client: &self.client,
            caps: self.caps,
            settings: &self.settings,
            cancel: &self.cancel,
            progress: self.progress.as_deref(),
        };

        let mut builder = ReportBuilder::default();
        for element in &passes {
            if self.cancel.is_cancelled() {
                warn!("run cancelled; remaining passes skipped");
                break;
            }
            let kind = element.kind();
            let span = info_span!("pass", kind = %kind, state = %self.settings.state, items = element.len());
            let outcome = dispatch(&session, element).instrument(span).await;
            let fatal = outcome.fatal;
            builder.add(outcome.report, outcome.verified, outcome.last_error);
            if fatal {
                warn!(%kind, "run-fatal error; remaining passes skipped");
                break;
            }
        }
        Ok(builder.finish())
    }

    /// Refuse the whole run when any element needs a newer controller.
    fn gate(&self, passes: &[ConfigElement]) -> Result<(), CoreError> {
        for element in passes {
            if let Some(surface) = required_surface(element.kind()) {
                self.caps.require(surface)?;
            }
            if let ConfigElement::Sites(sites) = element {
                let wants_image = sites.iter().any(|site| {
                    matches!(site, SiteSpec::Floor(floor) if floor.upload_floor_image_path.is_some())
                });
                if wants_image && self.settings.state == State::Merged {
                    self.caps.require(Surface::FloorImageUpload)?;
                }
            }
        }
        Ok(())
    }
}

fn required_surface(kind: ResourceKind) -> Option<Surface> {
    match kind {
        ResourceKind::Site => None,
        ResourceKind::VirtualNetwork | ResourceKind::FabricVlan | ResourceKind::AnycastGateway => {
            Some(Surface::Sda)
        }
        ResourceKind::WebhookDestination
        | ResourceKind::EmailDestination
        | ResourceKind::SyslogDestination
        | ResourceKind::SnmpDestination
        | ResourceKind::ItsmSetting
        | ResourceKind::WebhookEventNotification
        | ResourceKind::SyslogEventNotification
        | ResourceKind::EmailEventNotification => Some(Surface::Events),
    }
}

async fn dispatch(s: &Session<'_>, element: &ConfigElement) -> PassOutcome {
    match element {
        ConfigElement::Sites(items) => run_pass(&SiteProfile, s, items).await,
        ConfigElement::VirtualNetworks(items) => run_pass(&VirtualNetworkProfile, s, items).await,
        ConfigElement::FabricVlans(items) => run_pass(&FabricVlanProfile, s, items).await,
        ConfigElement::AnycastGateways(items) => run_pass(&AnycastGatewayProfile, s, items).await,
        ConfigElement::WebhookDestinations(items) => {
            run_pass(&WebhookDestinationProfile, s, items).await
        }
        ConfigElement::EmailDestinations(items) => {
            run_pass(&EmailDestinationProfile, s, items).await
        }
        ConfigElement::SyslogDestinations(items) => {
            run_pass(&SyslogDestinationProfile, s, items).await
        }
        ConfigElement::SnmpDestinations(items) => run_pass(&SnmpDestinationProfile, s, items).await,
        ConfigElement::ItsmSettings(items) => run_pass(&ItsmProfile, s, items).await,
        ConfigElement::WebhookNotifications(items) => {
            let profile = NotificationProfile {
                channel: SubscriptionChannel::Rest,
            };
            run_pass(&profile, s, items).await
        }
        ConfigElement::SyslogNotifications(items) => {
            let profile = NotificationProfile {
                channel: SubscriptionChannel::Syslog,
            };
            run_pass(&profile, s, items).await
        }
        ConfigElement::EmailNotifications(items) => {
            run_pass(&EmailNotificationProfile, s, items).await
        }
    }
}

async fn detect_version(client: &CatalystClient) -> Result<ControllerVersion, CoreError> {
    let summary = client.get_release_summary().await?;
    let raw = summary
        .display_version
        .or(summary.installed_version)
        .ok_or_else(|| CoreError::Config {
            message: "controller did not report its release; set `version` explicitly".into(),
        })?;
    raw.parse().map_err(|e: catc_api::ParseVersionError| CoreError::Config {
        message: e.to_string(),
    })
}

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AnycastGatewaySpec, FloorSpec, WebhookDestinationSpec};

    fn engine(version: ControllerVersion, state: State) -> Engine {
        let client = CatalystClient::from_reqwest("https://127.0.0.1:9", reqwest::Client::new()).unwrap();
        Engine::with_client(
            client,
            version,
            EngineSettings {
                state,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn old_controller_is_refused_before_any_call() {
        let engine = engine(ControllerVersion::new(2, 3, 5, 3), State::Merged);
        let err = engine
            .run(vec![ConfigElement::AnycastGateways(vec![AnycastGatewaySpec::default()])])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::VersionUnsupported { .. }));
        assert!(err.to_string().contains("2.3.7.6"));
    }

    #[tokio::test]
    async fn events_need_their_release() {
        let engine = engine(ControllerVersion::new(2, 3, 3, 0), State::Deleted);
        let err = engine
            .run(vec![ConfigElement::WebhookDestinations(vec![WebhookDestinationSpec::default()])])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("2.3.5.3"));
    }

    #[test]
    fn floor_image_is_gated_only_when_merging() {
        let floor = ConfigElement::Sites(vec![SiteSpec::Floor(FloorSpec {
            name: "F1".into(),
            parent_name: "Global/A/B".into(),
            upload_floor_image_path: Some("/tmp/f.png".into()),
            ..Default::default()
        })]);
        let old = ControllerVersion::new(2, 3, 5, 3);
        assert!(engine(old, State::Merged).gate(std::slice::from_ref(&floor)).is_err());
        assert!(engine(old, State::Deleted).gate(&[floor]).is_ok());
    }
}
