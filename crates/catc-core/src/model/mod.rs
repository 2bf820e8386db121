// ── Desired-state model ──
//
// Typed records produced by the validator. Every field that the input may
// omit is an `Option` so "not given" stays distinguishable from "given as
// the default"; only explicitly given values can cause drift.

pub mod event;
pub mod sda;
pub mod site;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::config::State;

pub use event::{
    EmailDestinationSpec, EmailNotificationSpec, ItsmSettingSpec, NotificationSpec, SmtpSpec,
    SnmpDestinationSpec, SyslogDestinationSpec, WebhookDestinationSpec, WebhookHeaderSpec,
};
pub use sda::{AnycastGatewaySpec, FabricSiteLocation, FabricType, FabricVlanSpec, VirtualNetworkSpec};
pub use site::{AreaSpec, BuildingSpec, FloorSpec, SiteSpec};

/// Every resource kind the engine can reconcile.
///
/// The `snake_case` form is the key naming the kind in a config element.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Site,
    #[serde(rename = "virtual_networks")]
    #[strum(serialize = "virtual_networks")]
    VirtualNetwork,
    FabricVlan,
    #[serde(rename = "anycast_gateways")]
    #[strum(serialize = "anycast_gateways")]
    AnycastGateway,
    WebhookDestination,
    EmailDestination,
    SyslogDestination,
    SnmpDestination,
    ItsmSetting,
    WebhookEventNotification,
    SyslogEventNotification,
    EmailEventNotification,
}

impl ResourceKind {
    /// The key naming this kind in a config element.
    pub fn config_key(self) -> &'static str {
        self.into()
    }

    /// Look a kind up by its config key.
    pub fn from_config_key(key: &str) -> Option<Self> {
        <Self as strum::IntoEnumIterator>::iter().find(|k| k.config_key() == key)
    }

    /// Human noun used in report messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Site => "Site",
            Self::VirtualNetwork => "Layer3 virtual network",
            Self::FabricVlan => "Fabric VLAN",
            Self::AnycastGateway => "Anycast gateway",
            Self::WebhookDestination => "Webhook destination",
            Self::EmailDestination => "Email destination",
            Self::SyslogDestination => "Syslog destination",
            Self::SnmpDestination => "SNMP destination",
            Self::ItsmSetting => "ITSM setting",
            Self::WebhookEventNotification => "Webhook event notification",
            Self::SyslogEventNotification => "Syslog event notification",
            Self::EmailEventNotification => "Email event notification",
        }
    }

    /// Dependency rank under merged intent: lower ranks run first.
    fn merged_rank(self) -> u8 {
        match self {
            Self::Site => 0,
            Self::VirtualNetwork => 1,
            Self::FabricVlan => 2,
            Self::AnycastGateway => 3,
            Self::WebhookDestination
            | Self::EmailDestination
            | Self::SyslogDestination
            | Self::SnmpDestination
            | Self::ItsmSetting => 4,
            Self::WebhookEventNotification
            | Self::SyslogEventNotification
            | Self::EmailEventNotification => 5,
        }
    }

    /// Execution rank for `state`; deleted intent runs dependents first.
    pub fn rank(self, state: State) -> u8 {
        match state {
            State::Merged => self.merged_rank(),
            State::Deleted => 5 - self.merged_rank(),
        }
    }
}

/// One validated element of the `config` list.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigElement {
    Sites(Vec<SiteSpec>),
    VirtualNetworks(Vec<VirtualNetworkSpec>),
    FabricVlans(Vec<FabricVlanSpec>),
    AnycastGateways(Vec<AnycastGatewaySpec>),
    WebhookDestinations(Vec<WebhookDestinationSpec>),
    EmailDestinations(Vec<EmailDestinationSpec>),
    SyslogDestinations(Vec<SyslogDestinationSpec>),
    SnmpDestinations(Vec<SnmpDestinationSpec>),
    ItsmSettings(Vec<ItsmSettingSpec>),
    WebhookNotifications(Vec<NotificationSpec>),
    SyslogNotifications(Vec<NotificationSpec>),
    EmailNotifications(Vec<EmailNotificationSpec>),
}

impl ConfigElement {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Sites(_) => ResourceKind::Site,
            Self::VirtualNetworks(_) => ResourceKind::VirtualNetwork,
            Self::FabricVlans(_) => ResourceKind::FabricVlan,
            Self::AnycastGateways(_) => ResourceKind::AnycastGateway,
            Self::WebhookDestinations(_) => ResourceKind::WebhookDestination,
            Self::EmailDestinations(_) => ResourceKind::EmailDestination,
            Self::SyslogDestinations(_) => ResourceKind::SyslogDestination,
            Self::SnmpDestinations(_) => ResourceKind::SnmpDestination,
            Self::ItsmSettings(_) => ResourceKind::ItsmSetting,
            Self::WebhookNotifications(_) => ResourceKind::WebhookEventNotification,
            Self::SyslogNotifications(_) => ResourceKind::SyslogEventNotification,
            Self::EmailNotifications(_) => ResourceKind::EmailEventNotification,
        }
    }

    /// Append `other`'s items when both elements are of the same kind;
    /// hands `other` back otherwise.
    pub fn absorb(&mut self, other: Self) -> Result<(), Self> {
        match (self, other) {
            (Self::Sites(a), Self::Sites(b)) => a.extend(b),
            (Self::VirtualNetworks(a), Self::VirtualNetworks(b)) => a.extend(b),
            (Self::FabricVlans(a), Self::FabricVlans(b)) => a.extend(b),
            (Self::AnycastGateways(a), Self::AnycastGateways(b)) => a.extend(b),
            (Self::WebhookDestinations(a), Self::WebhookDestinations(b)) => a.extend(b),
            (Self::EmailDestinations(a), Self::EmailDestinations(b)) => a.extend(b),
            (Self::SyslogDestinations(a), Self::SyslogDestinations(b)) => a.extend(b),
            (Self::SnmpDestinations(a), Self::SnmpDestinations(b)) => a.extend(b),
            (Self::ItsmSettings(a), Self::ItsmSettings(b)) => a.extend(b),
            (Self::WebhookNotifications(a), Self::WebhookNotifications(b)) => a.extend(b),
            (Self::SyslogNotifications(a), Self::SyslogNotifications(b)) => a.extend(b),
            (Self::EmailNotifications(a), Self::EmailNotifications(b)) => a.extend(b),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    /// Number of desired items carried.
    pub fn len(&self) -> usize {
        match self {
            Self::Sites(v) => v.len(),
            Self::VirtualNetworks(v) => v.len(),
            Self::FabricVlans(v) => v.len(),
            Self::AnycastGateways(v) => v.len(),
            Self::WebhookDestinations(v) => v.len(),
            Self::EmailDestinations(v) => v.len(),
            Self::SyslogDestinations(v) => v.len(),
            Self::SnmpDestinations(v) => v.len(),
            Self::ItsmSettings(v) => v.len(),
            Self::WebhookNotifications(v) | Self::SyslogNotifications(v) => v.len(),
            Self::EmailNotifications(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Order elements for execution.
///
/// A stable sort by dependency rank keeps input order within a rank; runs of
/// adjacent same-kind elements are then merged so each becomes one pass.
pub fn plan(elements: Vec<ConfigElement>, state: State) -> Vec<ConfigElement> {
    let mut elements = elements;
    elements.sort_by_key(|e| e.kind().rank(state));

    let mut passes: Vec<ConfigElement> = Vec::with_capacity(elements.len());
    for element in elements {
        let element = match passes.last_mut() {
            Some(last) => match last.absorb(element) {
                Ok(()) => continue,
                Err(element) => element,
            },
            None => element,
        };
        passes.push(element);
    }
    passes
}
