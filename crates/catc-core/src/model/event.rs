// Event destination, notification and ITSM desired records.

use catc_api::types::Secret;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookHeaderSpec {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub encrypt: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookDestinationSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub trust_cert: Option<bool>,
    #[serde(default)]
    pub headers: Option<Vec<WebhookHeaderSpec>>,
    #[serde(default)]
    pub is_proxy_route: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmtpSpec {
    pub server_address: String,
    #[serde(default)]
    pub smtp_type: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailDestinationSpec {
    pub sender_email: String,
    pub recipient_email: String,
    pub subject: String,
    pub primary_smtp_config: SmtpSpec,
    #[serde(default)]
    pub secondary_smtp_config: Option<SmtpSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyslogDestinationSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub server_address: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnmpDestinationSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub server_address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub snmp_version: Option<String>,
    #[serde(default)]
    pub community: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub auth_type: Option<String>,
    #[serde(default)]
    pub auth_password: Option<Secret>,
    #[serde(default)]
    pub privacy_type: Option<String>,
    #[serde(default)]
    pub privacy_password: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItsmConnectionSpec {
    pub url: String,
    pub username: String,
    pub password: Secret,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItsmSettingSpec {
    pub instance_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub connection_settings: Option<ItsmConnectionSpec>,
}

/// Filter and destination shared by webhook and syslog notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sites: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub subdomains: Vec<String>,
    #[serde(default)]
    pub event_types: Vec<String>,
    #[serde(default)]
    pub event_categories: Vec<String>,
    #[serde(default)]
    pub event_severities: Vec<String>,
    #[serde(default)]
    pub event_sources: Vec<String>,
}

/// Email notifications carry their delivery endpoint inline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailNotificationSpec {
    #[serde(flatten)]
    pub filter: NotificationSpec,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub recipient_emails: Vec<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub instance_description: Option<String>,
}
