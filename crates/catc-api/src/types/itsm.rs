// ITSM integration instance types.

use serde::{Deserialize, Serialize};

use super::Secret;

/// Row of `GET /integration-settings/itsm/instances`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItsmInstanceSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dyp_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItsmInstancePage {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub data: Vec<ItsmInstanceSummary>,
}

/// Full instance record; also the create/update body.
///
/// The controller never returns `Auth_Password`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItsmInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub dyp_name: String,
    pub data: ItsmData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItsmData {
    #[serde(rename = "ConnectionSettings")]
    pub connection_settings: ItsmConnection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItsmConnection {
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "Auth_UserName")]
    pub auth_user_name: String,
    #[serde(
        rename = "Auth_Password",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub auth_password: Option<Secret>,
}
