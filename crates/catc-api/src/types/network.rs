// Network settings types.

use serde::{Deserialize, Serialize};

/// A reserved IP subpool at a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpSubpool {
    #[serde(default)]
    pub id: Option<String>,
    pub group_name: String,
    #[serde(default)]
    pub site_id: Option<String>,
}
