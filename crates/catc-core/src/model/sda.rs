// SDA desired records: fabric VLANs, layer-3 virtual networks, anycast gateways.

use serde::{Deserialize, Serialize};

/// Reserved VN for extended nodes and fabric APs; accepts a reduced field set.
pub const INFRA_VN: &str = "INFRA_VN";

/// Which fabric scope a location refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FabricType {
    #[default]
    FabricSite,
    FabricZone,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FabricSiteLocation {
    pub site_name_hierarchy: String,
    #[serde(default)]
    pub fabric_type: FabricType,
}

impl std::fmt::Display for FabricSiteLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.fabric_type {
            FabricType::FabricSite => f.write_str(&self.site_name_hierarchy),
            FabricType::FabricZone => write!(f, "{} (zone)", self.site_name_hierarchy),
        }
    }
}

/// A layer-2 VN, realised once per listed fabric location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FabricVlanSpec {
    pub vlan_name: String,
    pub vlan_id: u16,
    #[serde(default)]
    pub traffic_type: Option<String>,
    #[serde(default)]
    pub fabric_site_locations: Vec<FabricSiteLocation>,
    #[serde(default)]
    pub fabric_enabled_wireless: Option<bool>,
    #[serde(default)]
    pub associated_layer3_virtual_network: Option<String>,
    #[serde(default)]
    pub wireless_flooding_enable: Option<bool>,
    #[serde(default)]
    pub resource_guard_enable: Option<bool>,
    #[serde(default)]
    pub flooding_address_assignment: Option<String>,
    #[serde(default)]
    pub flooding_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualNetworkSpec {
    pub vn_name: String,
    #[serde(default)]
    pub fabric_site_locations: Vec<FabricSiteLocation>,
    #[serde(default)]
    pub anchored_site_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnycastGatewaySpec {
    pub vn_name: String,
    pub ip_pool_name: String,
    pub fabric_site_location: FabricSiteLocation,
    #[serde(default)]
    pub tcp_mss_adjustment: Option<u16>,
    #[serde(default)]
    pub vlan_name: Option<String>,
    #[serde(default)]
    pub vlan_id: Option<u16>,
    #[serde(default)]
    pub traffic_type: Option<String>,
    #[serde(default)]
    pub pool_type: Option<String>,
    #[serde(default)]
    pub security_group_name: Option<String>,
    #[serde(default)]
    pub is_critical_pool: Option<bool>,
    #[serde(default)]
    pub layer2_flooding_enabled: Option<bool>,
    #[serde(default)]
    pub fabric_enabled_wireless: Option<bool>,
    #[serde(default)]
    pub ip_directed_broadcast: Option<bool>,
    #[serde(default)]
    pub intra_subnet_routing_enabled: Option<bool>,
    #[serde(default)]
    pub multiple_ip_to_mac_addresses: Option<bool>,
    #[serde(default)]
    pub supplicant_based_extended_node_onboarding: Option<bool>,
    #[serde(default)]
    pub group_policy_enforcement_enabled: Option<bool>,
    #[serde(default)]
    pub auto_generate_vlan_name: Option<bool>,
    #[serde(default)]
    pub wireless_flooding_enable: Option<bool>,
    #[serde(default)]
    pub resource_guard_enable: Option<bool>,
    #[serde(default)]
    pub flooding_address_assignment: Option<String>,
    #[serde(default)]
    pub flooding_address: Option<String>,
}

impl AnycastGatewaySpec {
    pub fn is_infra(&self) -> bool {
        self.vn_name == INFRA_VN
    }

    /// Auto-generated or critical-pool gateways get their VLAN from the
    /// controller, so an explicit name or id is never sent.
    pub fn vlan_is_managed(&self) -> bool {
        self.auto_generate_vlan_name == Some(true) || self.is_critical_pool == Some(true)
    }
}
