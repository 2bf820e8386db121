// SDA fabric types: fabric sites/zones, layer-2 and layer-3 virtual
// networks, anycast gateways.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricSite {
    pub id: String,
    pub site_id: String,
    #[serde(default)]
    pub authentication_profile_name: Option<String>,
    #[serde(default)]
    pub is_pub_sub_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricZone {
    pub id: String,
    pub site_id: String,
    #[serde(default)]
    pub authentication_profile_name: Option<String>,
}

/// A layer-2 virtual network ("fabric VLAN") bound to one fabric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer2VirtualNetwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fabric_id: String,
    pub vlan_name: String,
    pub vlan_id: u16,
    pub traffic_type: String,
    #[serde(default)]
    pub is_fabric_enabled_wireless: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_wireless_flooding_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_resource_guard_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer2_flooding_address_assignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer2_flooding_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_layer3_virtual_network_name: Option<String>,
}

/// A layer-3 virtual network, optionally anchored at one fabric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer3VirtualNetwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub virtual_network_name: String,
    #[serde(default)]
    pub fabric_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchored_site_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnycastGateway {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fabric_id: String,
    pub virtual_network_name: String,
    pub ip_pool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_mss_adjustment: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_critical_pool: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_layer2_flooding_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_wireless_pool: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ip_directed_broadcast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_intra_subnet_routing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_multiple_ip_to_mac_addresses: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_supplicant_based_extended_node_onboarding: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group_based_policy_enforcement_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generate_vlan_name: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_resource_guard_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_wireless_flooding_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer2_flooding_address_assignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer2_flooding_address: Option<String>,
}

/// Query filter for `GET /sda/layer2VirtualNetworks`.
#[derive(Debug, Clone, Default)]
pub struct Layer2Filter<'a> {
    pub fabric_id: Option<&'a str>,
    pub vlan_name: Option<&'a str>,
    pub vlan_id: Option<u16>,
}

impl Layer2Filter<'_> {
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(fabric_id) = self.fabric_id {
            params.push(("fabricId", fabric_id.to_owned()));
        }
        if let Some(name) = self.vlan_name {
            params.push(("vlanName", name.to_owned()));
        }
        if let Some(id) = self.vlan_id {
            params.push(("vlanId", id.to_string()));
        }
        params
    }
}

/// Query filter for `GET /sda/anycastGateways`.
#[derive(Debug, Clone, Default)]
pub struct AnycastFilter<'a> {
    pub fabric_id: Option<&'a str>,
    pub virtual_network_name: Option<&'a str>,
    pub ip_pool_name: Option<&'a str>,
}

impl AnycastFilter<'_> {
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(fabric_id) = self.fabric_id {
            params.push(("fabricId", fabric_id.to_owned()));
        }
        if let Some(vn) = self.virtual_network_name {
            params.push(("virtualNetworkName", vn.to_owned()));
        }
        if let Some(pool) = self.ip_pool_name {
            params.push(("ipPoolName", pool.to_owned()));
        }
        params
    }
}
