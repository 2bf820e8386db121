// Anycast gateways: one routed SVI per (VN, IP pool, fabric).

use catc_api::types::sda::{AnycastFilter, AnycastGateway};
use tracing::warn;

use super::{drifts, drifts_ignore_case};
use crate::config::State;
use crate::engine::profile::{Profile, Removal, Resolved, Verdict};
use crate::engine::session::Session;
use crate::error::CoreError;
use crate::lookup::{FabricLookup, FabricScope, resolve_fabric};
use crate::model::{AnycastGatewaySpec, ResourceKind};

const DEFAULT_TRAFFIC_TYPE: &str = "DATA";

pub(crate) struct AnycastGatewayProfile;

#[derive(Debug, Clone)]
pub(crate) struct GatewayTarget {
    pub spec: AnycastGatewaySpec,
    pub fabric: FabricScope,
}

fn gateway_label(spec: &AnycastGatewaySpec) -> String {
    format!(
        "{}/{}@{}",
        spec.vn_name, spec.ip_pool_name, spec.fabric_site_location
    )
}

fn set<T: Clone>(dst: &mut Option<T>, src: Option<&T>) {
    if let Some(v) = src {
        *dst = Some(v.clone());
    }
}

impl AnycastGatewayProfile {
    /// Lay every given desired field over `record`.
    fn overlay(s: &Session<'_>, spec: &AnycastGatewaySpec, record: &mut AnycastGateway) {
        set(&mut record.tcp_mss_adjustment, spec.tcp_mss_adjustment.as_ref());
        set(&mut record.vlan_name, spec.vlan_name.as_ref());
        set(&mut record.vlan_id, spec.vlan_id.as_ref());
        set(&mut record.traffic_type, spec.traffic_type.as_ref());
        set(&mut record.pool_type, spec.pool_type.as_ref());
        set(&mut record.security_group_name, spec.security_group_name.as_ref());
        set(&mut record.is_critical_pool, spec.is_critical_pool.as_ref());
        set(&mut record.is_layer2_flooding_enabled, spec.layer2_flooding_enabled.as_ref());
        set(&mut record.is_wireless_pool, spec.fabric_enabled_wireless.as_ref());
        set(&mut record.is_ip_directed_broadcast, spec.ip_directed_broadcast.as_ref());
        set(
            &mut record.is_intra_subnet_routing_enabled,
            spec.intra_subnet_routing_enabled.as_ref(),
        );
        set(
            &mut record.is_multiple_ip_to_mac_addresses,
            spec.multiple_ip_to_mac_addresses.as_ref(),
        );
        set(
            &mut record.is_supplicant_based_extended_node_onboarding,
            spec.supplicant_based_extended_node_onboarding.as_ref(),
        );
        set(
            &mut record.is_group_based_policy_enforcement_enabled,
            spec.group_policy_enforcement_enabled.as_ref(),
        );
        set(&mut record.auto_generate_vlan_name, spec.auto_generate_vlan_name.as_ref());

        let gated_requested = spec.wireless_flooding_enable.is_some()
            || spec.resource_guard_enable.is_some()
            || spec.flooding_address_assignment.is_some()
            || spec.flooding_address.is_some();
        if !gated_requested {
            return;
        }
        if s.caps.flooding_controls {
            set(&mut record.is_wireless_flooding_enabled, spec.wireless_flooding_enable.as_ref());
            set(&mut record.is_resource_guard_enabled, spec.resource_guard_enable.as_ref());
            set(
                &mut record.layer2_flooding_address_assignment,
                spec.flooding_address_assignment.as_ref(),
            );
            set(&mut record.layer2_flooding_address, spec.flooding_address.as_ref());
        } else {
            warn!(
                gateway = %gateway_label(spec),
                version = %s.caps.version,
                "flooding controls need Catalyst Center 3.1.3.0 or later; ignoring them"
            );
        }
    }

    fn drifted(s: &Session<'_>, spec: &AnycastGatewaySpec, current: &AnycastGateway) -> bool {
        let flags = [
            (spec.is_critical_pool, current.is_critical_pool),
            (spec.layer2_flooding_enabled, current.is_layer2_flooding_enabled),
            (spec.fabric_enabled_wireless, current.is_wireless_pool),
            (spec.ip_directed_broadcast, current.is_ip_directed_broadcast),
            (spec.intra_subnet_routing_enabled, current.is_intra_subnet_routing_enabled),
            (spec.multiple_ip_to_mac_addresses, current.is_multiple_ip_to_mac_addresses),
            (
                spec.supplicant_based_extended_node_onboarding,
                current.is_supplicant_based_extended_node_onboarding,
            ),
            (
                spec.group_policy_enforcement_enabled,
                current.is_group_based_policy_enforcement_enabled,
            ),
        ];
        let flag_drift = flags
            .iter()
            .any(|(desired, observed)| drifts(desired.as_ref(), observed.as_ref()));

        let field_drift = drifts(spec.tcp_mss_adjustment.as_ref(), current.tcp_mss_adjustment.as_ref())
            || drifts(spec.vlan_name.as_deref(), current.vlan_name.as_deref())
            || drifts(spec.vlan_id.as_ref(), current.vlan_id.as_ref())
            || drifts_ignore_case(spec.traffic_type.as_deref(), current.traffic_type.as_deref())
            || drifts_ignore_case(spec.pool_type.as_deref(), current.pool_type.as_deref())
            || drifts(
                spec.security_group_name.as_deref(),
                current.security_group_name.as_deref(),
            );

        let gated_drift = s.caps.flooding_controls
            && (drifts(
                spec.wireless_flooding_enable.as_ref(),
                current.is_wireless_flooding_enabled.as_ref(),
            ) || drifts(
                spec.resource_guard_enable.as_ref(),
                current.is_resource_guard_enabled.as_ref(),
            ) || drifts_ignore_case(
                spec.flooding_address_assignment.as_deref(),
                current.layer2_flooding_address_assignment.as_deref(),
            ) || drifts(
                spec.flooding_address.as_deref(),
                current.layer2_flooding_address.as_deref(),
            ));

        flag_drift || field_drift || gated_drift
    }

    async fn pool_reserved(s: &Session<'_>, site_id: &str, pool: &str) -> Result<bool, CoreError> {
        Ok(s.client
            .retrieves_ip_address_subpools(site_id)
            .await?
            .iter()
            .any(|p| p.group_name == pool))
    }

    /// The pool must be reserved at the gateway's site, or at the site the
    /// VN is anchored on.
    async fn check_pool(
        s: &Session<'_>,
        spec: &AnycastGatewaySpec,
        fabric: &FabricScope,
        anchor_fabric: Option<&str>,
    ) -> Result<(), CoreError> {
        if Self::pool_reserved(s, &fabric.site_id, &spec.ip_pool_name).await? {
            return Ok(());
        }
        if let Some(anchor) = anchor_fabric {
            let anchor_site = s
                .client
                .get_fabric_sites(None)
                .await?
                .into_iter()
                .find(|f| f.id == anchor)
                .map(|f| f.site_id);
            if let Some(site_id) = anchor_site {
                if Self::pool_reserved(s, &site_id, &spec.ip_pool_name).await? {
                    return Ok(());
                }
            }
        }
        Err(CoreError::conflict(format!(
            "IP pool '{}' is not reserved at '{}'",
            spec.ip_pool_name, spec.fabric_site_location.site_name_hierarchy
        )))
    }
}

impl Profile for AnycastGatewayProfile {
    type Item = AnycastGatewaySpec;
    type Target = GatewayTarget;
    type Observed = AnycastGateway;
    type Payload = AnycastGateway;

    fn kind(&self) -> ResourceKind {
        ResourceKind::AnycastGateway
    }

    fn item_label(&self, item: &AnycastGatewaySpec) -> String {
        gateway_label(item)
    }

    fn label(&self, target: &GatewayTarget) -> String {
        gateway_label(&target.spec)
    }

    async fn resolve(
        &self,
        s: &Session<'_>,
        item: &AnycastGatewaySpec,
    ) -> Result<Vec<Resolved<GatewayTarget>>, CoreError> {
        let location = &item.fabric_site_location;
        let fabric = match (s.state(), resolve_fabric(s, location).await?) {
            (_, FabricLookup::Found(fabric)) => fabric,
            (State::Deleted, _) => return Ok(vec![Resolved::Absent(gateway_label(item))]),
            (State::Merged, miss) => miss.required(location)?,
        };

        if s.state() == State::Merged {
            let anchor = if item.is_infra() {
                None
            } else {
                let vn = s
                    .client
                    .get_layer3_virtual_networks(&item.vn_name)
                    .await?
                    .into_iter()
                    .find(|vn| vn.virtual_network_name == item.vn_name)
                    .ok_or_else(|| {
                        CoreError::conflict(format!(
                            "virtual network '{}' does not exist",
                            item.vn_name
                        ))
                    })?;
                vn.anchored_site_id
            };
            Self::check_pool(s, item, &fabric, anchor.as_deref()).await?;
        }

        Ok(vec![Resolved::Target(GatewayTarget {
            spec: item.clone(),
            fabric,
        })])
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &GatewayTarget,
    ) -> Result<Option<AnycastGateway>, CoreError> {
        let spec = &target.spec;
        let filter = AnycastFilter {
            fabric_id: Some(&target.fabric.id),
            virtual_network_name: Some(&spec.vn_name),
            ip_pool_name: Some(&spec.ip_pool_name),
        };
        Ok(s.client
            .get_anycast_gateways(&filter)
            .await?
            .into_iter()
            .find(|g| {
                g.fabric_id == target.fabric.id
                    && g.virtual_network_name == spec.vn_name
                    && g.ip_pool_name == spec.ip_pool_name
            }))
    }

    fn diff(
        &self,
        s: &Session<'_>,
        target: &GatewayTarget,
        observed: Option<&AnycastGateway>,
    ) -> Verdict<AnycastGateway> {
        let spec = &target.spec;
        match observed {
            None => {
                let mut record = AnycastGateway {
                    fabric_id: target.fabric.id.clone(),
                    virtual_network_name: spec.vn_name.clone(),
                    ip_pool_name: spec.ip_pool_name.clone(),
                    ..Default::default()
                };
                Self::overlay(s, spec, &mut record);
                if !spec.is_infra() && record.traffic_type.is_none() {
                    record.traffic_type = Some(DEFAULT_TRAFFIC_TYPE.to_owned());
                }
                Verdict::Create(record)
            }
            Some(current) if Self::drifted(s, spec, current) => {
                let mut record = current.clone();
                Self::overlay(s, spec, &mut record);
                Verdict::Drifted(record)
            }
            Some(_) => Verdict::Equal,
        }
    }

    fn batch_size(&self, s: &Session<'_>) -> usize {
        s.settings.anycast_gateway_batch_size
    }

    async fn create(&self, s: &Session<'_>, batch: &[AnycastGateway]) -> Result<(), CoreError> {
        let handle = s.client.add_anycast_gateways(batch).await?;
        s.wait("sda.add_anycast_gateways", &handle).await?;
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[AnycastGateway]) -> Result<(), CoreError> {
        let handle = s.client.update_anycast_gateways(batch).await?;
        s.wait("sda.update_anycast_gateways", &handle).await?;
        Ok(())
    }

    async fn delete(
        &self,
        s: &Session<'_>,
        target: &GatewayTarget,
        observed: &AnycastGateway,
    ) -> Result<Removal, CoreError> {
        let Some(id) = observed.id.as_deref() else {
            return Err(CoreError::Lookup {
                message: format!("anycast gateway '{}' has no id", gateway_label(&target.spec)),
            });
        };
        let handle = s.client.delete_anycast_gateway_by_id(id).await?;
        s.wait("sda.delete_anycast_gateway_by_id", &handle).await?;
        Ok(Removal::Deleted)
    }
}
