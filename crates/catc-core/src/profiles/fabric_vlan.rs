// Fabric VLANs: one layer-2 VN per (vlan, fabric site or zone).

use std::collections::HashSet;

use catc_api::types::sda::{Layer2Filter, Layer2VirtualNetwork};
use tracing::{info, warn};

use super::{drifts, drifts_ignore_case};
use crate::config::State;
use crate::engine::profile::{Profile, Removal, Resolved, Verdict};
use crate::engine::session::Session;
use crate::error::CoreError;
use crate::lookup::{FabricLookup, FabricScope, resolve_fabric};
use crate::model::{FabricSiteLocation, FabricVlanSpec, ResourceKind};

const DEFAULT_TRAFFIC_TYPE: &str = "DATA";

pub(crate) struct FabricVlanProfile;

#[derive(Debug, Clone)]
pub(crate) enum Scope {
    One {
        location: FabricSiteLocation,
        fabric: FabricScope,
    },
    /// Every fabric carrying this VLAN (deleted intent without locations).
    All,
}

#[derive(Debug, Clone)]
pub(crate) struct VlanTarget {
    pub spec: FabricVlanSpec,
    pub scope: Scope,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservedVlan {
    pub record: Layer2VirtualNetwork,
    pub is_zone: bool,
}

fn vlan_label(spec: &FabricVlanSpec) -> String {
    format!("{}:{}", spec.vlan_name, spec.vlan_id)
}

impl FabricVlanProfile {
    fn matches(spec: &FabricVlanSpec, record: &Layer2VirtualNetwork) -> bool {
        record.vlan_name == spec.vlan_name && record.vlan_id == spec.vlan_id
    }

    /// Write the release-gated flooding controls, or drop them with a warning.
    fn apply_gated(s: &Session<'_>, spec: &FabricVlanSpec, record: &mut Layer2VirtualNetwork) {
        let requested = spec.wireless_flooding_enable.is_some()
            || spec.resource_guard_enable.is_some()
            || spec.flooding_address_assignment.is_some()
            || spec.flooding_address.is_some();
        if !requested {
            return;
        }
        if !s.caps.flooding_controls {
            warn!(
                vlan = %vlan_label(spec),
                version = %s.caps.version,
                "flooding controls need Catalyst Center 3.1.3.0 or later; ignoring them"
            );
            return;
        }
        if spec.wireless_flooding_enable.is_some() {
            record.is_wireless_flooding_enabled = spec.wireless_flooding_enable;
        }
        if spec.resource_guard_enable.is_some() {
            record.is_resource_guard_enabled = spec.resource_guard_enable;
        }
        if spec.flooding_address_assignment.is_some() {
            record
                .layer2_flooding_address_assignment
                .clone_from(&spec.flooding_address_assignment);
        }
        if spec.flooding_address.is_some() {
            record.layer2_flooding_address.clone_from(&spec.flooding_address);
        }
    }

    fn create_payload(s: &Session<'_>, spec: &FabricVlanSpec, fabric_id: &str) -> Layer2VirtualNetwork {
        let mut record = Layer2VirtualNetwork {
            id: None,
            fabric_id: fabric_id.to_owned(),
            vlan_name: spec.vlan_name.clone(),
            vlan_id: spec.vlan_id,
            traffic_type: spec
                .traffic_type
                .clone()
                .unwrap_or_else(|| DEFAULT_TRAFFIC_TYPE.to_owned()),
            is_fabric_enabled_wireless: spec.fabric_enabled_wireless.unwrap_or(false),
            associated_layer3_virtual_network_name: spec.associated_layer3_virtual_network.clone(),
            ..Default::default()
        };
        Self::apply_gated(s, spec, &mut record);
        record
    }

    /// Observed record with every given desired field laid over it.
    fn update_payload(
        s: &Session<'_>,
        spec: &FabricVlanSpec,
        observed: &Layer2VirtualNetwork,
    ) -> Layer2VirtualNetwork {
        let mut record = observed.clone();
        if let Some(traffic_type) = &spec.traffic_type {
            record.traffic_type.clone_from(traffic_type);
        }
        if let Some(wireless) = spec.fabric_enabled_wireless {
            record.is_fabric_enabled_wireless = wireless;
        }
        if spec.associated_layer3_virtual_network.is_some() {
            record
                .associated_layer3_virtual_network_name
                .clone_from(&spec.associated_layer3_virtual_network);
        }
        Self::apply_gated(s, spec, &mut record);
        record
    }

    fn drifted(s: &Session<'_>, spec: &FabricVlanSpec, observed: &Layer2VirtualNetwork) -> bool {
        let base = drifts_ignore_case(spec.traffic_type.as_deref(), Some(&observed.traffic_type))
            || drifts(
                spec.fabric_enabled_wireless.as_ref(),
                Some(&observed.is_fabric_enabled_wireless),
            )
            || drifts(
                spec.associated_layer3_virtual_network.as_deref(),
                observed.associated_layer3_virtual_network_name.as_deref(),
            );
        let gated = s.caps.flooding_controls
            && (drifts(
                spec.wireless_flooding_enable.as_ref(),
                observed.is_wireless_flooding_enabled.as_ref(),
            ) || drifts(
                spec.resource_guard_enable.as_ref(),
                observed.is_resource_guard_enabled.as_ref(),
            ) || drifts_ignore_case(
                spec.flooding_address_assignment.as_deref(),
                observed.layer2_flooding_address_assignment.as_deref(),
            ) || drifts(
                spec.flooding_address.as_deref(),
                observed.layer2_flooding_address.as_deref(),
            ));
        base || gated
    }

    async fn delete_record(s: &Session<'_>, record: &Layer2VirtualNetwork) -> Result<(), CoreError> {
        let Some(id) = record.id.as_deref() else {
            return Err(CoreError::Lookup {
                message: format!("layer-2 VN '{}' has no id", record.vlan_name),
            });
        };
        let handle = s.client.delete_layer2_virtual_network_by_id(id).await?;
        s.wait("sda.delete_layer2_virtual_network_by_id", &handle).await?;
        info!(vlan = %record.vlan_name, fabric = %record.fabric_id, "layer-2 VN deleted");
        Ok(())
    }
}

impl Profile for FabricVlanProfile {
    type Item = FabricVlanSpec;
    type Target = VlanTarget;
    type Observed = Vec<ObservedVlan>;
    type Payload = Layer2VirtualNetwork;

    fn kind(&self) -> ResourceKind {
        ResourceKind::FabricVlan
    }

    fn item_label(&self, item: &FabricVlanSpec) -> String {
        vlan_label(item)
    }

    fn label(&self, target: &VlanTarget) -> String {
        match &target.scope {
            Scope::One { location, .. } => format!("{}@{location}", vlan_label(&target.spec)),
            Scope::All => vlan_label(&target.spec),
        }
    }

    async fn resolve(
        &self,
        s: &Session<'_>,
        item: &FabricVlanSpec,
    ) -> Result<Vec<Resolved<VlanTarget>>, CoreError> {
        if item.fabric_site_locations.is_empty() {
            return Ok(vec![Resolved::Target(VlanTarget {
                spec: item.clone(),
                scope: Scope::All,
            })]);
        }

        let mut out = Vec::with_capacity(item.fabric_site_locations.len());
        for location in &item.fabric_site_locations {
            let lookup = resolve_fabric(s, location).await?;
            let fabric = match (s.state(), lookup) {
                (_, FabricLookup::Found(fabric)) => fabric,
                (State::Deleted, _) => {
                    out.push(Resolved::Absent(format!("{}@{location}", vlan_label(item))));
                    continue;
                }
                (State::Merged, miss) => miss.required(location)?,
            };
            out.push(Resolved::Target(VlanTarget {
                spec: item.clone(),
                scope: Scope::One {
                    location: location.clone(),
                    fabric,
                },
            }));
        }
        Ok(out)
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &VlanTarget,
    ) -> Result<Option<Vec<ObservedVlan>>, CoreError> {
        let spec = &target.spec;
        let found: Vec<ObservedVlan> = match &target.scope {
            Scope::One { fabric, .. } => {
                let filter = Layer2Filter {
                    fabric_id: Some(&fabric.id),
                    vlan_name: Some(&spec.vlan_name),
                    vlan_id: Some(spec.vlan_id),
                };
                s.client
                    .get_layer2_virtual_networks(&filter)
                    .await?
                    .into_iter()
                    .filter(|r| Self::matches(spec, r))
                    .map(|record| ObservedVlan {
                        record,
                        is_zone: fabric.is_zone,
                    })
                    .collect()
            }
            Scope::All => {
                let filter = Layer2Filter {
                    fabric_id: None,
                    vlan_name: Some(&spec.vlan_name),
                    vlan_id: Some(spec.vlan_id),
                };
                let records: Vec<Layer2VirtualNetwork> = s
                    .client
                    .get_layer2_virtual_networks(&filter)
                    .await?
                    .into_iter()
                    .filter(|r| Self::matches(spec, r))
                    .collect();
                if records.is_empty() {
                    return Ok(None);
                }
                let zones: HashSet<String> = s
                    .client
                    .get_fabric_zones(None)
                    .await?
                    .into_iter()
                    .map(|z| z.id)
                    .collect();
                records
                    .into_iter()
                    .map(|record| ObservedVlan {
                        is_zone: zones.contains(&record.fabric_id),
                        record,
                    })
                    .collect()
            }
        };
        Ok((!found.is_empty()).then_some(found))
    }

    fn diff(
        &self,
        s: &Session<'_>,
        target: &VlanTarget,
        observed: Option<&Vec<ObservedVlan>>,
    ) -> Verdict<Layer2VirtualNetwork> {
        let Scope::One { fabric, .. } = &target.scope else {
            return Verdict::Equal;
        };
        match observed.and_then(|o| o.first()) {
            None => Verdict::Create(Self::create_payload(s, &target.spec, &fabric.id)),
            Some(current) if Self::drifted(s, &target.spec, &current.record) => {
                Verdict::Drifted(Self::update_payload(s, &target.spec, &current.record))
            }
            Some(_) => Verdict::Equal,
        }
    }

    fn batch_size(&self, s: &Session<'_>) -> usize {
        s.settings.fabric_vlan_batch_size
    }

    fn delete_rank(&self, target: &VlanTarget) -> i32 {
        match &target.scope {
            Scope::One { fabric, .. } if fabric.is_zone => 0,
            Scope::One { .. } => 1,
            Scope::All => 0,
        }
    }

    async fn create(&self, s: &Session<'_>, batch: &[Layer2VirtualNetwork]) -> Result<(), CoreError> {
        let handle = s.client.add_layer2_virtual_networks(batch).await?;
        s.wait("sda.add_layer2_virtual_networks", &handle).await?;
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[Layer2VirtualNetwork]) -> Result<(), CoreError> {
        let handle = s.client.update_layer2_virtual_networks(batch).await?;
        s.wait("sda.update_layer2_virtual_networks", &handle).await?;
        Ok(())
    }

    async fn delete(
        &self,
        s: &Session<'_>,
        _target: &VlanTarget,
        observed: &Vec<ObservedVlan>,
    ) -> Result<Removal, CoreError> {
        // Zone-scoped instances go before the fabric-site instances they live in.
        let mut ordered: Vec<&ObservedVlan> = observed.iter().collect();
        ordered.sort_by_key(|o| !o.is_zone);
        for instance in ordered {
            Self::delete_record(s, &instance.record).await?;
        }
        Ok(Removal::Deleted)
    }
}
