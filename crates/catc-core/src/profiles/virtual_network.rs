// Layer-3 virtual networks.
//
// An anchored VN cannot be created with its anchor and subscribers in one
// request: it is created on the anchor fabric, then anchored, then extended
// to the remaining fabrics, re-reading the record between steps.

use catc_api::types::sda::{AnycastFilter, Layer3VirtualNetwork};
use tracing::info;

use super::{is_subset, union};
use crate::config::State;
use crate::engine::profile::{Profile, Removal, Resolved, Verdict};
use crate::engine::session::Session;
use crate::error::CoreError;
use crate::lookup::{FabricLookup, resolve_fabric};
use crate::model::{FabricSiteLocation, FabricType, ResourceKind, VirtualNetworkSpec};

pub(crate) struct VirtualNetworkProfile;

#[derive(Debug, Clone)]
pub(crate) struct VnTarget {
    pub name: String,
    /// Fabric ids the VN must reach (merged) or leave (deleted).
    pub fabric_ids: Vec<String>,
    pub anchor: Option<String>,
    /// Deleted intent with locations: detach from `fabric_ids` only.
    pub shrink: bool,
}

impl VirtualNetworkProfile {
    async fn fetch(s: &Session<'_>, name: &str) -> Result<Option<Layer3VirtualNetwork>, CoreError> {
        Ok(s.client
            .get_layer3_virtual_networks(name)
            .await?
            .into_iter()
            .find(|vn| vn.virtual_network_name == name))
    }

    async fn put(s: &Session<'_>, record: Layer3VirtualNetwork) -> Result<(), CoreError> {
        let handle = s.client.update_layer3_virtual_networks(&[record]).await?;
        s.wait("sda.update_layer3_virtual_networks", &handle).await?;
        Ok(())
    }

    /// Create on the anchor, anchor it, then extend to the other fabrics.
    async fn create_anchored(
        s: &Session<'_>,
        payload: &Layer3VirtualNetwork,
        anchor: &str,
    ) -> Result<(), CoreError> {
        let name = &payload.virtual_network_name;
        let seed = Layer3VirtualNetwork {
            id: None,
            virtual_network_name: name.clone(),
            fabric_ids: vec![anchor.to_owned()],
            anchored_site_id: None,
        };
        let handle = s.client.add_layer3_virtual_networks(&[seed]).await?;
        s.wait("sda.add_layer3_virtual_networks", &handle).await?;

        let mut current = Self::fetch(s, name).await?.ok_or_else(|| CoreError::Lookup {
            message: format!("virtual network '{name}' not found after create"),
        })?;
        current.anchored_site_id = Some(anchor.to_owned());
        Self::put(s, current.clone()).await?;
        info!(vn = %name, %anchor, "virtual network anchored");

        if payload.fabric_ids.iter().any(|id| id != anchor) {
            let mut current = Self::fetch(s, name).await?.unwrap_or(current);
            current.fabric_ids = union(&current.fabric_ids, &payload.fabric_ids);
            current.anchored_site_id = Some(anchor.to_owned());
            Self::put(s, current).await?;
        }
        Ok(())
    }

    async fn gateway_count(s: &Session<'_>, name: &str) -> Result<usize, CoreError> {
        let filter = AnycastFilter {
            virtual_network_name: Some(name),
            ..Default::default()
        };
        Ok(s.client
            .get_anycast_gateways(&filter)
            .await?
            .iter()
            .filter(|g| g.virtual_network_name == name)
            .count())
    }

    async fn shrink(
        s: &Session<'_>,
        target: &VnTarget,
        observed: &Layer3VirtualNetwork,
    ) -> Result<Removal, CoreError> {
        if !observed.fabric_ids.iter().any(|id| target.fabric_ids.contains(id)) {
            return Ok(Removal::AlreadyAbsent);
        }
        let remaining: Vec<String> = observed
            .fabric_ids
            .iter()
            .filter(|id| !target.fabric_ids.contains(id))
            .cloned()
            .collect();
        let mut record = observed.clone();
        if let Some(anchor) = &observed.anchored_site_id {
            if target.fabric_ids.contains(anchor) {
                if !remaining.is_empty() {
                    return Err(CoreError::conflict(format!(
                        "cannot remove the anchor fabric of virtual network '{}' while {} other fabric(s) still use it",
                        target.name,
                        remaining.len()
                    )));
                }
                record.anchored_site_id = None;
            }
        }
        record.fabric_ids = remaining;
        Self::put(s, record).await?;
        Ok(Removal::Deleted)
    }
}

async fn location_ids(
    s: &Session<'_>,
    locations: &[FabricSiteLocation],
) -> Result<Vec<String>, CoreError> {
    let mut ids = Vec::with_capacity(locations.len());
    for location in locations {
        match (s.state(), resolve_fabric(s, location).await?) {
            (_, FabricLookup::Found(fabric)) => ids.push(fabric.id),
            (State::Deleted, _) => {}
            (State::Merged, miss) => {
                miss.required(location)?;
            }
        }
    }
    Ok(ids)
}

impl Profile for VirtualNetworkProfile {
    type Item = VirtualNetworkSpec;
    type Target = VnTarget;
    type Observed = Layer3VirtualNetwork;
    type Payload = Layer3VirtualNetwork;

    fn kind(&self) -> ResourceKind {
        ResourceKind::VirtualNetwork
    }

    fn item_label(&self, item: &VirtualNetworkSpec) -> String {
        item.vn_name.clone()
    }

    fn label(&self, target: &VnTarget) -> String {
        target.name.clone()
    }

    async fn resolve(
        &self,
        s: &Session<'_>,
        item: &VirtualNetworkSpec,
    ) -> Result<Vec<Resolved<VnTarget>>, CoreError> {
        let mut fabric_ids = location_ids(s, &item.fabric_site_locations).await?;

        let anchor = match (&item.anchored_site_name, s.state()) {
            (Some(site), State::Merged) => {
                let location = FabricSiteLocation {
                    site_name_hierarchy: site.clone(),
                    fabric_type: FabricType::FabricSite,
                };
                let anchor = resolve_fabric(s, &location).await?.required(&location)?.id;
                if !fabric_ids.contains(&anchor) {
                    fabric_ids.insert(0, anchor.clone());
                }
                Some(anchor)
            }
            _ => None,
        };

        let shrink = s.state() == State::Deleted && !item.fabric_site_locations.is_empty();
        if shrink && fabric_ids.is_empty() {
            return Ok(vec![Resolved::Absent(item.vn_name.clone())]);
        }

        Ok(vec![Resolved::Target(VnTarget {
            name: item.vn_name.clone(),
            fabric_ids,
            anchor,
            shrink,
        })])
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &VnTarget,
    ) -> Result<Option<Layer3VirtualNetwork>, CoreError> {
        Self::fetch(s, &target.name).await
    }

    fn diff(
        &self,
        _s: &Session<'_>,
        target: &VnTarget,
        observed: Option<&Layer3VirtualNetwork>,
    ) -> Verdict<Layer3VirtualNetwork> {
        let Some(current) = observed else {
            return Verdict::Create(Layer3VirtualNetwork {
                id: None,
                virtual_network_name: target.name.clone(),
                fabric_ids: target.fabric_ids.clone(),
                anchored_site_id: target.anchor.clone(),
            });
        };

        let missing_fabric = !is_subset(&target.fabric_ids, &current.fabric_ids);
        let anchor_differs = target
            .anchor
            .as_ref()
            .is_some_and(|a| current.anchored_site_id.as_ref() != Some(a));
        if !missing_fabric && !anchor_differs {
            return Verdict::Equal;
        }

        Verdict::Drifted(Layer3VirtualNetwork {
            id: current.id.clone(),
            virtual_network_name: target.name.clone(),
            fabric_ids: union(&current.fabric_ids, &target.fabric_ids),
            anchored_site_id: target
                .anchor
                .clone()
                .or_else(|| current.anchored_site_id.clone()),
        })
    }

    async fn create(&self, s: &Session<'_>, batch: &[Layer3VirtualNetwork]) -> Result<(), CoreError> {
        for payload in batch {
            match &payload.anchored_site_id {
                Some(anchor) => Self::create_anchored(s, payload, anchor).await?,
                None => {
                    let handle = s.client.add_layer3_virtual_networks(&[payload.clone()]).await?;
                    s.wait("sda.add_layer3_virtual_networks", &handle).await?;
                }
            }
        }
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[Layer3VirtualNetwork]) -> Result<(), CoreError> {
        let handle = s.client.update_layer3_virtual_networks(batch).await?;
        s.wait("sda.update_layer3_virtual_networks", &handle).await?;
        Ok(())
    }

    async fn delete(
        &self,
        s: &Session<'_>,
        target: &VnTarget,
        observed: &Layer3VirtualNetwork,
    ) -> Result<Removal, CoreError> {
        if target.shrink {
            return Self::shrink(s, target, observed).await;
        }

        let gateways = Self::gateway_count(s, &target.name).await?;
        if gateways > 0 {
            return Err(CoreError::conflict(format!(
                "virtual network '{}' still has {gateways} anycast gateway(s); delete them first",
                target.name
            )));
        }

        if let Some(anchor) = &observed.anchored_site_id {
            if observed.fabric_ids.iter().any(|id| id != anchor) {
                let mut record = observed.clone();
                record.fabric_ids = vec![anchor.clone()];
                Self::put(s, record).await?;
                info!(vn = %target.name, "detached subscriber fabrics before delete");
            }
        }

        let handle = s.client.delete_layer3_virtual_network(&target.name).await?;
        s.wait("sda.delete_layer3_virtual_networks", &handle).await?;
        Ok(Removal::Deleted)
    }

    fn verify_absent(&self, target: &VnTarget, observed: Option<&Layer3VirtualNetwork>) -> bool {
        match observed {
            None => true,
            Some(current) if target.shrink => {
                !current.fabric_ids.iter().any(|id| target.fabric_ids.contains(id))
            }
            Some(_) => false,
        }
    }
}
