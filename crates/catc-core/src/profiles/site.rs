// Site hierarchy: areas, buildings and floors.
//
// Controllers from 2.3.7.6 on take one bulk create for the whole tree and
// per-kind update/delete endpoints; older releases take one legacy request
// per node. Either way parents are created before children and deleted
// after them.

use std::path::Path;

use catc_api::types::site::{
    BulkSite, LegacyArea, LegacyBuilding, LegacyFloor, LegacySiteBody, LegacySitePayload, Site,
    SiteNodePayload, SiteType,
};
use tracing::{debug, info};

use super::{drifts, drifts_ignore_case};
use crate::engine::profile::{Profile, Removal, Resolved, Verdict};
use crate::engine::session::Session;
use crate::error::CoreError;
use crate::lookup::{absent_if_benign, site_by_hierarchy};
use crate::model::{BuildingSpec, FloorSpec, ResourceKind, SiteSpec};

pub(crate) struct SiteProfile;

#[derive(Debug, Clone)]
pub(crate) struct SiteTarget {
    pub spec: SiteSpec,
    pub hierarchy: String,
}

#[derive(Debug, Clone)]
pub(crate) struct SitePayload {
    pub spec: SiteSpec,
    pub hierarchy: String,
    /// Present for updates.
    pub current: Option<Site>,
    /// False when only a forced floor image upload is due.
    pub fields_changed: bool,
}

fn depth(hierarchy: &str) -> usize {
    hierarchy.split('/').count()
}

fn type_order(site_type: SiteType) -> usize {
    match site_type {
        SiteType::Global => 0,
        SiteType::Area => 1,
        SiteType::Building => 2,
        SiteType::Floor => 3,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Coordinates and dimensions compare at two decimal places.
fn float_drifts(desired: Option<f64>, observed: Option<f64>) -> bool {
    desired.is_some_and(|d| observed.is_none_or(|o| (round2(d) - round2(o)).abs() > 1e-9))
}

fn building_drifts(spec: &BuildingSpec, current: &Site) -> bool {
    drifts(spec.address.as_deref(), current.address.as_deref())
        || float_drifts(spec.latitude, current.latitude)
        || float_drifts(spec.longitude, current.longitude)
        || drifts(spec.country.as_deref(), current.country.as_deref())
}

fn floor_drifts(spec: &FloorSpec, current: &Site) -> bool {
    drifts(spec.rf_model.as_deref(), current.rf_model.as_deref())
        || float_drifts(spec.width, current.width)
        || float_drifts(spec.length, current.length)
        || float_drifts(spec.height, current.height)
        || drifts(spec.floor_number.as_ref(), current.floor_number.as_ref())
        || drifts_ignore_case(
            spec.units_of_measure.as_deref(),
            current.units_of_measure.as_deref(),
        )
}

fn fields_drift(spec: &SiteSpec, current: &Site) -> bool {
    match spec {
        SiteSpec::Area(_) => false,
        SiteSpec::Building(b) => building_drifts(b, current),
        SiteSpec::Floor(f) => floor_drifts(f, current),
    }
}

fn forced_image(spec: &SiteSpec) -> Option<&Path> {
    match spec {
        SiteSpec::Floor(f) if f.force_upload_floor_image => f.upload_floor_image_path.as_deref(),
        _ => None,
    }
}

// ── Wire payloads ────────────────────────────────────────────────────

fn bulk_site(spec: &SiteSpec) -> BulkSite {
    let mut site = BulkSite {
        site_type: Some(spec.site_type()),
        name: spec.name().to_owned(),
        parent_name_hierarchy: spec.parent_name().trim_end_matches('/').to_owned(),
        ..Default::default()
    };
    match spec {
        SiteSpec::Area(_) => {}
        SiteSpec::Building(b) => {
            site.address.clone_from(&b.address);
            site.latitude = b.latitude;
            site.longitude = b.longitude;
            site.country.clone_from(&b.country);
        }
        SiteSpec::Floor(f) => {
            site.rf_model.clone_from(&f.rf_model);
            site.width = f.width;
            site.length = f.length;
            site.height = f.height;
            site.floor_number = f.floor_number;
            site.units_of_measure.clone_from(&f.units_of_measure);
        }
    }
    site
}

/// Per-node update body: the observed record with desired fields laid over.
fn node_payload(spec: &SiteSpec, current: &Site) -> SiteNodePayload {
    let mut node = SiteNodePayload {
        name: spec.name().to_owned(),
        parent_id: current.parent_id.clone().unwrap_or_default(),
        ..Default::default()
    };
    match spec {
        SiteSpec::Area(_) => {}
        SiteSpec::Building(b) => {
            node.address = b.address.clone().or_else(|| current.address.clone());
            node.latitude = b.latitude.or(current.latitude);
            node.longitude = b.longitude.or(current.longitude);
            node.country = b.country.clone().or_else(|| current.country.clone());
        }
        SiteSpec::Floor(f) => {
            node.rf_model = f.rf_model.clone().or_else(|| current.rf_model.clone());
            node.width = f.width.or(current.width);
            node.length = f.length.or(current.length);
            node.height = f.height.or(current.height);
            node.floor_number = f.floor_number.or(current.floor_number);
            node.units_of_measure = f
                .units_of_measure
                .clone()
                .or_else(|| current.units_of_measure.clone());
        }
    }
    node
}

fn legacy_payload(spec: &SiteSpec) -> LegacySitePayload {
    let parent_name = spec.parent_name().trim_end_matches('/').to_owned();
    let name = spec.name().to_owned();
    let site = match spec {
        SiteSpec::Area(_) => LegacySiteBody {
            area: Some(LegacyArea { name, parent_name }),
            ..Default::default()
        },
        SiteSpec::Building(b) => LegacySiteBody {
            building: Some(LegacyBuilding {
                name,
                parent_name,
                address: b.address.clone(),
                latitude: b.latitude,
                longitude: b.longitude,
                country: b.country.clone(),
            }),
            ..Default::default()
        },
        SiteSpec::Floor(f) => LegacySiteBody {
            floor: Some(LegacyFloor {
                name,
                parent_name,
                rf_model: f.rf_model.clone(),
                width: f.width,
                length: f.length,
                height: f.height,
                floor_number: f.floor_number,
            }),
            ..Default::default()
        },
    };
    LegacySitePayload {
        site_type: spec.site_type(),
        site,
    }
}

impl SiteProfile {
    async fn upload_image(s: &Session<'_>, floor_id: &str, image: &Path) -> Result<(), CoreError> {
        let handle = s.client.upload_floor_image(floor_id, image).await?;
        s.wait("site_design.upload_floor_image", &handle).await?;
        info!(floor_id, image = %image.display(), "floor image uploaded");
        Ok(())
    }

    /// Every observed node below `hierarchy`, deepest first.
    async fn descendants(s: &Session<'_>, hierarchy: &str) -> Result<Vec<Site>, CoreError> {
        let prefix = format!("{hierarchy}/");
        let listed = if s.caps.site_design {
            absent_if_benign(s.client.get_sites(&format!("{hierarchy}/.*"), None).await)?
        } else {
            absent_if_benign(s.client.get_site(None).await)?
        };
        let mut below: Vec<Site> = listed
            .unwrap_or_default()
            .into_iter()
            .filter(|site| site.name_hierarchy.starts_with(&prefix))
            .collect();
        below.sort_by_key(|site| std::cmp::Reverse(depth(&site.name_hierarchy)));
        Ok(below)
    }

    async fn delete_node(s: &Session<'_>, site: &Site) -> Result<(), CoreError> {
        if s.caps.site_design {
            let site_type = site.site_type.unwrap_or(SiteType::Area);
            let handle = s.client.delete_site_node(site_type, &site.id).await?;
            s.wait("site_design.delete_site", &handle).await?;
        } else {
            let handle = s.client.delete_site(&site.id).await?;
            s.wait("sites.delete_site", &handle).await?;
        }
        info!(site = %site.name_hierarchy, "site deleted");
        Ok(())
    }
}

impl Profile for SiteProfile {
    type Item = SiteSpec;
    type Target = SiteTarget;
    type Observed = Site;
    type Payload = SitePayload;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Site
    }

    fn item_label(&self, item: &SiteSpec) -> String {
        item.name_hierarchy()
    }

    fn label(&self, target: &SiteTarget) -> String {
        target.hierarchy.clone()
    }

    async fn resolve(
        &self,
        _s: &Session<'_>,
        item: &SiteSpec,
    ) -> Result<Vec<Resolved<SiteTarget>>, CoreError> {
        Ok(vec![Resolved::Target(SiteTarget {
            spec: item.clone(),
            hierarchy: item.name_hierarchy(),
        })])
    }

    async fn observe(&self, s: &Session<'_>, target: &SiteTarget) -> Result<Option<Site>, CoreError> {
        site_by_hierarchy(s, &target.hierarchy).await
    }

    fn diff(&self, _s: &Session<'_>, target: &SiteTarget, observed: Option<&Site>) -> Verdict<SitePayload> {
        let payload = |current: Option<&Site>, fields_changed| SitePayload {
            spec: target.spec.clone(),
            hierarchy: target.hierarchy.clone(),
            current: current.cloned(),
            fields_changed,
        };
        match observed {
            None => Verdict::Create(payload(None, true)),
            Some(current) => {
                let changed = fields_drift(&target.spec, current);
                if changed || forced_image(&target.spec).is_some() {
                    Verdict::Drifted(payload(Some(current), changed))
                } else {
                    Verdict::Equal
                }
            }
        }
    }

    fn converged(&self, _s: &Session<'_>, target: &SiteTarget, observed: Option<&Site>) -> bool {
        observed.is_some_and(|current| !fields_drift(&target.spec, current))
    }

    /// One bulk request carries every create on the site-design surface.
    fn batch_size(&self, s: &Session<'_>) -> usize {
        if s.caps.site_design { usize::MAX } else { 1 }
    }

    /// Updates always go one node at a time.
    fn update_batch_size(&self, _s: &Session<'_>) -> usize {
        1
    }

    fn create_rank(&self, payload: &SitePayload) -> i32 {
        let rank = depth(&payload.hierarchy) * 10 + type_order(payload.spec.site_type());
        i32::try_from(rank).unwrap_or(i32::MAX)
    }

    fn delete_rank(&self, target: &SiteTarget) -> i32 {
        -i32::try_from(depth(&target.hierarchy)).unwrap_or(i32::MAX)
    }

    async fn create(&self, s: &Session<'_>, batch: &[SitePayload]) -> Result<(), CoreError> {
        if !s.caps.site_design {
            for payload in batch {
                let handle = s.client.create_site(&legacy_payload(&payload.spec)).await?;
                s.wait("sites.create_site", &handle).await?;
            }
            return Ok(());
        }

        let bulk: Vec<BulkSite> = batch.iter().map(|p| bulk_site(&p.spec)).collect();
        let handle = s.client.create_sites(&bulk).await?;
        s.wait("site_design.create_sites", &handle).await?;
        Ok(())
    }

    async fn after_create(&self, s: &Session<'_>, payload: &SitePayload) -> Result<(), CoreError> {
        let SiteSpec::Floor(floor) = &payload.spec else {
            return Ok(());
        };
        let Some(image) = floor.upload_floor_image_path.as_deref() else {
            return Ok(());
        };
        let created = site_by_hierarchy(s, &payload.hierarchy).await?.ok_or_else(|| {
            CoreError::Lookup {
                message: format!("floor '{}' not found after create", payload.hierarchy),
            }
        })?;
        Self::upload_image(s, &created.id, image).await
    }

    async fn update(&self, s: &Session<'_>, batch: &[SitePayload]) -> Result<(), CoreError> {
        for payload in batch {
            let Some(current) = &payload.current else {
                continue;
            };
            if payload.fields_changed {
                if s.caps.site_design {
                    let node = node_payload(&payload.spec, current);
                    let handle = s
                        .client
                        .update_site_node(payload.spec.site_type(), &current.id, &node)
                        .await?;
                    s.wait("site_design.update_site", &handle).await?;
                } else {
                    let handle = s
                        .client
                        .update_site(&current.id, &legacy_payload(&payload.spec))
                        .await?;
                    s.wait("sites.update_site", &handle).await?;
                }
            } else {
                debug!(site = %payload.hierarchy, "fields unchanged; forced image upload only");
            }
            if let Some(image) = forced_image(&payload.spec) {
                Self::upload_image(s, &current.id, image).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, s: &Session<'_>, target: &SiteTarget, observed: &Site) -> Result<Removal, CoreError> {
        for child in Self::descendants(s, &target.hierarchy).await? {
            Self::delete_node(s, &child).await?;
        }
        Self::delete_node(s, observed).await?;
        Ok(Removal::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AreaSpec;

    #[test]
    fn floats_compare_at_two_decimals() {
        assert!(!float_drifts(Some(37.3382), Some(37.338_19)));
        assert!(float_drifts(Some(37.33), Some(37.35)));
        assert!(float_drifts(Some(1.0), None));
        assert!(!float_drifts(None, Some(1.0)));
    }

    #[test]
    fn parents_rank_before_children() {
        let profile = SiteProfile;
        let payload = |spec: SiteSpec| SitePayload {
            hierarchy: spec.name_hierarchy(),
            spec,
            current: None,
            fields_changed: true,
        };
        let area = payload(SiteSpec::Area(AreaSpec {
            name: "USA".into(),
            parent_name: "Global".into(),
        }));
        let building = payload(SiteSpec::Building(BuildingSpec {
            name: "HQ".into(),
            parent_name: "Global/USA".into(),
            ..Default::default()
        }));
        let floor = payload(SiteSpec::Floor(FloorSpec {
            name: "F1".into(),
            parent_name: "Global/USA/HQ".into(),
            ..Default::default()
        }));
        assert!(profile.create_rank(&area) < profile.create_rank(&building));
        assert!(profile.create_rank(&building) < profile.create_rank(&floor));

        let target = |p: &SitePayload| SiteTarget {
            spec: p.spec.clone(),
            hierarchy: p.hierarchy.clone(),
        };
        assert!(profile.delete_rank(&target(&floor)) < profile.delete_rank(&target(&area)));
    }
}
