// Shared lookups: sites by hierarchy, fabric scopes, benign "not found".

use catc_api::types::site::Site;
use tracing::debug;

use crate::engine::session::Session;
use crate::error::CoreError;
use crate::model::{FabricSiteLocation, FabricType};

/// Controller answers that mean "nothing here" rather than a real failure.
const BENIGN_MARKERS: &[&str] = &[
    "Expecting value: line 1 column 1",
    "not iterable",
    "has no attribute",
];

/// Whether a lookup error only says the resource does not exist.
pub(crate) fn is_benign(err: &catc_api::Error) -> bool {
    if err.is_not_found() {
        return true;
    }
    match err {
        catc_api::Error::Api { message, .. } => {
            BENIGN_MARKERS.iter().any(|marker| message.contains(marker))
        }
        _ => false,
    }
}

/// Map benign lookup failures to `None`.
pub(crate) fn absent_if_benign<T>(result: Result<T, catc_api::Error>) -> Result<Option<T>, CoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_benign(&e) => {
            debug!(error = %e, "treating lookup failure as absent");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Find a site by its full `Global/...` hierarchy.
pub(crate) async fn site_by_hierarchy(
    s: &Session<'_>,
    hierarchy: &str,
) -> Result<Option<Site>, CoreError> {
    let hierarchy = hierarchy.trim_end_matches('/');
    let sites = if s.caps.site_design {
        absent_if_benign(s.client.get_sites(hierarchy, None).await)?
    } else {
        absent_if_benign(s.client.get_site(Some(hierarchy)).await)?
    };
    Ok(sites
        .unwrap_or_default()
        .into_iter()
        .find(|site| site.name_hierarchy.eq_ignore_ascii_case(hierarchy)))
}

/// A resolved fabric site or zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FabricScope {
    /// Fabric id (`fabricId` on the wire).
    pub id: String,
    pub site_id: String,
    pub is_zone: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FabricLookup {
    Found(FabricScope),
    /// The site itself does not exist.
    NoSite,
    /// The site exists but is not a fabric site (or zone) of the asked type.
    NotFabric,
}

impl FabricLookup {
    /// Turn a miss into the conflict message merged intent reports.
    pub fn required(self, location: &FabricSiteLocation) -> Result<FabricScope, CoreError> {
        match self {
            Self::Found(scope) => Ok(scope),
            Self::NoSite => Err(CoreError::conflict(format!(
                "site '{}' does not exist",
                location.site_name_hierarchy
            ))),
            Self::NotFabric => Err(CoreError::conflict(format!(
                "site '{}' is not a {}",
                location.site_name_hierarchy,
                match location.fabric_type {
                    FabricType::FabricSite => "fabric site",
                    FabricType::FabricZone => "fabric zone",
                }
            ))),
        }
    }
}

/// Resolve a location to its fabric id.
pub(crate) async fn resolve_fabric(
    s: &Session<'_>,
    location: &FabricSiteLocation,
) -> Result<FabricLookup, CoreError> {
    let Some(site) = site_by_hierarchy(s, &location.site_name_hierarchy).await? else {
        return Ok(FabricLookup::NoSite);
    };

    let scope = match location.fabric_type {
        FabricType::FabricSite => absent_if_benign(s.client.get_fabric_sites(Some(&site.id)).await)?
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|f| FabricScope {
                id: f.id,
                site_id: f.site_id,
                is_zone: false,
            }),
        FabricType::FabricZone => absent_if_benign(s.client.get_fabric_zones(Some(&site.id)).await)?
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|z| FabricScope {
                id: z.id,
                site_id: z.site_id,
                is_zone: true,
            }),
    };
    Ok(scope.map_or(FabricLookup::NotFabric, FabricLookup::Found))
}
