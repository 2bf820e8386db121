// Site hierarchy types for both controller API generations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Node kind in the site hierarchy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SiteType {
    Global,
    Area,
    Building,
    Floor,
}

/// A site as returned by `GET /dna/intent/api/v1/sites` (new generation).
///
/// Legacy `GET /site` records are converted into this shape so the rest of
/// the workspace deals with one representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_hierarchy: String,
    #[serde(rename = "type", default)]
    pub site_type: Option<SiteType>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub floor_number: Option<i32>,
    #[serde(default)]
    pub rf_model: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub units_of_measure: Option<String>,
}

/// One entry of the `POST /dna/intent/api/v1/sites/bulk` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSite {
    #[serde(rename = "type")]
    pub site_type: Option<SiteType>,
    pub name: String,
    pub parent_name_hierarchy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rf_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_of_measure: Option<String>,
}

/// Body of the per-kind area/building/floor endpoints (new generation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteNodePayload {
    pub name: String,
    pub parent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rf_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_of_measure: Option<String>,
}

// ── Legacy generation ────────────────────────────────────────────────

/// A site as returned by the legacy `GET /dna/intent/api/v1/site`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySite {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub site_name_hierarchy: String,
    #[serde(default)]
    pub additional_info: Vec<Value>,
}

impl LegacySite {
    /// Look up `attributes.{key}` inside the `additionalInfo` entry whose
    /// `nameSpace` is `namespace`.
    pub fn attribute(&self, namespace: &str, key: &str) -> Option<&str> {
        self.additional_info
            .iter()
            .find(|info| info.get("nameSpace").and_then(Value::as_str) == Some(namespace))
            .and_then(|info| info.get("attributes"))
            .and_then(|attrs| attrs.get(key))
            .and_then(Value::as_str)
    }
}

impl From<LegacySite> for Site {
    fn from(legacy: LegacySite) -> Self {
        let float = |ns: &str, key: &str| legacy.attribute(ns, key).and_then(|v| v.parse().ok());
        let site_type = legacy
            .attribute("Location", "type")
            .and_then(|t| t.parse().ok())
            .or_else(|| {
                if legacy.site_name_hierarchy == "Global" {
                    Some(SiteType::Global)
                } else {
                    None
                }
            });

        Self {
            site_type,
            address: legacy.attribute("Location", "address").map(str::to_owned),
            latitude: float("Location", "latitude"),
            longitude: float("Location", "longitude"),
            country: legacy.attribute("Location", "country").map(str::to_owned),
            floor_number: legacy
                .attribute("mapsSummary", "floorIndex")
                .and_then(|v| v.parse().ok()),
            rf_model: legacy.attribute("mapsSummary", "rfModel").map(str::to_owned),
            width: float("mapGeometry", "width"),
            length: float("mapGeometry", "length"),
            height: float("mapGeometry", "height"),
            units_of_measure: None,
            id: legacy.id,
            name: legacy.name,
            name_hierarchy: legacy.site_name_hierarchy,
            parent_id: legacy.parent_id,
        }
    }
}

/// Body of the legacy `POST /site` and `PUT /site/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySitePayload {
    #[serde(rename = "type")]
    pub site_type: SiteType,
    pub site: LegacySiteBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacySiteBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<LegacyArea>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building: Option<LegacyBuilding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<LegacyFloor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyArea {
    pub name: String,
    pub parent_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyBuilding {
    pub name: String,
    pub parent_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyFloor {
    pub name: String,
    pub parent_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rf_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_number: Option<i32>,
}
