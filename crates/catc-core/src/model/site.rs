// Site hierarchy desired records.

use std::path::PathBuf;

use catc_api::types::site::SiteType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaSpec {
    pub name: String,
    pub parent_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub name: String,
    pub parent_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorSpec {
    pub name: String,
    pub parent_name: String,
    #[serde(default)]
    pub rf_model: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub floor_number: Option<i32>,
    #[serde(default)]
    pub units_of_measure: Option<String>,
    #[serde(default)]
    pub upload_floor_image_path: Option<PathBuf>,
    #[serde(default)]
    pub force_upload_floor_image: bool,
}

/// One node of the site tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteSpec {
    Area(AreaSpec),
    Building(BuildingSpec),
    Floor(FloorSpec),
}

impl SiteSpec {
    pub fn site_type(&self) -> SiteType {
        match self {
            Self::Area(_) => SiteType::Area,
            Self::Building(_) => SiteType::Building,
            Self::Floor(_) => SiteType::Floor,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Area(a) => &a.name,
            Self::Building(b) => &b.name,
            Self::Floor(f) => &f.name,
        }
    }

    pub fn parent_name(&self) -> &str {
        match self {
            Self::Area(a) => &a.parent_name,
            Self::Building(b) => &b.parent_name,
            Self::Floor(f) => &f.parent_name,
        }
    }

    /// Full `Global/.../Name` path of this node.
    pub fn name_hierarchy(&self) -> String {
        format!("{}/{}", self.parent_name().trim_end_matches('/'), self.name())
    }
}
