// Site hierarchy endpoints
//
// Two API generations coexist. The legacy `sites` family (`/site`) answers
// with business-API execution handles; the `site_design` family (`/sites`,
// `/areas`, `/buildings`, `/floors`) answers with task ids and adds bulk
// creation and floor image upload.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::client::CatalystClient;
use crate::error::Error;
use crate::types::Envelope;
use crate::types::site::{BulkSite, LegacySite, LegacySitePayload, Site, SiteNodePayload, SiteType};
use crate::types::task::TaskHandle;

impl CatalystClient {
    // ── Legacy generation ────────────────────────────────────────────

    /// `GET /dna/intent/api/v1/site[?name={hierarchy}]`
    ///
    /// Without a name the whole hierarchy is listed. Older controllers
    /// answer an unknown name with an error body rather than an empty list;
    /// callers decide whether that means "absent".
    pub async fn get_site(&self, name_hierarchy: Option<&str>) -> Result<Vec<Site>, Error> {
        let params: Vec<(&str, String)> = name_hierarchy
            .map(|name| vec![("name", name.to_owned())])
            .unwrap_or_default();
        let env: Envelope<Vec<LegacySite>> = self
            .get("sites.get_site", "dna/intent/api/v1/site", &params)
            .await?;
        Ok(env.response.into_iter().map(Site::from).collect())
    }

    /// `POST /dna/intent/api/v1/site`
    pub async fn create_site(&self, payload: &LegacySitePayload) -> Result<TaskHandle, Error> {
        self.mutate(
            "sites.create_site",
            Method::POST,
            "dna/intent/api/v1/site",
            &[],
            Some(payload),
        )
        .await
    }

    /// `PUT /dna/intent/api/v1/site/{id}`
    pub async fn update_site(
        &self,
        site_id: &str,
        payload: &LegacySitePayload,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "sites.update_site",
            Method::PUT,
            &format!("dna/intent/api/v1/site/{site_id}"),
            &[],
            Some(payload),
        )
        .await
    }

    /// `DELETE /dna/intent/api/v1/site/{id}`
    pub async fn delete_site(&self, site_id: &str) -> Result<TaskHandle, Error> {
        self.mutate::<()>(
            "sites.delete_site",
            Method::DELETE,
            &format!("dna/intent/api/v1/site/{site_id}"),
            &[],
            None,
        )
        .await
    }

    // ── New generation ───────────────────────────────────────────────

    /// `GET /dna/intent/api/v1/sites?nameHierarchy=&type=`
    ///
    /// `name_hierarchy` is matched by the controller as a regular
    /// expression, so `Global/USA/.*` lists every descendant.
    pub async fn get_sites(
        &self,
        name_hierarchy: &str,
        site_type: Option<SiteType>,
    ) -> Result<Vec<Site>, Error> {
        let mut params = vec![("nameHierarchy", name_hierarchy.to_owned())];
        if let Some(site_type) = site_type {
            params.push(("type", site_type.to_string()));
        }
        let env: Envelope<Vec<Site>> = self
            .get("site_design.get_sites", "dna/intent/api/v1/sites", &params)
            .await?;
        Ok(env.response)
    }

    /// `POST /dna/intent/api/v1/sites/bulk`
    pub async fn create_sites(&self, sites: &[BulkSite]) -> Result<TaskHandle, Error> {
        self.mutate(
            "site_design.create_sites",
            Method::POST,
            "dna/intent/api/v1/sites/bulk",
            &[],
            Some(sites),
        )
        .await
    }

    /// Update one area, building or floor.
    pub async fn update_site_node(
        &self,
        site_type: SiteType,
        site_id: &str,
        payload: &SiteNodePayload,
    ) -> Result<TaskHandle, Error> {
        let (operation, path) = node_path(site_type, site_id, "updates");
        self.mutate(operation, Method::PUT, &path, &[], Some(payload))
            .await
    }

    /// Delete one area, building or floor.
    pub async fn delete_site_node(
        &self,
        site_type: SiteType,
        site_id: &str,
    ) -> Result<TaskHandle, Error> {
        let (operation, path) = node_path(site_type, site_id, "deletes");
        self.mutate::<()>(operation, Method::DELETE, &path, &[], None)
            .await
    }

    /// `POST /dna/intent/api/v2/floors/{id}/uploadImage` (multipart, part `image`).
    pub async fn upload_floor_image(
        &self,
        floor_id: &str,
        image_path: &Path,
    ) -> Result<TaskHandle, Error> {
        let bytes = tokio::fs::read(image_path).await.map_err(|source| Error::File {
            path: image_path.display().to_string(),
            source,
        })?;
        let file_name = image_path
            .file_name()
            .map_or_else(|| "floor".to_owned(), |n| n.to_string_lossy().into_owned());
        let mime = image_content_type(image_path);
        debug!(floor_id, file_name, mime, size = bytes.len(), "uploading floor image");

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)?;
        let form = Form::new().part("image", part);

        self.upload(
            "site_design.upload_floor_image",
            &format!("dna/intent/api/v2/floors/{floor_id}/uploadImage"),
            form,
        )
        .await
    }
}

fn node_path(site_type: SiteType, site_id: &str, verb: &str) -> (&'static str, String) {
    match (site_type, verb) {
        (SiteType::Building, "updates") => (
            "site_design.updates_a_building",
            format!("dna/intent/api/v2/buildings/{site_id}"),
        ),
        (SiteType::Building, _) => (
            "site_design.deletes_a_building",
            format!("dna/intent/api/v2/buildings/{site_id}"),
        ),
        (SiteType::Floor, "updates") => (
            "site_design.updates_a_floor",
            format!("dna/intent/api/v2/floors/{site_id}"),
        ),
        (SiteType::Floor, _) => (
            "site_design.deletes_a_floor",
            format!("dna/intent/api/v2/floors/{site_id}"),
        ),
        (_, "updates") => (
            "site_design.updates_an_area",
            format!("dna/intent/api/v1/areas/{site_id}"),
        ),
        (_, _) => (
            "site_design.deletes_an_area",
            format!("dna/intent/api/v1/areas/{site_id}"),
        ),
    }
}

/// Content type for a floor image, from its extension.
pub fn image_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
