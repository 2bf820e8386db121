// ITSM integration endpoints.

use reqwest::Method;

use crate::client::CatalystClient;
use crate::error::Error;
use crate::types::itsm::{ItsmInstance, ItsmInstancePage, ItsmInstanceSummary};
use crate::types::task::TaskHandle;

const INSTANCES: &str = "dna/intent/api/v1/integration-settings/instances/itsm";

impl CatalystClient {
    /// `GET /dna/intent/api/v1/integration-settings/itsm/instances`
    pub async fn get_all_itsm_instances(&self) -> Result<Vec<ItsmInstanceSummary>, Error> {
        let page: ItsmInstancePage = self
            .get(
                "itsm_integration.get_all_itsm_integration_settings",
                "dna/intent/api/v1/integration-settings/itsm/instances",
                &[],
            )
            .await?;
        Ok(page.data)
    }

    pub async fn get_itsm_instance(&self, id: &str) -> Result<ItsmInstance, Error> {
        self.get(
            "itsm_integration.get_itsm_integration_setting_by_id",
            &format!("{INSTANCES}/{id}"),
            &[],
        )
        .await
    }

    pub async fn create_itsm_instance(&self, body: &ItsmInstance) -> Result<TaskHandle, Error> {
        self.mutate(
            "itsm_integration.create_itsm_integration_setting",
            Method::POST,
            INSTANCES,
            &[],
            Some(body),
        )
        .await
    }

    /// The body must carry `Auth_Password`; the controller never echoes it.
    pub async fn update_itsm_instance(
        &self,
        id: &str,
        body: &ItsmInstance,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "itsm_integration.update_itsm_integration_setting",
            Method::PUT,
            &format!("{INSTANCES}/{id}"),
            &[],
            Some(body),
        )
        .await
    }

    pub async fn delete_itsm_instance(&self, id: &str) -> Result<TaskHandle, Error> {
        self.mutate::<()>(
            "itsm_integration.delete_itsm_integration_setting",
            Method::DELETE,
            &format!("{INSTANCES}/{id}"),
            &[],
            None,
        )
        .await
    }
}
