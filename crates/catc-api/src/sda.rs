// SDA endpoints: fabric scopes, layer-2/layer-3 virtual networks and
// anycast gateways.
//
// List endpoints accept filters as query parameters and return the
// matching records in a `response` array. Batch mutations take a JSON
// array and answer with a single task id for the whole batch.

use reqwest::Method;

use crate::client::CatalystClient;
use crate::error::Error;
use crate::types::Envelope;
use crate::types::sda::{
    AnycastFilter, AnycastGateway, FabricSite, FabricZone, Layer2Filter, Layer2VirtualNetwork,
    Layer3VirtualNetwork,
};
use crate::types::task::TaskHandle;

const FABRIC_SITES: &str = "dna/intent/api/v1/sda/fabricSites";
const FABRIC_ZONES: &str = "dna/intent/api/v1/sda/fabricZones";
const LAYER2: &str = "dna/intent/api/v1/sda/layer2VirtualNetworks";
const LAYER3: &str = "dna/intent/api/v1/sda/layer3VirtualNetworks";
const ANYCAST: &str = "dna/intent/api/v1/sda/anycastGateways";

fn site_filter(site_id: Option<&str>) -> Vec<(&'static str, String)> {
    site_id
        .map(|id| vec![("siteId", id.to_owned())])
        .unwrap_or_default()
}

impl CatalystClient {
    // ── Fabric scopes ────────────────────────────────────────────────

    /// `GET /dna/intent/api/v1/sda/fabricSites[?siteId=]`
    pub async fn get_fabric_sites(&self, site_id: Option<&str>) -> Result<Vec<FabricSite>, Error> {
        let params = site_filter(site_id);
        let env: Envelope<Vec<FabricSite>> = self
            .get("sda.get_fabric_sites", FABRIC_SITES, &params)
            .await?;
        Ok(env.response)
    }

    /// `GET /dna/intent/api/v1/sda/fabricZones[?siteId=]`
    pub async fn get_fabric_zones(&self, site_id: Option<&str>) -> Result<Vec<FabricZone>, Error> {
        let params = site_filter(site_id);
        let env: Envelope<Vec<FabricZone>> = self
            .get("sda.get_fabric_zones", FABRIC_ZONES, &params)
            .await?;
        Ok(env.response)
    }

    // ── Layer-2 virtual networks ─────────────────────────────────────

    pub async fn get_layer2_virtual_networks(
        &self,
        filter: &Layer2Filter<'_>,
    ) -> Result<Vec<Layer2VirtualNetwork>, Error> {
        let params = filter.params();
        let env: Envelope<Vec<Layer2VirtualNetwork>> = self
            .get("sda.get_layer2_virtual_networks", LAYER2, &params)
            .await?;
        Ok(env.response)
    }

    pub async fn add_layer2_virtual_networks(
        &self,
        batch: &[Layer2VirtualNetwork],
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "sda.add_layer2_virtual_networks",
            Method::POST,
            LAYER2,
            &[],
            Some(batch),
        )
        .await
    }

    /// Every record in `batch` must carry its controller `id`.
    pub async fn update_layer2_virtual_networks(
        &self,
        batch: &[Layer2VirtualNetwork],
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "sda.update_layer2_virtual_networks",
            Method::PUT,
            LAYER2,
            &[],
            Some(batch),
        )
        .await
    }

    /// `DELETE /dna/intent/api/v1/sda/layer2VirtualNetworks/{id}`
    pub async fn delete_layer2_virtual_network_by_id(
        &self,
        id: &str,
    ) -> Result<TaskHandle, Error> {
        self.mutate::<()>(
            "sda.delete_layer2_virtual_network_by_id",
            Method::DELETE,
            &format!("{LAYER2}/{id}"),
            &[],
            None,
        )
        .await
    }

    // ── Layer-3 virtual networks ─────────────────────────────────────

    /// `GET /dna/intent/api/v1/sda/layer3VirtualNetworks?virtualNetworkName=`
    pub async fn get_layer3_virtual_networks(
        &self,
        virtual_network_name: &str,
    ) -> Result<Vec<Layer3VirtualNetwork>, Error> {
        let env: Envelope<Vec<Layer3VirtualNetwork>> = self
            .get(
                "sda.get_layer3_virtual_networks",
                LAYER3,
                &[("virtualNetworkName", virtual_network_name.to_owned())],
            )
            .await?;
        Ok(env.response)
    }

    pub async fn add_layer3_virtual_networks(
        &self,
        batch: &[Layer3VirtualNetwork],
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "sda.add_layer3_virtual_networks",
            Method::POST,
            LAYER3,
            &[],
            Some(batch),
        )
        .await
    }

    pub async fn update_layer3_virtual_networks(
        &self,
        batch: &[Layer3VirtualNetwork],
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "sda.update_layer3_virtual_networks",
            Method::PUT,
            LAYER3,
            &[],
            Some(batch),
        )
        .await
    }

    /// `DELETE /dna/intent/api/v1/sda/layer3VirtualNetworks?virtualNetworkName=`
    pub async fn delete_layer3_virtual_network(
        &self,
        virtual_network_name: &str,
    ) -> Result<TaskHandle, Error> {
        self.mutate::<()>(
            "sda.delete_layer3_virtual_networks",
            Method::DELETE,
            LAYER3,
            &[("virtualNetworkName", virtual_network_name.to_owned())],
            None,
        )
        .await
    }

    // ── Anycast gateways ─────────────────────────────────────────────

    pub async fn get_anycast_gateways(
        &self,
        filter: &AnycastFilter<'_>,
    ) -> Result<Vec<AnycastGateway>, Error> {
        let params = filter.params();
        let env: Envelope<Vec<AnycastGateway>> = self
            .get("sda.get_anycast_gateways", ANYCAST, &params)
            .await?;
        Ok(env.response)
    }

    pub async fn add_anycast_gateways(
        &self,
        batch: &[AnycastGateway],
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "sda.add_anycast_gateways",
            Method::POST,
            ANYCAST,
            &[],
            Some(batch),
        )
        .await
    }

    pub async fn update_anycast_gateways(
        &self,
        batch: &[AnycastGateway],
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "sda.update_anycast_gateways",
            Method::PUT,
            ANYCAST,
            &[],
            Some(batch),
        )
        .await
    }

    /// `DELETE /dna/intent/api/v1/sda/anycastGateways/{id}`
    pub async fn delete_anycast_gateway_by_id(&self, id: &str) -> Result<TaskHandle, Error> {
        self.mutate::<()>(
            "sda.delete_anycast_gateway_by_id",
            Method::DELETE,
            &format!("{ANYCAST}/{id}"),
            &[],
            None,
        )
        .await
    }
}
