// Network settings endpoints.

use crate::client::CatalystClient;
use crate::error::Error;
use crate::types::Envelope;
use crate::types::network::IpSubpool;

impl CatalystClient {
    /// `GET /dna/intent/api/v1/reserve-ip-subpool?siteId=`
    ///
    /// Lists the IP pools reserved at a site.
    pub async fn retrieves_ip_address_subpools(
        &self,
        site_id: &str,
    ) -> Result<Vec<IpSubpool>, Error> {
        let env: Envelope<Vec<IpSubpool>> = self
            .get(
                "network_settings.retrieves_ip_address_subpools",
                "dna/intent/api/v1/reserve-ip-subpool",
                &[("siteId", site_id.to_owned())],
            )
            .await?;
        Ok(env.response)
    }
}
