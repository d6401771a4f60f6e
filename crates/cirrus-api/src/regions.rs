// Region catalog endpoint
//
// Also serves as the crate's harmless liveness/credential probe: a
// successful `list_regions` proves the credentials are accepted.

use tracing::debug;

use crate::client::ComputeClient;
use crate::error::Error;
use crate::models::RegionsResponse;

impl ComputeClient {
    /// List all regions the control plane offers.
    ///
    /// `GET v1/regions`
    pub async fn list_regions(&self) -> Result<Vec<String>, Error> {
        debug!("listing regions");
        let resp: RegionsResponse = self.get("v1/regions").await?;
        Ok(resp.regions.into_iter().map(|r| r.region_name).collect())
    }
}
