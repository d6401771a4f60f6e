// Key pair endpoints

use serde_json::json;
use tracing::debug;

use crate::client::ComputeClient;
use crate::error::Error;
use crate::models::{CreatedKeyPair, KeyPairsResponse};

impl ComputeClient {
    /// List key pair names registered in this region.
    ///
    /// `GET v1/key-pairs`
    pub async fn describe_key_pairs(&self) -> Result<Vec<String>, Error> {
        debug!("describing key pairs");
        let resp: KeyPairsResponse = self.get("v1/key-pairs").await?;
        Ok(resp.key_pairs.into_iter().map(|k| k.key_name).collect())
    }

    /// Create a key pair. The response carries the private key material,
    /// which the gateway never returns again.
    ///
    /// `POST v1/key-pairs`
    pub async fn create_key_pair(&self, name: &str) -> Result<CreatedKeyPair, Error> {
        debug!(name, "creating key pair");
        self.post("v1/key-pairs", &json!({ "keyName": name })).await
    }

    /// Delete a key pair by name.
    ///
    /// `DELETE v1/key-pairs/{name}`
    pub async fn delete_key_pair(&self, name: &str) -> Result<(), Error> {
        debug!(name, "deleting key pair");
        self.delete(&format!("v1/key-pairs/{name}")).await
    }
}
