// Machine image endpoints

use tracing::debug;

use crate::client::ComputeClient;
use crate::error::Error;
use crate::models::{ApiImage, ImagesResponse};

impl ComputeClient {
    /// Look up images by id.
    ///
    /// Images are region-scoped: an id that resolves in one region may
    /// return a structured `Remote` error in another.
    ///
    /// `GET v1/images?imageId=...`
    pub async fn describe_images(&self, image_ids: &[String]) -> Result<Vec<ApiImage>, Error> {
        debug!(?image_ids, "describing images");
        let params: Vec<(&str, String)> = image_ids
            .iter()
            .map(|id| ("imageId", id.clone()))
            .collect();
        let resp: ImagesResponse = self.get_with_params("v1/images", &params).await?;
        Ok(resp.images)
    }
}
