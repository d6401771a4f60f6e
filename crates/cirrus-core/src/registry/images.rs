// ── Curated image registry ──
//
// A user-maintained allow-list, persisted in the user record. Image
// names are resolved lazily: an entry's name stays empty until a
// lookup succeeds, and per-image lookup failures are tolerated because
// an id valid in one region may simply not exist in another.

use tracing::debug;

use cirrus_api::ComputeClient;
use cirrus_config::ImageEntry;

use crate::error::{CreateError, DeleteError};
use crate::store::Store;

pub struct ImageRegistry {
    store: Store,
}

impl ImageRegistry {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// The curated list, in insertion order.
    pub fn list(&self) -> Vec<ImageEntry> {
        self.store.with(|d| d.images.clone())
    }

    /// Add an image id after validating it against the control plane,
    /// capturing the resolved name when the lookup succeeds.
    pub async fn add(&self, client: &ComputeClient, image_id: &str) -> Result<(), CreateError> {
        let image_id = image_id.trim().to_owned();
        if image_id.is_empty() {
            return Err(CreateError::EmptyName);
        }
        if self.store.with(|d| d.images.iter().any(|i| i.id == image_id)) {
            return Err(CreateError::DuplicateName(image_id));
        }

        let images = client
            .describe_images(std::slice::from_ref(&image_id))
            .await
            .map_err(|e| CreateError::Remote(e.into()))?;
        let name = images
            .into_iter()
            .find(|i| i.image_id == image_id)
            .map(|i| i.name)
            .unwrap_or_default();

        self.store.mutate(|d| {
            d.images.push(ImageEntry {
                id: image_id,
                name,
            });
        });
        Ok(())
    }

    /// Remove an image id from the curated list and persist.
    pub fn delete(&self, image_id: &str) -> Result<(), DeleteError> {
        let exists = self.store.with(|d| d.images.iter().any(|i| i.id == image_id));
        if !exists {
            return Err(DeleteError::NotFound(image_id.to_owned()));
        }
        self.store.mutate(|d| d.images.retain(|i| i.id != image_id));
        Ok(())
    }

    /// Attempt a remote name lookup for every entry whose name is still
    /// unresolved. Per-image failures are skipped; any resolved names
    /// are persisted in one save.
    pub async fn resolve_names(&self, client: &ComputeClient) {
        let unresolved: Vec<String> = self.store.with(|d| {
            d.images
                .iter()
                .filter(|i| i.name.is_empty())
                .map(|i| i.id.clone())
                .collect()
        });
        if unresolved.is_empty() {
            return;
        }

        let mut resolved: Vec<(String, String)> = Vec::new();
        for id in unresolved {
            match client.describe_images(std::slice::from_ref(&id)).await {
                Ok(images) => {
                    if let Some(img) = images.into_iter().find(|i| i.image_id == id) {
                        resolved.push((id, img.name));
                    }
                }
                // The image may not exist in this region.
                Err(e) => debug!(image = %id, error = %e, "name lookup failed, skipping"),
            }
        }

        if !resolved.is_empty() {
            self.store.mutate(|d| {
                for (id, name) in &resolved {
                    if let Some(entry) = d.images.iter_mut().find(|i| &i.id == id) {
                        entry.name = name.clone();
                    }
                }
            });
        }
    }
}
