// ── Resource registries ──
//
// CRUD-consistent local mirrors of the secondary remote resources.
// Key pairs and security groups (with the VPC list) are refreshed
// wholesale from the control plane on connect; images and instance
// types are user-curated lists that live in the persisted record.

mod images;
mod instance_types;
mod key_pairs;
mod security_groups;

pub use images::ImageRegistry;
pub use instance_types::InstanceTypeRegistry;
pub use key_pairs::{KeyPairDeleteReport, KeyPairRecord, KeyPairRegistry};
pub use security_groups::{SecurityGroupRecord, SecurityGroupRegistry, DEFAULT_GROUP};

use cirrus_api::ComputeClient;

use crate::error::RemoteError;
use crate::store::Store;

/// All four registries, owned together by the engine.
pub struct Registries {
    pub key_pairs: KeyPairRegistry,
    pub security_groups: SecurityGroupRegistry,
    pub images: ImageRegistry,
    pub instance_types: InstanceTypeRegistry,
}

impl Registries {
    pub(crate) fn new(store: Store) -> Self {
        Self {
            key_pairs: KeyPairRegistry::new(store.clone()),
            security_groups: SecurityGroupRegistry::new(),
            images: ImageRegistry::new(store.clone()),
            instance_types: InstanceTypeRegistry::new(store),
        }
    }

    /// Repopulate the remote-mirroring registries from the control
    /// plane. Runs as the connect sequence's capability stage.
    pub(crate) async fn refresh(&self, client: &ComputeClient) -> Result<(), RemoteError> {
        self.key_pairs.refresh(client).await?;
        self.security_groups.refresh(client).await?;
        Ok(())
    }

    /// Drop all cached remote state (disconnect). The curated lists in
    /// the persisted record are untouched.
    pub(crate) fn clear(&self) {
        self.key_pairs.clear();
        self.security_groups.clear();
    }
}
