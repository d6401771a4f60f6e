// ── Security group registry ──
//
// Also caches the region's VPC ids, since a VPC id is only ever needed
// when creating a group. The "default" group is the gateway's own and
// is protected from deletion before any remote call is made.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use cirrus_api::ComputeClient;

use crate::error::{CreateError, DeleteError};
use crate::error::RemoteError;

/// Reserved group name that can never be deleted.
pub const DEFAULT_GROUP: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupRecord {
    pub name: String,
    pub description: String,
    pub vpc_id: Option<String>,
}

pub struct SecurityGroupRegistry {
    cache: Mutex<Vec<SecurityGroupRecord>>,
    vpcs: Mutex<Vec<String>>,
}

impl SecurityGroupRegistry {
    pub(crate) fn new() -> Self {
        Self {
            cache: Mutex::new(Vec::new()),
            vpcs: Mutex::new(Vec::new()),
        }
    }

    pub fn list(&self) -> Vec<SecurityGroupRecord> {
        self.lock_cache().clone()
    }

    /// VPC ids available for group creation.
    pub fn vpcs(&self) -> Vec<String> {
        self.lock_vpcs().clone()
    }

    pub(crate) async fn refresh(&self, client: &ComputeClient) -> Result<(), RemoteError> {
        let groups = client.describe_security_groups().await?;
        let vpcs = client.describe_vpcs().await?;

        *self.lock_cache() = groups
            .into_iter()
            .map(|g| SecurityGroupRecord {
                name: g.group_name,
                description: g.description,
                vpc_id: g.vpc_id,
            })
            .collect();
        *self.lock_vpcs() = vpcs;
        Ok(())
    }

    pub(crate) fn clear(&self) {
        self.lock_cache().clear();
        self.lock_vpcs().clear();
    }

    /// Create a group. Name checks run against the local cache before
    /// any remote call; an empty `vpc_id` means "the default VPC".
    pub async fn create(
        &self,
        client: &ComputeClient,
        name: &str,
        description: &str,
        vpc_id: Option<&str>,
    ) -> Result<(), CreateError> {
        let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        if name.is_empty() {
            return Err(CreateError::EmptyName);
        }
        if self.lock_cache().iter().any(|g| g.name == name) {
            return Err(CreateError::DuplicateName(name));
        }

        let vpc_id = vpc_id.filter(|v| !v.is_empty());
        client
            .create_security_group(&name, description, vpc_id)
            .await
            .map_err(|e| CreateError::Remote(e.into()))?;

        self.lock_cache().push(SecurityGroupRecord {
            name,
            description: description.to_owned(),
            vpc_id: vpc_id.map(str::to_owned),
        });
        Ok(())
    }

    /// Delete a group remotely, then drop it from the cache.
    ///
    /// "default" short-circuits as Protected before any remote call.
    pub async fn delete(&self, client: &ComputeClient, name: &str) -> Result<(), DeleteError> {
        if name == DEFAULT_GROUP {
            return Err(DeleteError::Protected(name.to_owned()));
        }
        if !self.lock_cache().iter().any(|g| g.name == name) {
            return Err(DeleteError::NotFound(name.to_owned()));
        }

        client
            .delete_security_group(name)
            .await
            .map_err(|e| DeleteError::Remote(e.into()))?;

        self.lock_cache().retain(|g| g.name != name);
        debug!(group = %name, "security group deleted");
        Ok(())
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, Vec<SecurityGroupRecord>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_vpcs(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.vpcs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
