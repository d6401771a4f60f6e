// ── Instance actuator ──
//
// Lifecycle verbs and launch. Verbs map local cache indices to remote
// instance ids up front -- a bad index fails before any remote call --
// and issue one batched call per verb. The actuator never
// resynchronizes; callers poll afterwards.

use std::sync::Arc;

use tracing::{info, warn};

use cirrus_api::models::{RunInstancesRequest, Tag};
use cirrus_api::ComputeClient;

use crate::error::{ActError, LaunchError, RemoteError};
use crate::store::Store;
use crate::sync::InstanceStore;

/// Sentinel security-group choice meaning "no explicit group -- let the
/// gateway apply its default".
pub const RECOMMENDED_GROUP: &str = "Recommended";

/// A lifecycle verb applied to a batch of instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum InstanceVerb {
    Start,
    Stop,
    Reboot,
    Terminate,
}

/// Parameters for launching one instance.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Value for the Name tag applied after launch. May be empty.
    pub name_tag: String,
    pub image_id: String,
    pub instance_type: String,
    pub key_pair: String,
    /// A group name, or [`RECOMMENDED_GROUP`].
    pub security_group: String,
}

pub struct InstanceActuator {
    instances: Arc<InstanceStore>,
    store: Store,
}

impl InstanceActuator {
    pub(crate) fn new(instances: Arc<InstanceStore>, store: Store) -> Self {
        Self { instances, store }
    }

    /// Apply `verb` to the instances at the given cache indices.
    ///
    /// Every index is resolved against the current snapshot before any
    /// remote call; one batched call covers all resolved ids.
    pub async fn act(
        &self,
        client: &ComputeClient,
        indices: &[usize],
        verb: InstanceVerb,
    ) -> Result<(), ActError> {
        let snapshot = self.instances.snapshot();
        let mut ids = Vec::with_capacity(indices.len());
        for &index in indices {
            let record = snapshot.get(index).ok_or(ActError::IndexOutOfRange {
                index,
                len: snapshot.len(),
            })?;
            ids.push(record.id.clone());
        }

        let result = match verb {
            InstanceVerb::Start => client.start_instances(&ids).await,
            InstanceVerb::Stop => client.stop_instances(&ids).await,
            InstanceVerb::Reboot => client.reboot_instances(&ids).await,
            InstanceVerb::Terminate => client.terminate_instances(&ids).await,
        };
        result.map_err(|e| ActError::Remote(e.into()))?;

        info!(%verb, count = ids.len(), "instance action issued");
        Ok(())
    }

    /// Launch one instance, then tag it with its Name (best-effort).
    ///
    /// Required-field checks run before any remote call. A remote
    /// rejection surfaces its error code verbatim. Tagging failure is
    /// not rolled back -- the instance exists, just untagged.
    pub async fn launch(
        &self,
        client: &ComputeClient,
        request: &LaunchRequest,
    ) -> Result<String, LaunchError> {
        if request.image_id.is_empty() {
            return Err(LaunchError::MissingImage);
        }
        if request.instance_type.is_empty() {
            return Err(LaunchError::MissingType);
        }
        if request.key_pair.is_empty() {
            return Err(LaunchError::MissingKeyPair);
        }

        let security_groups = if request.security_group == RECOMMENDED_GROUP {
            Vec::new()
        } else {
            vec![request.security_group.clone()]
        };

        let response = client
            .run_instances(&RunInstancesRequest {
                image_id: request.image_id.clone(),
                instance_type: request.instance_type.clone(),
                key_name: request.key_pair.clone(),
                security_groups,
                min_count: 1,
                max_count: 1,
            })
            .await
            .map_err(|e| LaunchError::Remote(e.into()))?;

        let instance_id = response
            .instances
            .first()
            .map(|i| i.instance_id.clone())
            .ok_or_else(|| {
                LaunchError::Remote(RemoteError::internal("gateway returned no instance"))
            })?;

        if let Err(e) = client
            .create_tags(
                &instance_id,
                &[Tag {
                    key: "Name".into(),
                    value: request.name_tag.clone(),
                }],
            )
            .await
        {
            warn!(instance = %instance_id, error = %e, "launched but Name tag failed");
        }

        info!(instance = %instance_id, "instance launched");
        Ok(instance_id)
    }

    /// Render login instructions (terminal, SFTP, notebook tunnel) for
    /// the instance at `index`, or `None` when the index is stale.
    pub fn login_help(&self, index: usize) -> Option<String> {
        let snapshot = self.instances.snapshot();
        let record = snapshot.get(index)?;
        let pem = self.store.material_path(&record.key_name);
        let pem = pem.display();
        let user_at_ip = format!("ubuntu@{}", record.public_ip);
        let user_at_dns = format!("ubuntu@{}", record.public_dns);

        Some(format!(
            "1) Make the key pair readable only by you:\n\
             chmod 400 {pem}\n\n\
             2) Log in through the terminal:\n\
             ssh -oStrictHostKeyChecking=no -i {pem} {user_at_ip}\n\n\
             3) Log in through an SFTP client:\n\
             server: {ip}\nusername: ubuntu\nSSH private key: {pem}\n\n\
             4) Log in through a notebook:\n\
             a) over the terminal connection run:\n\
             jupyter notebook --ip=0.0.0.0 --no-browser --port=8888\n\
             b) on a new local terminal run:\n\
             ssh -i {pem} -L 8000:localhost:8888 {user_at_dns}\n\
             c) open localhost:8000 in a browser with the token from (a)",
            ip = record.public_ip,
        ))
    }
}
