// ── Credential profiles and the region catalog ──
//
// Profiles are validated against the control plane before acceptance:
// a harmless `list_regions` call with the candidate credentials either
// succeeds (profile accepted and persisted) or classifies as
// InvalidCredentials. The same call doubles as the opportunistic
// region-catalog refresh, iterating stored profiles until one works.

use secrecy::SecretString;
use tracing::{debug, warn};
use url::Url;

use cirrus_api::{ComputeClient, Credentials, TransportConfig};
use cirrus_config::Profile;

use crate::error::{ProfileError, RemoteError};
use crate::store::Store;

/// Persisted named credential profiles, plus the cached region catalog.
pub struct CredentialStore {
    store: Store,
    transport: TransportConfig,
    endpoint_override: Option<Url>,
}

impl CredentialStore {
    pub(crate) fn new(
        store: Store,
        transport: TransportConfig,
        endpoint_override: Option<Url>,
    ) -> Self {
        Self {
            store,
            transport,
            endpoint_override,
        }
    }

    // ── Client construction ──────────────────────────────────────────

    /// Build a client for (credentials, region), honoring the endpoint
    /// override used by self-hosted gateways and tests.
    pub(crate) fn client_for(
        &self,
        credentials: &Credentials,
        region: &str,
    ) -> Result<ComputeClient, RemoteError> {
        let client = match &self.endpoint_override {
            Some(endpoint) => {
                ComputeClient::new(endpoint.clone(), region, credentials, &self.transport)
            }
            None => ComputeClient::for_region(region, credentials, &self.transport),
        };
        client.map_err(RemoteError::from)
    }

    // ── Profile CRUD ─────────────────────────────────────────────────

    /// Add a profile after validating its credentials remotely.
    ///
    /// Input checks run before any remote call; the remote probe is a
    /// `list_regions` issued with the candidate credentials against the
    /// current default region.
    pub async fn add_profile(
        &self,
        name: &str,
        access_key_id: &str,
        secret_key: &str,
    ) -> Result<(), ProfileError> {
        let name = strip_whitespace(name);
        let access_key_id = strip_whitespace(access_key_id);
        let secret_key = strip_whitespace(secret_key);

        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let (name_taken, key_taken) = self.store.with(|d| {
            (
                d.profiles.iter().any(|p| p.name == name),
                d.profiles.iter().any(|p| p.access_key_id == access_key_id),
            )
        });
        if name_taken {
            return Err(ProfileError::ProfileExists);
        }
        if key_taken {
            return Err(ProfileError::KeyIdExists);
        }

        let credentials = Credentials {
            access_key_id: access_key_id.clone(),
            secret_key: SecretString::from(secret_key.clone()),
        };
        let region = self.store.with(|d| d.default_region.clone());
        let client = self
            .client_for(&credentials, &region)
            .map_err(ProfileError::InvalidCredentials)?;
        if let Err(e) = client.list_regions().await {
            return Err(ProfileError::InvalidCredentials(e.into()));
        }

        self.store.mutate(|d| {
            d.profiles.push(Profile {
                name: name.clone(),
                access_key_id,
                secret_key,
            });
        });
        debug!(profile = %name, "profile added");
        Ok(())
    }

    /// Remove a profile by name and persist.
    pub fn delete_profile(&self, name: &str) -> Result<(), ProfileError> {
        let exists = self.store.with(|d| d.profiles.iter().any(|p| p.name == name));
        if !exists {
            return Err(ProfileError::NotFound(name.to_owned()));
        }
        self.store.mutate(|d| d.profiles.retain(|p| p.name != name));
        Ok(())
    }

    /// Look up the credential pair for a profile name.
    pub fn credentials_for(&self, name: &str) -> Option<Credentials> {
        self.store.with(|d| {
            d.profiles.iter().find(|p| p.name == name).map(|p| Credentials {
                access_key_id: p.access_key_id.clone(),
                secret_key: SecretString::from(p.secret_key.clone()),
            })
        })
    }

    /// All profile names, in stored order.
    pub fn profile_names(&self) -> Vec<String> {
        self.store
            .with(|d| d.profiles.iter().map(|p| p.name.clone()).collect())
    }

    // ── Region catalog ───────────────────────────────────────────────

    /// The cached region catalog.
    pub fn regions(&self) -> Vec<String> {
        self.store.with(|d| d.regions.clone())
    }

    /// Region and profile preselected for the next launch.
    pub fn defaults(&self) -> (String, String) {
        self.store
            .with(|d| (d.default_profile.clone(), d.default_region.clone()))
    }

    /// Refresh the cached region catalog from the first stored profile
    /// whose credentials still validate.
    ///
    /// Best-effort by design: when no profile validates, the catalog is
    /// left unchanged (possibly stale) and this returns quietly.
    pub async fn refresh_region_catalog(&self) {
        let Some(client) = self.first_valid_client().await else {
            debug!("no stored profile validated; region catalog left unchanged");
            return;
        };
        match client.list_regions().await {
            Ok(regions) if !regions.is_empty() => {
                self.store.mutate(|d| d.regions = regions);
                debug!("region catalog refreshed");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "region catalog refresh failed"),
        }
    }

    /// Walk stored profiles in order and return a client for the first
    /// whose credentials pass the `list_regions` probe.
    pub(crate) async fn first_valid_client(&self) -> Option<ComputeClient> {
        let profiles: Vec<Profile> = self.store.with(|d| d.profiles.clone());
        let region = self.store.with(|d| d.default_region.clone());

        for profile in profiles {
            let credentials = Credentials {
                access_key_id: profile.access_key_id.clone(),
                secret_key: SecretString::from(profile.secret_key.clone()),
            };
            let Ok(client) = self.client_for(&credentials, &region) else {
                continue;
            };
            match client.list_regions().await {
                Ok(_) => return Some(client),
                Err(e) => debug!(profile = %profile.name, error = %e, "probe failed, trying next"),
            }
        }
        None
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_whitespace_removes_inner_spaces() {
        assert_eq!(strip_whitespace("  AKIA 123\t"), "AKIA123");
        assert_eq!(strip_whitespace("plain"), "plain");
    }
}
