// ── Engine ──
//
// Full lifecycle management for a compute-region session. Owns the
// persisted record, the credential profiles, the resource registries,
// the instance synchronizer, and the actuator, and routes every
// connected operation through the single session client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use cirrus_api::{ComputeClient, TransportConfig};

use crate::actuator::{InstanceActuator, InstanceVerb, LaunchRequest};
use crate::credentials::CredentialStore;
use crate::error::{
    ActError, ConnectError, CreateError, DeleteError, LaunchError, PollError,
};
use crate::model::PollDelta;
use crate::registry::{KeyPairDeleteReport, Registries};
use crate::store::Store;
use crate::sync::InstanceStore;

// ── ConnectionState ──────────────────────────────────────────────

/// Session state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

// ── Configuration ────────────────────────────────────────────────

/// Engine construction parameters.
pub struct EngineConfig {
    /// Gateway base URL override for self-hosted deployments and
    /// tests. `None` derives the endpoint from the session region.
    pub endpoint_override: Option<Url>,
    pub transport: TransportConfig,
    /// Location of the persisted user record.
    pub store_path: PathBuf,
    /// Directory for exported `.pem` files.
    pub material_dir: PathBuf,
    /// Background poll cadence. `0` disables the background task;
    /// callers drive [`Engine::poll`] themselves.
    pub poll_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint_override: None,
            transport: TransportConfig::default(),
            store_path: cirrus_config::store_path(),
            material_dir: cirrus_config::key_material_dir(),
            poll_interval_secs: 10,
        }
    }
}

// ── Session ──────────────────────────────────────────────────────

/// An established (profile, region) binding and its client.
#[derive(Clone)]
pub struct Session {
    pub profile: String,
    pub region: String,
    client: Arc<ComputeClient>,
}

// ── Engine ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<EngineInner>`. Construction opens the
/// persisted record but never touches the network -- call
/// [`connect()`](Self::connect) to establish a session.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Store,
    credentials: CredentialStore,
    registries: Registries,
    instances: Arc<InstanceStore>,
    actuator: InstanceActuator,
    session: Mutex<Option<Session>>,
    connection_state: watch::Sender<ConnectionState>,
    // Re-armed on every connect so disconnect/connect cycles work.
    cancel: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    poll_interval_secs: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let store = Store::open(config.store_path, config.material_dir);
        let credentials = CredentialStore::new(
            store.clone(),
            config.transport,
            config.endpoint_override,
        );
        let registries = Registries::new(store.clone());
        let instances = Arc::new(InstanceStore::new());
        let actuator = InstanceActuator::new(Arc::clone(&instances), store.clone());
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(EngineInner {
                store,
                credentials,
                registries,
                instances,
                actuator,
                session: Mutex::new(None),
                connection_state,
                cancel: Mutex::new(CancellationToken::new()),
                task_handles: Mutex::new(Vec::new()),
                poll_interval_secs: config.poll_interval_secs,
            }),
        }
    }

    // ── Component access ─────────────────────────────────────────

    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    pub fn registries(&self) -> &Registries {
        &self.inner.registries
    }

    pub fn instances(&self) -> &Arc<InstanceStore> {
        &self.inner.instances
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// The current session, if connected.
    pub async fn session(&self) -> Option<Session> {
        self.inner.session.lock().await.clone()
    }

    async fn client(&self) -> Option<Arc<ComputeClient>> {
        self.inner
            .session
            .lock()
            .await
            .as_ref()
            .map(|s| Arc::clone(&s.client))
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Bind `profile` to `region` and establish a session.
    ///
    /// The sequence validates before it commits: a liveness probe with
    /// the profile's credentials, an initial instance fetch, then the
    /// registry refresh. Only when all succeed does the session go
    /// live, the defaults persist, and the background poll task start.
    pub async fn connect(&self, profile: &str, region: &str) -> Result<(), ConnectError> {
        if profile.is_empty() {
            return Err(ConnectError::NoProfileSelected);
        }
        let credentials = self
            .inner
            .credentials
            .credentials_for(profile)
            .ok_or_else(|| ConnectError::ProfileNotFound(profile.to_owned()))?;
        let client = self
            .inner
            .credentials
            .client_for(&credentials, region)
            .map_err(ConnectError::ConnectionFailed)?;

        // Liveness: the control plane must answer both the region call
        // and an instance describe with these credentials.
        client
            .list_regions()
            .await
            .map_err(|e| ConnectError::ConnectionFailed(e.into()))?;
        let records = InstanceStore::probe(&client)
            .await
            .map_err(ConnectError::ConnectionFailed)?;
        debug!(profile, region, "control plane reachable");

        // Retire any previous session's background task before touching
        // the shared caches (reconnect without an explicit disconnect),
        // so no stale-session poll can overwrite the new snapshot.
        self.inner.cancel.lock().await.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        // Capabilities: registry mirrors.
        self.inner
            .registries
            .refresh(&client)
            .await
            .map_err(ConnectError::DescribeFailed)?;

        self.inner.instances.seed(records);
        self.inner.store.mutate(|d| {
            d.default_profile = profile.to_owned();
            d.default_region = region.to_owned();
        });

        let client = Arc::new(client);
        *self.inner.session.lock().await = Some(Session {
            profile: profile.to_owned(),
            region: region.to_owned(),
            client: Arc::clone(&client),
        });

        let cancel = CancellationToken::new();
        *self.inner.cancel.lock().await = cancel.clone();
        if self.inner.poll_interval_secs > 0 {
            let engine = self.clone();
            let interval = self.inner.poll_interval_secs;
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(poll_task(engine, interval, cancel)));
        }

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!(profile, region, "session established");
        Ok(())
    }

    /// Tear the session down.
    ///
    /// Cancels the background poll task, drops the session client, and
    /// clears every remote-mirroring cache. Never contacts the remote:
    /// the gateway holds no session state to release.
    pub async fn disconnect(&self) {
        self.inner.cancel.lock().await.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        *self.inner.session.lock().await = None;
        self.inner.registries.clear();
        self.inner.instances.clear();
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Connected operations ─────────────────────────────────────
    //
    // Thin wrappers that resolve the session client and delegate. The
    // registries and actuator stay client-agnostic so tests can drive
    // them directly.

    /// Refresh the instance snapshot once and classify the result.
    pub async fn poll(&self) -> Result<PollDelta, PollError> {
        let client = self.client().await.ok_or(PollError::NotConnected)?;
        self.inner
            .instances
            .poll(&client)
            .await
            .map_err(PollError::Remote)
    }

    /// Apply a lifecycle verb to the instances at the given cache
    /// indices.
    pub async fn act(&self, indices: &[usize], verb: InstanceVerb) -> Result<(), ActError> {
        let client = self.client().await.ok_or(ActError::NotConnected)?;
        self.inner.actuator.act(&client, indices, verb).await
    }

    /// Launch one instance and return its id.
    pub async fn launch(&self, request: &LaunchRequest) -> Result<String, LaunchError> {
        let client = self.client().await.ok_or(LaunchError::NotConnected)?;
        self.inner.actuator.launch(&client, request).await
    }

    /// Login instructions for the instance at `index`.
    pub fn login_help(&self, index: usize) -> Option<String> {
        self.inner.actuator.login_help(index)
    }

    pub async fn create_key_pair(&self, name: &str) -> Result<(), CreateError> {
        let client = self.client().await.ok_or(CreateError::NotConnected)?;
        self.inner.registries.key_pairs.create(&client, name).await
    }

    pub async fn delete_key_pair(&self, name: &str) -> Result<KeyPairDeleteReport, DeleteError> {
        let client = self.client().await.ok_or(DeleteError::NotConnected)?;
        Ok(self.inner.registries.key_pairs.delete(&client, name).await)
    }

    pub async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: Option<&str>,
    ) -> Result<(), CreateError> {
        let client = self.client().await.ok_or(CreateError::NotConnected)?;
        self.inner
            .registries
            .security_groups
            .create(&client, name, description, vpc_id)
            .await
    }

    pub async fn delete_security_group(&self, name: &str) -> Result<(), DeleteError> {
        let client = self.client().await.ok_or(DeleteError::NotConnected)?;
        self.inner
            .registries
            .security_groups
            .delete(&client, name)
            .await
    }

    /// Add an image to the curated list after validating its id
    /// remotely (and picking up its display name).
    pub async fn add_image(&self, image_id: &str) -> Result<(), CreateError> {
        let client = self.client().await.ok_or(CreateError::NotConnected)?;
        self.inner.registries.images.add(&client, image_id).await
    }

    /// Fill in display names for curated images that were stored
    /// without one. Prefers the session client; falls back to the
    /// first stored profile that still validates.
    pub async fn resolve_image_names(&self) {
        if let Some(client) = self.client().await {
            self.inner.registries.images.resolve_names(&client).await;
            return;
        }
        match self.inner.credentials.first_valid_client().await {
            Some(client) => self.inner.registries.images.resolve_names(&client).await,
            None => warn!("no usable credentials; image names left unresolved"),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh the instance snapshot.
async fn poll_task(engine: Engine, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = engine.poll().await {
                    warn!(error = %e, "periodic poll failed");
                }
            }
        }
    }
}
