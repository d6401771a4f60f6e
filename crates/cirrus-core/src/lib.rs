// cirrus-core: session, registry, and instance-state layer between
// cirrus-api and consumers.

pub mod actuator;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod model;
pub mod registry;
pub mod store;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use actuator::{InstanceActuator, InstanceVerb, LaunchRequest, RECOMMENDED_GROUP};
pub use credentials::CredentialStore;
pub use engine::{ConnectionState, Engine, EngineConfig, Session};
pub use registry::{
    ImageRegistry, InstanceTypeRegistry, KeyPairDeleteReport, KeyPairRecord, KeyPairRegistry,
    Registries, SecurityGroupRecord, SecurityGroupRegistry,
};
pub use store::Store;
pub use sync::InstanceStore;

pub use error::{
    ActError, ConnectError, CreateError, DeleteError, ExportError, LaunchError, PollError,
    ProfileError, RemoteError,
};

// Re-export model types at the crate root for ergonomics.
pub use model::{InstanceRecord, InstanceState, PollDelta};
pub use registry::DEFAULT_GROUP;

// The persisted record types appear in this crate's public API
// (`Store::with` and the registries), so surface them here too.
pub use cirrus_config::{ImageEntry, InstanceView, Profile, UserData};
