// ── Core error types ──
//
// One closed enum per operation family, so consumers match
// exhaustively instead of comparing strings. The api crate's error is
// never exposed raw: `RemoteError` wraps it while preserving the
// remote error code verbatim for display.

use thiserror::Error;

/// A failure reported by (or on the way to) the control plane.
///
/// `code` is the remote error code exactly as the gateway sent it;
/// transport failures have no code. Display favors the code when
/// present -- `launch` failures surface it unmodified to the user.
#[derive(Debug, Clone)]
pub struct RemoteError {
    pub code: Option<String>,
    pub message: String,
    pub status: Option<u16>,
    /// `true` when the endpoint was never reached (DNS, connect, TLS,
    /// timeout) as opposed to the endpoint rejecting the call.
    pub connectivity: bool,
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}"),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

impl RemoteError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            status: None,
            connectivity: false,
        }
    }
}

impl From<cirrus_api::Error> for RemoteError {
    fn from(err: cirrus_api::Error) -> Self {
        let connectivity = err.is_connectivity();
        match err {
            cirrus_api::Error::Remote {
                code,
                message,
                status,
            } => Self {
                code: Some(code),
                message,
                status: Some(status),
                connectivity,
            },
            other => Self {
                code: None,
                message: other.to_string(),
                status: None,
                connectivity,
            },
        }
    }
}

// ── Credential profiles ──────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile name must not be empty")]
    EmptyName,

    #[error("a profile with this name already exists")]
    ProfileExists,

    #[error("another profile already uses this access key id")]
    KeyIdExists,

    #[error("credentials rejected by the control plane: {0}")]
    InvalidCredentials(RemoteError),

    #[error("no profile named '{0}'")]
    NotFound(String),
}

// ── Session lifecycle ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("no profile selected")]
    NoProfileSelected,

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    /// The endpoint could not be reached or rejected the liveness probe.
    #[error("cannot reach the control plane: {0}")]
    ConnectionFailed(RemoteError),

    /// The network proved reachable but a capability call broke --
    /// reported distinctly so an operator can tell a broken network
    /// from a broken integration.
    #[error("connected, but a describe call failed: {0}")]
    DescribeFailed(RemoteError),
}

// ── Registries ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("'{0}' already exists")]
    DuplicateName(String),

    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Remote(RemoteError),
}

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("'{0}' is protected and cannot be deleted")]
    Protected(String),

    #[error("'{0}' not found")]
    NotFound(String),

    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Remote(RemoteError),
}

/// Errors from re-exporting retained key-pair material to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no retained key material for '{0}'")]
    NotFound(String),

    #[error("failed to write key material: {0}")]
    Io(#[from] std::io::Error),
}

// ── Synchronizer ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PollError {
    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Remote(RemoteError),
}

// ── Actuator ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ActError {
    #[error("index {index} is out of range (cache holds {len} instances)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Remote(RemoteError),
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("an image id is required")]
    MissingImage,

    #[error("an instance type is required")]
    MissingType,

    #[error("a key pair is required")]
    MissingKeyPair,

    #[error("not connected")]
    NotConnected,

    /// Displays the remote error code verbatim.
    #[error(transparent)]
    Remote(RemoteError),
}
