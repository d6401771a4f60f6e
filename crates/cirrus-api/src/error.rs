use thiserror::Error;

/// Top-level error type for the `cirrus-api` crate.
///
/// Covers transport failures and structured errors returned by the
/// control plane. `cirrus-core` maps these into user-facing
/// diagnostics; the remote `code` is carried verbatim so callers can
/// surface it unmodified.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Credential material that cannot be encoded into a header.
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    // ── Control plane ───────────────────────────────────────────────
    /// Structured error from the control plane.
    #[error("Remote error {code} (HTTP {status}): {message}")]
    Remote {
        /// Remote error code, preserved verbatim (e.g. `InvalidAMIID.NotFound`).
        code: String,
        message: String,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the remote endpoint was never reached.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            Self::Tls(_) => true,
            _ => false,
        }
    }

    /// Extract the remote error code, if the control plane returned one.
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Self::Remote { code, .. } => Some(code),
            _ => None,
        }
    }
}
