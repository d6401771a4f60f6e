// Compute control-plane HTTP client
//
// Wraps `reqwest::Client` with per-region endpoint construction and
// structured error decoding. All endpoint groups (instances, key
// pairs, etc.) are implemented as inherent methods in separate files
// to keep this module focused on transport mechanics.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// An access-key / secret-key credential pair.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_key: SecretString,
}

/// Structured error body returned by the gateway on non-2xx responses.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Async client for one (credentials, region) pair.
///
/// Credentials are injected as sensitive default headers at build time;
/// every request on this client is authenticated against the region's
/// gateway. All methods live under the `v1/` API surface.
pub struct ComputeClient {
    http: reqwest::Client,
    base_url: Url,
    region: String,
}

impl ComputeClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client bound to a region's default gateway endpoint
    /// (`https://compute.{region}.cirrus.dev`).
    pub fn for_region(
        region: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let endpoint: Url = format!("https://compute.{region}.cirrus.dev/").parse()?;
        Self::new(endpoint, region, credentials, transport)
    }

    /// Build a client against an explicit endpoint.
    ///
    /// Used for self-hosted gateways and by the test suites, which point
    /// this at a mock server.
    pub fn new(
        endpoint: Url,
        region: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();

        let key_id = HeaderValue::from_str(&credentials.access_key_id).map_err(|e| {
            Error::InvalidCredentials {
                message: format!("access key id is not header-safe: {e}"),
            }
        })?;
        headers.insert("X-Access-Key-Id", key_id);

        let mut secret =
            HeaderValue::from_str(credentials.secret_key.expose_secret()).map_err(|e| {
                Error::InvalidCredentials {
                    message: format!("secret key is not header-safe: {e}"),
                }
            })?;
        secret.set_sensitive(true);
        headers.insert("X-Secret-Key", secret);

        let http = transport.build_client(headers)?;
        let base_url = normalize_base_url(endpoint);

        Ok(Self {
            http,
            base_url,
            region: region.to_owned(),
        })
    }

    /// The region this client is bound to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"v1/instances"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        // base_url always ends with `/`, so joining `v1/…` works.
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_empty(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        handle_empty(resp).await
    }
}

/// Ensure the base URL ends with a trailing slash so `Url::join`
/// treats the final path segment as a directory.
fn normalize_base_url(mut url: Url) -> Url {
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    url
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

/// Decode the gateway's structured error body, falling back to the raw
/// text when the body isn't the expected shape.
async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let body = resp.text().await.unwrap_or_default();
    let parsed: Option<ErrorResponse> = serde_json::from_str(&body).ok();

    let (code, message) = match parsed {
        Some(e) => (
            e.code.unwrap_or_else(|| status.as_str().to_owned()),
            e.message.unwrap_or_default(),
        ),
        None => (status.as_str().to_owned(), body),
    };

    Error::Remote {
        code,
        message,
        status: status.as_u16(),
    }
}
