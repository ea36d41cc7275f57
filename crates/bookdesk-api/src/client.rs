// Admin API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token injection,
// global 401 handling, and JSON decoding. Endpoint modules (catalog,
// accounts, storage, stats) are implemented as inherent methods in
// separate files so this module stays focused on transport mechanics.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::multipart::Form;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AuthHandler, LOGIN_PATH};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the bookstore admin API.
///
/// Every request carries `Authorization: Bearer <token>` when the
/// [`AuthHandler`] has one. A 401 on any path other than the login endpoint
/// is reported to the handler exactly once before the error is returned.
#[derive(Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Arc<dyn AuthHandler>,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, which may carry a path prefix
    /// (e.g. `http://localhost/idea-backend/public`).
    pub fn new(
        base_url: Url,
        auth: Arc<dyn AuthHandler>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, auth))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, auth: Arc<dyn AuthHandler>) -> Self {
        Self {
            http,
            base_url,
            auth,
        }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join an absolute API path (`/api/admin/...`) onto the base URL,
    /// keeping any path prefix the base carries.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request with query parameters and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &Q,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let resp = self.execute(path, self.http.get(url).query(params)).await?;
        parse_json(resp).await
    }

    /// Send a POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let resp = self.execute(path, self.http.post(url).json(body)).await?;
        parse_json(resp).await
    }

    /// Send a PUT request with a JSON body.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {}", url);
        let resp = self.execute(path, self.http.put(url).json(body)).await?;
        parse_json(resp).await
    }

    /// Send a DELETE request with optional query parameters.
    pub(crate) async fn delete<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &Q,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);
        let resp = self
            .execute(path, self.http.delete(url).query(params))
            .await?;
        parse_json(resp).await
    }

    /// Send a multipart POST (file uploads).
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {} (multipart)", url);
        let resp = self.execute(path, self.http.post(url).multipart(form)).await?;
        parse_json(resp).await
    }

    /// Attach the bearer token, send, and map non-2xx responses.
    async fn execute(
        &self,
        path: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, Error> {
        let builder = match self.auth.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        };

        let resp = builder.send().await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            let body = resp.text().await.unwrap_or_default();
            if path != LOGIN_PATH {
                warn!(path, "401 from API, clearing session");
                self.auth.unauthorized();
            }
            return Err(Error::Unauthorized {
                path: path.to_owned(),
                body,
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp)
    }
}

/// Decode a JSON body. An empty body decodes as JSON `null`, which lets
/// mutation endpoints that answer `204` deserialize into `Value` or `()`.
async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    let text = if body.trim().is_empty() { "null" } else { &body };

    serde_json::from_str(text).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}
