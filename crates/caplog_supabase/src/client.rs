//! Low-level HTTP client for the hosted platform.
//!
//! Every gateway service in this crate funnels its requests through
//! [`SupabaseClient`], which owns the base URL, the publishable anon key and
//! the shared `reqwest` connection pool. Response-to-error mapping lives here
//! too, so the repositories stay focused on their row semantics.

use caplog_common::CaplogError;
use caplog_config::SupabaseConfig;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Name used for error attribution in [`CaplogError::ExternalService`].
pub const SERVICE_NAME: &str = "supabase";

/// Client for the platform's REST surface (auth, rows, storage).
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    /// Shared HTTP connection pool.
    http: Client,
    /// Platform coordinates (base URL, anon key, storage bucket).
    config: SupabaseConfig,
}

impl SupabaseClient {
    /// Creates a new client from the platform configuration.
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    /// A request carrying only the anon key (auth endpoints).
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("apikey", &self.config.anon_key)
    }

    /// A request carrying the anon key and a session bearer token
    /// (row and storage endpoints, session-scoped auth endpoints).
    pub(crate) fn authed(
        &self,
        method: Method,
        path: &str,
        access_token: &str,
    ) -> RequestBuilder {
        self.request(method, path)
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
    }
}

/// Map a non-success response onto the workspace error taxonomy.
///
/// 401/403 become auth errors, 404 a not-found, and 409 (the backend's
/// uniqueness constraint firing) a domain [`CaplogError::Conflict`].
/// Everything else is attributed to the external service with the response
/// body as the message.
pub(crate) async fn check(response: Response) -> Result<Response, CaplogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => CaplogError::Auth(body),
        404 => CaplogError::NotFound(body),
        409 => CaplogError::Conflict(body),
        _ => CaplogError::ExternalService {
            service_name: SERVICE_NAME.to_string(),
            message: format!("status {status}: {body}"),
        },
    })
}

/// Decode a row-endpoint response body into typed rows.
pub(crate) async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, CaplogError> {
    let response = check(response).await?;
    let body = response.text().await?;
    if body.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&body)?)
}

/// Decode a response that must contain exactly the written row
/// (`Prefer: return=representation` on insert/update).
pub(crate) async fn written_row<T: DeserializeOwned>(response: Response) -> Result<T, CaplogError> {
    rows::<T>(response).await?.pop().ok_or_else(|| {
        CaplogError::Parse("backend returned no representation for a written row".to_string())
    })
}
