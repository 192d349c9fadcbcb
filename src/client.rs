//! Auth-aware HTTP wrapper around the Stockdesk REST API.
//!
//! All engine traffic funnels through [`ApiClient`], which attaches the
//! session token, joins relative paths onto the configured base URL and
//! classifies every response before it reaches a session: transport errors
//! and non-2xx statuses become [`ClientError`] values, structured 400
//! validation bodies become [`MutationOutcome::Invalid`].

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ClientError, ValidationErrors};

/// HTTP method used for a mutating form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationMethod {
    /// POST against a collection endpoint.
    Create,
    /// PATCH against a detail endpoint.
    Update,
    /// DELETE against a detail endpoint.
    Delete,
}

impl MutationMethod {
    pub fn http_method(&self) -> Method {
        match self {
            MutationMethod::Create => Method::POST,
            MutationMethod::Update => Method::PATCH,
            MutationMethod::Delete => Method::DELETE,
        }
    }

    /// Whether this method targets a single object rather than a collection.
    pub fn requires_pk(&self) -> bool {
        matches!(self, MutationMethod::Update | MutationMethod::Delete)
    }
}

/// Classified result of a mutation request that reached the server.
#[derive(Debug)]
pub enum MutationOutcome {
    /// 2xx; the body, when present, is the created/updated record.
    Success { status: u16, body: Option<Value> },
    /// Structured 400 with per-field error messages.
    Invalid(ValidationErrors),
    /// Any other status; not recoverable in place.
    Failed { status: u16 },
}

/// HTTP client carrying the API base URL and the session token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient {
            base_url,
            token: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Replace the auth token (None on logout).
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a relative API path onto the base URL.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, self.absolute_url(path))
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Token {}", token));
        }
        builder
    }

    /// GET a JSON document. Non-2xx statuses are classified as `Failure`.
    pub async fn get_json(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, ClientError> {
        let url = self.absolute_url(path);
        debug!(url = %url, "GET");

        let response = self
            .request(Method::GET, path)
            .query(params)
            .send()
            .await
            .map_err(|source| ClientError::Network {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "GET failed");
            return Err(ClientError::Failure {
                url,
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| ClientError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Issue a metadata (OPTIONS) request for schema discovery. All failure
    /// modes collapse to `SchemaFetch`; the form engine degrades on it.
    pub async fn options_json(&self, path: &str) -> Result<Value, ClientError> {
        let url = self.absolute_url(path);
        debug!(url = %url, "OPTIONS");

        let response = self
            .request(Method::OPTIONS, path)
            .send()
            .await
            .map_err(|_| ClientError::SchemaFetch {
                url: url.clone(),
                status: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::SchemaFetch {
                url,
                status: Some(status.as_u16()),
            });
        }

        response.json().await.map_err(|_| ClientError::SchemaFetch {
            url,
            status: Some(status.as_u16()),
        })
    }

    /// Send a mutation and classify the response.
    ///
    /// Only transport-level problems surface as `Err`; everything the server
    /// actually said comes back as a [`MutationOutcome`].
    pub async fn send_mutation(
        &self,
        method: MutationMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<MutationOutcome, ClientError> {
        let url = self.absolute_url(path);
        debug!(url = %url, method = ?method, "mutation");

        let mut builder = self.request(method.http_method(), path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|source| ClientError::Network {
            url: url.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        let body: Option<Value> = response.json().await.ok();

        if (200..300).contains(&status) {
            return Ok(MutationOutcome::Success { status, body });
        }

        if status == 400 {
            if let Some(errors) = body.as_ref().and_then(ValidationErrors::from_body) {
                debug!(url = %url, fields = errors.fields.len(), "validation failure");
                return Ok(MutationOutcome::Invalid(errors));
            }
        }

        warn!(url = %url, status, "mutation failed");
        Ok(MutationOutcome::Failed { status })
    }
}
