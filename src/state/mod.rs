//! Scoped client-side state: the signed-in user, server information and
//! the settings cache.
//!
//! One [`SessionState`] is created at application start and injected into
//! the views that need it; `reset` tears it down at logout. Nothing here is
//! a process-global.

pub mod settings;

use serde::Deserialize;
use tracing::debug;

use crate::client::ApiClient;
use crate::endpoints::{Endpoint, api_url};
use crate::error::ClientError;

pub use settings::{SettingsCache, SettingsScope};

/// The authenticated user, as reported by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub pk: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl UserInfo {
    /// Display name, falling back to the username when no real name is set.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Server identity and capabilities, fetched from the API root.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub instance: String,
    #[serde(rename = "apiVersion", default)]
    pub api_version: i64,
    #[serde(default)]
    pub worker_running: bool,
}

/// Per-login client state with an explicit lifecycle.
#[derive(Debug, Default)]
pub struct SessionState {
    user: Option<UserInfo>,
    server: Option<ServerInfo>,
    settings: SettingsCache,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState::default()
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn server(&self) -> Option<&ServerInfo> {
        self.server.as_ref()
    }

    pub fn settings(&self) -> &SettingsCache {
        &self.settings
    }

    /// Fetch the signed-in user's record.
    pub async fn fetch_user(&mut self, client: &ApiClient) -> Result<(), ClientError> {
        let path = api_url(Endpoint::UserMe, None);
        let body = client.get_json(&path, &[]).await?;
        let user: UserInfo =
            serde_json::from_value(body).map_err(|e| ClientError::Decode {
                url: client.absolute_url(&path),
                message: e.to_string(),
            })?;
        debug!(user = %user.username, "user state loaded");
        self.user = Some(user);
        Ok(())
    }

    /// Fetch server identity from the API root.
    pub async fn fetch_server_info(&mut self, client: &ApiClient) -> Result<(), ClientError> {
        let path = api_url(Endpoint::ServerInfo, None);
        let body = client.get_json(&path, &[]).await?;
        let server: ServerInfo =
            serde_json::from_value(body).map_err(|e| ClientError::Decode {
                url: client.absolute_url(&path),
                message: e.to_string(),
            })?;
        self.server = Some(server);
        Ok(())
    }

    /// Load one settings scope into the cache.
    pub async fn load_settings(
        &mut self,
        client: &ApiClient,
        scope: SettingsScope,
    ) -> Result<(), ClientError> {
        self.settings.load(client, scope).await
    }

    /// Tear down at logout: all per-login state is dropped.
    pub fn reset(&mut self) {
        self.user = None;
        self.server = None;
        self.settings.clear();
    }
}
