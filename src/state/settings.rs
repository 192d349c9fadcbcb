//! Key-value settings cache, loaded per scope from the server.
//!
//! The server stores all setting values as strings; typed accessors parse
//! on read and return `None` on a missing key or unparseable value.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::endpoints::{Endpoint, api_url};
use crate::error::ClientError;

/// Which settings collection a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsScope {
    Global,
    User,
}

impl SettingsScope {
    fn endpoint(&self) -> Endpoint {
        match self {
            SettingsScope::Global => Endpoint::GlobalSettingsList,
            SettingsScope::User => Endpoint::UserSettingsList,
        }
    }
}

/// One entry of a settings list response.
#[derive(Debug, Clone, Deserialize)]
struct SettingEntry {
    key: String,
    #[serde(default)]
    value: String,
}

/// String-keyed settings, cached per scope.
#[derive(Debug, Default)]
pub struct SettingsCache {
    global: BTreeMap<String, String>,
    user: BTreeMap<String, String>,
}

impl SettingsCache {
    fn scope_map(&self, scope: SettingsScope) -> &BTreeMap<String, String> {
        match scope {
            SettingsScope::Global => &self.global,
            SettingsScope::User => &self.user,
        }
    }

    /// Fetch and cache all settings for one scope, replacing any previous
    /// load of that scope.
    pub async fn load(
        &mut self,
        client: &ApiClient,
        scope: SettingsScope,
    ) -> Result<(), ClientError> {
        let path = api_url(scope.endpoint(), None);
        let body = client.get_json(&path, &[]).await?;

        let entries: Vec<SettingEntry> = match body {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            other => {
                return Err(ClientError::Decode {
                    url: client.absolute_url(&path),
                    message: format!("expected settings list, got {}", other),
                });
            }
        };

        debug!(scope = ?scope, count = entries.len(), "settings loaded");
        let map = match scope {
            SettingsScope::Global => &mut self.global,
            SettingsScope::User => &mut self.user,
        };
        map.clear();
        map.extend(entries.into_iter().map(|e| (e.key, e.value)));
        Ok(())
    }

    pub fn get(&self, scope: SettingsScope, key: &str) -> Option<&str> {
        self.scope_map(scope).get(key).map(String::as_str)
    }

    /// Boolean settings arrive as "True"/"False" (or "1"/"0") strings.
    pub fn get_bool(&self, scope: SettingsScope, key: &str) -> Option<bool> {
        match self.get(scope, key)? {
            "True" | "true" | "1" => Some(true),
            "False" | "false" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn get_i64(&self, scope: SettingsScope, key: &str) -> Option<i64> {
        self.get(scope, key)?.parse().ok()
    }

    pub fn clear(&mut self) {
        self.global.clear();
        self.user.clear();
    }

    #[cfg(test)]
    fn insert(&mut self, scope: SettingsScope, key: &str, value: &str) {
        let map = match scope {
            SettingsScope::Global => &mut self.global,
            SettingsScope::User => &mut self.user,
        };
        map.insert(key.to_string(), value.to_string());
    }
}
