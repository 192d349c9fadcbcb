//! Typed error taxonomy for the Stockdesk client engine.
//!
//! Every network-boundary failure is classified here before it reaches a
//! view: transport errors, undecodable bodies, schema-discovery failures and
//! plain non-2xx statuses. Structured validation failures (a 400 whose body
//! maps field names to error lists) are not errors in the `Result` sense;
//! they are recovered into [`ValidationErrors`] and carried back to the form
//! session that triggered them.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Reserved key used by the server for errors not tied to a single field.
pub const NON_FIELD_ERRORS_KEY: &str = "non_field_errors";

/// Errors raised at the HTTP boundary of the client engine.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error talking to {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Schema discovery failed for {url} (status {status:?})")]
    SchemaFetch { url: String, status: Option<u16> },

    #[error("Request to {url} failed with status {status}")]
    Failure { url: String, status: u16 },
}

impl ClientError {
    /// The HTTP status carried by this error, when one was received at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Failure { status, .. } => Some(*status),
            ClientError::SchemaFetch { status, .. } => *status,
            _ => None,
        }
    }
}

/// Per-field and form-level errors parsed from a structured 400 response.
///
/// The server returns `{"field": ["msg", ...], "non_field_errors": [...]}`.
/// Anything that is not a list of strings is coerced to a single-message
/// list so a malformed body still produces something displayable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub non_field: Vec<String>,
}

impl ValidationErrors {
    /// Parse a validation body. Returns `None` if the body is not a JSON
    /// object (in which case the response is treated as a generic failure).
    pub fn from_body(body: &Value) -> Option<Self> {
        let map = body.as_object()?;
        let mut errors = ValidationErrors::default();

        for (key, value) in map {
            let messages = coerce_messages(value);
            if messages.is_empty() {
                continue;
            }
            if key == NON_FIELD_ERRORS_KEY {
                errors.non_field = messages;
            } else {
                errors.fields.insert(key.clone(), messages);
            }
        }

        Some(errors)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn coerce_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_field_errors() {
        let body = json!({"name": ["This field is required."]});
        let errors = ValidationErrors::from_body(&body).unwrap();
        assert_eq!(errors.field("name"), &["This field is required."]);
        assert!(errors.non_field.is_empty());
    }

    #[test]
    fn test_parse_non_field_errors() {
        let body = json!({
            "name": ["Invalid name"],
            "non_field_errors": ["Duplicate part", "Category is locked"]
        });
        let errors = ValidationErrors::from_body(&body).unwrap();
        assert_eq!(errors.field("name"), &["Invalid name"]);
        assert_eq!(errors.non_field.len(), 2);
        assert!(!errors.fields.contains_key(NON_FIELD_ERRORS_KEY));
    }

    #[test]
    fn test_parse_scalar_message_is_coerced() {
        let body = json!({"detail": "Not found."});
        let errors = ValidationErrors::from_body(&body).unwrap();
        assert_eq!(errors.field("detail"), &["Not found."]);
    }

    #[test]
    fn test_parse_non_object_body() {
        assert!(ValidationErrors::from_body(&json!("oops")).is_none());
        assert!(ValidationErrors::from_body(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_empty_lists_are_dropped() {
        let body = json!({"name": [], "non_field_errors": null});
        let errors = ValidationErrors::from_body(&body).unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_client_error_status() {
        let err = ClientError::Failure {
            url: "part/".into(),
            status: 503,
        };
        assert_eq!(err.status(), Some(503));

        let err = ClientError::Decode {
            url: "part/".into(),
            message: "bad json".into(),
        };
        assert_eq!(err.status(), None);
    }
}
