//! Parsing of server metadata responses into a form schema.
//!
//! A metadata (OPTIONS) request against a resource endpoint returns, per
//! HTTP action, the set of writable fields and their constraints:
//!
//! ```json
//! {
//!   "actions": {
//!     "POST": {
//!       "name": {"type": "string", "required": true, "label": "Name"},
//!       "category": {"type": "related field", "model": "partcategory"}
//!     }
//!   }
//! }
//! ```
//!
//! Only the action matching the form's mutation method is extracted.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::client::MutationMethod;
use crate::form::fields::Choice;

/// Server-declared metadata for one field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaField {
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

/// Field metadata for one endpoint+method pair.
///
/// Fetched lazily when a form opens and discarded with it; there is no
/// cross-form cache.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    fields: BTreeMap<String, SchemaField>,
}

impl FormSchema {
    pub fn empty() -> Self {
        FormSchema::default()
    }

    /// Extract the schema for `method` from a metadata response body.
    ///
    /// Updates accept either PUT or PATCH metadata, whichever the server
    /// advertises. A body without a matching action yields an empty schema;
    /// individual fields that fail to deserialize are skipped.
    pub fn from_options_response(body: &Value, method: MutationMethod) -> Self {
        let actions = match body.get("actions").and_then(Value::as_object) {
            Some(actions) => actions,
            None => return FormSchema::empty(),
        };

        let action = match method {
            MutationMethod::Create => actions.get("POST"),
            MutationMethod::Update => actions.get("PUT").or_else(|| actions.get("PATCH")),
            MutationMethod::Delete => None,
        };

        let fields = match action.and_then(Value::as_object) {
            Some(fields) => fields,
            None => return FormSchema::empty(),
        };

        let mut schema = FormSchema::empty();
        for (name, value) in fields {
            match serde_json::from_value::<SchemaField>(value.clone()) {
                Ok(field) => {
                    schema.fields.insert(name.clone(), field);
                }
                Err(e) => {
                    debug!(field = %name, error = %e, "skipping undecodable schema field");
                }
            }
        }
        schema
    }

    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}
