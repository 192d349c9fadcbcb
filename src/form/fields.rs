//! Field kinds, caller overrides and the merged field descriptor.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::form::schema::SchemaField;

/// One selectable option of a choice field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice {
    pub value: Value,
    pub display_name: String,
}

/// The input kind of a field, with per-kind payload.
///
/// Server metadata arrives as a loose type tag; unrecognised tags are kept
/// verbatim in `Unknown` so the view can still render a plain input.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Choice(Vec<Choice>),
    File,
    Related {
        model: Option<String>,
        api_url: Option<String>,
    },
    Unknown(String),
}

impl FieldKind {
    /// Map a server type tag (plus the choice list / relation info that may
    /// accompany it) onto a kind.
    pub fn from_metadata(schema: &SchemaField) -> Self {
        match schema.field_type.as_str() {
            "string" | "url" | "email" => FieldKind::Text,
            "integer" => FieldKind::Integer,
            "float" | "decimal" => FieldKind::Float,
            "boolean" => FieldKind::Boolean,
            "date" | "datetime" => FieldKind::Date,
            "choice" => FieldKind::Choice(schema.choices.clone().unwrap_or_default()),
            "file upload" | "image upload" => FieldKind::File,
            "related field" => FieldKind::Related {
                model: schema.model.clone(),
                api_url: schema.api_url.clone(),
            },
            other => FieldKind::Unknown(other.to_string()),
        }
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Text
    }
}

/// Hook invoked when a field's value changes.
pub type OnChange = Box<dyn FnMut(&Value) + Send>;

/// Caller-supplied overrides for one declared field.
///
/// Everything here takes precedence over the server schema when the two are
/// merged into a [`FieldDescriptor`].
#[derive(Default)]
pub struct FieldSpec {
    pub value: Option<Value>,
    pub default: Option<Value>,
    pub hidden: bool,
    pub disabled: bool,
    pub on_change: Option<OnChange>,
}

impl FieldSpec {
    pub fn with_value(value: Value) -> Self {
        FieldSpec {
            value: Some(value),
            ..FieldSpec::default()
        }
    }

    pub fn with_default(default: Value) -> Self {
        FieldSpec {
            default: Some(default),
            ..FieldSpec::default()
        }
    }

    pub fn hidden_with_value(value: Value) -> Self {
        FieldSpec {
            value: Some(value),
            hidden: true,
            ..FieldSpec::default()
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("value", &self.value)
            .field("default", &self.default)
            .field("hidden", &self.hidden)
            .field("disabled", &self.disabled)
            .field("on_change", &self.on_change.as_ref().map(|_| "fn"))
            .finish()
    }
}

/// One form input: caller overrides merged with server schema.
///
/// Lives for the duration of one [`FormSession`](crate::form::FormSession);
/// identity is the field name, unique per form.
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub label: Option<String>,
    pub help_text: Option<String>,
    pub required: bool,
    pub read_only: bool,
    pub hidden: bool,
    pub disabled: bool,
    pub default: Option<Value>,
    value: Option<Value>,
    errors: Vec<String>,
    on_change: Option<OnChange>,
    /// True when the caller supplied an explicit value, which must not be
    /// overwritten by fetched initial data.
    caller_value: bool,
}

impl FieldDescriptor {
    /// Merge a caller spec with the server schema entry for this field.
    ///
    /// Value resolution follows caller precedence: caller value, caller
    /// default, server value, server default. A field the server does not
    /// know keeps caller metadata only (the form degrades, it does not
    /// block).
    pub fn merge(name: impl Into<String>, spec: FieldSpec, schema: Option<&SchemaField>) -> Self {
        let caller_value = spec.value.is_some();
        let value = spec
            .value
            .or_else(|| spec.default.clone())
            .or_else(|| schema.and_then(|s| s.value.clone()))
            .or_else(|| schema.and_then(|s| s.default.clone()));

        let default = spec
            .default
            .or_else(|| schema.and_then(|s| s.default.clone()));

        FieldDescriptor {
            name: name.into(),
            kind: schema.map(FieldKind::from_metadata).unwrap_or_default(),
            label: schema.and_then(|s| s.label.clone()),
            help_text: schema.and_then(|s| s.help_text.clone()),
            required: schema.map(|s| s.required).unwrap_or(false),
            read_only: schema.map(|s| s.read_only).unwrap_or(false),
            hidden: spec.hidden,
            disabled: spec.disabled,
            default,
            value,
            errors: Vec::new(),
            on_change: spec.on_change,
            caller_value,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Set the current value and fire the change hook. Does not validate.
    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
        if let Some(hook) = &mut self.on_change {
            // self.value was just assigned Some
            if let Some(value) = &self.value {
                hook(value);
            }
        }
    }

    /// Adopt a server-fetched value in edit mode. Skipped when the caller
    /// pinned an explicit value; does not fire the change hook.
    pub(crate) fn adopt_initial(&mut self, value: Value) {
        if !self.caller_value {
            self.value = Some(value);
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub(crate) fn set_errors(&mut self, errors: Vec<String>) {
        self.errors = errors;
    }

    pub(crate) fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Whether this field contributes to the submission body.
    /// Hidden fields are submitted when they carry a value; read-only
    /// fields never are.
    pub fn submittable(&self) -> bool {
        !self.read_only && self.value.is_some()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("read_only", &self.read_only)
            .field("hidden", &self.hidden)
            .field("value", &self.value)
            .field("errors", &self.errors)
            .finish()
    }
}
