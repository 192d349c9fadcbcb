//! Schema-driven form engine.
//!
//! A form's fields are declared twice: the caller lists the fields it wants
//! (with optional overrides) and the server describes what the endpoint
//! accepts via a metadata request. [`session::FormSession`] merges the two,
//! tracks values and server-reported errors, and submits mutations.
//!
//! - [`fields`]: field kinds, descriptors and the caller/server merge
//! - [`schema`]: parsing of the server's metadata response
//! - [`session`]: the form lifecycle (open, edit, submit, close)

pub mod fields;
pub mod schema;
pub mod session;

pub use fields::{Choice, FieldDescriptor, FieldKind, FieldSpec};
pub use schema::FormSchema;
pub use session::{FormOptions, FormSession, SubmitResult, SubmitState};
