//! Headless client engine for the Stockdesk inventory server.
//!
//! Two cooperating engines form the core, both thin orchestration over the
//! server's REST API:
//!
//! - [`form`]: schema-driven forms. The caller declares the fields it
//!   wants; the server's metadata (OPTIONS) response supplies types,
//!   constraints and labels; the merged [`form::FormSession`] tracks values
//!   and server-reported validation errors across submissions.
//! - [`table`]: remote-backed tables. A [`table::TableSession`] owns
//!   pagination, sorting, filtering and selection state over a collection
//!   endpoint, with stale-response suppression and in-place recoverability
//!   on fetch failure.
//!
//! Shared support: the [`endpoints`] catalog with pk substitution, the
//! auth-aware [`client::ApiClient`], the [`error`] taxonomy, per-login
//! [`state`] containers and [`notify`] events for the view layer.
//!
//! ```no_run
//! use serde_json::json;
//! use stockdesk::{ApiClient, Endpoint, FieldSpec, FormOptions, FormSession, SubmitResult};
//!
//! # async fn example() {
//! let client = ApiClient::new("http://localhost:8000/api").with_token("abc123");
//!
//! let mut form = FormSession::open(
//!     &client,
//!     FormOptions::create(Endpoint::PartList),
//!     vec![("name".to_string(), FieldSpec::default())],
//! )
//! .await;
//!
//! form.set_value("name", json!("M3 bolt"));
//! match form.submit(&client).await {
//!     SubmitResult::Success(_record) => { /* refresh dependent tables */ }
//!     SubmitResult::Invalid => { /* render form.errors("name") inline */ }
//!     SubmitResult::Failed { .. } | SubmitResult::Ignored => {}
//! }
//! # }
//! ```

pub mod client;
pub mod endpoints;
pub mod error;
pub mod form;
pub mod notify;
pub mod state;
pub mod table;
pub mod util;

pub use client::{ApiClient, MutationMethod, MutationOutcome};
pub use endpoints::{Endpoint, PkValue, api_url};
pub use error::{ClientError, ValidationErrors};
pub use form::{FieldDescriptor, FieldKind, FieldSpec, FormOptions, FormSchema, FormSession, SubmitResult};
pub use notify::{Notification, Severity};
pub use state::{SessionState, SettingsScope};
pub use table::{ListPage, Sort, SortDirection, TableQuery, TableSession};
pub use util::Debouncer;
