//! Remote-backed table engine.
//!
//! A [`session::TableSession`] owns the paged/filtered/sorted view state
//! over one collection endpoint and keeps it synchronized with user
//! actions. Rows are opaque server records; the engine only ever extracts
//! the `pk` identifier.

pub mod query;
pub mod session;

pub use query::{Sort, SortDirection, TableQuery};
pub use session::{FetchTicket, ListPage, TableSession};
