//! The table session: paged remote view state with stale-response
//! suppression, retained state on failure and row selection.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::endpoints::{Endpoint, api_url};
use crate::error::ClientError;
use crate::table::query::{Sort, TableQuery};

/// Extract the canonical row identifier from a record.
///
/// Records are opaque apart from their `pk` field; integer and string keys
/// are both normalized to a string so selection sets have one key type.
pub fn row_id(record: &Value) -> Option<String> {
    match record.get("pk") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// One page of a list response.
///
/// The server returns either a paginated envelope `{count, results}` or a
/// bare array (for endpoints with pagination disabled); both decode here.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub count: u64,
    pub results: Vec<Value>,
}

impl ListPage {
    pub fn from_body(body: &Value) -> Option<ListPage> {
        match body {
            Value::Array(items) => Some(ListPage {
                count: items.len() as u64,
                results: items.clone(),
            }),
            Value::Object(map) => {
                let results = map.get("results")?.as_array()?.clone();
                let count = map
                    .get("count")
                    .and_then(Value::as_u64)
                    .unwrap_or(results.len() as u64);
                Some(ListPage { count, results })
            }
            _ => None,
        }
    }
}

/// Handle for one issued fetch: the request token plus the frozen path and
/// parameters to send. Feed the network result back through
/// [`TableSession::apply_fetch`] with the same token.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub token: u64,
    pub path: String,
    pub params: Vec<(String, String)>,
}

/// Paged, filtered, sorted view state over one collection endpoint.
///
/// Owned by the view that created it. Each discrete user action hands back
/// exactly one [`FetchTicket`]; results are applied atomically, stale
/// results (an older token than the newest issued) are discarded, and a
/// failed fetch leaves the previous rows in place with a retryable error
/// indicator.
#[derive(Debug)]
pub struct TableSession {
    key: String,
    path: String,
    query: TableQuery,
    rows: Vec<Value>,
    total_count: u64,
    selection: BTreeSet<String>,
    request_seq: u64,
    error: Option<String>,
    loading: bool,
    open: bool,
}

impl TableSession {
    /// Allocate a session. `key` disambiguates multiple tables on one page
    /// and tags log output.
    pub fn new(key: impl Into<String>, endpoint: Endpoint) -> Self {
        TableSession {
            key: key.into(),
            path: api_url(endpoint, None),
            query: TableQuery::default(),
            rows: Vec::new(),
            total_count: 0,
            selection: BTreeSet::new(),
            request_seq: 0,
            error: None,
            loading: false,
            open: true,
        }
    }

    /// Pin a caller-fixed parameter (e.g. `parent=5`) sent with every fetch.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.fixed_params.insert(name.into(), value.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.query.page_size = page_size;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn query(&self) -> &TableQuery {
        &self.query
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The retryable error indicator from the last failed fetch, cleared by
    /// the next successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // ── Fetch cycle ───────────────────────────────────────────────────

    /// Issue a fetch for the current parameters. Allocates a new request
    /// token; any response still in flight for an older token will be
    /// discarded when it lands.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.request_seq += 1;
        self.loading = true;
        FetchTicket {
            token: self.request_seq,
            path: self.path.clone(),
            params: self.query.to_params(),
        }
    }

    /// Apply the result of an issued fetch. Returns true if the session
    /// state was replaced.
    ///
    /// Replacement is atomic: rows, total count and the selection
    /// intersection change together or not at all. After a success the row
    /// count never exceeds the page size and stale selections are dropped.
    pub fn apply_fetch(&mut self, token: u64, result: Result<ListPage, ClientError>) -> bool {
        if !self.open {
            debug!(table = %self.key, "dropping fetch completion for closed session");
            return false;
        }
        if token != self.request_seq {
            debug!(
                table = %self.key,
                token,
                newest = self.request_seq,
                "discarding stale fetch response"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(mut page) => {
                page.results.truncate(self.query.page_size as usize);
                self.total_count = page.count.max(page.results.len() as u64);
                self.rows = page.results;

                let present: BTreeSet<String> =
                    self.rows.iter().filter_map(row_id).collect();
                self.selection.retain(|id| present.contains(id));

                self.error = None;
                true
            }
            Err(e) => {
                // Previous rows stay; the user retries via refresh or by
                // changing a filter.
                warn!(table = %self.key, error = %e, "fetch failed, keeping previous rows");
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Re-issue a fetch with the current parameters. Used by mutation flows
    /// (e.g. a form success callback) to resynchronize.
    pub fn refresh(&mut self) -> FetchTicket {
        self.begin_fetch()
    }

    /// Drive one full fetch cycle. Failures land in [`TableSession::error`]
    /// rather than propagating; returns true if fresh rows were applied.
    pub async fn fetch(&mut self, client: &ApiClient) -> bool {
        let ticket = self.begin_fetch();
        let result = client
            .get_json(&ticket.path, &ticket.params)
            .await
            .and_then(|body| {
                ListPage::from_body(&body).ok_or_else(|| ClientError::Decode {
                    url: client.absolute_url(&ticket.path),
                    message: "unrecognised list response shape".to_string(),
                })
            });
        self.apply_fetch(ticket.token, result)
    }

    // ── Query mutators: one re-fetch per discrete action ──────────────

    pub fn set_page(&mut self, page: u32) -> FetchTicket {
        self.query.page = page.max(1);
        self.begin_fetch()
    }

    pub fn set_page_size(&mut self, page_size: u32) -> FetchTicket {
        self.query.page_size = page_size.max(1);
        self.query.page = 1;
        self.begin_fetch()
    }

    pub fn set_filter(&mut self, name: impl Into<String>, value: impl Into<String>) -> FetchTicket {
        self.query.filters.insert(name.into(), value.into());
        self.query.page = 1;
        self.begin_fetch()
    }

    pub fn clear_filter(&mut self, name: &str) -> FetchTicket {
        self.query.filters.remove(name);
        self.query.page = 1;
        self.begin_fetch()
    }

    pub fn set_sort(&mut self, sort: Sort) -> FetchTicket {
        self.query.sort = Some(sort);
        self.begin_fetch()
    }

    /// Record a free-text search term without issuing a fetch. Search input
    /// arrives per keystroke; the caller debounces (see
    /// [`Debouncer`](crate::util::Debouncer)) and then calls
    /// [`TableSession::refresh`] for the surviving trigger.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.query.search = term.into();
        self.query.page = 1;
    }

    // ── Local row updates ─────────────────────────────────────────────

    /// Patch a single row in place by identifier, without a re-fetch. Used
    /// when a mutation response already carries the authoritative record.
    /// Returns false when no current row matches.
    pub fn update_record(&mut self, record: Value) -> bool {
        let id = match row_id(&record) {
            Some(id) => id,
            None => {
                debug!(table = %self.key, "update_record: record has no pk, ignoring");
                return false;
            }
        };

        for row in &mut self.rows {
            if row_id(row).as_deref() == Some(id.as_str()) {
                *row = record;
                return true;
            }
        }
        false
    }

    // ── Selection ─────────────────────────────────────────────────────

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    /// Toggle one row. Ids not present in the current row set are refused,
    /// keeping the selection a subset of visible rows.
    pub fn toggle_row(&mut self, id: &str) -> bool {
        if self.selection.remove(id) {
            return true;
        }
        let present = self.rows.iter().filter_map(row_id).any(|row| row == id);
        if present {
            self.selection.insert(id.to_string());
        }
        present
    }

    pub fn select_all(&mut self) {
        self.selection = self.rows.iter().filter_map(row_id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Tear down the session; late fetch completions will be dropped.
    pub fn close(&mut self) {
        self.open = false;
    }
}
