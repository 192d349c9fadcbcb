//! Query-parameter state for one table session.

use std::collections::BTreeMap;

/// Default rows-per-page, matching the server's default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort column and direction, encoded as an `ordering` parameter with a
/// `-` prefix for descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn ascending(column: impl Into<String>) -> Self {
        Sort {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Sort {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }

    pub fn ordering_param(&self) -> String {
        match self.direction {
            SortDirection::Ascending => self.column.clone(),
            SortDirection::Descending => format!("-{}", self.column),
        }
    }
}

/// The current query parameters of a table session: pagination, sort,
/// active filters, free-text search and caller-fixed parameters (e.g. a
/// parent id scoping the listing).
#[derive(Debug, Clone)]
pub struct TableQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort: Option<Sort>,
    pub filters: BTreeMap<String, String>,
    pub search: String,
    pub fixed_params: BTreeMap<String, String>,
}

impl Default for TableQuery {
    fn default() -> Self {
        TableQuery {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
            filters: BTreeMap::new(),
            search: String::new(),
            fixed_params: BTreeMap::new(),
        }
    }
}

impl TableQuery {
    /// Encode as list-request query parameters. Active filters override
    /// fixed parameters of the same name.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut merged: BTreeMap<String, String> = self.fixed_params.clone();
        merged.extend(self.filters.clone());

        let mut params: Vec<(String, String)> = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            params.push(("ordering".to_string(), sort.ordering_param()));
        }
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        params.extend(merged);
        params
    }
}
