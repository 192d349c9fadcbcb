//! Catalog of server endpoints and URL construction.
//!
//! Every engine operation targets a named [`Endpoint`] rather than a raw
//! string, so path templates live in exactly one place. Detail paths append
//! a primary-key segment; requesting a detail path for an endpoint that has
//! none is a programming error and panics rather than producing a request
//! the server cannot route.

use std::fmt;

/// A primary-key value substituted into a detail URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PkValue {
    Int(i64),
    Str(String),
}

impl fmt::Display for PkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PkValue::Int(v) => write!(f, "{}", v),
            PkValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for PkValue {
    fn from(v: i64) -> Self {
        PkValue::Int(v)
    }
}

impl From<&str> for PkValue {
    fn from(v: &str) -> Self {
        PkValue::Str(v.to_string())
    }
}

/// Named resource endpoints on the Stockdesk server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    PartList,
    PartCategoryList,
    StockItemList,
    StockLocationList,
    PurchaseOrderList,
    PurchaseOrderLineList,
    SalesOrderList,
    ReturnOrderList,
    BomList,
    CompanyList,
    SupplierPartList,
    PluginList,
    GlobalSettingsList,
    UserSettingsList,
    UserMe,
    ServerInfo,
}

impl Endpoint {
    /// Relative collection path for this endpoint, with trailing slash.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::PartList => "part/",
            Endpoint::PartCategoryList => "part/category/",
            Endpoint::StockItemList => "stock/",
            Endpoint::StockLocationList => "stock/location/",
            Endpoint::PurchaseOrderList => "order/po/",
            Endpoint::PurchaseOrderLineList => "order/po-line/",
            Endpoint::SalesOrderList => "order/so/",
            Endpoint::ReturnOrderList => "order/ro/",
            Endpoint::BomList => "bom/",
            Endpoint::CompanyList => "company/",
            Endpoint::SupplierPartList => "company/part/",
            Endpoint::PluginList => "plugins/",
            Endpoint::GlobalSettingsList => "settings/global/",
            Endpoint::UserSettingsList => "settings/user/",
            Endpoint::UserMe => "user/me/",
            Endpoint::ServerInfo => "",
        }
    }

    /// Whether this endpoint supports a `<path>/<pk>/` detail form.
    pub fn supports_detail(&self) -> bool {
        !matches!(self, Endpoint::UserMe | Endpoint::ServerInfo)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Resolve the relative URL for an endpoint, substituting the primary key
/// when one is given.
///
/// Panics if a pk is supplied for an endpoint with no detail form. Callers
/// that require a pk (update/delete forms) enforce its presence themselves,
/// so both halves of the placeholder contract fail fast.
pub fn api_url(endpoint: Endpoint, pk: Option<&PkValue>) -> String {
    match pk {
        None => endpoint.path().to_string(),
        Some(pk) => {
            assert!(
                endpoint.supports_detail(),
                "endpoint {:?} has no detail form, cannot substitute pk {}",
                endpoint,
                pk
            );
            format!("{}{}/", endpoint.path(), pk)
        }
    }
}
