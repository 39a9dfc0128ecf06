//! Immutable marketplace endpoint catalog
//!
//! Logical endpoint names map to URL templates plus the decoding hints the
//! fetch engine needs: where the records array lives inside the response
//! body, whether the endpoint paginates, and how it signals "has more".
//! The catalog is built once at startup from configuration and never
//! mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Minimal HTTP method set needed by the fetch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiMethod {
    Get,
    Post,
}

/// How an endpoint slices its result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    /// Single request, whole body is the result set.
    None,
    /// `limit`/`offset` query parameters; last page inferred from length.
    OffsetLimit,
    /// `page` counter in the JSON payload plus an explicit has-more flag.
    PageFlag,
}

/// One marketplace endpoint definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Logical name, also used as the job/topic suffix.
    pub name: String,
    pub method: ApiMethod,
    pub url: String,
    /// JSON pointer to the records array inside the body; `None` means the
    /// body itself is the array (or a single object).
    pub records_path: Option<String>,
    /// JSON pointer to the explicit has-more flag, when the endpoint
    /// exposes one.
    pub has_more_path: Option<String>,
    pub pagination: Pagination,
}

impl EndpointSpec {
    fn get(name: &str, url: String) -> Self {
        Self {
            name: name.to_string(),
            method: ApiMethod::Get,
            url,
            records_path: None,
            has_more_path: None,
            pagination: Pagination::None,
        }
    }
}

/// Base URLs of the marketplace API families.
///
/// Defaults point at the vendor's production hosts; override per
/// environment through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseUrls {
    /// Statistics family (orders, sales, stocks, incomes).
    pub statistics: String,
    /// Catalog family (prices, tariffs).
    pub catalog: String,
    /// Seller analytics family (report detail).
    pub analytics: String,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            statistics: "https://statistics-api.wildberries.ru/api/v1/supplier".to_string(),
            catalog: "https://suppliers-api.wildberries.ru/api/v3".to_string(),
            analytics: "https://seller-analytics-api.wildberries.ru/api/v1/supplier".to_string(),
        }
    }
}

/// Read-only map of logical endpoint names to their definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCatalog {
    endpoints: BTreeMap<String, EndpointSpec>,
}

impl EndpointCatalog {
    /// The standard collection set served by the marketplace seller API.
    pub fn standard(base: &BaseUrls) -> Self {
        let specs = vec![
            EndpointSpec::get("orders", format!("{}/orders", base.statistics)),
            EndpointSpec::get("sales", format!("{}/sales", base.statistics)),
            EndpointSpec::get("stocks", format!("{}/stocks", base.statistics)),
            EndpointSpec::get("incomes", format!("{}/incomes", base.statistics)),
            EndpointSpec {
                name: "prices".to_string(),
                method: ApiMethod::Get,
                url: format!("{}/prices", base.catalog),
                records_path: Some("/data/listGoods".to_string()),
                has_more_path: None,
                pagination: Pagination::OffsetLimit,
            },
            EndpointSpec::get("tariffs", format!("{}/tariffs", base.catalog)),
            EndpointSpec {
                name: "reports".to_string(),
                method: ApiMethod::Post,
                url: format!("{}/nm-report/detail", base.analytics),
                records_path: Some("/data/cards".to_string()),
                has_more_path: Some("/data/isNextPage".to_string()),
                pagination: Pagination::PageFlag,
            },
        ];

        Self { endpoints: specs.into_iter().map(|s| (s.name.clone(), s)).collect() }
    }

    pub fn from_specs(specs: Vec<EndpointSpec>) -> Self {
        Self { endpoints: specs.into_iter().map(|s| (s.name.clone(), s)).collect() }
    }

    pub fn get(&self, name: &str) -> Option<&EndpointSpec> {
        self.endpoints.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
