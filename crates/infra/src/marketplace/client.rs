//! Marketplace API client: paginated sweeps over credential iteration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sellersync_core::collect::ports::{FetchParams, MarketDataSource};
use sellersync_domain::{
    Config, Credential, EndpointCatalog, EndpointSpec, FetchRequest, MarketRecord, Pagination,
    Result, SellersyncError,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::http::client::{cancellable_sleep, HttpClient};
use crate::http::error::FetchError;
use crate::marketplace::pages::Page;

/// Client for the marketplace seller API.
///
/// Holds the immutable endpoint catalog and credential list; iteration
/// order follows the configured token order. Safe to share across jobs.
pub struct MarketClient {
    http: Arc<HttpClient>,
    catalog: EndpointCatalog,
    credentials: Vec<Credential>,
    page_size: usize,
    page_delay: Duration,
    credential_delay: Duration,
}

impl MarketClient {
    pub fn new(http: Arc<HttpClient>, catalog: EndpointCatalog, config: &Config) -> Self {
        Self {
            http,
            catalog,
            credentials: config.marketplace.credentials(),
            page_size: config.marketplace.page_size.max(1),
            page_delay: config.fetch.page_delay(),
            credential_delay: config.fetch.credential_delay(),
        }
    }

    /// Sweep the endpoint once per credential, isolating failures.
    ///
    /// One credential's exhaustion or rejection never aborts the others;
    /// the aggregate concatenates each credential's records in list order.
    /// Returns early (with the partial aggregate) when cancellation is
    /// observed.
    #[instrument(skip(self, spec, params, cancel), fields(endpoint = %spec.name))]
    async fn for_each_credential(
        &self,
        spec: &EndpointSpec,
        params: &FetchParams,
        cancel: &CancellationToken,
    ) -> Vec<MarketRecord> {
        let mut all = Vec::new();

        for (index, credential) in self.credentials.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("credential iteration cancelled");
                break;
            }

            let (records, error) = self.sweep(spec, params, credential, cancel).await;
            if let Some(err) = &error {
                warn!(
                    credential = %credential.masked(),
                    partial = records.len(),
                    error = %err,
                    "credential sweep failed, continuing with next credential"
                );
            } else {
                debug!(credential = %credential.masked(), records = records.len(), "credential sweep finished");
            }
            all.extend(records);

            if matches!(error, Some(FetchError::Cancelled)) {
                break;
            }
            // pace between credentials to spread upstream load
            if index + 1 < self.credentials.len()
                && cancellable_sleep(self.credential_delay, cancel).await.is_err()
            {
                break;
            }
        }

        info!(records = all.len(), "credential iteration finished");
        all
    }

    /// Walk one endpoint with one credential until the source signals
    /// completion. On any executor or decode error the sweep stops and
    /// whatever accumulated is returned alongside the error.
    async fn sweep(
        &self,
        spec: &EndpointSpec,
        params: &FetchParams,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> (Vec<MarketRecord>, Option<FetchError>) {
        match spec.pagination {
            Pagination::None => self.fetch_single(spec, params, credential, cancel).await,
            Pagination::OffsetLimit => self.sweep_offset(spec, params, credential, cancel).await,
            Pagination::PageFlag => self.sweep_page_flag(spec, params, credential, cancel).await,
        }
    }

    async fn fetch_single(
        &self,
        spec: &EndpointSpec,
        params: &FetchParams,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> (Vec<MarketRecord>, Option<FetchError>) {
        let request = match self.build_request(spec, &params.query, params.payload.clone(), credential)
        {
            Ok(request) => request,
            Err(err) => return (Vec::new(), Some(err)),
        };

        let body = match self.http.execute(&request, cancel).await {
            Ok(body) => body,
            Err(err) => return (Vec::new(), Some(err)),
        };

        match Page::decode(&body, spec) {
            Ok(page) => (page.records, None),
            Err(err) => (Vec::new(), Some(err)),
        }
    }

    /// Offset/limit sweep: offsets advance strictly by `page_size` and are
    /// never re-requested within one sweep; a short or empty page ends it.
    async fn sweep_offset(
        &self,
        spec: &EndpointSpec,
        params: &FetchParams,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> (Vec<MarketRecord>, Option<FetchError>) {
        let mut all = Vec::new();
        let mut offset: usize = 0;

        loop {
            let mut query = params.query.clone();
            query.push(("limit".to_string(), self.page_size.to_string()));
            query.push(("offset".to_string(), offset.to_string()));

            let request =
                match self.build_request(spec, &query, params.payload.clone(), credential) {
                    Ok(request) => request,
                    Err(err) => return (all, Some(err)),
                };

            let body = match self.http.execute(&request, cancel).await {
                Ok(body) => body,
                Err(err) => return (all, Some(err)),
            };
            let page = match Page::decode(&body, spec) {
                Ok(page) => page,
                Err(err) => return (all, Some(err)),
            };

            if page.records.is_empty() {
                debug!(offset, "empty page, stopping sweep");
                break;
            }

            let count = page.records.len();
            all.extend(page.records);
            debug!(offset, count, "fetched page");

            if count < self.page_size {
                break;
            }
            offset += self.page_size;

            if let Err(err) = cancellable_sleep(self.page_delay, cancel).await {
                return (all, Some(err));
            }
        }

        (all, None)
    }

    /// Page-counter sweep for endpoints that signal continuation with an
    /// explicit flag instead of the length heuristic.
    async fn sweep_page_flag(
        &self,
        spec: &EndpointSpec,
        params: &FetchParams,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> (Vec<MarketRecord>, Option<FetchError>) {
        let mut all = Vec::new();
        let mut page_no: u64 = 1;

        loop {
            let mut payload = params.payload.clone().unwrap_or_else(|| json!({}));
            if let Value::Object(map) = &mut payload {
                map.insert("page".to_string(), json!(page_no));
            }

            let request = match self.build_request(spec, &params.query, Some(payload), credential) {
                Ok(request) => request,
                Err(err) => return (all, Some(err)),
            };

            let body = match self.http.execute(&request, cancel).await {
                Ok(body) => body,
                Err(err) => return (all, Some(err)),
            };
            let page = match Page::decode(&body, spec) {
                Ok(page) => page,
                Err(err) => return (all, Some(err)),
            };

            if page.records.is_empty() {
                debug!(page_no, "empty page, stopping sweep");
                break;
            }

            all.extend(page.records);
            debug!(page_no, records = all.len(), "fetched page");

            if page.has_more != Some(true) {
                break;
            }
            page_no += 1;

            if let Err(err) = cancellable_sleep(self.page_delay, cancel).await {
                return (all, Some(err));
            }
        }

        (all, None)
    }

    fn build_request(
        &self,
        spec: &EndpointSpec,
        query: &[(String, String)],
        payload: Option<Value>,
        credential: &Credential,
    ) -> std::result::Result<FetchRequest, FetchError> {
        let mut url = Url::parse(&spec.url).map_err(|err| {
            FetchError::Decode(format!("invalid endpoint url '{}': {err}", spec.url))
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(FetchRequest {
            method: spec.method,
            url: url.into(),
            credential: credential.clone(),
            payload,
        })
    }

    fn endpoint(&self, name: &str) -> Result<&EndpointSpec> {
        self.catalog
            .get(name)
            .ok_or_else(|| SellersyncError::InvalidInput(format!("unknown endpoint: {name}")))
    }
}

#[async_trait]
impl MarketDataSource for MarketClient {
    async fn fetch_all(
        &self,
        endpoint: &str,
        params: &FetchParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<MarketRecord>> {
        let spec = self.endpoint(endpoint)?;
        Ok(self.for_each_credential(spec, params, cancel).await)
    }

    async fn fetch_first(
        &self,
        endpoint: &str,
        params: &FetchParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<MarketRecord>> {
        let spec = self.endpoint(endpoint)?;
        let credential = self.credentials.first().ok_or_else(|| {
            SellersyncError::Config("no marketplace credentials configured".to_string())
        })?;

        let (records, error) = self.sweep(spec, params, credential, cancel).await;
        match error {
            Some(err) if records.is_empty() => Err(err.into()),
            _ => Ok(records),
        }
    }
}
