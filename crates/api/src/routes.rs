//! REST routes for on-demand marketplace queries

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sellersync_core::collect::ports::FetchParams;
use sellersync_domain::{MarketRecord, SellersyncError};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::context::AppContext;

/// Build the service router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/orders", get(get_orders))
        .route("/api/sales", get(get_sales))
        .route("/api/stocks", get(get_stocks))
        .route("/api/incomes", get(get_incomes))
        .route("/api/prices", get(get_prices))
        .route("/api/tariffs", get(get_tariffs))
        .with_state(ctx)
}

/// Error reply carrying the HTTP status the failure maps to.
#[derive(Debug)]
pub struct ApiReplyError {
    status: StatusCode,
    message: String,
}

impl ApiReplyError {
    fn missing_param(name: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("missing required param: {name}"),
        }
    }
}

impl From<SellersyncError> for ApiReplyError {
    fn from(err: SellersyncError) -> Self {
        let status = match &err {
            SellersyncError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SellersyncError::Network(_) | SellersyncError::Upstream(_) | SellersyncError::Auth(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiReplyError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, message = %self.message, "request failed");
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

type RecordsReply = Result<Json<Vec<MarketRecord>>, ApiReplyError>;

#[derive(Debug, Deserialize)]
struct DateRangeQuery {
    #[serde(rename = "dateFrom")]
    date_from: Option<String>,
    #[serde(rename = "dateTo")]
    date_to: Option<String>,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn get_orders(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<DateRangeQuery>,
) -> RecordsReply {
    fetch_dated(&ctx, "orders", query, true).await
}

async fn get_sales(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<DateRangeQuery>,
) -> RecordsReply {
    fetch_dated(&ctx, "sales", query, false).await
}

async fn get_stocks(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<DateRangeQuery>,
) -> RecordsReply {
    fetch_dated(&ctx, "stocks", query, false).await
}

async fn get_incomes(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<DateRangeQuery>,
) -> RecordsReply {
    fetch_dated(&ctx, "incomes", query, false).await
}

async fn get_prices(State(ctx): State<Arc<AppContext>>) -> RecordsReply {
    let records = ctx
        .source
        .fetch_first("prices", &FetchParams::default(), &ctx.shutdown)
        .await?;
    Ok(Json(records))
}

async fn get_tariffs(State(ctx): State<Arc<AppContext>>) -> RecordsReply {
    let records = ctx
        .source
        .fetch_first("tariffs", &FetchParams::default(), &ctx.shutdown)
        .await?;
    Ok(Json(records))
}

/// Shared shape of the date-windowed statistics endpoints: `dateFrom` is
/// required, `dateTo` optional.
async fn fetch_dated(
    ctx: &AppContext,
    endpoint: &str,
    query: DateRangeQuery,
    supports_date_to: bool,
) -> RecordsReply {
    let date_from = query.date_from.ok_or_else(|| ApiReplyError::missing_param("dateFrom"))?;

    let mut params = FetchParams::default().with_query("dateFrom", date_from);
    if supports_date_to {
        if let Some(date_to) = query.date_to {
            params = params.with_query("dateTo", date_to);
        }
    }

    let records = ctx.source.fetch_first(endpoint, &params, &ctx.shutdown).await?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use sellersync_core::collect::ports::MarketDataSource;
    use sellersync_core::publish::ports::Publisher;
    use sellersync_domain::{Config, Result};
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;
    use tower::util::ServiceExt;

    use super::*;

    struct StubSource {
        fail: bool,
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn fetch_all(
            &self,
            endpoint: &str,
            params: &FetchParams,
            cancel: &CancellationToken,
        ) -> Result<Vec<MarketRecord>> {
            self.fetch_first(endpoint, params, cancel).await
        }

        async fn fetch_first(
            &self,
            endpoint: &str,
            _params: &FetchParams,
            _cancel: &CancellationToken,
        ) -> Result<Vec<MarketRecord>> {
            if self.fail {
                return Err(SellersyncError::Upstream("marketplace is down".to_string()));
            }
            let record = match json!({"endpoint": endpoint}) {
                Value::Object(map) => map,
                _ => unreachable!(),
            };
            Ok(vec![record])
        }
    }

    struct NullPublisher;

    #[async_trait]
    impl Publisher for NullPublisher {
        async fn publish(&self, _topic: &str, _key: Option<&[u8]>, _value: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    fn test_router(fail: bool) -> Router {
        let ctx = Arc::new(AppContext::new(
            Config::default(),
            Arc::new(StubSource { fail }),
            Arc::new(NullPublisher),
            CancellationToken::new(),
        ));
        router(ctx)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = test_router(false)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn orders_requires_date_from() {
        let response = test_router(false)
            .oneshot(Request::get("/api/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("dateFrom"));
    }

    #[tokio::test]
    async fn orders_returns_the_fetched_records() {
        let response = test_router(false)
            .oneshot(
                Request::get("/api/orders?dateFrom=2024-03-14&dateTo=2024-03-15")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["endpoint"], "orders");
    }

    #[tokio::test]
    async fn upstream_failures_surface_as_bad_gateway() {
        let response = test_router(true)
            .oneshot(
                Request::get("/api/sales?dateFrom=2024-03-14").body(Body::empty()).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("marketplace is down"));
    }

    #[tokio::test]
    async fn tariffs_needs_no_parameters() {
        let response = test_router(false)
            .oneshot(Request::get("/api/tariffs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
