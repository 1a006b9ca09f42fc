//! Public health and status endpoints.

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusData {
    pub status: &'static str,
    pub total_processed: i64,
    pub total_analyses: i64,
    pub recent_processed_24h: i64,
    pub recent_analyses_24h: i64,
    pub last_activity: Option<DateTime<Utc>>,
    pub is_active: bool,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match rugwatch_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

async fn status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match collect_status(&state.pool).await {
        Ok(data) => (StatusCode::OK, Json(ApiResponse { data, meta })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "status query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse {
                    data: serde_json::json!({ "error": "status query failed" }),
                    meta,
                }),
            )
                .into_response()
        }
    }
}

/// Aggregate ledger counters for the status endpoint.
///
/// "Active" means a triggering event was handled within the last hour.
async fn collect_status(pool: &PgPool) -> Result<StatusData, rugwatch_db::DbError> {
    let now = Utc::now();
    let day_ago = now - Duration::hours(24);

    let total_processed = rugwatch_db::count_processed(pool).await?;
    let total_analyses = rugwatch_db::count_analyses(pool).await?;
    let recent_processed_24h = rugwatch_db::count_processed_since(pool, day_ago).await?;
    let recent_analyses_24h = rugwatch_db::count_analyses_since(pool, day_ago).await?;
    let last_activity = rugwatch_db::last_processed_at(pool).await?;

    let is_active = last_activity.is_some_and(|at| now - at < Duration::hours(1));

    Ok(StatusData {
        status: if is_active { "active" } else { "idle" },
        total_processed,
        total_analyses,
        recent_processed_24h,
        recent_analyses_24h,
        last_activity,
        is_active,
    })
}
