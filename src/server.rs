//! Harness HTTP surface over the expense tracker.
//!
//! Authentication is an external collaborator; requests identify themselves
//! with an `x-user-id` header, which is resolved through the legacy-id alias
//! table before it reaches the core.

use crate::error::ExpenseTrackerError;
use crate::period::zone_or_default;
use crate::pipeline::{AnalysisOutcome, ExpenseTracker, RecordedExpense, EMPTY_PERIOD_MESSAGE};
use crate::store::UserIdAliases;
use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::error;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<ExpenseTracker>,
    pub aliases: Arc<UserIdAliases>,
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expense", post(record_expense))
        .route("/export.csv", get(export_csv))
        .route("/analyze", get(analyze))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[derive(Deserialize)]
struct RecordRequest {
    text: String,
}

#[derive(Serialize)]
struct RecordResponse {
    ok: bool,
    #[serde(flatten)]
    recorded: RecordedExpense,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// `month` is the legacy single-month parameter kept for old clients; `from`
/// wins when both are present.
#[derive(Deserialize)]
struct PeriodQuery {
    from: Option<String>,
    to: Option<String>,
    month: Option<String>,
}

impl PeriodQuery {
    fn from_month(&self) -> Option<&str> {
        self.from.as_deref().or(self.month.as_deref())
    }

    fn to_month(&self) -> Option<&str> {
        self.to.as_deref().or(self.month.as_deref())
    }
}

fn status_for(err: &ExpenseTrackerError) -> StatusCode {
    match err {
        ExpenseTrackerError::EmptyText
        | ExpenseTrackerError::InvalidMonth(_)
        | ExpenseTrackerError::ExtractionFailed
        | ExpenseTrackerError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn resolve_user(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-user-id")?.to_str().ok()?;
    Some(state.aliases.resolve(raw).to_string())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn record_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RecordRequest>,
) -> Response {
    let Some(user_id) = resolve_user(&state, &headers) else {
        return unauthorized();
    };

    let tz = zone_or_default(headers.get("x-timezone").and_then(|v| v.to_str().ok()));

    match state.tracker.record(&user_id, &request.text, tz).await {
        Ok(recorded) => (
            StatusCode::OK,
            Json(RecordResponse { ok: true, recorded }),
        )
            .into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("recording expense failed: {}", e);
            }
            (
                status,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn export_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let Some(user_id) = resolve_user(&state, &headers) else {
        return unauthorized();
    };

    let Some(from) = query.from_month() else {
        return (
            StatusCode::BAD_REQUEST,
            "Missing or invalid start month (use YYYY-MM)".to_string(),
        )
            .into_response();
    };

    match state.tracker.export_csv(&user_id, from, query.to_month()).await {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("CSV export failed: {}", e);
            }
            (status, e.to_string()).into_response()
        }
    }
}

async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let Some(user_id) = resolve_user(&state, &headers) else {
        return unauthorized();
    };

    let Some(from) = query.from_month() else {
        return (
            StatusCode::BAD_REQUEST,
            "Missing or invalid start month (use YYYY-MM)".to_string(),
        )
            .into_response();
    };

    match state.tracker.analyze(&user_id, from, query.to_month()).await {
        Ok(AnalysisOutcome::EmptyPeriod) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            EMPTY_PERIOD_MESSAGE,
        )
            .into_response(),
        Ok(AnalysisOutcome::Stream(receiver)) => {
            let stream = ReceiverStream::new(receiver)
                .map(|chunk| Ok::<Bytes, Infallible>(Bytes::from(chunk)));
            (
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("analysis failed: {}", e);
            }
            (status, e.to_string()).into_response()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            error: "Unauthorized".to_string(),
        }),
    )
        .into_response()
}
