//! API Server (Cold Path)
//!
//! Read-only JSON view of the monitor plus the local analyst-action overlay.
//! Optionally serves a static dashboard directory as fallback.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::Level;

use crate::core::{ActionOverlay, AggregateMetrics, AnalystAction, DisplayEvent, EventId};
use crate::engine::MonitorView;
use crate::feed::ConnectionState;
use crate::infrastructure::config::ApiConfig;
use crate::infrastructure::metrics::FeedStatsSnapshot;
use crate::MonitorError;

/// Shared application state
#[derive(Clone)]
pub struct ApiState {
    pub view: MonitorView,
    pub overlay: Arc<ActionOverlay>,
}

/// Full monitor state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStateDto<'a> {
    pub connected: bool,
    pub state: ConnectionState,
    pub kpis: AggregateMetrics,
    pub events: Vec<DisplayEvent<'a>>,
    pub stats: FeedStatsSnapshot,
}

/// Body of POST /api/monitor/actions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub transaction_id: EventId,
    /// Exactly `approve`, `escalate` or `block`
    pub action: AnalystAction,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// Handler error rendered as `{success: false, error}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Build the router. `static_path` is served for everything unmatched.
pub fn router(state: ApiState, static_path: Option<&Path>) -> Router {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/monitor/state", get(get_state))
        .route("/api/monitor/events", get(get_events))
        .route("/api/monitor/kpis", get(get_kpis))
        .route("/api/monitor/actions", post(post_action));

    let app = match static_path {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(CorsLayer::permissive()).with_state(state)
}

/// Start the API server
pub async fn start_server(state: ApiState, config: &ApiConfig) -> Result<(), MonitorError> {
    let app = router(state, config.static_path.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    crate::log_api!(Level::INFO, "API Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| MonitorError::Api(e.to_string()))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Handler for /api/monitor/state
async fn get_state(State(state): State<ApiState>) -> Response {
    let events = state.view.events();
    let connection = state.view.connection_state();

    let dto = MonitorStateDto {
        connected: connection.is_connected(),
        state: connection,
        kpis: state.view.metrics(),
        events: state.overlay.apply(&events),
        stats: state.view.stats(),
    };
    Json(dto).into_response()
}

/// Handler for /api/monitor/events
async fn get_events(State(state): State<ApiState>) -> Response {
    let events = state.view.events();
    Json(state.overlay.apply(&events)).into_response()
}

async fn get_kpis(State(state): State<ApiState>) -> Json<AggregateMetrics> {
    Json(state.view.metrics())
}

/// Handler for POST /api/monitor/actions
///
/// Records the action in the local overlay only.
async fn post_action(
    State(state): State<ApiState>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(request) = payload?;
    let action = request.action;

    let previous = state.overlay.record(&request.transaction_id, action);
    crate::log_api!(
        Level::INFO,
        id = %request.transaction_id,
        action = action.as_str(),
        replaced = previous.is_some(),
        "analyst action recorded"
    );

    Ok(Json(ActionResponse { success: true }))
}
