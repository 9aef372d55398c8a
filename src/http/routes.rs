//! HTTP route definitions

use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::app::AppState;
use crate::error::GameError;
use crate::game::{AutoAdvance, MatchView, PhaseReport, Role, RoleInfo};
use crate::http::middleware::{require_caller, Caller, PLAYER_ID_HEADER};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS: explicit origins from CLIENT_ORIGIN, permissive when none are set
    let allowed_origins: Vec<HeaderValue> = state
        .config
        .client_origins
        .iter()
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    let cors = if allowed_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                HeaderName::from_static(PLAYER_ID_HEADER),
            ])
            .allow_credentials(true)
    };

    // Public routes (no caller id required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/roles", get(roles_handler))
        .route("/matches/:code/auto-advance", post(auto_advance_handler));

    // Routes acting on behalf of a player
    let player_routes = Router::new()
        .route("/matches/:code/start", post(start_handler))
        .route("/matches/:code/advance", post(advance_handler))
        .route("/matches/:code/state", get(state_handler))
        .route("/matches/:code/actions/:role", post(action_handler))
        .route("/matches/:code/votes", post(vote_handler))
        .layer(middleware::from_fn(require_caller));

    Router::new()
        .merge(public_routes)
        .merge(player_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_matches: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_matches: state.store.active_codes().len(),
    })
}

// ============================================================================
// Role reference
// ============================================================================

#[derive(Deserialize)]
struct RolesQuery {
    role: Option<String>,
}

async fn roles_handler(
    State(state): State<AppState>,
    Query(query): Query<RolesQuery>,
) -> Result<Json<Vec<RoleInfo>>, GameError> {
    Ok(Json(state.controller.role_info(query.role.as_deref())?))
}

// ============================================================================
// Phase control
// ============================================================================

async fn start_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<PhaseReport>, GameError> {
    Ok(Json(state.controller.start_game(&code, &caller.player_id)?))
}

async fn advance_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<PhaseReport>, GameError> {
    Ok(Json(state.controller.advance_phase(&code, &caller.player_id)?))
}

async fn auto_advance_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<AutoAdvance>, GameError> {
    Ok(Json(state.controller.try_auto_advance(&code)?))
}

async fn state_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<MatchView>, GameError> {
    Ok(Json(
        state.controller.get_state(&code, Some(&caller.player_id))?,
    ))
}

// ============================================================================
// Submissions
// ============================================================================

/// A missing or null target retracts the earlier choice
#[derive(Deserialize)]
struct TargetRequest {
    #[serde(default)]
    target_id: Option<String>,
}

#[derive(Serialize)]
struct SubmitResponse {
    success: bool,
}

async fn action_handler(
    State(state): State<AppState>,
    Path((code, role)): Path<(String, String)>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<SubmitResponse>, GameError> {
    let role: Role = role
        .parse()
        .map_err(|_| GameError::validation(format!("Unknown role {}", role)))?;

    state.controller.submit_role_action(
        &code,
        role,
        &caller.player_id,
        req.target_id.as_deref(),
    )?;

    Ok(Json(SubmitResponse { success: true }))
}

async fn vote_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<SubmitResponse>, GameError> {
    state
        .controller
        .submit_vote(&code, &caller.player_id, req.target_id.as_deref())?;

    Ok(Json(SubmitResponse { success: true }))
}

// ============================================================================
// Error handling
// ============================================================================

impl IntoResponse for GameError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GameError::Validation(_) => StatusCode::BAD_REQUEST,
            GameError::Authorization(_) => StatusCode::FORBIDDEN,
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::StateConflict(_) => StatusCode::CONFLICT,
            GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}
