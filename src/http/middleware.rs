//! Caller identity middleware
//!
//! Authentication happens upstream; this layer only lifts the caller's player
//! id out of the request so handlers can run host and role-holder checks.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GameError;

/// Header carrying the acting player's id
pub const PLAYER_ID_HEADER: &str = "x-player-id";

/// The player on whose behalf a request is made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub player_id: String,
}

/// Extract a caller from request headers
pub fn caller_from_headers(headers: &axum::http::HeaderMap) -> Option<Caller> {
    headers
        .get(PLAYER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| Caller {
            player_id: id.to_string(),
        })
}

/// Middleware that requires a caller id on the request. An anonymous caller
/// fails the same host and role-holder checks as a wrong one, so it gets the
/// same 403.
pub async fn require_caller(mut request: Request, next: Next) -> Response {
    match caller_from_headers(request.headers()) {
        Some(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        None => GameError::forbidden("missing x-player-id header").into_response(),
    }
}
