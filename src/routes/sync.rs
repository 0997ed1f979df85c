//! Sync API endpoints
//!
//! Provides push, pull and conflict resolution for offline-first clients.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::state::AppState;
use crate::sync::{PullResponse, PushRequest, PushResponse, ResolveRequest, ResolveResponse, UserId};

/// Header carrying the user identifier
pub const USER_ID_HEADER: &str = "x-user-id";

/// Create the sync router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/push", post(push_changes))
        .route("/pull", get(pull_changes))
        .route("/resolve", post(resolve_conflict))
}

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok());

        Ok(UserId::from_header(value))
    }
}

/// Replace the user's items with the client's list
async fn push_changes(
    State(state): State<AppState>,
    user_id: UserId,
    payload: std::result::Result<Json<PushRequest>, JsonRejection>,
) -> Result<Json<PushResponse>> {
    let Json(req) = payload?;
    let response = state.sync().push(&user_id, req).await?;
    Ok(Json(response))
}

/// Return the user's stored items
async fn pull_changes(
    State(state): State<AppState>,
    user_id: UserId,
) -> Result<Json<PullResponse>> {
    let response = state.sync().pull(&user_id).await?;
    Ok(Json(response))
}

/// Pick the local or server version of conflicting data
///
/// Never fails: an unreadable body resolves as if it were empty.
async fn resolve_conflict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResolveRequest>, JsonRejection>,
) -> Json<ResolveResponse> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!("Unreadable resolve body, using defaults: {}", rejection.body_text());
            ResolveRequest::default()
        }
    };

    Json(state.sync().resolve(req))
}
