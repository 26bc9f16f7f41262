//! HTTP gateway (Axum) over the rank service.
//!
//! Thin boundary: request parsing, defaults and status mapping live here; every domain
//! rule is enforced by [`crate::service::RankService`].

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use state::HandlerState;

use crate::cache::AnswerCache;
use crate::store::ScoreStore;

pub const LADDER_STATUS_HEADER: &str = "X-Ladder-Status";
pub const LADDER_STATUS_HEALTHY: &str = "healthy";
pub const LADDER_STATUS_UNAVAILABLE: &str = "unavailable";

pub fn create_router_with_state<S, C>(state: HandlerState<S, C>) -> Router
where
    S: ScoreStore,
    C: AnswerCache,
{
    Router::new()
        .route("/health", get(health_handler::<S, C>))
        .route("/entities", post(handler::register_handler::<S, C>))
        .route("/entities/search", get(handler::search_handler::<S, C>))
        .route("/entities/{id}", get(handler::record_handler::<S, C>))
        .route("/entities/{id}/rank", get(handler::rank_handler::<S, C>))
        .route("/entities/{id}/score", put(handler::update_score_handler::<S, C>))
        .route("/entities/{id}/around", get(handler::around_handler::<S, C>))
        .route("/leaderboard", get(handler::leaderboard_handler::<S, C>))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument(skip(state))]
pub async fn health_handler<S, C>(State(state): State<HandlerState<S, C>>) -> Response
where
    S: ScoreStore,
    C: AnswerCache,
{
    let (status_code, status) = if state.service.is_healthy().await {
        (StatusCode::OK, LADDER_STATUS_HEALTHY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, LADDER_STATUS_UNAVAILABLE)
    };

    let mut headers = HeaderMap::new();
    headers.insert(LADDER_STATUS_HEADER, HeaderValue::from_static(status));

    (status_code, headers, Json(HealthResponse { status })).into_response()
}
