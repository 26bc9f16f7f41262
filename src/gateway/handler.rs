use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::error::GatewayError;
use super::state::HandlerState;
use crate::cache::AnswerCache;
use crate::constants::{DEFAULT_CONTEXT_SIZE, DEFAULT_PAGE_SIZE, MAX_CONTEXT_SIZE, MAX_PAGE_SIZE};
use crate::model::{LeaderboardPage, RankedEntity};
use crate::store::ScoreStore;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Generated when absent.
    pub id: Option<String>,
    pub name: String,
    pub score: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScoreRequest {
    pub score: i32,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

/// Raw window parameters. Missing, unparseable or out-of-range values fall back to defaults.
#[derive(Debug, Deserialize)]
pub struct AroundQuery {
    pub context_size: Option<String>,
}

/// Raw paging parameters. Missing, unparseable or out-of-range values fall back to defaults.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankResponse {
    pub id: String,
    pub rank: u64,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    body.map(|Json(value)| value)
        .map_err(|e| GatewayError::InvalidRequest(e.body_text()))
}

fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, GatewayError> {
    query
        .map(|Query(value)| value)
        .map_err(|e| GatewayError::InvalidRequest(e.body_text()))
}

/// Parses `raw` as a number in `1..=max`, or returns `default`.
fn numeric_param(raw: Option<&str>, max: u32, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| (1..=max).contains(value))
        .unwrap_or(default)
}

#[instrument(skip(state, body))]
pub async fn register_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RankedEntity>), GatewayError>
where
    S: ScoreStore,
    C: AnswerCache,
{
    let request = json_body(body)?;
    let id = request.id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let created = state
        .service
        .register(&id, &request.name, request.score)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, params))]
pub async fn search_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<RankedEntity>, GatewayError>
where
    S: ScoreStore,
    C: AnswerCache,
{
    let SearchQuery { name } = query(params)?;
    match state.service.find_by_name(&name).await? {
        Some(found) => Ok(Json(found)),
        None => {
            debug!(name = %name, "Search found nothing");
            Err(GatewayError::NameNotFound { name })
        }
    }
}

#[instrument(skip(state))]
pub async fn record_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Path(id): Path<String>,
) -> Result<Json<RankedEntity>, GatewayError>
where
    S: ScoreStore,
    C: AnswerCache,
{
    Ok(Json(state.service.record(&id).await?))
}

#[instrument(skip(state))]
pub async fn rank_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Path(id): Path<String>,
) -> Result<Json<RankResponse>, GatewayError>
where
    S: ScoreStore,
    C: AnswerCache,
{
    let rank = state.service.rank(&id).await?;
    Ok(Json(RankResponse { id, rank }))
}

#[instrument(skip(state, body))]
pub async fn update_score_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateScoreRequest>, JsonRejection>,
) -> Result<Json<RankedEntity>, GatewayError>
where
    S: ScoreStore,
    C: AnswerCache,
{
    let UpdateScoreRequest { score } = json_body(body)?;
    Ok(Json(state.service.update_score(&id, score).await?))
}

#[instrument(skip(state, params))]
pub async fn around_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Path(id): Path<String>,
    Query(params): Query<AroundQuery>,
) -> Result<Json<LeaderboardPage>, GatewayError>
where
    S: ScoreStore,
    C: AnswerCache,
{
    let context_size = numeric_param(
        params.context_size.as_deref(),
        MAX_CONTEXT_SIZE,
        DEFAULT_CONTEXT_SIZE,
    );
    Ok(Json(state.service.page_around(&id, context_size).await?))
}

#[instrument(skip(state, params))]
pub async fn leaderboard_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardPage>, GatewayError>
where
    S: ScoreStore,
    C: AnswerCache,
{
    let page = numeric_param(params.page.as_deref(), u32::MAX, 1);
    let page_size = numeric_param(params.page_size.as_deref(), MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE);
    Ok(Json(state.service.page(page, page_size).await?))
}
