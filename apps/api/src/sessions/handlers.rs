//! Axum route handlers for the Sessions API.

use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::pagination::{Page, Paginated};
use crate::models::session::{NewSession, Session, SessionStatus, SessionSummary, SessionUpdate};
use crate::routes::ApiResponse;
use crate::sessions::keywords::KeywordSet;
use crate::sessions::stats::{
    compute_exchange_stats, compute_session_stats, ExchangeSessionStats, SessionStats,
};
use crate::sessions::validation::{validate_new_session, validate_update};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Query / body types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserSessionsQuery {
    pub user_id: Uuid,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub user_id: Uuid,
    /// Comma-separated interest keywords.
    #[serde(default)]
    pub keywords: String,
    pub min_matches: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantBody {
    pub user_id: Uuid,
}

type Envelope<T> = Json<ApiResponse<T>>;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create(
    State(state): State<AppState>,
    AppJson(body): AppJson<NewSession>,
) -> Result<(StatusCode, Envelope<Session>), AppError> {
    let new = validate_new_session(body)?;
    let session = state.sessions.create(new).await?;
    Ok((StatusCode::CREATED, ApiResponse::json(session)))
}

/// GET /api/v1/sessions?user_id=
pub async fn handle_list_for_user(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<UserSessionsQuery>,
) -> Result<Envelope<Paginated<Session>>, AppError> {
    let page = Page::from_query(params.page, params.limit)?;
    let sessions = state.sessions.find_by_user(params.user_id, page).await?;
    Ok(ApiResponse::json(sessions))
}

/// GET /api/v1/sessions/upcoming
pub async fn handle_upcoming(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<UpcomingQuery>,
) -> Result<Envelope<Paginated<Session>>, AppError> {
    if params.start_date > params.end_date {
        return Err(AppError::Validation(
            "start_date must not be after end_date".to_string(),
        ));
    }
    let page = Page::from_query(params.page, params.limit)?;
    let sessions = state
        .sessions
        .find_upcoming(params.user_id, params.start_date, params.end_date, page)
        .await?;
    Ok(ApiResponse::json(sessions))
}

/// GET /api/v1/sessions/public
pub async fn handle_public(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PageQuery>,
) -> Result<Envelope<Paginated<Session>>, AppError> {
    let page = Page::from_query(params.page, params.limit)?;
    Ok(ApiResponse::json(state.sessions.find_public(page).await?))
}

/// GET /api/v1/sessions/search?q=&status=
///
/// Unrecognized status values are ignored rather than rejected.
pub async fn handle_search(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchQuery>,
) -> Result<Envelope<Paginated<Session>>, AppError> {
    let page = Page::from_query(params.page, params.limit)?;
    let status = params.status.as_deref().and_then(SessionStatus::parse);
    let sessions = state
        .sessions
        .search(params.q.trim(), status, page)
        .await?;
    Ok(ApiResponse::json(sessions))
}

/// GET /api/v1/sessions/matches?user_id=&keywords=&min_matches=
pub async fn handle_matches(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<MatchQuery>,
) -> Result<Envelope<Vec<SessionSummary>>, AppError> {
    let keywords = KeywordSet::parse_list(&params.keywords);
    let matches = state
        .matcher
        .find_matches(&keywords, params.user_id, params.min_matches)
        .await?;

    info!(
        "Found {} matching sessions for user {} ({} keywords)",
        matches.len(),
        params.user_id,
        keywords.len()
    );

    Ok(ApiResponse::json(
        matches.iter().map(SessionSummary::from).collect(),
    ))
}

/// GET /api/v1/sessions/stats?user_id=
pub async fn handle_stats(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<StatsQuery>,
) -> Result<Envelope<SessionStats>, AppError> {
    let sessions = state.sessions.list_for_user(params.user_id).await?;
    Ok(ApiResponse::json(compute_session_stats(
        params.user_id,
        &sessions,
    )))
}

/// GET /api/v1/exchange-sessions/stats?user_id=
pub async fn handle_exchange_stats(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<StatsQuery>,
) -> Result<Envelope<ExchangeSessionStats>, AppError> {
    let sessions = state.sessions.list_exchanges_for_user(params.user_id).await?;
    Ok(ApiResponse::json(compute_exchange_stats(
        params.user_id,
        &sessions,
    )))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Envelope<Session>, AppError> {
    let session = state
        .sessions
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::json(session))
}

/// PATCH /api/v1/sessions/:id
pub async fn handle_update(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<SessionUpdate>,
) -> Result<Envelope<Session>, AppError> {
    let current = state
        .sessions
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let update = validate_update(body, &current)?;

    let session = state
        .sessions
        .update(id, update)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!("Updated session {id}");
    Ok(ApiResponse::json(session))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await? {
        return Err(not_found(id));
    }
    info!("Deleted session {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/participants
pub async fn handle_add_participant(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<ParticipantBody>,
) -> Result<Envelope<Session>, AppError> {
    let session = state
        .sessions
        .add_participant(id, body.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::json(session))
}

/// DELETE /api/v1/sessions/:id/participants/:user_id
pub async fn handle_remove_participant(
    State(state): State<AppState>,
    AppPath((id, user_id)): AppPath<(Uuid, Uuid)>,
) -> Result<Envelope<Session>, AppError> {
    let session = state
        .sessions
        .remove_participant(id, user_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::json(session))
}
