use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        actions::{
            ActionRequest, ActionResponse, FinalizeSetRequest, FinalizeSetResponse,
            SetupMatchRequest,
        },
        match_view::MatchSummary,
        stats::StatsReport,
    },
    error::AppError,
    services::{match_service, rally_service, stats_service},
    state::SharedState,
};

/// Routes driving the live match: bootstrap, projection, action dispatch,
/// finalization, and stats.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/match",
            post(setup_match).get(get_match).delete(abandon_match),
        )
        .route("/match/actions", post(dispatch_action))
        .route("/match/finalize-set", post(finalize_set))
        .route("/match/stats", get(match_stats))
}

/// Bootstrap a fresh set from two rosters.
#[utoipa::path(
    post,
    path = "/match",
    tag = "match",
    request_body = SetupMatchRequest,
    responses(
        (status = 200, description = "Set seeded", body = MatchSummary),
        (status = 409, description = "A set is already in progress")
    )
)]
pub async fn setup_match(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SetupMatchRequest>>,
) -> Result<Json<MatchSummary>, AppError> {
    let summary = match_service::setup_match(&state, payload).await?;
    Ok(Json(summary))
}

/// Project the set in progress for rendering.
#[utoipa::path(
    get,
    path = "/match",
    tag = "match",
    responses(
        (status = 200, description = "Current match state", body = MatchSummary),
        (status = 404, description = "No set in progress")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
) -> Result<Json<MatchSummary>, AppError> {
    let summary = match_service::get_match(&state).await?;
    Ok(Json(summary))
}

/// Abandon the set in progress and drop its backup.
#[utoipa::path(
    delete,
    path = "/match",
    tag = "match",
    responses(
        (status = 204, description = "Match abandoned"),
        (status = 404, description = "No set in progress")
    )
)]
pub async fn abandon_match(State(state): State<SharedState>) -> Result<StatusCode, AppError> {
    match_service::abandon_match(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Dispatch one scorer action into the rally state machine. Rejected actions
/// come back as a normal response with `applied: false`.
#[utoipa::path(
    post,
    path = "/match/actions",
    tag = "actions",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Dispatch outcome", body = ActionResponse),
        (status = 404, description = "No set in progress")
    )
)]
pub async fn dispatch_action(
    State(state): State<SharedState>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let response = rally_service::dispatch_action(&state, payload).await?;
    Ok(Json(response))
}

/// Archive the finished set and seed the next one. The caller performs the
/// set-completion threshold check.
#[utoipa::path(
    post,
    path = "/match/finalize-set",
    tag = "match",
    request_body = FinalizeSetRequest,
    responses(
        (status = 200, description = "Set archived and next set seeded", body = FinalizeSetResponse),
        (status = 404, description = "No set in progress")
    )
)]
pub async fn finalize_set(
    State(state): State<SharedState>,
    Json(payload): Json<FinalizeSetRequest>,
) -> Result<Json<FinalizeSetResponse>, AppError> {
    let response = match_service::finalize_set(&state, payload).await?;
    Ok(Json(response))
}

/// Team and player statistics replayed from the current set's history.
#[utoipa::path(
    get,
    path = "/match/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Current set statistics", body = StatsReport),
        (status = 404, description = "No set in progress")
    )
)]
pub async fn match_stats(State(state): State<SharedState>) -> Result<Json<StatsReport>, AppError> {
    let report = stats_service::current_stats(&state).await?;
    Ok(Json(report))
}
