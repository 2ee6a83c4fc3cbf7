use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        sets::{SetDetail, SetListItem},
        stats::StatsReport,
    },
    error::AppError,
    services::{match_service, stats_service},
    state::SharedState,
};

/// Routes over the archive of completed sets.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sets", get(list_sets))
        .route("/sets/{id}", get(get_set))
        .route("/sets/{id}/stats", get(set_stats))
}

/// List archived sets, newest first.
#[utoipa::path(
    get,
    path = "/sets",
    tag = "sets",
    responses((status = 200, description = "Archived sets", body = [SetListItem]))
)]
pub async fn list_sets(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SetListItem>>, AppError> {
    Ok(Json(match_service::list_sets(&state).await?))
}

/// Fetch one archived set with its frozen state.
#[utoipa::path(
    get,
    path = "/sets/{id}",
    tag = "sets",
    params(("id" = String, Path, description = "Identifier of the archived set")),
    responses(
        (status = 200, description = "Archived set", body = SetDetail),
        (status = 404, description = "Unknown set")
    )
)]
pub async fn get_set(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SetDetail>, AppError> {
    Ok(Json(match_service::get_set(&state, id).await?))
}

/// Statistics replayed from an archived set.
#[utoipa::path(
    get,
    path = "/sets/{id}/stats",
    tag = "stats",
    params(("id" = String, Path, description = "Identifier of the archived set")),
    responses(
        (status = 200, description = "Archived set statistics", body = StatsReport),
        (status = 404, description = "Unknown set")
    )
)]
pub async fn set_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatsReport>, AppError> {
    Ok(Json(stats_service::archived_set_stats(&state, id).await?))
}
