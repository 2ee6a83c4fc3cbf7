//! Wire projections of archived sets.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::SetListItemEntity,
    dto::{
        common::{ScoreSnapshot, SideDto},
        format_system_time,
        match_view::MatchSummary,
    },
};

/// Listing row for one archived set.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetListItem {
    /// Archive id.
    pub id: Uuid,
    /// Set number within the match.
    pub set_number: u8,
    /// Home team name at completion time.
    pub home_name: String,
    /// Away team name at completion time.
    pub away_name: String,
    /// Final score.
    pub score: ScoreSnapshot,
    /// Side that took the set.
    pub winner: SideDto,
    /// RFC3339 completion timestamp.
    pub completed_at: String,
}

impl From<SetListItemEntity> for SetListItem {
    fn from(entity: SetListItemEntity) -> Self {
        Self {
            id: entity.id,
            set_number: entity.set_number,
            home_name: entity.home_name,
            away_name: entity.away_name,
            score: (&entity.score).into(),
            winner: entity.winner.into(),
            completed_at: format_system_time(entity.completed_at),
        }
    }
}

/// One archived set with its frozen state projected for rendering.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetDetail {
    /// Archive id.
    pub id: Uuid,
    /// Side that took the set.
    pub winner: SideDto,
    /// RFC3339 completion timestamp.
    pub completed_at: String,
    /// Frozen state of the set, projected the same way as the live match.
    pub summary: MatchSummary,
}
