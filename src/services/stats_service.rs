//! Statistics projections over the current set and archived sets.

use uuid::Uuid;

use crate::{
    dto::stats::{PlayerStatsSummary, StatsReport},
    error::ServiceError,
    state::{SharedState, match_state::MatchState, roster::Side, stats},
};

/// Stats for the set currently in progress.
pub async fn current_stats(state: &SharedState) -> Result<StatsReport, ServiceError> {
    state
        .with_match(|match_state| Ok(build_report(match_state)))
        .await
}

/// Stats replayed from an archived set.
pub async fn archived_set_stats(
    state: &SharedState,
    id: Uuid,
) -> Result<StatsReport, ServiceError> {
    let store = state.require_match_store().await?;
    let Some(archive) = store.find_set(id).await? else {
        return Err(ServiceError::NotFound(format!("set `{id}` not found")));
    };
    Ok(build_report(&archive.state))
}

/// Aggregate the rally history and resolve player identities from the
/// rosters.
pub fn build_report(match_state: &MatchState) -> StatsReport {
    let totals = stats::aggregate(&match_state.history);
    let rows = totals
        .players
        .iter()
        .map(|player_totals| {
            let identity = match_state
                .find_player(Side::Home, player_totals.player)
                .or_else(|| match_state.find_player(Side::Away, player_totals.player))
                .map(|player| (player.name.as_str(), player.number));
            PlayerStatsSummary::from_totals(player_totals, identity)
        })
        .collect();

    StatsReport::new(&totals, rows)
}
