//! Wire projection of the replay-based statistics.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::stats::{MatchTotals, PlayerTotals, TeamTotals};

/// Aggregated counters for one team.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamStatsSummary {
    /// Rallies won.
    pub points: u16,
    /// Rallies decided by a kill.
    pub kills: u16,
    /// Rallies decided by an ace.
    pub aces: u16,
    /// Rallies decided by a stuff block.
    pub blocks: u16,
    /// Rallies lost on this team's own error.
    pub errors: u16,
}

impl From<&TeamTotals> for TeamStatsSummary {
    fn from(totals: &TeamTotals) -> Self {
        Self {
            points: totals.points,
            kills: totals.kills,
            aces: totals.aces,
            blocks: totals.blocks,
            errors: totals.errors,
        }
    }
}

/// Aggregated counters for one player, enriched with roster identity when the
/// player is still known to the match.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStatsSummary {
    /// Player id.
    pub id: Uuid,
    /// Display name, when resolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Jersey number, when resolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u8>,
    /// Kills credited.
    pub kills: u16,
    /// Aces credited.
    pub aces: u16,
    /// Blocks credited.
    pub blocks: u16,
    /// Errors charged.
    pub errors: u16,
}

impl PlayerStatsSummary {
    /// Build a row from raw totals plus an optional roster identity.
    pub fn from_totals(totals: &PlayerTotals, identity: Option<(&str, u8)>) -> Self {
        Self {
            id: totals.player,
            name: identity.map(|(name, _)| name.to_owned()),
            number: identity.map(|(_, number)| number),
            kills: totals.kills,
            aces: totals.aces,
            blocks: totals.blocks,
            errors: totals.errors,
        }
    }
}

/// Team and player statistics for one set.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsReport {
    /// Home totals.
    pub home: TeamStatsSummary,
    /// Away totals.
    pub away: TeamStatsSummary,
    /// Player rows in order of first appearance.
    pub players: Vec<PlayerStatsSummary>,
}

impl StatsReport {
    /// Assemble a report from raw totals and per-player identities resolved
    /// by the caller.
    pub fn new(totals: &MatchTotals, rows: Vec<PlayerStatsSummary>) -> Self {
        Self {
            home: (&totals.teams.home).into(),
            away: (&totals.teams.away).into(),
            players: rows,
        }
    }
}
