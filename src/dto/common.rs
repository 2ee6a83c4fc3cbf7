//! Snapshot types shared between REST summaries and SSE payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    match_state::{LogEntry, LogLevel},
    roster::{PerSide, Player, Side, TeamSide},
};

/// Side of the net as exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SideDto {
    /// Home team.
    Home,
    /// Away team.
    Away,
}

impl From<Side> for SideDto {
    fn from(value: Side) -> Self {
        match value {
            Side::Home => SideDto::Home,
            Side::Away => SideDto::Away,
        }
    }
}

impl From<SideDto> for Side {
    fn from(value: SideDto) -> Self {
        match value {
            SideDto::Home => Side::Home,
            SideDto::Away => Side::Away,
        }
    }
}

/// Public projection of one player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSnapshot {
    /// Player id.
    pub id: Uuid,
    /// Jersey number.
    pub number: u8,
    /// Display name.
    pub name: String,
    /// Positional label.
    pub position: String,
    /// Whether the player is a libero.
    pub is_libero: bool,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            number: player.number,
            name: player.name.clone(),
            position: player.position.clone(),
            is_libero: player.is_libero,
        }
    }
}

/// Both running scores.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreSnapshot {
    /// Home points.
    pub home: u16,
    /// Away points.
    pub away: u16,
}

impl From<&PerSide<u16>> for ScoreSnapshot {
    fn from(score: &PerSide<u16>) -> Self {
        Self {
            home: score.home,
            away: score.away,
        }
    }
}

/// A libero currently on court together with the player they replaced.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiberoOriginalSnapshot {
    /// On-court libero id.
    pub libero: Uuid,
    /// The replaced player, parked until the libero leaves.
    pub original: PlayerSnapshot,
}

/// Public projection of one team's lineup, bench, and counters.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamSnapshot {
    /// Team name.
    pub name: String,
    /// Cosmetic theme identifier.
    pub theme: String,
    /// On-court lineup in serve-rotation order (slot 0 serves).
    pub court: Vec<PlayerSnapshot>,
    /// Bench players.
    pub bench: Vec<PlayerSnapshot>,
    /// Off-court liberos.
    pub liberos: Vec<PlayerSnapshot>,
    /// On-court liberos with their parked originals.
    pub libero_originals: Vec<LiberoOriginalSnapshot>,
    /// Substitutions spent this set.
    pub subs_used: u8,
    /// Timeouts spent this set.
    pub timeouts_used: u8,
    /// Challenges spent this set.
    pub challenges_used: u8,
}

impl From<&TeamSide> for TeamSnapshot {
    fn from(team: &TeamSide) -> Self {
        Self {
            name: team.name.clone(),
            theme: team.theme.clone(),
            court: team.court.iter().map(Into::into).collect(),
            bench: team.bench.iter().map(Into::into).collect(),
            liberos: team.liberos.iter().map(Into::into).collect(),
            libero_originals: team
                .libero_originals
                .iter()
                .map(|(libero, original)| LiberoOriginalSnapshot {
                    libero: *libero,
                    original: original.into(),
                })
                .collect(),
            subs_used: team.subs_used,
            timeouts_used: team.timeouts_used,
            challenges_used: team.challenges_used,
        }
    }
}

/// Log severity as exposed on the wire.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelDto {
    /// Routine narration.
    Info,
    /// Rule warning.
    Warning,
    /// Data inconsistency.
    Danger,
}

impl From<LogLevel> for LogLevelDto {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Info => LogLevelDto::Info,
            LogLevel::Warning => LogLevelDto::Warning,
            LogLevel::Danger => LogLevelDto::Danger,
        }
    }
}

/// One audit-trail line.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogEntrySummary {
    /// Sequence number within the set.
    pub seq: u64,
    /// Severity.
    pub level: LogLevelDto,
    /// Narration text.
    pub message: String,
    /// Score when the entry was written.
    pub score: ScoreSnapshot,
}

impl From<&LogEntry> for LogEntrySummary {
    fn from(entry: &LogEntry) -> Self {
        Self {
            seq: entry.seq,
            level: entry.level.into(),
            message: entry.message.clone(),
            score: (&entry.score).into(),
        }
    }
}
