//! Full match projection handed to rendering clients.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::{
        common::{LogEntrySummary, ScoreSnapshot, SideDto, TeamSnapshot},
        phase::VisiblePhase,
    },
    state::{
        match_state::{MatchState, RallyRecord},
        rally::MatchPhase,
        roster::Side,
        swap::{SwapKind, SwapStep},
    },
};

/// State of an open substitution/libero-swap workflow.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExchangeSnapshot {
    /// Acting side.
    pub team: SideDto,
    /// True for a libero exchange, false for a bench substitution.
    pub libero: bool,
    /// Incoming player already locked in by the first tap, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming: Option<Uuid>,
}

/// Running timeout display data. Purely presentational.
#[derive(Debug, Serialize, ToSchema)]
pub struct TimeoutSnapshot {
    /// Side that called the timeout.
    pub team: SideDto,
    /// Seconds the scoreboard should count down from.
    pub seconds: u16,
}

/// Everything a scoreboard needs to render the set in progress.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    /// Set number within the match.
    pub set_number: u8,
    /// Running score.
    pub score: ScoreSnapshot,
    /// Current phase.
    pub phase: VisiblePhase,
    /// Side holding serve.
    pub serving_team: SideDto,
    /// Side currently playing the ball.
    pub possession: SideDto,
    /// Home lineup, bench, and counters.
    pub home: TeamSnapshot,
    /// Away lineup, bench, and counters.
    pub away: TeamSnapshot,
    /// Audit trail, newest first.
    pub logs: Vec<LogEntrySummary>,
    /// Completed rallies this set.
    pub rallies: Vec<RallySummary>,
    /// Open exchange workflow, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangeSnapshot>,
    /// Running timeout, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutSnapshot>,
    /// Points needed to take a regular set; the threshold check itself is the
    /// caller's job.
    pub set_target_points: u16,
    /// Points needed to take the deciding set.
    pub deciding_set_target_points: u16,
    /// State version, increments once per applied action.
    pub version: u64,
}

/// One completed rally as shown in the running history.
#[derive(Debug, Serialize, ToSchema)]
pub struct RallySummary {
    /// Side the point went to.
    pub winner: SideDto,
    /// Why the point was given.
    pub reason: String,
    /// Score after the rally.
    pub score: ScoreSnapshot,
    /// Number of recorded touches.
    pub touches: usize,
}

impl From<&RallyRecord> for RallySummary {
    fn from(record: &RallyRecord) -> Self {
        Self {
            winner: record.winner.into(),
            reason: record.reason.clone(),
            score: (&record.score).into(),
            touches: record.events.len(),
        }
    }
}

impl MatchSummary {
    /// Project the full match state for rendering.
    pub fn project(state: &MatchState, config: &AppConfig) -> Self {
        let exchange = match &state.phase {
            MatchPhase::Substitution { team, kind, step } => Some(ExchangeSnapshot {
                team: (*team).into(),
                libero: *kind == SwapKind::Libero,
                incoming: match step {
                    SwapStep::AwaitingIncoming => None,
                    SwapStep::AwaitingOutgoing { incoming } => Some(*incoming),
                },
            }),
            _ => None,
        };
        let timeout = match &state.phase {
            MatchPhase::Timeout { team } => Some(TimeoutSnapshot {
                team: (*team).into(),
                seconds: config.timeout_seconds,
            }),
            _ => None,
        };

        Self {
            set_number: state.set_number,
            score: (&state.score).into(),
            phase: (&state.phase).into(),
            serving_team: state.serving_team.into(),
            possession: state.possession.into(),
            home: (&state.teams[Side::Home]).into(),
            away: (&state.teams[Side::Away]).into(),
            logs: state.logs.iter().map(Into::into).collect(),
            rallies: state.history.iter().map(Into::into).collect(),
            exchange,
            timeout,
            set_target_points: config.set_target_points,
            deciding_set_target_points: config.deciding_set_target_points,
            version: state.version,
        }
    }
}
