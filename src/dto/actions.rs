//! Request and response payloads for match bootstrap, action dispatch, and
//! set finalization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        common::{ScoreSnapshot, SideDto},
        phase::VisiblePhase,
    },
    state::{
        match_state::{AttackCall, AttackKind, BlockCall, ServeKind, ServeResult, SetKind},
        rally::Action,
    },
};

/// Payload used to bootstrap a fresh set from two rosters.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetupMatchRequest {
    /// Home roster.
    #[validate(nested)]
    pub home: RosterInput,
    /// Away roster.
    #[validate(nested)]
    pub away: RosterInput,
    /// First serving side. Omitted means the backend flips a coin.
    #[serde(default)]
    pub serving: Option<SideDto>,
    /// Set number to start at; defaults to 1.
    #[serde(default)]
    pub set_number: Option<u8>,
}

/// Incoming roster definition for one side.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RosterInput {
    /// Team display name.
    #[validate(custom(function = "crate::dto::validation::validate_display_name"))]
    pub name: String,
    /// Cosmetic theme identifier.
    #[serde(default)]
    pub theme: Option<String>,
    /// Starting lineup in serve-rotation order; exactly six players.
    #[validate(length(min = 6, max = 6), nested)]
    pub court: Vec<PlayerInput>,
    /// Bench players.
    #[serde(default)]
    #[validate(nested)]
    pub bench: Vec<PlayerInput>,
    /// Liberos. Anyone listed here is a libero for the whole match.
    #[serde(default)]
    #[validate(nested)]
    pub liberos: Vec<PlayerInput>,
}

/// Incoming player definition.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct PlayerInput {
    /// Jersey number, unique within the team.
    pub number: u8,
    /// Display name.
    #[validate(custom(function = "crate::dto::validation::validate_display_name"))]
    pub name: String,
    /// Positional label (setter, outside, ...).
    #[serde(default)]
    pub position: Option<String>,
}

/// Serve variant on the wire.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServeTypeDto {
    /// Standing float serve.
    Float,
    /// Jump spin serve.
    Jump,
    /// Jump float serve.
    JumpFloat,
}

impl From<ServeTypeDto> for ServeKind {
    fn from(value: ServeTypeDto) -> Self {
        match value {
            ServeTypeDto::Float => ServeKind::Float,
            ServeTypeDto::Jump => ServeKind::Jump,
            ServeTypeDto::JumpFloat => ServeKind::JumpFloat,
        }
    }
}

/// Serve result on the wire.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServeResultDto {
    /// Immediate point for the serving team.
    Ace,
    /// Immediate point for the receiving team.
    Error,
    /// Rally continues.
    InPlay,
}

impl From<ServeResultDto> for ServeResult {
    fn from(value: ServeResultDto) -> Self {
        match value {
            ServeResultDto::Ace => ServeResult::Ace,
            ServeResultDto::Error => ServeResult::Error,
            ServeResultDto::InPlay => ServeResult::InPlay,
        }
    }
}

/// Set variant on the wire.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SetTypeDto {
    /// High outside ball.
    High,
    /// Quick middle ball.
    Quick,
    /// Back set.
    Back,
    /// Pipe set.
    Pipe,
    /// Setter dump.
    Dump,
}

impl From<SetTypeDto> for SetKind {
    fn from(value: SetTypeDto) -> Self {
        match value {
            SetTypeDto::High => SetKind::High,
            SetTypeDto::Quick => SetKind::Quick,
            SetTypeDto::Back => SetKind::Back,
            SetTypeDto::Pipe => SetKind::Pipe,
            SetTypeDto::Dump => SetKind::Dump,
        }
    }
}

/// Attack variant on the wire.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttackTypeDto {
    /// Full swing.
    Spike,
    /// Off-speed tip.
    Tip,
    /// Back-row attack.
    BackRow,
}

impl From<AttackTypeDto> for AttackKind {
    fn from(value: AttackTypeDto) -> Self {
        match value {
            AttackTypeDto::Spike => AttackKind::Spike,
            AttackTypeDto::Tip => AttackKind::Tip,
            AttackTypeDto::BackRow => AttackKind::BackRow,
        }
    }
}

/// Attack resolution on the wire.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttackResultDto {
    /// Point to the attacking side.
    Kill,
    /// Point to the defending side.
    Error,
    /// Rally continues on the defending side.
    Dig,
}

impl From<AttackResultDto> for AttackCall {
    fn from(value: AttackResultDto) -> Self {
        match value {
            AttackResultDto::Kill => AttackCall::Kill,
            AttackResultDto::Error => AttackCall::Error,
            AttackResultDto::Dig => AttackCall::Dig,
        }
    }
}

/// Block resolution on the wire.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlockOutcomeDto {
    /// Point to the attacking side.
    TouchOut,
    /// Point to the blocking side.
    Shutdown,
    /// Rally continues on the blocking side.
    SoftBlock,
    /// Ball rebounds to the attacking side.
    Rebound,
}

impl From<BlockOutcomeDto> for BlockCall {
    fn from(value: BlockOutcomeDto) -> Self {
        match value {
            BlockOutcomeDto::TouchOut => BlockCall::TouchOut,
            BlockOutcomeDto::Shutdown => BlockCall::Shutdown,
            BlockOutcomeDto::SoftBlock => BlockCall::SoftBlock,
            BlockOutcomeDto::Rebound => BlockCall::Rebound,
        }
    }
}

/// One scorer action dispatched into the rally state machine. The internal
/// serve trigger is deliberately absent: only the auto-advance timer may fire
/// it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionRequest {
    /// Player tap, interpreted by the current phase.
    SelectPlayer {
        /// Tapped player id.
        player: Uuid,
    },
    /// Court tap recording the ball's landing point.
    SelectLandingPoint {
        /// Horizontal coordinate, 0..=1.
        x: f32,
        /// Vertical coordinate, 0..=1.
        y: f32,
        /// Side the ball landed on.
        side: SideDto,
    },
    /// Choose the serve variant.
    SetServeType {
        /// Serve variant.
        kind: ServeTypeDto,
    },
    /// Resolve the serve.
    SetServeResult {
        /// Serve outcome.
        result: ServeResultDto,
    },
    /// Grade the reception.
    SetReceptionGrade {
        /// Pass grade, 0 to 3.
        grade: u8,
    },
    /// Choose the set variant.
    SetSetType {
        /// Set variant.
        kind: SetTypeDto,
    },
    /// Choose the attack variant.
    SetAttackType {
        /// Attack variant.
        kind: AttackTypeDto,
    },
    /// Resolve an attack that came down.
    AttackResult {
        /// Resolution.
        call: AttackResultDto,
    },
    /// Report that the block touched the ball.
    BlockDetected,
    /// Toggle a defender in or out of the block credit.
    ToggleBlocker {
        /// Defender id.
        player: Uuid,
    },
    /// Close the blocker multi-select.
    ConfirmBlock,
    /// Resolve the block touch.
    BlockOutcome {
        /// Resolution.
        call: BlockOutcomeDto,
    },
    /// Open a bench substitution workflow.
    RequestSubstitution {
        /// Acting side.
        team: SideDto,
    },
    /// Open a libero exchange workflow.
    RequestLiberoSwap {
        /// Acting side.
        team: SideDto,
    },
    /// Spend a timeout.
    RequestTimeout {
        /// Calling side.
        team: SideDto,
    },
    /// Resume play after a timeout.
    EndTimeout,
    /// Referee call: winning side and reason.
    RefereeDecision {
        /// Awarded side.
        winner: SideDto,
        /// Reason, verbatim.
        reason: String,
    },
    /// Challenge outcome entered by the scorer.
    ChallengeResult {
        /// Challenging side.
        team: SideDto,
        /// Whether the challenge was upheld.
        success: bool,
        /// Reason, verbatim.
        reason: String,
    },
    /// Step one rally sub-phase backwards.
    Undo,
    /// Abandon the open substitution/timeout workflow.
    Cancel,
}

impl From<ActionRequest> for Action {
    fn from(value: ActionRequest) -> Self {
        match value {
            ActionRequest::SelectPlayer { player } => Action::SelectPlayer { player },
            ActionRequest::SelectLandingPoint { x, y, side } => Action::SelectLandingPoint {
                x,
                y,
                side: side.into(),
            },
            ActionRequest::SetServeType { kind } => Action::SetServeType { kind: kind.into() },
            ActionRequest::SetServeResult { result } => Action::SetServeResult {
                result: result.into(),
            },
            ActionRequest::SetReceptionGrade { grade } => Action::SetReceptionGrade { grade },
            ActionRequest::SetSetType { kind } => Action::SetSetType { kind: kind.into() },
            ActionRequest::SetAttackType { kind } => Action::SetAttackType { kind: kind.into() },
            ActionRequest::AttackResult { call } => Action::AttackResult { call: call.into() },
            ActionRequest::BlockDetected => Action::BlockDetected,
            ActionRequest::ToggleBlocker { player } => Action::ToggleBlocker { player },
            ActionRequest::ConfirmBlock => Action::ConfirmBlock,
            ActionRequest::BlockOutcome { call } => Action::BlockOutcome { call: call.into() },
            ActionRequest::RequestSubstitution { team } => {
                Action::RequestSubstitution { team: team.into() }
            }
            ActionRequest::RequestLiberoSwap { team } => {
                Action::RequestLiberoSwap { team: team.into() }
            }
            ActionRequest::RequestTimeout { team } => Action::RequestTimeout { team: team.into() },
            ActionRequest::EndTimeout => Action::EndTimeout,
            ActionRequest::RefereeDecision { winner, reason } => Action::RefereeDecision {
                winner: winner.into(),
                reason,
            },
            ActionRequest::ChallengeResult {
                team,
                success,
                reason,
            } => Action::ChallengeResult {
                team: team.into(),
                success,
                reason,
            },
            ActionRequest::Undo => Action::Undo,
            ActionRequest::Cancel => Action::Cancel,
        }
    }
}

/// Outcome of one dispatched action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Whether the action was applied.
    pub applied: bool,
    /// Rejection reason when the action was ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Rule warnings raised while applying.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Phase after the dispatch.
    pub phase: VisiblePhase,
    /// Score after the dispatch.
    pub score: ScoreSnapshot,
    /// Serving side after the dispatch.
    pub serving_team: SideDto,
    /// State version after the dispatch.
    pub version: u64,
}

/// Request to finalize the current set. The caller performs the 25/15
/// win-by-two threshold check; the backend only archives and reseeds.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FinalizeSetRequest {
    /// Side that took the set.
    pub winner: SideDto,
    /// Side to serve first in the next set; defaults to the set loser.
    #[serde(default)]
    pub next_serving: Option<SideDto>,
}

/// Confirmation of a finalized set.
#[derive(Debug, Serialize, ToSchema)]
pub struct FinalizeSetResponse {
    /// Archive id of the completed set.
    pub archived_set: Uuid,
    /// Number of the completed set.
    pub completed_set_number: u8,
    /// Number of the freshly seeded set.
    pub next_set_number: u8,
    /// Final score of the completed set.
    pub score: ScoreSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_requests_deserialize_from_tagged_json() {
        let request: ActionRequest =
            serde_json::from_str(r#"{"type": "set_reception_grade", "grade": 2}"#)
                .expect("valid action");
        assert!(matches!(
            request,
            ActionRequest::SetReceptionGrade { grade: 2 }
        ));

        let request: ActionRequest = serde_json::from_str(
            r#"{"type": "select_landing_point", "x": 0.5, "y": 0.25, "side": "away"}"#,
        )
        .expect("valid action");
        assert!(matches!(
            request,
            ActionRequest::SelectLandingPoint {
                side: SideDto::Away,
                ..
            }
        ));
    }

    #[test]
    fn unknown_action_tags_are_rejected() {
        let result = serde_json::from_str::<ActionRequest>(r#"{"type": "moonball"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn internal_serve_trigger_is_not_wire_reachable() {
        let result = serde_json::from_str::<ActionRequest>(
            r#"{"type": "begin_serve", "expected_version": 0}"#,
        );
        assert!(result.is_err());
    }
}
