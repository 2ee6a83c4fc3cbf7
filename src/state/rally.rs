//! The rally state machine: the phase graph, the typed action set, and the
//! total `dispatch` reducer. Every state change of a running match flows
//! through here; actions that do not fit the current phase are rejected
//! without mutating anything, so callers may dispatch speculatively.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{
    match_state::{
        AttackCall, AttackKind, BlockCall, Landing, LogLevel, MatchState, RallyData, RallyEvent,
        ServeKind, ServeResult, SetKind,
    },
    roster::Side,
    swap::{SwapKind, SwapStep},
};

/// Phase of the match, mostly tracking the rally in progress. The
/// substitution and timeout phases are idle side-workflows reachable only
/// between rallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MatchPhase {
    /// Between rallies; auto-advances to the serve after a short delay.
    PreServe,
    /// Waiting for the serve type and result.
    Serve,
    /// Waiting for the landing point of an in-play serve.
    ServeLanding,
    /// Waiting for the receiver and the pass grade.
    Reception,
    /// Waiting for the setter and the set type.
    Set,
    /// Waiting for the attacker and the attack type.
    Attack,
    /// Waiting for the landing point of an attack.
    Landing,
    /// Waiting for the resolution of an attack that came down.
    DigDecision,
    /// Waiting for the resolution of a block touch.
    BlockResult,
    /// Multi-select of the defenders credited with the block.
    SelectBlockers,
    /// Waiting for the covering player after a rebound off the block.
    Cover,
    /// Two-tap substitution or libero-swap workflow.
    Substitution {
        /// Side performing the exchange.
        team: Side,
        /// Bench substitution or libero exchange.
        kind: SwapKind,
        /// Progress of the two-tap protocol.
        step: SwapStep,
    },
    /// Timeout hold; the countdown itself is presentational.
    Timeout {
        /// Side that called the timeout.
        team: Side,
    },
}

/// Every message the state machine accepts. One variant per UI action, plus
/// the internal serve trigger fired by the auto-advance timer.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Player tap; interpreted by the current phase (receiver, setter,
    /// attacker, cover, or exchange selection).
    SelectPlayer {
        /// Tapped player id.
        player: Uuid,
    },
    /// Court tap recording where the ball came down.
    SelectLandingPoint {
        /// Horizontal coordinate, 0..=1.
        x: f32,
        /// Vertical coordinate, 0..=1.
        y: f32,
        /// Side of the net the ball landed on.
        side: Side,
    },
    /// Choose the serve variant.
    SetServeType {
        /// Serve variant.
        kind: ServeKind,
    },
    /// Resolve the serve.
    SetServeResult {
        /// Serve outcome.
        result: ServeResult,
    },
    /// Grade the reception, 0 (error) to 3 (perfect).
    SetReceptionGrade {
        /// Pass grade.
        grade: u8,
    },
    /// Choose the set variant; `Dump` short-circuits to the landing phase.
    SetSetType {
        /// Set variant.
        kind: SetKind,
    },
    /// Choose the attack variant.
    SetAttackType {
        /// Attack variant.
        kind: AttackKind,
    },
    /// Resolve an attack that came down on the defending side.
    AttackResult {
        /// Resolution.
        call: AttackCall,
    },
    /// The scorer saw the block touch the ball.
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
        call: BlockCall,
    },
    /// Open a bench substitution workflow for one side.
    RequestSubstitution {
        /// Acting side.
        team: Side,
    },
    /// Open a libero exchange workflow for one side.
    RequestLiberoSwap {
        /// Acting side.
        team: Side,
    },
    /// Spend a timeout.
    RequestTimeout {
        /// Calling side.
        team: Side,
    },
    /// Resume play after a timeout.
    EndTimeout,
    /// Referee settles (or overturns) a point: roll back the last point when
    /// a snapshot exists, then award to the named winner.
    RefereeDecision {
        /// Side the referee awarded the point to.
        winner: Side,
        /// Referee's reason, verbatim.
        reason: String,
    },
    /// Outcome of a video challenge entered by the scorer.
    ChallengeResult {
        /// Challenging side.
        team: Side,
        /// Whether the challenge was upheld.
        success: bool,
        /// Challenge reason, verbatim.
        reason: String,
    },
    /// Step one rally sub-phase backwards.
    Undo,
    /// Abandon the open substitution/timeout workflow.
    Cancel,
    /// Internal: fired by the auto-advance timer to move pre-serve into the
    /// serve phase. The version guard voids stale timers.
    BeginServe {
        /// State version the timer was armed against.
        expected_version: u64,
    },
}

/// Result of dispatching one action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The action was applied; the state advanced.
    Applied {
        /// Rule warnings surfaced to the scorer (play continues).
        warnings: Vec<String>,
    },
    /// The action did not fit the current phase/team/player; nothing changed.
    Rejected {
        /// Why the action was ignored.
        reason: String,
    },
}

impl Outcome {
    /// An applied outcome with no warnings.
    pub fn applied() -> Self {
        Outcome::Applied {
            warnings: Vec::new(),
        }
    }

    /// An applied outcome carrying one rule warning.
    pub fn applied_with_warning(warning: impl Into<String>) -> Self {
        Outcome::Applied {
            warnings: vec![warning.into()],
        }
    }

    /// A rejection with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Outcome::Rejected {
            reason: reason.into(),
        }
    }

    /// Whether the action was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }
}

impl MatchState {
    /// Process one action to completion. Total over the action set: anything
    /// that does not fit the current state is rejected, never thrown. The
    /// state version advances once per applied action.
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        let outcome = self.apply_action(action);
        if outcome.is_applied() {
            self.version += 1;
        }
        outcome
    }

    fn apply_action(&mut self, action: Action) -> Outcome {
        match action {
            Action::BeginServe { expected_version } => self.begin_serve(expected_version),
            Action::SelectPlayer { player } => self.select_player(player),
            Action::SelectLandingPoint { x, y, side } => self.select_landing(x, y, side),
            Action::SetServeType { kind } => self.set_serve_kind(kind),
            Action::SetServeResult { result } => self.set_serve_result(result),
            Action::SetReceptionGrade { grade } => self.set_reception_grade(grade),
            Action::SetSetType { kind } => self.set_set_kind(kind),
            Action::SetAttackType { kind } => self.set_attack_kind(kind),
            Action::AttackResult { call } => self.attack_result(call),
            Action::BlockDetected => self.block_detected(),
            Action::ToggleBlocker { player } => self.toggle_blocker(player),
            Action::ConfirmBlock => self.confirm_block(),
            Action::BlockOutcome { call } => self.block_outcome(call),
            Action::RequestSubstitution { team } => self.request_exchange(team, SwapKind::Bench),
            Action::RequestLiberoSwap { team } => self.request_exchange(team, SwapKind::Libero),
            Action::RequestTimeout { team } => self.request_timeout(team),
            Action::EndTimeout => self.end_timeout(),
            Action::RefereeDecision { winner, reason } => self.referee_decision(winner, &reason),
            Action::ChallengeResult {
                team,
                success,
                reason,
            } => self.challenge_result(team, success, &reason),
            Action::Undo => self.undo(),
            Action::Cancel => self.cancel(),
        }
    }

    /// Start the serve: reset the rally scratch, pick the server from the
    /// serving team's service slot, and warn when a libero stands there.
    fn begin_serve(&mut self, expected_version: u64) -> Outcome {
        if self.phase != MatchPhase::PreServe {
            return Outcome::rejected("serve can only begin from pre-serve");
        }
        if self.version != expected_version {
            return Outcome::rejected("stale serve trigger");
        }

        self.rally = RallyData::default();
        self.undo_trail.clear();
        self.possession = self.serving_team;
        let server = self.teams[self.serving_team].court[0].clone();
        self.rally.server = Some(server.id);
        self.phase = MatchPhase::Serve;

        if server.is_libero {
            let warning = format!(
                "{}: libero {} is in the service position",
                self.serving_team.label(),
                server.tag()
            );
            self.log(LogLevel::Warning, warning.clone());
            return Outcome::applied_with_warning(warning);
        }
        Outcome::applied()
    }

    fn set_serve_kind(&mut self, kind: ServeKind) -> Outcome {
        if self.phase != MatchPhase::Serve {
            return Outcome::rejected("no serve is pending");
        }
        self.push_rally_step();
        self.rally.serve_kind = Some(kind);
        Outcome::applied()
    }

    fn set_serve_result(&mut self, result: ServeResult) -> Outcome {
        if self.phase != MatchPhase::Serve {
            return Outcome::rejected("no serve is pending");
        }
        let Some(kind) = self.rally.serve_kind else {
            return Outcome::rejected("select a serve type first");
        };
        let Some(server) = self.rally.server else {
            return Outcome::rejected("no server recorded");
        };

        self.push_rally_step();
        self.rally.serve_result = Some(result);
        self.rally.events.push(RallyEvent::Serve {
            team: self.serving_team,
            player: server,
            kind,
            result,
        });

        match result {
            ServeResult::Error => {
                self.award_point(self.serving_team.opponent(), "service error");
            }
            ServeResult::Ace => {
                self.award_point(self.serving_team, "service ace");
            }
            ServeResult::InPlay => {
                self.phase = MatchPhase::ServeLanding;
            }
        }
        Outcome::applied()
    }

    fn select_landing(&mut self, x: f32, y: f32, side: Side) -> Outcome {
        match self.phase {
            MatchPhase::ServeLanding => {
                if side != self.serving_team.opponent() {
                    return Outcome::rejected("an in-play serve lands on the receiving side");
                }
                self.push_rally_step();
                self.rally.landing = Some(Landing { x, y, side });
                self.possession = side;
                self.phase = MatchPhase::Reception;
                Outcome::applied()
            }
            MatchPhase::Landing => {
                if side != self.possession.opponent() {
                    return Outcome::rejected("an attack lands on the defending side");
                }
                self.push_rally_step();
                self.rally.landing = Some(Landing { x, y, side });
                self.phase = MatchPhase::DigDecision;
                Outcome::applied()
            }
            _ => Outcome::rejected("no landing point is expected now"),
        }
    }

    /// Route a player tap to whatever the current phase is waiting for.
    fn select_player(&mut self, player: Uuid) -> Outcome {
        match self.phase.clone() {
            MatchPhase::Reception => self.select_on_court(player, |state, player| {
                state.rally.receiver = Some(player);
            }),
            MatchPhase::Set => self.select_on_court(player, |state, player| {
                state.rally.setter = Some(player);
            }),
            MatchPhase::Attack => self.select_on_court(player, |state, player| {
                state.rally.attacker = Some(player);
            }),
            MatchPhase::Cover => self.select_cover(player),
            MatchPhase::Substitution { .. } => self.swap_select(player),
            _ => Outcome::rejected("no player selection is expected now"),
        }
    }

    /// Record a selection that must name a player on the possessing side's
    /// court.
    fn select_on_court(
        &mut self,
        player: Uuid,
        record: impl FnOnce(&mut MatchState, Uuid),
    ) -> Outcome {
        if !self.teams[self.possession].is_on_court(player) {
            return Outcome::rejected(format!(
                "player is not on the {} court",
                self.possession.label()
            ));
        }
        self.push_rally_step();
        record(self, player);
        Outcome::applied()
    }

    fn select_cover(&mut self, player: Uuid) -> Outcome {
        self.select_on_court(player, |state, player| {
            state.rally.events.push(RallyEvent::Cover {
                team: state.possession,
                player,
            });
            state.rally.reset_swing();
            state.phase = MatchPhase::Set;
        })
    }

    fn set_reception_grade(&mut self, grade: u8) -> Outcome {
        if self.phase != MatchPhase::Reception {
            return Outcome::rejected("no reception is pending");
        }
        if grade > 3 {
            return Outcome::rejected("reception grade runs 0 to 3");
        }
        let Some(receiver) = self.rally.receiver else {
            return Outcome::rejected("select the receiving player first");
        };

        self.push_rally_step();
        self.rally.reception_grade = Some(grade);
        self.rally.events.push(RallyEvent::Reception {
            team: self.possession,
            player: receiver,
            grade,
        });

        if grade == 0 {
            self.award_point(self.possession.opponent(), "reception error");
        } else {
            self.phase = MatchPhase::Set;
        }
        Outcome::applied()
    }

    fn set_set_kind(&mut self, kind: SetKind) -> Outcome {
        if self.phase != MatchPhase::Set {
            return Outcome::rejected("no set is pending");
        }
        let Some(setter) = self.rally.setter else {
            return Outcome::rejected("select the setter first");
        };

        self.push_rally_step();
        self.rally.set_kind = Some(kind);
        self.rally.events.push(RallyEvent::Set {
            team: self.possession,
            player: setter,
            kind,
        });

        if kind == SetKind::Dump {
            // The setter attacks on the second contact; skip the attack phase.
            self.rally.attacker = Some(setter);
            self.rally.attack_kind = Some(AttackKind::Dump);
            self.phase = MatchPhase::Landing;
        } else {
            self.phase = MatchPhase::Attack;
        }
        Outcome::applied()
    }

    fn set_attack_kind(&mut self, kind: AttackKind) -> Outcome {
        if self.phase != MatchPhase::Attack {
            return Outcome::rejected("no attack is pending");
        }
        if self.rally.attacker.is_none() {
            return Outcome::rejected("select the attacker first");
        }
        self.push_rally_step();
        self.rally.attack_kind = Some(kind);
        self.phase = MatchPhase::Landing;
        Outcome::applied()
    }

    fn attack_result(&mut self, call: AttackCall) -> Outcome {
        if self.phase != MatchPhase::DigDecision {
            return Outcome::rejected("no attack resolution is pending");
        }
        let Some(event) = self.attack_event(Some(call)) else {
            return Outcome::rejected("no attack recorded");
        };

        self.push_rally_step();
        self.rally.events.push(event);

        match call {
            AttackCall::Kill => self.award_point(self.possession, "kill"),
            AttackCall::Error => {
                self.award_point(self.possession.opponent(), "attack error");
            }
            AttackCall::Dig => {
                let defenders = self.possession.opponent();
                self.rally.events.push(RallyEvent::Dig {
                    team: defenders,
                    player: None,
                });
                self.possession = defenders;
                self.rally.reset_swing();
                self.phase = MatchPhase::Set;
            }
        }
        Outcome::applied()
    }

    fn block_detected(&mut self) -> Outcome {
        if self.phase != MatchPhase::DigDecision {
            return Outcome::rejected("no attack resolution is pending");
        }
        let Some(event) = self.attack_event(None) else {
            return Outcome::rejected("no attack recorded");
        };

        self.push_rally_step();
        self.rally.events.push(event);
        self.rally.blockers.clear();
        self.phase = MatchPhase::BlockResult;
        Outcome::applied()
    }

    fn toggle_blocker(&mut self, player: Uuid) -> Outcome {
        if !matches!(
            self.phase,
            MatchPhase::BlockResult | MatchPhase::SelectBlockers
        ) {
            return Outcome::rejected("no block is being resolved");
        }
        let blocking = self.possession.opponent();
        if !self.teams[blocking].is_on_court(player) {
            return Outcome::rejected(format!(
                "blocker must be on the {} court",
                blocking.label()
            ));
        }

        self.push_rally_step();
        if let Some(index) = self.rally.blockers.iter().position(|id| *id == player) {
            self.rally.blockers.remove(index);
        } else {
            self.rally.blockers.push(player);
        }
        self.phase = MatchPhase::SelectBlockers;
        Outcome::applied()
    }

    fn confirm_block(&mut self) -> Outcome {
        if self.phase != MatchPhase::SelectBlockers {
            return Outcome::rejected("no blocker selection is open");
        }
        self.push_rally_step();
        self.phase = MatchPhase::BlockResult;
        Outcome::applied()
    }

    fn block_outcome(&mut self, call: BlockCall) -> Outcome {
        if !matches!(
            self.phase,
            MatchPhase::BlockResult | MatchPhase::SelectBlockers
        ) {
            return Outcome::rejected("no block is being resolved");
        }

        let blocking = self.possession.opponent();
        self.push_rally_step();
        self.rally.events.push(RallyEvent::Block {
            team: blocking,
            players: self.rally.blockers.clone(),
            call,
        });

        match call {
            BlockCall::TouchOut => self.award_point(self.possession, "touch out off the block"),
            BlockCall::Shutdown => self.award_point(blocking, "stuff block"),
            BlockCall::SoftBlock => {
                self.possession = blocking;
                self.rally.reset_swing();
                self.phase = MatchPhase::Reception;
            }
            BlockCall::Rebound => {
                self.rally.reset_swing();
                self.phase = MatchPhase::Cover;
            }
        }
        Outcome::applied()
    }

    fn request_exchange(&mut self, team: Side, kind: SwapKind) -> Outcome {
        if self.phase != MatchPhase::PreServe {
            return Outcome::rejected("exchanges are only available between rallies");
        }
        if kind == SwapKind::Bench
            && self.teams[team].subs_used >= self.limits.substitutions
        {
            return Outcome::rejected(format!(
                "{} has no substitutions left",
                team.label()
            ));
        }

        self.phase = MatchPhase::Substitution {
            team,
            kind,
            step: SwapStep::AwaitingIncoming,
        };
        Outcome::applied()
    }

    fn request_timeout(&mut self, team: Side) -> Outcome {
        if self.phase != MatchPhase::PreServe {
            return Outcome::rejected("timeouts are only available between rallies");
        }
        if self.teams[team].timeouts_used >= self.limits.timeouts {
            return Outcome::rejected(format!("{} has no timeouts left", team.label()));
        }

        self.teams[team].timeouts_used += 1;
        let message = format!(
            "timeout {} ({}/{})",
            team.label(),
            self.teams[team].timeouts_used,
            self.limits.timeouts
        );
        self.log(LogLevel::Info, message);
        self.phase = MatchPhase::Timeout { team };
        Outcome::applied()
    }

    fn end_timeout(&mut self) -> Outcome {
        if !matches!(self.phase, MatchPhase::Timeout { .. }) {
            return Outcome::rejected("no timeout is running");
        }
        self.phase = MatchPhase::PreServe;
        Outcome::applied()
    }

    /// Referee override: roll the last point back when a snapshot exists,
    /// then settle the point for the named winner through the canonical
    /// scoring routine.
    fn referee_decision(&mut self, winner: Side, reason: &str) -> Outcome {
        if let Some(snapshot) = self.previous_state.take() {
            self.restore(*snapshot);
            self.log(
                LogLevel::Warning,
                format!("referee override: last point rolled back ({reason})"),
            );
        }
        self.award_point(winner, reason);
        Outcome::applied()
    }

    fn challenge_result(&mut self, team: Side, success: bool, reason: &str) -> Outcome {
        if success {
            let Some(snapshot) = self.previous_state.take() else {
                return Outcome::rejected("no point available to roll back");
            };
            self.restore(*snapshot);
            self.log(
                LogLevel::Warning,
                format!(
                    "challenge upheld for {}: {reason}; last point rolled back",
                    team.label()
                ),
            );
            return Outcome::applied();
        }

        if self.teams[team].challenges_used >= self.limits.challenges {
            return Outcome::rejected(format!("{} has no challenges left", team.label()));
        }
        self.teams[team].challenges_used += 1;
        let message = format!(
            "challenge by {} failed: {reason} ({}/{})",
            team.label(),
            self.teams[team].challenges_used,
            self.limits.challenges
        );
        self.log(LogLevel::Info, message);
        Outcome::applied()
    }

    /// Walk one step back through the rally. Never crosses the rally start;
    /// with nothing to reverse the state is left byte-for-byte unchanged.
    fn undo(&mut self) -> Outcome {
        let Some(step) = self.undo_trail.pop() else {
            return Outcome::rejected("nothing to undo");
        };
        self.phase = step.phase;
        self.possession = step.possession;
        self.rally = step.rally;
        Outcome::applied()
    }

    fn cancel(&mut self) -> Outcome {
        match self.phase {
            MatchPhase::Substitution { .. } | MatchPhase::Timeout { .. } => {
                self.phase = MatchPhase::PreServe;
                Outcome::applied()
            }
            _ => Outcome::rejected("nothing to cancel"),
        }
    }

    /// Build an attack event from the current swing scratch, if one exists.
    fn attack_event(&self, call: Option<AttackCall>) -> Option<RallyEvent> {
        let player = self.rally.attacker?;
        let kind = self.rally.attack_kind?;
        Some(RallyEvent::Attack {
            team: self.possession,
            player,
            kind,
            call,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::match_state::RuleLimits;
    use crate::state::roster::{FRONT_LEFT, PerSide, Player, TeamSide};

    fn player(number: u8, libero: bool) -> Player {
        Player {
            id: Uuid::new_v4(),
            number,
            name: format!("P{number}"),
            position: if libero { "libero".into() } else { "outside".into() },
            is_libero: libero,
        }
    }

    fn team(name: &str) -> TeamSide {
        TeamSide::new(
            name.into(),
            "default".into(),
            [
                player(1, false),
                player(2, false),
                player(3, false),
                player(4, false),
                player(5, false),
                player(6, false),
            ],
            vec![player(7, false), player(8, false), player(9, false)],
            vec![player(10, true)],
        )
    }

    fn fresh() -> MatchState {
        MatchState::new(
            1,
            PerSide::new(team("Home"), team("Away")),
            Side::Home,
            RuleLimits::default(),
        )
    }

    fn begin(state: &mut MatchState) {
        let version = state.version;
        let outcome = state.dispatch(Action::BeginServe {
            expected_version: version,
        });
        assert!(outcome.is_applied(), "begin serve rejected: {outcome:?}");
    }

    fn court_id(state: &MatchState, side: Side, slot: usize) -> Uuid {
        state.teams[side].court[slot].id
    }

    /// Drive an in-play float serve from home, landing on the away side.
    fn serve_in_play(state: &mut MatchState) {
        begin(state);
        assert!(
            state
                .dispatch(Action::SetServeType {
                    kind: ServeKind::Float
                })
                .is_applied()
        );
        assert!(
            state
                .dispatch(Action::SetServeResult {
                    result: ServeResult::InPlay
                })
                .is_applied()
        );
        assert!(
            state
                .dispatch(Action::SelectLandingPoint {
                    x: 0.4,
                    y: 0.6,
                    side: Side::Away
                })
                .is_applied()
        );
        assert_eq!(state.phase, MatchPhase::Reception);
        assert_eq!(state.possession, Side::Away);
    }

    /// Drive a graded reception and a spike up to the dig decision.
    fn rally_to_dig_decision(state: &mut MatchState) {
        serve_in_play(state);
        let receiver = court_id(state, Side::Away, 0);
        assert!(state.dispatch(Action::SelectPlayer { player: receiver }).is_applied());
        assert!(state.dispatch(Action::SetReceptionGrade { grade: 2 }).is_applied());
        let setter = court_id(state, Side::Away, 4);
        assert!(state.dispatch(Action::SelectPlayer { player: setter }).is_applied());
        assert!(state.dispatch(Action::SetSetType { kind: SetKind::High }).is_applied());
        let attacker = court_id(state, Side::Away, 3);
        assert!(state.dispatch(Action::SelectPlayer { player: attacker }).is_applied());
        assert!(
            state
                .dispatch(Action::SetAttackType {
                    kind: AttackKind::Spike
                })
                .is_applied()
        );
        assert!(
            state
                .dispatch(Action::SelectLandingPoint {
                    x: 0.5,
                    y: 0.3,
                    side: Side::Home
                })
                .is_applied()
        );
        assert_eq!(state.phase, MatchPhase::DigDecision);
    }

    #[test]
    fn service_ace_scores_for_the_serving_team() {
        let mut state = fresh();
        begin(&mut state);
        state.dispatch(Action::SetServeType {
            kind: ServeKind::Jump,
        });
        state.dispatch(Action::SetServeResult {
            result: ServeResult::Ace,
        });

        assert_eq!(state.score[Side::Home], 1);
        assert_eq!(state.score[Side::Away], 0);
        assert_eq!(state.phase, MatchPhase::PreServe);
        assert_eq!(state.serving_team, Side::Home);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].reason, "service ace");
    }

    #[test]
    fn service_error_flips_serve_and_rotates_the_winner() {
        let mut state = fresh();
        let away_before: Vec<Uuid> = state.teams[Side::Away].court.iter().map(|p| p.id).collect();

        begin(&mut state);
        state.dispatch(Action::SetServeType {
            kind: ServeKind::Float,
        });
        state.dispatch(Action::SetServeResult {
            result: ServeResult::Error,
        });

        assert_eq!(state.score[Side::Away], 1);
        assert_eq!(state.serving_team, Side::Away);
        assert_eq!(state.phase, MatchPhase::PreServe);
        // Winner rotated: previous last slot serves next.
        assert_eq!(court_id(&state, Side::Away, 0), away_before[5]);
        assert_eq!(court_id(&state, Side::Away, 1), away_before[0]);
    }

    #[test]
    fn reception_error_scores_for_the_serving_team() {
        let mut state = fresh();
        serve_in_play(&mut state);
        let receiver = court_id(&state, Side::Away, 1);
        state.dispatch(Action::SelectPlayer { player: receiver });
        state.dispatch(Action::SetReceptionGrade { grade: 0 });

        assert_eq!(state.score[Side::Home], 1);
        assert_eq!(state.phase, MatchPhase::PreServe);
        assert_eq!(state.serving_team, Side::Home);
    }

    #[test]
    fn rally_through_kill_awards_and_hands_over_the_serve() {
        let mut state = fresh();
        rally_to_dig_decision(&mut state);
        state.dispatch(Action::AttackResult {
            call: AttackCall::Kill,
        });

        assert_eq!(state.score[Side::Away], 1);
        assert_eq!(state.serving_team, Side::Away);
        assert_eq!(state.phase, MatchPhase::PreServe);
        assert_eq!(state.history[0].reason, "kill");
    }

    #[test]
    fn dump_set_skips_the_attack_phase() {
        let mut state = fresh();
        serve_in_play(&mut state);
        let receiver = court_id(&state, Side::Away, 0);
        state.dispatch(Action::SelectPlayer { player: receiver });
        state.dispatch(Action::SetReceptionGrade { grade: 3 });
        let setter = court_id(&state, Side::Away, 4);
        state.dispatch(Action::SelectPlayer { player: setter });
        state.dispatch(Action::SetSetType {
            kind: SetKind::Dump,
        });

        assert_eq!(state.phase, MatchPhase::Landing);
        assert_eq!(state.rally.attacker, Some(setter));
        assert_eq!(state.rally.attack_kind, Some(AttackKind::Dump));
    }

    #[test]
    fn dig_flips_possession_and_returns_to_set() {
        let mut state = fresh();
        rally_to_dig_decision(&mut state);
        state.dispatch(Action::AttackResult {
            call: AttackCall::Dig,
        });

        assert_eq!(state.phase, MatchPhase::Set);
        assert_eq!(state.possession, Side::Home);
        assert_eq!(state.score[Side::Home], 0);
        assert_eq!(state.score[Side::Away], 0);
    }

    #[test]
    fn shutdown_block_scores_for_the_blocking_side() {
        let mut state = fresh();
        rally_to_dig_decision(&mut state);
        state.dispatch(Action::BlockDetected);
        assert_eq!(state.phase, MatchPhase::BlockResult);

        let blocker = court_id(&state, Side::Home, 4);
        state.dispatch(Action::ToggleBlocker { player: blocker });
        assert_eq!(state.phase, MatchPhase::SelectBlockers);
        state.dispatch(Action::ConfirmBlock);
        assert_eq!(state.phase, MatchPhase::BlockResult);
        state.dispatch(Action::BlockOutcome {
            call: BlockCall::Shutdown,
        });

        assert_eq!(state.score[Side::Home], 1);
        assert_eq!(state.phase, MatchPhase::PreServe);
        let block = state.history[0]
            .events
            .iter()
            .find(|e| matches!(e, RallyEvent::Block { .. }));
        match block {
            Some(RallyEvent::Block { players, call, .. }) => {
                assert_eq!(players, &vec![blocker]);
                assert_eq!(*call, BlockCall::Shutdown);
            }
            other => panic!("expected a block event, got {other:?}"),
        }
    }

    #[test]
    fn soft_block_continues_the_rally_on_the_blocking_side() {
        let mut state = fresh();
        rally_to_dig_decision(&mut state);
        state.dispatch(Action::BlockDetected);
        state.dispatch(Action::BlockOutcome {
            call: BlockCall::SoftBlock,
        });

        assert_eq!(state.phase, MatchPhase::Reception);
        assert_eq!(state.possession, Side::Home);
    }

    #[test]
    fn rebound_passes_through_cover_back_to_set() {
        let mut state = fresh();
        rally_to_dig_decision(&mut state);
        state.dispatch(Action::BlockDetected);
        state.dispatch(Action::BlockOutcome {
            call: BlockCall::Rebound,
        });
        assert_eq!(state.phase, MatchPhase::Cover);
        assert_eq!(state.possession, Side::Away);

        let cover = court_id(&state, Side::Away, 2);
        state.dispatch(Action::SelectPlayer { player: cover });
        assert_eq!(state.phase, MatchPhase::Set);
        assert_eq!(state.possession, Side::Away);
    }

    #[test]
    fn wrong_phase_actions_are_rejected_without_any_change() {
        let state = fresh();
        let mut probed = state.clone();

        for action in [
            Action::AttackResult {
                call: AttackCall::Kill,
            },
            Action::SetReceptionGrade { grade: 2 },
            Action::ConfirmBlock,
            Action::EndTimeout,
            Action::SelectLandingPoint {
                x: 0.1,
                y: 0.1,
                side: Side::Away,
            },
        ] {
            let outcome = probed.dispatch(action);
            assert!(matches!(outcome, Outcome::Rejected { .. }));
        }

        assert_eq!(probed, state);
    }

    #[test]
    fn score_increases_by_exactly_one_per_point() {
        let mut state = fresh();
        for expected in 1..=4u16 {
            begin(&mut state);
            state.dispatch(Action::SetServeType {
                kind: ServeKind::Float,
            });
            state.dispatch(Action::SetServeResult {
                result: ServeResult::Ace,
            });
            assert_eq!(state.score[Side::Home], expected);
            assert_eq!(state.score[Side::Away], 0);
        }
    }

    #[test]
    fn undo_steps_back_through_rally_subphases() {
        let mut state = fresh();
        begin(&mut state);
        state.dispatch(Action::SetServeType {
            kind: ServeKind::Jump,
        });
        state.dispatch(Action::SetServeResult {
            result: ServeResult::InPlay,
        });
        assert_eq!(state.phase, MatchPhase::ServeLanding);

        assert!(state.dispatch(Action::Undo).is_applied());
        assert_eq!(state.phase, MatchPhase::Serve);
        assert_eq!(state.rally.serve_result, None);
        assert_eq!(state.rally.serve_kind, Some(ServeKind::Jump));

        assert!(state.dispatch(Action::Undo).is_applied());
        assert_eq!(state.rally.serve_kind, None);
    }

    #[test]
    fn undo_with_nothing_to_reverse_is_a_strict_noop() {
        let mut state = fresh();
        begin(&mut state);
        let before = state.clone();

        let outcome = state.dispatch(Action::Undo);
        assert!(matches!(outcome, Outcome::Rejected { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn undo_never_crosses_the_rally_start() {
        let mut state = fresh();
        begin(&mut state);
        state.dispatch(Action::SetServeType {
            kind: ServeKind::Float,
        });
        state.dispatch(Action::SetServeResult {
            result: ServeResult::Ace,
        });
        assert_eq!(state.phase, MatchPhase::PreServe);

        let before = state.clone();
        let outcome = state.dispatch(Action::Undo);
        assert!(matches!(outcome, Outcome::Rejected { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn failed_challenge_changes_only_the_challenge_counter() {
        let mut state = fresh();
        begin(&mut state);
        state.dispatch(Action::SetServeType {
            kind: ServeKind::Float,
        });
        state.dispatch(Action::SetServeResult {
            result: ServeResult::Ace,
        });
        let after_point = state.clone();

        let outcome = state.dispatch(Action::ChallengeResult {
            team: Side::Away,
            success: false,
            reason: "net touch".into(),
        });
        assert!(outcome.is_applied());

        assert_eq!(state.teams[Side::Away].challenges_used, 1);
        assert_eq!(state.score, after_point.score);
        assert_eq!(state.serving_team, after_point.serving_team);
        assert_eq!(state.phase, after_point.phase);
        assert_eq!(state.teams[Side::Home], after_point.teams[Side::Home]);
        assert_eq!(
            state.teams[Side::Away].court,
            after_point.teams[Side::Away].court
        );
        assert_eq!(state.previous_state, after_point.previous_state);
    }

    #[test]
    fn successful_challenge_restores_the_pre_point_snapshot() {
        let mut state = fresh();
        begin(&mut state);
        state.dispatch(Action::SetServeType {
            kind: ServeKind::Float,
        });
        state.dispatch(Action::SetServeResult {
            result: ServeResult::Error,
        });
        assert_eq!(state.serving_team, Side::Away);
        let snapshot = state.previous_state.clone().expect("snapshot after point");

        let outcome = state.dispatch(Action::ChallengeResult {
            team: Side::Home,
            success: true,
            reason: "foot fault overturned".into(),
        });
        assert!(outcome.is_applied());

        // The version counter stays monotonic across the rollback and the
        // correction entry lands in the restored log; everything else is the
        // snapshot, bit for bit.
        let mut restored = state.clone();
        restored.version = snapshot.version;
        restored.logs = snapshot.logs.clone();
        assert_eq!(restored, *snapshot);
        assert_eq!(state.serving_team, Side::Home);
        assert_eq!(state.score[Side::Away], 0);
    }

    #[test]
    fn challenge_counter_is_bounded() {
        let mut state = fresh();
        state.teams[Side::Home].challenges_used = 2;
        let before = state.clone();

        let outcome = state.dispatch(Action::ChallengeResult {
            team: Side::Home,
            success: false,
            reason: "ball out".into(),
        });
        assert!(matches!(outcome, Outcome::Rejected { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn referee_decision_overturns_the_last_point() {
        let mut state = fresh();
        begin(&mut state);
        state.dispatch(Action::SetServeType {
            kind: ServeKind::Float,
        });
        state.dispatch(Action::SetServeResult {
            result: ServeResult::Ace,
        });
        assert_eq!(state.score[Side::Home], 1);

        state.dispatch(Action::RefereeDecision {
            winner: Side::Away,
            reason: "serve landed out".into(),
        });

        assert_eq!(state.score[Side::Home], 0);
        assert_eq!(state.score[Side::Away], 1);
        assert_eq!(state.serving_team, Side::Away);
        assert_eq!(state.phase, MatchPhase::PreServe);
    }

    #[test]
    fn substitution_two_tap_protocol_exchanges_bench_and_court() {
        let mut state = fresh();
        let incoming = state.teams[Side::Home].bench[0].id;
        let outgoing = court_id(&state, Side::Home, 4);

        assert!(
            state
                .dispatch(Action::RequestSubstitution { team: Side::Home })
                .is_applied()
        );
        assert!(state.dispatch(Action::SelectPlayer { player: incoming }).is_applied());
        assert!(state.dispatch(Action::SelectPlayer { player: outgoing }).is_applied());

        assert_eq!(court_id(&state, Side::Home, 4), incoming);
        assert!(state.teams[Side::Home].bench.iter().any(|p| p.id == outgoing));
        assert!(state.teams[Side::Home].bench.iter().all(|p| p.id != incoming));
        assert_eq!(state.teams[Side::Home].subs_used, 1);
        assert_eq!(state.phase, MatchPhase::PreServe);
    }

    #[test]
    fn substitutions_are_bounded_per_set() {
        let mut state = fresh();
        state.teams[Side::Home].subs_used = 6;
        let outcome = state.dispatch(Action::RequestSubstitution { team: Side::Home });
        assert!(matches!(outcome, Outcome::Rejected { .. }));
    }

    #[test]
    fn substitution_workflow_is_cancellable() {
        let mut state = fresh();
        let incoming = state.teams[Side::Home].bench[0].id;
        state.dispatch(Action::RequestSubstitution { team: Side::Home });
        state.dispatch(Action::SelectPlayer { player: incoming });

        assert!(state.dispatch(Action::Cancel).is_applied());
        assert_eq!(state.phase, MatchPhase::PreServe);
        assert_eq!(state.teams[Side::Home].subs_used, 0);
    }

    #[test]
    fn substitutions_are_blocked_mid_rally() {
        let mut state = fresh();
        begin(&mut state);
        let outcome = state.dispatch(Action::RequestSubstitution { team: Side::Home });
        assert!(matches!(outcome, Outcome::Rejected { .. }));
    }

    #[test]
    fn libero_enters_back_row_and_parks_the_original() {
        let mut state = fresh();
        let libero = state.teams[Side::Home].liberos[0].id;
        let outgoing = court_id(&state, Side::Home, 1);

        state.dispatch(Action::RequestLiberoSwap { team: Side::Home });
        state.dispatch(Action::SelectPlayer { player: libero });
        let outcome = state.dispatch(Action::SelectPlayer { player: outgoing });
        assert!(outcome.is_applied());

        assert_eq!(court_id(&state, Side::Home, 1), libero);
        assert_eq!(
            state.teams[Side::Home].libero_originals.get(&libero).map(|p| p.id),
            Some(outgoing)
        );
        assert!(state.teams[Side::Home].liberos.is_empty());
        assert_eq!(state.teams[Side::Home].subs_used, 0);
        assert_eq!(state.phase, MatchPhase::PreServe);
    }

    #[test]
    fn libero_front_row_entry_warns_and_clears_the_selection() {
        let mut state = fresh();
        let libero = state.teams[Side::Home].liberos[0].id;
        let front = court_id(&state, Side::Home, 4);

        state.dispatch(Action::RequestLiberoSwap { team: Side::Home });
        state.dispatch(Action::SelectPlayer { player: libero });
        let outcome = state.dispatch(Action::SelectPlayer { player: front });

        match outcome {
            Outcome::Applied { warnings } => assert!(!warnings.is_empty()),
            other => panic!("expected applied-with-warning, got {other:?}"),
        }
        // Lineup untouched, selection back to the first tap.
        assert_eq!(court_id(&state, Side::Home, 4), front);
        assert_eq!(
            state.phase,
            MatchPhase::Substitution {
                team: Side::Home,
                kind: SwapKind::Libero,
                step: SwapStep::AwaitingIncoming,
            }
        );
    }

    #[test]
    fn libero_leaves_and_the_original_returns() {
        let mut state = fresh();
        let libero = state.teams[Side::Home].liberos[0].id;
        let outgoing = court_id(&state, Side::Home, 2);

        state.dispatch(Action::RequestLiberoSwap { team: Side::Home });
        state.dispatch(Action::SelectPlayer { player: libero });
        state.dispatch(Action::SelectPlayer { player: outgoing });
        assert_eq!(court_id(&state, Side::Home, 2), libero);

        state.dispatch(Action::RequestLiberoSwap { team: Side::Home });
        state.dispatch(Action::SelectPlayer { player: outgoing });
        let outcome = state.dispatch(Action::SelectPlayer { player: libero });
        assert!(outcome.is_applied());

        assert_eq!(court_id(&state, Side::Home, 2), outgoing);
        assert!(state.teams[Side::Home].libero_originals.is_empty());
        assert!(state.teams[Side::Home].liberos.iter().any(|p| p.id == libero));
    }

    #[test]
    fn libero_rotating_to_front_row_is_swapped_back_on_serve_change() {
        let mut state = fresh();
        let libero = state.teams[Side::Away].liberos[0].id;
        let replaced = court_id(&state, Side::Away, 2);

        state.dispatch(Action::RequestLiberoSwap { team: Side::Away });
        state.dispatch(Action::SelectPlayer { player: libero });
        state.dispatch(Action::SelectPlayer { player: replaced });
        assert_eq!(court_id(&state, Side::Away, 2), libero);

        // Home serves into the net: away wins the point and rotates, pushing
        // the libero from the last back-row slot toward front-left.
        begin(&mut state);
        state.dispatch(Action::SetServeType {
            kind: ServeKind::Float,
        });
        state.dispatch(Action::SetServeResult {
            result: ServeResult::Error,
        });

        assert_eq!(court_id(&state, Side::Away, FRONT_LEFT), replaced);
        assert!(state.teams[Side::Away].libero_originals.is_empty());
        assert!(state.teams[Side::Away].liberos.iter().any(|p| p.id == libero));
        assert!(state.teams[Side::Away].court.iter().all(|p| !p.is_libero));
    }

    #[test]
    fn timeouts_are_bounded_per_set() {
        let mut state = fresh();
        for used in 1..=2u8 {
            assert!(
                state
                    .dispatch(Action::RequestTimeout { team: Side::Away })
                    .is_applied()
            );
            assert_eq!(state.teams[Side::Away].timeouts_used, used);
            assert!(state.dispatch(Action::EndTimeout).is_applied());
        }

        let before = state.clone();
        let outcome = state.dispatch(Action::RequestTimeout { team: Side::Away });
        assert!(matches!(outcome, Outcome::Rejected { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn stale_serve_trigger_is_voided_by_the_version_guard() {
        let mut state = fresh();
        let armed = state.version;
        state.dispatch(Action::RequestTimeout { team: Side::Home });
        state.dispatch(Action::EndTimeout);

        let outcome = state.dispatch(Action::BeginServe {
            expected_version: armed,
        });
        assert!(matches!(outcome, Outcome::Rejected { .. }));
        assert_eq!(state.phase, MatchPhase::PreServe);
    }

    #[test]
    fn libero_in_the_service_slot_raises_a_warning() {
        let mut state = fresh();
        let libero = state.teams[Side::Home].liberos[0].id;
        let server = court_id(&state, Side::Home, 0);

        state.dispatch(Action::RequestLiberoSwap { team: Side::Home });
        state.dispatch(Action::SelectPlayer { player: libero });
        state.dispatch(Action::SelectPlayer { player: server });

        let version = state.version;
        let outcome = state.dispatch(Action::BeginServe {
            expected_version: version,
        });
        match outcome {
            Outcome::Applied { warnings } => assert!(!warnings.is_empty()),
            other => panic!("expected a service warning, got {other:?}"),
        }
        assert_eq!(state.phase, MatchPhase::Serve);
    }
}
