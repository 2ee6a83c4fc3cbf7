//! The root match aggregate: score, rosters, rally scratch data, the
//! append-only history and log ledgers, and the one canonical point-award
//! routine every scoring branch funnels through.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{
    rally::MatchPhase,
    roster::{FRONT_LEFT, PerSide, Side, TeamSide},
    rotation::{self, RotationCorrection},
};

/// Severity of a match log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Routine scorekeeping narration.
    Info,
    /// Rule warning the scorer should act on (play continues).
    Warning,
    /// Data inconsistency; the match keeps running in a degraded state.
    Danger,
}

/// One line of the human-readable audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic sequence number within the set.
    pub seq: u64,
    /// Severity.
    pub level: LogLevel,
    /// Narration text.
    pub message: String,
    /// Score at the time the entry was written.
    pub score: PerSide<u16>,
}

/// How the ball was put in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeKind {
    /// Standing float serve.
    Float,
    /// Jump spin serve.
    Jump,
    /// Jump float serve.
    JumpFloat,
}

/// Immediate result of a serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeResult {
    /// Untouched or unplayable; point to the serving team.
    Ace,
    /// Net or out; point to the receiving team.
    Error,
    /// Rally continues.
    InPlay,
}

/// Set (the ball-handling action) variant chosen by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetKind {
    /// High outside ball.
    High,
    /// Quick middle ball.
    Quick,
    /// Back set.
    Back,
    /// Pipe set to the back row.
    Pipe,
    /// Setter attacks on the second contact; skips the attack phase.
    Dump,
}

/// Attack variant chosen by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// Full swing.
    Spike,
    /// Off-speed tip.
    Tip,
    /// Attack from behind the three-meter line.
    BackRow,
    /// Setter dump (carried over from the set phase).
    Dump,
}

/// Resolution of an attack once the ball lands or is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackCall {
    /// Ball down on the defending side; point to the attackers.
    Kill,
    /// Out or into the net; point to the defenders.
    Error,
    /// Defended; rally continues on the defending side.
    Dig,
}

/// Resolution of a block touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCall {
    /// Ball deflected out off the block; point to the attackers.
    TouchOut,
    /// Stuff block straight down; point to the blockers.
    Shutdown,
    /// Slowed by the block and kept alive by the defense.
    SoftBlock,
    /// Ball rebounds back to the attacking side.
    Rebound,
}

/// Where the ball came down, in court-relative coordinates supplied by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landing {
    /// Horizontal coordinate, 0..=1 across the court width.
    pub x: f32,
    /// Vertical coordinate, 0..=1 along the court length.
    pub y: f32,
    /// Side of the net the ball landed on.
    pub side: Side,
}

/// A discrete touch recorded while a rally unfolds. These make up the event
/// list of each [`RallyRecord`] and feed the stats aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RallyEvent {
    /// A serve and its immediate result.
    Serve {
        /// Serving side.
        team: Side,
        /// Server id.
        player: Uuid,
        /// Serve variant.
        kind: ServeKind,
        /// Outcome.
        result: ServeResult,
    },
    /// A graded first-ball reception.
    Reception {
        /// Receiving side.
        team: Side,
        /// Receiver id.
        player: Uuid,
        /// Pass grade, 0 (error) to 3 (perfect).
        grade: u8,
    },
    /// A set touch.
    Set {
        /// Setting side.
        team: Side,
        /// Setter id.
        player: Uuid,
        /// Set variant.
        kind: SetKind,
    },
    /// An attack swing. `call` stays empty while the ball is still alive
    /// (e.g. when a block intervened).
    Attack {
        /// Attacking side.
        team: Side,
        /// Attacker id.
        player: Uuid,
        /// Attack variant.
        kind: AttackKind,
        /// Resolution, when the swing itself decided or continued the rally.
        call: Option<AttackCall>,
    },
    /// A block touch credited to one or more defenders.
    Block {
        /// Blocking side.
        team: Side,
        /// Blockers credited by the scorer.
        players: Vec<Uuid>,
        /// Resolution.
        call: BlockCall,
    },
    /// A successful defensive dig keeping the rally alive.
    Dig {
        /// Digging side.
        team: Side,
        /// Digger id, when the scorer identified one.
        player: Option<Uuid>,
    },
    /// A cover touch after a rebound off the block.
    Cover {
        /// Covering (attacking) side.
        team: Side,
        /// Covering player id.
        player: Uuid,
    },
}

/// Scratch data accumulated while the current rally unfolds. Reset at the
/// start of every rally; partially reset between swings of a long rally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RallyData {
    /// Player serving this rally (serving team slot 0 at serve time).
    pub server: Option<Uuid>,
    /// Chosen serve variant.
    pub serve_kind: Option<ServeKind>,
    /// Chosen serve result.
    pub serve_result: Option<ServeResult>,
    /// Last recorded landing point.
    pub landing: Option<Landing>,
    /// Receiver selected for the current reception.
    pub receiver: Option<Uuid>,
    /// Grade given to the current reception.
    pub reception_grade: Option<u8>,
    /// Setter selected for the current swing.
    pub setter: Option<Uuid>,
    /// Set variant for the current swing.
    pub set_kind: Option<SetKind>,
    /// Attacker selected for the current swing.
    pub attacker: Option<Uuid>,
    /// Attack variant for the current swing.
    pub attack_kind: Option<AttackKind>,
    /// Blockers toggled on for the pending block resolution.
    pub blockers: Vec<Uuid>,
    /// Ordered touches recorded so far this rally.
    pub events: Vec<RallyEvent>,
}

impl RallyData {
    /// Clear the per-swing fields when play continues on the other side of
    /// the net (dig, soft block, cover). The event list survives.
    pub fn reset_swing(&mut self) {
        self.landing = None;
        self.receiver = None;
        self.reception_grade = None;
        self.setter = None;
        self.set_kind = None;
        self.attacker = None;
        self.attack_kind = None;
        self.blockers.clear();
    }
}

/// One completed rally appended to the match history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyRecord {
    /// Side the point went to.
    pub winner: Side,
    /// Human-readable reason ("service ace", "kill", ...).
    pub reason: String,
    /// Score after the point was applied.
    pub score: PerSide<u16>,
    /// Touches recorded during the rally, in order.
    pub events: Vec<RallyEvent>,
}

/// Checkpoint pushed before every in-rally step so undo can walk backwards
/// through the rally one sub-phase at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyStep {
    /// Phase before the step was applied.
    pub phase: MatchPhase,
    /// Possession before the step was applied.
    pub possession: Side,
    /// Rally scratch data before the step was applied.
    pub rally: RallyData,
}

/// Per-set rule bounds. FIVB defaults; configurable for house rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleLimits {
    /// Standard substitutions allowed per team and set.
    pub substitutions: u8,
    /// Timeouts allowed per team and set.
    pub timeouts: u8,
    /// Failed challenges allowed per team and set.
    pub challenges: u8,
}

impl Default for RuleLimits {
    fn default() -> Self {
        Self {
            substitutions: 6,
            timeouts: 2,
            challenges: 2,
        }
    }
}

/// The whole state of one set in progress. Owned by [`AppState`] and mutated
/// exclusively through [`MatchState::dispatch`].
///
/// [`AppState`]: crate::state::AppState
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    /// Set number within the match, starting at 1.
    pub set_number: u8,
    /// Running score.
    pub score: PerSide<u16>,
    /// Current rally phase.
    pub phase: MatchPhase,
    /// Side holding serve.
    pub serving_team: Side,
    /// Side currently playing the ball.
    pub possession: Side,
    /// Both rosters with lineups and counters.
    pub teams: PerSide<TeamSide>,
    /// Rule bounds in force for this set.
    pub limits: RuleLimits,
    /// Scratch data for the rally in progress.
    pub rally: RallyData,
    /// Undo checkpoints for the rally in progress.
    pub undo_trail: Vec<RallyStep>,
    /// Snapshot taken just before the most recent point was awarded. Exactly
    /// one level of rollback; consumed by challenges and referee overrides.
    pub previous_state: Option<Box<MatchState>>,
    /// Completed rallies, append-only.
    pub history: Vec<RallyRecord>,
    /// Audit trail, newest first, append-only.
    pub logs: Vec<LogEntry>,
    /// Increments once per applied action; guards the serve auto-advance
    /// timer against firing on a state it was not armed for.
    pub version: u64,
}

impl MatchState {
    /// Seed a fresh set from two rosters.
    pub fn new(set_number: u8, teams: PerSide<TeamSide>, serving: Side, limits: RuleLimits) -> Self {
        Self {
            set_number,
            score: PerSide::new(0, 0),
            phase: MatchPhase::PreServe,
            serving_team: serving,
            possession: serving,
            teams,
            limits,
            rally: RallyData::default(),
            undo_trail: Vec::new(),
            previous_state: None,
            history: Vec::new(),
            logs: Vec::new(),
            version: 0,
        }
    }

    /// Append a log entry stamped with the current score. Newest entries sit
    /// at the front of the list; the log is append-only, so its length doubles
    /// as the next sequence number.
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry {
            seq: self.logs.len() as u64,
            level,
            message: message.into(),
            score: self.score.clone(),
        };
        self.logs.insert(0, entry);
    }

    /// Clone the whole state for the one-slot rollback ledger. The nested
    /// snapshot slot is emptied so rollback depth stays at exactly one.
    pub fn snapshot(&self) -> Box<MatchState> {
        let mut snap = self.clone();
        snap.previous_state = None;
        Box::new(snap)
    }

    /// Replace this state wholesale with a snapshot, keeping the live version
    /// counter monotonic across the rollback.
    pub fn restore(&mut self, snapshot: MatchState) {
        let version = self.version;
        *self = snapshot;
        self.version = version;
    }

    /// Push an undo checkpoint capturing the state of the rally before the
    /// next step mutates it.
    pub fn push_rally_step(&mut self) {
        self.undo_trail.push(RallyStep {
            phase: self.phase.clone(),
            possession: self.possession,
            rally: self.rally.clone(),
        });
    }

    /// The canonical scoring routine. Every branch that ends a rally funnels
    /// through here: snapshot, score, serve change with rotation, ledger
    /// entries, scratch reset, back to pre-serve.
    pub fn award_point(&mut self, winner: Side, reason: &str) {
        self.previous_state = Some(self.snapshot());

        self.score[winner] += 1;

        if winner != self.serving_team {
            self.rotate_side(winner);
            self.serving_team = winner;
        }
        self.possession = winner;

        self.log(
            LogLevel::Info,
            format!(
                "point {}: {} ({}-{})",
                winner.label(),
                reason,
                self.score.home,
                self.score.away
            ),
        );

        let events = std::mem::take(&mut self.rally.events);
        self.history.push(RallyRecord {
            winner,
            reason: reason.to_string(),
            score: self.score.clone(),
            events,
        });

        self.rally = RallyData::default();
        self.undo_trail.clear();
        self.phase = MatchPhase::PreServe;
    }

    /// Rotate one side's lineup and apply the libero correction, logging the
    /// outcome the way the rotation engine reported it.
    fn rotate_side(&mut self, side: Side) {
        let team = &mut self.teams[side];
        let lineup = team.court.clone();
        let originals = std::mem::take(&mut team.libero_originals);

        let outcome = rotation::rotate(lineup, originals);
        team.court = outcome.lineup;
        team.libero_originals = outcome.libero_originals;

        match outcome.correction {
            Some(RotationCorrection::LiberoReturned { libero, original: _ }) => {
                // The correction put the original back at front-left.
                let note = format!(
                    "{}: libero {} rotated to front row; {} returns",
                    side.label(),
                    libero.tag(),
                    self.teams[side].court[FRONT_LEFT].tag(),
                );
                self.teams[side].liberos.push(libero);
                self.log(LogLevel::Info, note);
            }
            Some(RotationCorrection::MissingOriginal { libero }) => {
                self.log(
                    LogLevel::Danger,
                    format!(
                        "{}: libero {} rotated to front row with no recorded original; left in place",
                        side.label(),
                        libero
                    ),
                );
            }
            None => {}
        }
    }

    /// Look up a player anywhere on one side (court, bench, liberos, parked
    /// originals).
    pub fn find_player(&self, side: Side, player: Uuid) -> Option<&crate::state::roster::Player> {
        let team = &self.teams[side];
        team.court
            .iter()
            .find(|p| p.id == player)
            .or_else(|| team.bench.iter().find(|p| p.id == player))
            .or_else(|| team.liberos.iter().find(|p| p.id == player))
            .or_else(|| team.libero_originals.values().find(|p| p.id == player))
    }
}
