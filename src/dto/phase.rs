use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{rally::MatchPhase, swap::SwapKind};

/// Match phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Between rallies, serve about to start.
    PreServe,
    /// Serve type/result entry.
    Serve,
    /// Landing point of an in-play serve.
    ServeLanding,
    /// Receiver and pass grade entry.
    Reception,
    /// Setter and set type entry.
    Set,
    /// Attacker and attack type entry.
    Attack,
    /// Landing point of an attack.
    Landing,
    /// Attack resolution entry.
    DigDecision,
    /// Block resolution entry.
    BlockResult,
    /// Blocker multi-select.
    SelectBlockers,
    /// Cover selection after a rebound.
    Cover,
    /// Bench substitution workflow.
    Substitution,
    /// Libero exchange workflow.
    LiberoSwap,
    /// Timeout hold.
    Timeout,
}

impl From<&MatchPhase> for VisiblePhase {
    fn from(value: &MatchPhase) -> Self {
        match value {
            MatchPhase::PreServe => VisiblePhase::PreServe,
            MatchPhase::Serve => VisiblePhase::Serve,
            MatchPhase::ServeLanding => VisiblePhase::ServeLanding,
            MatchPhase::Reception => VisiblePhase::Reception,
            MatchPhase::Set => VisiblePhase::Set,
            MatchPhase::Attack => VisiblePhase::Attack,
            MatchPhase::Landing => VisiblePhase::Landing,
            MatchPhase::DigDecision => VisiblePhase::DigDecision,
            MatchPhase::BlockResult => VisiblePhase::BlockResult,
            MatchPhase::SelectBlockers => VisiblePhase::SelectBlockers,
            MatchPhase::Cover => VisiblePhase::Cover,
            MatchPhase::Substitution {
                kind: SwapKind::Bench,
                ..
            } => VisiblePhase::Substitution,
            MatchPhase::Substitution {
                kind: SwapKind::Libero,
                ..
            } => VisiblePhase::LiberoSwap,
            MatchPhase::Timeout { .. } => VisiblePhase::Timeout,
        }
    }
}
