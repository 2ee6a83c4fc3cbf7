//! Two-tap substitution and libero-swap workflow. Entered from the pre-serve
//! idle phase only and fully independent of the rally phases; the first tap
//! picks the incoming player, the second the outgoing one, and the exchange
//! is applied atomically.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{
    match_state::{LogLevel, MatchState},
    rally::{MatchPhase, Outcome},
    roster::{Side, is_back_row},
};

/// Which exchange workflow is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapKind {
    /// Standard substitution against the bench; counted and bounded.
    Bench,
    /// Libero exchange; unlimited and uncounted.
    Libero,
}

/// Progress of the two-tap selection protocol, carried inside the
/// substitution phase instead of being inferred from a nullable selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SwapStep {
    /// Waiting for the first tap naming the incoming player.
    AwaitingIncoming,
    /// Waiting for the second tap naming the outgoing on-court player.
    AwaitingOutgoing {
        /// Incoming player locked in by the first tap.
        incoming: Uuid,
    },
}

impl MatchState {
    /// Handle a player tap while a substitution or libero-swap workflow is
    /// open. Assumes the current phase is [`MatchPhase::Substitution`].
    pub(crate) fn swap_select(&mut self, player: Uuid) -> Outcome {
        let MatchPhase::Substitution { team, kind, step } = self.phase.clone() else {
            return Outcome::rejected("no exchange workflow is open");
        };

        match step {
            SwapStep::AwaitingIncoming => self.swap_first_tap(team, kind, player),
            SwapStep::AwaitingOutgoing { incoming } => match kind {
                SwapKind::Bench => self.complete_bench_sub(team, incoming, player),
                SwapKind::Libero => self.complete_libero_swap(team, incoming, player),
            },
        }
    }

    /// Validate the first tap and arm the second.
    fn swap_first_tap(&mut self, team: Side, kind: SwapKind, player: Uuid) -> Outcome {
        let side = &self.teams[team];
        let eligible = match kind {
            SwapKind::Bench => side.bench_index_of(player).is_some(),
            // A libero coming on, or a parked original coming back for the
            // libero who replaced them.
            SwapKind::Libero => {
                side.libero_index_of(player).is_some() || side.libero_replacing(player).is_some()
            }
        };

        if !eligible {
            let pool = match kind {
                SwapKind::Bench => "bench",
                SwapKind::Libero => "libero exchange",
            };
            return Outcome::rejected(format!(
                "player is not eligible to come in for the {} {pool}",
                team.label()
            ));
        }

        self.phase = MatchPhase::Substitution {
            team,
            kind,
            step: SwapStep::AwaitingOutgoing { incoming: player },
        };
        Outcome::applied()
    }

    /// Apply a standard bench substitution and count it.
    fn complete_bench_sub(&mut self, team: Side, incoming: Uuid, outgoing: Uuid) -> Outcome {
        let side = &mut self.teams[team];
        let Some(slot) = side.court_slot_of(outgoing) else {
            return Outcome::rejected("outgoing player is not on court");
        };
        if side.court[slot].is_libero {
            return Outcome::rejected("an on-court libero leaves via a libero swap, not the bench");
        }
        let Some(bench_index) = side.bench_index_of(incoming) else {
            return Outcome::rejected("incoming player left the bench");
        };

        let incoming_player = side.bench.remove(bench_index);
        let outgoing_player = std::mem::replace(&mut side.court[slot], incoming_player);
        side.bench.push(outgoing_player);
        side.subs_used += 1;

        let message = {
            let side = &self.teams[team];
            format!(
                "substitution {}: {} in for {} ({}/{})",
                team.label(),
                side.court[slot].tag(),
                side.bench.last().map(|p| p.tag()).unwrap_or_default(),
                side.subs_used,
                self.limits.substitutions
            )
        };
        self.log(LogLevel::Info, message);
        self.phase = MatchPhase::PreServe;
        Outcome::applied()
    }

    /// Apply a libero exchange: either a libero coming on for a back-row
    /// player, or a parked original coming back for the libero.
    fn complete_libero_swap(&mut self, team: Side, incoming: Uuid, outgoing: Uuid) -> Outcome {
        let side = &self.teams[team];

        if side.libero_index_of(incoming).is_some() {
            return self.libero_on(team, incoming, outgoing);
        }
        if let Some(libero_id) = side.libero_replacing(incoming) {
            return self.libero_off(team, libero_id, outgoing);
        }
        Outcome::rejected("incoming player is no longer eligible for a libero exchange")
    }

    /// Libero enters the court at a back-row slot; the replaced player is
    /// parked in the originals map.
    fn libero_on(&mut self, team: Side, libero: Uuid, outgoing: Uuid) -> Outcome {
        let side = &mut self.teams[team];
        let Some(slot) = side.court_slot_of(outgoing) else {
            return Outcome::rejected("outgoing player is not on court");
        };
        if side.court[slot].is_libero {
            return Outcome::rejected("cannot exchange a libero for another libero");
        }

        // Front-row placement is illegal for a libero: warn, clear the
        // selection, and leave the lineup untouched.
        if !is_back_row(slot) {
            self.phase = MatchPhase::Substitution {
                team,
                kind: SwapKind::Libero,
                step: SwapStep::AwaitingIncoming,
            };
            let warning = format!(
                "{}: a libero may only enter a back-row position",
                team.label()
            );
            self.log(LogLevel::Warning, warning.clone());
            return Outcome::applied_with_warning(warning);
        }

        let Some(libero_index) = side.libero_index_of(libero) else {
            return Outcome::rejected("libero left the exchange pool");
        };
        let libero_player = side.liberos.remove(libero_index);
        let outgoing_player = std::mem::replace(&mut side.court[slot], libero_player);
        let message = format!(
            "libero {}: {} in for {}",
            team.label(),
            side.court[slot].tag(),
            outgoing_player.tag()
        );
        side.libero_originals.insert(libero, outgoing_player);

        self.log(LogLevel::Info, message);
        self.phase = MatchPhase::PreServe;
        Outcome::applied()
    }

    /// The parked original returns and the libero leaves the court; the
    /// originals entry is deleted.
    fn libero_off(&mut self, team: Side, libero: Uuid, outgoing: Uuid) -> Outcome {
        if outgoing != libero {
            return Outcome::rejected("the original may only replace the libero who came on for them");
        }

        let side = &mut self.teams[team];
        let Some(slot) = side.court_slot_of(libero) else {
            return Outcome::rejected("libero is not on court");
        };
        let Some(original) = side.libero_originals.shift_remove(&libero) else {
            return Outcome::rejected("no original recorded for this libero");
        };

        let libero_player = std::mem::replace(&mut side.court[slot], original);
        let message = format!(
            "libero {}: {} off, {} returns",
            team.label(),
            libero_player.tag(),
            side.court[slot].tag()
        );
        side.liberos.push(libero_player);

        self.log(LogLevel::Info, message);
        self.phase = MatchPhase::PreServe;
        Outcome::applied()
    }
}
