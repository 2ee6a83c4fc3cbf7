//! Team identity, rosters, and court geometry shared by the rally engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of on-court slots per team.
pub const COURT_SLOTS: usize = 6;
/// First front-row slot (zone 4); rotation moves a back-row player into it.
pub const FRONT_LEFT: usize = 3;

/// One of the two competing sides of the net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The home team.
    Home,
    /// The away team.
    Away,
}

impl Side {
    /// The side across the net.
    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    /// Lowercase label used in log lines and wire payloads.
    pub fn label(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

/// True when `slot` belongs to the back row (zones 1, 6, 5 — the only slots a
/// libero may occupy).
pub fn is_back_row(slot: usize) -> bool {
    slot < FRONT_LEFT
}

/// A rostered player. Identity is the `id`; `is_libero` never changes for the
/// duration of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier, unique across both rosters.
    pub id: Uuid,
    /// Jersey number.
    pub number: u8,
    /// Display name.
    pub name: String,
    /// Positional label (setter, outside, middle, ...). Cosmetic only.
    pub position: String,
    /// Whether this player is a libero (back-row specialist).
    pub is_libero: bool,
}

impl Player {
    /// Short form used in log messages, e.g. `#12 Ana`.
    pub fn tag(&self) -> String {
        format!("#{} {}", self.number, self.name)
    }
}

/// Pair of values addressed by [`Side`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSide<T> {
    /// Value for the home side.
    pub home: T,
    /// Value for the away side.
    pub away: T,
}

impl<T> PerSide<T> {
    /// Build a pair from both values.
    pub fn new(home: T, away: T) -> Self {
        Self { home, away }
    }
}

impl<T> std::ops::Index<Side> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

impl<T> std::ops::IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }
}

/// Per-side roster, court lineup, and rule counters for the current set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSide {
    /// Team display name.
    pub name: String,
    /// Cosmetic theme identifier chosen during setup.
    pub theme: String,
    /// On-court lineup. Slot 0 is the service position (zone 1); the
    /// remaining slots walk zones 6, 5, 4, 3, 2 in serve-rotation order.
    pub court: [Player; COURT_SLOTS],
    /// Players available for standard substitutions.
    pub bench: Vec<Player>,
    /// Liberos currently off court.
    pub liberos: Vec<Player>,
    /// Replaced player keyed by the libero now standing in for them. An entry
    /// exists iff that libero is on court.
    #[serde(with = "indexmap::map::serde_seq")]
    pub libero_originals: IndexMap<Uuid, Player>,
    /// Standard substitutions spent this set.
    pub subs_used: u8,
    /// Timeouts spent this set.
    pub timeouts_used: u8,
    /// Challenges spent (failed) this set.
    pub challenges_used: u8,
}

impl TeamSide {
    /// Build a side from its roster lists with all counters zeroed.
    pub fn new(
        name: String,
        theme: String,
        court: [Player; COURT_SLOTS],
        bench: Vec<Player>,
        liberos: Vec<Player>,
    ) -> Self {
        Self {
            name,
            theme,
            court,
            bench,
            liberos,
            libero_originals: IndexMap::new(),
            subs_used: 0,
            timeouts_used: 0,
            challenges_used: 0,
        }
    }

    /// Court slot currently held by `player`, if any.
    pub fn court_slot_of(&self, player: Uuid) -> Option<usize> {
        self.court.iter().position(|p| p.id == player)
    }

    /// Whether `player` is currently on court.
    pub fn is_on_court(&self, player: Uuid) -> bool {
        self.court_slot_of(player).is_some()
    }

    /// Index of `player` on the bench, if present.
    pub fn bench_index_of(&self, player: Uuid) -> Option<usize> {
        self.bench.iter().position(|p| p.id == player)
    }

    /// Index of `player` among the off-court liberos, if present.
    pub fn libero_index_of(&self, player: Uuid) -> Option<usize> {
        self.liberos.iter().position(|p| p.id == player)
    }

    /// The libero id whose recorded original is `player`, if any. Used when a
    /// parked original is tapped to come back on.
    pub fn libero_replacing(&self, player: Uuid) -> Option<Uuid> {
        self.libero_originals
            .iter()
            .find(|(_, original)| original.id == player)
            .map(|(libero, _)| *libero)
    }

    /// Reset per-set counters when a new set begins. Rosters and lineups are
    /// carried over by the caller.
    pub fn reset_counters(&mut self) {
        self.subs_used = 0;
        self.timeouts_used = 0;
        self.challenges_used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_flips_sides() {
        assert_eq!(Side::Home.opponent(), Side::Away);
        assert_eq!(Side::Away.opponent(), Side::Home);
    }

    #[test]
    fn back_row_covers_first_three_slots() {
        assert!(is_back_row(0));
        assert!(is_back_row(1));
        assert!(is_back_row(2));
        assert!(!is_back_row(3));
        assert!(!is_back_row(4));
        assert!(!is_back_row(5));
    }

    #[test]
    fn per_side_indexes_by_side() {
        let mut pair = PerSide::new(1u16, 2u16);
        assert_eq!(pair[Side::Home], 1);
        assert_eq!(pair[Side::Away], 2);
        pair[Side::Away] = 7;
        assert_eq!(pair[Side::Away], 7);
    }
}
