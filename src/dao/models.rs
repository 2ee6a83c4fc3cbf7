//! Entities exchanged with the storage layer. The serialized [`MatchState`]
//! itself is the backup payload; nothing else is worth persisting about a set
//! in progress.

use std::time::SystemTime;

use uuid::Uuid;

use crate::state::{
    match_state::MatchState,
    roster::{PerSide, Side},
};

/// Durable backup of the set in progress, overwritten after every applied
/// action and reloaded on startup for crash recovery.
#[derive(Debug, Clone)]
pub struct MatchBackupEntity {
    /// When the backup was written.
    pub saved_at: SystemTime,
    /// The full match state at that moment.
    pub state: MatchState,
}

/// A completed set, archived when the scorer finalizes it.
#[derive(Debug, Clone)]
pub struct SetArchiveEntity {
    /// Archive identifier.
    pub id: Uuid,
    /// Set number within the match.
    pub set_number: u8,
    /// Home team name at completion time.
    pub home_name: String,
    /// Away team name at completion time.
    pub away_name: String,
    /// Final score of the set.
    pub score: PerSide<u16>,
    /// Side that took the set, as decided by the caller's threshold check.
    pub winner: Side,
    /// When the set was finalized.
    pub completed_at: SystemTime,
    /// Frozen match state, kept for stats replay.
    pub state: MatchState,
}

/// Listing row for archived sets; omits the frozen state.
#[derive(Debug, Clone)]
pub struct SetListItemEntity {
    /// Archive identifier.
    pub id: Uuid,
    /// Set number within the match.
    pub set_number: u8,
    /// Home team name at completion time.
    pub home_name: String,
    /// Away team name at completion time.
    pub away_name: String,
    /// Final score of the set.
    pub score: PerSide<u16>,
    /// Side that took the set.
    pub winner: Side,
    /// When the set was finalized.
    pub completed_at: SystemTime,
}
