//! Payloads carried on the public SSE stream.

use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{
    common::{LogEntrySummary, ScoreSnapshot, SideDto},
    match_view::MatchSummary,
    phase::VisiblePhase,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// SSE event name, when one applies.
    pub event: Option<String>,
    /// Serialized data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Build a plain-text event.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after every applied action.
pub struct PhaseChangedEvent {
    /// Phase after the action.
    pub phase: VisiblePhase,
    /// Score after the action.
    pub score: ScoreSnapshot,
    /// Serving side after the action.
    pub serving_team: SideDto,
    /// Possession after the action.
    pub possession: SideDto,
    /// State version after the action.
    pub version: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever a rally ends in a point.
pub struct PointScoredEvent {
    /// Side the point went to.
    pub winner: SideDto,
    /// Why the point was given.
    pub reason: String,
    /// Score after the point.
    pub score: ScoreSnapshot,
    /// Serving side after the point.
    pub serving_team: SideDto,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast for every fresh audit-trail entry.
pub struct LogAppendedEvent {
    /// The new entry.
    pub entry: LogEntrySummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a timeout begins; the countdown is client-side.
pub struct TimeoutStartedEvent {
    /// Side that called the timeout.
    pub team: SideDto,
    /// Seconds to count down from.
    pub seconds: u16,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Full-state snapshot broadcast after bootstrap, restore, and finalize.
pub struct MatchSnapshotEvent(pub MatchSummary);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// True while no storage backend is reachable.
    pub degraded: bool,
}
