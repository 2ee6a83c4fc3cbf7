//! Typed broadcast helpers for the public scoreboard stream.

use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        common::LogEntrySummary,
        match_view::MatchSummary,
        sse::{
            LogAppendedEvent, MatchSnapshotEvent, PhaseChangedEvent, PointScoredEvent, ServerEvent,
            SystemStatus, TimeoutStartedEvent,
        },
    },
    state::{SharedState, match_state::MatchState, roster::Side},
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_POINT_SCORED: &str = "point.scored";
const EVENT_LOG_APPENDED: &str = "log.appended";
const EVENT_TIMEOUT_STARTED: &str = "timeout.started";
const EVENT_MATCH_SNAPSHOT: &str = "match.snapshot";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the phase/score/possession envelope after an applied action.
pub fn broadcast_phase_changed(state: &SharedState, payload: PhaseChangedEvent) {
    send_public_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast a finished rally.
pub fn broadcast_point_scored(state: &SharedState, payload: PointScoredEvent) {
    send_public_event(state, EVENT_POINT_SCORED, &payload);
}

/// Broadcast one fresh audit-trail entry.
pub fn broadcast_log_appended(state: &SharedState, entry: LogEntrySummary) {
    send_public_event(state, EVENT_LOG_APPENDED, &LogAppendedEvent { entry });
}

/// Broadcast the start of a timeout countdown.
pub fn broadcast_timeout_started(state: &SharedState, team: Side, seconds: u16) {
    send_public_event(
        state,
        EVENT_TIMEOUT_STARTED,
        &TimeoutStartedEvent {
            team: team.into(),
            seconds,
        },
    );
}

/// Broadcast a full-state snapshot (bootstrap, restore, finalize).
pub fn broadcast_match_snapshot(state: &SharedState, match_state: &MatchState) {
    let summary = MatchSummary::project(match_state, &state.config());
    send_public_event(state, EVENT_MATCH_SNAPSHOT, &MatchSnapshotEvent(summary));
}

/// Broadcast a degraded-mode flip.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
