//! Orchestrates action dispatch: one write-lock pass through the rally state
//! machine, then fire-and-forget persistence, SSE broadcasts, and the serve
//! auto-advance timer. Both the HTTP surface and the timer share the same
//! internal dispatch path.

use tracing::{debug, warn};

use crate::{
    dto::{
        actions::{ActionRequest, ActionResponse},
        common::LogEntrySummary,
        sse::{PhaseChangedEvent, PointScoredEvent},
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        rally::{Action, MatchPhase, Outcome},
        roster::Side,
    },
};

/// Dispatch one scorer action and report its outcome. Rejections are normal
/// responses, not errors: the state machine is total over its action set.
pub async fn dispatch_action(
    state: &SharedState,
    request: ActionRequest,
) -> Result<ActionResponse, ServiceError> {
    dispatch(state, request.into()).await
}

/// Shared dispatch path for scorer actions and the internal serve trigger.
async fn dispatch(state: &SharedState, action: Action) -> Result<ActionResponse, ServiceError> {
    let announces_timeout = matches!(action, Action::RequestTimeout { .. });

    let effects = state
        .with_match_mut(|match_state| {
            let logs_before = match_state.logs.len();
            let rallies_before = match_state.history.len();

            let outcome = match_state.dispatch(action);

            // Fresh log entries sit at the front of the newest-first list.
            let fresh = match_state.logs.len() - logs_before;
            let new_logs: Vec<LogEntrySummary> = match_state.logs[..fresh]
                .iter()
                .rev()
                .map(Into::into)
                .collect();

            let point = if match_state.history.len() > rallies_before {
                match_state.history.last().map(|record| PointScoredEvent {
                    winner: record.winner.into(),
                    reason: record.reason.clone(),
                    score: (&record.score).into(),
                    serving_team: match_state.serving_team.into(),
                })
            } else {
                None
            };

            Ok(DispatchEffects {
                outcome,
                phase: match_state.phase.clone(),
                score: (&match_state.score).into(),
                serving_team: match_state.serving_team,
                possession: match_state.possession,
                version: match_state.version,
                new_logs,
                point,
            })
        })
        .await?;

    if effects.outcome.is_applied() {
        persist_detached(state.clone());

        sse_events::broadcast_phase_changed(
            state,
            PhaseChangedEvent {
                phase: (&effects.phase).into(),
                score: effects.score.clone(),
                serving_team: effects.serving_team.into(),
                possession: effects.possession.into(),
                version: effects.version,
            },
        );
        if let Some(point) = effects.point {
            sse_events::broadcast_point_scored(state, point);
        }
        for entry in effects.new_logs {
            sse_events::broadcast_log_appended(state, entry);
        }
        if announces_timeout {
            if let MatchPhase::Timeout { team } = effects.phase {
                sse_events::broadcast_timeout_started(
                    state,
                    team,
                    state.config().timeout_seconds,
                );
            }
        }
        if effects.phase == MatchPhase::PreServe {
            arm_serve_auto_advance(state.clone(), effects.version);
        }
    }

    let (applied, reason, warnings) = match effects.outcome {
        Outcome::Applied { warnings } => (true, None, warnings),
        Outcome::Rejected { reason } => (false, Some(reason), Vec::new()),
    };

    Ok(ActionResponse {
        applied,
        reason,
        warnings,
        phase: (&effects.phase).into(),
        score: effects.score,
        serving_team: effects.serving_team.into(),
        version: effects.version,
    })
}

/// Schedule the automatic pre-serve to serve advance. The dispatched trigger
/// carries the version it was armed against, so any state change in the
/// meantime voids it (a rejection, not an error).
pub fn arm_serve_auto_advance(state: SharedState, expected_version: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(state.config().serve_auto_advance()).await;
        match dispatch(&state, Action::BeginServe { expected_version }).await {
            Ok(response) if !response.applied => {
                debug!(reason = ?response.reason, "serve auto-advance skipped");
            }
            Ok(_) => {}
            Err(err) => debug!(error = %err, "serve auto-advance not dispatched"),
        }
    });
}

/// Write the current match to the backup store without blocking the caller.
/// Persistence failures are logged and never surface to the scorer.
pub fn persist_detached(state: SharedState) {
    tokio::spawn(async move {
        match state.persist_match().await {
            Ok(()) => {}
            Err(ServiceError::Degraded) => debug!("skipping match backup (degraded mode)"),
            Err(err) => warn!(error = %err, "failed to write the match backup"),
        }
    });
}

struct DispatchEffects {
    outcome: Outcome,
    phase: MatchPhase,
    score: crate::dto::common::ScoreSnapshot,
    serving_team: Side,
    possession: Side,
    version: u64,
    new_logs: Vec<LogEntrySummary>,
    point: Option<PointScoredEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::{
            actions::{
                ActionRequest, AttackResultDto, PlayerInput, RosterInput, ServeResultDto,
                ServeTypeDto, SetupMatchRequest,
            },
            common::SideDto,
            phase::VisiblePhase,
        },
        services::match_service,
        state::AppState,
    };

    fn player(number: u8) -> PlayerInput {
        PlayerInput {
            number,
            name: format!("P{number}"),
            position: None,
        }
    }

    fn roster(name: &str) -> RosterInput {
        RosterInput {
            name: name.into(),
            theme: None,
            court: (1..=6).map(player).collect(),
            bench: vec![player(7), player(8)],
            liberos: vec![player(10)],
        }
    }

    fn setup_request() -> SetupMatchRequest {
        SetupMatchRequest {
            home: roster("Home"),
            away: roster("Away"),
            serving: Some(SideDto::Home),
            set_number: None,
        }
    }

    /// Config with the serve auto-advance pushed out of the way so tests
    /// observe the pre-serve phase deterministically.
    fn slow_serve_config() -> AppConfig {
        AppConfig {
            serve_auto_advance_ms: 3_600_000,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_then_speculative_dispatch() {
        let state = AppState::new(slow_serve_config());
        let summary = match_service::setup_match(&state, setup_request())
            .await
            .expect("bootstrap");
        assert_eq!(summary.set_number, 1);
        assert_eq!(summary.phase, VisiblePhase::PreServe);

        // Wrong-phase action: rejected, reported, nothing broken.
        let response = dispatch_action(
            &state,
            ActionRequest::AttackResult {
                call: AttackResultDto::Kill,
            },
        )
        .await
        .expect("dispatch");
        assert!(!response.applied);
        assert!(response.reason.is_some());

        // Timeout applies from pre-serve.
        let response = dispatch_action(
            &state,
            ActionRequest::RequestTimeout {
                team: SideDto::Home,
            },
        )
        .await
        .expect("dispatch");
        assert!(response.applied);
        assert_eq!(response.phase, VisiblePhase::Timeout);
    }

    #[tokio::test]
    async fn serve_results_are_rejected_until_the_serve_begins() {
        let state = AppState::new(slow_serve_config());
        match_service::setup_match(&state, setup_request())
            .await
            .expect("bootstrap");

        let response = dispatch_action(
            &state,
            ActionRequest::SetServeType {
                kind: ServeTypeDto::Float,
            },
        )
        .await
        .expect("dispatch");
        assert!(!response.applied);

        let response = dispatch_action(
            &state,
            ActionRequest::SetServeResult {
                result: ServeResultDto::Ace,
            },
        )
        .await
        .expect("dispatch");
        assert!(!response.applied);
        assert_eq!(response.score.home, 0);
    }

    #[tokio::test]
    async fn dispatch_without_a_match_is_not_found() {
        let state = AppState::new(slow_serve_config());
        let result = dispatch_action(&state, ActionRequest::Undo).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_jersey_numbers_are_rejected_at_bootstrap() {
        let state = AppState::new(slow_serve_config());
        let mut request = setup_request();
        request.home.bench.push(player(3));

        let result = match_service::setup_match(&state, request).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}
