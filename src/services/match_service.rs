//! Match lifecycle: bootstrap from two rosters, crash-recovery restore,
//! set finalization with archiving, and abandonment.

use std::collections::HashSet;
use std::time::SystemTime;

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::SetArchiveEntity,
    dto::{
        actions::{
            FinalizeSetRequest, FinalizeSetResponse, PlayerInput, RosterInput, SetupMatchRequest,
        },
        format_system_time,
        match_view::MatchSummary,
        sets::{SetDetail, SetListItem},
    },
    error::ServiceError,
    services::{rally_service, sse_events, sse_service},
    state::{
        SharedState,
        match_state::{LogLevel, MatchState, RuleLimits},
        rally::MatchPhase,
        roster::{COURT_SLOTS, PerSide, Player, Side, TeamSide},
    },
};

/// Seed a fresh set from two rosters and start the serve clock.
pub async fn setup_match(
    state: &SharedState,
    request: SetupMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    if state.read_match(|maybe| maybe.is_some()).await {
        return Err(ServiceError::InvalidState(
            "a set is already in progress; finalize or abandon it first".into(),
        ));
    }

    let home = build_side(request.home)?;
    let away = build_side(request.away)?;
    let serving = match request.serving {
        Some(side) => side.into(),
        None => coin_toss(),
    };
    let set_number = request.set_number.unwrap_or(1);
    let limits = state.config().limits;

    let mut match_state = MatchState::new(set_number, PerSide::new(home, away), serving, limits);
    match_state.log(
        LogLevel::Info,
        format!("set {set_number} started; {} serves first", serving.label()),
    );

    let version = match_state.version;
    let summary = MatchSummary::project(&match_state, &state.config());
    sse_events::broadcast_match_snapshot(state, &match_state);

    state
        .with_match_slot_mut(move |slot| {
            *slot = Some(match_state);
        })
        .await;

    rally_service::persist_detached(state.clone());
    rally_service::arm_serve_auto_advance(state.clone(), version);

    Ok(summary)
}

/// Project the current set for rendering.
pub async fn get_match(state: &SharedState) -> Result<MatchSummary, ServiceError> {
    let config = state.config();
    state
        .with_match(|match_state| Ok(MatchSummary::project(match_state, &config)))
        .await
}

/// Load a persisted backup into the empty match slot, if one exists. Returns
/// whether a set was restored.
pub async fn restore_backup(state: &SharedState) -> Result<bool, ServiceError> {
    let store = state.require_match_store().await?;
    let Some(backup) = store.load_backup().await? else {
        return Ok(false);
    };

    // A set that is already live wins over any stale backup.
    if state.read_match(|maybe| maybe.is_some()).await {
        return Ok(false);
    }

    let mut restored = backup.state;
    restored.log(LogLevel::Info, "set restored from backup");
    let version = restored.version;
    let arm = restored.phase == MatchPhase::PreServe;
    sse_events::broadcast_match_snapshot(state, &restored);

    state
        .with_match_slot_mut(move |slot| {
            *slot = Some(restored);
        })
        .await;

    if arm {
        rally_service::arm_serve_auto_advance(state.clone(), version);
    }
    info!("restored in-progress set from backup");
    Ok(true)
}

/// Drop the current set and its backup without archiving anything.
pub async fn abandon_match(state: &SharedState) -> Result<(), ServiceError> {
    let removed = state.with_match_slot_mut(|slot| slot.take()).await;
    if removed.is_none() {
        return Err(ServiceError::NotFound("no match is in progress".into()));
    }

    if let Some(store) = state.match_store().await {
        if let Err(err) = store.clear_backup().await {
            warn!(error = %err, "failed to clear the match backup");
        }
    }

    sse_service::broadcast_public_info(state.public_sse(), "match abandoned");
    Ok(())
}

/// Archive the finished set and seed the next one. The caller decides the set
/// is over (the 25/15 win-by-two check lives outside the core on purpose).
pub async fn finalize_set(
    state: &SharedState,
    request: FinalizeSetRequest,
) -> Result<FinalizeSetResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let winner: Side = request.winner.into();

    let finished = state.with_match(|match_state| Ok(match_state.clone())).await?;

    let archive_id = Uuid::new_v4();
    store
        .archive_set(SetArchiveEntity {
            id: archive_id,
            set_number: finished.set_number,
            home_name: finished.teams[Side::Home].name.clone(),
            away_name: finished.teams[Side::Away].name.clone(),
            score: finished.score.clone(),
            winner,
            completed_at: SystemTime::now(),
            state: finished.clone(),
        })
        .await?;

    let next_serving: Side = request
        .next_serving
        .map(Into::into)
        .unwrap_or_else(|| winner.opponent());
    let mut next = next_set_state(&finished, next_serving, state.config().limits);
    next.log(
        LogLevel::Info,
        format!(
            "set {} started; {} serves first",
            next.set_number,
            next_serving.label()
        ),
    );

    let version = next.version;
    let response = FinalizeSetResponse {
        archived_set: archive_id,
        completed_set_number: finished.set_number,
        next_set_number: next.set_number,
        score: (&finished.score).into(),
    };

    sse_events::broadcast_match_snapshot(state, &next);
    state
        .with_match_slot_mut(move |slot| {
            *slot = Some(next);
        })
        .await;

    rally_service::persist_detached(state.clone());
    rally_service::arm_serve_auto_advance(state.clone(), version);

    info!(
        set = response.completed_set_number,
        winner = winner.label(),
        "set archived"
    );
    Ok(response)
}

/// List archived sets, newest first.
pub async fn list_sets(state: &SharedState) -> Result<Vec<SetListItem>, ServiceError> {
    let store = state.require_match_store().await?;
    let entries = store.list_sets().await?;
    Ok(entries.into_iter().map(Into::into).collect())
}

/// Fetch one archived set with its frozen state projected for rendering.
pub async fn get_set(state: &SharedState, id: Uuid) -> Result<SetDetail, ServiceError> {
    let store = state.require_match_store().await?;
    let Some(archive) = store.find_set(id).await? else {
        return Err(ServiceError::NotFound(format!("set `{id}` not found")));
    };

    Ok(SetDetail {
        id: archive.id,
        winner: archive.winner.into(),
        completed_at: format_system_time(archive.completed_at),
        summary: MatchSummary::project(&archive.state, &state.config()),
    })
}

/// Carry both rosters into the next set: liberos return to their bench,
/// counters reset, lineups stay as they ended.
fn next_set_state(finished: &MatchState, serving: Side, limits: RuleLimits) -> MatchState {
    let mut teams = finished.teams.clone();
    for side in [Side::Home, Side::Away] {
        let team = &mut teams[side];
        let originals: Vec<(Uuid, Player)> = team.libero_originals.drain(..).collect();
        for (libero_id, original) in originals {
            if let Some(slot) = team.court_slot_of(libero_id) {
                let libero = std::mem::replace(&mut team.court[slot], original);
                team.liberos.push(libero);
            }
        }
        team.reset_counters();
    }

    MatchState::new(finished.set_number + 1, teams, serving, limits)
}

fn coin_toss() -> Side {
    if rand::rng().random_bool(0.5) {
        Side::Home
    } else {
        Side::Away
    }
}

fn build_side(input: RosterInput) -> Result<TeamSide, ServiceError> {
    let RosterInput {
        name,
        theme,
        court,
        bench,
        liberos,
    } = input;

    let mut numbers = HashSet::new();
    for player in court.iter().chain(bench.iter()).chain(liberos.iter()) {
        if !numbers.insert(player.number) {
            return Err(ServiceError::InvalidInput(format!(
                "duplicate jersey number {} in team `{name}`",
                player.number
            )));
        }
    }

    let court_players: Vec<Player> = court
        .into_iter()
        .map(|player| build_player(player, false))
        .collect();
    let court: [Player; COURT_SLOTS] = court_players.try_into().map_err(|_| {
        ServiceError::InvalidInput("starting lineup must have exactly six players".into())
    })?;

    Ok(TeamSide::new(
        name,
        theme.unwrap_or_else(|| "classic".into()),
        court,
        bench
            .into_iter()
            .map(|player| build_player(player, false))
            .collect(),
        liberos
            .into_iter()
            .map(|player| build_player(player, true))
            .collect(),
    ))
}

fn build_player(input: PlayerInput, is_libero: bool) -> Player {
    Player {
        id: Uuid::new_v4(),
        number: input.number,
        name: input.name,
        position: input
            .position
            .unwrap_or_else(|| if is_libero { "libero".into() } else { String::new() }),
        is_libero,
    }
}
