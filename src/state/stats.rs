//! Pure, replay-based statistics. Aggregation walks the immutable rally
//! history on demand and never feeds anything back into the running state.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::state::{
    match_state::{AttackCall, BlockCall, RallyEvent, RallyRecord, ServeResult},
    roster::{PerSide, Side},
};

/// Aggregated counters for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamTotals {
    /// Rallies won.
    pub points: u16,
    /// Rallies decided by a kill attack.
    pub kills: u16,
    /// Rallies decided by a service ace.
    pub aces: u16,
    /// Rallies decided by a stuff block.
    pub blocks: u16,
    /// Rallies lost on this team's own error.
    pub errors: u16,
}

/// Aggregated counters for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerTotals {
    /// Player id.
    pub player: Uuid,
    /// Kills credited.
    pub kills: u16,
    /// Aces credited.
    pub aces: u16,
    /// Blocks credited.
    pub blocks: u16,
    /// Errors charged.
    pub errors: u16,
}

impl PlayerTotals {
    fn new(player: Uuid) -> Self {
        Self {
            player,
            kills: 0,
            aces: 0,
            blocks: 0,
            errors: 0,
        }
    }
}

/// Team and player totals derived from a set's rally history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTotals {
    /// Per-team counters.
    pub teams: PerSide<TeamTotals>,
    /// Per-player counters, in order of first appearance.
    pub players: Vec<PlayerTotals>,
}

/// The single event that decided a rally, picked in fixed priority order.
enum Deciding {
    Kill(Uuid),
    Ace(Uuid),
    Block(Vec<Uuid>),
    Error(Uuid),
}

/// Replay the history and produce team and player totals.
///
/// Each rally contributes exactly one deciding credit, scanned for in fixed
/// priority order: a winner-side kill, then a winner-side ace, then a
/// winner-side stuff block, then a loser-side error (service error, attack
/// error, or zero-grade reception).
pub fn aggregate(history: &[RallyRecord]) -> MatchTotals {
    let mut teams: PerSide<TeamTotals> = PerSide::new(TeamTotals::default(), TeamTotals::default());
    let mut players: IndexMap<Uuid, PlayerTotals> = IndexMap::new();

    for record in history {
        let winner = record.winner;
        let loser = winner.opponent();
        teams[winner].points += 1;

        match deciding_event(record, winner, loser) {
            Some(Deciding::Kill(player)) => {
                teams[winner].kills += 1;
                entry(&mut players, player).kills += 1;
            }
            Some(Deciding::Ace(player)) => {
                teams[winner].aces += 1;
                entry(&mut players, player).aces += 1;
            }
            Some(Deciding::Block(blockers)) => {
                teams[winner].blocks += 1;
                for player in blockers {
                    entry(&mut players, player).blocks += 1;
                }
            }
            Some(Deciding::Error(player)) => {
                teams[loser].errors += 1;
                entry(&mut players, player).errors += 1;
            }
            None => {}
        }
    }

    MatchTotals {
        teams,
        players: players.into_values().collect(),
    }
}

fn entry(players: &mut IndexMap<Uuid, PlayerTotals>, player: Uuid) -> &mut PlayerTotals {
    players
        .entry(player)
        .or_insert_with(|| PlayerTotals::new(player))
}

fn deciding_event(record: &RallyRecord, winner: Side, loser: Side) -> Option<Deciding> {
    record
        .events
        .iter()
        .find_map(|event| match event {
            RallyEvent::Attack {
                team,
                player,
                call: Some(AttackCall::Kill),
                ..
            } if *team == winner => Some(Deciding::Kill(*player)),
            _ => None,
        })
        .or_else(|| {
            record.events.iter().find_map(|event| match event {
                RallyEvent::Serve {
                    team,
                    player,
                    result: ServeResult::Ace,
                    ..
                } if *team == winner => Some(Deciding::Ace(*player)),
                _ => None,
            })
        })
        .or_else(|| {
            record.events.iter().find_map(|event| match event {
                RallyEvent::Block {
                    team,
                    players,
                    call: BlockCall::Shutdown,
                } if *team == winner => Some(Deciding::Block(players.clone())),
                _ => None,
            })
        })
        .or_else(|| {
            record.events.iter().find_map(|event| match event {
                RallyEvent::Serve {
                    team,
                    player,
                    result: ServeResult::Error,
                    ..
                } if *team == loser => Some(Deciding::Error(*player)),
                RallyEvent::Attack {
                    team,
                    player,
                    call: Some(AttackCall::Error),
                    ..
                } if *team == loser => Some(Deciding::Error(*player)),
                RallyEvent::Reception {
                    team,
                    player,
                    grade: 0,
                } if *team == loser => Some(Deciding::Error(*player)),
                _ => None,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::match_state::{AttackKind, ServeKind};

    fn record(winner: Side, events: Vec<RallyEvent>) -> RallyRecord {
        RallyRecord {
            winner,
            reason: "test".into(),
            score: PerSide::new(0, 0),
            events,
        }
    }

    #[test]
    fn kill_is_credited_to_the_winning_attacker() {
        let attacker = Uuid::new_v4();
        let history = vec![record(
            Side::Away,
            vec![RallyEvent::Attack {
                team: Side::Away,
                player: attacker,
                kind: AttackKind::Spike,
                call: Some(AttackCall::Kill),
            }],
        )];

        let totals = aggregate(&history);
        assert_eq!(totals.teams[Side::Away].points, 1);
        assert_eq!(totals.teams[Side::Away].kills, 1);
        assert_eq!(totals.players.len(), 1);
        assert_eq!(totals.players[0].player, attacker);
        assert_eq!(totals.players[0].kills, 1);
    }

    #[test]
    fn kill_takes_priority_over_a_loser_error_in_the_same_rally() {
        let attacker = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let history = vec![record(
            Side::Home,
            vec![
                RallyEvent::Reception {
                    team: Side::Away,
                    player: receiver,
                    grade: 0,
                },
                RallyEvent::Attack {
                    team: Side::Home,
                    player: attacker,
                    kind: AttackKind::Tip,
                    call: Some(AttackCall::Kill),
                },
            ],
        )];

        let totals = aggregate(&history);
        assert_eq!(totals.teams[Side::Home].kills, 1);
        assert_eq!(totals.teams[Side::Away].errors, 0);
    }

    #[test]
    fn ace_and_service_error_split_by_side() {
        let server = Uuid::new_v4();
        let history = vec![
            record(
                Side::Home,
                vec![RallyEvent::Serve {
                    team: Side::Home,
                    player: server,
                    kind: ServeKind::Jump,
                    result: ServeResult::Ace,
                }],
            ),
            record(
                Side::Away,
                vec![RallyEvent::Serve {
                    team: Side::Home,
                    player: server,
                    kind: ServeKind::Jump,
                    result: ServeResult::Error,
                }],
            ),
        ];

        let totals = aggregate(&history);
        assert_eq!(totals.teams[Side::Home].aces, 1);
        assert_eq!(totals.teams[Side::Home].errors, 1);
        assert_eq!(totals.teams[Side::Away].points, 1);
        let server_line = &totals.players[0];
        assert_eq!(server_line.aces, 1);
        assert_eq!(server_line.errors, 1);
    }

    #[test]
    fn every_credited_blocker_gets_the_block() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let history = vec![record(
            Side::Home,
            vec![RallyEvent::Block {
                team: Side::Home,
                players: vec![first, second],
                call: BlockCall::Shutdown,
            }],
        )];

        let totals = aggregate(&history);
        assert_eq!(totals.teams[Side::Home].blocks, 1);
        assert!(totals.players.iter().all(|p| p.blocks == 1));
        assert_eq!(totals.players.len(), 2);
    }

    #[test]
    fn aggregation_leaves_history_untouched() {
        let history = vec![record(Side::Home, Vec::new())];
        let copy = history.clone();
        let _ = aggregate(&history);
        assert_eq!(history, copy);
    }
}
