// Award grant state machine.
//
// Pending -> Granted fires once: on the first evaluation at or after the
// cutoff instant, if no record is stored yet and at least one player is
// eligible. From then on the stored record is returned verbatim and the
// roster is never consulted again. There is no way back to Pending short of
// deleting the stored record out-of-band.

use balon_core::config::AwardConfig;
use balon_core::store::{save_typed, StateStore, KEY_AWARD_RECORD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::award::{evaluate_award, AwardRules, ShortlistEntry};
use crate::roster::{Player, Position};

#[derive(Debug, Error)]
pub enum GrantError {
    #[error("award store failure: {message}")]
    Store { message: String },

    #[error("stored award record is unreadable: {source}")]
    CorruptRecord {
        #[source]
        source: serde_json::Error,
    },
}

impl GrantError {
    fn store(err: anyhow::Error) -> Self {
        GrantError::Store {
            message: format!("{err:#}"),
        }
    }
}

/// Frozen copy of a player's stats at grant time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub team: String,
    pub position: Position,
    pub goals: u32,
    pub assists: u32,
    pub hattricks: u32,
    pub saves: u32,
    pub blocks: u32,
    pub tackles: u32,
    pub games_in_season: u32,
    pub goal_contributions: u32,
    pub season_score: f64,
    pub award_score: f64,
    pub probability: f64,
}

impl PlayerSnapshot {
    fn from_entry(entry: &ShortlistEntry) -> Self {
        let p: &Player = &entry.player;
        Self {
            name: p.name.clone(),
            team: p.team.clone(),
            position: p.position,
            goals: p.counters.goals,
            assists: p.counters.assists,
            hattricks: p.counters.hattricks,
            saves: p.counters.saves,
            blocks: p.counters.blocks,
            tackles: p.counters.tackles,
            games_in_season: p.games_in_season,
            goal_contributions: p.goal_contributions,
            season_score: p.season_score,
            award_score: entry.award_score,
            probability: entry.probability,
        }
    }
}

/// The persisted outcome of the award. Created once, never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub granted: bool,
    pub winner: PlayerSnapshot,
    /// Runner-ups in rank order.
    pub finalists: Vec<PlayerSnapshot>,
    pub granted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AwardState {
    /// Before the cutoff (or at cutoff with nobody eligible): the live
    /// shortlist, recomputed on every evaluation and never stored.
    Pending { shortlist: Vec<ShortlistEntry> },
    /// The stored record.
    Granted(AwardRecord),
}

impl AwardState {
    pub fn is_granted(&self) -> bool {
        matches!(self, AwardState::Granted(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrantOutcome {
    pub state: AwardState,
    /// True only for the evaluation that performed the transition.
    pub newly_granted: bool,
}

/// Read the stored grant, if any. A stored record whose `granted` flag is
/// false counts as no grant.
pub fn load_record(store: &dyn StateStore) -> Result<Option<AwardRecord>, GrantError> {
    let Some(value) = store.load_state(KEY_AWARD_RECORD).map_err(GrantError::store)? else {
        return Ok(None);
    };
    let record: AwardRecord =
        serde_json::from_value(value).map_err(|source| GrantError::CorruptRecord { source })?;
    Ok(record.granted.then_some(record))
}

/// Evaluate the award at instant `now`.
///
/// 1. A stored grant is returned as-is, whatever `now` and `players` are.
/// 2. Before the cutoff the live shortlist is returned and nothing is
///    written.
/// 3. At or after the cutoff the shortlist is computed from `players`; its
///    head becomes the winner, the next `finalists` entries the runner-ups,
///    and the record is persisted. With nobody eligible nothing is written
///    and the next evaluation tries again.
pub fn evaluate_grant(
    store: &dyn StateStore,
    players: &[Player],
    award: &AwardConfig,
    now: DateTime<Utc>,
) -> Result<GrantOutcome, GrantError> {
    if let Some(record) = load_record(store)? {
        return Ok(GrantOutcome {
            state: AwardState::Granted(record),
            newly_granted: false,
        });
    }

    let evaluation = evaluate_award(players, &AwardRules::from(award));

    if now < award.cutoff {
        return Ok(GrantOutcome {
            state: AwardState::Pending {
                shortlist: evaluation.shortlist,
            },
            newly_granted: false,
        });
    }

    let Some((winner, runner_ups)) = evaluation.shortlist.split_first() else {
        warn!(
            "award cutoff {} has passed but no player is eligible; grant deferred",
            award.cutoff
        );
        return Ok(GrantOutcome {
            state: AwardState::Pending {
                shortlist: Vec::new(),
            },
            newly_granted: false,
        });
    };

    let record = AwardRecord {
        granted: true,
        winner: PlayerSnapshot::from_entry(winner),
        finalists: runner_ups
            .iter()
            .take(award.finalists)
            .map(PlayerSnapshot::from_entry)
            .collect(),
        granted_at: now,
    };

    save_typed(store, KEY_AWARD_RECORD, &record).map_err(GrantError::store)?;

    info!(
        "award granted to '{}' at {} ({} finalists)",
        record.winner.name,
        record.granted_at,
        record.finalists.len()
    );

    Ok(GrantOutcome {
        state: AwardState::Granted(record),
        newly_granted: true,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Counters, WeeklyCounters};
    use balon_core::store::MemoryStore;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn cutoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 20, 0, 0, 0).unwrap()
    }

    fn award() -> AwardConfig {
        AwardConfig::with_cutoff(cutoff())
    }

    fn forward(name: &str, goals: u32, assists: u32) -> Player {
        Player::new(
            name,
            "FYA",
            Counters {
                goals,
                assists,
                ..Default::default()
            },
            WeeklyCounters::default(),
            26,
        )
    }

    fn roster() -> Vec<Player> {
        vec![
            forward("Diego", 15, 14),
            forward("Bruno", 22, 9),
            forward("Elena", 18, 12),
            forward("Hugo", 20, 10),
            forward("Bench", 2, 1),
        ]
    }

    #[test]
    fn before_cutoff_is_pending_and_writes_nothing() {
        let store = MemoryStore::new();
        let outcome =
            evaluate_grant(&store, &roster(), &award(), cutoff() - Duration::seconds(1)).unwrap();

        assert!(!outcome.newly_granted);
        match &outcome.state {
            AwardState::Pending { shortlist } => {
                assert_eq!(shortlist.len(), 4);
                let sum: f64 = shortlist.iter().map(|e| e.probability).sum();
                assert!((sum - 100.0).abs() < 1e-6);
            }
            other => panic!("expected Pending, got {other:?}"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn exactly_at_cutoff_grants() {
        let store = MemoryStore::new();
        let outcome = evaluate_grant(&store, &roster(), &award(), cutoff()).unwrap();
        assert!(outcome.newly_granted);
        assert!(outcome.state.is_granted());
    }

    #[test]
    fn after_cutoff_grants_and_persists() {
        let store = MemoryStore::new();
        let now = cutoff() + Duration::seconds(1);
        let outcome = evaluate_grant(&store, &roster(), &award(), now).unwrap();

        assert!(outcome.newly_granted);
        let AwardState::Granted(record) = &outcome.state else {
            panic!("expected Granted");
        };
        assert!(record.granted);
        assert_eq!(record.granted_at, now);
        assert_eq!(record.finalists.len(), 2);

        let expected = evaluate_award(&roster(), &AwardRules::default());
        assert_eq!(record.winner.name, expected.shortlist[0].player.name);
        assert_eq!(record.finalists[0].name, expected.shortlist[1].player.name);
        assert_eq!(record.finalists[1].name, expected.shortlist[2].player.name);

        let stored = load_record(&store).unwrap().expect("record should be stored");
        assert_eq!(&stored, record);
    }

    #[test]
    fn later_evaluations_read_stored_record_even_if_roster_changes() {
        let store = MemoryStore::new();
        let first = evaluate_grant(&store, &roster(), &award(), cutoff() + Duration::seconds(1))
            .unwrap();

        // Someone else now dominates the live roster.
        let mut changed = roster();
        changed.push(forward("Newcomer", 90, 40));

        let later = evaluate_grant(&store, &changed, &award(), cutoff() + Duration::hours(1))
            .unwrap();
        assert!(!later.newly_granted);
        assert_eq!(later.state, first.state);

        let first_json = serde_json::to_string(&first.state).unwrap();
        let later_json = serde_json::to_string(&later.state).unwrap();
        assert_eq!(first_json, later_json);
    }

    #[test]
    fn repeated_evaluations_are_byte_identical() {
        let store = MemoryStore::new();
        evaluate_grant(&store, &roster(), &award(), cutoff() + Duration::minutes(5)).unwrap();

        let a = evaluate_grant(&store, &roster(), &award(), cutoff() + Duration::days(1)).unwrap();
        let b = evaluate_grant(&store, &roster(), &award(), cutoff() + Duration::days(2)).unwrap();
        assert_eq!(
            serde_json::to_vec(&a.state).unwrap(),
            serde_json::to_vec(&b.state).unwrap()
        );
    }

    #[test]
    fn stored_grant_wins_even_before_cutoff() {
        let store = MemoryStore::new();
        evaluate_grant(&store, &roster(), &award(), cutoff()).unwrap();

        let mut moved = award();
        moved.cutoff = cutoff() + Duration::days(365);
        let outcome = evaluate_grant(&store, &roster(), &moved, cutoff()).unwrap();
        assert!(outcome.state.is_granted());
        assert!(!outcome.newly_granted);
    }

    #[test]
    fn no_eligible_players_defers_grant() {
        let store = MemoryStore::new();
        let weak = vec![forward("A", 1, 1), forward("B", 10, 10)];
        let outcome =
            evaluate_grant(&store, &weak, &award(), cutoff() + Duration::seconds(1)).unwrap();

        assert!(!outcome.newly_granted);
        assert_eq!(
            outcome.state,
            AwardState::Pending {
                shortlist: Vec::new()
            }
        );
        assert!(store.is_empty());

        // Retried on the next evaluation once someone qualifies.
        let retry =
            evaluate_grant(&store, &roster(), &award(), cutoff() + Duration::hours(2)).unwrap();
        assert!(retry.newly_granted);
    }

    #[test]
    fn fewer_eligible_than_finalists() {
        let store = MemoryStore::new();
        let players = vec![forward("Solo", 20, 10), forward("Bench", 1, 1)];
        let outcome = evaluate_grant(&store, &players, &award(), cutoff()).unwrap();
        let AwardState::Granted(record) = outcome.state else {
            panic!("expected Granted");
        };
        assert_eq!(record.winner.name, "Solo");
        assert!(record.finalists.is_empty());
        assert!((record.winner.probability - 100.0).abs() < 1e-9);
    }

    #[test]
    fn corrupt_record_is_an_error() {
        let store = MemoryStore::new();
        store.save_state(KEY_AWARD_RECORD, &json!({"granted": "yes"})).unwrap();
        let result = evaluate_grant(&store, &roster(), &award(), cutoff());
        assert!(matches!(result, Err(GrantError::CorruptRecord { .. })));
    }

    #[test]
    fn ungranted_record_counts_as_absent() {
        let store = MemoryStore::new();
        evaluate_grant(&store, &roster(), &award(), cutoff()).unwrap();
        let mut value = store.load_state(KEY_AWARD_RECORD).unwrap().unwrap();
        value["granted"] = json!(false);
        store.save_state(KEY_AWARD_RECORD, &value).unwrap();

        assert!(load_record(&store).unwrap().is_none());
        let outcome =
            evaluate_grant(&store, &roster(), &award(), cutoff() - Duration::days(1)).unwrap();
        assert!(!outcome.state.is_granted());
    }
}
