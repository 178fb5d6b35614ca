// Read-only view model handed to renderers. Rebuilt from scratch on every
// request; building it has no side effects.

use balon_league::grant::{AwardState, GrantOutcome};
use balon_league::ranking::{rank_players, SortField};
use balon_league::roster::Player;
use balon_league::weekly::{player_of_the_week, WeeklyTop};
use serde::Serialize;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a 1-based rank, if it earns one.
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    /// 1-based position in the full, unfiltered ranking.
    pub rank: usize,
    pub medal: Option<Medal>,
    pub player: Player,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub sort_field: SortField,
    pub ranked_players: Vec<RankedRow>,
    pub weekly_top: Option<WeeklyTop>,
    /// `None` when the stored award record could not be read.
    pub award: Option<AwardState>,
    pub award_error: Option<String>,
    /// Show the award ceremony. True only for the evaluation that granted
    /// the award.
    pub ceremony: bool,
    pub light_theme: bool,
}

impl ViewModel {
    pub fn is_empty(&self) -> bool {
        self.ranked_players.is_empty()
    }

    pub fn award_is_granted(&self) -> bool {
        self.award.as_ref().is_some_and(AwardState::is_granted)
    }
}

/// Assemble the view model from the normalized roster, the session state and
/// the award evaluation made at startup. An award error only empties the
/// award panel; the table and the weekly card are built regardless.
pub fn build_view_model(
    players: &[Player],
    session: &Session,
    award: Result<&GrantOutcome, &str>,
) -> ViewModel {
    let field = session.prefs.sort_field;

    let ranked_players = rank_players(players, field)
        .into_iter()
        .enumerate()
        .map(|(i, player)| (i + 1, player))
        .filter(|(_, player)| session.matches(&player.name))
        .map(|(rank, player)| RankedRow {
            rank,
            medal: if session.prefs.show_medals {
                Medal::for_rank(rank)
            } else {
                None
            },
            player: player.clone(),
        })
        .collect();

    ViewModel {
        sort_field: field,
        ranked_players,
        weekly_top: player_of_the_week(players),
        award: award.ok().map(|outcome| outcome.state.clone()),
        award_error: award.err().map(str::to_string),
        ceremony: award.is_ok_and(|outcome| outcome.newly_granted),
        light_theme: session.prefs.light_theme,
    }
}
