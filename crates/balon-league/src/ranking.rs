// Ranking sorter: stable descending order by one numeric field.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::roster::Player;

/// Numeric fields the table can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    SeasonScore,
    GoalsPerGame,
    AssistsPerGame,
    GoalContributions,
    Goals,
    Assists,
    Hattricks,
    Saves,
    Blocks,
    Tackles,
}

impl SortField {
    pub const ALL: [SortField; 10] = [
        SortField::SeasonScore,
        SortField::GoalsPerGame,
        SortField::AssistsPerGame,
        SortField::GoalContributions,
        SortField::Goals,
        SortField::Assists,
        SortField::Hattricks,
        SortField::Saves,
        SortField::Blocks,
        SortField::Tackles,
    ];

    /// Parse a stored or user-supplied key. Both the league sheet's Spanish
    /// keys and English names are accepted.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "puntaje" | "score" | "season_score" => Some(SortField::SeasonScore),
            "gp" | "goals_per_game" => Some(SortField::GoalsPerGame),
            "ap" | "assists_per_game" => Some(SortField::AssistsPerGame),
            "ga" | "goal_contributions" => Some(SortField::GoalContributions),
            "goles" | "goals" => Some(SortField::Goals),
            "asistencias" | "assists" => Some(SortField::Assists),
            "hattricks" => Some(SortField::Hattricks),
            "salvadas" | "saves" => Some(SortField::Saves),
            "bloqueos" | "blocks" => Some(SortField::Blocks),
            "entradas" | "tackles" => Some(SortField::Tackles),
            _ => None,
        }
    }

    /// Canonical key, as persisted in preferences.
    pub fn key(&self) -> &'static str {
        match self {
            SortField::SeasonScore => "puntaje",
            SortField::GoalsPerGame => "gp",
            SortField::AssistsPerGame => "ap",
            SortField::GoalContributions => "ga",
            SortField::Goals => "goles",
            SortField::Assists => "asistencias",
            SortField::Hattricks => "hattricks",
            SortField::Saves => "salvadas",
            SortField::Blocks => "bloqueos",
            SortField::Tackles => "entradas",
        }
    }

    /// The field's value for `player`. Non-finite values read as 0.
    pub fn value(&self, player: &Player) -> f64 {
        let c = &player.counters;
        let v = match self {
            SortField::SeasonScore => player.season_score,
            SortField::GoalsPerGame => player.goals_per_game,
            SortField::AssistsPerGame => player.assists_per_game,
            SortField::GoalContributions => player.goal_contributions as f64,
            SortField::Goals => c.goals as f64,
            SortField::Assists => c.assists as f64,
            SortField::Hattricks => c.hattricks as f64,
            SortField::Saves => c.saves as f64,
            SortField::Blocks => c.blocks as f64,
            SortField::Tackles => c.tackles as f64,
        };
        if v.is_finite() {
            v
        } else {
            0.0
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Order `players` by `field`, highest first. The sort is stable: players
/// with equal values keep their input order, so re-sorting never reshuffles
/// ties.
pub fn rank_players(players: &[Player], field: SortField) -> Vec<&Player> {
    let mut ranked: Vec<&Player> = players.iter().collect();
    ranked.sort_by(|a, b| {
        field
            .value(b)
            .partial_cmp(&field.value(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}
