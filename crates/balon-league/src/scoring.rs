// Season and weekly score formulas.
//
// Every formula shares the same shape: goals count double, assists count
// once, and one position-specific stat adds the rest.

use crate::roster::{Counters, Position, WeeklyCounters};

/// Weight of a goal in every formula.
const GOAL_WEIGHT: f64 = 2.0;
/// Weight of an assist in every formula.
const ASSIST_WEIGHT: f64 = 1.0;
/// Goalkeeper saves and defender blocks.
const SAVE_WEIGHT: f64 = 0.5;
const BLOCK_WEIGHT: f64 = 0.5;
/// Hat-tricks for everyone else.
const HATTRICK_WEIGHT: f64 = 3.0;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The counters a score formula reads, shared by season and weekly totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub goals: u32,
    pub assists: u32,
    pub hattricks: u32,
    pub saves: u32,
    pub blocks: u32,
}

impl From<&Counters> for ScoreInputs {
    fn from(c: &Counters) -> Self {
        Self {
            goals: c.goals,
            assists: c.assists,
            hattricks: c.hattricks,
            saves: c.saves,
            blocks: c.blocks,
        }
    }
}

impl From<&WeeklyCounters> for ScoreInputs {
    fn from(w: &WeeklyCounters) -> Self {
        Self {
            goals: w.goals,
            assists: w.assists,
            hattricks: w.hattricks,
            saves: w.saves,
            blocks: w.blocks,
        }
    }
}

/// Position-weighted score, rounded to two decimals.
///
/// - Goalkeeper: `goals*2 + assists + saves*0.5`
/// - Defender:   `goals*2 + assists + blocks*0.5`
/// - Other:      `goals*2 + assists + hattricks*3`
pub fn position_score(position: Position, inputs: &ScoreInputs) -> f64 {
    let base = inputs.goals as f64 * GOAL_WEIGHT + inputs.assists as f64 * ASSIST_WEIGHT;
    let extra = match position {
        Position::Goalkeeper => inputs.saves as f64 * SAVE_WEIGHT,
        Position::Defender => inputs.blocks as f64 * BLOCK_WEIGHT,
        Position::Other => inputs.hattricks as f64 * HATTRICK_WEIGHT,
    };
    round2(base + extra)
}

/// Derived season metrics for one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonStats {
    pub season_score: f64,
    pub goals_per_game: f64,
    pub assists_per_game: f64,
    pub goal_contributions: u32,
}

/// Per-game rate, 0 when the season has no games.
pub fn per_game(count: u32, games: u32) -> f64 {
    if games == 0 {
        0.0
    } else {
        count as f64 / games as f64
    }
}

/// Compute season score, per-game rates and goal contributions.
///
/// Goal contributions saturate at `u32::MAX` instead of wrapping.
pub fn season_stats(position: Position, counters: &Counters, games_in_season: u32) -> SeasonStats {
    SeasonStats {
        season_score: position_score(position, &ScoreInputs::from(counters)),
        goals_per_game: per_game(counters.goals, games_in_season),
        assists_per_game: per_game(counters.assists, games_in_season),
        goal_contributions: counters.goals.saturating_add(counters.assists),
    }
}

/// Score for the current week only, independent of season totals.
pub fn weekly_score(position: Position, weekly: &WeeklyCounters) -> f64 {
    position_score(position, &ScoreInputs::from(weekly))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
