// Award eligibility engine: volume gates, composite award score, and a
// probability distribution over the shortlist.
//
// awardScore = seasonScore * 0.4
//            + (goalContributions / gamesInSeason) * 25
//            + (hattricks * 5) * 0.2
//            + min(goals, assists) * 0.15

use balon_core::config::AwardConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::roster::Player;
use crate::scoring::{per_game, round2};

const SEASON_SCORE_WEIGHT: f64 = 0.4;
const CONTRIBUTION_RATE_WEIGHT: f64 = 25.0;
const HATTRICK_POINTS: f64 = 5.0;
const HATTRICK_WEIGHT: f64 = 0.2;
const BALANCE_WEIGHT: f64 = 0.15;

/// Thresholds applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AwardRules {
    pub min_contributions: u32,
    pub min_games_fraction: f64,
    pub shortlist_size: usize,
}

impl Default for AwardRules {
    fn default() -> Self {
        Self {
            min_contributions: 25,
            min_games_fraction: 0.6,
            shortlist_size: 5,
        }
    }
}

impl From<&AwardConfig> for AwardRules {
    fn from(config: &AwardConfig) -> Self {
        Self {
            min_contributions: config.min_contributions,
            min_games_fraction: config.min_games_fraction,
            shortlist_size: config.shortlist_size,
        }
    }
}

/// Per-player verdict, in roster order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardCandidate {
    pub name: String,
    pub eligible: bool,
    /// 0 for ineligible players.
    pub award_score: f64,
}

/// A shortlisted player with its share of the shortlist's total score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistEntry {
    pub player: Player,
    pub award_score: f64,
    /// Percentage; entries of one shortlist sum to 100.
    pub probability: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwardEvaluation {
    pub candidates: Vec<AwardCandidate>,
    /// Ranked best first. Empty when nobody is eligible.
    pub shortlist: Vec<ShortlistEntry>,
}

/// Both gates must hold: enough games played, and enough goal
/// contributions.
///
/// `games_played` currently always equals `games_in_season`, so only the
/// contributions gate can fail. The games gate stays so that real
/// attendance data plugs in without changing this check.
pub fn is_eligible(player: &Player, rules: &AwardRules) -> bool {
    let enough_games =
        player.games_played as f64 >= rules.min_games_fraction * player.games_in_season as f64;
    let enough_contributions = player.goal_contributions >= rules.min_contributions;
    enough_games && enough_contributions
}

/// Composite award score, rounded to two decimals. Does not check
/// eligibility.
pub fn award_score(player: &Player) -> f64 {
    let c = &player.counters;
    let contribution_rate = per_game(player.goal_contributions, player.games_in_season);
    let raw = player.season_score * SEASON_SCORE_WEIGHT
        + contribution_rate * CONTRIBUTION_RATE_WEIGHT
        + (c.hattricks as f64 * HATTRICK_POINTS) * HATTRICK_WEIGHT
        + c.goals.min(c.assists) as f64 * BALANCE_WEIGHT;
    round2(raw)
}

/// Score every player, keep the top `shortlist_size` eligible ones and
/// normalize their scores into percentages.
///
/// Ties keep roster order. If the shortlist's total score is 0 every
/// probability is 0.
pub fn evaluate_award(players: &[Player], rules: &AwardRules) -> AwardEvaluation {
    let mut candidates = Vec::with_capacity(players.len());
    let mut eligible: Vec<(&Player, f64)> = Vec::new();

    for player in players {
        let is_in = is_eligible(player, rules);
        let score = if is_in { award_score(player) } else { 0.0 };
        candidates.push(AwardCandidate {
            name: player.name.clone(),
            eligible: is_in,
            award_score: score,
        });
        if is_in {
            eligible.push((player, score));
        }
    }

    // Stable sort: equal scores keep roster order.
    eligible.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    eligible.truncate(rules.shortlist_size);

    let total: f64 = eligible.iter().map(|(_, score)| score).sum();
    let shortlist: Vec<ShortlistEntry> = eligible
        .into_iter()
        .map(|(player, score)| ShortlistEntry {
            player: player.clone(),
            award_score: score,
            probability: if total > 0.0 { score / total * 100.0 } else { 0.0 },
        })
        .collect();

    debug!(
        "award evaluation: {} players, {} eligible shown, total score {:.2}",
        players.len(),
        shortlist.len(),
        total
    );

    AwardEvaluation {
        candidates,
        shortlist,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
