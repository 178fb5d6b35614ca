// Player of the week: highest weekly score across the whole roster.

use serde::{Deserialize, Serialize};

use crate::roster::Player;

/// The week's top player together with the score that earned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTop {
    pub player: Player,
    pub weekly_score: f64,
}

impl WeeklyTop {
    pub fn week_goals(&self) -> u32 {
        self.player.weekly.goals
    }

    pub fn week_assists(&self) -> u32 {
        self.player.weekly.assists
    }
}

/// Select the player with the maximum weekly score.
///
/// Single pass in roster order: the first player reaching the maximum wins.
/// Players whose score is not finite are never selected. Returns `None` for
/// an empty roster or when no score is usable.
pub fn player_of_the_week(players: &[Player]) -> Option<WeeklyTop> {
    let mut best: Option<(&Player, f64)> = None;

    for player in players {
        let score = player.weekly_score();
        if !score.is_finite() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((player, score)),
        }
    }

    best.map(|(player, weekly_score)| WeeklyTop {
        player: player.clone(),
        weekly_score,
    })
}
