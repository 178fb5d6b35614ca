// Plain-text renderer for the view model.

use std::fmt::Write as _;

use balon_league::grant::{AwardRecord, AwardState, PlayerSnapshot};
use balon_league::roster::{Player, Position};
use balon_league::weekly::WeeklyTop;

use crate::view::{RankedRow, ViewModel};

const AWARD_NAME: &str = "Balón de Oro";

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub league_name: String,
    /// Expand every row with its detail line.
    pub details: bool,
}

/// Scores that are whole numbers print without decimals, others with one.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

/// Detail line: season counters, per-game rates and the position's own
/// stats.
pub fn detail_line(player: &Player) -> String {
    let c = &player.counters;
    let mut line = format!(
        "G {} · A {} · G/A {} · G/P {:.2} · A/P {:.2}",
        c.goals, c.assists, player.goal_contributions, player.goals_per_game, player.assists_per_game
    );
    match player.position {
        Position::Goalkeeper => {
            let _ = write!(line, " · Saves {}", c.saves);
        }
        Position::Defender => {
            let _ = write!(line, " · Blocks {} · Tackles {}", c.blocks, c.tackles);
        }
        Position::Other => {
            let _ = write!(line, " · Hat-tricks {}", c.hattricks);
        }
    }
    line
}

fn row_line(row: &RankedRow) -> String {
    let medal = row.medal.map(|m| m.symbol()).unwrap_or("  ");
    format!(
        "{:>3}. {} {:>6}  {} [{}]",
        row.rank,
        medal,
        format_score(row.player.season_score),
        row.player.name,
        row.player.team
    )
}

pub fn render_table(view: &ViewModel, details: bool) -> String {
    let mut out = String::new();
    if view.ranked_players.is_empty() {
        out.push_str("  (no players)\n");
        return out;
    }
    for row in &view.ranked_players {
        out.push_str(&row_line(row));
        out.push('\n');
        if details {
            let _ = writeln!(out, "          {}", detail_line(&row.player));
        }
    }
    out
}

pub fn render_weekly(weekly: Option<&WeeklyTop>) -> String {
    match weekly {
        Some(top) => format!(
            "Player of the week: {} ({}) · {} pts · {} goals · {} assists\n",
            top.player.name,
            top.player.team,
            format_score(top.weekly_score),
            top.week_goals(),
            top.week_assists()
        ),
        None => "Player of the week: none\n".to_string(),
    }
}

fn snapshot_line(label: &str, snap: &PlayerSnapshot) -> String {
    format!(
        "  {label:<9} {} ({}) · award score {:.2} · G/A {}\n",
        snap.name, snap.team, snap.award_score, snap.goal_contributions
    )
}

fn render_record(record: &AwardRecord) -> String {
    let mut out = format!(
        "{AWARD_NAME}: granted on {}\n",
        record.granted_at.format("%Y-%m-%d")
    );
    out.push_str(&snapshot_line("Winner", &record.winner));
    for (i, finalist) in record.finalists.iter().enumerate() {
        out.push_str(&snapshot_line(&format!("#{}", i + 2), finalist));
    }
    out
}

pub fn render_award(state: &AwardState) -> String {
    match state {
        AwardState::Granted(record) => render_record(record),
        AwardState::Pending { shortlist } if shortlist.is_empty() => {
            format!("{AWARD_NAME}: no eligible players yet\n")
        }
        AwardState::Pending { shortlist } => {
            let mut out = format!("{AWARD_NAME} candidates:\n");
            for (i, entry) in shortlist.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {}. {:<20} {:>5.1}%  (award score {:.2})",
                    i + 1,
                    entry.player.name,
                    entry.probability,
                    entry.award_score
                );
            }
            out
        }
    }
}

pub fn render_ceremony(state: &AwardState) -> Option<String> {
    match state {
        AwardState::Granted(record) => Some(format!(
            "*** {} is the {AWARD_NAME} winner! ***\n",
            record.winner.name
        )),
        AwardState::Pending { .. } => None,
    }
}

/// Full screen: header, optional ceremony banner, table, weekly card and
/// award panel.
pub fn render(view: &ViewModel, options: &RenderOptions) -> String {
    let mut out = String::new();
    let theme = if view.light_theme { "light" } else { "dark" };
    let _ = writeln!(
        out,
        "{} · sorted by {} · {} theme",
        options.league_name, view.sort_field, theme
    );
    out.push('\n');

    if view.ceremony {
        if let Some(banner) = view.award.as_ref().and_then(render_ceremony) {
            out.push_str(&banner);
            out.push('\n');
        }
    }

    out.push_str(&render_table(view, options.details));
    out.push('\n');
    out.push_str(&render_weekly(view.weekly_top.as_ref()));
    out.push('\n');
    match (&view.award, &view.award_error) {
        (Some(state), _) => out.push_str(&render_award(state)),
        (None, Some(reason)) => {
            let _ = writeln!(out, "{AWARD_NAME}: unavailable ({reason})");
        }
        (None, None) => {}
    }
    out
}
