// Roster normalization: raw JSON records into typed players with derived
// season metrics.
//
// Raw records use the league sheet's Spanish keys (`nombre`, `equipo`,
// `goles`, ...). English aliases are accepted as well.

use balon_core::config::LeagueConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::scoring;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Playing position, derived once from the tag in the player's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Name tagged `(POR)`.
    Goalkeeper,
    /// Name tagged `(DFC)`.
    Defender,
    /// Forwards, midfielders and untagged names.
    Other,
}

impl Position {
    /// Derive the position from a display name such as `"Ana (POR)"`.
    pub fn from_name(name: &str) -> Self {
        if name.contains("(POR)") {
            Position::Goalkeeper
        } else if name.contains("(DFC)") {
            Position::Defender
        } else {
            Position::Other
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "POR",
            Position::Defender => "DFC",
            Position::Other => "JUG",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// Season counters. Missing values default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub goals: u32,
    pub assists: u32,
    pub hattricks: u32,
    pub saves: u32,
    pub blocks: u32,
    pub tackles: u32,
}

/// Counters for the current week only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyCounters {
    pub goals: u32,
    pub assists: u32,
    pub hattricks: u32,
    pub saves: u32,
    pub blocks: u32,
}

/// A normalized player. Derived fields are computed once in [`Player::new`]
/// and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub team: String,
    pub position: Position,
    pub counters: Counters,
    pub weekly: WeeklyCounters,
    pub games_in_season: u32,
    /// Without attendance tracking every player is credited with the full
    /// season.
    pub games_played: u32,
    pub goals_per_game: f64,
    pub assists_per_game: f64,
    pub goal_contributions: u32,
    pub season_score: f64,
}

impl Player {
    /// Build a player and compute every derived field.
    pub fn new(
        name: impl Into<String>,
        team: impl Into<String>,
        counters: Counters,
        weekly: WeeklyCounters,
        games_in_season: u32,
    ) -> Self {
        let name = name.into();
        let position = Position::from_name(&name);
        let stats = scoring::season_stats(position, &counters, games_in_season);
        Self {
            name,
            team: team.into(),
            position,
            counters,
            weekly,
            games_in_season,
            games_played: games_in_season,
            goals_per_game: stats.goals_per_game,
            assists_per_game: stats.assists_per_game,
            goal_contributions: stats.goal_contributions,
            season_score: stats.season_score,
        }
    }

    /// This week's score under the player's position formula.
    pub fn weekly_score(&self) -> f64 {
        scoring::weekly_score(self.position, &self.weekly)
    }
}

/// A record that could not be turned into a player.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterIssue {
    /// Missing `name`/`equipo`, or a record that is not an object.
    MalformedRecord { index: usize, reason: String },
}

impl fmt::Display for RosterIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterIssue::MalformedRecord { index, reason } => {
                write!(f, "record #{index} skipped: {reason}")
            }
        }
    }
}

/// Result of normalizing a roster document.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRoster {
    /// Players in document order.
    pub players: Vec<Player>,
    pub issues: Vec<RosterIssue>,
}

// ---------------------------------------------------------------------------
// Raw serde structs (private)
// ---------------------------------------------------------------------------

/// Counters are read as f64 so fractional or out-of-range values degrade to
/// a count instead of rejecting the whole record.
#[derive(Debug, Deserialize)]
struct RawPlayer {
    #[serde(default, alias = "nombre")]
    name: Option<String>,
    #[serde(default, alias = "team")]
    equipo: Option<String>,
    #[serde(default, alias = "goals")]
    goles: Option<f64>,
    #[serde(default, alias = "assists")]
    asistencias: Option<f64>,
    #[serde(default)]
    hattricks: Option<f64>,
    #[serde(default, alias = "saves")]
    salvadas: Option<f64>,
    #[serde(default, alias = "blocks")]
    bloqueos: Option<f64>,
    #[serde(default, alias = "tackles")]
    entradas: Option<f64>,
    #[serde(default, alias = "weekly")]
    semana: Option<RawWeek>,
}

#[derive(Debug, Default, Deserialize)]
struct RawWeek {
    #[serde(default, alias = "goals")]
    goles: Option<f64>,
    #[serde(default, alias = "assists")]
    asistencias: Option<f64>,
    #[serde(default)]
    hattricks: Option<f64>,
    #[serde(default, alias = "saves")]
    salvadas: Option<f64>,
    #[serde(default, alias = "blocks")]
    bloqueos: Option<f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Convert an optional raw counter into a count. Absent, negative and
/// non-finite values become 0.
fn count(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn required_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Decode one raw record. Returns the reason on failure.
fn normalize_record(record: &serde_json::Value, league: &LeagueConfig) -> Result<Player, String> {
    let raw: RawPlayer = serde_json::from_value(record.clone()).map_err(|e| e.to_string())?;

    let name = required_text(raw.name).ok_or_else(|| "missing `name`".to_string())?;
    let team = required_text(raw.equipo).ok_or_else(|| "missing `equipo`".to_string())?;

    let games_in_season = match league.games_for_team(&team) {
        Some(games) => games,
        None => {
            warn!("player '{}' has unknown team '{}', season length set to 0", name, team);
            0
        }
    };

    let counters = Counters {
        goals: count(raw.goles),
        assists: count(raw.asistencias),
        hattricks: count(raw.hattricks),
        saves: count(raw.salvadas),
        blocks: count(raw.bloqueos),
        tackles: count(raw.entradas),
    };

    let week = raw.semana.unwrap_or_default();
    let weekly = WeeklyCounters {
        goals: count(week.goles),
        assists: count(week.asistencias),
        hattricks: count(week.hattricks),
        saves: count(week.salvadas),
        blocks: count(week.bloqueos),
    };

    Ok(Player::new(name, team, counters, weekly, games_in_season))
}

/// Normalize a roster document. Malformed records are reported and
/// excluded; every other record becomes a player, in document order.
pub fn normalize_roster(records: &[serde_json::Value], league: &LeagueConfig) -> NormalizedRoster {
    let mut roster = NormalizedRoster::default();

    for (index, record) in records.iter().enumerate() {
        match normalize_record(record, league) {
            Ok(player) => {
                debug!(
                    "normalized '{}' ({}, {} games, score {})",
                    player.name, player.position, player.games_in_season, player.season_score
                );
                roster.players.push(player);
            }
            Err(reason) => {
                warn!("skipping malformed roster record #{}: {}", index, reason);
                roster.issues.push(RosterIssue::MalformedRecord { index, reason });
            }
        }
    }

    roster
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
