// Configuration loading and parsing (league.toml, award.toml).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub award: AwardConfig,
    /// Where the roster document lives: a local path or an http(s) URL.
    pub roster_location: String,
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    /// Season length per team id. Values are configuration, not constants:
    /// they have changed between seasons.
    pub games_per_team: HashMap<String, u32>,
    /// Team whose season length applies to team ids missing from
    /// `games_per_team`.
    #[serde(default)]
    pub fallback_team: Option<String>,
}

impl LeagueConfig {
    /// Season length for `team`, resolving unknown ids through the fallback
    /// team. Returns `None` when neither matches.
    pub fn games_for_team(&self, team: &str) -> Option<u32> {
        self.games_per_team.get(team).copied().or_else(|| {
            self.fallback_team
                .as_ref()
                .and_then(|fallback| self.games_per_team.get(fallback).copied())
        })
    }
}

// ---------------------------------------------------------------------------
// award.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire award.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AwardFile {
    award: AwardConfig,
    data: DataSection,
    #[serde(default)]
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
struct DataSection {
    roster: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: Option<String>,
}

/// Thresholds and timing for the end-of-season award.
#[derive(Debug, Clone, Deserialize)]
pub struct AwardConfig {
    /// Instant at or after which the award is granted and frozen.
    pub cutoff: DateTime<Utc>,
    #[serde(default = "default_min_contributions")]
    pub min_contributions: u32,
    #[serde(default = "default_min_games_fraction")]
    pub min_games_fraction: f64,
    #[serde(default = "default_shortlist_size")]
    pub shortlist_size: usize,
    /// Runner-ups persisted alongside the winner.
    #[serde(default = "default_finalists")]
    pub finalists: usize,
}

fn default_min_contributions() -> u32 {
    25
}

fn default_min_games_fraction() -> f64 {
    0.6
}

fn default_shortlist_size() -> usize {
    5
}

fn default_finalists() -> usize {
    2
}

impl AwardConfig {
    /// Award settings with every threshold at its default.
    pub fn with_cutoff(cutoff: DateTime<Utc>) -> Self {
        Self {
            cutoff,
            min_contributions: default_min_contributions(),
            min_games_fraction: default_min_games_fraction(),
            shortlist_size: default_shortlist_size(),
            finalists: default_finalists(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/award.toml`, both relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- award.toml (required) ---
    let award_path = config_dir.join("award.toml");
    let award_text = read_file(&award_path)?;
    let award_file: AwardFile =
        toml::from_str(&award_text).map_err(|e| ConfigError::ParseError {
            path: award_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        award: award_file.award,
        roster_location: award_file.data.roster.trim().to_string(),
        db_path: resolve_db_path(award_file.database.path),
    };

    validate(&config)?;

    Ok(config)
}

/// Copy every default file that `config/` lacks. Existing config files are
/// never touched and `*.example` templates are skipped. Returns the files
/// that were created.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            debug!("no defaults/ in {}, using config/ as-is", base_dir.display());
            return Ok(Vec::new());
        }
        return Err(copy_error(format!(
            "neither defaults/ nor config/ found in {}",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let entries = std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?;

    let mut copied = Vec::new();
    for entry in entries {
        let source = entry
            .map_err(|e| copy_error(format!("cannot read defaults entry: {e}")))?
            .path();
        if !is_default_file(&source) {
            continue;
        }
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if copy_if_missing(&source, &target)? {
            info!("created {} from defaults", target.display());
            copied.push(target);
        }
    }

    Ok(copied)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

fn is_default_file(path: &Path) -> bool {
    path.is_file()
        && !path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".example"))
}

/// Create `target` with the contents of `source` unless it already exists.
/// `create_new` makes the existence check and the creation one step.
fn copy_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    use std::io::Write;

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error(format!("cannot create {}: {e}", target.display()))),
    };

    let content = std::fs::read(source)
        .map_err(|e| copy_error(format!("cannot read {}: {e}", source.display())))?;
    dest.write_all(&content)
        .map_err(|e| copy_error(format!("cannot write {}: {e}", target.display())))?;
    Ok(true)
}

/// Loads config relative to `base_dir`, copying default files first.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Use the configured database path, or the per-user data directory when
/// none is given.
fn resolve_db_path(configured: Option<String>) -> String {
    if let Some(path) = configured.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) {
        return path;
    }
    directories::ProjectDirs::from("", "", "balon")
        .map(|dirs| dirs.data_dir().join("balon.db").display().to_string())
        .unwrap_or_else(|| "balon.db".to_string())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if league.games_per_team.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.games_per_team".into(),
            message: "must list at least one team".into(),
        });
    }

    if let Some(fallback) = &league.fallback_team {
        if !league.games_per_team.contains_key(fallback) {
            return Err(ConfigError::ValidationError {
                field: "league.fallback_team".into(),
                message: format!("`{fallback}` is not a key of games_per_team"),
            });
        }
    }

    let award = &config.award;
    let frac = award.min_games_fraction;
    if !(0.0..=1.0).contains(&frac) {
        return Err(ConfigError::ValidationError {
            field: "award.min_games_fraction".into(),
            message: format!("must be between 0.0 and 1.0 inclusive, got {frac}"),
        });
    }

    if award.shortlist_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "award.shortlist_size".into(),
            message: "must be > 0".into(),
        });
    }

    if award.finalists >= award.shortlist_size {
        return Err(ConfigError::ValidationError {
            field: "award.finalists".into(),
            message: format!(
                "must be smaller than shortlist_size ({}), got {}",
                award.shortlist_size, award.finalists
            ),
        });
    }

    if config.roster_location.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.roster".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
