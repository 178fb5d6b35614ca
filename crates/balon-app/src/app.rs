// Leaderboard orchestration.
//
// Startup sequence:
// 1. Load config (copying defaults on first run)
// 2. Open the database scoped to the league
// 3. Load preferences
// 4. Load and normalize the roster (a source failure ends the session)
// 5. Evaluate the award grant, once
//
// After startup the leaderboard only answers view requests and preference
// changes. The award is never re-evaluated within a session.

use std::path::Path;

use anyhow::Context;
use balon_core::config::{self, Config};
use balon_core::db::Database;
use balon_core::store::StateStore;
use balon_league::grant::{evaluate_grant, GrantError, GrantOutcome};
use balon_league::ranking::SortField;
use balon_league::roster::{normalize_roster, Player, RosterIssue};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::session::{Preferences, Session};
use crate::source::{source_for, RosterSource};
use crate::view::{build_view_model, ViewModel};

pub struct Leaderboard {
    config: Config,
    store: Box<dyn StateStore>,
    players: Vec<Player>,
    issues: Vec<RosterIssue>,
    session: Session,
    /// `Err` carries the reason the stored award record could not be read.
    award: Result<GrantOutcome, String>,
}

impl Leaderboard {
    /// Run the full startup sequence against the project in `base_dir`.
    pub async fn startup(base_dir: &Path, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let config = config::load_config(base_dir).context("failed to load configuration")?;
        info!(
            "config loaded: league={}, {} teams, award cutoff {}",
            config.league.name,
            config.league.games_per_team.len(),
            config.award.cutoff
        );

        let db_path = resolve_relative(base_dir, &config.db_path);
        let db = Database::open_scoped(&db_path, &config.league.name)
            .context("failed to open database")?;
        if db.has_award_record().context("failed to check award record")? {
            info!("award record present for league '{}'", config.league.name);
        }

        let location = resolve_relative(base_dir, &config.roster_location);
        let source = source_for(&location);
        Self::from_source(config, Box::new(db), source.as_ref(), now).await
    }

    /// Steps 3-5 of startup with an already opened store and a chosen source.
    pub async fn from_source(
        config: Config,
        store: Box<dyn StateStore>,
        source: &dyn RosterSource,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Self> {
        let records = source
            .load_roster()
            .await
            .context("failed to load roster")?;
        Self::from_records(config, store, &records, now)
    }

    /// Steps 3-5 of startup with raw roster records already in hand.
    pub fn from_records(
        config: Config,
        store: Box<dyn StateStore>,
        records: &[Value],
        now: DateTime<Utc>,
    ) -> anyhow::Result<Self> {
        let prefs = Preferences::load(store.as_ref());

        let roster = normalize_roster(records, &config.league);
        if !roster.issues.is_empty() {
            warn!("{} roster records skipped", roster.issues.len());
        }
        info!("roster ready: {} players", roster.players.len());

        let award = match evaluate_grant(store.as_ref(), &roster.players, &config.award, now) {
            Ok(outcome) => {
                if outcome.newly_granted {
                    info!("award ceremony pending for this session");
                }
                Ok(outcome)
            }
            // The record is left untouched; only the award panel goes dark.
            Err(e @ GrantError::CorruptRecord { .. }) => {
                error!("award unavailable: {}", e);
                Err(e.to_string())
            }
            Err(e) => return Err(e).context("failed to evaluate award"),
        };

        Ok(Self {
            config,
            store,
            players: roster.players,
            issues: roster.issues,
            session: Session::new(prefs),
            award,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Records that were excluded during normalization.
    pub fn issues(&self) -> &[RosterIssue] {
        &self.issues
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Award evaluation made at startup, `None` if the stored record was
    /// unreadable.
    pub fn award(&self) -> Option<&GrantOutcome> {
        self.award.as_ref().ok()
    }

    pub fn award_error(&self) -> Option<&str> {
        self.award.as_ref().err().map(String::as_str)
    }

    /// Build the current view model. Cheap, and safe to call any number of
    /// times.
    pub fn view(&self) -> ViewModel {
        build_view_model(
            &self.players,
            &self.session,
            self.award.as_ref().map_err(String::as_str),
        )
    }

    pub fn set_sort(&mut self, field: SortField) -> anyhow::Result<()> {
        self.session.prefs.sort_field = field;
        self.persist_prefs()
    }

    pub fn set_light_theme(&mut self, light: bool) -> anyhow::Result<()> {
        self.session.prefs.light_theme = light;
        self.persist_prefs()
    }

    pub fn set_show_medals(&mut self, show: bool) -> anyhow::Result<()> {
        self.session.prefs.show_medals = show;
        self.persist_prefs()
    }

    /// Search text is session-only and never persisted.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.session.search = text.into();
    }

    /// Stop showing the ceremony banner for the rest of the session.
    pub fn dismiss_ceremony(&mut self) {
        if let Ok(outcome) = &mut self.award {
            outcome.newly_granted = false;
        }
    }

    fn persist_prefs(&self) -> anyhow::Result<()> {
        self.session
            .prefs
            .save(self.store.as_ref())
            .context("failed to save preferences")
    }
}

/// Relative paths in config are relative to the project directory. URLs and
/// absolute paths pass through.
fn resolve_relative(base_dir: &Path, location: &str) -> String {
    if location == ":memory:" || location.contains("://") || Path::new(location).is_absolute() {
        location.to_string()
    } else {
        base_dir.join(location).display().to_string()
    }
}
