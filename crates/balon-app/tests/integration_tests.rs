// Integration tests for the leaderboard.
//
// Each test builds a throwaway project directory (defaults/ plus a roster
// document) and runs the real startup path: config copy and validation,
// SQLite store, roster loading and normalization, award grant, view model
// and text rendering.

use std::path::{Path, PathBuf};

use balon_app::app::Leaderboard;
use balon_app::render::{render, RenderOptions};
use balon_app::source::SourceError;
use balon_app::view::Medal;
use balon_core::db::Database;
use balon_core::store::{StateStore, KEY_AWARD_RECORD};
use balon_league::grant::AwardState;
use balon_league::ranking::SortField;
use chrono::{DateTime, Duration, TimeZone, Utc};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the crate root, which is the cwd for
/// `cargo test`).
const FIXTURES: &str = "tests/fixtures";

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 20, 0, 0, 0).unwrap()
}

/// Fresh project dir with the shipped defaults and the fixture roster.
fn setup_project(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("balon_it_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("defaults")).unwrap();
    std::fs::create_dir_all(dir.join("data")).unwrap();

    for file in ["league.toml", "award.toml"] {
        std::fs::copy(
            workspace_root().join("defaults").join(file),
            dir.join("defaults").join(file),
        )
        .unwrap();
    }
    std::fs::copy(
        Path::new(FIXTURES).join("roster.json"),
        dir.join("data").join("roster.json"),
    )
    .unwrap();
    dir
}

fn write_roster(dir: &Path, content: &str) {
    std::fs::write(dir.join("data").join("roster.json"), content).unwrap();
}

fn cleanup(dir: &Path) {
    let _ = std::fs::remove_dir_all(dir);
}

fn names(board: &Leaderboard) -> Vec<String> {
    board
        .view()
        .ranked_players
        .iter()
        .map(|row| row.player.name.clone())
        .collect()
}

// ===========================================================================
// Startup
// ===========================================================================

#[tokio::test]
async fn first_run_copies_config_and_ranks_roster() {
    let dir = setup_project("first_run");
    let board = Leaderboard::startup(&dir, cutoff() - Duration::days(30))
        .await
        .unwrap();

    assert!(dir.join("config").join("league.toml").exists());
    assert!(dir.join("config").join("award.toml").exists());
    assert!(dir.join("balon.db").exists());

    assert_eq!(board.players().len(), 7);
    assert_eq!(board.issues().len(), 1);

    let ranked = names(&board);
    assert_eq!(ranked[0], "Bruno");
    assert_eq!(ranked.len(), 7);

    let gabi = board.players().iter().find(|p| p.name == "Gabi").unwrap();
    assert_eq!(gabi.games_in_season, 26);

    let view = board.view();
    let weekly = view.weekly_top.as_ref().unwrap();
    assert_eq!(weekly.player.name, "Bruno");
    assert!((weekly.weekly_score - 10.0).abs() < 1e-9);
    cleanup(&dir);
}

#[tokio::test]
async fn before_cutoff_shows_live_shortlist() {
    let dir = setup_project("live_shortlist");
    let board = Leaderboard::startup(&dir, cutoff() - Duration::seconds(1))
        .await
        .unwrap();

    let view = board.view();
    assert!(!view.ceremony);
    let Some(AwardState::Pending { shortlist }) = &view.award else {
        panic!("expected Pending before the cutoff");
    };
    let order: Vec<&str> = shortlist.iter().map(|e| e.player.name.as_str()).collect();
    assert_eq!(order, vec!["Bruno", "Elena", "Diego", "Gabi"]);

    let sum: f64 = shortlist.iter().map(|e| e.probability).sum();
    assert!((sum - 100.0).abs() < 1e-6);
    cleanup(&dir);
}

// ===========================================================================
// Award grant
// ===========================================================================

#[tokio::test]
async fn grant_is_frozen_across_restarts_and_roster_changes() {
    let dir = setup_project("frozen_grant");

    let first = Leaderboard::startup(&dir, cutoff() + Duration::seconds(1))
        .await
        .unwrap();
    let first_view = first.view();
    assert!(first_view.ceremony);
    let Some(AwardState::Granted(record)) = &first_view.award else {
        panic!("expected Granted after the cutoff");
    };
    assert_eq!(record.winner.name, "Bruno");
    let finalists: Vec<&str> = record.finalists.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(finalists, vec!["Elena", "Diego"]);
    assert_eq!(record.granted_at, cutoff() + Duration::seconds(1));
    let first_json = serde_json::to_string(&first_view.award).unwrap();
    drop(first);

    // The live data moves on after the grant.
    write_roster(
        &dir,
        r#"[
            {"nombre": "Newcomer", "equipo": "FYA", "goles": 80, "asistencias": 40},
            {"nombre": "Bruno", "equipo": "FYE", "goles": 1}
        ]"#,
    );

    let later = Leaderboard::startup(&dir, cutoff() + Duration::hours(1))
        .await
        .unwrap();
    let later_view = later.view();
    assert!(!later_view.ceremony);
    assert_eq!(later_view.ranked_players[0].player.name, "Newcomer");
    assert_eq!(serde_json::to_string(&later_view.award).unwrap(), first_json);
    cleanup(&dir);
}

#[tokio::test]
async fn no_eligible_players_at_cutoff_defers_grant() {
    let dir = setup_project("deferred_grant");
    write_roster(
        &dir,
        r#"[{"nombre": "Ana (POR)", "equipo": "FYE", "goles": 3, "asistencias": 2}]"#,
    );

    let board = Leaderboard::startup(&dir, cutoff() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(
        board.view().award,
        Some(AwardState::Pending {
            shortlist: Vec::new()
        })
    );
    drop(board);

    std::fs::copy(
        Path::new(FIXTURES).join("roster.json"),
        dir.join("data").join("roster.json"),
    )
    .unwrap();
    let retry = Leaderboard::startup(&dir, cutoff() + Duration::days(2))
        .await
        .unwrap();
    assert!(retry.award().unwrap().newly_granted);
    assert!(retry.view().award_is_granted());
    cleanup(&dir);
}

#[tokio::test]
async fn award_state_is_scoped_per_league() {
    let dir = setup_project("scoped_grant");
    let granted = Leaderboard::startup(&dir, cutoff()).await.unwrap();
    assert!(granted.view().award_is_granted());
    drop(granted);

    let league_path = dir.join("config").join("league.toml");
    let text = std::fs::read_to_string(&league_path).unwrap();
    std::fs::write(&league_path, text.replace("Liga Balon", "Liga Nueva")).unwrap();

    let other = Leaderboard::startup(&dir, cutoff() - Duration::days(1))
        .await
        .unwrap();
    assert!(!other.view().award_is_granted());
    cleanup(&dir);
}

#[tokio::test]
async fn unreadable_award_record_only_disables_the_award_panel() {
    let dir = setup_project("corrupt_award");
    let corrupt = serde_json::json!({"granted": "yes"});
    {
        let db = Database::open_scoped(&dir.join("balon.db").display().to_string(), "Liga Balon")
            .unwrap();
        db.save_state(KEY_AWARD_RECORD, &corrupt).unwrap();
    }

    let board = Leaderboard::startup(&dir, cutoff() + Duration::days(1))
        .await
        .unwrap();
    assert!(board.award().is_none());
    assert_eq!(names(&board)[0], "Bruno");

    let options = RenderOptions {
        league_name: board.config().league.name.clone(),
        details: false,
    };
    let screen = render(&board.view(), &options);
    assert!(screen.contains("Player of the week: Bruno"));
    assert!(screen.contains("Balón de Oro: unavailable"));
    assert!(!screen.contains("***"));
    drop(board);

    let db = Database::open_scoped(&dir.join("balon.db").display().to_string(), "Liga Balon")
        .unwrap();
    assert_eq!(db.load_state(KEY_AWARD_RECORD).unwrap(), Some(corrupt));
    cleanup(&dir);
}

// ===========================================================================
// Preferences
// ===========================================================================

#[tokio::test]
async fn preferences_survive_restarts() {
    let dir = setup_project("prefs");
    let now = cutoff() - Duration::days(3);

    let mut board = Leaderboard::startup(&dir, now).await.unwrap();
    board.set_sort(SortField::Tackles).unwrap();
    board.set_show_medals(true).unwrap();
    board.set_light_theme(true).unwrap();
    board.set_search("e");
    drop(board);

    let board = Leaderboard::startup(&dir, now).await.unwrap();
    let prefs = board.session().prefs;
    assert_eq!(prefs.sort_field, SortField::Tackles);
    assert!(prefs.show_medals);
    assert!(prefs.light_theme);
    assert!(board.session().search.is_empty());

    let view = board.view();
    assert_eq!(view.ranked_players[0].player.name, "Carla (DFC)");
    assert_eq!(view.ranked_players[0].medal, Some(Medal::Gold));
    assert_eq!(view.ranked_players[1].player.name, "Fede (DFC)");
    cleanup(&dir);
}

// ===========================================================================
// Data source failures
// ===========================================================================

#[tokio::test]
async fn missing_roster_is_fatal() {
    let dir = setup_project("missing_roster");
    std::fs::remove_file(dir.join("data").join("roster.json")).unwrap();

    let err = match Leaderboard::startup(&dir, cutoff()).await {
        Ok(_) => panic!("startup should fail without a roster"),
        Err(e) => e,
    };
    let source = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<SourceError>())
        .expect("error chain should contain a SourceError");
    assert!(matches!(source, SourceError::Unavailable { .. }));

    // Nothing was granted on a failed startup.
    write_roster(&dir, "[]");
    let board = Leaderboard::startup(&dir, cutoff() - Duration::days(1))
        .await
        .unwrap();
    assert!(!board.view().award_is_granted());
    cleanup(&dir);
}

#[tokio::test]
async fn non_array_roster_is_not_a_list() {
    let dir = setup_project("not_a_list");
    write_roster(&dir, r#"{"jugadores": []}"#);

    let err = match Leaderboard::startup(&dir, cutoff()).await {
        Ok(_) => panic!("startup should fail on a non-array roster"),
        Err(e) => e,
    };
    assert!(err
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<SourceError>(), Some(SourceError::NotAList { .. }))));
    cleanup(&dir);
}

#[tokio::test]
async fn empty_roster_is_not_a_failure() {
    let dir = setup_project("empty_roster");
    write_roster(&dir, "[]");

    let board = Leaderboard::startup(&dir, cutoff() + Duration::days(1))
        .await
        .unwrap();
    let view = board.view();
    assert!(view.is_empty());
    assert!(view.weekly_top.is_none());
    assert!(!view.award_is_granted());
    cleanup(&dir);
}

// ===========================================================================
// Rendering
// ===========================================================================

#[tokio::test]
async fn text_render_of_granted_board() {
    let dir = setup_project("render");
    let mut board = Leaderboard::startup(&dir, cutoff()).await.unwrap();
    board.set_show_medals(true).unwrap();

    let options = RenderOptions {
        league_name: board.config().league.name.clone(),
        details: true,
    };
    let screen = render(&board.view(), &options);
    assert!(screen.starts_with("Liga Balon · sorted by puntaje · dark theme"));
    assert!(screen.contains("*** Bruno is the Balón de Oro winner! ***"));
    assert!(screen.contains("🥇"));
    assert!(screen.contains("G 10 · A 5 · G/A 15 · G/P 0.50 · A/P 0.25 · Saves 20"));
    assert!(screen.contains("Player of the week: Bruno"));
    assert!(screen.contains("granted on 2025-12-20"));

    board.dismiss_ceremony();
    let screen = render(&board.view(), &options);
    assert!(!screen.contains("***"));
    cleanup(&dir);
}
