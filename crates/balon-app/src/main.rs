// Leaderboard entry point.
//
// 1. Initialize tracing (log to file, stdout carries the rendered board)
// 2. Start up the leaderboard (config, database, roster, award)
// 3. Apply preference flags, persisting them
// 4. Print the board as text or JSON

use std::path::PathBuf;

use anyhow::Context;
use balon_app::app::Leaderboard;
use balon_app::render::{render, RenderOptions};
use balon_league::ranking::SortField;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{error, info};

/// Season leaderboard, player of the week and the Balón de Oro race
#[derive(Parser, Debug)]
#[command(name = "balon", version)]
struct Cli {
    /// Project directory holding defaults/, config/ and data/
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Sort field (puntaje, gp, ap, ga, goles, asistencias, hattricks,
    /// salvadas, bloqueos, entradas). Saved for later runs.
    #[arg(long, value_parser = parse_sort_field)]
    sort: Option<SortField>,

    /// Only show players whose name contains this text
    #[arg(long)]
    search: Option<String>,

    /// Show medals for the top three. Saved for later runs.
    #[arg(long)]
    medals: Option<bool>,

    /// Use the light theme. Saved for later runs.
    #[arg(long)]
    light: Option<bool>,

    /// Expand every row with its detail line
    #[arg(long)]
    details: bool,

    /// Print the view model as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Evaluate as of this RFC 3339 instant instead of the current time
    #[arg(long, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,
}

fn parse_sort_field(value: &str) -> Result<SortField, String> {
    SortField::from_key(value).ok_or_else(|| format!("unknown sort field '{value}'"))
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 instant '{value}': {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.base_dir)?;
    info!("balon starting up in {}", cli.base_dir.display());

    let now = cli.now.unwrap_or_else(Utc::now);
    let mut board = match Leaderboard::startup(&cli.base_dir, now).await {
        Ok(board) => board,
        Err(e) => {
            error!("startup failed: {:#}", e);
            eprintln!("⚠ Could not load the leaderboard: {e:#}");
            std::process::exit(1);
        }
    };

    if let Some(field) = cli.sort {
        board.set_sort(field)?;
    }
    if let Some(show) = cli.medals {
        board.set_show_medals(show)?;
    }
    if let Some(light) = cli.light {
        board.set_light_theme(light)?;
    }
    if let Some(search) = cli.search {
        board.set_search(search);
    }

    let view = board.view();
    if cli.json {
        let json = serde_json::to_string_pretty(&view).context("failed to serialize view")?;
        println!("{json}");
    } else {
        let options = RenderOptions {
            league_name: board.config().league.name.clone(),
            details: cli.details,
        };
        print!("{}", render(&view, &options));
    }

    info!("balon finished");
    Ok(())
}

/// Initialize tracing to log to `<base_dir>/logs/balon.log`.
fn init_tracing(base_dir: &std::path::Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("balon.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("balon=info,balon_app=info,balon_core=info,balon_league=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
