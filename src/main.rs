use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streakboard::api::{build_router, cors_layer, state::AppState};
use streakboard::calculate::parse_window;
use streakboard::checkin::CheckInService;
use streakboard::config::AppConfig;
use streakboard::models::{CheckInStatus, UserId};
use streakboard::standings::{self, parse_group_metric};
use streakboard::storage::{ActivityRepository, JsonlRepository, StorageConfig};

#[derive(Parser)]
#[command(name = "streakboard")]
#[command(about = "Check-in streaks, challenge scores and group leaderboards")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Record a check-in and print the updated streak
    CheckIn {
        #[arg(long)]
        user: String,

        /// "went" or "going"
        #[arg(long)]
        status: CheckInStatus,

        /// Day to record (YYYY-MM-DD), defaults to today; may not precede
        /// the latest recorded check-in
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show a user's streak and weekly check-ins
    Stats {
        #[arg(long)]
        user: String,
    },

    /// Generate scores for every participant of a challenge week
    Score {
        #[arg(long)]
        challenge: String,

        /// 1-based week number
        #[arg(long)]
        week: u32,
    },

    /// Print a ranked leaderboard
    Leaderboard {
        #[arg(long, conflicts_with_all = ["group", "league"])]
        challenge: Option<String>,

        #[arg(long, conflicts_with = "league")]
        group: Option<String>,

        #[arg(long)]
        league: Option<String>,

        /// Group metric: protein, calories or workoutMinutes
        #[arg(long, default_value = "protein")]
        metric: String,

        /// Group window: week, month or all
        #[arg(long, default_value = "week")]
        window: String,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(ref dir) = cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn open_repository(data_dir: &Path) -> Arc<dyn ActivityRepository> {
    Arc::new(JsonlRepository::new(StorageConfig::new(data_dir.to_path_buf())))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_tracing(&config.log_level, cli.json_logs);

    tracing::info!("Starting streakboard v{}", env!("CARGO_PKG_VERSION"));

    let repository = open_repository(&config.data_dir);

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let state = AppState::new(repository, &config.cache);
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::CheckIn { user, status, date } => {
            let service = CheckInService::new(repository);
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let outcome = service.record(&UserId::from(user), date, status)?;
            print_json(&outcome)?;
        }
        Commands::Stats { user } => {
            let service = CheckInService::new(repository);
            let stats = service.stats(&UserId::from(user), Utc::now().date_naive())?;
            print_json(&stats)?;
        }
        Commands::Score { challenge, week } => {
            if week == 0 {
                bail!("--week is 1-based");
            }
            let scores =
                standings::generate_week_scores(repository.as_ref(), &challenge.into(), week)?;
            print_json(&scores)?;
        }
        Commands::Leaderboard {
            challenge,
            group,
            league,
            metric,
            window,
        } => {
            let rows = match (challenge, group, league) {
                (Some(id), _, _) => standings::challenge_leaderboard(repository.as_ref(), &id.into())?,
                (_, Some(id), _) => standings::group_leaderboard(
                    repository.as_ref(),
                    &id.into(),
                    parse_group_metric(&metric)?,
                    parse_window(&window)?,
                    Utc::now(),
                )?,
                (_, _, Some(id)) => standings::league_leaderboard(repository.as_ref(), &id.into())?,
                (None, None, None) => bail!("One of --challenge, --group or --league is required"),
            };
            print_json(&rows)?;
        }
    }

    Ok(())
}
