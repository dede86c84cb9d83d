use ad_ranking_service::{
    catalog::AdCatalog,
    models::AdScore,
    services::tracking::{BehaviorTracker, FileHistoryStore},
    utils::{Clock, SystemClock},
    Config, FeedService, ViewerSessions,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "ad-ranking-service", about = "Personalized ad ranking from local history")]
struct Cli {
    /// Track a named viewer instead of the default history
    #[arg(long, global = true)]
    viewer: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ranked ads for the viewer
    Feed {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record that an ad was displayed
    View {
        ad_id: String,
        /// Seconds on screen
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Record that an ad was clicked
    Click { ad_id: String },
    /// View/click counts and category preferences
    Profile,
    /// Highest-priority ads regardless of history
    Trending {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Drop all recorded interactions
    Clear,
}

#[derive(Serialize)]
struct FeedEntry<'a> {
    id: &'a str,
    title: &'a str,
    category: String,
    score: u8,
    reasons: &'a [String],
}

impl<'a> FeedEntry<'a> {
    fn from_score(scored: &'a AdScore, display_reasons: usize) -> Self {
        Self {
            id: &scored.ad.id,
            title: &scored.ad.title,
            category: scored.ad.category.to_string(),
            score: scored.score,
            reasons: scored.top_reasons(display_reasons),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr so stdout stays machine-readable
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load config")?;

    info!(service = %config.service_name, "Starting");

    let catalog = match &config.catalog_path {
        Some(path) => AdCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => AdCatalog::reference().context("Failed to load reference catalog")?,
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tracker = match &cli.viewer {
        Some(viewer_id) => {
            ViewerSessions::new(&config.history_dir, &config.storage_key, Arc::clone(&clock))
                .tracker(viewer_id)
        }
        None => {
            let store = FileHistoryStore::new(&config.history_dir, &config.storage_key);
            Arc::new(Mutex::new(BehaviorTracker::open(
                Arc::new(store),
                Arc::clone(&clock),
            )))
        }
    };
    let mut tracker = tracker
        .lock()
        .map_err(|_| anyhow!("Tracker lock poisoned"))?;

    let feed = FeedService::default();

    match cli.command {
        Command::Feed { limit } => {
            let limit = limit.unwrap_or(config.feed_limit);
            let history = tracker.history();
            let ranked = feed.personalized_feed(&catalog, &history, limit, clock.now());
            let entries: Vec<FeedEntry<'_>> = ranked
                .iter()
                .map(|scored| FeedEntry::from_score(scored, config.display_reasons))
                .collect();
            print_json(&entries)?;
        }
        Command::View { ad_id, duration } => {
            let ad = catalog
                .get(&ad_id)
                .ok_or_else(|| anyhow!("Unknown ad: {}", ad_id))?;
            tracker.record_view(&ad.id, ad.category, duration)?;
        }
        Command::Click { ad_id } => {
            let ad = catalog
                .get(&ad_id)
                .ok_or_else(|| anyhow!("Unknown ad: {}", ad_id))?;
            tracker.record_click(&ad.id, ad.category)?;
        }
        Command::Profile => {
            let history = tracker.history();
            print_json(&feed.activity_summary(&history, clock.now()))?;
        }
        Command::Trending { limit } => {
            let limit = limit.unwrap_or(config.feed_limit);
            print_json(&feed.cold_start().trending_ads(&catalog, limit))?;
        }
        Command::Clear => {
            tracker.clear_history()?;
        }
    }

    tracker.close();
    Ok(())
}
