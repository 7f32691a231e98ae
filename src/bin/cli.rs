//! Forum Watch CLI
//!
//! Local execution entry point. Scheduling is left to cron or a similar
//! trigger that runs `forum-watch scrape`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use forum_watch::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    services::{DigestFormatter, HttpFetcher},
    storage::{ArticleStore, open_store},
};

/// Forum Watch - forum listing watcher
#[derive(Parser, Debug)]
#[command(
    name = "forum-watch",
    version,
    about = "Watches a forum listing for new date-prefixed topics"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the listing, store new topics and apply retention
    Scrape {
        /// Print new articles as JSON instead of the notification text
        #[arg(long)]
        json: bool,
    },

    /// Show this week's articles
    Week {
        /// Scrape before reading the store
        #[arg(long)]
        refresh: bool,
    },

    /// List stored articles (today's by default)
    List {
        /// Show the newest articles regardless of date
        #[arg(long, conflicts_with = "date")]
        all: bool,

        /// Show articles posted on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Maximum number of articles with --all
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Delete every stored article
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show configuration summary and store size
    Info,

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn scrape(config: &Config, store: &dyn ArticleStore, today: NaiveDate) -> Result<pipeline::ScrapeReport> {
    let fetcher = Arc::new(HttpFetcher::new(&config.forum)?);
    pipeline::run_scrape_pipeline(config, fetcher, store, today).await
}

/// Validate the configuration and open its article store.
fn open_checked(config: &Config) -> Result<Box<dyn ArticleStore>> {
    config.validate()?;
    open_store(&config.storage)
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        log::warn!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    log::info!("Default configuration written to {}", path.display());
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.command {
        Command::InitConfig { .. } => Config::default(),
        _ => Config::load_or_default(&cli.config).inspect_err(|e| {
            log::error!("Config load failed from {}: {}", cli.config.display(), e)
        })?,
    };
    let today = config.calendar.today();
    let formatter = DigestFormatter::new(&config.messages);

    match cli.command {
        Command::Scrape { json } => {
            let store = open_checked(&config)?;
            let report = scrape(&config, store.as_ref(), today).await?;
            let new = report.new_articles();

            if json {
                println!("{}", serde_json::to_string_pretty(&new)?);
            } else {
                match formatter.new_articles_message(&new) {
                    Some(message) => println!("{message}"),
                    None => log::info!("No new articles"),
                }
            }
        }

        Command::Week { refresh } => {
            let store = open_checked(&config)?;
            if refresh {
                scrape(&config, store.as_ref(), today).await?;
            }
            let (monday, sunday) = pipeline::week_bounds(today);
            let articles = pipeline::select_current_week(store.as_ref(), today).await?;
            println!("{}", formatter.week_digest(monday, sunday, &articles));
        }

        Command::List { all, date, limit } => {
            let store = open_checked(&config)?;
            if all {
                let total = store.count().await?;
                let articles = store.select_ordered(Some(limit)).await?;
                println!("{}", formatter.store_overview(total, &articles));
            } else {
                let day = date.unwrap_or(today);
                let articles = store.select_by_date_range(day, day).await?;
                if articles.is_empty() {
                    log::info!("No articles posted on {day}");
                }
                for article in &articles {
                    println!("{}", article.format(&config.messages.new_line));
                }
            }
        }

        Command::Clear { yes } => {
            if !yes {
                return Err(AppError::validation(
                    "refusing to delete all articles without --yes",
                ));
            }
            let store = open_checked(&config)?;
            let deleted = store.delete_all().await?;
            log::info!("Deleted {deleted} article(s)");
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            let store = open_checked(&config)?;
            log::info!("Config file: {}", cli.config.display());
            log::info!("Listing: {}", config.forum.listing_url);
            log::info!(
                "Storage: {:?} at {}",
                config.storage.backend,
                config.storage.resolved_path().display()
            );
            log::info!("Retention cap: {}", config.retention.keep);
            log::info!("Today (UTC{:+}): {}", config.calendar.utc_offset_hours, today);
            log::info!("Stored articles: {}", store.count().await?);
        }

        Command::InitConfig { force } => init_config(&cli.config, force)?,
    }

    Ok(())
}
