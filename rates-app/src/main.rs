//! # Rates Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the storage adapters and the NBRB client
//! - Create the rate resolver
//! - Dispatch a CLI command
//!
//! The conversational transport lives elsewhere; this CLI is the thin
//! stand-in that validates input and calls the collaborator-facing API.

mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rates_nbrb::NbrbClient;
use rates_repo::{SqliteStore, TtlCache};
use rates_service::RateResolver;
use rates_types::{CurrencyCode, PopularityOrder, RateCache, parse_rate_date};

#[derive(Parser)]
#[command(name = "rates")]
#[command(author, version, about = "Currency exchange rate lookup service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the rate for a currency on a date
    Rate {
        /// Currency code, e.g. USD
        currency: String,
        /// Date as YYYY-MM-DD; defaults to today
        date: Option<String>,
    },
    /// List all known currencies
    Currencies {
        /// Show the most requested currencies first
        #[arg(long)]
        most_requested_first: bool,
    },
    /// Refresh today's rates for the configured popular currencies
    Refresh,
    /// Sync the currency reference from the remote source
    Sync,
    /// Run scheduled refresh and cache maintenance until interrupted
    Daemon,
}

type Resolver = RateResolver<TtlCache, SqliteStore, NbrbClient>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rates_app=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = config::Config::from_env()?;

    tracing::info!("Using database: {}", config.database_url);

    let store = SqliteStore::new(&config.database_url).await?;
    let cache = TtlCache::with_ttl(Some(config.cache_snapshot_path.clone()), config.cache_ttl);
    let source = NbrbClient::new(config.nbrb_base_url.as_str()).with_timeout(config.http_timeout);
    let resolver = RateResolver::new(cache, store, source);

    match cli.command {
        Commands::Rate { currency, date } => {
            rate(&resolver, &currency, date.as_deref()).await;
        }
        Commands::Currencies {
            most_requested_first,
        } => {
            let order = if most_requested_first {
                PopularityOrder::MostRequestedFirst
            } else {
                PopularityOrder::LeastRequestedFirst
            };
            currencies(&resolver, order).await;
        }
        Commands::Refresh => {
            refresh(&resolver, &config.popular_currencies).await;
        }
        Commands::Sync => {
            let applied = resolver.sync_currency_reference().await?;
            println!("Currency reference synced: {applied} entries");
        }
        Commands::Daemon => {
            daemon(&resolver, &config).await?;
        }
    }

    Ok(())
}

/// Resolves and prints one rate. Input validation happens here, before the
/// resolver: the code must parse and belong to the known currency set, and
/// the date must be a well-formed calendar date.
async fn rate(resolver: &Resolver, currency: &str, date: Option<&str>) {
    let code = match CurrencyCode::new(currency) {
        Ok(code) => code,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    let mut known = resolver.list_currencies(PopularityOrder::default()).await;
    if known.is_empty() {
        // First run against an empty reference: bootstrap it from the remote.
        match resolver.sync_currency_reference().await {
            Ok(_) => known = resolver.list_currencies(PopularityOrder::default()).await,
            Err(e) => tracing::warn!("currency reference bootstrap failed: {e}"),
        }
    }
    if !known.is_empty() && !known.iter().any(|l| l.code == code) {
        println!("{code} is not a supported currency. See `rates currencies`.");
        return;
    }

    let date = match date {
        Some(raw) => match parse_rate_date(raw) {
            Ok(date) => date,
            Err(e) => {
                println!("{e}");
                return;
            }
        },
        None => chrono::Local::now().date_naive(),
    };

    match resolver.resolve(&code, date).await {
        Ok(resolved) => println!("{} on {}: {}", resolved.currency, resolved.date, resolved),
        Err(e) => println!("{e}"),
    }

    snapshot(resolver);
}

async fn currencies(resolver: &Resolver, order: PopularityOrder) {
    let listed = resolver.list_currencies(order).await;
    if listed.is_empty() {
        println!("No currencies known yet. Run `rates sync` first.");
        return;
    }
    for listing in listed {
        println!(
            "{}  {} (per {})",
            listing.code, listing.display_name, listing.scale
        );
    }
}

async fn refresh(resolver: &Resolver, popular: &[CurrencyCode]) {
    let today = chrono::Local::now().date_naive();
    let summary = resolver.refresh_daily_rates(popular, today).await;

    println!(
        "Refreshed {} of {} currencies for {today}",
        summary.refreshed,
        popular.len()
    );
    for failed in &summary.failed {
        println!("  failed: {failed}");
    }

    snapshot(resolver);
}

/// Scheduled mode: refresh popular currencies, sweep expired cache entries
/// and write a snapshot on every tick; a final snapshot on Ctrl-C.
async fn daemon(resolver: &Resolver, config: &config::Config) -> Result<()> {
    tracing::info!(
        interval_secs = config.refresh_interval.as_secs(),
        "daemon started"
    );

    let mut ticker = tokio::time::interval(config.refresh_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let today = chrono::Local::now().date_naive();
                let summary = resolver
                    .refresh_daily_rates(&config.popular_currencies, today)
                    .await;
                tracing::info!(
                    refreshed = summary.refreshed,
                    failed = summary.failed.len(),
                    "scheduled refresh done"
                );

                match resolver.cache().sweep().await {
                    Ok(evicted) if evicted > 0 => tracing::info!(evicted, "cache sweep"),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("cache sweep failed: {e}"),
                }
                snapshot(resolver);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down, writing final cache snapshot");
                snapshot(resolver);
                break;
            }
        }
    }

    Ok(())
}

fn snapshot(resolver: &Resolver) {
    if let Err(e) = resolver.cache().snapshot() {
        tracing::warn!("cache snapshot failed: {e}");
    }
}
