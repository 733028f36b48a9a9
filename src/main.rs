//! Leaderboard Aggregator CLI
//!
//! Entry point for the aggregator binary. Provides subcommands for:
//! - `run` - Start the rebuild loop
//! - `rebuild` - Run a single rebuild cycle and exit
//! - `migrate` - Run database migrations
//! - `version` - Show version information

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leaderboard_aggregator::aggregator::LeaderboardAggregator;
use leaderboard_aggregator::config::{LoggingSettings, Settings};
use leaderboard_aggregator::ports::BuyValueAggregator;
use leaderboard_aggregator::store::PostgresStore;

/// Leaderboard scoring aggregator
#[derive(Parser, Debug)]
#[command(name = "leaderboard-aggregator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Environment name used to pick the configuration file
    #[arg(short, long, env = "APP_ENV", default_value = "development")]
    environment: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the rebuild loop until interrupted
    Run,

    /// Run a single rebuild cycle and exit
    Rebuild,

    /// Run database migrations
    Migrate,

    /// Show version information
    Version,
}

fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect(settings: &Settings) -> eyre::Result<PostgresStore> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .min_connections(settings.database.min_connections)
        .acquire_timeout(settings.database.connect_timeout())
        .idle_timeout(settings.database.idle_timeout())
        .connect(&settings.database.url)
        .await?;

    Ok(PostgresStore::new(pool))
}

fn build_aggregator(
    settings: &Settings,
    store: &Arc<PostgresStore>,
) -> LeaderboardAggregator<PostgresStore> {
    let buy_values: Arc<dyn BuyValueAggregator> = Arc::clone(store) as Arc<dyn BuyValueAggregator>;
    LeaderboardAggregator::new(
        Arc::clone(store),
        buy_values,
        settings.aggregator.interval(),
        settings.aggregator.wallet_concurrency,
    )
}

fn install_metrics(settings: &Settings) -> eyre::Result<()> {
    if !settings.metrics.enabled {
        return Ok(());
    }
    let addr: std::net::SocketAddr = settings.metrics.socket_addr().parse()?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // .env first so the config layer can see it.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("leaderboard-aggregator {}", leaderboard_aggregator::VERSION);
        return Ok(());
    }

    let settings = Settings::load(&cli.environment)?;
    settings
        .validate()
        .map_err(|errors| eyre::eyre!("invalid configuration: {}", errors.join("; ")))?;

    init_tracing(&settings.logging);
    info!(
        version = leaderboard_aggregator::VERSION,
        environment = %cli.environment,
        "starting leaderboard aggregator"
    );

    match cli.command {
        Commands::Run => {
            install_metrics(&settings)?;
            let store = Arc::new(connect(&settings).await?);
            store.run_migrations().await?;

            let aggregator = build_aggregator(&settings, &store);
            let shutdown = CancellationToken::new();
            let worker = {
                let shutdown = shutdown.clone();
                tokio::spawn(async move { aggregator.run(shutdown).await })
            };

            tokio::signal::ctrl_c().await?;
            info!("interrupt received, shutting down");
            shutdown.cancel();
            worker.await?;
        }
        Commands::Rebuild => {
            let store = Arc::new(connect(&settings).await?);
            store.run_migrations().await?;

            let aggregator = build_aggregator(&settings, &store);
            let summary = aggregator.rebuild().await?;
            info!(
                wallets = summary.wallets,
                published = summary.published,
                skipped = summary.skipped,
                "rebuild finished"
            );
        }
        Commands::Migrate => {
            let store = connect(&settings).await?;
            store.run_migrations().await?;
            info!("migrations applied");
        }
        Commands::Version => unreachable!("handled above"),
    }

    Ok(())
}
