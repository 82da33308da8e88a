/// Soul Smart Worker - keeps smart playlists materialized
use clap::{Parser, Subcommand};
use soul_core::types::PlaylistId;
use soul_smart_playlists::{
    job_queue, JobQueue, JobReceiver, MaterializeOutcome, SmartPlaylistEngine, WorkerPool,
};
use soul_smart_worker::config::WorkerConfig;
use soul_storage::LocalStorageContext;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "soul-smart-worker")]
#[command(about = "Soul Player smart playlist worker", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "SOUL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the worker pool and the periodic sweeper until interrupted
    Run,
    /// Rematerialize stale smart playlists once and exit
    Sweep {
        /// Staleness window in hours (defaults to the configured value)
        #[arg(long)]
        stale_after_hours: Option<u64>,
        /// Rematerialize every smart playlist regardless of age
        #[arg(long)]
        all: bool,
    },
    /// Materialize a single playlist and exit
    Materialize {
        /// Playlist ID
        #[arg(short, long)]
        playlist: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soul_smart_playlists=info,soul_smart_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = WorkerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Run => run(config).await?,
        Commands::Sweep {
            stale_after_hours,
            all,
        } => sweep(config, stale_after_hours, all).await?,
        Commands::Materialize { playlist } => materialize(config, &playlist).await?,
    }

    Ok(())
}

struct Runtime {
    engine: Arc<SmartPlaylistEngine>,
    queue: JobQueue,
    receiver: JobReceiver,
}

async fn connect(config: &WorkerConfig) -> anyhow::Result<Runtime> {
    let pool = soul_storage::create_pool(&config.storage.database_url).await?;
    soul_storage::run_migrations(&pool).await?;
    let storage = Arc::new(LocalStorageContext::new(pool));
    tracing::info!("Database connected");

    let (queue, receiver) = job_queue();
    let engine = Arc::new(SmartPlaylistEngine::new(
        storage.clone(),
        storage,
        Arc::new(queue.clone()),
        config.engine.clone(),
    ));

    Ok(Runtime {
        engine,
        queue,
        receiver,
    })
}

async fn run(config: WorkerConfig) -> anyhow::Result<()> {
    tracing::info!(
        workers = config.engine.workers,
        sweep_interval_secs = config.engine.sweep_interval_secs,
        stale_after_hours = config.engine.stale_after_hours,
        "Starting smart playlist worker"
    );

    let Runtime {
        engine,
        queue,
        receiver,
    } = connect(&config).await?;

    let (shutdown, shutdown_rx) = watch::channel(false);
    let pool = WorkerPool::spawn(
        Arc::clone(&engine),
        receiver,
        config.engine.workers,
        shutdown_rx.clone(),
    );

    let sweeper = {
        let engine = Arc::clone(&engine);
        let interval = config.engine.sweep_interval();
        let stale_after = config.engine.stale_after();
        tokio::spawn(async move {
            engine.sweeper().run(interval, stale_after, shutdown_rx).await;
        })
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!(pending = queue.pending(), "Shutdown requested");

    shutdown.send_replace(true);
    pool.join().await;
    if let Err(e) = sweeper.await {
        tracing::error!(error = %e, "Sweeper task panicked");
    }

    tracing::info!("Smart playlist worker stopped");
    Ok(())
}

async fn sweep(
    mut config: WorkerConfig,
    stale_after_hours: Option<u64>,
    all: bool,
) -> anyhow::Result<()> {
    if let Some(hours) = stale_after_hours {
        config.engine.stale_after_hours = hours;
    }

    let Runtime {
        engine,
        queue,
        receiver,
    } = connect(&config).await?;

    let (shutdown, shutdown_rx) = watch::channel(false);
    let pool = WorkerPool::spawn(
        Arc::clone(&engine),
        receiver,
        config.engine.workers,
        shutdown_rx,
    );

    let report = if all {
        engine.sweeper().rematerialize_all().await?
    } else {
        engine.sweeper().sweep(config.engine.stale_after()).await?
    };

    queue.wait_idle().await;
    shutdown.send_replace(true);
    pool.join().await;

    println!("Rematerialized {} smart playlist(s)", report.scheduled.len());
    Ok(())
}

async fn materialize(config: WorkerConfig, playlist: &str) -> anyhow::Result<()> {
    let Runtime { engine, .. } = connect(&config).await?;

    let id = PlaylistId::new(playlist);
    match engine.materializer().materialize(&id).await? {
        MaterializeOutcome::Materialized { members, at } => {
            println!("Playlist {id}: {members} song(s) as of {at}");
        }
        MaterializeOutcome::FailedClosed { error, .. } => {
            println!("Playlist {id}: invalid rules, now empty ({error})");
        }
        MaterializeOutcome::Skipped => {
            println!("Playlist {id} is not a smart playlist");
        }
        MaterializeOutcome::Coalesced => {
            println!("Playlist {id} is already being materialized");
        }
    }

    Ok(())
}
