//! # Queue-Mover Service
//!
//! Binary entry point for the queue-mover daemon.
//!
//! This executable:
//! - Loads configuration from environment and files
//! - Initializes logging
//! - Builds one AWS SQS provider per region in use
//! - Runs the supervisor until shutdown or the first fatal mover error
//!
//! Exit codes: 0 on clean shutdown, 1 on a fatal mover error, 3 on
//! configuration errors.

use clap::Parser;
use queue_mover_core::{MoverConfig, ShutdownController, Supervisor};
use queue_mover_runtime::{AwsSqsProvider, QueuePair, QueueProvider};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Queue-mover - relocates messages between queue pairs
#[derive(Parser)]
#[command(name = "queue-mover")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Moves messages from source queues to their paired destinations")]
#[command(
    long_about = "Queue-mover watches each configured source queue and relocates \
                  every message to the paired destination queue, creating the \
                  destination from the source's attributes when it does not exist"
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "QM_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "queue_mover_service=info,queue_mover_core=info,queue_mover_runtime=info".into()
    });
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting queue-mover");

    let pairs = match load_pairs(cli.config.as_deref()) {
        Ok(pairs) => pairs,
        Err(message) => {
            error!(error = %message, "Configuration is invalid; aborting");
            std::process::exit(3);
        }
    };

    // -------------------------------------------------------------------------
    // Build providers
    //
    // One SQS client per region in use; pairs whose source lives in the same
    // region share a client. The destination is addressed by full URL, so a
    // cross-region pair still works through the source-region client.
    // -------------------------------------------------------------------------
    let mut providers: HashMap<String, Arc<dyn QueueProvider>> = HashMap::new();
    let mut assignments: Vec<(QueuePair, Arc<dyn QueueProvider>)> = Vec::new();
    for pair in pairs {
        let region = pair.source.region().to_string();
        let provider = match providers.get(&region) {
            Some(provider) => Arc::clone(provider),
            None => {
                let provider: Arc<dyn QueueProvider> =
                    Arc::new(AwsSqsProvider::for_region(&region).await);
                providers.insert(region.clone(), Arc::clone(&provider));
                info!(region = %region, "Created SQS client");
                provider
            }
        };
        assignments.push((pair, provider));
    }

    // -------------------------------------------------------------------------
    // Shutdown wiring
    //
    // SIGINT and SIGTERM both trigger the cooperative shutdown broadcast; the
    // supervisor and every mover drain their in-flight work before stopping.
    // -------------------------------------------------------------------------
    let controller = ShutdownController::new();
    tokio::spawn(wait_for_signal(controller.clone()));

    match Supervisor::new().run(assignments, controller).await {
        Ok(()) => {
            info!("queue-mover stopped");
        }
        Err(e) => {
            error!(pair_id = e.pair_id(), error = %e, "queue-mover failed");
            std::process::exit(1);
        }
    }
}

/// Load, deserialize, and validate the pair configuration
///
/// Sources (applied in order, later sources override earlier ones):
///  1. /etc/queue-mover/service.yaml    - system-wide defaults
///  2. ./config/service.yaml            - deployment-local override
///  3. Path given by --config / QM_CONFIG_FILE - operator-specified file
///  4. Environment variables prefixed QM__ (double-underscore separator)
fn load_pairs(explicit_path: Option<&std::path::Path>) -> Result<Vec<QueuePair>, String> {
    let mut config_builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/queue-mover/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Some(path) = explicit_path {
        config_builder = config_builder.add_source(
            config::File::with_name(&path.to_string_lossy())
                .required(true)
                .format(config::FileFormat::Yaml),
        );
        info!(path = %path.display(), "Loading configuration from explicit path");
    }

    let config = config_builder
        .add_source(config::Environment::with_prefix("QM").separator("__"))
        .build()
        .map_err(|e| e.to_string())?;

    let mover_config: MoverConfig = config.try_deserialize().map_err(|e| e.to_string())?;
    let pairs = mover_config.validate().map_err(|e| e.to_string())?;

    info!(pairs = pairs.len(), "Configuration loaded");
    Ok(pairs)
}

/// Resolve when the process receives SIGINT or SIGTERM, then broadcast shutdown
async fn wait_for_signal(controller: ShutdownController) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down"),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to wait for shutdown signal");
            return;
        }
        info!("Received interrupt, shutting down");
    }

    controller.signal();
}
