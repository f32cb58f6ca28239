// Standard library
use std::sync::Arc;

// 3rd party crates
use tokio::signal::ctrl_c;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

// Project imports
use crpt_api::functions::run;
use crpt_api::settings::ConfigManager;

/// Entry point of the document submission demo.
///
/// Loads the configuration, then submits a batch of sample documents to the
/// document API without exceeding the configured request rate.
#[tokio::main]
async fn main() {
    // loads the .env file from the current directory or parents.
    dotenvy::dotenv_override().ok();

    let config: Arc<ConfigManager> = match ConfigManager::new().await {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to initialize configuration: {}", e);
            std::process::exit(1);
        }
    };

    // setup logging.
    let log_level: String = config.get_log_level().await;

    let mut filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(log_level);
    for directive in ["hyper_util=error", "reqwest=error", "hyper=error"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .init();

    info!("⚙️ Settings have been loaded.");

    // Create a broadcast channel for shutdown signal
    let (shutdown_tx, _) = broadcast::channel(1);
    let shutdown_tx_clone = shutdown_tx.clone();

    // Handle Ctrl+C
    tokio::spawn(async move {
        if let Err(e) = ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received shutdown signal, initiating graceful shutdown...");
        let _ = shutdown_tx_clone.send(());
    });

    if let Err(e) = run(config, shutdown_tx.subscribe()).await {
        error!("Application error: {}", e);
    }

    info!("Shutdown complete.");
}
