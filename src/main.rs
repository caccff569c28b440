//! Apiary - economy backend for the BeeMiner idle game

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apiary::{
    config::Args,
    db::MongoClient,
    economy::{EconomyStore, MemoryEconomyStore, MongoEconomyStore},
    notify::Notifier,
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("apiary={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Apiary - BeeMiner Economy Backend");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Email provider: {}", args.email_provider);
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let (store, store_backend): (Arc<dyn EconomyStore>, &'static str) =
        match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(client) => match MongoEconomyStore::new(&client).await {
                Ok(store) => {
                    info!("MongoDB connected successfully");
                    (Arc::new(store), "mongodb")
                }
                Err(e) => {
                    if args.dev_mode {
                        warn!("Economy collection setup failed (dev mode, using memory store): {}", e);
                        (MemoryEconomyStore::shared(), "memory")
                    } else {
                        error!("Economy collection setup failed: {}", e);
                        std::process::exit(1);
                    }
                }
            },
            Err(e) => {
                if args.dev_mode {
                    warn!("MongoDB connection failed (dev mode, using memory store): {}", e);
                    (MemoryEconomyStore::shared(), "memory")
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        };

    // Build notification facade (fire-and-forget email)
    let notifier = Notifier::from_args(&args);

    // Create application state and run the server
    let state = Arc::new(AppState::new(args, store, store_backend, notifier));

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
