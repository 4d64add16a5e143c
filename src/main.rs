use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivianights::{
    api,
    bank::{check_bank, load_bank},
    broadcast,
    config::AppConfig,
    replication::{FileSnapshotStore, Replicator, CHANNEL_NAME},
    state::{AppState, BankSource},
    types::Role,
    ws,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trivianights=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting trivia night...");

    let config = AppConfig::from_env();

    // A bank that cannot be loaded (or fails strict validation) is fatal
    let bank_path = config.bank_path();
    let records = match load_bank(&bank_path).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let errors = match check_bank(&records, config.strict_validation) {
        Ok(errors) => errors,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let replicator = Replicator::new(Arc::new(FileSnapshotStore::new(&config.snapshot_dir)));
    let state = Arc::new(
        AppState::with_replicator(Role::Host, replicator).with_bank_source(BankSource {
            data_dir: config.data_dir.clone(),
            strict: config.strict_validation,
        }),
    );
    state
        .install_bank(&config.bank_file, records, errors)
        .await;
    state.set_timer_duration(i64::from(config.timer_seconds)).await;
    tracing::info!(
        "Replicating on {} (snapshots in {})",
        CHANNEL_NAME,
        config.snapshot_dir.display()
    );

    // Spawn background task for projector countdown ticks
    broadcast::spawn_timer_broadcaster(state.clone());

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/state/export", get(api::export_state))
        .route("/api/state/import", post(api::import_state))
        .route("/api/bank/errors", get(api::bank_errors))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on http://{}", config.bind_addr);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
