//! `kudos-bot` binary: wires the store, the event bus, and the chat
//! transport together and runs until a shutdown signal arrives.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default  | Description                        |
//! |-----------------------|----------|----------|------------------------------------|
//! | `KUDOS_DATA_DIR`      | no       | `./data` | Directory for the JSON store       |
//! | `ADMIN_IDS`           | yes      | -        | Comma-separated admin platform ids |
//! | `SESSION_TTL_SECS`    | no       | `1800`   | Idle wizard session lifetime       |
//! | `TASK_DELETE_CASCADE` | no       | `true`   | Delete submissions with their task |

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use kudos_bot::config::BotConfig;
use kudos_bot::notifications::NotificationRouter;
use kudos_bot::session::{self, SessionMap};
use kudos_bot::state::BotContext;
use kudos_bot::transport::{ChatTransport, LogTransport};
use kudos_events::EventBus;
use kudos_store::JsonStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kudos_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = Arc::new(BotConfig::from_env());
    tracing::info!(
        data_dir = %config.data_dir.display(),
        admins = config.admin_ids.len(),
        session_ttl_secs = config.session_ttl_secs,
        "Loaded bot configuration"
    );

    // --- Data store ---
    let store =
        Arc::new(JsonStore::open(&config.data_dir).expect("Failed to open the data store"));
    let users = store.users().len().await;
    let tasks = store.tasks().len().await;
    let products = store.products().len().await;
    tracing::info!(users, tasks, products, "Data store opened");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // --- Chat transport ---
    // Swap in a real platform binding here. The logging stand-in keeps
    // the binary runnable without platform credentials.
    let transport: Arc<dyn ChatTransport> = Arc::new(LogTransport);

    // --- Notification router ---
    let router = NotificationRouter::new(
        Arc::clone(&store),
        Arc::clone(&transport),
        config.admin_ids.clone(),
    );
    let router_handle = tokio::spawn(router.run(event_bus.subscribe()));

    // --- Session sweeper ---
    let sessions = Arc::new(SessionMap::new(config.session_ttl()));
    let sweeper_cancel = CancellationToken::new();
    let sweeper_handle = tokio::spawn(session::run_sweeper(
        Arc::clone(&sessions),
        sweeper_cancel.clone(),
    ));

    // --- Bot context ---
    // A platform binding hands each incoming update to
    // `dispatcher::spawn(context.clone(), update)`.
    let context = BotContext {
        store: Arc::clone(&store),
        config: Arc::clone(&config),
        sessions: Arc::clone(&sessions),
        event_bus: Arc::clone(&event_bus),
        transport: Arc::clone(&transport),
    };

    tracing::info!("kudos-bot started; waiting for shutdown signal");
    shutdown_signal().await;

    // --- Graceful shutdown ---
    drop(context);

    sweeper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    tracing::info!("Session sweeper stopped");

    // Dropping the bus sender closes the broadcast channel; the router
    // exits on the resulting Closed error.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), router_handle).await;
    tracing::info!("Notification router stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Resolves when the process receives Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
