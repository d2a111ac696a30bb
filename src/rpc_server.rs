//! lasttab native-messaging host.
//!
//! The browser starts this binary and talks to it over stdin/stdout with
//! length-prefixed JSON frames (see `lasttab::protocol`). Logs go to stderr
//! since stdout carries the protocol.

use std::path::PathBuf;
use std::sync::Arc;

use lasttab::app::App;
use lasttab::browser::bridge::BridgePlatform;
use lasttab::platform;
use lasttab::protocol::{decode_message, read_frame, write_frame, OutboundMessage};
use lasttab::rpc_handler::RpcHandler;
use lasttab::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use lasttab::storage::SqliteStore;
use lasttab::types::settings::HostSettings;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn database_path(settings: &HostSettings) -> PathBuf {
    match &settings.database_file {
        Some(file) => PathBuf::from(file),
        None => platform::get_data_dir().join("lasttab.db"),
    }
}

// Events are handled on spawned tasks; a single-threaded runtime polls them
// in spawn order, so activations are applied in the order they arrived.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut engine = SettingsEngine::new(None);
    let (settings, settings_error) = match engine.load() {
        Ok(settings) => (settings, None),
        Err(e) => (HostSettings::default(), Some(e)),
    };

    init_logging(&settings.log_level);
    if let Some(e) = settings_error {
        error!(
            "failed to load settings from {}, using defaults: {e}",
            engine.get_config_path()
        );
    }

    let db_path = database_path(&settings);
    if let Some(parent) = db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("failed to create data directory {}: {e}", parent.display());
        }
    }
    let store = match SqliteStore::open(&db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("failed to open store at {}: {e}", db_path.display());
            std::process::exit(1);
        }
    };
    info!(
        "lasttab host {} starting, store at {}",
        env!("CARGO_PKG_VERSION"),
        db_path.display()
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = rx.recv().await {
            if let Err(e) = write_frame(&mut stdout, &message).await {
                error!("failed to write frame: {e}");
                break;
            }
        }
    });

    let bridge = Arc::new(BridgePlatform::new(tx.clone()));
    let app = Arc::new(App::new(bridge.clone(), store, settings));

    app.restore_state().await;
    // Handlers still running at EOF are drained before exit.
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            app.startup_maintenance().await;
        }));
    }

    let handler = RpcHandler::new(app, bridge.clone(), tx);
    let mut stdin = tokio::io::stdin();
    loop {
        let body = match read_frame(&mut stdin).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                info!("browser closed the connection");
                break;
            }
            Err(e) => {
                error!("failed to read frame: {e}");
                break;
            }
        };
        match decode_message(&body) {
            Ok(message) => {
                debug!("inbound: {message:?}");
                if let Some(task) = handler.handle_message(message) {
                    tasks.retain(|task| !task.is_finished());
                    tasks.push(task);
                }
            }
            Err(e) => warn!("ignoring frame: {e}"),
        }
    }

    handler.shutdown(tasks).await;
    writer.abort();
}
