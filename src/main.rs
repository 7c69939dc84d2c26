use color_eyre::{eyre::eyre, Result};
use padmapper::controller::ControllerHandle;
use padmapper::mapping::{
    run_dispatcher, ChannelSink, Collaborators, InputEngine, NoHaptics, SharedGameState,
    SharedWindowState, SystemClock, TracingSink,
};
use padmapper::persistence::ConfigStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const OUTPUT_CHANNEL_CAPACITY: usize = 1000;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let store = ConfigStore::new();
    let config = store.load_or_default().await?;
    info!("Using configuration from {}", store.path().display());

    info!("Initializing controller");
    let controller = Arc::new(
        ControllerHandle::spawn(Some(config.controller.clone()))
            .await
            .map_err(|e| eyre!("Failed to spawn controller: {}", e))?,
    );

    // Updated by the memory reader and window tracker once they attach
    let game_state = Arc::new(SharedGameState::new());
    let window = Arc::new(SharedWindowState::new());

    let (sink, output_rx) = ChannelSink::channel(OUTPUT_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();
    let dispatcher = tokio::spawn(run_dispatcher(output_rx, TracingSink, cancel.clone()));

    let mut engine = InputEngine::new(
        config.engine,
        config.bindings,
        Collaborators {
            controller: controller.clone(),
            game_state,
            window,
            output: Arc::new(sink),
            clock: Arc::new(SystemClock),
            haptics: Arc::new(NoHaptics),
        },
    )
    .map_err(|e| eyre!("Failed to create input engine: {}", e))?;
    engine
        .start()
        .map_err(|e| eyre!("Failed to start input engine: {}", e))?;

    info!("padmapper running, press Ctrl+C to exit");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| eyre!("Failed to listen for Ctrl+C: {}", e))?;

    info!("Shutting down");
    engine.stop();
    drop(engine);

    cancel.cancel();
    match dispatcher.await {
        Ok(count) => info!("Output dispatcher finished after {} events", count),
        Err(e) => error!("Output dispatcher task failed: {}", e),
    }

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

/// Parses `RUST_LOG` directives such as `padmapper=debug,gilrs=warn`
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
