//! Ittai Overlay - translation overlay controller
//!
//! Main entry point for the console host.
//!
//! # Overview
//!
//! This binary wires the overlay library to a line-oriented console. It initializes:
//! - Configuration loading ([`ConfigManager`], `overlay-data/overlay.yaml`)
//! - Logging infrastructure (file rotation + console output)
//! - A single-threaded tokio runtime
//! - State management ([`StateManager`]) and runtime [`Metrics`]
//! - The overlay controller, the health poller and the presenter
//!
//! # Input
//!
//! Each stdin line is one JSON object, either a backend event
//!
//! ```text
//! {"event":"loading-started"}
//! {"event":"translation-ready","payload":{"original":"hello","translated":"こんにちは","source_lang":"en","target_lang":"ja"}}
//! {"event":"escape"}
//! ```
//!
//! or a user action: `{"command":"copy"}`, `{"command":"close"}`,
//! `{"command":"dismiss-health"}`, `{"command":"retry-health"}`,
//! `{"command":"copy-command"}` (copies the `ollama run` remediation command).
//!
//! EOF or Ctrl-C shuts everything down and logs a metrics summary.

use anyhow::{Context, Result};
use ittai_overlay::services::{
    EventBus, HeadlessWindow, OllamaHealthCheck, OverlayEvent, SystemClipboard,
};
use ittai_overlay::ui::Presenter;
use ittai_overlay::{
    APP_NAME, ConfigManager, CopyOutcome, HealthPoller, HealthPollerHandle, Metrics,
    OverlayConfig, OverlayController, OverlayHandle, StateManager, VERSION,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Directory holding `overlay.yaml`.
const CONFIG_DIR: &str = "overlay-data";

/// User actions accepted on stdin.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
enum ConsoleCommand {
    Copy,
    Close,
    DismissHealth,
    RetryHealth,
    CopyCommand,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConsoleLine {
    Event(OverlayEvent),
    Command(ConsoleCommand),
}

fn main() -> Result<()> {
    // Config first: it decides where logs go. Its own messages before this point are not recorded.
    let config_manager = ConfigManager::new(CONFIG_DIR)?;
    let config = config_manager.load()?;

    let _log_guard = ittai_overlay::logging::setup_logging(&config.logging, APP_NAME)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!("Configuration loaded from {}", config_manager.config_path());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(run(config));

    tracing::info!("Application shutdown complete");
    result
}

async fn run(config: OverlayConfig) -> Result<()> {
    let state = StateManager::new();
    let metrics = Arc::new(Metrics::new());
    let bus = EventBus::new();

    let health_check =
        OllamaHealthCheck::new(&config.ollama).context("Failed to create health check client")?;

    let clipboard = Arc::new(SystemClipboard::new());

    let overlay = OverlayController::spawn(
        &bus,
        Arc::new(HeadlessWindow::new()),
        clipboard.clone(),
        state.clone(),
        metrics.clone(),
    )
    .await
    .context("Failed to start overlay controller")?;

    let poller = HealthPoller::spawn(
        Arc::new(health_check),
        clipboard,
        state.clone(),
        metrics.clone(),
    );
    let model = config.ollama.model;
    let presenter = Presenter::spawn(state.clone(), model.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&line, &bus, &overlay, &poller, &model).await,
                Ok(None) => {
                    tracing::info!("Input closed, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            },
        }
    }

    poller.shutdown().await;
    overlay.shutdown().await;
    presenter.abort();

    metrics.log_summary();
    Ok(())
}

async fn handle_line(
    line: &str,
    bus: &EventBus,
    overlay: &OverlayHandle,
    poller: &HealthPollerHandle,
    model: &str,
) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let parsed: ConsoleLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Ignoring unrecognized input {:?}: {}", line, e);
            return;
        }
    };

    match parsed {
        ConsoleLine::Event(event) => {
            if let Err(e) = bus.publish(event).await {
                tracing::error!("Failed to publish event: {}", e);
            }
        }
        ConsoleLine::Command(ConsoleCommand::Copy) => {
            log_copy(overlay.copy().await, "Translation");
        }
        ConsoleLine::Command(ConsoleCommand::CopyCommand) => {
            log_copy(poller.copy_pull_command(model).await, "Model command");
        }
        ConsoleLine::Command(ConsoleCommand::Close) => overlay.close().await,
        ConsoleLine::Command(ConsoleCommand::DismissHealth) => poller.dismiss(),
        ConsoleLine::Command(ConsoleCommand::RetryHealth) => poller.retry(),
    }
}

fn log_copy(outcome: CopyOutcome, what: &str) {
    match outcome {
        CopyOutcome::Copied => tracing::info!("{} copied to clipboard", what),
        CopyOutcome::NothingToCopy => tracing::info!("Nothing to copy"),
        CopyOutcome::Failed(message) => tracing::warn!("{}", message),
    }
}
