//! Headless replay: drives both contexts over the real channels against an in-memory window.
//!
//! Input is JSON lines. Each line is either a bare content event
//! (`{"type":"pointerEnter","region":"hitbox"}`) or a script step
//! (`{"op":"wait","ms":200}`, `{"op":"force","forced":true}`).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use deskpet_lib::content::render::{InteractivityPolicy, placeholder_figure};
use deskpet_lib::services::layout::Rect;
use deskpet_lib::services::runtime::{LogView, OverlayTasks, start_overlay};
use deskpet_lib::windows::passthrough::MemoryWindow;
use deskpet_lib::{ContentController, ContentEvent, OverlayConfig, OverlayError, PassthroughCoordinator};

#[derive(Parser, Debug)]
#[command(
    name = "deskpet",
    version = env!("CARGO_PKG_VERSION"),
    about = "Replay pointer scripts through the overlay interaction controller"
)]
struct Cli {
    /// JSON-lines script. Reads stdin when omitted.
    script: Option<PathBuf>,

    /// JSON config file. Falls back to DESKPET_* environment variables.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum ScriptStep {
    Wait { ms: u64 },
    Force { forced: bool },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptLine {
    Step(ScriptStep),
    Event(ContentEvent),
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn load_config(path: Option<&PathBuf>) -> Result<OverlayConfig, OverlayError> {
    match path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path).await?;
            OverlayConfig::from_json_str(&raw)
        }
        None => Ok(OverlayConfig::from_env()),
    }
}

async fn run(cli: Cli) -> Result<(), OverlayError> {
    let config = load_config(cli.config.as_ref()).await?;
    log::info!("Config: {config:?}");

    let window = MemoryWindow::new(Rect::new(200.0, 200.0, config.window_width, config.window_height));
    let coordinator = Arc::new(PassthroughCoordinator::new(&config));
    coordinator.attach_window(Box::new(window.clone()));

    let mut controller = ContentController::standard(&config);
    controller.attach_figure(placeholder_figure(), &InteractivityPolicy::new());

    let OverlayTasks {
        handle: events,
        content,
        owner,
    } = start_overlay(coordinator.clone(), controller, LogView);

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.script {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<ScriptLine>(line) {
            Ok(ScriptLine::Event(event)) => {
                if !events.send(event) {
                    log::warn!("Content task stopped early; ending replay");
                    break;
                }
            }
            Ok(ScriptLine::Step(ScriptStep::Wait { ms })) => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            Ok(ScriptLine::Step(ScriptStep::Force { forced })) => {
                coordinator.set_forced_passthrough(forced);
            }
            Err(err) => log::warn!("Line {line_no} skipped: {err}"),
        }
    }

    drop(events);
    let controller = content
        .await
        .map_err(|err| OverlayError::platform(format!("content task failed: {err}")))?;
    log::info!("Content locks at exit: {:?}", controller.locks());
    // The content task dropped the last host sender; the owner drains and stops.
    let _ = owner.await;

    let state = window.snapshot();
    log::info!(
        "Done: capturing={} forced={} bounds={:?} stats={:?}",
        coordinator.is_capturing(),
        coordinator.is_forced(),
        state.bounds,
        coordinator.stats()
    );
    Ok(())
}
