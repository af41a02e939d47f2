//! `doorcard`: the door control card in a terminal.
//!
//! Hosts a single [`DoorWidget`](doorcard_core::DoorWidget) built from a
//! named card in the config file, backed by a loopback host that models
//! the smart-home side. An optional JSON-lines feed scripts state changes
//! (door opening, lock jams, feedback messages) to watch the card react.
//!
//! Logs are written to a file (default `/tmp/doorcard.log`) so they never
//! corrupt the terminal.

mod app;
mod event;
mod feed;
mod host;
mod input;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;

/// Terminal front end for the door control card.
#[derive(Parser, Debug)]
#[command(name = "doorcard", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "DOORCARD_CONFIG")]
    config: Option<PathBuf>,

    /// Card to show (defaults to `default_card`)
    #[arg(long, env = "DOORCARD_CARD")]
    card: Option<String>,

    /// JSON-lines file of state updates to replay
    #[arg(short, long)]
    feed: Option<PathBuf>,

    /// Delay between feed updates, in milliseconds
    #[arg(long, default_value_t = 500)]
    feed_interval_ms: u64,

    /// PIN the loopback host accepts
    #[arg(long, default_value = "1234", env = "DOORCARD_PIN")]
    pin: String,

    /// Log file path
    #[arg(long, default_value = "/tmp/doorcard.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. Hold the guard for the life of the app so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "doorcard={level},doorcard_core={level},doorcard_config={level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("."));
    let log_name = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("doorcard.log"));

    let appender = tracing_appender::rolling::never(log_dir, log_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let path = cli.config.clone().unwrap_or_else(doorcard_config::config_path);
    let config = doorcard_config::load_config_from(&path)
        .wrap_err_with(|| format!("loading {}", path.display()))?;
    let (card, widget_config) = doorcard_config::widget_config(&config, cli.card.as_deref())?;
    info!(%card, config = %path.display(), "starting doorcard");

    let cancel = CancellationToken::new();
    let feed = cli.feed.clone().map(|feed_path| {
        let (tx, rx) = mpsc::unbounded_channel();
        feed::spawn_feed(
            feed_path,
            Duration::from_millis(cli.feed_interval_ms),
            tx,
            cancel.clone(),
        );
        rx
    });

    let mut app = App::new(card, widget_config, cli.pin.clone(), feed)?;
    let result = app.run().await;
    cancel.cancel();
    result
}
