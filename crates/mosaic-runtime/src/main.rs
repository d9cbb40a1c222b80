//! mosaic: live multiplexed deploy console.
//!
//! Reads session and pane events as JSON lines, one control loop owns the
//! terminal. Logs go to stderr or `--log-file`, never to stdout.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod console;
mod device;
mod input;
mod log_pane;

use console::Console;
use device::{CursorGuard, StdoutDevice};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_tracing(args.log_file.as_deref())?;

    let source: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening input {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let input_done = CancellationToken::new();

    let input_tx = tx.clone();
    let ticker_stop = input_done.clone();
    tokio::spawn(async move {
        match input::read_events(source, input_tx).await {
            Ok(count) => info!(count, "input closed"),
            Err(err) => warn!(error = %err, "input read failed"),
        }
        input_done.cancel();
    });

    let period = Duration::from_millis(args.tick_ms.max(1));
    tokio::spawn(input::tick(tx, period, ticker_stop));

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, cancelling");
            ctrl_c.cancel();
        }
    });

    let (requests_tx, mut requests_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(request) = requests_rx.recv().await {
            info!(?request, "pane request");
        }
    });

    let _guard = CursorGuard;
    let mut console = Console::new(
        StdoutDevice::new(),
        args.theme(),
        args.progress_config(),
        args.layout(),
    )
    .with_requests(requests_tx);
    console.run(rx, cancel).await;
    info!(
        cancelled = console.progress().cancelled(),
        pending = console.progress().pending().len(),
        panes = console.panes().len(),
        "console finished"
    );

    Ok(())
}

/// Filter from `MOSAIC_LOG`, then `RUST_LOG`, default `warn`.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = std::env::var("MOSAIC_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(filter));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
