//! # Gamepad Link
//!
//! Streams controller buttons and joystick axes over a serial radio link, or
//! receives that stream on the host.
//!
//! # Usage
//!
//! ```bash
//! gamepad-link [config.toml]           # device side: sample and transmit
//! gamepad-link receive [config.toml]   # host side: decode and map frames
//! ```
//!
//! Without a config file the built-in defaults are used (classic profile,
//! `/dev/rfcomm0` at 9600 baud).
//!
//! Board bring-up is not part of this binary; the device side runs against
//! the simulated board, which reports centered sticks and no presses.

use anyhow::{Context, Result};
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use gamepad_link::config::{Config, LoggingConfig};
use gamepad_link::input::sim::SimBoard;
use gamepad_link::link::decoder::FrameDecoder;
use gamepad_link::link::receiver::{run_receiver, ControlMap};
use gamepad_link::link::serial::TokioSerialPort;
use gamepad_link::pipeline::{self, AnalogHardware};

/// Seconds between status log messages on the device side
const STATUS_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Device,
    Receive,
}

/// Split command-line arguments into a mode and an optional config path.
fn parse_args(args: &[String]) -> (Mode, Option<&str>) {
    match args {
        [mode, rest @ ..] if mode == "receive" => {
            (Mode::Receive, rest.first().map(String::as_str))
        }
        [path, ..] => (Mode::Device, Some(path.as_str())),
        [] => (Mode::Device, None),
    }
}

/// Install the console subscriber, plus a daily rolling file when
/// `log_dir` is set. The returned guard must live until exit.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.log_dir.is_empty() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&logging.log_dir, "gamepad-link.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (mode, config_path) = parse_args(&args);

    let config = match config_path {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path))?,
        None => Config::default(),
    };

    let _guard = init_logging(&config.logging);
    info!("Gamepad Link v{} starting...", env!("CARGO_PKG_VERSION"));

    match mode {
        Mode::Device => run_device(config).await,
        Mode::Receive => run_host(config).await,
    }
}

/// Sample inputs and transmit frames until Ctrl+C.
async fn run_device(config: Config) -> Result<()> {
    let port = TokioSerialPort::open(&config.serial)?;
    info!("Serial link opened at: {}", port.device_path());

    let profile = config.profile();
    let mut board = SimBoard::new(profile.mux.channel);
    let analog = AnalogHardware {
        primary_x: board.analog(),
        primary_y: board.analog(),
        secondary: board.analog(),
        selector: board.selector(),
    };

    let handle = match pipeline::spawn(&config, &mut board, analog, port) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start pipeline: {}", e);
            return Err(e.into());
        }
    };

    info!("Press Ctrl+C to exit");
    let mut status = interval(Duration::from_secs(STATUS_INTERVAL_SECS));
    status.tick().await;

    loop {
        tokio::select! {
            _ = status.tick() => {
                let stats = handle.stats();
                info!(
                    "Status: {} frames sent, {} write errors, {} button drops, {} interrupt drops",
                    stats.frames_sent.load(Ordering::Relaxed),
                    stats.write_errors.load(Ordering::Relaxed),
                    stats.digital_dropped.load(Ordering::Relaxed),
                    handle.interrupt_drops()
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

/// Decode the incoming link and log control updates until Ctrl+C or EOF.
async fn run_host(config: Config) -> Result<()> {
    let port = TokioSerialPort::open(&config.serial)?;
    info!("Listening on: {}", port.device_path());

    let profile = config.profile();
    let shutdown = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(config.queues.capacity);

    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            info!("{:?}", update);
        }
    });

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
        }
        ctrl_c.cancel();
    });

    let forwarded = run_receiver(
        port.into_inner(),
        FrameDecoder::new(profile),
        ControlMap::for_profile(&profile),
        tx,
        shutdown,
    )
    .await?;

    printer.await?;
    info!("Total updates received: {}", forwarded);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_runs_device_with_defaults() {
        let list = args(&[]);
        assert_eq!(parse_args(&list), (Mode::Device, None));
    }

    #[test]
    fn test_config_path() {
        let list = args(&["pad.toml"]);
        assert_eq!(parse_args(&list), (Mode::Device, Some("pad.toml")));
    }

    #[test]
    fn test_receive_mode() {
        let list = args(&["receive"]);
        assert_eq!(parse_args(&list), (Mode::Receive, None));

        let list = args(&["receive", "host.toml"]);
        assert_eq!(parse_args(&list), (Mode::Receive, Some("host.toml")));
    }
}
