//! `skyhook-tail`: follow a Jetstream firehose with reconnects and failover.
//!
//! # Usage
//!
//! ```bash
//! # Tail one endpoint, logging frame sizes
//! skyhook-tail --endpoint wss://jetstream1.us-east.bsky.network/subscribe
//!
//! # Fail over across endpoints from a config file, printing every frame
//! skyhook-tail --config skyhook.toml --print-frames
//!
//! # Endpoints from the environment, JSON logs
//! SKYHOOK_ENDPOINTS=wss://a/subscribe,wss://b/subscribe skyhook-tail --log-format json
//! ```
//!
//! Exits 0 after Ctrl-C, 1 when every endpoint was exhausted and 2 on bad
//! configuration.

#![forbid(unsafe_code)]

mod config;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use skyhook_health::HealthRegistry;
use skyhook_stream::{Frame, FrameCallback, JetstreamSubscription};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::TailConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Follow a Jetstream firehose with reconnects and endpoint failover.
#[derive(Parser, Debug)]
#[command(name = "skyhook-tail")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file with `[stream]` and `[health]` sections.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint to subscribe to. Repeat for failover order.
    #[arg(short, long = "endpoint", value_name = "URL")]
    endpoints: Vec<String>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Write every text frame to stdout instead of logging its size.
    #[arg(long, default_value_t = false)]
    print_frames: bool,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_format);

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = format!("{err:#}"), "skyhook-tail failed to start");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = TailConfig::load(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    config.apply_endpoints(&args.endpoints);
    config.validate()?;

    let registry = Arc::new(HealthRegistry::new(config.health.clone())?);
    let monitor = registry.spawn_monitor();

    let subscription = JetstreamSubscription::connect(
        &config.stream,
        Arc::clone(&registry),
        Some(frame_sink(args.print_frames)),
    )?;
    info!(
        endpoints = ?config.stream.endpoints,
        probe = %subscription.probe_name(),
        "skyhook-tail started"
    );

    let outcome = tokio::select! {
        result = subscription.wait_until_stopped() => result,
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!("Ctrl-C received; shutting down");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Cannot listen for Ctrl-C; running until the stream stops");
                subscription.wait_until_stopped().await
            }
        },
    };

    subscription.close().await;
    let last_health = monitor.latest();
    monitor.shutdown().await;

    let status = subscription.status();
    info!(
        state = %status.state,
        messages = status.messages_received,
        pings = status.pings_sent,
        healthy = last_health.map(|health| health.healthy),
        "Subscription closed"
    );

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            error!(error = %err, "Subscription failed");
            Ok(ExitCode::from(1))
        }
    }
}

fn frame_sink(print_frames: bool) -> FrameCallback {
    Box::new(move |frame: &Frame| {
        if !print_frames {
            debug!(bytes = frame.len(), text = frame.is_text(), "Frame received");
            return;
        }
        let mut stdout = std::io::stdout().lock();
        let written = match frame.as_text() {
            Some(text) => writeln!(stdout, "{text}"),
            None => writeln!(stdout, "<{} binary bytes>", frame.len()),
        };
        if let Err(err) = written {
            warn!(error = %err, "Failed to write frame to stdout");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn endpoint_flag_repeats() {
        let args = Args::try_parse_from([
            "skyhook-tail",
            "--endpoint",
            "wss://a.example/subscribe",
            "-e",
            "wss://b.example/subscribe",
            "--log-format",
            "json",
            "--print-frames",
        ])
        .unwrap();
        assert_eq!(
            args.endpoints,
            vec!["wss://a.example/subscribe", "wss://b.example/subscribe"]
        );
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(args.print_frames);
        assert!(args.config.is_none());
    }

    #[test]
    fn defaults_to_text_logs() {
        let args = Args::try_parse_from(["skyhook-tail"]).unwrap();
        assert_eq!(args.log_format, LogFormat::Text);
        assert!(!args.print_frames);
        assert!(args.endpoints.is_empty());
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Args::try_parse_from(["skyhook-tail", "--log-format", "xml"]).is_err());
    }
}
