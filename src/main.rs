//! Gangway - self-healing WebSocket bridge daemon
//!
//! Connects the bridge to a chat endpoint and relays stdin lines as chat
//! envelopes until EOF or ctrl-c.

use clap::Parser;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gangway::{ActualState, Args, Bridge, BridgeEnvelope, DesiredState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gangway={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Gangway - WebSocket chat bridge");
    info!("======================================");
    info!("Endpoint: ws://{}:{}", args.host, args.port);
    info!("Cycle interval: {}ms", args.cycle_interval_ms);
    info!("Chat user: {}", args.chat_user);
    info!("======================================");

    let bridge = Bridge::new(args.bridge_config());

    bridge.on_message(|raw| {
        if let Some(BridgeEnvelope::Chat {
            chat_user,
            chat_message,
        }) = BridgeEnvelope::parse(raw)
        {
            info!(
                "<{}> {}",
                chat_user.as_deref().unwrap_or("unknown"),
                chat_message.as_deref().unwrap_or("")
            );
        }
    });
    bridge.on_error(|err| warn!("Bridge error: {}", err));
    bridge.on_state(|old, current| info!("Bridge state: {} -> {}", old, current));

    bridge.set_desired_state(DesiredState::Open);

    // Relay stdin lines as chat envelopes
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let envelope = BridgeEnvelope::chat(&args.chat_user, line);
                    match envelope.to_json() {
                        Ok(json) => bridge.send(json),
                        Err(e) => warn!("Could not encode chat envelope: {}", e),
                    }
                }
                Ok(None) => {
                    info!("stdin closed, shutting down");
                    break;
                }
                Err(e) => {
                    warn!("stdin error: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    bridge.set_desired_state(DesiredState::Closed);
    // Wait for the reconciler to tear the connection down before exiting
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while bridge.actual_state().await != ActualState::Closed {
        if tokio::time::Instant::now() >= deadline {
            warn!("Timed out waiting for the connection to close");
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    Ok(())
}
