//! Herald - chat routing console host.
//!
//! Loads a configuration, builds the chat core and drives it from stdin so
//! channels, formats and rules can be tried without a game server.

mod console;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info};

use herald::chat::{channel_sink, ChatCore, MessageKind};
use herald::config::{env::get_config_path, load_and_validate};

use console::Console;

/// How often the online roster is logged.
const PRESENCE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Herald v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Channels: {}", config.channels.len());
    info!("  Formats: {}", config.formats.len());
    info!("  Rules: {}", config.rules.len());
    info!("  Default channel: {}", config.settings.default_channel);

    let (sink, mut outgoing_rx) = channel_sink();
    let core = Arc::new(ChatCore::new(&config, Arc::new(sink))?);
    let console = Console::new(Arc::clone(&core), config_path);

    // ============================================================
    // Spawn tasks
    // ============================================================

    // Task 1: print rendered messages
    let drain = tokio::spawn(async move {
        while let Some(msg) = outgoing_rx.recv().await {
            let tag = match msg.kind {
                MessageKind::Channel => "chat",
                MessageKind::Private => "pm",
                MessageKind::SocialSpy => "spy",
            };
            let mention = if msg.mentioned { " @" } else { "" };
            println!("[{} <- {}{}] {}", msg.recipient_name, tag, mention, msg.text);
        }
        info!("Outgoing message drain ended");
    });

    // Task 2: console input
    let input = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => println!("{}", console.execute(&line)),
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read console input: {}", e);
                    break;
                }
            }
        }
        info!("Console input closed");
    });

    // Task 3: periodic presence snapshots
    let presence = {
        let core = Arc::clone(&core);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PRESENCE_INTERVAL);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                core.users().log_presence("snapshot", None);
            }
        })
    };

    info!("Ready. Type 'help' for commands.");

    tokio::select! {
        biased;
        _ = shutdown_signal() => info!("Shutdown signal received"),
        _ = input => info!("Console closed - shutting down"),
        _ = drain => info!("Message drain stopped - shutting down"),
    }

    presence.abort();
    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
