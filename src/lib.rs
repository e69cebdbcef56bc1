//! Library root for `tracker-bot`.
//!
//! Tracker-bot is a small Slack bot made of message-triggered skills:
//! - `looking into this` in a thread opens a started Pivotal Tracker story for
//!   the thread, once per thread
//! - `uptime` / `debug` reports how long the bot has been up and how busy it has been
//! - `say <text>` repeats text back, unless it is blacklisted
//!
//! The bot integrates with Slack for chat, SurrealDB for storage, and Pivotal
//! Tracker for stories. Each service sits behind a trait so that it can be
//! swapped or mocked.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the tracker-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with database, tracker, and chat clients
/// - Starts the main event loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting tracker-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().map_err(|_| anyhow::anyhow!("A crypto provider is already installed."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
