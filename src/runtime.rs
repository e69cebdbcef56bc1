//! Runtime services and shared state for the tracker-bot.

use tracing::instrument;

use crate::{
    base::{
        config::Config,
        stats::RuntimeStats,
        types::{Res, Void},
    },
    service::{chat::ChatClient, db::DbClient, tracker::TrackerClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the database, tracker, and chat clients, the runtime
/// statistics, and configuration. It is designed to be trivially cloneable,
/// allowing it to be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The database client instance.
    pub db: DbClient,
    /// The project tracker client instance.
    pub tracker: TrackerClient,
    /// The chat client instance.
    pub chat: ChatClient,
    /// Counters reported by the `uptime` skill.
    pub stats: RuntimeStats,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Start counting uptime.
        let stats = RuntimeStats::new();

        // Initialize the database.
        let db = DbClient::surreal(&config).await?;

        // Initialize the tracker client.
        let tracker = TrackerClient::pivotal(&config)?;

        // Initialize the slack client.
        let chat = ChatClient::slack(&config, db.clone(), tracker.clone(), stats.clone()).await?;

        Ok(Self { config, db, tracker, chat, stats })
    }

    pub async fn start(&self) -> Void {
        self.chat.start().await
    }
}
