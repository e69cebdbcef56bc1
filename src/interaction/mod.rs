//! Event handling and user interactions for tracker-bot.
//!
//! This module provides functionality for handling chat messages:
//! - Classifying incoming messages by how the bot was addressed
//! - Matching messages against the skills' trigger patterns
//! - Running the matched skill against the chat, tracker, and database services

pub mod conversation;
pub mod dispatch;
pub mod message;
pub mod say;
pub mod thread_ticket;
pub mod uptime;

use std::future::Future;

use crate::{
    base::{config::Config, filter::WordFilter, stats::RuntimeStats, types::Res},
    service::{chat::ChatClient, db::DbClient, tracker::TrackerClient},
};

/// Everything a skill needs to handle a message.
///
/// It is designed to be trivially cloneable, so it can be moved into a spawned task.
#[derive(Clone)]
pub struct Services {
    pub config: Config,
    pub chat: ChatClient,
    pub db: DbClient,
    pub tracker: TrackerClient,
    pub stats: RuntimeStats,
    pub filter: WordFilter,
}

impl Services {
    /// Awaits an outbound call, failing if it does not finish within the configured deadline.
    pub async fn outbound<T, F>(&self, what: &str, call: F) -> Res<T>
    where
        F: Future<Output = Res<T>>,
    {
        let deadline = self.config.outbound_timeout();

        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("Timed out after {:?} while trying to {}.", deadline, what)),
        }
    }
}
