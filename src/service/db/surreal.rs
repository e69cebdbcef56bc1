//! SurrealDB implementation for tracker-bot data storage.

use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{info, instrument, warn};

use crate::base::{
    config::Config,
    types::{Res, ThreadTicket},
};

use super::{DbClient, GenericDbClient};

// Constants.

const THREAD_TABLE: &str = "thread";

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Connects to the database named by `db_endpoint` (`mem://`, `ws://host:port`, ...).
    pub async fn surreal(config: &Config) -> Res<Self> {
        let client = SurrealDbClient::new(&config.db_endpoint, &config.db_username, &config.db_password).await?;
        Ok(Self { inner: Arc::new(client) })
    }

    /// Creates a throwaway in-memory database.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::new("mem://", "", "").await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// SurrealDB client implementation.
#[derive(Clone)]
pub struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    /// Create a new database client.
    #[instrument(name = "SurrealDbClient::new", skip(username, password))]
    pub async fn new(endpoint: &str, username: &str, password: &str) -> Res<Self> {
        let db = any::connect(endpoint).await?;

        // Authenticate when credentials are configured; the embedded engine does not need them.
        if !username.is_empty() {
            db.signin(Root { username, password }).await?;
        }

        // Use a specific namespace and database
        db.use_ns("tracker").use_db("bot").await?;

        // Define schemas.

        // One record per thread, keyed by the thread timestamp.
        db.query(format!("DEFINE TABLE IF NOT EXISTS {THREAD_TABLE} SCHEMALESS;")).await?.check()?;

        info!("Database initialized successfully.");

        Ok(Self { db })
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self))]
    async fn get_thread_ticket(&self, thread_ts: &str) -> Res<Option<ThreadTicket>> {
        let ticket: Option<ThreadTicket> = self.db.select((THREAD_TABLE, thread_ts)).await?;

        Ok(ticket)
    }

    #[instrument(skip(self), fields(thread_ts = %ticket.thread_ts, story_id = ticket.story_id))]
    async fn insert_thread_ticket(&self, ticket: &ThreadTicket) -> Res<Option<ThreadTicket>> {
        // `CREATE` on a fixed record id fails if the record exists, which makes this an atomic insert-if-absent.
        let created: Result<Option<ThreadTicket>, _> = self.db.create((THREAD_TABLE, ticket.thread_ts.as_str())).content(ticket.clone()).await;

        match created {
            Ok(_) => Ok(None),
            Err(err) => match self.get_thread_ticket(&ticket.thread_ts).await? {
                Some(existing) => {
                    warn!("Thread `{}` already has story `{}`.", existing.thread_ts, existing.story_id);
                    Ok(Some(existing))
                }
                None => Err(err.into()),
            },
        }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_thread_is_none() {
        let db = DbClient::surreal_memory().await.unwrap();

        assert!(db.get_thread_ticket("1700000000.000100").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let db = DbClient::surreal_memory().await.unwrap();
        let ticket = ThreadTicket::new("1700000000.000100", "C123", 42);

        assert!(db.insert_thread_ticket(&ticket).await.unwrap().is_none());

        let stored = db.get_thread_ticket("1700000000.000100").await.unwrap().unwrap();
        assert_eq!(stored.story_id, 42);
        assert_eq!(stored.channel_id, "C123");
    }

    #[tokio::test]
    async fn test_second_insert_keeps_first_ticket() {
        let db = DbClient::surreal_memory().await.unwrap();

        let first = ThreadTicket::new("1700000000.000100", "C123", 42);
        let second = ThreadTicket::new("1700000000.000100", "C123", 43);

        assert!(db.insert_thread_ticket(&first).await.unwrap().is_none());

        let existing = db.insert_thread_ticket(&second).await.unwrap().unwrap();
        assert_eq!(existing.story_id, 42);

        let stored = db.get_thread_ticket("1700000000.000100").await.unwrap().unwrap();
        assert_eq!(stored.story_id, 42);
    }

    #[tokio::test]
    async fn test_threads_are_independent() {
        let db = DbClient::surreal_memory().await.unwrap();

        db.insert_thread_ticket(&ThreadTicket::new("1.1", "C1", 1)).await.unwrap();
        db.insert_thread_ticket(&ThreadTicket::new("2.2", "C1", 2)).await.unwrap();

        assert_eq!(db.get_thread_ticket("1.1").await.unwrap().unwrap().story_id, 1);
        assert_eq!(db.get_thread_ticket("2.2").await.unwrap().unwrap().story_id, 2);
    }
}
