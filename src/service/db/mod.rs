use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Res, ThreadTicket};

pub mod surreal;

// Traits.

/// Generic database client trait that clients must implement.
///
/// This trait defines how the bot remembers which story was opened for which
/// thread. Implementing this trait allows different database backends to be
/// used with the tracker-bot.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Gets the ticket recorded for a thread, if any.
    async fn get_thread_ticket(&self, thread_ts: &str) -> Res<Option<ThreadTicket>>;

    /// Records a ticket for its thread unless one already exists.
    ///
    /// Returns `None` when the ticket was stored, or the ticket that was already
    /// recorded for the thread, in which case nothing is written.
    async fn insert_thread_ticket(&self, ticket: &ThreadTicket) -> Res<Option<ThreadTicket>>;
}

// Structs.

/// Database client for tracker-bot.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    /// The database client instance.
    pub inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }
}
