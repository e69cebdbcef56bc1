pub mod pivotal;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Res, Story, StoryRequest};

// Traits.

/// Generic project tracker trait that clients must implement.
///
/// This trait defines the two calls the bot makes against a tracker: resolving a
/// person by username, and opening a story. Implementing this trait allows
/// different trackers to be used with the tracker-bot.
#[async_trait]
pub trait GenericTrackerClient: Send + Sync + 'static {
    /// Find the tracker user ID of the project member with this exact username.
    ///
    /// Returns `Ok(None)` when no member matches.
    async fn find_user_id(&self, username: &str) -> Res<Option<u64>>;

    /// Create a started story from the given request.
    async fn create_story(&self, request: &StoryRequest) -> Res<Story>;

    /// The web URL where a story can be viewed.
    fn story_url(&self, story_id: u64) -> String;
}

// Structs.

/// Tracker client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct TrackerClient {
    inner: Arc<dyn GenericTrackerClient>,
}

impl Deref for TrackerClient {
    type Target = dyn GenericTrackerClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl TrackerClient {
    pub fn new(inner: Arc<dyn GenericTrackerClient>) -> Self {
        Self { inner }
    }
}
