pub mod slack;

use std::{fmt, ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{ChatMessage, Res, UserProfile, Void};

// Types.

/// The kind of conversation a thread lives in.
///
/// Public channels and private groups are served by different reply endpoints,
/// so a thread lookup may have to try both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    Channel,
    Group,
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationKind::Channel => write!(f, "channel"),
            ConversationKind::Group => write!(f, "group"),
        }
    }
}

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with chat platforms
/// like Slack. Implementing this trait allows different chat services to be used
/// with the tracker-bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Get the bot user ID.
    ///
    /// Returns the unique identifier for the bot in the chat platform,
    /// which is used to detect when the bot is mentioned.
    fn bot_user_id(&self) -> &str;

    /// Start the chat client listener.
    ///
    /// This sets up event listeners for the chat platform and begins processing
    /// incoming messages and events.
    async fn start(&self) -> Void;

    /// Send a message to a channel, or to a thread when `thread_ts` is not empty.
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void;

    /// List the messages of a thread, root message first.
    ///
    /// Returns `Ok(None)` when the channel is not a conversation of the given kind,
    /// so the caller can retry with another kind.
    async fn get_thread_replies(&self, kind: ConversationKind, channel_id: &str, thread_ts: &str) -> Res<Option<Vec<ChatMessage>>>;

    /// Get a user's profile, including labelled custom fields.
    async fn get_user_profile(&self, user_id: &str) -> Res<UserProfile>;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
