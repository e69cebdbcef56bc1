use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, serde_as, skip_serializing_none};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// A single message returned from a thread reply listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub ts: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A custom profile field, as returned with `include_labels`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileField {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// A chat user's profile.
///
/// Slack sends `fields` as `null` or `[]` when the user has no custom fields set,
/// so anything that is not a map deserializes to an empty map.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub fields: HashMap<String, ProfileField>,
}

impl UserProfile {
    /// Returns the value of the custom field with the given label, if set.
    pub fn field_value(&self, label: &str) -> Option<&str> {
        self.fields
            .values()
            .find(|field| field.label.as_deref() == Some(label))
            .map(|field| field.value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// Best-effort human name for logs.
    pub fn name(&self) -> &str {
        self.real_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.display_name.as_deref())
            .unwrap_or("unknown")
    }
}

/// The request used to create a story in the tracker.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryRequest {
    pub text: String,
    pub owner_ids: Option<Vec<u64>>,
}

/// A story as returned by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub current_state: Option<String>,
}

/// The association between a chat thread and the story opened for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadTicket {
    pub thread_ts: String,
    pub channel_id: String,
    pub story_id: u64,
    pub created_at: DateTime<Utc>,
}

impl ThreadTicket {
    pub fn new(thread_ts: impl Into<String>, channel_id: impl Into<String>, story_id: u64) -> Self {
        Self {
            thread_ts: thread_ts.into(),
            channel_id: channel_id.into(),
            story_id,
            created_at: Utc::now(),
        }
    }
}
