//! The "looking into this" skill.
//!
//! When someone says they are looking into a thread, the bot opens a started
//! story for the thread's original message, owned by that message's author when
//! their tracker username is known, and remembers it so the thread only ever
//! gets one story.

use tracing::{debug, info, instrument, warn};

use crate::{
    base::types::{ChatMessage, Res, StoryRequest, ThreadTicket, Void},
    service::chat::ConversationKind,
};

use super::{Services, conversation::Conversation, dispatch::MatchedMessage, message::IncomingMessage};

pub const STORY_FAILED: &str = "I couldn't create a story for this thread, sorry. Please try again in a bit.";

/// Builds the permalink of a thread from its channel and root timestamp.
pub fn thread_permalink(workspace_url: &str, channel_id: &str, thread_ts: &str) -> String {
    format!("{}/archives/{}/p{}", workspace_url.trim_end_matches('/'), channel_id, thread_ts.replace('.', ""))
}

/// Lists a thread's messages, trying channels first and private groups second.
#[instrument(skip(services))]
pub async fn fetch_thread(services: &Services, channel_id: &str, thread_ts: &str) -> Res<Vec<ChatMessage>> {
    for kind in [ConversationKind::Channel, ConversationKind::Group] {
        let replies = services.outbound("list the thread replies", services.chat.get_thread_replies(kind, channel_id, thread_ts)).await?;

        match replies {
            Some(replies) => return Ok(replies),
            None => debug!("Thread not found as a {} conversation.", kind),
        }
    }

    Err(anyhow::anyhow!("Thread `{}` was not found in channel `{}`.", thread_ts, channel_id))
}

/// Reads the tracker username off the original author's profile.
async fn tracker_username(services: &Services, original: &ChatMessage) -> Option<String> {
    let Some(user_id) = original.user.as_deref() else {
        warn!("Original message has no author.");
        return None;
    };

    let profile = match services.outbound("get the author's profile", services.chat.get_user_profile(user_id)).await {
        Ok(profile) => profile,
        Err(err) => {
            warn!("Could not get profile for `{}`: {}", user_id, err);
            return None;
        }
    };

    let label = &services.config.pivotal_username_field_label;
    let username = profile.field_value(label).map(str::to_string);

    if username.is_none() {
        info!("{} has no `{}` profile field.", profile.name(), label);
    }

    username
}

/// Resolves the story owner; any failure just means the story has no owner.
async fn resolve_owner(services: &Services, username: Option<&str>) -> Option<u64> {
    let username = username?;

    match services.outbound("resolve the tracker user", services.tracker.find_user_id(username)).await {
        Ok(Some(id)) => Some(id),
        Ok(None) => {
            info!("No tracker member is named `{}`.", username);
            None
        }
        Err(err) => {
            warn!("Could not resolve tracker member `{}`: {}", username, err);
            None
        }
    }
}

/// Creates the story for a thread and records it, queueing the reply on `convo`.
async fn open_story(services: &Services, message: &IncomingMessage, thread_ts: &str, original: &ChatMessage, username: Option<&str>, convo: &mut Conversation) -> Void {
    let permalink = thread_permalink(&services.config.slack_workspace_url, &message.channel_id, thread_ts);
    let text = format!("{}\n{}", original.text.as_deref().unwrap_or_default(), permalink);

    let owner = resolve_owner(services, username).await;
    let request = StoryRequest {
        text,
        owner_ids: owner.map(|id| vec![id]),
    };

    let story = match services.outbound("create the story", services.tracker.create_story(&request)).await {
        Ok(story) => story,
        Err(err) => {
            convo.say(STORY_FAILED);
            return Err(err.context(format!("Failed to create a story for thread `{thread_ts}`")));
        }
    };

    let created = format!("Created and started a story at {}", services.tracker.story_url(story.id));
    let ticket = ThreadTicket::new(thread_ts, &message.channel_id, story.id);

    match services.outbound("record the thread's story", services.db.insert_thread_ticket(&ticket)).await {
        Ok(None) => convo.say(created),
        Ok(Some(winner)) => {
            warn!("Story `{}` is orphaned: thread `{}` already has story `{}`.", story.id, thread_ts, winner.story_id);
            convo.say(format!("Story exists at {}", services.tracker.story_url(winner.story_id)));
        }
        Err(err) => {
            convo.say(created);
            return Err(err.context(format!("Created story `{}` but could not record it for thread `{thread_ts}`", story.id)));
        }
    }

    Ok(())
}

#[instrument(skip_all, fields(channel_id = %matched.message.channel_id, thread_ts = ?matched.message.thread_ts))]
pub async fn handle_thread_ticket(matched: &MatchedMessage, services: &Services) -> Void {
    let message = &matched.message;

    // Only threads get stories.
    let Some(thread_ts) = message.thread() else {
        debug!("Ignoring trigger outside of a thread.");
        return Ok(());
    };

    // Find the message that started the thread.

    let replies = fetch_thread(services, &message.channel_id, thread_ts).await?;
    let original = replies.into_iter().next().ok_or(anyhow::anyhow!("Thread `{}` has no messages.", thread_ts))?;

    let mut convo = Conversation::start(message, services.chat.clone(), services.stats.clone());

    let username = tracker_username(services, &original).await;

    // Reuse the thread's story if it already has one.

    let existing = services.outbound("look up the thread's story", services.db.get_thread_ticket(thread_ts)).await?;

    let result = match existing {
        Some(ticket) => {
            info!("Thread already has story `{}`.", ticket.story_id);
            convo.say(format!("Story exists at {}", services.tracker.story_url(ticket.story_id)));
            Ok(())
        }
        None => open_story(services, message, thread_ts, &original, username.as_deref(), &mut convo).await,
    };

    services.outbound("send the reply", convo.activate()).await?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_permalink() {
        assert_eq!(
            thread_permalink("https://countable.slack.com", "C0123ABC", "1700000000.000100"),
            "https://countable.slack.com/archives/C0123ABC/p1700000000000100"
        );
        assert_eq!(thread_permalink("https://example.slack.com/", "C1", "1.2"), "https://example.slack.com/archives/C1/p12");
    }
}
