//! The `say` skill: repeat whatever the user asks, unless it is blacklisted.

use tracing::{instrument, warn};

use crate::base::types::Void;

use super::{Services, dispatch::MatchedMessage};

pub const SAY_USAGE: &str = "I will repeat whatever you say.";
pub const SAY_REFUSAL: &str = "_sigh_";

/// Picks the reply for a `say` request.
pub fn say_reply<'a>(captured: Option<&'a str>, services: &Services) -> &'a str {
    match captured {
        Some(text) if services.filter.blacklisted(text) => {
            warn!("Refusing to repeat blacklisted text.");
            SAY_REFUSAL
        }
        Some(text) => text,
        None => SAY_USAGE,
    }
}

/// Replies directly to the message; this skill does not open a conversation.
#[instrument(skip_all)]
pub async fn handle_say(matched: &MatchedMessage, services: &Services) -> Void {
    let message = &matched.message;
    let reply = say_reply(matched.capture(1), services);

    services
        .outbound("send a reply", services.chat.send_message(&message.channel_id, message.reply_thread(), reply))
        .await
}
