//! Platform-neutral view of an incoming chat message.

/// How a message addresses the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// A one-to-one conversation with the bot.
    DirectMessage,
    /// A channel message that starts with a mention of the bot.
    DirectMention,
    /// A channel message that mentions the bot somewhere after the start.
    Mention,
    /// A channel message that does not mention the bot.
    Ambient,
}

/// An incoming chat message, ready to be matched against skills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Message text; for direct mentions, the leading mention is removed.
    pub text: String,
    pub channel_id: String,
    pub user_id: Option<String>,
    pub ts: String,
    pub thread_ts: Option<String>,
    pub kind: AddressKind,
}

impl IncomingMessage {
    /// Builds a message, working out how it addresses the bot.
    ///
    /// Direct message channels are recognized by their `D` prefix.
    pub fn classify(text: &str, channel_id: String, user_id: Option<String>, ts: String, thread_ts: Option<String>, bot_user_id: &str) -> Self {
        let mention = format!("<@{bot_user_id}>");
        let trimmed = text.trim_start();

        let (kind, text) = if channel_id.starts_with('D') {
            (AddressKind::DirectMessage, strip_mention(trimmed, &mention).unwrap_or(trimmed))
        } else if let Some(rest) = strip_mention(trimmed, &mention) {
            (AddressKind::DirectMention, rest)
        } else if text.contains(&mention) {
            (AddressKind::Mention, text)
        } else {
            (AddressKind::Ambient, text)
        };

        Self {
            text: text.to_string(),
            channel_id,
            user_id,
            ts,
            thread_ts,
            kind,
        }
    }

    /// The thread this message belongs to, if any.
    pub fn thread(&self) -> Option<&str> {
        self.thread_ts.as_deref().filter(|ts| !ts.is_empty())
    }

    /// Where replies to this message go: its thread, or the channel top level.
    pub fn reply_thread(&self) -> &str {
        self.thread().unwrap_or("")
    }
}

/// Strips a leading mention and the separator people usually type after it.
fn strip_mention<'a>(text: &'a str, mention: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(mention)?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(':').unwrap_or(rest);

    Some(rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str, channel_id: &str) -> IncomingMessage {
        IncomingMessage::classify(text, channel_id.to_string(), Some("U111".to_string()), "1.1".to_string(), None, "UBOT")
    }

    #[test]
    fn test_direct_message() {
        let message = classify("uptime", "D123");
        assert_eq!(message.kind, AddressKind::DirectMessage);
        assert_eq!(message.text, "uptime");
    }

    #[test]
    fn test_direct_mention_strips_mention() {
        let message = classify("<@UBOT>: say hello", "C123");
        assert_eq!(message.kind, AddressKind::DirectMention);
        assert_eq!(message.text, "say hello");

        let message = classify("  <@UBOT> uptime", "C123");
        assert_eq!(message.kind, AddressKind::DirectMention);
        assert_eq!(message.text, "uptime");
    }

    #[test]
    fn test_mention_keeps_text() {
        let message = classify("hey <@UBOT> looking into this", "C123");
        assert_eq!(message.kind, AddressKind::Mention);
        assert_eq!(message.text, "hey <@UBOT> looking into this");
    }

    #[test]
    fn test_ambient() {
        let message = classify("I'm looking into this", "C123");
        assert_eq!(message.kind, AddressKind::Ambient);

        // Mentions of other users do not count.
        let message = classify("<@UOTHER> looking into this", "C123");
        assert_eq!(message.kind, AddressKind::Ambient);
    }

    #[test]
    fn test_reply_thread() {
        let mut message = classify("hi", "C123");
        assert_eq!(message.reply_thread(), "");
        assert_eq!(message.thread(), None);

        message.thread_ts = Some("1700000000.000100".to_string());
        assert_eq!(message.reply_thread(), "1700000000.000100");

        message.thread_ts = Some(String::new());
        assert_eq!(message.thread(), None);
    }
}
