//! A reply session: queue templated lines, then deliver them in one go.

use std::collections::BTreeMap;

use tracing::instrument;

use crate::{
    base::{stats::RuntimeStats, types::Void},
    service::chat::ChatClient,
};

use super::message::IncomingMessage;

/// A conversation scoped to one incoming message.
///
/// Lines queued with [`Conversation::say`] may reference variables as
/// `{{vars.name}}`; they are rendered and posted when the conversation is
/// activated.
pub struct Conversation {
    chat: ChatClient,
    stats: RuntimeStats,
    channel_id: String,
    thread_ts: String,
    vars: BTreeMap<String, String>,
    lines: Vec<String>,
}

impl Conversation {
    pub fn start(message: &IncomingMessage, chat: ChatClient, stats: RuntimeStats) -> Self {
        Self {
            chat,
            stats,
            channel_id: message.channel_id.clone(),
            thread_ts: message.reply_thread().to_string(),
            vars: BTreeMap::new(),
            lines: Vec::new(),
        }
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl ToString) {
        self.vars.insert(name.into(), value.to_string());
    }

    pub fn say(&mut self, template: impl Into<String>) {
        self.lines.push(template.into());
    }

    /// Renders a template against the conversation's variables.
    pub fn render(&self, template: &str) -> String {
        self.vars.iter().fold(template.to_string(), |text, (name, value)| text.replace(&format!("{{{{vars.{name}}}}}"), value))
    }

    /// Posts every queued line, in order, and counts the conversation once all of them are delivered.
    #[instrument(skip_all, fields(channel_id = %self.channel_id, lines = self.lines.len()))]
    pub async fn activate(self) -> Void {
        for line in &self.lines {
            let text = self.render(line);
            self.chat.send_message(&self.channel_id, &self.thread_ts, &text).await?;
        }

        self.stats.conversation_started();

        Ok(())
    }
}
