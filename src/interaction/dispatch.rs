//! Matches incoming messages against the skills' trigger patterns and runs the winner.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{Instrument, debug, error, info, instrument};

use crate::base::types::Void;

use super::{
    Services,
    message::{AddressKind, IncomingMessage},
    say, thread_ticket, uptime,
};

/// The skills the bot knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skill {
    Uptime,
    ThreadTicket,
    Say,
}

/// A message together with the skill it triggered and that pattern's capture groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedMessage {
    pub skill: Skill,
    pub message: IncomingMessage,
    /// Capture groups of the matching pattern; index 0 is the whole match.
    pub captures: Vec<Option<String>>,
}

impl MatchedMessage {
    /// A non-empty capture group, if the pattern has it and it matched.
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).and_then(|c| c.as_deref()).filter(|c| !c.is_empty())
    }
}

/// A skill's trigger: the contexts it listens in, and its patterns in priority order.
struct Trigger {
    skill: Skill,
    kinds: &'static [AddressKind],
    patterns: Vec<Regex>,
}

static TRIGGERS: OnceLock<Vec<Trigger>> = OnceLock::new();

const DIRECT: &[AddressKind] = &[AddressKind::DirectMessage, AddressKind::DirectMention];
const IN_CHANNEL: &[AddressKind] = &[AddressKind::Ambient, AddressKind::DirectMention, AddressKind::Mention];

/// Get the skill triggers, in the order they are tried.
fn get_triggers() -> &'static Vec<Trigger> {
    TRIGGERS.get_or_init(|| {
        let compile = |patterns: &[&str]| -> Vec<Regex> { patterns.iter().map(|p| Regex::new(&format!("(?i){p}")).expect("trigger patterns are valid")).collect() };

        vec![
            Trigger {
                skill: Skill::Uptime,
                kinds: DIRECT,
                patterns: compile(&["^uptime", "^debug"]),
            },
            Trigger {
                skill: Skill::ThreadTicket,
                kinds: IN_CHANNEL,
                patterns: compile(&["looking into this"]),
            },
            Trigger {
                skill: Skill::Say,
                kinds: DIRECT,
                patterns: compile(&["^say (.*)", "^say"]),
            },
        ]
    })
}

/// Finds the first skill whose trigger matches the message.
pub fn match_skill(message: IncomingMessage) -> Option<MatchedMessage> {
    for trigger in get_triggers() {
        if !trigger.kinds.contains(&message.kind) {
            continue;
        }

        for pattern in &trigger.patterns {
            if let Some(caps) = pattern.captures(&message.text) {
                let captures = caps.iter().map(|c| c.map(|m| m.as_str().to_string())).collect();

                return Some(MatchedMessage {
                    skill: trigger.skill,
                    message,
                    captures,
                });
            }
        }
    }

    None
}

/// Handles an incoming message.
///
/// If a skill matches, the trigger is counted and the skill runs on its own task.
#[instrument(skip_all, fields(channel_id = %message.channel_id, kind = ?message.kind))]
pub fn handle_incoming_message(message: IncomingMessage, services: Services) {
    let Some(matched) = match_skill(message) else {
        debug!("No skill matched.");
        return;
    };

    info!("Heard trigger for {:?} ...", matched.skill);
    services.stats.heard_trigger();

    tokio::spawn(async move {
        // Process the message.
        let result = run_skill(&matched, &services).in_current_span().await;

        // Log any errors.
        if let Err(err) = &result {
            error!("Error while handling: {}", err);
        }
    });
}

/// Runs the matched skill to completion.
#[instrument(skip_all, fields(skill = ?matched.skill))]
pub async fn run_skill(matched: &MatchedMessage, services: &Services) -> Void {
    match matched.skill {
        Skill::Uptime => uptime::handle_uptime(matched, services).await,
        Skill::ThreadTicket => thread_ticket::handle_thread_ticket(matched, services).await,
        Skill::Say => say::handle_say(matched, services).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str, kind: AddressKind) -> IncomingMessage {
        IncomingMessage {
            text: text.to_string(),
            channel_id: "C123".to_string(),
            user_id: Some("U111".to_string()),
            ts: "1700000001.000200".to_string(),
            thread_ts: None,
            kind,
        }
    }

    fn skill(text: &str, kind: AddressKind) -> Option<Skill> {
        match_skill(message(text, kind)).map(|m| m.skill)
    }

    #[test]
    fn test_uptime_and_debug_only_when_addressed() {
        assert_eq!(skill("uptime", AddressKind::DirectMessage), Some(Skill::Uptime));
        assert_eq!(skill("Debug please", AddressKind::DirectMention), Some(Skill::Uptime));
        assert_eq!(skill("uptime", AddressKind::Ambient), None);
        assert_eq!(skill("what is the uptime", AddressKind::DirectMessage), None);
    }

    #[test]
    fn test_looking_into_this_in_channels() {
        assert_eq!(skill("I'm looking into this now", AddressKind::Ambient), Some(Skill::ThreadTicket));
        assert_eq!(skill("Looking into this", AddressKind::Mention), Some(Skill::ThreadTicket));
        assert_eq!(skill("looking into this", AddressKind::DirectMention), Some(Skill::ThreadTicket));
        assert_eq!(skill("looking into this", AddressKind::DirectMessage), None);
    }

    #[test]
    fn test_say_captures_text() {
        let matched = match_skill(message("say hello there", AddressKind::DirectMessage)).unwrap();
        assert_eq!(matched.skill, Skill::Say);
        assert_eq!(matched.capture(1), Some("hello there"));

        let matched = match_skill(message("say", AddressKind::DirectMention)).unwrap();
        assert_eq!(matched.skill, Skill::Say);
        assert_eq!(matched.capture(1), None);

        let matched = match_skill(message("say ", AddressKind::DirectMention)).unwrap();
        assert_eq!(matched.capture(1), None);
    }

    #[test]
    fn test_say_ignored_in_ambient() {
        assert_eq!(skill("say hello", AddressKind::Ambient), None);
    }

    #[test]
    fn test_first_trigger_wins() {
        // `say looking into this` could match two skills; only one runs.
        assert_eq!(skill("say looking into this", AddressKind::DirectMention), Some(Skill::ThreadTicket));
        assert_eq!(skill("say looking into this", AddressKind::DirectMessage), Some(Skill::Say));
    }
}
