//! The `uptime` / `debug` skill.

use tracing::instrument;

use crate::base::{stats::format_uptime, types::Void};

use super::{Services, conversation::Conversation, dispatch::MatchedMessage};

pub const UPTIME_TEMPLATE: &str = "My main process has been online for {{vars.uptime}}. Since booting, I have heard {{vars.triggers}} triggers, and conducted {{vars.convos}} conversations.";

#[instrument(skip_all)]
pub async fn handle_uptime(matched: &MatchedMessage, services: &Services) -> Void {
    let snapshot = services.stats.snapshot();

    let mut convo = Conversation::start(&matched.message, services.chat.clone(), services.stats.clone());

    convo.set_var("uptime", format_uptime(snapshot.uptime.as_secs_f64()));
    convo.set_var("convos", snapshot.convos);
    convo.set_var("triggers", snapshot.triggers);

    convo.say(UPTIME_TEMPLATE);

    services.outbound("send the uptime report", convo.activate()).await
}
