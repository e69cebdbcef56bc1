//! Slack implementation of the chat service.
//!
//! Events arrive over Socket Mode and are handed to the skill dispatcher.
//! Posting messages and listing channel threads go through `slack-morphism`;
//! the labelled profile lookup and the private-group reply listing go through
//! the Web API directly.

use crate::{
    base::{
        config::Config,
        filter::WordFilter,
        stats::RuntimeStats,
        types::{ChatMessage, Res, UserProfile, Void},
    },
    interaction::{self, Services, message::IncomingMessage},
    service::{db::DbClient, tracker::TrackerClient},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use serde::Deserialize;
use slack_morphism::{errors::SlackClientError, prelude::*};
use tracing::{debug, info, instrument, warn};

use std::{ops::Deref, sync::Arc};

use super::{ChatClient, ConversationKind, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Constants.

/// Slack error codes meaning "this channel is not a conversation of the kind you asked for".
const CONVERSATION_NOT_FOUND_CODES: &[&str] = &["channel_not_found", "method_not_supported_for_channel_type"];

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config, db: DbClient, tracker: TrackerClient, stats: RuntimeStats) -> Res<Self> {
        let client = SlackChatClient::new(config, db, tracker, stats).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    services: Services,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    pub app_token: SlackApiToken,
    pub bot_token: SlackApiToken,
    pub bot_user_id: String,
    pub client: Arc<FullClient>,
    pub web: SlackWebApi,
    pub config: Config,
    pub db: DbClient,
    pub tracker: TrackerClient,
    pub stats: RuntimeStats,
    pub filter: WordFilter,
}

impl Deref for SlackChatClient {
    type Target = FullClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, db: DbClient, tracker: TrackerClient, stats: RuntimeStats) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Initialize the raw Web API client.

        let web = SlackWebApi::new(&config.slack_api_url, &config.slack_bot_token)?;

        // Build the `say` blacklist.

        let filter = WordFilter::new(&config.say_blacklist)?;

        // Get the bot's user ID.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;
        let bot_user_id = bot_user.user_id.0;

        info!("Slack bot user ID: {}", bot_user_id);

        Ok(Self {
            app_token,
            bot_token,
            bot_user_id,
            client,
            web,
            config: config.clone(),
            db,
            tracker,
            stats,
            filter,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new()
            .with_command_events(handle_command_event)
            .with_interaction_events(handle_interaction_event)
            .with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let services = Services {
            config: self.config.clone(),
            chat: ChatClient::from(self.clone()),
            db: self.db.clone(),
            tracker: self.tracker.clone(),
            stats: self.stats.clone(),
            filter: self.filter.clone(),
        };

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState { services }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let mut request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), message).with_as_user(true).with_link_names(true);

        if !thread_ts.is_empty() {
            request = request.with_thread_ts(SlackTs(thread_ts.to_string()));
        }

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_thread_replies(&self, kind: ConversationKind, channel_id: &str, thread_ts: &str) -> Res<Option<Vec<ChatMessage>>> {
        match kind {
            ConversationKind::Channel => {
                let request = SlackApiConversationsRepliesRequest::new(SlackChannelId(channel_id.to_string()), SlackTs(thread_ts.to_string()));
                let session = self.client.open_session(&self.bot_token);

                let response = match session.conversations_replies(&request).await {
                    Ok(response) => response,
                    Err(SlackClientError::ApiError(ae)) if CONVERSATION_NOT_FOUND_CODES.contains(&ae.code.as_str()) => {
                        debug!("Channel `{}` is not a {} conversation: {}", channel_id, kind, ae.code);
                        return Ok(None);
                    }
                    Err(e) => return Err(anyhow::anyhow!("Failed to list thread replies: {}", e)),
                };

                // Re-read the history messages through their wire format to get the fields we need.
                let messages = serde_json::from_value(serde_json::to_value(&response.messages)?)?;

                Ok(Some(messages))
            }
            ConversationKind::Group => self.web.groups_replies(channel_id, thread_ts).await,
        }
    }

    #[instrument(skip(self))]
    async fn get_user_profile(&self, user_id: &str) -> Res<UserProfile> {
        self.web.users_profile_get(user_id).await
    }
}

// Raw Web API access.

/// The subset of a Slack Web API response envelope that we read.
#[derive(Debug, Deserialize)]
struct SlackWebResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    profile: Option<UserProfile>,
}

/// Minimal Slack Web API client for the methods `slack-morphism` does not model the way we need.
#[derive(Clone, Debug)]
pub struct SlackWebApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackWebApi {
    pub fn new(base_url: &str, token: &str) -> Res<Self> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn call(&self, method: &str, query: &[(&str, &str)]) -> Res<SlackWebResponse> {
        let url = format!("{}/{}", self.base_url, method);

        let response = self.http.get(&url).bearer_auth(&self.token).query(query).send().await?.error_for_status()?;

        Ok(response.json::<SlackWebResponse>().await?)
    }

    /// `users.profile.get` with labels, so custom fields can be found by name.
    #[instrument(skip(self))]
    pub async fn users_profile_get(&self, user_id: &str) -> Res<UserProfile> {
        let response = self.call("users.profile.get", &[("user", user_id), ("include_labels", "true")]).await?;

        if !response.ok {
            return Err(anyhow::anyhow!("Failed to get user profile: {}", response.error.unwrap_or_default()));
        }

        response.profile.ok_or(anyhow::anyhow!("Slack returned no profile for user `{}`.", user_id))
    }

    /// `groups.replies`, the private-group flavour of a thread listing.
    ///
    /// Slack has retired this method for most apps; it is only answered by legacy workspaces.
    #[instrument(skip(self))]
    pub async fn groups_replies(&self, channel_id: &str, thread_ts: &str) -> Res<Option<Vec<ChatMessage>>> {
        let response = self.call("groups.replies", &[("channel", channel_id), ("thread_ts", thread_ts)]).await?;

        if !response.ok {
            let code = response.error.unwrap_or_default();

            if CONVERSATION_NOT_FOUND_CODES.contains(&code.as_str()) {
                debug!("Channel `{}` is not a group conversation: {}", channel_id, code);
                return Ok(None);
            }

            return Err(anyhow::anyhow!("Failed to list group thread replies: {}", code));
        }

        Ok(Some(response.messages.unwrap_or_default()))
    }
}

// Event conversion.

/// Converts a Slack message event into an [`IncomingMessage`].
///
/// Returns `None` for events the skills never act on: messages without text or
/// channel, and anything posted by a bot (including this one).
fn incoming_message_from_event(event: &SlackMessageEvent, bot_user_id: &str) -> Option<IncomingMessage> {
    if event.sender.bot_id.is_some() {
        return None;
    }

    let user_id = event.sender.user.as_ref().map(|u| u.0.clone());
    if user_id.as_deref() == Some(bot_user_id) {
        return None;
    }

    let channel_id = event.origin.channel.as_ref()?.0.clone();
    let text = event.content.as_ref().and_then(|c| c.text.clone())?;
    let thread_ts = event.origin.thread_ts.as_ref().map(|ts| ts.0.clone());

    Some(IncomingMessage::classify(&text, channel_id, user_id, event.origin.ts.0.clone(), thread_ts, bot_user_id))
}

// Socket mode listener callbacks for Slack.

/// Handles command events from Slack.
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    warn!("[COMMAND] {:#?}", event);
    Ok(SlackCommandEventResponse::new(SlackMessageContent::new().with_text("No app commands are currently supported.".into())))
}

/// Handles interaction events from Slack.
async fn handle_interaction_event(event: SlackInteractionEvent, _client: Arc<SlackHyperClient>, _states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    warn!("[INTERACTION] {:#?}", event);
    Ok(())
}

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let event = event_callback.event;
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;
    let services = &user_state.services;

    match event {
        SlackEventCallbackBody::Message(slack_message_event) => {
            debug!("Received message event ...");

            let Some(message) = incoming_message_from_event(&slack_message_event, services.chat.bot_user_id()) else {
                debug!("Skipping message event without text, channel, or human sender.");
                return Ok(());
            };

            interaction::dispatch::handle_incoming_message(message, services.clone());
        }
        SlackEventCallbackBody::AppMention(_) => {
            // Mentions also arrive as message events, which is where they are classified.
            debug!("Skipping app mention event; handled via its message event.");
        }
        _ => {
            warn!("Received unhandled push event.")
        }
    }

    Ok(())
}

// Tests.
