//! Pivotal Tracker implementation of the tracker service.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    types::{Res, Story, StoryRequest},
};

use super::{GenericTrackerClient, TrackerClient};

// Constants.

const TOKEN_HEADER: &str = "x-trackertoken";
const TITLE_PREFIX: &str = "Investigate: ";
const TITLE_MAX_CHARS: usize = 80;
const TITLE_ELLIPSIS: &str = "…";

// Extra methods on `TrackerClient` applied by the pivotal implementation.

impl TrackerClient {
    pub fn pivotal(config: &Config) -> Res<Self> {
        let client = PivotalTrackerClient::new(&config.pivotal_api_url, &config.pivotal_web_url, config.pivotal_project_id, &config.pivotal_token)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Wire types.

#[derive(Debug, Deserialize)]
struct Membership {
    person: Person,
}

#[derive(Debug, Deserialize)]
struct Person {
    id: u64,
    #[serde(default)]
    username: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct CreateStoryBody<'a> {
    current_state: &'a str,
    story_type: &'a str,
    name: String,
    description: &'a str,
    owner_ids: Option<&'a [u64]>,
}

// Helpers.

/// Builds a story title from free text: a fixed label, the first 80 characters, and an ellipsis.
pub fn story_title(text: &str) -> String {
    let head: String = text.chars().take(TITLE_MAX_CHARS).collect();
    format!("{TITLE_PREFIX}{head}{TITLE_ELLIPSIS}")
}

// Specific implementations.

/// Pivotal Tracker client implementation, scoped to a single project.
#[derive(Clone, Debug)]
pub struct PivotalTrackerClient {
    http: reqwest::Client,
    api_url: String,
    web_url: String,
    project_id: u64,
}

impl PivotalTrackerClient {
    /// Create a new Pivotal Tracker client.
    #[instrument(name = "PivotalTrackerClient::new", skip(token))]
    pub fn new(api_url: &str, web_url: &str, project_id: u64, token: &str) -> Res<Self> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(token)?;
        token.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token);

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            web_url: web_url.trim_end_matches('/').to_string(),
            project_id,
        })
    }

    fn project_url(&self, resource: &str) -> String {
        format!("{}/projects/{}/{}", self.api_url, self.project_id, resource)
    }
}

#[async_trait]
impl GenericTrackerClient for PivotalTrackerClient {
    #[instrument(name = "PivotalTrackerClient::find_user_id", skip(self))]
    async fn find_user_id(&self, username: &str) -> Res<Option<u64>> {
        let memberships: Vec<Membership> = self.http.get(self.project_url("memberships")).send().await?.error_for_status()?.json().await?;

        let id = memberships.into_iter().find(|m| m.person.username.as_deref() == Some(username)).map(|m| m.person.id);

        Ok(id)
    }

    #[instrument(name = "PivotalTrackerClient::create_story", skip_all)]
    async fn create_story(&self, request: &StoryRequest) -> Res<Story> {
        let body = CreateStoryBody {
            current_state: "started",
            story_type: "chore",
            name: story_title(&request.text),
            description: &request.text,
            owner_ids: request.owner_ids.as_deref(),
        };

        let response = self.http.post(self.project_url("stories")).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Failed to create story ({}): {}", status, detail));
        }

        let story: Story = response.json().await?;

        info!("Created story `{}`.", story.id);

        Ok(story)
    }

    fn story_url(&self, story_id: u64) -> String {
        format!("{}/story/show/{}", self.web_url, story_id)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> PivotalTrackerClient {
        PivotalTrackerClient::new(&server.uri(), "https://www.pivotaltracker.com", 1410724, "tracker-token").unwrap()
    }

    fn memberships() -> serde_json::Value {
        json!([
            { "kind": "project_membership", "person": { "id": 101, "username": "ada", "name": "Ada Lovelace" } },
            { "kind": "project_membership", "person": { "id": 102, "username": "grace", "name": "Grace Hopper" } }
        ])
    }

    #[test]
    fn test_story_title_truncates_long_text() {
        let text = "x".repeat(200);
        let title = story_title(&text);

        assert_eq!(title, format!("Investigate: {}…", "x".repeat(80)));
        assert_eq!(story_title(&text), title);
    }

    #[test]
    fn test_story_title_short_text() {
        assert_eq!(story_title("Build is red"), "Investigate: Build is red…");
    }

    #[test]
    fn test_story_title_counts_characters_not_bytes() {
        let text = "é".repeat(100);
        assert_eq!(story_title(&text), format!("Investigate: {}…", "é".repeat(80)));
    }

    #[test]
    fn test_story_url() {
        let client = PivotalTrackerClient::new("https://example.test/services/v5", "https://www.pivotaltracker.com/", 1, "t").unwrap();
        assert_eq!(client.story_url(555), "https://www.pivotaltracker.com/story/show/555");
    }

    #[tokio::test]
    async fn test_find_user_id_exact_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/1410724/memberships"))
            .and(header("X-TrackerToken", "tracker-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(memberships()))
            .mount(&server)
            .await;

        let client = client(&server);

        assert_eq!(client.find_user_id("grace").await.unwrap(), Some(102));
        assert_eq!(client.find_user_id("Grace").await.unwrap(), None);
        assert_eq!(client.find_user_id("linus").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_user_id_request_failure_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/1410724/memberships"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        assert!(client(&server).find_user_id("ada").await.is_err());
    }

    #[tokio::test]
    async fn test_create_story_with_owner() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/projects/1410724/stories"))
            .and(header("X-TrackerToken", "tracker-token"))
            .and(body_json(json!({
                "current_state": "started",
                "story_type": "chore",
                "name": "Investigate: The build is broken\nhttps://countable.slack.com/archives/C1/p1…",
                "description": "The build is broken\nhttps://countable.slack.com/archives/C1/p1",
                "owner_ids": [101]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 9001,
                "name": "Investigate: The build is broken",
                "current_state": "started",
                "url": "https://www.pivotaltracker.com/story/show/9001"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = StoryRequest {
            text: "The build is broken\nhttps://countable.slack.com/archives/C1/p1".to_string(),
            owner_ids: Some(vec![101]),
        };

        let story = client(&server).create_story(&request).await.unwrap();

        assert_eq!(story.id, 9001);
        assert_eq!(story.current_state.as_deref(), Some("started"));
    }

    #[tokio::test]
    async fn test_create_story_without_owner_omits_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/projects/1410724/stories"))
            .and(body_json(json!({
                "current_state": "started",
                "story_type": "chore",
                "name": "Investigate: Flaky test…",
                "description": "Flaky test"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "name": "Investigate: Flaky test…" })))
            .expect(1)
            .mount(&server)
            .await;

        let request = StoryRequest { text: "Flaky test".to_string(), owner_ids: None };

        assert_eq!(client(&server).create_story(&request).await.unwrap().id, 7);
    }

    #[tokio::test]
    async fn test_create_story_failure_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/projects/1410724/stories"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "code": "invalid_parameter", "kind": "error" })))
            .mount(&server)
            .await;

        let request = StoryRequest { text: "Anything".to_string(), owner_ids: None };
        let err = client(&server).create_story(&request).await.unwrap_err();

        assert!(err.to_string().contains("400"));
    }
}
