//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc, time::Duration};

use serde::Deserialize;

use crate::base::filter::DEFAULT_BLACKLIST;

use super::types::Res;

/// Default Slack Web API base URL.
fn default_slack_api_url() -> String {
    "https://slack.com/api".to_string()
}

/// Default Slack workspace URL used to build thread permalinks.
fn default_slack_workspace_url() -> String {
    "https://countable.slack.com".to_string()
}

/// Default Pivotal Tracker API base URL.
fn default_pivotal_api_url() -> String {
    "https://www.pivotaltracker.com/services/v5".to_string()
}

/// Default Pivotal Tracker web URL used to build story links.
fn default_pivotal_web_url() -> String {
    "https://www.pivotaltracker.com".to_string()
}

/// Default Pivotal Tracker project.
fn default_pivotal_project_id() -> u64 {
    1410724
}

/// Default label of the Slack profile field holding a user's tracker username.
fn default_pivotal_username_field_label() -> String {
    "Pivotal Username".to_string()
}

fn default_say_blacklist() -> Vec<String> {
    DEFAULT_BLACKLIST.iter().map(|w| w.to_string()).collect()
}

fn default_outbound_timeout_secs() -> u64 {
    10
}

fn default_db_endpoint() -> String {
    "mem://".to_string()
}

/// Configuration for the tracker-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Slack app token used for Socket Mode (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Slack Web API base URL (`SLACK_API_URL`).
    #[serde(default = "default_slack_api_url")]
    pub slack_api_url: String,
    /// Workspace URL used for thread permalinks (`SLACK_WORKSPACE_URL`).
    #[serde(default = "default_slack_workspace_url")]
    pub slack_workspace_url: String,
    /// Pivotal Tracker API token (`PIVOTAL_TOKEN`).
    pub pivotal_token: String,
    /// Pivotal Tracker API base URL (`PIVOTAL_API_URL`).
    #[serde(default = "default_pivotal_api_url")]
    pub pivotal_api_url: String,
    /// Pivotal Tracker web URL (`PIVOTAL_WEB_URL`).
    #[serde(default = "default_pivotal_web_url")]
    pub pivotal_web_url: String,
    /// The project that stories are created in (`PIVOTAL_PROJECT_ID`).
    #[serde(default = "default_pivotal_project_id")]
    pub pivotal_project_id: u64,
    /// Label of the Slack custom profile field holding the tracker username (`PIVOTAL_USERNAME_FIELD_LABEL`).
    #[serde(default = "default_pivotal_username_field_label")]
    pub pivotal_username_field_label: String,
    /// Words the `say` skill refuses to repeat (`SAY_BLACKLIST`).
    #[serde(default = "default_say_blacklist")]
    pub say_blacklist: Vec<String>,
    /// Deadline for each outbound call, in seconds (`OUTBOUND_TIMEOUT_SECS`).
    #[serde(default = "default_outbound_timeout_secs")]
    pub outbound_timeout_secs: u64,
    /// Database endpoint URL, e.g. `mem://` or `ws://localhost:8000` (`DB_ENDPOINT`).
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database username (`DB_USERNAME`).
    #[serde(default)]
    pub db_username: String,
    /// Database password (`DB_PASSWORD`).
    #[serde(default)]
    pub db_password: String,
}

impl ConfigInner {
    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("TRACKER_BOT").list_separator(",").with_list_parse_key("say_blacklist").try_parsing(true));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    pub fn validate(&self) -> Res<()> {
        if self.slack_app_token.is_empty() || self.slack_bot_token.is_empty() {
            return Err(anyhow::anyhow!("Slack app and bot tokens must be set."));
        }

        if self.pivotal_token.is_empty() {
            return Err(anyhow::anyhow!("Pivotal Tracker token must be set."));
        }

        if self.pivotal_project_id == 0 {
            return Err(anyhow::anyhow!("Pivotal Tracker project ID must be non-zero."));
        }

        if self.outbound_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Outbound timeout must be at least one second."));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Res<Config> {
        let cfg = config::Config::builder().add_source(config::File::from_str(toml, config::FileFormat::Toml)).build()?;
        let result = Config { inner: Arc::new(cfg.try_deserialize()?) };
        result.validate()?;
        Ok(result)
    }

    #[test]
    fn test_defaults_applied() {
        let config = from_toml(
            r#"
            slack_app_token = "xapp-1"
            slack_bot_token = "xoxb-1"
            pivotal_token = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.pivotal_project_id, 1410724);
        assert_eq!(config.pivotal_username_field_label, "Pivotal Username");
        assert_eq!(config.slack_workspace_url, "https://countable.slack.com");
        assert_eq!(config.outbound_timeout(), Duration::from_secs(10));
        assert_eq!(config.db_endpoint, "mem://");
        assert!(!config.say_blacklist.is_empty());
    }

    #[test]
    fn test_rejects_missing_tracker_token() {
        let result = from_toml(
            r#"
            slack_app_token = "xapp-1"
            slack_bot_token = "xoxb-1"
            pivotal_token = ""
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_missing_slack_tokens() {
        let missing_app = from_toml(
            r#"
            slack_bot_token = "xoxb-1"
            pivotal_token = "secret"
            "#,
        );

        let empty_bot = from_toml(
            r#"
            slack_app_token = "xapp-1"
            slack_bot_token = ""
            pivotal_token = "secret"
            "#,
        );

        assert!(missing_app.is_err());
        assert!(empty_bot.is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = from_toml(
            r#"
            slack_app_token = "xapp-1"
            slack_bot_token = "xoxb-1"
            pivotal_token = "secret"
            outbound_timeout_secs = 0
            "#,
        );

        assert!(result.is_err());
    }
}
