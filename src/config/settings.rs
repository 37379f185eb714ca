use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub welcome_notification: WelcomeNotificationConfig,
    #[serde(default)]
    pub clicks: ClickConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the outbound notification API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional bearer key sent with outbound requests
    #[serde(default)]
    pub key: Option<String>,
}

/// Welcome notification behavior on a fresh subscribe.
///
/// Absent or empty `title`/`message`/`url` fields are substituted at
/// dispatch time, not at load time, so an explicitly empty string behaves
/// the same as an omitted field.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WelcomeNotificationConfig {
    #[serde(default)]
    pub disable: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClickConfig {
    /// Default click-replay matching policy, used when no persisted
    /// option overrides it
    #[serde(default)]
    pub handler_match: ClickMatchMode,
}

/// How stored notification clicks are matched against the current page.
///
/// `Origin` exists for deployments that route every notification click
/// through a shared landing page: an exact URL comparison would never
/// match there, so any stored click from the page's origin replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickMatchMode {
    Origin,
    #[default]
    Exact,
}

fn default_base_url() -> String {
    "https://push.ara.dev/api/v1".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("api.base_url", default_base_url())?
            .set_default("welcome_notification.disable", false)?
            .set_default("clicks.handler_match", "exact")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // API_BASE_URL, API_KEY, WELCOME_NOTIFICATION_DISABLE, etc.
            .add_source(Environment::default().separator("_").try_parsing(true));

        builder.build()?.try_deserialize()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            key: None,
        }
    }
}
