//! Configuration types.

use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Default dashboard path, resolved against the API URL.
pub const DEFAULT_DASHBOARD_PATH: &str = "/assets/dashboard.html";

/// Onboarding client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every backend endpoint is joined onto.
    pub api_url: Url,
    /// Dashboard the post-completion actions redirect to.
    pub dashboard_url: Url,
    /// Delay between the confirmation toast and the redirect.
    pub redirect_delay: Duration,
    /// How long toasts stay visible. Zero keeps them until dismissed.
    pub notification_duration: Duration,
    /// URL of the onboarding page itself, carrying the optional `user_id`.
    pub page_url: Option<Url>,
}

impl Default for Config {
    fn default() -> Self {
        let api_url = Url::parse(DEFAULT_API_URL).expect("default API URL is valid");
        let dashboard_url = api_url
            .join(DEFAULT_DASHBOARD_PATH)
            .expect("default dashboard path is valid");
        Self {
            api_url,
            dashboard_url,
            redirect_delay: Duration::from_millis(1500),
            notification_duration: Duration::from_millis(5000),
            page_url: None,
        }
    }
}

impl Config {
    /// Build a config from `ONBOARDING_*` environment variables.
    ///
    /// Numeric values that fail to parse fall back to their defaults;
    /// unparseable URLs are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = match std::env::var("ONBOARDING_API_URL") {
            Ok(raw) => parse_url("ONBOARDING_API_URL", &raw)?,
            Err(_) => defaults.api_url,
        };

        let dashboard_raw = std::env::var("ONBOARDING_DASHBOARD_URL")
            .unwrap_or_else(|_| DEFAULT_DASHBOARD_PATH.to_string());
        let dashboard_url = api_url
            .join(&dashboard_raw)
            .map_err(|e| ConfigError::InvalidValue {
                key: "ONBOARDING_DASHBOARD_URL".to_string(),
                message: e.to_string(),
            })?;

        let redirect_delay = duration_ms_from_env("ONBOARDING_REDIRECT_DELAY_MS")
            .unwrap_or(defaults.redirect_delay);
        let notification_duration = duration_ms_from_env("ONBOARDING_NOTIFICATION_MS")
            .unwrap_or(defaults.notification_duration);

        let page_url = match std::env::var("ONBOARDING_PAGE_URL") {
            Ok(raw) => Some(parse_url("ONBOARDING_PAGE_URL", &raw)?),
            Err(_) => None,
        };

        Ok(Self {
            api_url,
            dashboard_url,
            redirect_delay,
            notification_duration,
            page_url,
        })
    }

    /// Config pointed at `api_url`, with the dashboard resolved under it.
    pub fn with_api_url(api_url: Url) -> Self {
        let dashboard_url = api_url
            .join(DEFAULT_DASHBOARD_PATH)
            .unwrap_or_else(|_| api_url.clone());
        Self {
            api_url,
            dashboard_url,
            ..Self::default()
        }
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn duration_ms_from_env(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
