//! Backend API settings.
//!
//! The base URL comes from `FOODFLOW_API_BASE_URL`; everything else is fixed.

use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ApiConfig::base_url`].
pub const API_BASE_URL_ENV: &str = "FOODFLOW_API_BASE_URL";

/// Base URL used when the environment does not set one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

static API_CONFIG: Lazy<ApiConfig> = Lazy::new(ApiConfig::from_env);

/// Process-wide API settings, read from the environment on first use.
pub fn api_config() -> &'static ApiConfig {
    &API_CONFIG
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEndpoints {
    pub login: String,
    pub logout: String,
    pub refresh: String,
    pub me: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            logout: "/auth/logout".to_string(),
            refresh: "/auth/refresh".to_string(),
            me: "/auth/me".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub auth: AuthEndpoints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub endpoints: Endpoints,
}

impl ApiConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            endpoints: Endpoints::default(),
        }
    }

    /// Reads the base URL from the environment; unset or blank means the default.
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_BASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Joins the base URL and an endpoint path with exactly one slash.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}
