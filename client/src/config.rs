//! Build-time configuration for the Parse backend.
//!
//! Values are baked in when the WASM bundle is compiled:
//! `PARSE_APP_ID`, `PARSE_JS_KEY` and optionally `PARSE_SERVER_URL`.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// Used when `PARSE_SERVER_URL` is not set at build time.
pub const DEFAULT_SERVER_URL: &str = "https://parseapi.back4app.com";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing build-time setting {0}")]
    Missing(&'static str),
}

/// Connection settings for the Parse REST API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    pub app_id: String,
    pub javascript_key: String,
    /// Base URL without a trailing slash.
    pub server_url: String,
}

impl GatewayConfig {
    /// Read the values captured by `option_env!` at compile time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the app id or key was not set.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_values(option_env!("PARSE_APP_ID"), option_env!("PARSE_JS_KEY"), option_env!("PARSE_SERVER_URL"))
    }

    /// Validate raw values. Blank strings count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first absent setting.
    pub fn from_values(
        app_id: Option<&str>,
        javascript_key: Option<&str>,
        server_url: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let app_id = non_blank(app_id).ok_or(ConfigError::Missing("PARSE_APP_ID"))?;
        let javascript_key = non_blank(javascript_key).ok_or(ConfigError::Missing("PARSE_JS_KEY"))?;
        let server_url = non_blank(server_url)
            .unwrap_or(DEFAULT_SERVER_URL)
            .trim_end_matches('/')
            .to_owned();
        Ok(Self { app_id: app_id.to_owned(), javascript_key: javascript_key.to_owned(), server_url })
    }

    /// Absolute URL for a REST path such as `/login`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
