//! Host process configuration.
//!
//! `.env` is loaded by `main` before this runs; only `PORT` is read here.
//! Leptos settings come from `[package.metadata.leptos]`.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_PORT: u16 = 3000;

/// Startup failures; all are fatal and surface from `main`.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("invalid PORT {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },

    #[error("environment file: {0}")]
    Env(String),

    #[error("leptos configuration: {0}")]
    Leptos(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostConfig {
    pub port: u16,
}

impl HostConfig {
    /// # Errors
    ///
    /// Returns [`HostError::InvalidPort`] if `PORT` is set but not a port number.
    pub fn from_env() -> Result<Self, HostError> {
        Self::from_port_var(std::env::var("PORT").ok().as_deref())
    }

    pub(crate) fn from_port_var(raw: Option<&str>) -> Result<Self, HostError> {
        let port = match raw.map(str::trim).filter(|v| !v.is_empty()) {
            None => DEFAULT_PORT,
            Some(value) => value.parse().map_err(|e: std::num::ParseIntError| HostError::InvalidPort {
                value: value.to_owned(),
                reason: e.to_string(),
            })?,
        };
        Ok(Self { port })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
