//! Auth provider configuration loaded from environment variables.
//!
//! `AUTH_URL` is the base URL of the GoTrue-compatible auth service (without the
//! `/auth/v1` suffix) and `AUTH_ANON_KEY` is the public API key sent with every call.

use crate::errors::{Error, Result};

/// Connection settings for the remote auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Base URL of the auth service
    pub url: String,
    /// Public API key
    pub anon_key: String,
}

impl AuthConfig {
    /// Builds the config from explicit values, trimming any trailing slash from the URL.
    #[must_use]
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    /// Reads `AUTH_URL` and `AUTH_ANON_KEY` from the environment.
    ///
    /// # Errors
    /// Returns `Error::Config` when either variable is missing or empty.
    pub fn from_env() -> Result<Self> {
        let url = read_var("AUTH_URL")?;
        let anon_key = read_var("AUTH_ANON_KEY")?;
        Ok(Self::new(&url, &anon_key))
    }
}

fn read_var(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config {
            message: format!("{name} is not set"),
        }),
    }
}
