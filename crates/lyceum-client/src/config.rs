//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client can talk to a local classroom
//! server with zero configuration.

use std::time::Duration;

use lyceum_shared::constants::{DEFAULT_BASE_URL, TOAST_DISMISS_SECS};
use lyceum_shared::Role;

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is joined onto.
    /// Env: `LYCEUM_BASE_URL`
    /// Default: `http://localhost:8080`
    pub base_url: String,

    /// Role of the logged-in principal, selects the current-user endpoint.
    /// Env: `LYCEUM_ROLE` (`student` / `teacher`)
    /// Default: `student`
    pub role: Role,

    /// Raw `Cookie` header value carrying the server session.
    /// Env: `LYCEUM_SESSION_COOKIE`
    /// Default: none.
    pub session_cookie: Option<String>,

    /// How long toasts stay visible.
    /// Env: `LYCEUM_TOAST_SECS`
    /// Default: `3`
    pub toast_dismiss: Duration,

    /// Background refresh interval. `None` disables polling.
    /// Env: `LYCEUM_POLL_SECS` (`0` = off)
    /// Default: off.
    pub poll_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            role: Role::Student,
            session_cookie: None,
            toast_dismiss: Duration::from_secs(TOAST_DISMISS_SECS),
            poll_interval: None,
        }
    }
}

// Keeps the session cookie out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("role", &self.role)
            .field("session_cookie", &self.session_cookie.as_ref().map(|_| "<set>"))
            .field("toast_dismiss", &self.toast_dismiss)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = var("LYCEUM_BASE_URL") {
            let url = url.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                config.base_url = url.trim_end_matches('/').to_string();
            } else {
                tracing::warn!(value = %url, "Invalid LYCEUM_BASE_URL, using default");
            }
        }

        if let Some(role) = var("LYCEUM_ROLE") {
            match Role::parse(&role) {
                Some(parsed) => config.role = parsed,
                None => tracing::warn!(value = %role, "Invalid LYCEUM_ROLE, using default"),
            }
        }

        if let Some(cookie) = var("LYCEUM_SESSION_COOKIE") {
            if !cookie.trim().is_empty() {
                config.session_cookie = Some(cookie.trim().to_string());
            }
        }

        if let Some(val) = var("LYCEUM_TOAST_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) => config.toast_dismiss = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %val, "Invalid LYCEUM_TOAST_SECS, using default"),
            }
        }

        if let Some(val) = var("LYCEUM_POLL_SECS") {
            match val.trim().parse::<u64>() {
                Ok(0) => config.poll_interval = None,
                Ok(secs) => config.poll_interval = Some(Duration::from_secs(secs)),
                Err(_) => tracing::warn!(value = %val, "Invalid LYCEUM_POLL_SECS, polling disabled"),
            }
        }

        config
    }
}
