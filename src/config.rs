//! Client and per-session configuration.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::time::Duration;

use crate::url::DEFAULT_BASE_URL;

/// Environment variable overriding [`ClientConfig::base_url`].
pub const ENV_BASE_URL: &str = "DATOCMS_BASE_URL";
/// Environment variable holding a request timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "DATOCMS_TIMEOUT_SECS";

/// Transport-level configuration shared by every session a factory builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API origin used when a session config does not carry its own.
    pub base_url: String,
    /// Optional timeout applied to the credential exchange.
    pub timeout: Option<Duration>,
    /// Optional `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Additional headers merged into the credential-exchange request.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `DATOCMS_BASE_URL` and `DATOCMS_TIMEOUT_SECS`.
    ///
    /// Blank or unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(base_url) = env_string_opt(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(timeout) = env_string_opt(ENV_TIMEOUT_SECS)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            config.timeout = Some(Duration::from_secs(timeout));
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}

/// Inputs for a session built from an already-issued token.
#[derive(Clone, PartialEq, Eq)]
pub struct ReadOnlySessionConfig {
    pub domain: String,
    pub token: String,
    /// Overrides [`ClientConfig::base_url`] for this session only.
    pub base_url: Option<String>,
}

impl ReadOnlySessionConfig {
    pub fn new(domain: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            token: token.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl fmt::Debug for ReadOnlySessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlySessionConfig")
            .field("domain", &self.domain)
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Inputs for a session obtained by exchanging credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedSessionConfig {
    pub domain: String,
    pub email: String,
    pub password: String,
    /// Overrides [`ClientConfig::base_url`] for this session only.
    pub base_url: Option<String>,
}

impl AuthenticatedSessionConfig {
    pub fn new(
        domain: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            email: email.into(),
            password: password.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl fmt::Debug for AuthenticatedSessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedSessionConfig")
            .field("domain", &self.domain)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
