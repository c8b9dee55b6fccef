use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::headers::build_authorization_headers;

/// Authorization state for subsequent API calls.
///
/// Immutable once built; every field is non-empty.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Session {
    base_url: String,
    domain: String,
    token: String,
}

impl Session {
    pub(crate) fn new(
        base_url: impl Into<String>,
        domain: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let session = Self {
            base_url: base_url.into(),
            domain: domain.into(),
            token: token.into(),
        };
        for (field, value) in [
            ("base_url", &session.base_url),
            ("domain", &session.domain),
            ("token", &session.token),
        ] {
            if value.trim().is_empty() {
                return Err(SessionError::invalid_config(field, "must not be empty"));
            }
        }
        Ok(session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// `Authorization` header value for downstream requests.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Headers that authorize a downstream API call with this session.
    pub fn request_headers(&self) -> BTreeMap<String, String> {
        build_authorization_headers(&self.domain, &self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("domain", &self.domain)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Profile of the account that opened an authenticated session.
///
/// Unknown attributes are ignored; the server-side password echo is never kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

impl User {
    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.to_owned()),
            (None, None) => None,
        }
    }
}

/// An authenticated session together with the resolved `user` relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    pub session: Session,
    pub user: Option<User>,
}
