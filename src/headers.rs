use std::collections::BTreeMap;

use crate::config::ClientConfig;
use crate::error::SessionError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_SPACE_DOMAIN: &str = "x-space-domain";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Headers that extra configuration may not override.
const PROTECTED_HEADERS: [&str; 3] = [HEADER_ACCEPT, HEADER_CONTENT_TYPE, HEADER_SPACE_DOMAIN];

/// Build a deterministic header map for the credential-exchange request.
pub fn build_session_headers(
    config: &ClientConfig,
    domain: &str,
) -> Result<BTreeMap<String, String>, SessionError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(SessionError::invalid_config("domain", "must not be empty"));
    }

    let mut headers = BTreeMap::new();

    let user_agent = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), user_agent);

    for (key, value) in &config.extra_headers {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() || PROTECTED_HEADERS.contains(&key.as_str()) {
            continue;
        }
        headers.insert(key, value.trim().to_owned());
    }

    headers.insert(HEADER_ACCEPT.to_owned(), JSON_MEDIA_TYPE.to_owned());
    headers.insert(HEADER_CONTENT_TYPE.to_owned(), JSON_MEDIA_TYPE.to_owned());
    headers.insert(HEADER_SPACE_DOMAIN.to_owned(), domain.to_owned());

    Ok(headers)
}

/// Headers that authorize a downstream API call on behalf of a session.
pub fn build_authorization_headers(domain: &str, token: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (HEADER_ACCEPT.to_owned(), JSON_MEDIA_TYPE.to_owned()),
        (HEADER_CONTENT_TYPE.to_owned(), JSON_MEDIA_TYPE.to_owned()),
        (HEADER_SPACE_DOMAIN.to_owned(), domain.to_owned()),
        (HEADER_AUTHORIZATION.to_owned(), format!("Bearer {token}")),
    ])
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
