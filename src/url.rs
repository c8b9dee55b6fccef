use url::Url;

use crate::error::SessionError;

/// Default origin for DatoCMS API requests.
pub const DEFAULT_BASE_URL: &str = "http://api.datocms.com";

/// Path of the credential-exchange endpoint, relative to the base URL.
pub const SESSIONS_PATH: &str = "/sessions";

/// Normalize a base URL.
///
/// Surrounding whitespace and trailing slashes are removed; a blank input
/// falls back to [`DEFAULT_BASE_URL`].
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

/// Resolve the absolute `POST /sessions` endpoint for `base_url`.
pub fn sessions_endpoint(base_url: &str) -> Result<Url, SessionError> {
    let base = normalize_base_url(base_url);
    let endpoint = format!("{base}{SESSIONS_PATH}");
    let parsed = Url::parse(&endpoint).map_err(|error| {
        SessionError::invalid_config("base_url", format!("{base} is not a valid URL: {error}"))
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(SessionError::invalid_config(
            "base_url",
            format!("unsupported URL scheme '{other}' in {base}"),
        )),
    }
}
