use std::fmt;

use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

/// Fallback code used when a failure body carries no recognizable error entry.
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";

#[derive(Debug, Error)]
pub enum SessionError {
    /// Required configuration was missing or unusable. Raised before any I/O.
    #[error("invalid session configuration: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The API answered and rejected the request.
    #[error(transparent)]
    Api(#[from] ApiException),

    /// A success document referenced a resource it did not include.
    #[error(transparent)]
    MissingRelationship(#[from] MissingRelationshipError),

    /// A success body was JSON but not a usable session document.
    #[error("malformed session document: {0}")]
    MalformedDocument(#[source] DocumentError),

    /// The HTTP exchange itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    #[must_use]
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// The API error code, when the failure is an API rejection.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api(exception) => Some(exception.code()),
            _ => None,
        }
    }
}

impl From<DocumentError> for SessionError {
    fn from(error: DocumentError) -> Self {
        match error {
            DocumentError::NotJson(source) => {
                Self::Transport(TransportError::MalformedBody(source))
            }
            DocumentError::MissingRelationship(missing) => Self::MissingRelationship(missing),
            other => Self::MalformedDocument(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("request error: {0}")]
    Request(#[source] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("request was cancelled")]
    Cancelled,
    #[error("invalid header {name}")]
    InvalidHeader { name: String },
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("response body is not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(error)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("relationship '{relationship}' references {resource_type}:{id}, absent from `included`")]
pub struct MissingRelationshipError {
    pub relationship: String,
    pub resource_type: String,
    pub id: String,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("body is not JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("body is not a JSON:API compound document: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("document has no primary `data` resource")]
    MissingData,
    #[error("resource is missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("primary resource has type '{found}', expected '{expected}'")]
    UnexpectedType {
        expected: &'static str,
        found: String,
    },
    #[error("`included` lists {resource_type}:{id} more than once")]
    DuplicateIncluded { resource_type: String, id: String },
    #[error(transparent)]
    MissingRelationship(#[from] MissingRelationshipError),
    #[error("resolved entity does not fit the expected record: {0}")]
    Record(#[source] serde_json::Error),
}

/// One entry of a JSON:API error document.
///
/// Decoded leniently: members of an unexpected type read as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiErrorEntry {
    pub id: Option<String>,
    pub resource_type: Option<String>,
    pub attributes: Map<String, Value>,
    pub title: Option<String>,
    pub detail: Option<String>,
}

impl ApiErrorEntry {
    pub fn from_value(entry: &Value) -> Self {
        let text = |key: &str| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .and_then(non_empty_string)
                .map(str::to_owned)
        };

        Self {
            id: text("id"),
            resource_type: text("type"),
            attributes: entry
                .get("attributes")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            title: text("title"),
            detail: text("detail"),
        }
    }

    fn human_message(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .or(self.title.as_deref())
            .or_else(|| {
                self.attributes
                    .get("message")
                    .and_then(Value::as_str)
                    .and_then(non_empty_string)
            })
    }
}

/// An explicit rejection from the API.
///
/// `code` comes from the first error entry; every entry stays available
/// through [`ApiException::errors`], including when the first entry has no
/// usable `id` and the code falls back to [`UNKNOWN_ERROR_CODE`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiException {
    status: StatusCode,
    code: String,
    message: String,
    attributes: Map<String, Value>,
    errors: Vec<ApiErrorEntry>,
}

impl ApiException {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn errors(&self) -> &[ApiErrorEntry] {
        &self.errors
    }

    /// Error codes of every entry carrying one, in server order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().filter_map(|entry| entry.id.as_deref())
    }

    fn unknown(status: StatusCode, body: &[u8], errors: Vec<ApiErrorEntry>) -> Self {
        let mut attributes = Map::new();
        attributes.insert("status".to_owned(), Value::from(status.as_u16()));
        attributes.insert(
            "body".to_owned(),
            Value::from(String::from_utf8_lossy(body).into_owned()),
        );
        let message = format!(
            "unexpected HTTP {} response",
            status
                .canonical_reason()
                .map(|reason| format!("{} {reason}", status.as_u16()))
                .unwrap_or_else(|| status.as_u16().to_string())
        );

        Self {
            status,
            code: UNKNOWN_ERROR_CODE.to_owned(),
            message,
            attributes,
            errors,
        }
    }
}

impl fmt::Display for ApiException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message == self.code {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ApiException {}

/// Map a non-success response to an [`ApiException`].
///
/// Error entries are read from `errors`, falling back to `data`, and the
/// first entry's `id` is the code. Bodies whose first entry has no `id`, or
/// that carry no entries at all, produce [`UNKNOWN_ERROR_CODE`] with the raw
/// status and body as attributes.
pub fn map_error(status: StatusCode, body: &[u8]) -> ApiException {
    let errors = parse_error_entries(body).unwrap_or_default();
    let Some(first) = errors.first().filter(|first| first.id.is_some()) else {
        return ApiException::unknown(status, body, errors);
    };

    let code = first.id.clone().unwrap_or_default();
    let message = first
        .human_message()
        .map(str::to_owned)
        .unwrap_or_else(|| code.clone());
    let attributes = first.attributes.clone();

    ApiException {
        status,
        code,
        message,
        attributes,
        errors,
    }
}

fn parse_error_entries(body: &[u8]) -> Option<Vec<ApiErrorEntry>> {
    let value = serde_json::from_slice::<Value>(body).ok()?;
    let object = value.as_object()?;
    let entries = object
        .get("errors")
        .filter(|value| value.is_array())
        .or_else(|| object.get("data"))?
        .as_array()?;

    Some(entries.iter().map(ApiErrorEntry::from_value).collect())
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{map_error, UNKNOWN_ERROR_CODE};

    #[test]
    fn empty_error_array_is_unknown() {
        let exception = map_error(StatusCode::UNPROCESSABLE_ENTITY, br#"{"data":[]}"#);
        assert_eq!(exception.code(), UNKNOWN_ERROR_CODE);
        assert_eq!(exception.attributes()["status"], 422);
    }

    #[test]
    fn detail_becomes_message() {
        let body = br#"{"errors":[{"id":"INVALID_CREDENTIALS","detail":"wrong password"}]}"#;
        let exception = map_error(StatusCode::UNAUTHORIZED, body);
        assert_eq!(exception.code(), "INVALID_CREDENTIALS");
        assert_eq!(exception.message(), "wrong password");
        assert_eq!(exception.to_string(), "INVALID_CREDENTIALS: wrong password");
    }

    #[test]
    fn null_attributes_keep_the_code() {
        let body = br#"{"data":[{"id":"FOO_ERROR","attributes":null}]}"#;
        let exception = map_error(StatusCode::NOT_ACCEPTABLE, body);
        assert_eq!(exception.code(), "FOO_ERROR");
        assert!(exception.attributes().is_empty());
    }

    #[test]
    fn object_detail_is_ignored_as_message() {
        let body = br#"{"data":[{"id":"FOO_ERROR","detail":{"field":"email"},"title":7}]}"#;
        let exception = map_error(StatusCode::NOT_ACCEPTABLE, body);
        assert_eq!(exception.code(), "FOO_ERROR");
        assert_eq!(exception.message(), "FOO_ERROR");
    }
}
