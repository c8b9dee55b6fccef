//! Session establishment for the DatoCMS content-management API.
//!
//! A [`Session`] carries the API origin, the space domain and a bearer token.
//! It is built either directly from a known token ([`read_only_session`]) or
//! by exchanging an email and password for a server-issued token
//! ([`authenticated_session`]). The exchange response is a JSON:API compound
//! document, decoded and resolved by [`jsonapi`]; rejections surface as an
//! [`ApiException`] carrying the server's error code.
//!
//! The HTTP exchange sits behind [`HttpTransport`]. [`ReqwestTransport`] is the
//! default; tests and embedders may supply their own.

pub mod config;
pub mod error;
pub mod factory;
pub mod headers;
pub mod jsonapi;
pub mod session;
pub mod transport;
pub mod url;

pub use config::{AuthenticatedSessionConfig, ClientConfig, ReadOnlySessionConfig};
pub use error::{
    map_error, ApiErrorEntry, ApiException, DocumentError, MissingRelationshipError, SessionError,
    TransportError,
};
pub use factory::SessionFactory;
pub use jsonapi::{resolve, CompoundDocument, ResolvedEntity};
pub use session::{AuthenticatedSession, Session, User};
pub use transport::{CancellationSignal, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use crate::url::DEFAULT_BASE_URL;

/// Build a session from an existing token using the default configuration.
pub async fn read_only_session(config: &ReadOnlySessionConfig) -> Result<Session, SessionError> {
    factory::build_read_only_session(&ClientConfig::default(), config)
}

/// Exchange credentials for a session using the default configuration.
pub async fn authenticated_session(
    config: &AuthenticatedSessionConfig,
) -> Result<Session, SessionError> {
    SessionFactory::new(ClientConfig::default())?
        .authenticated_session(config)
        .await
}
