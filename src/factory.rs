use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{AuthenticatedSessionConfig, ClientConfig, ReadOnlySessionConfig};
use crate::error::{map_error, SessionError, TransportError};
use crate::headers::build_session_headers;
use crate::jsonapi::{resolve, CompoundDocument, ResolvedEntity};
use crate::session::{AuthenticatedSession, Session, User};
use crate::transport::{
    await_or_cancel, is_cancelled, CancellationSignal, HttpRequest, HttpResponse, HttpTransport,
    ReqwestTransport,
};
use crate::url::{normalize_base_url, sessions_endpoint};

const LOG_TARGET: &str = "datocms_session";

/// Primary resource type of a credential-exchange response.
pub const SESSION_RESOURCE_TYPE: &str = "session";
/// Relationship on the session resource pointing at the signed-in account.
pub const USER_RELATIONSHIP: &str = "user";

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Builds [`Session`] values, either directly from a token or by exchanging
/// credentials over HTTP. Each call is independent; the factory holds no
/// per-session state.
pub struct SessionFactory {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionFactory {
    /// Factory backed by a reqwest client honouring `config.timeout`.
    pub fn new(config: ClientConfig) -> Result<Self, SessionError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a session from an already-issued token. No I/O is performed.
    pub async fn read_only_session(
        &self,
        config: &ReadOnlySessionConfig,
    ) -> Result<Session, SessionError> {
        build_read_only_session(&self.config, config)
    }

    /// Build the `POST /sessions` request for `config` without sending it.
    pub fn build_session_request(
        &self,
        config: &AuthenticatedSessionConfig,
    ) -> Result<HttpRequest, SessionError> {
        require_non_empty("domain", &config.domain)?;
        require_non_empty("email", &config.email)?;
        require_non_empty("password", &config.password)?;

        let base_url = effective_base_url(&self.config, config.base_url.as_deref());
        let url = sessions_endpoint(&base_url)?;
        let headers = build_session_headers(&self.config, &config.domain)?;
        let body = serde_json::to_vec(&Credentials {
            email: &config.email,
            password: &config.password,
        })
        .map_err(TransportError::Encode)?;

        Ok(HttpRequest {
            method: Method::POST,
            url,
            headers,
            body,
        })
    }

    /// Exchange credentials for a session token.
    ///
    /// The `user` relationship must resolve, but its attributes are not
    /// decoded; use [`SessionFactory::authenticated_session_with_profile`] for
    /// a typed profile.
    pub async fn authenticated_session(
        &self,
        config: &AuthenticatedSessionConfig,
    ) -> Result<Session, SessionError> {
        self.exchange(config, None)
            .await
            .map(|(session, _resolved)| session)
    }

    /// Like [`SessionFactory::authenticated_session`], also returning the
    /// resolved user profile. Fails with [`SessionError::MalformedDocument`]
    /// when the profile does not fit [`User`].
    pub async fn authenticated_session_with_profile(
        &self,
        config: &AuthenticatedSessionConfig,
    ) -> Result<AuthenticatedSession, SessionError> {
        let (session, resolved) = self.exchange(config, None).await?;
        with_profile(session, &resolved)
    }

    /// Exchange credentials, failing with [`TransportError::Cancelled`] once
    /// `cancellation` is raised.
    pub async fn authenticated_session_with_cancel(
        &self,
        config: &AuthenticatedSessionConfig,
        cancellation: &CancellationSignal,
    ) -> Result<AuthenticatedSession, SessionError> {
        let (session, resolved) = self.exchange(config, Some(cancellation)).await?;
        with_profile(session, &resolved)
    }

    async fn exchange(
        &self,
        config: &AuthenticatedSessionConfig,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<(Session, ResolvedEntity), SessionError> {
        let request = self.build_session_request(config)?;
        if is_cancelled(cancellation) {
            return Err(TransportError::Cancelled.into());
        }

        let domain = config.domain.trim();
        debug!(
            target: LOG_TARGET,
            domain,
            url = %request.url,
            "requesting authenticated session"
        );
        let response = await_or_cancel(self.transport.send(request), cancellation)
            .await?
            .inspect_err(|error| {
                warn!(target: LOG_TARGET, domain, %error, "session request failed");
            })?;

        let base_url = effective_base_url(&self.config, config.base_url.as_deref());
        session_from_response(base_url, domain, response)
    }
}

/// Validate `config` and build a read-only session against `defaults`.
///
/// The domain is trimmed; the token is kept verbatim.
pub fn build_read_only_session(
    defaults: &ClientConfig,
    config: &ReadOnlySessionConfig,
) -> Result<Session, SessionError> {
    require_non_empty("domain", &config.domain)?;
    require_non_empty("token", &config.token)?;

    let base_url = effective_base_url(defaults, config.base_url.as_deref());
    sessions_endpoint(&base_url)?;

    let domain = config.domain.trim();
    debug!(target: LOG_TARGET, domain, %base_url, "built read-only session");
    Session::new(base_url, domain, config.token.as_str())
}

fn session_from_response(
    base_url: String,
    domain: &str,
    response: HttpResponse,
) -> Result<(Session, ResolvedEntity), SessionError> {
    if !response.status.is_success() {
        let exception = map_error(response.status, &response.body);
        warn!(
            target: LOG_TARGET,
            domain,
            status = response.status.as_u16(),
            code = exception.code(),
            "session request rejected"
        );
        return Err(exception.into());
    }

    let document = CompoundDocument::from_slice(&response.body)?;
    document.expect_type(SESSION_RESOURCE_TYPE)?;
    let resolved = resolve(&document)?;

    let session = Session::new(base_url, domain, resolved.id.as_str())?;
    info!(
        target: LOG_TARGET,
        domain,
        user_id = resolved
            .field(USER_RELATIONSHIP)
            .and_then(|user| user.get("id"))
            .and_then(serde_json::Value::as_str),
        "authenticated session established"
    );
    Ok((session, resolved))
}

fn with_profile(
    session: Session,
    resolved: &ResolvedEntity,
) -> Result<AuthenticatedSession, SessionError> {
    let user = resolved.relationship::<User>(USER_RELATIONSHIP)?;
    Ok(AuthenticatedSession { session, user })
}

fn effective_base_url(defaults: &ClientConfig, override_url: Option<&str>) -> String {
    let base = override_url
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(defaults.base_url.as_str());
    normalize_base_url(base)
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), SessionError> {
    if value.trim().is_empty() {
        Err(SessionError::invalid_config(field, "must not be empty"))
    } else {
        Ok(())
    }
}
