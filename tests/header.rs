use assert_matches::assert_matches;
use datocms_session::headers::{
    build_session_headers, HEADER_ACCEPT, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE,
    HEADER_SPACE_DOMAIN, HEADER_USER_AGENT, JSON_MEDIA_TYPE,
};
use datocms_session::{ClientConfig, SessionError};
use pretty_assertions::assert_eq;

#[test]
fn session_headers_negotiate_json_for_the_space() {
    let headers = build_session_headers(&ClientConfig::default(), "admin.foobar.com")
        .expect("header construction");

    assert_eq!(headers[HEADER_ACCEPT], JSON_MEDIA_TYPE);
    assert_eq!(headers[HEADER_CONTENT_TYPE], JSON_MEDIA_TYPE);
    assert_eq!(headers[HEADER_SPACE_DOMAIN], "admin.foobar.com");
    assert!(headers[HEADER_USER_AGENT].starts_with("datocms_session/"));
    assert!(!headers.contains_key(HEADER_AUTHORIZATION));
}

#[test]
fn session_headers_prefer_configured_user_agent() {
    let config = ClientConfig::default().with_user_agent("  my-importer/2.0 ");
    let headers = build_session_headers(&config, "admin.foobar.com").expect("header construction");
    assert_eq!(headers[HEADER_USER_AGENT], "my-importer/2.0");
}

#[test]
fn extra_headers_are_lowercased_and_cannot_override_protocol_headers() {
    let config = ClientConfig::default().with_headers([
        ("X-Environment".to_owned(), "sandbox".to_owned()),
        ("Accept".to_owned(), "text/html".to_owned()),
    ]);
    let headers = build_session_headers(&config, "admin.foobar.com").expect("header construction");

    assert_eq!(headers["x-environment"], "sandbox");
    assert_eq!(headers[HEADER_ACCEPT], JSON_MEDIA_TYPE);
}

#[test]
fn blank_domain_is_invalid_config() {
    let result = build_session_headers(&ClientConfig::default(), "   ");
    assert_matches!(result, Err(SessionError::InvalidConfig { field: "domain", .. }));
}
