/*
[INPUT]:  Mock authentication responses
[OUTPUT]: Test results for auth flow
[POS]:    Integration tests - authentication
[UPDATE]: When auth endpoints or flow changes
*/

mod common;

use std::sync::Arc;

use common::{client_with_auth, fast_stream_config, setup_mock_server};
use rofex_adapter::{AuthProvider, PasswordAuth, RofexClient, RofexError, TokenStore};
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

const WS_URL: &str = "ws://127.0.0.1:9/";

#[test]
fn test_token_store_lifecycle() {
    let store = TokenStore::new();
    assert!(store.is_expired());
    assert!(store.get_token().is_none());

    store.set_token("abc".to_string(), 60);
    assert!(!store.is_expired());
    assert_eq!(store.get_token().as_deref(), Some("abc"));

    let shared = store.clone();
    shared.clear();
    assert!(store.get_token().is_none());
}

#[tokio::test]
async fn test_login_once_then_reuse_token() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/getToken"))
        .and(header("X-Username", "user"))
        .and(header("X-Password", "pass"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Auth-Token", "session-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/accounts"))
        .and(header("X-Auth-Token", "session-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "OK", "accounts": []})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let auth = Arc::new(PasswordAuth::new("user", "pass"));
    let client = client_with_auth(&server.uri(), WS_URL, fast_stream_config(), auth.clone());

    assert_ok!(client.accounts().await);
    assert_ok!(client.accounts().await);
    assert_eq!(auth.token().as_deref(), Some("session-1"));
    assert_eq!(assert_ok!(client.auth_token().await), "session-1");
}

#[tokio::test]
async fn test_rejected_login_surfaces_status() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/getToken"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let auth = Arc::new(PasswordAuth::new("user", "wrong"));
    let client = client_with_auth(&server.uri(), WS_URL, fast_stream_config(), auth);

    let err = client.accounts().await.unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.to_string(), "http 401: bad credentials");
}

#[tokio::test]
async fn test_cleared_token_triggers_new_login() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/getToken"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Auth-Token", "fresh"))
        .expect(2)
        .mount(&server)
        .await;

    let auth = Arc::new(PasswordAuth::new("user", "pass").with_token_ttl(3600));
    let client = client_with_auth(&server.uri(), WS_URL, fast_stream_config(), auth.clone());

    assert_eq!(assert_ok!(client.auth_token().await), "fresh");
    let data = auth.store().token_data().expect("token stored");
    assert_eq!((data.expires_at - data.obtained_at).num_seconds(), 3600);

    auth.store().clear();
    assert!(auth.token().is_none());
    assert_eq!(assert_ok!(client.auth_token().await), "fresh");
}

#[tokio::test]
async fn test_static_token_never_logs_in() {
    let client = assert_ok!(RofexClient::with_token(""));
    assert!(matches!(client.auth_token().await, Err(RofexError::Unauthorized)));
    assert!(matches!(client.accounts().await, Err(RofexError::Unauthorized)));
}
