/*
[INPUT]:  Username/password or a pre-issued token, HTTP client
[OUTPUT]: Session token applied as X-Auth-Token on every request
[POS]:    Auth layer - login flow and token providers
[UPDATE]: When auth endpoints or token handling change
*/

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, info};

use crate::http::{Result, RofexClient, RofexError};

use super::token::{DEFAULT_TOKEN_TTL_SECONDS, TokenStore};

pub const AUTH_HEADER: &str = "X-Auth-Token";
pub const USERNAME_HEADER: &str = "X-Username";
pub const PASSWORD_HEADER: &str = "X-Password";

const LOGIN_ENDPOINT: &str = "auth/getToken";

/// Source of the session token.
#[async_trait]
pub trait AuthProvider: Send + Sync + std::fmt::Debug {
    /// Current valid token, if any.
    fn token(&self) -> Option<String>;

    /// Obtain a fresh token.
    async fn refresh(&self, client: &RofexClient) -> Result<()>;
}

/// Username/password login against `auth/getToken`.
pub struct PasswordAuth {
    username: String,
    password: String,
    store: TokenStore,
    ttl_seconds: u64,
}

impl std::fmt::Debug for PasswordAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .field("has_token", &self.store.get_token().is_some())
            .finish()
    }
}

impl PasswordAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            store: TokenStore::new(),
            ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    /// Override how long a token is trusted before refreshing.
    pub fn with_token_ttl(mut self, seconds: u64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[async_trait]
impl AuthProvider for PasswordAuth {
    fn token(&self) -> Option<String> {
        self.store.get_token()
    }

    async fn refresh(&self, client: &RofexClient) -> Result<()> {
        debug!(username = %self.username, "requesting session token");
        client.throttle(LOGIN_ENDPOINT).await?;
        let response = client
            .request(Method::POST, LOGIN_ENDPOINT)?
            .header(USERNAME_HEADER, &self.username)
            .header(PASSWORD_HEADER, &self.password)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RofexError::status(status, body));
        }

        let token = response
            .headers()
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| RofexError::Authentication {
                message: format!("login response missing {AUTH_HEADER} header"),
            })?
            .to_string();

        self.store.set_token(token, self.ttl_seconds);
        info!(username = %self.username, "session token obtained");
        Ok(())
    }
}

/// Pre-issued token, never refreshed.
#[derive(Clone)]
pub struct StaticTokenAuth {
    token: String,
}

impl std::fmt::Debug for StaticTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuth")
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    fn token(&self) -> Option<String> {
        let token = self.token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    async fn refresh(&self, _client: &RofexClient) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(RofexError::Unauthorized);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer, auth: Arc<dyn AuthProvider>) -> RofexClient {
        let config = ClientConfig::remarket()
            .with_base_url(server.uri())
            .with_ws_url("ws://127.0.0.1:9/");
        RofexClient::with_config(config, auth).unwrap()
    }

    #[tokio::test]
    async fn test_password_login_reads_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/getToken"))
            .and(header(USERNAME_HEADER, "user"))
            .and(header(PASSWORD_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).insert_header(AUTH_HEADER, "tok-1"))
            .expect(1)
            .mount(&server)
            .await;

        let auth = Arc::new(PasswordAuth::new("user", "secret"));
        let client = client_for(&server, auth.clone()).await;

        assert!(auth.token().is_none());
        auth.refresh(&client).await.unwrap();
        assert_eq!(auth.token().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_password_login_missing_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/getToken"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let auth = Arc::new(PasswordAuth::new("user", "secret"));
        let client = client_for(&server, auth.clone()).await;

        let err = auth.refresh(&client).await.unwrap_err();
        assert!(matches!(err, RofexError::Authentication { .. }));
        assert!(auth.token().is_none());
    }

    #[tokio::test]
    async fn test_password_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/getToken"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let auth = Arc::new(PasswordAuth::new("user", "wrong"));
        let client = client_for(&server, auth.clone()).await;

        match auth.refresh(&client).await {
            Err(RofexError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad credentials");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_static_token() {
        let server = MockServer::start().await;
        let empty = Arc::new(StaticTokenAuth::new(""));
        let client = client_for(&server, empty.clone()).await;

        assert!(empty.token().is_none());
        assert!(matches!(
            empty.refresh(&client).await,
            Err(RofexError::Unauthorized)
        ));

        let fixed = StaticTokenAuth::new("fixed");
        assert_eq!(fixed.token().as_deref(), Some("fixed"));
        assert!(fixed.refresh(&client).await.is_ok());
    }

    #[test]
    fn test_debug_hides_password() {
        let auth = PasswordAuth::new("user", "secret");
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("secret"));
    }
}
