/*
[INPUT]:  ClientConfig (environment, endpoints, timeouts) and an AuthProvider
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::{AUTH_HEADER, AuthProvider, PasswordAuth, StaticTokenAuth};
use crate::config::{ClientConfig, ResolvedEndpoints, StreamConfig};
use crate::http::{RateLimiter, Result, RofexError};
use crate::types::Environment;

/// Main client for the Primary API
#[derive(Debug, Clone)]
pub struct RofexClient {
    http_client: Client,
    endpoints: Arc<ResolvedEndpoints>,
    config: Arc<ClientConfig>,
    auth: Arc<dyn AuthProvider>,
    limiter: Option<Arc<dyn RateLimiter>>,
}

impl RofexClient {
    /// reMarkets client with username/password login
    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_config(
            ClientConfig::default(),
            Arc::new(PasswordAuth::new(username, password)),
        )
    }

    /// reMarkets client with a pre-issued token
    pub fn with_token(token: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::default(), Arc::new(StaticTokenAuth::new(token)))
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, auth: Arc<dyn AuthProvider>) -> Result<Self> {
        let endpoints = config.resolve()?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        if config.environment == Environment::Remarket {
            info!(
                base_url = %endpoints.base_url,
                "using reMarkets sandbox environment"
            );
        }

        Ok(Self {
            http_client,
            endpoints: Arc::new(endpoints),
            config: Arc::new(config),
            auth,
            limiter: None,
        })
    }

    /// Pace the login POST and every GET (including the resend after a
    /// refresh) through `limiter`. Unlimited by default.
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    pub fn base_url(&self) -> &Url {
        &self.endpoints.base_url
    }

    pub fn ws_url(&self) -> &Url {
        &self.endpoints.ws_url
    }

    /// Proprietary used when a call leaves it blank
    pub fn proprietary(&self) -> &str {
        &self.endpoints.proprietary
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stream_config(&self) -> &StreamConfig {
        &self.config.stream
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    pub fn rate_limiter(&self) -> Option<&Arc<dyn RateLimiter>> {
        self.limiter.as_ref()
    }

    /// Wait for the rate limiter, if one is installed.
    pub(crate) async fn throttle(&self, route: &str) -> Result<()> {
        match &self.limiter {
            Some(limiter) => limiter.wait(route).await,
            None => Ok(()),
        }
    }

    /// Current token, logging in first when none is held.
    pub async fn auth_token(&self) -> Result<String> {
        if let Some(token) = self.auth.token() {
            return Ok(token);
        }
        self.auth.refresh(self).await?;
        self.auth.token().ok_or(RofexError::Unauthorized)
    }

    /// Pick the caller's proprietary or fall back to the configured one.
    pub(crate) fn proprietary_or_default(&self, proprietary: Option<&str>) -> String {
        match proprietary.map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => self.endpoints.proprietary.clone(),
        }
    }

    /// Build full URL for an endpoint relative to the base URL
    pub(crate) fn endpoint_url(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.endpoints.base_url.join(endpoint)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }

    /// Build request builder for an endpoint relative to the base URL
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.endpoints.base_url.join(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Authenticated GET decoded into `T`.
    ///
    /// A 401 triggers one token refresh and one resend.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let token = self.auth_token().await?;
        let mut response = self.send_get(&url, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(path = url.path(), "token rejected, refreshing");
            self.auth.refresh(self).await?;
            let token = self.auth.token().ok_or(RofexError::Unauthorized)?;
            response = self
                .send_get(&url, &token)
                .await
                .map_err(|err| RofexError::Temporary {
                    message: format!("retry after token refresh failed: {err}"),
                })?;
        }

        self.send_json(response).await
    }

    async fn send_get(&self, url: &Url, token: &str) -> Result<Response> {
        let route = url
            .path()
            .strip_prefix(self.endpoints.base_url.path())
            .unwrap_or(url.path());
        self.throttle(route).await?;
        debug!(path = url.path(), "GET");
        let response = self
            .http_client
            .get(url.clone())
            .header(AUTH_HEADER, token)
            .send()
            .await?;
        Ok(response)
    }

    /// Decode a 2xx body, or surface status and body.
    async fn send_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(RofexError::status(
                status,
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
