/*
[INPUT]:  Environment choice, endpoint overrides, timeouts, stream tuning
[OUTPUT]: Immutable ClientConfig/StreamConfig shared by every component
[POS]:    Configuration layer - built once, passed by reference
[UPDATE]: When adding connection options or stream policies
*/

use std::env;
use std::time::Duration;

use url::Url;

use crate::http::{Result, RofexError};
use crate::types::Environment;

pub const REMARKET_BASE_URL: &str = "https://api.remarkets.primary.com.ar/";
pub const REMARKET_WS_URL: &str = "wss://api.remarkets.primary.com.ar/";
pub const REMARKET_PROPRIETARY: &str = "PBCP";
pub const LIVE_PROPRIETARY: &str = "api";
pub const DEFAULT_USER_AGENT: &str = concat!("rofex-adapter/", env!("CARGO_PKG_VERSION"));

/// What the read loop does when the event channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Wait for the consumer; backpressure reaches the socket read.
    #[default]
    Block,
    /// Discard the incoming event and count it.
    DropNewest,
}

/// Tuning for streaming subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// Event channel capacity
    pub buffer: usize,
    /// Error channel capacity
    pub error_buffer: usize,
    pub delivery: DeliveryPolicy,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Consecutive connect/subscribe failures before giving up
    pub max_retries: u32,
    pub keepalive_interval: Duration,
    pub ping_timeout: Duration,
    /// Bound on the TCP connect plus WebSocket upgrade
    pub handshake_timeout: Duration,
    /// Bound on sending the close frame during teardown
    pub close_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer: 128,
            error_buffer: 5,
            delivery: DeliveryPolicy::Block,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            max_retries: 10,
            keepalive_interval: Duration::from_secs(25),
            ping_timeout: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(2),
        }
    }
}

impl StreamConfig {
    /// Non-positive sizes are ignored and the current value kept.
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        if buffer > 0 {
            self.buffer = buffer;
        }
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn drop_on_full(self, enabled: bool) -> Self {
        self.with_delivery(if enabled {
            DeliveryPolicy::DropNewest
        } else {
            DeliveryPolicy::Block
        })
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_keepalive(mut self, interval: Duration, ping_timeout: Duration) -> Self {
        self.keepalive_interval = interval;
        self.ping_timeout = ping_timeout;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer == 0 || self.error_buffer == 0 {
            return Err(RofexError::Config("stream buffers must be positive".to_string()));
        }
        if self.max_retries == 0 {
            return Err(RofexError::Config("max_retries must be positive".to_string()));
        }
        if self.initial_backoff.is_zero() || self.max_backoff < self.initial_backoff {
            return Err(RofexError::Config(format!(
                "invalid backoff range {:?}..{:?}",
                self.initial_backoff, self.max_backoff
            )));
        }
        if self.keepalive_interval.is_zero() || self.ping_timeout.is_zero() {
            return Err(RofexError::Config("keepalive durations must be positive".to_string()));
        }
        if self.handshake_timeout.is_zero() {
            return Err(RofexError::Config("handshake_timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Client configuration.
///
/// URLs and proprietary left as `None` take the environment default;
/// the live environment has no default URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub environment: Environment,
    pub base_url: Option<String>,
    pub ws_url: Option<String>,
    pub proprietary: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub stream: StreamConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::remarket()
    }
}

impl ClientConfig {
    /// reMarkets sandbox with default endpoints.
    pub fn remarket() -> Self {
        Self {
            environment: Environment::Remarket,
            base_url: None,
            ws_url: None,
            proprietary: None,
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            stream: StreamConfig::default(),
        }
    }

    /// Production; the broker supplies both endpoints.
    pub fn live(base_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            environment: Environment::Live,
            base_url: Some(base_url.into()),
            ws_url: Some(ws_url.into()),
            ..Self::remarket()
        }
    }

    /// Reads `PRIMARY_ENV`, `PRIMARY_BASE_URL`, `PRIMARY_WS_URL` and
    /// `PRIMARY_PROPRIETARY`. Missing variables keep the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::remarket();
        if let Ok(raw) = env::var("PRIMARY_ENV") {
            config.environment = raw.parse().map_err(RofexError::Config)?;
        }
        if let Ok(url) = env::var("PRIMARY_BASE_URL") {
            config.base_url = Some(url);
        }
        if let Ok(url) = env::var("PRIMARY_WS_URL") {
            config.ws_url = Some(url);
        }
        if let Ok(proprietary) = env::var("PRIMARY_PROPRIETARY") {
            config.proprietary = Some(proprietary);
        }
        Ok(config)
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    pub fn with_proprietary(mut self, proprietary: impl Into<String>) -> Self {
        self.proprietary = Some(proprietary.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_stream(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    pub(crate) fn resolve(&self) -> Result<ResolvedEndpoints> {
        self.stream.validate()?;

        let (base, ws) = match self.environment {
            Environment::Remarket => (
                self.base_url.clone().unwrap_or_else(|| REMARKET_BASE_URL.to_string()),
                self.ws_url.clone().unwrap_or_else(|| REMARKET_WS_URL.to_string()),
            ),
            Environment::Live => {
                let base = self.base_url.clone().unwrap_or_default();
                let ws = self.ws_url.clone().unwrap_or_default();
                if base.trim().is_empty() || ws.trim().is_empty() {
                    return Err(RofexError::Config(
                        "live environment requires explicit base and websocket URLs".to_string(),
                    ));
                }
                if base.contains("remarkets") || ws.contains("remarkets") {
                    return Err(RofexError::Config(
                        "live environment cannot point at reMarkets endpoints".to_string(),
                    ));
                }
                (base, ws)
            }
        };

        let proprietary = match self.proprietary.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => match self.environment {
                Environment::Remarket => REMARKET_PROPRIETARY.to_string(),
                Environment::Live => LIVE_PROPRIETARY.to_string(),
            },
        };

        Ok(ResolvedEndpoints {
            base_url: parse_with_trailing_slash(&base)?,
            ws_url: parse_with_trailing_slash(&ws)?,
            proprietary,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedEndpoints {
    pub base_url: Url,
    pub ws_url: Url,
    pub proprietary: String,
}

fn parse_with_trailing_slash(raw: &str) -> Result<Url> {
    let mut value = raw.trim().to_string();
    if !value.ends_with('/') {
        value.push('/');
    }
    Ok(Url::parse(&value)?)
}
