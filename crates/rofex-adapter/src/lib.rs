/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Primary/ROFEX adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod config;
pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{AuthProvider, PasswordAuth, StaticTokenAuth, TokenData, TokenStore};

// Re-export configuration
pub use config::{ClientConfig, DeliveryPolicy, StreamConfig};

// Re-export commonly used types from http
pub use http::{
    Quota, QuotaLimiter, RateLimiter, Result, RofexClient, RofexError, aggregate_candles,
    floor_time,
};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    MarketDataSubscription, OrderReportSubscription, StreamState, StreamTarget, Subscription,
};

pub use tokio_util::sync::CancellationToken;
