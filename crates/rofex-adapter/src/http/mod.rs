/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod account;
pub mod candles;
pub mod client;
pub mod error;
pub mod market_data;
pub mod orders;
pub mod rate_limit;
pub mod reference;

pub use candles::{aggregate_candles, floor_time};
pub use client::RofexClient;
pub use error::{Result, RofexError};
pub use rate_limit::{Quota, QuotaLimiter, RateLimiter};
