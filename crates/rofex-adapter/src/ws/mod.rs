/*
[INPUT]:  WebSocket URL, auth token and subscription requests
[OUTPUT]: Reconnecting market data and order report streams
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When adding stream kinds or changing connection logic
*/

pub mod backoff;
pub mod classify;
pub mod connection;
mod manager;
pub mod orders;
pub mod subscription;

pub use backoff::Backoff;
pub use classify::is_recoverable;
pub use connection::StreamConnection;
pub use subscription::{
    MarketDataSubscription, OrderReportSubscription, StreamState, StreamTarget, Subscription,
};
