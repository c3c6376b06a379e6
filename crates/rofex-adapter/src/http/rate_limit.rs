/*
[INPUT]:  Request routes and configured quotas
[OUTPUT]: Awaitable permits pacing outgoing REST calls
[POS]:    HTTP layer - pluggable client-side rate limiting
[UPDATE]: When adding quota shapes or limiter hooks
*/

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::http::Result;

/// Paces outgoing requests.
///
/// `wait` is awaited before the login POST, every GET and the resend after a
/// token refresh. An error aborts the request and is returned to the caller.
#[async_trait]
pub trait RateLimiter: Send + Sync + fmt::Debug {
    async fn wait(&self, route: &str) -> Result<()>;
}

/// Allowed burst plus steady replenish interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    burst: NonZeroU32,
    replenish: Duration,
}

impl Quota {
    pub fn per_second(max: NonZeroU32) -> Self {
        Self::with_period(Duration::from_secs(1), max)
    }

    pub fn per_minute(max: NonZeroU32) -> Self {
        Self::with_period(Duration::from_secs(60), max)
    }

    /// `max` requests spread over `period`, all of them usable as a burst.
    pub fn with_period(period: Duration, max: NonZeroU32) -> Self {
        Self {
            burst: max,
            replenish: period / max.get(),
        }
    }

    pub fn burst(&self) -> NonZeroU32 {
        self.burst
    }

    pub fn replenish_interval(&self) -> Duration {
        self.replenish
    }
}

/// Theoretical arrival time bookkeeping for one quota.
#[derive(Debug)]
struct Cell {
    quota: Quota,
    tat: Option<Instant>,
}

impl Cell {
    fn new(quota: Quota) -> Self {
        Self { quota, tat: None }
    }

    /// Reserve one permit and return how long to wait for it.
    fn reserve(&mut self, now: Instant) -> Duration {
        let tolerance = self.quota.replenish * (self.quota.burst.get() - 1);
        let tat = self.tat.map_or(now, |tat| tat.max(now));
        self.tat = Some(tat + self.quota.replenish);
        tat.saturating_duration_since(now + tolerance)
    }
}

/// Keyed quota limiter.
///
/// Every request consumes from the default quota (when set) and from the
/// quota of its route (when one is registered); the longest wait applies.
#[derive(Debug, Default)]
pub struct QuotaLimiter {
    default: Option<Mutex<Cell>>,
    routes: HashMap<String, Mutex<Cell>>,
}

impl QuotaLimiter {
    pub fn new(default: Quota) -> Self {
        Self {
            default: Some(Mutex::new(Cell::new(default))),
            routes: HashMap::new(),
        }
    }

    /// Only the registered routes are limited.
    pub fn keyed(quotas: impl IntoIterator<Item = (String, Quota)>) -> Self {
        Self::default().with_routes(quotas)
    }

    pub fn with_route(mut self, route: impl Into<String>, quota: Quota) -> Self {
        self.routes.insert(route.into(), Mutex::new(Cell::new(quota)));
        self
    }

    pub fn with_routes(mut self, quotas: impl IntoIterator<Item = (String, Quota)>) -> Self {
        for (route, quota) in quotas {
            self.routes.insert(route, Mutex::new(Cell::new(quota)));
        }
        self
    }

    fn reserve(&self, route: &str) -> Duration {
        let now = Instant::now();
        let route = route.split('?').next().unwrap_or(route);
        [self.default.as_ref(), self.routes.get(route)]
            .into_iter()
            .flatten()
            .map(|cell| cell.lock().unwrap_or_else(PoisonError::into_inner).reserve(now))
            .max()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RateLimiter for QuotaLimiter {
    async fn wait(&self, route: &str) -> Result<()> {
        let delay = self.reserve(route);
        if !delay.is_zero() {
            debug!(route, delay_ms = delay.as_millis() as u64, "rate limited");
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}
