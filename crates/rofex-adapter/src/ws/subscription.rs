/*
[INPUT]:  Validated MarketDataRequest / OrderReportRequest and a parent cancel token
[OUTPUT]: Subscription handles exposing event and error receivers
[POS]:    WebSocket layer - public streaming surface
[UPDATE]: When adding subscription kinds or handle operations
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::http::{Result, RofexClient, RofexError};
use crate::types::{
    MarketDataEvent, MarketDataRequest, MdEntry, OrderReportEvent, OrderReportRequest,
};
use crate::ws::manager;

/// Lifecycle of the connection behind a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connecting,
    SubscribeSent,
    Streaming,
    /// Between a failure and the next connect attempt
    Disconnected,
    /// Closed by the caller; terminal
    Cancelled,
    /// Stopped on a non-recoverable error; terminal
    Failed,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Cancelled | StreamState::Failed)
    }
}

/// What a subscription is listening to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    MarketData {
        products: Vec<String>,
        entries: Vec<MdEntry>,
        depth: u32,
    },
    OrderReports {
        account: String,
        snapshot_only_active: bool,
    },
}

/// Handle to a running stream.
///
/// Both receivers close once the manager stops. A clean stop closes `errors`
/// without delivering anything; a failure delivers one error first.
/// Dropping the handle cancels the stream.
#[derive(Debug)]
pub struct Subscription<E> {
    pub events: mpsc::Receiver<E>,
    pub errors: mpsc::Receiver<RofexError>,
    target: StreamTarget,
    cancel: CancellationToken,
    state: watch::Receiver<StreamState>,
    dropped: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

pub type MarketDataSubscription = Subscription<MarketDataEvent>;
pub type OrderReportSubscription = Subscription<OrderReportEvent>;

impl<E> Subscription<E> {
    pub(crate) fn new(
        channels: (mpsc::Receiver<E>, mpsc::Receiver<RofexError>),
        target: StreamTarget,
        cancel: CancellationToken,
        state: watch::Receiver<StreamState>,
        dropped: Arc<AtomicU64>,
        task: JoinHandle<()>,
    ) -> Self {
        let (events, errors) = channels;
        Self {
            events,
            errors,
            target,
            cancel,
            state,
            dropped,
            task: Some(task),
        }
    }

    pub fn target(&self) -> &StreamTarget {
        &self.target
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// Events discarded because the channel was full under drop-on-full delivery.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the stream. Calling it again has no effect.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            debug!(target = ?self.target, "closing subscription");
            self.cancel.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Close and wait until the connection is torn down.
    pub async fn shutdown(&mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl RofexClient {
    /// Stream market data for `request.symbols`.
    ///
    /// Returns at once; connecting happens in a background task, so this must
    /// be called inside a Tokio runtime. Cancelling `parent` stops the stream.
    pub fn subscribe_market_data(
        &self,
        parent: &CancellationToken,
        request: MarketDataRequest,
    ) -> Result<MarketDataSubscription> {
        request.validate()?;
        let message = serde_json::to_value(request.to_message())?;
        let target = StreamTarget::MarketData {
            products: request.symbols.clone(),
            entries: request.entries.clone(),
            depth: request.effective_depth(),
        };
        info!(
            symbols = ?request.symbols,
            entries = %MdEntry::join(&request.entries),
            depth = request.effective_depth(),
            market = %request.market,
            "subscribing to market data"
        );
        Ok(manager::spawn(self.clone(), parent, target, message))
    }

    /// Stream execution reports for one account.
    pub fn subscribe_order_reports(
        &self,
        parent: &CancellationToken,
        request: OrderReportRequest,
    ) -> Result<OrderReportSubscription> {
        request.validate()?;
        let message = serde_json::to_value(request.to_message())?;
        let target = StreamTarget::OrderReports {
            account: request.account.clone(),
            snapshot_only_active: request.snapshot_only_active,
        };
        info!(
            account = %request.account,
            snapshot_only_active = request.snapshot_only_active,
            "subscribing to order reports"
        );
        Ok(manager::spawn(self.clone(), parent, target, message))
    }
}
