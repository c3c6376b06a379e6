/*
[INPUT]:  RofexClient, a serialized subscribe message, StreamConfig, cancel token
[OUTPUT]: Typed events and terminal errors pushed to a Subscription's channels
[POS]:    WebSocket layer - connect/subscribe/read/reconnect loop and keepalive
[UPDATE]: When changing reconnect policy, delivery policy or keepalive
*/

use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{DeliveryPolicy, StreamConfig};
use crate::http::{Result, RofexClient, RofexError};
use crate::types::{Envelope, StreamEvent};
use crate::ws::backoff::Backoff;
use crate::ws::classify::is_recoverable;
use crate::ws::connection::StreamConnection;
use crate::ws::subscription::{StreamState, StreamTarget, Subscription};

const SKIPPED_LOG_LIMIT: usize = 3;
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const MESSAGE_SAMPLE_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

/// Start a manager task and hand back its subscription.
pub(crate) fn spawn<E: StreamEvent>(
    client: RofexClient,
    parent: &CancellationToken,
    target: StreamTarget,
    subscribe: serde_json::Value,
) -> Subscription<E> {
    let config = client.stream_config().clone();
    let (events_tx, events_rx) = mpsc::channel(config.buffer);
    let (errors_tx, errors_rx) = mpsc::channel(config.error_buffer);
    let (state_tx, state_rx) = watch::channel(StreamState::Idle);
    let cancel = parent.child_token();
    let dropped = Arc::new(AtomicU64::new(0));

    let manager = StreamManager {
        client,
        subscribe,
        events: events_tx,
        errors: errors_tx,
        state: state_tx,
        cancel: cancel.clone(),
        dropped: dropped.clone(),
        config,
        samples: LogSamples::default(),
        _event: PhantomData,
    };
    let task = tokio::spawn(manager.run());

    Subscription::new((events_rx, errors_rx), target, cancel, state_rx, dropped, task)
}

#[derive(Debug, Default)]
struct LogSamples {
    delivered: usize,
    skipped: usize,
    parse_failures: usize,
}

fn next_sample(counter: &mut usize, limit: usize) -> Option<usize> {
    if *counter >= limit {
        return None;
    }
    *counter += 1;
    Some(*counter)
}

struct StreamManager<E: StreamEvent> {
    client: RofexClient,
    subscribe: serde_json::Value,
    events: mpsc::Sender<E>,
    errors: mpsc::Sender<RofexError>,
    state: watch::Sender<StreamState>,
    cancel: CancellationToken,
    dropped: Arc<AtomicU64>,
    config: StreamConfig,
    samples: LogSamples,
    _event: PhantomData<fn() -> E>,
}

impl<E: StreamEvent> StreamManager<E> {
    /// Runs until cancelled or a terminal error. Dropping `self` on return
    /// closes both channels.
    async fn run(mut self) {
        let mut backoff = Backoff::from_config(&self.config);

        loop {
            if self.cancel.is_cancelled() {
                self.set_state(StreamState::Cancelled);
                return;
            }
            self.set_state(StreamState::Connecting);

            let token = tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.set_state(StreamState::Cancelled);
                    return;
                }
                token = self.client.auth_token() => token,
            };
            let token = match token {
                Ok(token) => token,
                Err(err) => {
                    error!(kind = %E::KIND, error = %err, "stream auth failed");
                    self.fail(err);
                    return;
                }
            };

            let conn = Arc::new(StreamConnection::new(
                self.client.ws_url().clone(),
                token,
                self.cancel.child_token(),
                &self.config,
            ));

            if let Err(err) = conn.connect().await {
                if self.retry(&mut backoff, err).await.is_break() {
                    return;
                }
                continue;
            }

            self.set_state(StreamState::SubscribeSent);
            if let Err(err) = conn.write_json(&self.subscribe).await {
                self.teardown(&conn).await;
                if self.retry(&mut backoff, err).await.is_break() {
                    return;
                }
                continue;
            }

            backoff.reset();
            self.set_state(StreamState::Streaming);
            info!(kind = %E::KIND, url = %self.client.ws_url(), "stream subscribed");

            let outcome = self.stream(&conn).await;
            self.teardown(&conn).await;

            let err = match outcome {
                Ok(()) => {
                    self.set_state(StreamState::Cancelled);
                    return;
                }
                Err(_) if self.cancel.is_cancelled() => {
                    self.set_state(StreamState::Cancelled);
                    return;
                }
                Err(err) => err,
            };

            self.set_state(StreamState::Disconnected);
            if !is_recoverable(&err) {
                error!(kind = %E::KIND, error = %err, "stream stopped");
                self.fail(err);
                return;
            }

            let delay = backoff.advance();
            warn!(
                kind = %E::KIND,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "stream interrupted, reconnecting"
            );
            if self.sleep(delay).await.is_break() {
                return;
            }
        }
    }

    /// Count a connect/subscribe failure and wait before the next attempt.
    async fn retry(&mut self, backoff: &mut Backoff, err: RofexError) -> ControlFlow<()> {
        if self.cancel.is_cancelled() {
            self.set_state(StreamState::Cancelled);
            return ControlFlow::Break(());
        }
        self.set_state(StreamState::Disconnected);

        let Some(delay) = backoff.record_failure() else {
            error!(
                kind = %E::KIND,
                attempts = backoff.retries(),
                error = %err,
                "reconnect attempts exhausted"
            );
            self.fail(RofexError::MaxRetriesExceeded {
                source: Box::new(err),
            });
            return ControlFlow::Break(());
        };

        warn!(
            kind = %E::KIND,
            attempt = backoff.retries(),
            max_retries = backoff.max_retries(),
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "stream connect failed, retrying"
        );
        self.sleep(delay).await
    }

    async fn sleep(&mut self, delay: Duration) -> ControlFlow<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => {
                self.set_state(StreamState::Cancelled);
                ControlFlow::Break(())
            }
            _ = tokio::time::sleep(delay) => ControlFlow::Continue(()),
        }
    }

    /// Read loop with keepalive running beside it.
    ///
    /// `Ok(())` means cancellation or a gone consumer; errors come straight
    /// from the connection or the decoder.
    async fn stream(&mut self, conn: &Arc<StreamConnection>) -> Result<()> {
        let session = conn.cancel_token().child_token();
        let _keepalive_guard = session.clone().drop_guard();
        tokio::spawn(keepalive(
            conn.clone(),
            session,
            self.config.keepalive_interval,
            self.config.ping_timeout,
        ));

        loop {
            let Some(text) = conn.read_text().await? else {
                return Ok(());
            };

            let envelope: Envelope = match serde_json::from_str(&text) {
                Ok(envelope) => envelope,
                Err(err) => {
                    self.log_parse_failure(&err, &text);
                    return Err(err.into());
                }
            };
            if envelope.kind() != Some(E::KIND) {
                self.log_skipped(&envelope, &text);
                continue;
            }

            let event: E = match serde_json::from_str(&text) {
                Ok(event) => event,
                Err(err) => {
                    self.log_parse_failure(&err, &text);
                    return Err(err.into());
                }
            };
            if let Some(index) = next_sample(&mut self.samples.delivered, MESSAGE_SAMPLE_LIMIT) {
                debug!(
                    sample_index = index,
                    sample_limit = MESSAGE_SAMPLE_LIMIT,
                    kind = %E::KIND,
                    timestamp = envelope.timestamp,
                    "ws message sample"
                );
            }
            if self.deliver(event).await.is_break() {
                return Ok(());
            }
        }
    }

    async fn deliver(&self, event: E) -> ControlFlow<()> {
        match self.config.delivery {
            DeliveryPolicy::Block => tokio::select! {
                _ = self.cancel.cancelled() => ControlFlow::Break(()),
                sent = self.events.send(event) => match sent {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(_) => {
                        debug!(kind = %E::KIND, "event receiver dropped");
                        ControlFlow::Break(())
                    }
                },
            },
            DeliveryPolicy::DropNewest => match self.events.try_send(event) {
                Ok(()) => ControlFlow::Continue(()),
                Err(TrySendError::Full(_)) => {
                    let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(kind = %E::KIND, dropped_total = total, "event channel full, dropping event");
                    ControlFlow::Continue(())
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(kind = %E::KIND, "event receiver dropped");
                    ControlFlow::Break(())
                }
            },
        }
    }

    fn fail(&self, err: RofexError) {
        if let Err(TrySendError::Full(err)) = self.errors.try_send(err) {
            warn!(error = %err, "error channel full, dropping error");
        }
        self.set_state(StreamState::Failed);
    }

    async fn teardown(&self, conn: &StreamConnection) {
        if let Err(err) = conn.disconnect().await {
            debug!(error = %err, "stream teardown failed");
        }
    }

    fn set_state(&self, next: StreamState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(kind = %E::KIND, from = ?previous, to = ?next, "stream state");
        }
    }

    fn log_skipped(&mut self, envelope: &Envelope, raw: &str) {
        if let Some(index) = next_sample(&mut self.samples.skipped, SKIPPED_LOG_LIMIT) {
            debug!(
                sample_index = index,
                sample_limit = SKIPPED_LOG_LIMIT,
                expected = %E::KIND,
                received = envelope.message_type.as_deref().unwrap_or(""),
                message = %truncate_for_log(raw, RAW_LOG_MAX_BYTES),
                "ws message type not forwarded"
            );
        }
    }

    fn log_parse_failure(&mut self, err: &serde_json::Error, raw: &str) {
        if let Some(index) = next_sample(&mut self.samples.parse_failures, PARSE_FAIL_LOG_LIMIT) {
            warn!(
                sample_index = index,
                sample_limit = PARSE_FAIL_LOG_LIMIT,
                error = %err,
                bytes = raw.len(),
                message = %truncate_for_log(raw, RAW_LOG_MAX_BYTES),
                "ws message parse failed"
            );
        }
    }
}

/// Ping on a fixed interval until the session ends or a ping fails.
async fn keepalive(
    conn: Arc<StreamConnection>,
    session: CancellationToken,
    interval: Duration,
    ping_timeout: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    loop {
        tokio::select! {
            _ = session.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            _ = session.cancelled() => return,
            outcome = tokio::time::timeout(ping_timeout, conn.ping()) => outcome,
        };
        match outcome {
            Ok(Ok(())) => debug!("keepalive pong"),
            Ok(Err(err)) => {
                warn!(error = %err, "keepalive ping failed");
                return;
            }
            Err(_) => {
                warn!(timeout_ms = ping_timeout.as_millis() as u64, "keepalive pong timed out");
                return;
            }
        }
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &value[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("abcdef", 3), "abc...");
        assert_eq!(truncate_for_log("añb", 2), "a...");
    }

    #[test]
    fn test_next_sample_stops_at_limit() {
        let mut counter = 0;
        let samples: Vec<Option<usize>> = (0..4).map(|_| next_sample(&mut counter, 3)).collect();
        assert_eq!(samples, vec![Some(1), Some(2), Some(3), None]);
    }
}
