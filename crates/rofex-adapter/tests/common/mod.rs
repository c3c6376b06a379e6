/*
[INPUT]:  Test configuration, mock REST responses and scripted WebSocket sessions
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for rofex-adapter tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rofex_adapter::{AuthProvider, ClientConfig, RofexClient, StaticTokenAuth, StreamConfig};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Stream tuning that keeps reconnect tests fast.
pub fn fast_stream_config() -> StreamConfig {
    StreamConfig::default()
        .with_backoff(Duration::from_millis(5), Duration::from_millis(20))
        .with_keepalive(Duration::from_secs(30), Duration::from_secs(5))
}

pub fn client_config(base_url: &str, ws_url: &str, stream: StreamConfig) -> ClientConfig {
    ClientConfig::remarket()
        .with_base_url(base_url)
        .with_ws_url(ws_url)
        .with_stream(stream)
}

/// Client with a fixed token against the given endpoints.
pub fn token_client(base_url: &str, ws_url: &str, stream: StreamConfig) -> RofexClient {
    client_with_auth(
        base_url,
        ws_url,
        stream,
        Arc::new(StaticTokenAuth::new(TEST_TOKEN)),
    )
}

pub fn client_with_auth(
    base_url: &str,
    ws_url: &str,
    stream: StreamConfig,
    auth: Arc<dyn AuthProvider>,
) -> RofexClient {
    RofexClient::with_config(client_config(base_url, ws_url, stream), auth)
        .expect("client config should be valid")
}

/// How a scripted WebSocket connection behaves.
#[derive(Debug, Clone)]
pub enum Script {
    /// Drop the TCP connection before the handshake.
    RejectHandshake,
    /// Accept the TCP connection and never answer the upgrade.
    StallHandshake,
    /// Accept, read the first client message, send `frames`, then `end`.
    Serve { frames: Vec<String>, end: End },
}

#[derive(Debug, Clone, Copy)]
pub enum End {
    /// Send a close frame with this code.
    Close(u16),
    /// Drop the socket without a close frame.
    Abrupt,
    /// Keep reading until the client closes.
    Hold,
    /// Stop reading for a while (no pongs go out), then `Hold`.
    Stall(Duration),
}

/// What the server observed.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Connected { auth_token: Option<String> },
    Received(String),
    Ping,
    ClientClosed(Option<u16>),
}

pub struct WsServer {
    pub url: String,
    pub events: mpsc::UnboundedReceiver<ServerEvent>,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl WsServer {
    /// Number of TCP connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Next observed event, failing the test after two seconds.
    pub async fn next_event(&mut self) -> ServerEvent {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("server event timed out")
            .expect("server stopped")
    }

    /// Pings observed among the events already queued.
    pub fn drain_pings(&mut self) -> usize {
        let mut pings = 0;
        while let Ok(event) = self.events.try_recv() {
            if event == ServerEvent::Ping {
                pings += 1;
            }
        }
        pings
    }

    /// Skip events until the client closes, returning its close code.
    pub async fn client_close_code(&mut self) -> Option<u16> {
        loop {
            if let ServerEvent::ClientClosed(code) = self.next_event().await {
                return code;
            }
        }
    }
}

impl Drop for WsServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start a WebSocket server on 127.0.0.1; `script` picks the behaviour for
/// each accepted connection by index.
pub async fn start_ws_server<F>(script: F) -> WsServer
where
    F: Fn(usize) -> Script + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (events_tx, events) = mpsc::unbounded_channel();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let index = counter.fetch_add(1, Ordering::SeqCst);
            let script = script(index);
            let events_tx = events_tx.clone();
            tokio::spawn(async move {
                let (frames, end) = match script {
                    Script::RejectHandshake => {
                        drop(stream);
                        return;
                    }
                    Script::StallHandshake => {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        drop(stream);
                        return;
                    }
                    Script::Serve { frames, end } => (frames, end),
                };

                let mut auth_token = None;
                let capture = |request: &Request,
                               response: Response|
                 -> Result<Response, ErrorResponse> {
                    auth_token = request
                        .headers()
                        .get("X-Auth-Token")
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    Ok(response)
                };
                let accepted = accept_hdr_async(stream, capture).await;
                let Ok(mut ws) = accepted else {
                    return;
                };
                let _ = events_tx.send(ServerEvent::Connected { auth_token });

                if let Some(Ok(Message::Text(first))) = ws.next().await {
                    let _ = events_tx.send(ServerEvent::Received(first.to_string()));
                }
                for frame in frames {
                    if ws.send(Message::Text(frame.into())).await.is_err() {
                        return;
                    }
                }

                match end {
                    End::Close(code) => {
                        let _ = ws
                            .close(Some(CloseFrame {
                                code: CloseCode::from(code),
                                reason: "scripted close".into(),
                            }))
                            .await;
                        while let Some(Ok(_)) = ws.next().await {}
                    }
                    End::Abrupt => drop(ws),
                    End::Hold => hold(&mut ws, &events_tx).await,
                    End::Stall(pause) => {
                        tokio::time::sleep(pause).await;
                        hold(&mut ws, &events_tx).await;
                    }
                }
            });
        }
    });

    WsServer {
        url: format!("ws://{addr}/"),
        events,
        connections,
        handle,
    }
}

/// Report text and pings until the client closes.
async fn hold<S>(ws: &mut WebSocketStream<S>, events_tx: &mpsc::UnboundedSender<ServerEvent>)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                let _ = events_tx.send(ServerEvent::Received(text.to_string()));
            }
            Some(Ok(Message::Ping(_))) => {
                let _ = events_tx.send(ServerEvent::Ping);
            }
            Some(Ok(Message::Close(frame))) => {
                let code = frame.map(|frame| u16::from(frame.code));
                let _ = events_tx.send(ServerEvent::ClientClosed(code));
                return;
            }
            Some(Ok(_)) => {}
            Some(Err(_)) | None => {
                let _ = events_tx.send(ServerEvent::ClientClosed(None));
                return;
            }
        }
    }
}

/// `md` frame for one symbol with a single bid level.
pub fn md_frame(message_type: &str, timestamp: i64) -> String {
    serde_json::json!({
        "type": message_type,
        "timestamp": timestamp,
        "instrumentId": {"marketId": "ROFX", "symbol": "DLR/DIC25"},
        "marketData": {
            "BI": [{"price": 1010.5, "size": 3}],
            "OF": null,
            "LA": {"price": 1011, "size": 1, "date": timestamp},
            "XX": "ignored"
        }
    })
    .to_string()
}

/// `or` frame for one order.
pub fn or_frame(timestamp: i64, cl_ord_id: &str, status: &str) -> String {
    serde_json::json!({
        "type": "or",
        "timestamp": timestamp,
        "orderReport": {
            "orderId": "1128056",
            "clOrdId": cl_ord_id,
            "proprietary": "PBCP",
            "execId": "160127155448-fix1-1368",
            "accountId": {"id": "30"},
            "instrumentId": {"marketId": "ROFX", "symbol": "DLR/DIC25"},
            "price": 1010.5,
            "orderQty": 10,
            "ordType": "LIMIT",
            "side": "BUY",
            "timeInForce": "DAY",
            "transactTime": "20250312-14:01:02.000-0300",
            "status": status,
            "text": "Aceptada"
        }
    })
    .to_string()
}

/// Await `future` or fail the test after two seconds.
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .expect("timed out")
}
