/*
[INPUT]:  WebSocket URL, auth token and a cancellation token
[OUTPUT]: One authenticated socket with cancel-aware read, write, ping and close
[POS]:    WebSocket layer - single connection owned by a stream manager
[UPDATE]: When changing handshake headers or teardown behavior
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AUTH_HEADER;
use crate::config::StreamConfig;
use crate::http::{Result, RofexError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code used when the peer sends a close without a frame.
const NO_STATUS_CODE: u16 = 1005;
/// Close code used when the transport ends without any close.
const ABNORMAL_CODE: u16 = 1006;

struct Socket {
    sink: Mutex<SplitSink<WsStream, Message>>,
    source: Mutex<SplitStream<WsStream>>,
}

/// One WebSocket connection.
///
/// Reads and writes lock separate halves, so the keepalive can ping while the
/// read loop is parked on the socket. Every wait observes the cancel token.
pub struct StreamConnection {
    url: Url,
    token: String,
    socket: RwLock<Option<Arc<Socket>>>,
    cancel: CancellationToken,
    pongs: Notify,
    handshake_timeout: Duration,
    close_timeout: Duration,
}

impl fmt::Debug for StreamConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConnection")
            .field("url", &self.url.as_str())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl StreamConnection {
    /// Handshake and close are bounded by the timeouts in `config`.
    pub fn new(
        url: Url,
        token: impl Into<String>,
        cancel: CancellationToken,
        config: &StreamConfig,
    ) -> Self {
        Self {
            url,
            token: token.into(),
            socket: RwLock::new(None),
            cancel,
            pongs: Notify::new(),
            handshake_timeout: config.handshake_timeout,
            close_timeout: config.close_timeout,
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn is_connected(&self) -> bool {
        self.socket.read().await.is_some()
    }

    /// Dial the server with the auth header attached.
    ///
    /// A handshake that outlives the timeout fails with `Temporary`.
    pub async fn connect(&self) -> Result<()> {
        let mut request = self.url.as_str().into_client_request()?;
        let token = HeaderValue::from_str(&self.token)
            .map_err(|err| RofexError::InvalidHeader(err.to_string()))?;
        request.headers_mut().insert(AUTH_HEADER, token);

        let handshake = tokio::time::timeout(self.handshake_timeout, connect_async(request));
        let (stream, response) = tokio::select! {
            _ = self.cancel.cancelled() => return Err(RofexError::Cancelled),
            result = handshake => match result {
                Ok(result) => result?,
                Err(_) => {
                    return Err(RofexError::Temporary {
                        message: format!(
                            "websocket handshake timed out after {}ms",
                            self.handshake_timeout.as_millis()
                        ),
                    });
                }
            },
        };
        debug!(url = %self.url, status = %response.status(), "ws handshake complete");

        let mut slot = self.socket.write().await;
        if self.cancel.is_cancelled() {
            return Err(RofexError::Cancelled);
        }
        let (sink, source) = stream.split();
        *slot = Some(Arc::new(Socket {
            sink: Mutex::new(sink),
            source: Mutex::new(source),
        }));
        Ok(())
    }

    async fn current(&self) -> Result<Arc<Socket>> {
        self.socket.read().await.clone().ok_or(RofexError::NotConnected)
    }

    /// Next text payload.
    ///
    /// `Ok(None)` means the connection was cancelled. Control frames are
    /// handled here and never returned.
    pub async fn read_text(&self) -> Result<Option<String>> {
        let socket = self.current().await?;
        let mut source = socket.source.lock().await;

        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(None),
                next = source.next() => next,
            };

            match next {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => debug!(bytes = bytes.len(), "skipping non-utf8 binary frame"),
                },
                Some(Ok(Message::Pong(_))) => self.pongs.notify_waiters(),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.to_string()),
                        None => (NO_STATUS_CODE, String::new()),
                    };
                    return Err(RofexError::StreamClosed { code, reason });
                }
                Some(Err(err)) => return Err(err.into()),
                None => {
                    return Err(RofexError::StreamClosed {
                        code: ABNORMAL_CODE,
                        reason: "stream ended without close frame".to_string(),
                    });
                }
            }
        }
    }

    /// Serialize `payload` and send it as one text frame.
    pub async fn write_json<T: Serialize>(&self, payload: &T) -> Result<()> {
        let text = serde_json::to_string(payload)?;
        self.send(Message::Text(text.into())).await
    }

    async fn send(&self, message: Message) -> Result<()> {
        let socket = self.current().await?;
        let mut sink = socket.sink.lock().await;
        tokio::select! {
            _ = self.cancel.cancelled() => Err(RofexError::Cancelled),
            result = sink.send(message) => Ok(result?),
        }
    }

    /// Send a ping and wait for any pong read by the read loop.
    pub async fn ping(&self) -> Result<()> {
        let pong = self.pongs.notified();
        tokio::pin!(pong);
        pong.as_mut().enable();

        self.send(Message::Ping(Vec::new().into())).await?;
        tokio::select! {
            _ = self.cancel.cancelled() => Err(RofexError::Cancelled),
            _ = pong => Ok(()),
        }
    }

    /// Cancel pending operations and send a normal close frame.
    ///
    /// Safe to call more than once; later calls find no socket and return.
    pub async fn disconnect(&self) -> Result<()> {
        self.cancel.cancel();
        let Some(socket) = self.socket.write().await.take() else {
            return Ok(());
        };

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "client disconnect".into(),
        };
        let close = async {
            let mut sink = socket.sink.lock().await;
            sink.send(Message::Close(Some(frame))).await
        };

        match tokio::time::timeout(self.close_timeout, close).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed)) => {
                Ok(())
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                warn!(url = %self.url, "close frame not sent before timeout");
                Ok(())
            }
        }
    }
}
