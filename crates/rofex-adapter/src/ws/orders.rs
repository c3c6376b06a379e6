/*
[INPUT]:  Validated NewOrder or a client order id to cancel
[OUTPUT]: `no` / `co` messages written over a short-lived WebSocket
[POS]:    WebSocket layer - order entry without a subscription
[UPDATE]: When the order message format changes
*/

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::http::{Result, RofexClient, RofexError};
use crate::types::{CancelOrderMessage, NewOrder, NewOrderMessage};
use crate::ws::connection::StreamConnection;

impl RofexClient {
    /// Submit an order over WebSocket.
    ///
    /// The server acknowledges through order reports, so watch an order
    /// report subscription for the outcome.
    pub async fn send_order_ws(&self, order: &NewOrder) -> Result<()> {
        order.validate()?;
        let message = NewOrderMessage::from(order);
        self.send_ws_message(&message).await?;
        info!(
            symbol = %order.symbol,
            side = order.side.as_str(),
            qty = order.quantity,
            ws_cl_ord_id = order.ws_cl_ord_id.as_deref().unwrap_or(""),
            "order sent over websocket"
        );
        Ok(())
    }

    /// Cancel an order over WebSocket; blank proprietary uses the configured one.
    pub async fn cancel_order_ws(&self, cl_ord_id: &str, proprietary: Option<&str>) -> Result<()> {
        if cl_ord_id.trim().is_empty() {
            return Err(RofexError::validation("clOrdId", "required"));
        }
        let message = CancelOrderMessage::new(cl_ord_id, self.proprietary_or_default(proprietary));
        self.send_ws_message(&message).await?;
        info!(cl_ord_id, "cancel sent over websocket");
        Ok(())
    }

    async fn send_ws_message<T: Serialize>(&self, message: &T) -> Result<()> {
        let token = self.auth_token().await?;
        let conn = StreamConnection::new(
            self.ws_url().clone(),
            token,
            CancellationToken::new(),
            self.stream_config(),
        );
        conn.connect().await?;

        let sent = conn.write_json(message).await;
        let closed = conn.disconnect().await;
        sent?;
        closed
    }
}
