/*
[INPUT]:  Inbound WebSocket frames (`md` and `or` messages)
[OUTPUT]: Typed stream events with envelope inspection helpers
[POS]:    Data layer - stream event shapes
[UPDATE]: When the server adds event kinds or fields
*/

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::enums::WsMessageType;
use super::models::{AccountRef, InstrumentId, MarketData};

/// Minimal view of any inbound frame, enough to route it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Envelope {
    /// Case-insensitive message type, `None` when absent or unknown.
    pub fn kind(&self) -> Option<WsMessageType> {
        self.message_type.as_deref()?.parse().ok()
    }
}

/// Events a subscription can deliver.
pub trait StreamEvent: DeserializeOwned + Send + Sync + 'static {
    /// The only message type forwarded on this kind of subscription.
    const KIND: WsMessageType;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataEvent {
    #[serde(rename = "type")]
    pub message_type: WsMessageType,
    #[serde(default)]
    pub instrument_id: InstrumentId,
    #[serde(default)]
    pub market_data: MarketData,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl MarketDataEvent {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }
}

impl StreamEvent for MarketDataEvent {
    const KIND: WsMessageType = WsMessageType::MarketData;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReportEvent {
    #[serde(rename = "type")]
    pub message_type: WsMessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub order_report: OrderDetails,
}

impl OrderReportEvent {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }
}

impl StreamEvent for OrderReportEvent {
    const KIND: WsMessageType = WsMessageType::OrderReport;
}

/// Execution report payload of an `or` message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub cl_ord_id: String,
    pub proprietary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountRef>,
    pub instrument_id: InstrumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub order_qty: i64,
    pub ord_type: String,
    pub side: String,
    pub time_in_force: String,
    pub transact_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_px: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_px: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_qty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cum_qty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaves_qty: Option<i64>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_cl_ord_id: Option<String>,
}
