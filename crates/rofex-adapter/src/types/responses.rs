/*
[INPUT]:  Raw JSON responses from the REST API
[OUTPUT]: Typed response envelopes for each endpoint
[POS]:    Data layer - response structures from API calls
[UPDATE]: When API response format changes
*/

use serde::{Deserialize, Serialize};

use super::models::{
    Account, AccountData, DetailedPosition, Instrument, MarketData, Order, OrderAck, Position,
    Segment, Trade,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentsResponse {
    pub status: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentsResponse {
    pub status: String,
    pub instruments: Vec<Instrument>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentDetailResponse {
    pub status: String,
    pub instrument: Instrument,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketDataSnapshotResponse {
    pub status: String,
    pub market_data: MarketData,
    pub depth: u32,
    pub aggregated: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradesResponse {
    pub status: String,
    pub symbol: String,
    pub market: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub trades: Vec<Trade>,
}

/// Acknowledgement of new, cancel and replace requests.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderAckResponse {
    pub status: String,
    pub order: OrderAck,
}

pub type SendOrderResponse = OrderAckResponse;
pub type CancelOrderResponse = OrderAckResponse;
pub type ReplaceOrderResponse = OrderAckResponse;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderStatusResponse {
    pub status: String,
    pub order: Order,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdersResponse {
    pub status: String,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsResponse {
    pub status: String,
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionsResponse {
    pub status: String,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedPositionResponse {
    pub status: String,
    pub detailed_position: DetailedPosition,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountReportResponse {
    pub status: String,
    pub account_data: AccountData,
}
