/*
[INPUT]:  Caller intent (orders, subscriptions) and API requirements
[OUTPUT]: Validated request types and outbound WebSocket messages
[POS]:    Data layer - request structures for API calls
[UPDATE]: When adding new request types or changing request format
*/

use rust_decimal::Decimal;
use serde::Serialize;

use super::enums::{Market, MdEntry, OrderType, Side, TimeInForce, WsMessageType};
use super::models::InstrumentId;
use crate::http::{Result, RofexError};

/// Order entry parameters shared by the REST and WebSocket paths.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub symbol: String,
    pub market: Market,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: i64,
    /// Required for limit orders, ignored otherwise
    pub price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    pub account: String,
    pub cancel_previous: bool,
    pub iceberg: bool,
    pub display_quantity: Option<i64>,
    /// Required for GTD orders
    pub expire_date: Option<String>,
    /// WebSocket order entry only
    pub all_or_none: bool,
    /// WebSocket order entry only
    pub ws_cl_ord_id: Option<String>,
}

impl NewOrder {
    /// Day limit order on ROFX.
    pub fn limit(
        symbol: impl Into<String>,
        side: Side,
        quantity: i64,
        price: Decimal,
        account: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            market: Market::Rofex,
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            time_in_force: TimeInForce::Day,
            account: account.into(),
            cancel_previous: false,
            iceberg: false,
            display_quantity: None,
            expire_date: None,
            all_or_none: false,
            ws_cl_ord_id: None,
        }
    }

    /// Day market order on ROFX.
    pub fn market(
        symbol: impl Into<String>,
        side: Side,
        quantity: i64,
        account: impl Into<String>,
    ) -> Self {
        Self {
            order_type: OrderType::Market,
            price: None,
            ..Self::limit(symbol, side, quantity, Decimal::ZERO, account)
        }
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = market;
        self
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    /// Good till date; the date is passed through as given.
    pub fn good_till(mut self, expire_date: impl Into<String>) -> Self {
        self.time_in_force = TimeInForce::Gtd;
        self.expire_date = Some(expire_date.into());
        self
    }

    pub fn with_iceberg(mut self, display_quantity: i64) -> Self {
        self.iceberg = true;
        self.display_quantity = Some(display_quantity);
        self
    }

    pub fn with_cancel_previous(mut self, cancel_previous: bool) -> Self {
        self.cancel_previous = cancel_previous;
        self
    }

    pub fn with_all_or_none(mut self, all_or_none: bool) -> Self {
        self.all_or_none = all_or_none;
        self
    }

    pub fn with_ws_cl_ord_id(mut self, id: impl Into<String>) -> Self {
        self.ws_cl_ord_id = Some(id.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(RofexError::validation("symbol", "required"));
        }
        if self.quantity <= 0 {
            return Err(RofexError::validation("qty", "must be > 0"));
        }
        if self.order_type == OrderType::Limit && self.price.is_none() {
            return Err(RofexError::validation("price", "required for limit"));
        }
        if self.time_in_force == TimeInForce::Gtd
            && self.expire_date.as_deref().is_none_or(str::is_empty)
        {
            return Err(RofexError::validation("expireDate", "required for GTD"));
        }
        Ok(())
    }

    /// Price only travels with limit orders.
    pub(crate) fn effective_price(&self) -> Option<Decimal> {
        match self.order_type {
            OrderType::Limit => self.price,
            _ => None,
        }
    }

    /// Display quantity only travels with iceberg orders.
    pub(crate) fn iceberg_display(&self) -> Option<i64> {
        if self.iceberg { self.display_quantity } else { None }
    }

    pub(crate) fn effective_expire_date(&self) -> Option<&str> {
        match self.time_in_force {
            TimeInForce::Gtd => self.expire_date.as_deref(),
            _ => None,
        }
    }
}

/// Market data subscription parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataRequest {
    pub symbols: Vec<String>,
    pub entries: Vec<MdEntry>,
    /// Book depth, 0 means 1
    pub depth: u32,
    pub market: Market,
}

impl MarketDataRequest {
    pub fn new<I, S>(symbols: I, entries: Vec<MdEntry>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            entries,
            depth: 1,
            market: Market::Rofex,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = market;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(RofexError::validation("symbols", "required"));
        }
        if self.symbols.iter().any(|symbol| symbol.trim().is_empty()) {
            return Err(RofexError::validation("symbols", "must not contain empty symbols"));
        }
        Ok(())
    }

    pub fn effective_depth(&self) -> u32 {
        self.depth.max(1)
    }

    pub(crate) fn to_message(&self) -> MarketDataSubscribeMessage {
        let market_id = self.market.as_str().to_string();
        MarketDataSubscribeMessage {
            message_type: WsMessageType::SubscribeMarketData,
            level: 1,
            depth: self.effective_depth(),
            entries: self.entries.clone(),
            products: self
                .symbols
                .iter()
                .map(|symbol| InstrumentId::new(symbol.clone(), market_id.clone()))
                .collect(),
        }
    }
}

/// Order report subscription parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReportRequest {
    pub account: String,
    /// Limit the initial replay to orders that are still open
    pub snapshot_only_active: bool,
}

impl OrderReportRequest {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            snapshot_only_active: false,
        }
    }

    pub fn snapshot_only_active(mut self, value: bool) -> Self {
        self.snapshot_only_active = value;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.account.trim().is_empty() {
            return Err(RofexError::validation("account", "required"));
        }
        Ok(())
    }

    pub(crate) fn to_message(&self) -> OrderSubscribeMessage {
        OrderSubscribeMessage {
            message_type: WsMessageType::SubscribeOrderReport,
            account: AccountIdMessage {
                id: self.account.clone(),
            },
            snapshot_only_active: self.snapshot_only_active,
        }
    }
}

/// `smd` message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketDataSubscribeMessage {
    #[serde(rename = "type")]
    pub message_type: WsMessageType,
    pub level: u32,
    pub depth: u32,
    pub entries: Vec<MdEntry>,
    pub products: Vec<InstrumentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountIdMessage {
    pub id: String,
}

/// `os` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubscribeMessage {
    #[serde(rename = "type")]
    pub message_type: WsMessageType,
    pub account: AccountIdMessage,
    pub snapshot_only_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMessage {
    pub market_id: String,
    pub symbol: String,
}

/// `no` message. Numbers and flags travel as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderMessage {
    #[serde(rename = "type")]
    pub message_type: WsMessageType,
    pub product: ProductMessage,
    pub quantity: String,
    pub ord_type: String,
    pub side: String,
    pub account: String,
    pub all_or_none: String,
    pub time_in_force: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iceberg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_cl_ord_id: Option<String>,
}

impl From<&NewOrder> for NewOrderMessage {
    fn from(order: &NewOrder) -> Self {
        let display = order.iceberg_display();
        Self {
            message_type: WsMessageType::NewOrder,
            product: ProductMessage {
                market_id: order.market.as_str().to_string(),
                symbol: order.symbol.clone(),
            },
            quantity: order.quantity.to_string(),
            ord_type: order.order_type.as_str().to_string(),
            side: order.side.as_str().to_string(),
            account: order.account.clone(),
            all_or_none: order.all_or_none.to_string(),
            time_in_force: order.time_in_force.as_str().to_string(),
            price: order.effective_price().map(|price| price.normalize().to_string()),
            iceberg: display.map(|_| "true".to_string()),
            display_quantity: display.map(|quantity| quantity.to_string()),
            expire_date: order.effective_expire_date().map(str::to_string),
            ws_cl_ord_id: order.ws_cl_ord_id.clone(),
        }
    }
}

/// `co` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderMessage {
    #[serde(rename = "type")]
    pub message_type: WsMessageType,
    pub client_id: String,
    pub proprietary: String,
}

impl CancelOrderMessage {
    pub fn new(client_id: impl Into<String>, proprietary: impl Into<String>) -> Self {
        Self {
            message_type: WsMessageType::CancelOrder,
            client_id: client_id.into(),
            proprietary: proprietary.into(),
        }
    }
}
