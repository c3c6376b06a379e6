/*
[INPUT]:  Primary API JSON payloads (reference data, market data, orders, risk)
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::Side;

/// Symbol plus market, the key of every instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentId {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub market_id: String,
}

impl InstrumentId {
    pub fn new(symbol: impl Into<String>, market_id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            market_id: market_id.into(),
        }
    }

    fn is_empty(&self) -> bool {
        self.symbol.is_empty() && self.market_id.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub market_segment_id: String,
    #[serde(default)]
    pub market_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRange {
    #[serde(default)]
    pub lower_limit: Option<Decimal>,
    #[serde(default)]
    pub upper_limit: Option<Decimal>,
    pub tick: Decimal,
}

/// Instrument definition.
///
/// Detail endpoints nest the key under `instrumentId`; the CFI and segment
/// listings return `symbol`/`marketId` at the top level. Both decode into
/// [`Instrument::instrument_id`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawInstrument")]
pub struct Instrument {
    pub instrument_id: InstrumentId,
    #[serde(rename = "cficode", skip_serializing_if = "Option::is_none")]
    pub cfi_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<Segment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_limit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_limit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price_increment: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_trade_vol: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trade_vol: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_size: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_multiplier: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_lot: Option<Decimal>,
    #[serde(rename = "priceConvertionFactor", skip_serializing_if = "Option::is_none")]
    pub price_conversion_factor: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub order_types: Vec<String>,
    pub times_in_force: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settl_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument_price_precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument_size_precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_id_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_description: Option<String>,
    pub tick_price_ranges: HashMap<String, TickRange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInstrument {
    #[serde(default)]
    instrument_id: InstrumentId,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    market_id: Option<String>,
    #[serde(rename = "cficode", default)]
    cfi_code: Option<String>,
    #[serde(default)]
    segment: Option<Segment>,
    #[serde(default)]
    low_limit_price: Option<Decimal>,
    #[serde(default)]
    high_limit_price: Option<Decimal>,
    #[serde(default)]
    min_price_increment: Option<Decimal>,
    #[serde(default)]
    min_trade_vol: Option<Decimal>,
    #[serde(default)]
    max_trade_vol: Option<Decimal>,
    #[serde(default)]
    tick_size: Option<Decimal>,
    #[serde(default)]
    contract_multiplier: Option<Decimal>,
    #[serde(default)]
    round_lot: Option<Decimal>,
    #[serde(rename = "priceConvertionFactor", default)]
    price_conversion_factor: Option<Decimal>,
    #[serde(default)]
    maturity_date: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    order_types: Option<Vec<String>>,
    #[serde(default)]
    times_in_force: Option<Vec<String>>,
    #[serde(default)]
    security_type: Option<String>,
    #[serde(default)]
    settl_type: Option<String>,
    #[serde(default)]
    instrument_price_precision: Option<u32>,
    #[serde(default)]
    instrument_size_precision: Option<u32>,
    #[serde(default)]
    security_id: Option<String>,
    #[serde(default)]
    security_id_source: Option<String>,
    #[serde(default)]
    security_description: Option<String>,
    #[serde(default)]
    tick_price_ranges: Option<HashMap<String, TickRange>>,
}

impl From<RawInstrument> for Instrument {
    fn from(raw: RawInstrument) -> Self {
        let instrument_id = if raw.instrument_id.is_empty() {
            InstrumentId {
                symbol: raw.symbol.unwrap_or_default(),
                market_id: raw.market_id.unwrap_or_default(),
            }
        } else {
            raw.instrument_id
        };

        Self {
            instrument_id,
            cfi_code: raw.cfi_code,
            segment: raw.segment,
            low_limit_price: raw.low_limit_price,
            high_limit_price: raw.high_limit_price,
            min_price_increment: raw.min_price_increment,
            min_trade_vol: raw.min_trade_vol,
            max_trade_vol: raw.max_trade_vol,
            tick_size: raw.tick_size,
            contract_multiplier: raw.contract_multiplier,
            round_lot: raw.round_lot,
            price_conversion_factor: raw.price_conversion_factor,
            maturity_date: raw.maturity_date,
            currency: raw.currency,
            order_types: raw.order_types.unwrap_or_default(),
            times_in_force: raw.times_in_force.unwrap_or_default(),
            security_type: raw.security_type,
            settl_type: raw.settl_type,
            instrument_price_precision: raw.instrument_price_precision,
            instrument_size_precision: raw.instrument_size_precision,
            security_id: raw.security_id,
            security_id_source: raw.security_id_source,
            security_description: raw.security_description,
            tick_price_ranges: raw.tick_price_ranges.unwrap_or_default(),
        }
    }
}

/// One side of the book at one price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// Price/size/date triple used by LA, CL, SE and OI.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Decimal>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
}

/// Market data keyed by entry code.
///
/// Each known code maps to its own typed field; codes this type does not know
/// are ignored during decoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(rename = "BI", default, deserialize_with = "serde_helpers::levels_or_empty")]
    pub bids: Vec<BookLevel>,
    #[serde(rename = "OF", default, deserialize_with = "serde_helpers::levels_or_empty")]
    pub offers: Vec<BookLevel>,
    #[serde(rename = "LA", default, skip_serializing_if = "Option::is_none")]
    pub last: Option<PriceEntry>,
    #[serde(rename = "OP", default, skip_serializing_if = "Option::is_none")]
    pub opening_price: Option<Decimal>,
    #[serde(rename = "CL", default, skip_serializing_if = "Option::is_none")]
    pub close: Option<PriceEntry>,
    #[serde(rename = "SE", default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<PriceEntry>,
    #[serde(rename = "HI", default, skip_serializing_if = "Option::is_none")]
    pub high_price: Option<Decimal>,
    #[serde(rename = "LO", default, skip_serializing_if = "Option::is_none")]
    pub low_price: Option<Decimal>,
    #[serde(rename = "TV", default, skip_serializing_if = "Option::is_none")]
    pub trade_volume: Option<Decimal>,
    #[serde(rename = "OI", default, skip_serializing_if = "Option::is_none")]
    pub open_interest: Option<PriceEntry>,
    #[serde(rename = "IV", default, skip_serializing_if = "Option::is_none")]
    pub index_value: Option<Decimal>,
    #[serde(rename = "EV", default, skip_serializing_if = "Option::is_none")]
    pub effective_volume: Option<Decimal>,
    #[serde(rename = "NV", default, skip_serializing_if = "Option::is_none")]
    pub nominal_volume: Option<Decimal>,
    #[serde(rename = "ACP", default, skip_serializing_if = "Option::is_none")]
    pub auction_price: Option<Decimal>,
    #[serde(rename = "TC", default, skip_serializing_if = "Option::is_none")]
    pub trade_count: Option<i64>,
}

impl MarketData {
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_offer(&self) -> Option<&BookLevel> {
        self.offers.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountRef {
    pub id: String,
}

/// Order as returned by the order status endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub instrument_id: InstrumentId,
    #[serde(default)]
    pub cl_ord_id: String,
    #[serde(default)]
    pub proprietary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountRef>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ord_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_qty: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaves_qty: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cum_qty: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_px: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_px: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_qty: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transact_time: Option<String>,
}

/// Client order id plus proprietary, the acknowledgement of order entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub proprietary: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PositionInstrument {
    pub symbol_reference: String,
    pub settl_type: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Position {
    pub instrument: PositionInstrument,
    pub symbol: String,
    pub buy_size: Decimal,
    pub buy_price: Decimal,
    pub sell_size: Decimal,
    pub sell_price: Decimal,
    pub total_daily_diff: Decimal,
    pub total_diff: Decimal,
    pub trading_symbol: String,
    pub original_buy_price: Decimal,
    pub original_sell_price: Decimal,
}

impl Position {
    pub fn net_size(&self) -> Decimal {
        self.buy_size - self.sell_size
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedDailyDiff {
    #[serde(rename = "buyPricePPPDiff")]
    pub buy_price_ppp_diff: Decimal,
    #[serde(rename = "sellPricePPPDiff")]
    pub sell_price_ppp_diff: Decimal,
    pub total_daily_diff: Decimal,
    pub buy_daily_diff: Decimal,
    pub sell_daily_diff: Decimal,
    pub total_daily_diff_plain: Decimal,
    pub buy_daily_diff_plain: Decimal,
    pub sell_daily_diff_plain: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedPositionItem {
    pub symbol_reference: String,
    pub contract_type: String,
    pub price_conversion_factor: Decimal,
    pub contract_size: Decimal,
    pub market_price: Decimal,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub contract_multiplier: Decimal,
    pub total_initial_size: Decimal,
    pub buy_initial_size: Decimal,
    pub sell_initial_size: Decimal,
    pub buy_initial_price: Decimal,
    pub sell_initial_price: Decimal,
    pub total_filled_size: Decimal,
    pub buy_filled_size: Decimal,
    pub sell_filled_size: Decimal,
    pub buy_filled_price: Decimal,
    pub sell_filled_price: Decimal,
    pub total_current_size: Decimal,
    pub buy_current_size: Decimal,
    pub sell_current_size: Decimal,
    pub detailed_daily_diff: DetailedDailyDiff,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedInstrument {
    pub detailed_positions: Vec<DetailedPositionItem>,
    pub instrument_initial_size: Decimal,
    pub instrument_filled_size: Decimal,
    pub instrument_current_size: Decimal,
}

/// Positions grouped by product type, then by symbol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedPosition {
    pub account: String,
    pub total_daily_diff_plain: Decimal,
    pub total_market_value: Decimal,
    pub report: HashMap<String, HashMap<String, DetailedInstrument>>,
    pub last_calculation: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyAmount {
    pub consumed: Decimal,
    pub available: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrencyBalance {
    pub detailed_currency_balance: HashMap<String, CurrencyAmount>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cash {
    pub total_cash: Decimal,
    pub detailed_cash: HashMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AvailableToOperate {
    pub cash: Cash,
    pub movements: Decimal,
    pub credit: Option<Decimal>,
    pub total: Decimal,
    pub pending_movements: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedAccountReport {
    pub currency_balance: CurrencyBalance,
    pub available_to_operate: AvailableToOperate,
    pub settlement_date: i64,
}

/// Margin and cash summary of one account.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountData {
    pub account_name: String,
    pub market_member: String,
    pub market_member_identity: String,
    pub collateral: Decimal,
    pub margin: Decimal,
    pub available_to_collateral: Decimal,
    pub detailed_account_reports: HashMap<String, DetailedAccountReport>,
    pub has_error: bool,
    pub error_detail: Option<serde_json::Value>,
    pub last_calculation: i64,
    pub portfolio: Decimal,
    pub orders_margin: Decimal,
    pub current_cash: Decimal,
    pub daily_diff: Decimal,
    pub uncovered_margin: Decimal,
}

/// Historic trade as returned by `rest/data/getTrades`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: Decimal,
    pub size: Decimal,
    #[serde(default)]
    pub datetime: String,
    /// Server timestamp in epoch milliseconds
    #[serde(default)]
    pub servertime: i64,
    #[serde(default)]
    pub symbol: String,
}

impl Trade {
    pub fn server_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.servertime)
    }
}

/// Aggregated candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    #[serde(rename = "o")]
    pub open: Decimal,
    #[serde(rename = "h")]
    pub high: Decimal,
    #[serde(rename = "l")]
    pub low: Decimal,
    #[serde(rename = "c")]
    pub close: Decimal,
    #[serde(rename = "v")]
    pub volume: Decimal,
    #[serde(rename = "d")]
    pub time: DateTime<Utc>,
    #[serde(rename = "r")]
    pub resolution: String,
    #[serde(rename = "sid")]
    pub security_id: String,
}

mod serde_helpers {
    use super::BookLevel;
    use serde::{Deserialize, Deserializer};

    /// `null` book sides decode as empty.
    pub fn levels_or_empty<'de, D>(deserializer: D) -> Result<Vec<BookLevel>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let levels: Option<Vec<BookLevel>> = Option::deserialize(deserializer)?;
        Ok(levels.unwrap_or_default())
    }
}
