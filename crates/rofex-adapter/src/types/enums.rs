/*
[INPUT]:  Primary API wire codes (environments, markets, order enums, entry codes)
[OUTPUT]: Typed Rust enums with serde and query-string support
[POS]:    Data layer - closed vocabularies shared by REST and WebSocket
[UPDATE]: When the API adds markets, segments, entry codes or message types
*/

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Trading environment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// reMarkets sandbox
    #[default]
    Remarket,
    Live,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Remarket => "remarket",
            Environment::Live => "live",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remarket" | "remarkets" => Ok(Environment::Remarket),
            "live" | "prod" | "production" => Ok(Environment::Live),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Market {
    #[default]
    #[serde(rename = "ROFX")]
    Rofex,
    #[serde(rename = "MERV")]
    Merval,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Rofex => "ROFX",
            Market::Merval => "MERV",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketSegment {
    #[serde(rename = "DDF")]
    Ddf,
    #[serde(rename = "DDA")]
    Dda,
    #[serde(rename = "DUAL")]
    Dual,
    #[serde(rename = "U-DDF")]
    UDdf,
    #[serde(rename = "U-DDA")]
    UDda,
    #[serde(rename = "U-DUAL")]
    UDual,
    #[serde(rename = "MERV")]
    Merv,
}

impl MarketSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSegment::Ddf => "DDF",
            MarketSegment::Dda => "DDA",
            MarketSegment::Dual => "DUAL",
            MarketSegment::UDdf => "U-DDF",
            MarketSegment::UDda => "U-DDA",
            MarketSegment::UDual => "U-DUAL",
            MarketSegment::Merv => "MERV",
        }
    }
}

/// CFI classification codes accepted by `rest/instruments/byCFICode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CfiCode {
    /// Stock
    Esxxxx,
    /// Bond
    Dbxxxx,
    /// Call option on stock
    Ocasps,
    /// Put option on stock
    Opasps,
    /// Future
    Fxxxsx,
    /// Put option on future
    Opafxs,
    /// Call option on future
    Ocafxs,
    /// CEDEAR
    Emxxxx,
    /// Treasury bill
    Dbxxfr,
}

impl CfiCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CfiCode::Esxxxx => "ESXXXX",
            CfiCode::Dbxxxx => "DBXXXX",
            CfiCode::Ocasps => "OCASPS",
            CfiCode::Opasps => "OPASPS",
            CfiCode::Fxxxsx => "FXXXSX",
            CfiCode::Opafxs => "OPAFXS",
            CfiCode::Ocafxs => "OCAFXS",
            CfiCode::Emxxxx => "EMXXXX",
            CfiCode::Dbxxfr => "DBXXFR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    #[default]
    Day,
    Ioc,
    Fok,
    /// Good till date, requires an expire date
    Gtd,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Day => "DAY",
            TimeInForce::Ioc => "IOC",
            TimeInForce::Fok => "FOK",
            TimeInForce::Gtd => "GTD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[serde(alias = "buy", alias = "Buy")]
    Buy,
    #[serde(alias = "sell", alias = "Sell")]
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
    MarketToLimit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
            OrderType::MarketToLimit => "MARKET_TO_LIMIT",
        }
    }
}

/// Market data entry codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MdEntry {
    #[serde(rename = "BI")]
    Bids,
    #[serde(rename = "OF")]
    Offers,
    #[serde(rename = "LA")]
    Last,
    #[serde(rename = "OP")]
    OpeningPrice,
    #[serde(rename = "CL")]
    ClosingPrice,
    #[serde(rename = "SE")]
    SettlementPrice,
    #[serde(rename = "HI")]
    TradingSessionHighPrice,
    #[serde(rename = "LO")]
    TradingSessionLowPrice,
    #[serde(rename = "TV")]
    TradeVolume,
    #[serde(rename = "OI")]
    OpenInterest,
    #[serde(rename = "IV")]
    IndexValue,
    #[serde(rename = "EV")]
    TradeEffectiveVolume,
    #[serde(rename = "NV")]
    NominalVolume,
    #[serde(rename = "ACP")]
    AuctionPrice,
    #[serde(rename = "TC")]
    TradeCount,
}

impl MdEntry {
    pub fn as_str(&self) -> &'static str {
        match self {
            MdEntry::Bids => "BI",
            MdEntry::Offers => "OF",
            MdEntry::Last => "LA",
            MdEntry::OpeningPrice => "OP",
            MdEntry::ClosingPrice => "CL",
            MdEntry::SettlementPrice => "SE",
            MdEntry::TradingSessionHighPrice => "HI",
            MdEntry::TradingSessionLowPrice => "LO",
            MdEntry::TradeVolume => "TV",
            MdEntry::OpenInterest => "OI",
            MdEntry::IndexValue => "IV",
            MdEntry::TradeEffectiveVolume => "EV",
            MdEntry::NominalVolume => "NV",
            MdEntry::AuctionPrice => "ACP",
            MdEntry::TradeCount => "TC",
        }
    }

    /// Comma separated codes as the REST snapshot endpoint expects them.
    pub fn join(entries: &[MdEntry]) -> String {
        entries
            .iter()
            .map(MdEntry::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Discriminant of every WebSocket message, outbound and inbound.
///
/// Parsing is case-insensitive: `"MD"`, `"Md"` and `"md"` are the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsMessageType {
    SubscribeMarketData,
    SubscribeOrderReport,
    NewOrder,
    CancelOrder,
    MarketData,
    OrderReport,
}

impl WsMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WsMessageType::SubscribeMarketData => "smd",
            WsMessageType::SubscribeOrderReport => "os",
            WsMessageType::NewOrder => "no",
            WsMessageType::CancelOrder => "co",
            WsMessageType::MarketData => "md",
            WsMessageType::OrderReport => "or",
        }
    }
}

impl FromStr for WsMessageType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "smd" => Ok(WsMessageType::SubscribeMarketData),
            "os" => Ok(WsMessageType::SubscribeOrderReport),
            "no" => Ok(WsMessageType::NewOrder),
            "co" => Ok(WsMessageType::CancelOrder),
            "md" => Ok(WsMessageType::MarketData),
            "or" => Ok(WsMessageType::OrderReport),
            other => Err(format!("unknown message type: {other}")),
        }
    }
}

impl fmt::Display for WsMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WsMessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WsMessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Candle width for trade aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CandleResolution {
    #[default]
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    Day,
    /// ISO week, starting Monday
    Week,
    Month,
    /// Calendar quarter
    Quarter,
}

impl CandleResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleResolution::OneMinute => "1",
            CandleResolution::FiveMinutes => "5",
            CandleResolution::FifteenMinutes => "15",
            CandleResolution::ThirtyMinutes => "30",
            CandleResolution::OneHour => "1h",
            CandleResolution::FourHours => "4h",
            CandleResolution::Day => "D",
            CandleResolution::Week => "W",
            CandleResolution::Month => "M",
            CandleResolution::Quarter => "3M",
        }
    }

    /// Unrecognized codes fall back to one minute.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim() {
            "5" => CandleResolution::FiveMinutes,
            "15" => CandleResolution::FifteenMinutes,
            "30" => CandleResolution::ThirtyMinutes,
            "1h" | "60" => CandleResolution::OneHour,
            "4h" | "240" => CandleResolution::FourHours,
            "D" | "1D" => CandleResolution::Day,
            "W" | "1W" => CandleResolution::Week,
            "M" | "1M" => CandleResolution::Month,
            "3M" => CandleResolution::Quarter,
            _ => CandleResolution::OneMinute,
        }
    }
}

impl fmt::Display for CandleResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
