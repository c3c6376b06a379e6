/*
[INPUT]:  Symbol, market, entry codes, depth and date ranges
[OUTPUT]: Market data snapshots and historic trades
[POS]:    HTTP layer - market data endpoints
[UPDATE]: When adding new market data endpoints or changing response format
*/

use chrono::{DateTime, Utc};

use crate::http::{Result, RofexClient, RofexError};
use crate::types::{Environment, Market, MarketDataSnapshotResponse, MdEntry, TradesResponse};

const DATE_FORMAT: &str = "%Y-%m-%d";

impl RofexClient {
    /// Point-in-time market data; depth 0 means 1
    ///
    /// GET rest/marketdata/get?marketId={market}&symbol={symbol}&entries={entries}&depth={depth}
    pub async fn market_data_snapshot(
        &self,
        symbol: &str,
        market: Market,
        entries: &[MdEntry],
        depth: u32,
    ) -> Result<MarketDataSnapshotResponse> {
        if symbol.trim().is_empty() {
            return Err(RofexError::validation("symbol", "required"));
        }
        let url = self.endpoint_url(
            "rest/marketdata/get",
            &[
                ("marketId", market.as_str().to_string()),
                ("symbol", symbol.to_string()),
                ("entries", MdEntry::join(entries)),
                ("depth", depth.max(1).to_string()),
            ],
        )?;
        self.get_json(url).await
    }

    /// Trades between two dates (day granularity, UTC)
    ///
    /// GET rest/data/getTrades?marketId={market}&symbol={symbol}&dateFrom={from}&dateTo={to}
    pub async fn historic_trades(
        &self,
        symbol: &str,
        market: Market,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<TradesResponse> {
        if symbol.trim().is_empty() {
            return Err(RofexError::validation("symbol", "required"));
        }
        let mut query = vec![
            ("marketId", market.as_str().to_string()),
            ("symbol", symbol.to_string()),
            ("dateFrom", from.format(DATE_FORMAT).to_string()),
            ("dateTo", to.format(DATE_FORMAT).to_string()),
        ];
        if market != Market::Rofex {
            query.push(("external", "true".to_string()));
        }
        if self.environment() == Environment::Remarket {
            query.push(("environment", "REMARKETS".to_string()));
        }
        let url = self.endpoint_url("rest/data/getTrades", &query)?;
        self.get_json(url).await
    }
}
