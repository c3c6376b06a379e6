/*
[INPUT]:  Historic trades, candle resolution and a UTC time window
[OUTPUT]: OHLCV candles in ascending time order
[POS]:    HTTP layer - candle aggregation over rest/data/getTrades
[UPDATE]: When adding resolutions or changing bucketing rules
*/

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::http::{Result, RofexClient, RofexError};
use crate::types::{CandleResolution, Market, Ohlcv, Trade};

impl RofexClient {
    /// Candles built from the trade history of one symbol
    pub async fn historic_candles(
        &self,
        symbol: &str,
        market: Market,
        resolution: CandleResolution,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Ohlcv>> {
        if symbol.trim().is_empty() {
            return Err(RofexError::validation("symbol", "required"));
        }
        let response = self.historic_trades(symbol, market, from, to).await?;
        Ok(aggregate_candles(
            &response.trades,
            symbol,
            resolution,
            from,
            to,
        ))
    }
}

struct Bucket {
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

impl Bucket {
    fn is_zero(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(Decimal::is_zero)
    }
}

/// Bucket trades into candles.
///
/// Trades are ordered by server time (ties keep input order) and only those
/// inside `[from, to]` count. Buckets whose values are all zero are skipped.
pub fn aggregate_candles(
    trades: &[Trade],
    symbol: &str,
    resolution: CandleResolution,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<Ohlcv> {
    let mut ordered: Vec<&Trade> = trades.iter().collect();
    ordered.sort_by_key(|trade| trade.servertime);

    let mut buckets: BTreeMap<DateTime<Utc>, Bucket> = BTreeMap::new();
    for trade in ordered {
        let Some(ts) = trade.server_time() else {
            continue;
        };
        if ts < from || ts > to {
            continue;
        }
        buckets
            .entry(floor_time(ts, resolution))
            .and_modify(|bucket| {
                bucket.high = bucket.high.max(trade.price);
                bucket.low = bucket.low.min(trade.price);
                bucket.close = trade.price;
                bucket.volume += trade.size;
            })
            .or_insert(Bucket {
                open: trade.price,
                high: trade.price,
                low: trade.price,
                close: trade.price,
                volume: trade.size,
            });
    }

    buckets
        .into_iter()
        .filter(|(_, bucket)| !bucket.is_zero())
        .map(|(time, bucket)| Ohlcv {
            open: bucket.open,
            high: bucket.high,
            low: bucket.low,
            close: bucket.close,
            volume: bucket.volume,
            time,
            resolution: resolution.as_str().to_string(),
            security_id: symbol.to_string(),
        })
        .collect()
}

/// Start of the bucket containing `ts`.
pub fn floor_time(ts: DateTime<Utc>, resolution: CandleResolution) -> DateTime<Utc> {
    let seconds = match resolution {
        CandleResolution::OneMinute => 60,
        CandleResolution::FiveMinutes => 5 * 60,
        CandleResolution::FifteenMinutes => 15 * 60,
        CandleResolution::ThirtyMinutes => 30 * 60,
        CandleResolution::OneHour => 3600,
        CandleResolution::FourHours => 4 * 3600,
        CandleResolution::Day => return start_of_day(ts.date_naive()),
        CandleResolution::Week => {
            let date = ts.date_naive();
            let back = i64::from(date.weekday().num_days_from_monday());
            return start_of_day(date - Duration::days(back));
        }
        CandleResolution::Month => return start_of_month(ts.year(), ts.month()),
        CandleResolution::Quarter => {
            let month = (ts.month() - 1) / 3 * 3 + 1;
            return start_of_month(ts.year(), month);
        }
    };

    let epoch = ts.timestamp();
    let floored = epoch - epoch.rem_euclid(seconds);
    Utc.timestamp_opt(floored, 0).single().unwrap_or(ts)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn start_of_month(year: i32, month: u32) -> DateTime<Utc> {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => start_of_day(date),
        None => DateTime::<Utc>::MIN_UTC,
    }
}
