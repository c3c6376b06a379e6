/*
[INPUT]:  PRIMARY_USER / PRIMARY_PASS, optional PRIMARY_SYMBOL and PRIMARY_RESOLUTION
[OUTPUT]: OHLCV candles for the last week printed to stdout
[POS]:    Examples - candle aggregation over historic trades
[UPDATE]: When candle resolutions change
*/

use std::env;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rofex_adapter::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let auth = PasswordAuth::new(env::var("PRIMARY_USER")?, env::var("PRIMARY_PASS")?);
    let client = RofexClient::with_config(ClientConfig::from_env()?, Arc::new(auth))?;

    let symbol = env::var("PRIMARY_SYMBOL").unwrap_or_else(|_| "DLR/DIC25".to_string());
    let resolution = env::var("PRIMARY_RESOLUTION")
        .map(|raw| CandleResolution::parse_lenient(&raw))
        .unwrap_or(CandleResolution::OneHour);

    let to = Utc::now();
    let from = to - Duration::days(7);
    let candles = client
        .historic_candles(&symbol, Market::Rofex, resolution, from, to)
        .await?;

    println!("{symbol} {resolution}: {} candles", candles.len());
    for candle in candles {
        println!(
            "{} o={} h={} l={} c={} v={}",
            candle.time.format("%Y-%m-%d %H:%M"),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            candle.volume
        );
    }
    Ok(())
}
