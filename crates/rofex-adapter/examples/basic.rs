/*
[INPUT]:  PRIMARY_USER / PRIMARY_PASS (and optional PRIMARY_ENV) from env or .env
[OUTPUT]: Accounts, segments and a market data snapshot printed to stdout
[POS]:    Examples - REST reference and account queries
[UPDATE]: When REST API changes
*/

use std::env;
use std::sync::Arc;

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

    let accounts = client.accounts().await?;
    for account in &accounts.accounts {
        println!("account: {}", account.name);
    }

    let segments = client.segments().await?;
    println!("{} segments", segments.segments.len());

    let futures = client.instruments_by_cfi(&[CfiCode::Fxxxsx]).await?;
    println!("{} futures listed", futures.len());

    let symbol = env::var("PRIMARY_SYMBOL").unwrap_or_else(|_| "DLR/DIC25".to_string());
    let snapshot = client
        .market_data_snapshot(
            &symbol,
            Market::Rofex,
            &[MdEntry::Bids, MdEntry::Offers, MdEntry::Last],
            1,
        )
        .await?;
    let data = snapshot.market_data;
    println!(
        "{symbol}: bid {:?} / offer {:?} / last {:?}",
        data.best_bid().map(|level| level.price),
        data.best_offer().map(|level| level.price),
        data.last.and_then(|last| last.price),
    );

    if let Some(account) = accounts.accounts.first() {
        let positions = client.account_positions(&account.name).await?;
        for position in positions.positions {
            println!("{}: net {}", position.symbol, position.net_size());
        }
    }

    Ok(())
}
