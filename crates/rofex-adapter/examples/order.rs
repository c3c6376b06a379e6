/*
[INPUT]:  PRIMARY_USER / PRIMARY_PASS / PRIMARY_ACCOUNT from env or .env
[OUTPUT]: A limit order sent, queried and cancelled
[POS]:    Examples - REST order lifecycle
[UPDATE]: When order endpoints change
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
    let account = env::var("PRIMARY_ACCOUNT")?;
    let symbol = env::var("PRIMARY_SYMBOL").unwrap_or_else(|_| "DLR/DIC25".to_string());

    let snapshot = client
        .market_data_snapshot(&symbol, Market::Rofex, &[MdEntry::Bids], 1)
        .await?;
    let Some(bid) = snapshot.market_data.best_bid() else {
        println!("{symbol}: empty book, nothing to do");
        return Ok(());
    };

    // Rest well below the best bid so the order stays open.
    let price = (bid.price * rust_decimal::Decimal::new(9, 1)).round_dp(1);
    let order = NewOrder::limit(&symbol, Side::Buy, 1, price, &account);
    let ack = client.send_order(&order).await?;
    println!("sent {} ({})", ack.order.client_id, ack.status);

    let status = client
        .order_status(&ack.order.client_id, Some(&ack.order.proprietary))
        .await?;
    println!("status: {}", status.order.status);

    let cancel = client
        .cancel_order(&ack.order.client_id, Some(&ack.order.proprietary))
        .await?;
    println!("cancel requested: {}", cancel.status);

    let active = client.active_orders(&account).await?;
    println!("{} active orders left", active.orders.len());

    Ok(())
}
