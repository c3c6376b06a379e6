/*
[INPUT]:  PRIMARY_USER / PRIMARY_PASS, optional PRIMARY_ACCOUNT and PRIMARY_DEPTH
[OUTPUT]: Live market data and order reports printed until Ctrl-C
[POS]:    Examples - WebSocket subscriptions
[UPDATE]: When WebSocket API changes
*/

use std::env;
use std::sync::Arc;

use rofex_adapter::*;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let auth = PasswordAuth::new(env::var("PRIMARY_USER")?, env::var("PRIMARY_PASS")?);
    let client = RofexClient::with_config(ClientConfig::from_env()?, Arc::new(auth))?;
    let depth = env::var("PRIMARY_DEPTH")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(5);

    let shutdown = CancellationToken::new();
    let request = MarketDataRequest::new(
        ["DLR/DIC25", "DLR/ENE26"],
        vec![MdEntry::Bids, MdEntry::Offers, MdEntry::Last],
    )
    .with_depth(depth);
    let mut market_data = client.subscribe_market_data(&shutdown, request)?;

    let mut reports = match env::var("PRIMARY_ACCOUNT") {
        Ok(account) => Some(client.subscribe_order_reports(
            &shutdown,
            OrderReportRequest::new(account).snapshot_only_active(true),
        )?),
        Err(_) => None,
    };

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    loop {
        tokio::select! {
            event = market_data.events.recv() => {
                let Some(event) = event else { break };
                let data = &event.market_data;
                println!(
                    "{} {}: bid {:?} offer {:?}",
                    event.time().map(|time| time.to_rfc3339()).unwrap_or_default(),
                    event.instrument_id.symbol,
                    data.best_bid().map(|level| (level.price, level.size)),
                    data.best_offer().map(|level| (level.price, level.size)),
                );
            }
            Some(err) = market_data.errors.recv() => {
                eprintln!("market data stream stopped: {err}");
            }
            Some(report) = next_report(&mut reports) => {
                let order = &report.order_report;
                println!("order {} {} {}", order.cl_ord_id, order.side, order.status);
            }
        }
    }

    if let Some(reports) = reports.as_mut() {
        reports.shutdown().await;
    }
    println!(
        "stopped ({:?}), {} events dropped",
        market_data.state(),
        market_data.dropped_events()
    );
    Ok(())
}

async fn next_report(reports: &mut Option<OrderReportSubscription>) -> Option<OrderReportEvent> {
    match reports {
        Some(subscription) => subscription.events.recv().await,
        None => std::future::pending().await,
    }
}
