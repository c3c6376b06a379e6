/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for HTTP client
[POS]:    Integration tests - HTTP endpoints
[UPDATE]: When HTTP endpoints change
*/

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{TEST_TOKEN, client_with_auth, fast_stream_config, setup_mock_server, token_client};
use rofex_adapter::{
    CandleResolution, CfiCode, ClientConfig, Market, MarketSegment, MdEntry, NewOrder,
    PasswordAuth, RateLimiter, RofexClient, RofexError, Side, StaticTokenAuth,
};
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WS_URL: &str = "ws://127.0.0.1:9/";

async fn setup() -> (MockServer, RofexClient) {
    let server = setup_mock_server().await;
    let client = token_client(&server.uri(), WS_URL, fast_stream_config());
    (server, client)
}

/// Records every route it is asked to pace; refuses all of them when `deny`.
#[derive(Debug, Default)]
struct RecordingLimiter {
    routes: Mutex<Vec<String>>,
    deny: bool,
}

impl RecordingLimiter {
    fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateLimiter for RecordingLimiter {
    async fn wait(&self, route: &str) -> rofex_adapter::Result<()> {
        self.routes.lock().unwrap().push(route.to_string());
        if self.deny {
            return Err(RofexError::Temporary {
                message: "quota exhausted".to_string(),
            });
        }
        Ok(())
    }
}

fn ok_ack(client_id: &str) -> serde_json::Value {
    json!({"status": "OK", "order": {"clientId": client_id, "proprietary": "PBCP"}})
}

#[test]
fn test_client_creation() {
    let client = assert_ok!(RofexClient::with_token("tok"));
    assert_eq!(client.base_url().as_str(), "https://api.remarkets.primary.com.ar/");
    assert_eq!(client.proprietary(), "PBCP");
}

#[test]
fn test_live_client_requires_explicit_urls() {
    let config = ClientConfig::live("", "");
    let result = RofexClient::with_config(config, Arc::new(StaticTokenAuth::new("tok")));
    assert!(matches!(result, Err(RofexError::Config(_))));

    let config = ClientConfig::live("https://api.broker.example", "wss://api.broker.example");
    let client = assert_ok!(RofexClient::with_config(
        config,
        Arc::new(StaticTokenAuth::new("tok"))
    ));
    assert_eq!(client.proprietary(), "api");
}

#[tokio::test]
async fn test_send_limit_order_query() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/order/newSingleOrder"))
        .and(header("X-Auth-Token", TEST_TOKEN))
        .and(query_param("marketId", "ROFX"))
        .and(query_param("symbol", "DLR/DIC25"))
        .and(query_param("orderQty", "10"))
        .and(query_param("ordType", "LIMIT"))
        .and(query_param("side", "BUY"))
        .and(query_param("timeInForce", "DAY"))
        .and(query_param("account", "30"))
        .and(query_param("cancelPrevious", "false"))
        .and(query_param("price", "1010.5"))
        .and(query_param_is_missing("expireDate"))
        .and(query_param_is_missing("iceberg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_ack("user1")))
        .expect(1)
        .mount(&server)
        .await;

    let order = NewOrder::limit("DLR/DIC25", Side::Buy, 10, "1010.50".parse().unwrap(), "30");
    let response = assert_ok!(client.send_order(&order).await);
    assert_eq!(response.status, "OK");
    assert_eq!(response.order.client_id, "user1");
}

#[tokio::test]
async fn test_send_gtd_iceberg_order_query() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/order/newSingleOrder"))
        .and(query_param("timeInForce", "GTD"))
        .and(query_param("expireDate", "20251010"))
        .and(query_param("iceberg", "true"))
        .and(query_param("displayQty", "2"))
        .and(query_param("side", "SELL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_ack("user2")))
        .expect(1)
        .mount(&server)
        .await;

    let order = NewOrder::limit("DLR/DIC25", Side::Sell, 10, "1000".parse().unwrap(), "30")
        .good_till("20251010")
        .with_iceberg(2);
    assert_ok!(client.send_order(&order).await);
}

#[tokio::test]
async fn test_market_order_omits_price() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/order/newSingleOrder"))
        .and(query_param("ordType", "MARKET"))
        .and(query_param_is_missing("price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_ack("user3")))
        .expect(1)
        .mount(&server)
        .await;

    let order = NewOrder::market("DLR/DIC25", Side::Buy, 1, "30");
    assert_ok!(client.send_order(&order).await);
}

#[tokio::test]
async fn test_order_validation_skips_request() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let zero = NewOrder::limit("DLR/DIC25", Side::Buy, 0, "1".parse().unwrap(), "30");
    assert!(matches!(
        client.send_order(&zero).await,
        Err(RofexError::Validation { .. })
    ));

    let mut no_price = NewOrder::limit("DLR/DIC25", Side::Buy, 1, "1".parse().unwrap(), "30");
    no_price.price = None;
    assert!(matches!(
        client.send_order(&no_price).await,
        Err(RofexError::Validation { ref field, .. }) if field == "price"
    ));

    let gtd = NewOrder::limit("DLR/DIC25", Side::Buy, 1, "1".parse().unwrap(), "30").good_till("");
    assert!(matches!(
        client.send_order(&gtd).await,
        Err(RofexError::Validation { ref field, .. }) if field == "expireDate"
    ));

    assert!(matches!(
        client.cancel_order("", None).await,
        Err(RofexError::Validation { .. })
    ));
    assert!(matches!(
        client.account_positions(" ").await,
        Err(RofexError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_cancel_and_replace_use_default_proprietary() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/order/cancelById"))
        .and(query_param("clOrdId", "user1"))
        .and(query_param("proprietary", "PBCP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_ack("user1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/order/replaceById"))
        .and(query_param("clOrdId", "user1"))
        .and(query_param("proprietary", "ABC"))
        .and(query_param("orderQty", "7"))
        .and(query_param("price", "99.25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_ack("user9")))
        .expect(1)
        .mount(&server)
        .await;

    assert_ok!(client.cancel_order("user1", Some(" ")).await);
    let replaced = assert_ok!(
        client
            .replace_order("user1", Some("ABC"), Some(7), Some("99.250".parse().unwrap()))
            .await
    );
    assert_eq!(replaced.order.client_id, "user9");
}

#[tokio::test]
async fn test_order_listings() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/order/actives"))
        .and(query_param("accountId", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "orders": [{
                "orderId": "1",
                "clOrdId": "user1",
                "proprietary": "PBCP",
                "instrumentId": {"marketId": "ROFX", "symbol": "DLR/DIC25"},
                "side": "BUY",
                "price": 1010.5,
                "orderQty": 10,
                "status": "NEW"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = assert_ok!(client.active_orders("30").await);
    assert_eq!(response.orders.len(), 1);
    let order = &response.orders[0];
    assert_eq!(order.cl_ord_id, "user1");
    assert_eq!(order.side, Some(Side::Buy));
    assert_eq!(order.order_qty, Some(10));
}

#[tokio::test]
async fn test_expired_token_refreshes_once() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/getToken"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Auth-Token", "first"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/getToken"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Auth-Token", "second"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/segment/all"))
        .and(header("X-Auth-Token", "first"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/segment/all"))
        .and(header("X-Auth-Token", "second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "segments": [{"marketSegmentId": "DDF", "marketId": "ROFX"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_auth(
        &server.uri(),
        WS_URL,
        fast_stream_config(),
        Arc::new(PasswordAuth::new("user", "pass")),
    );
    let response = assert_ok!(client.segments().await);
    assert_eq!(response.segments[0].market_segment_id, "DDF");
}

#[tokio::test]
async fn test_rate_limiter_paces_login_get_and_resend() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/getToken"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Auth-Token", "first"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/getToken"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Auth-Token", "second"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/accounts"))
        .and(header("X-Auth-Token", "first"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/accounts"))
        .and(header("X-Auth-Token", "second"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "OK", "accounts": []})),
        )
        .mount(&server)
        .await;

    let limiter = Arc::new(RecordingLimiter::default());
    let client = client_with_auth(
        &server.uri(),
        WS_URL,
        fast_stream_config(),
        Arc::new(PasswordAuth::new("user", "pass")),
    )
    .with_rate_limiter(limiter.clone());

    assert_ok!(client.accounts().await);
    assert_eq!(
        limiter.routes(),
        ["auth/getToken", "rest/accounts", "auth/getToken", "rest/accounts"]
    );
}

#[tokio::test]
async fn test_rate_limiter_error_skips_request() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/accounts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let limiter = Arc::new(RecordingLimiter {
        deny: true,
        ..RecordingLimiter::default()
    });
    let client = client.with_rate_limiter(limiter.clone());

    let err = client.accounts().await.unwrap_err();
    assert!(matches!(err, RofexError::Temporary { .. }));
    assert_eq!(limiter.routes(), ["rest/accounts"]);
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/instruments/detail"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid symbol"))
        .mount(&server)
        .await;

    let err = client
        .instrument_detail("NOPE", Market::Rofex)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "http 400: Invalid symbol");
    assert_eq!(err.status_code(), Some(400));
}

#[tokio::test]
async fn test_instrument_detail_decodes_both_id_shapes() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/instruments/detail"))
        .and(query_param("symbol", "DLR/DIC25"))
        .and(query_param("marketId", "ROFX"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "instrument": {
                "symbol": "DLR/DIC25",
                "marketId": "ROFX",
                "cficode": "FXXXSX",
                "minPriceIncrement": 0.5,
                "contractMultiplier": 1000,
                "priceConvertionFactor": 1,
                "orderTypes": ["LIMIT", "MARKET"],
                "timesInForce": ["DAY", "IOC"]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = assert_ok!(client.instrument_detail("DLR/DIC25", Market::Rofex).await);
    let instrument = response.instrument;
    assert_eq!(instrument.instrument_id.symbol, "DLR/DIC25");
    assert_eq!(instrument.instrument_id.market_id, "ROFX");
    assert_eq!(instrument.cfi_code.as_deref(), Some("FXXXSX"));
    assert_eq!(instrument.order_types, vec!["LIMIT", "MARKET"]);
}

#[tokio::test]
async fn test_instruments_by_cfi_and_segment_aggregate() {
    let (server, client) = setup().await;
    for (code, symbol) in [("FXXXSX", "DLR/DIC25"), ("OCASPS", "GGAL/C")] {
        Mock::given(method("GET"))
            .and(path("/rest/instruments/byCFICode"))
            .and(query_param("CFICode", code))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "instruments": [{"instrumentId": {"symbol": symbol, "marketId": "ROFX"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/rest/instruments/bySegment"))
        .and(query_param("MarketSegmentID", "DDF"))
        .and(query_param("MarketID", "ROFX"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "instruments": [{"instrumentId": {"symbol": "DLR/ENE26", "marketId": "ROFX"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let by_cfi = assert_ok!(
        client
            .instruments_by_cfi(&[CfiCode::Fxxxsx, CfiCode::Ocasps])
            .await
    );
    let symbols: Vec<&str> = by_cfi
        .iter()
        .map(|instrument| instrument.instrument_id.symbol.as_str())
        .collect();
    assert_eq!(symbols, vec!["DLR/DIC25", "GGAL/C"]);

    let by_segment = assert_ok!(
        client
            .instruments_by_segments(Market::Rofex, &[MarketSegment::Ddf])
            .await
    );
    assert_eq!(by_segment[0].instrument_id.symbol, "DLR/ENE26");
}

#[tokio::test]
async fn test_market_data_snapshot_query() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/marketdata/get"))
        .and(query_param("marketId", "ROFX"))
        .and(query_param("symbol", "DLR/DIC25"))
        .and(query_param("entries", "BI,OF,LA"))
        .and(query_param("depth", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "marketData": {
                "BI": [{"price": 1010, "size": 5}],
                "OF": [{"price": 1011, "size": 2}],
                "LA": {"price": 1010.5, "size": 1, "date": 1741788000000_i64}
            },
            "depth": 1,
            "aggregated": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = assert_ok!(
        client
            .market_data_snapshot(
                "DLR/DIC25",
                Market::Rofex,
                &[MdEntry::Bids, MdEntry::Offers, MdEntry::Last],
                0,
            )
            .await
    );
    let data = response.market_data;
    assert_eq!(data.best_bid().unwrap().price, "1010".parse().unwrap());
    assert_eq!(data.best_offer().unwrap().size, "2".parse().unwrap());
    assert_eq!(data.last.unwrap().date, Some(1741788000000));
}

#[tokio::test]
async fn test_historic_trades_query_flags() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/data/getTrades"))
        .and(query_param("marketId", "MERV"))
        .and(query_param("symbol", "GGAL"))
        .and(query_param("dateFrom", "2025-03-10"))
        .and(query_param("dateTo", "2025-03-12"))
        .and(query_param("external", "true"))
        .and(query_param("environment", "REMARKETS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "symbol": "GGAL",
            "market": "MERV",
            "trades": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let from = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2025, 3, 12, 18, 0, 0).unwrap();
    let response = assert_ok!(client.historic_trades("GGAL", Market::Merval, from, to).await);
    assert!(response.trades.is_empty());
}

#[tokio::test]
async fn test_historic_candles_from_trades() {
    let (server, client) = setup().await;
    let at = |minute: u32, second: u32| {
        Utc.with_ymd_and_hms(2025, 3, 12, 14, minute, second)
            .unwrap()
            .timestamp_millis()
    };
    Mock::given(method("GET"))
        .and(path("/rest/data/getTrades"))
        .and(query_param("symbol", "DLR/DIC25"))
        .and(query_param_is_missing("external"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "symbol": "DLR/DIC25",
            "market": "ROFX",
            "trades": [
                {"price": 102, "size": 1, "datetime": "", "servertime": at(1, 10), "symbol": "DLR/DIC25"},
                {"price": 100, "size": 2, "datetime": "", "servertime": at(0, 5), "symbol": "DLR/DIC25"},
                {"price": 101, "size": 3, "datetime": "", "servertime": at(0, 40), "symbol": "DLR/DIC25"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let from = Utc.with_ymd_and_hms(2025, 3, 12, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2025, 3, 12, 23, 59, 59).unwrap();
    let candles = assert_ok!(
        client
            .historic_candles("DLR/DIC25", Market::Rofex, CandleResolution::OneMinute, from, to)
            .await
    );

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].open, "100".parse().unwrap());
    assert_eq!(candles[0].close, "101".parse().unwrap());
    assert_eq!(candles[0].volume, "5".parse().unwrap());
    assert_eq!(candles[1].open, "102".parse().unwrap());
    assert_eq!(candles[1].resolution, "1");
}

#[tokio::test]
async fn test_account_endpoints_encode_account() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/risk/position/getPositions/REM%2030"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "positions": [{
                "symbol": "DLR/DIC25",
                "buySize": 5,
                "buyPrice": 1000,
                "sellSize": 2,
                "sellPrice": 1010
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "accounts": [{"name": "REM 30", "id": 30}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let positions = assert_ok!(client.account_positions("REM 30").await);
    assert_eq!(positions.positions[0].net_size(), "3".parse().unwrap());

    let accounts = assert_ok!(client.accounts().await);
    assert_eq!(accounts.accounts[0].name, "REM 30");
}
