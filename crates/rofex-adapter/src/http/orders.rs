/*
[INPUT]:  Validated NewOrder, client order ids, order/exec ids, accounts
[OUTPUT]: Order acknowledgements and order status listings
[POS]:    HTTP layer - order entry and order query endpoints
[UPDATE]: When adding new order endpoints or changing request format
*/

use rust_decimal::Decimal;
use tracing::info;

use crate::http::{Result, RofexClient, RofexError};
use crate::types::{
    CancelOrderResponse, NewOrder, OrderStatusResponse, OrdersResponse, ReplaceOrderResponse,
    SendOrderResponse,
};

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RofexError::validation(field, "required"));
    }
    Ok(())
}

impl RofexClient {
    /// Submit a new order
    ///
    /// GET rest/order/newSingleOrder?marketId&symbol&orderQty&ordType&side&timeInForce&account&cancelPrevious
    pub async fn send_order(&self, order: &NewOrder) -> Result<SendOrderResponse> {
        order.validate()?;

        let mut query = vec![
            ("marketId", order.market.as_str().to_string()),
            ("symbol", order.symbol.clone()),
            ("orderQty", order.quantity.to_string()),
            ("ordType", order.order_type.as_str().to_string()),
            ("side", order.side.as_str().to_string()),
            ("timeInForce", order.time_in_force.as_str().to_string()),
            ("account", order.account.clone()),
            ("cancelPrevious", order.cancel_previous.to_string()),
        ];
        if let Some(price) = order.effective_price() {
            query.push(("price", price.normalize().to_string()));
        }
        if let Some(expire_date) = order.effective_expire_date() {
            query.push(("expireDate", expire_date.to_string()));
        }
        if let Some(display) = order.iceberg_display() {
            query.push(("iceberg", "true".to_string()));
            query.push(("displayQty", display.to_string()));
        }

        let url = self.endpoint_url("rest/order/newSingleOrder", &query)?;
        let response: SendOrderResponse = self.get_json(url).await?;
        info!(
            symbol = %order.symbol,
            side = order.side.as_str(),
            qty = order.quantity,
            client_id = %response.order.client_id,
            status = %response.status,
            "order submitted"
        );
        Ok(response)
    }

    /// Cancel an order; blank proprietary uses the configured one
    ///
    /// GET rest/order/cancelById?clOrdId={id}&proprietary={proprietary}
    pub async fn cancel_order(
        &self,
        cl_ord_id: &str,
        proprietary: Option<&str>,
    ) -> Result<CancelOrderResponse> {
        required("clOrdId", cl_ord_id)?;
        let url = self.endpoint_url(
            "rest/order/cancelById",
            &[
                ("clOrdId", cl_ord_id.to_string()),
                ("proprietary", self.proprietary_or_default(proprietary)),
            ],
        )?;
        self.get_json(url).await
    }

    /// Replace quantity and/or price of a resting order
    ///
    /// GET rest/order/replaceById?clOrdId={id}&proprietary={proprietary}[&orderQty][&price]
    pub async fn replace_order(
        &self,
        cl_ord_id: &str,
        proprietary: Option<&str>,
        new_quantity: Option<i64>,
        new_price: Option<Decimal>,
    ) -> Result<ReplaceOrderResponse> {
        required("clOrdId", cl_ord_id)?;
        let mut query = vec![
            ("clOrdId", cl_ord_id.to_string()),
            ("proprietary", self.proprietary_or_default(proprietary)),
        ];
        if let Some(quantity) = new_quantity {
            query.push(("orderQty", quantity.to_string()));
        }
        if let Some(price) = new_price {
            query.push(("price", price.normalize().to_string()));
        }
        let url = self.endpoint_url("rest/order/replaceById", &query)?;
        self.get_json(url).await
    }

    /// Latest state of an order
    ///
    /// GET rest/order/id?clOrdId={id}&proprietary={proprietary}
    pub async fn order_status(
        &self,
        cl_ord_id: &str,
        proprietary: Option<&str>,
    ) -> Result<OrderStatusResponse> {
        required("clOrdId", cl_ord_id)?;
        let url = self.endpoint_url(
            "rest/order/id",
            &[
                ("clOrdId", cl_ord_id.to_string()),
                ("proprietary", self.proprietary_or_default(proprietary)),
            ],
        )?;
        self.get_json(url).await
    }

    /// Every state an order went through
    ///
    /// GET rest/order/allById?clOrdId={id}&proprietary={proprietary}
    pub async fn order_history(
        &self,
        cl_ord_id: &str,
        proprietary: Option<&str>,
    ) -> Result<OrdersResponse> {
        required("clOrdId", cl_ord_id)?;
        let url = self.endpoint_url(
            "rest/order/allById",
            &[
                ("clOrdId", cl_ord_id.to_string()),
                ("proprietary", self.proprietary_or_default(proprietary)),
            ],
        )?;
        self.get_json(url).await
    }

    /// GET rest/order/byOrderId?orderId={id}
    pub async fn order_by_order_id(&self, order_id: &str) -> Result<OrderStatusResponse> {
        required("orderId", order_id)?;
        let url = self.endpoint_url("rest/order/byOrderId", &[("orderId", order_id.to_string())])?;
        self.get_json(url).await
    }

    /// GET rest/order/byExecId?execId={id}
    pub async fn order_by_exec_id(&self, exec_id: &str) -> Result<OrderStatusResponse> {
        required("execId", exec_id)?;
        let url = self.endpoint_url("rest/order/byExecId", &[("execId", exec_id.to_string())])?;
        self.get_json(url).await
    }

    /// GET rest/order/filleds?accountId={account}
    pub async fn filled_orders(&self, account: &str) -> Result<OrdersResponse> {
        required("account", account)?;
        let url = self.endpoint_url("rest/order/filleds", &[("accountId", account.to_string())])?;
        self.get_json(url).await
    }

    /// GET rest/order/actives?accountId={account}
    pub async fn active_orders(&self, account: &str) -> Result<OrdersResponse> {
        required("account", account)?;
        let url = self.endpoint_url("rest/order/actives", &[("accountId", account.to_string())])?;
        self.get_json(url).await
    }

    /// GET rest/order/all?accountId={account}
    pub async fn all_orders(&self, account: &str) -> Result<OrdersResponse> {
        required("account", account)?;
        let url = self.endpoint_url("rest/order/all", &[("accountId", account.to_string())])?;
        self.get_json(url).await
    }
}
