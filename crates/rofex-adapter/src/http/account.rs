/*
[INPUT]:  Account names
[OUTPUT]: Accounts, positions, detailed positions and account reports
[POS]:    HTTP layer - account and risk endpoints
[UPDATE]: When adding new risk endpoints or changing response format
*/

use crate::http::{Result, RofexClient, RofexError};
use crate::types::{
    AccountReportResponse, AccountsResponse, DetailedPositionResponse, PositionsResponse,
};

impl RofexClient {
    /// Accounts the user can operate
    ///
    /// GET rest/accounts
    pub async fn accounts(&self) -> Result<AccountsResponse> {
        let url = self.endpoint_url("rest/accounts", &[])?;
        self.get_json(url).await
    }

    /// GET rest/risk/position/getPositions/{account}
    pub async fn account_positions(&self, account: &str) -> Result<PositionsResponse> {
        let url = self.account_endpoint("rest/risk/position/getPositions/", account)?;
        self.get_json(url).await
    }

    /// GET rest/risk/detailedPosition/{account}
    pub async fn detailed_position(&self, account: &str) -> Result<DetailedPositionResponse> {
        let url = self.account_endpoint("rest/risk/detailedPosition/", account)?;
        self.get_json(url).await
    }

    /// GET rest/risk/accountReport/{account}
    pub async fn account_report(&self, account: &str) -> Result<AccountReportResponse> {
        let url = self.account_endpoint("rest/risk/accountReport/", account)?;
        self.get_json(url).await
    }

    fn account_endpoint(&self, prefix: &str, account: &str) -> Result<url::Url> {
        let account = account.trim();
        if account.is_empty() {
            return Err(RofexError::validation("account", "required"));
        }
        let mut url = self.endpoint_url(prefix, &[])?;
        url.path_segments_mut()
            .map_err(|_| RofexError::Config("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(account);
        Ok(url)
    }
}
