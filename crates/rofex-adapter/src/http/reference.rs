/*
[INPUT]:  Symbols, markets, CFI codes and segments
[OUTPUT]: Segments and instrument definitions
[POS]:    HTTP layer - reference data endpoints
[UPDATE]: When adding new reference endpoints or changing response format
*/

use crate::http::{Result, RofexClient, RofexError};
use crate::types::{
    CfiCode, Instrument, InstrumentDetailResponse, InstrumentsResponse, Market, MarketSegment,
    SegmentsResponse,
};

impl RofexClient {
    /// List market segments
    ///
    /// GET rest/segment/all
    pub async fn segments(&self) -> Result<SegmentsResponse> {
        let url = self.endpoint_url("rest/segment/all", &[])?;
        self.get_json(url).await
    }

    /// List every instrument (symbol and market only)
    ///
    /// GET rest/instruments/all
    pub async fn instruments(&self) -> Result<InstrumentsResponse> {
        let url = self.endpoint_url("rest/instruments/all", &[])?;
        self.get_json(url).await
    }

    /// List every instrument with full definition
    ///
    /// GET rest/instruments/details
    pub async fn instruments_detailed(&self) -> Result<InstrumentsResponse> {
        let url = self.endpoint_url("rest/instruments/details", &[])?;
        self.get_json(url).await
    }

    /// Definition of one instrument
    ///
    /// GET rest/instruments/detail?symbol={symbol}&marketId={market}
    pub async fn instrument_detail(
        &self,
        symbol: &str,
        market: Market,
    ) -> Result<InstrumentDetailResponse> {
        if symbol.trim().is_empty() {
            return Err(RofexError::validation("symbol", "required"));
        }
        let url = self.endpoint_url(
            "rest/instruments/detail",
            &[
                ("symbol", symbol.to_string()),
                ("marketId", market.as_str().to_string()),
            ],
        )?;
        self.get_json(url).await
    }

    /// Instruments matching any of the CFI codes, concatenated in request order
    ///
    /// GET rest/instruments/byCFICode?CFICode={code}
    pub async fn instruments_by_cfi(&self, codes: &[CfiCode]) -> Result<Vec<Instrument>> {
        if codes.is_empty() {
            return Err(RofexError::validation("cfiCodes", "required"));
        }
        let mut instruments = Vec::new();
        for code in codes {
            let url = self.endpoint_url(
                "rest/instruments/byCFICode",
                &[("CFICode", code.as_str().to_string())],
            )?;
            let response: InstrumentsResponse = self.get_json(url).await?;
            instruments.extend(response.instruments);
        }
        Ok(instruments)
    }

    /// Instruments in any of the segments of one market, concatenated in request order
    ///
    /// GET rest/instruments/bySegment?MarketSegmentID={segment}&MarketID={market}
    pub async fn instruments_by_segments(
        &self,
        market: Market,
        segments: &[MarketSegment],
    ) -> Result<Vec<Instrument>> {
        if segments.is_empty() {
            return Err(RofexError::validation("segments", "required"));
        }
        let mut instruments = Vec::new();
        for segment in segments {
            let url = self.endpoint_url(
                "rest/instruments/bySegment",
                &[
                    ("MarketSegmentID", segment.as_str().to_string()),
                    ("MarketID", market.as_str().to_string()),
                ],
            )?;
            let response: InstrumentsResponse = self.get_json(url).await?;
            instruments.extend(response.instruments);
        }
        Ok(instruments)
    }
}
