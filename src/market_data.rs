use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, Span};

use crate::config::Config;
use crate::error::InvestError;
use crate::export::CsvExporter;
use crate::history::{CandleSource, HistoricCandles, HistoricCandlesRequest, HistoricFetcher};
use crate::http::invest_post;
use crate::instruments::InstrumentsClient;
use crate::types::{
    CandleInterval, GetCandlesRequest, GetCandlesResponse, GetClosePricesRequest,
    GetClosePricesResponse, GetLastPricesResponse, GetLastTradesRequest, GetLastTradesResponse,
    GetOrderBookRequest, GetOrderBookResponse, GetTradingStatusResponse,
    GetTradingStatusesResponse, HistoricCandle, InstrumentClosePrice,
    InstrumentClosePriceRequest, LastPrice, Trade
};

/// Order book depths the gateway serves.
pub const ORDER_BOOK_DEPTHS: [i32; 6] = [1, 10, 20, 30, 40, 50];

pub type GatewayHistoricFetcher = HistoricFetcher<MarketDataClient, InstrumentsClient, CsvExporter>;

/// Client for `MarketDataService` unary methods
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    config: Config,
    http: Client,
    span: Span
}

impl MarketDataClient {
    pub fn new(config: Config, http: Client, span: Span) -> Self {
        Self { config, http, span }
    }

    /// Get candles for one instrument in a single call
    ///
    /// # Arguments
    /// * `instrument_id` - FIGI or instrument uid (e.g. "BBG004730N88")
    /// * `interval` - Candle granularity
    /// * `from` / `to` - Range to load; must not exceed [`crate::window::max_span`] for `interval`
    ///
    /// # Example
    /// ```rust,no_run
    /// # async fn run(client: rust_invest::InvestClient) -> anyhow::Result<()> {
    /// use chrono::{TimeZone, Utc};
    /// use rust_invest::CandleInterval;
    ///
    /// let from = Utc.with_ymd_and_hms(2023, 4, 18, 0, 0, 0).unwrap();
    /// let to = Utc.with_ymd_and_hms(2023, 4, 19, 0, 0, 0).unwrap();
    /// let candles = client
    ///     .market_data()
    ///     .get_candles("BBG004730N88", CandleInterval::Hour, from, to)
    ///     .await?;
    /// for candle in candles {
    ///     println!("{}: low {}", candle.time, candle.low.to_f64());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_candles(
        &self,
        instrument_id: &str,
        interval: CandleInterval,
        from: DateTime<Utc>,
        to: DateTime<Utc>
    ) -> Result<Vec<HistoricCandle>> {
        if instrument_id.is_empty() {
            anyhow::bail!("Instrument id is required");
        }

        let request = GetCandlesRequest {
            instrument_id: instrument_id.to_string(),
            interval,
            from,
            to
        };
        let response_text = invest_post(
            &self.http,
            &self.config,
            "MarketDataService/GetCandles",
            &request
        )
        .await?;
        let response: GetCandlesResponse = serde_json::from_str(&response_text)?;

        debug!(
            parent: &self.span,
            instrument_id,
            count = response.candles.len(),
            "candles received"
        );
        Ok(response.candles)
    }

    /// Get the last trade prices for several instruments
    pub async fn get_last_prices(&self, instrument_ids: Vec<&str>) -> Result<Vec<LastPrice>> {
        if instrument_ids.is_empty() {
            anyhow::bail!("At least one instrument id is required");
        }

        let body = json!({ "instrumentId": instrument_ids });
        let response_text = invest_post(
            &self.http,
            &self.config,
            "MarketDataService/GetLastPrices",
            &body
        )
        .await?;
        let response: GetLastPricesResponse = serde_json::from_str(&response_text)?;

        Ok(response.last_prices)
    }

    /// Get the order book of one instrument
    ///
    /// # Arguments
    /// * `instrument_id` - FIGI or instrument uid
    /// * `depth` - Levels per side, one of [`ORDER_BOOK_DEPTHS`]
    pub async fn get_order_book(
        &self,
        instrument_id: &str,
        depth: i32
    ) -> Result<GetOrderBookResponse> {
        if instrument_id.is_empty() {
            anyhow::bail!("Instrument id is required");
        }
        if !ORDER_BOOK_DEPTHS.contains(&depth) {
            anyhow::bail!("Unsupported order book depth {}", depth);
        }

        let request = GetOrderBookRequest {
            instrument_id: instrument_id.to_string(),
            depth
        };
        let response_text = invest_post(
            &self.http,
            &self.config,
            "MarketDataService/GetOrderBook",
            &request
        )
        .await?;

        Ok(serde_json::from_str(&response_text)?)
    }

    /// Get the trading status of one instrument
    pub async fn get_trading_status(
        &self,
        instrument_id: &str
    ) -> Result<GetTradingStatusResponse> {
        if instrument_id.is_empty() {
            anyhow::bail!("Instrument id is required");
        }

        let body = json!({ "instrumentId": instrument_id });
        let response_text = invest_post(
            &self.http,
            &self.config,
            "MarketDataService/GetTradingStatus",
            &body
        )
        .await?;

        Ok(serde_json::from_str(&response_text)?)
    }

    pub async fn get_trading_statuses(
        &self,
        instrument_ids: Vec<&str>
    ) -> Result<Vec<GetTradingStatusResponse>> {
        if instrument_ids.is_empty() {
            anyhow::bail!("At least one instrument id is required");
        }

        let body = json!({ "instrumentId": instrument_ids });
        let response_text = invest_post(
            &self.http,
            &self.config,
            "MarketDataService/GetTradingStatuses",
            &body
        )
        .await?;
        let response: GetTradingStatusesResponse = serde_json::from_str(&response_text)?;

        Ok(response.trading_statuses)
    }

    /// Get anonymous trades of one instrument. The gateway serves the last hour only.
    pub async fn get_last_trades(
        &self,
        instrument_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>
    ) -> Result<Vec<Trade>> {
        if instrument_id.is_empty() {
            anyhow::bail!("Instrument id is required");
        }
        if from > to {
            anyhow::bail!("from {} is after to {}", from, to);
        }

        let request = GetLastTradesRequest {
            instrument_id: instrument_id.to_string(),
            from,
            to
        };
        let response_text = invest_post(
            &self.http,
            &self.config,
            "MarketDataService/GetLastTrades",
            &request
        )
        .await?;
        let response: GetLastTradesResponse = serde_json::from_str(&response_text)?;

        debug!(parent: &self.span, instrument_id, count = response.trades.len(), "trades received");
        Ok(response.trades)
    }

    /// Get the close prices of the last trading session
    pub async fn get_close_prices(
        &self,
        instrument_ids: Vec<&str>
    ) -> Result<Vec<InstrumentClosePrice>> {
        if instrument_ids.is_empty() {
            anyhow::bail!("At least one instrument id is required");
        }

        let request = GetClosePricesRequest {
            instruments: instrument_ids
                .into_iter()
                .map(|id| InstrumentClosePriceRequest {
                    instrument_id: id.to_string()
                })
                .collect()
        };
        let response_text = invest_post(
            &self.http,
            &self.config,
            "MarketDataService/GetClosePrices",
            &request
        )
        .await?;
        let response: GetClosePricesResponse = serde_json::from_str(&response_text)?;

        Ok(response.close_prices)
    }

    /// Fetcher wired to this client, the instruments service and a CSV exporter into
    /// the configured export dir.
    pub fn historic_fetcher(&self) -> GatewayHistoricFetcher {
        HistoricFetcher::new(
            self.clone(),
            InstrumentsClient::new(self.config.clone(), self.http.clone(), self.span.clone()),
            CsvExporter::new(self.config.export_dir.clone()),
            self.span.clone()
        )
    }

    /// Load any range of candles, splitting it into as many calls as the gateway needs.
    ///
    /// With [`crate::history::CandlesOutput::File`] the result is also written as
    /// `instrument;time;open;close;high;low;volume` rows into the configured export dir.
    pub async fn get_historic_candles(
        &self,
        request: &HistoricCandlesRequest
    ) -> Result<HistoricCandles, InvestError> {
        self.historic_fetcher().fetch(request).await
    }

    /// Load every candle the instrument has; the request's range is ignored.
    pub async fn get_all_historic_candles(
        &self,
        request: &HistoricCandlesRequest
    ) -> Result<HistoricCandles, InvestError> {
        self.historic_fetcher().fetch_all(request).await
    }
}

impl CandleSource for MarketDataClient {
    async fn candles(
        &self,
        instrument_id: &str,
        interval: CandleInterval,
        from: DateTime<Utc>,
        to: DateTime<Utc>
    ) -> Result<Vec<HistoricCandle>, InvestError> {
        Ok(self.get_candles(instrument_id, interval, from, to).await?)
    }
}
