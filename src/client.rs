use anyhow::Result;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Span};

use crate::config::Config;
use crate::instruments::InstrumentsClient;
use crate::market_data::{GatewayHistoricFetcher, MarketDataClient};
use crate::operations_stream::OperationsStreamClient;
use crate::orders_stream::OrdersStreamClient;

/// Entry point holding the configuration, one shared HTTP connection pool and the
/// cancellation root for every stream it opens.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> anyhow::Result<()> {
/// use rust_invest::{Config, InvestClient};
///
/// let client = InvestClient::new(Config::from_env()?, tracing::info_span!("invest"));
/// let prices = client.market_data().get_last_prices(vec!["BBG004730N88"]).await?;
/// println!("{:?}", prices);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InvestClient {
    config: Config,
    http: Client,
    span: Span,
    token: CancellationToken
}

impl InvestClient {
    /// `span` becomes the parent of everything the client and its services log.
    pub fn new(config: Config, span: Span) -> Self {
        Self {
            config,
            http: Client::new(),
            span,
            token: CancellationToken::new()
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?, info_span!("invest")))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn market_data(&self) -> MarketDataClient {
        MarketDataClient::new(
            self.config.clone(),
            self.http.clone(),
            info_span!(parent: &self.span, "market_data")
        )
    }

    pub fn instruments(&self) -> InstrumentsClient {
        InstrumentsClient::new(
            self.config.clone(),
            self.http.clone(),
            info_span!(parent: &self.span, "instruments")
        )
    }

    pub fn operations_stream(&self) -> OperationsStreamClient {
        OperationsStreamClient::new(
            self.config.clone(),
            info_span!(parent: &self.span, "operations_stream"),
            self.token.clone()
        )
    }

    pub fn orders_stream(&self) -> OrdersStreamClient {
        OrdersStreamClient::new(
            self.config.clone(),
            info_span!(parent: &self.span, "orders_stream"),
            self.token.clone()
        )
    }

    pub fn historic_fetcher(&self) -> GatewayHistoricFetcher {
        self.market_data().historic_fetcher()
    }

    /// Stop every stream opened through this client (and its clones).
    pub fn stop(&self) {
        self.token.cancel();
    }
}
