pub mod client;
pub mod config;
pub mod custom_datetime;
mod error;
pub mod export;
pub mod history;
pub mod http;
pub mod instruments;
pub mod market_data;
pub mod operations_stream;
pub mod orders_stream;
pub mod subscription;
pub mod transport;
pub mod types;
pub mod util;
pub mod window;

pub use client::InvestClient;
pub use config::Config;
pub use error::{InvestError, TransportError};

// Re-export commonly used types
pub use types::{
    CandleInterval, GetOrderBookResponse, GetTradingStatusResponse, HistoricCandle,
    InstrumentClosePrice, InstrumentShort, LastPrice, MoneyValue, Order, OrderTrade, OrderTrades,
    PortfolioPosition, PortfolioResponse, PositionData, Quotation, Trade
};

// Re-export stream types
pub use operations_stream::{OperationsStreamClient, PortfolioStream, PositionsStream};
pub use orders_stream::{OrdersStreamClient, TradesStream};
pub use subscription::{Output, StreamResponse, SubscriptionStream};
pub use transport::{Transport, WsTransport};

// Re-export historic candles
pub use export::CsvExporter;
pub use history::{
    CandleExport, CandleSource, CandlesOutput, HistoricCandles, HistoricCandlesRequest,
    HistoricFetcher, InstrumentLookup, Sleeper, TokioSleeper
};
pub use instruments::InstrumentsClient;
pub use market_data::MarketDataClient;
pub use window::{max_span, plan, Window};
