use chrono::{Duration, Utc};
use rust_invest::{CandleInterval, Config, HistoricCandlesRequest, InvestClient};
use std::error::Error;
use tracing::{info, info_span, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,rust_invest=debug".to_string())
        )
        .init();

    let config = Config::from_env()?;
    let client = InvestClient::new(config, info_span!("invest"));
    let market_data = client.market_data();

    // Minute candles for the last two days, kept in memory
    let now = Utc::now();
    let request = HistoricCandlesRequest::new("BBG004730N88", CandleInterval::Min1)
        .range(now - Duration::hours(48), now);
    let result = market_data.get_historic_candles(&request).await?;
    for (i, candle) in result.candles.iter().enumerate().take(10) {
        println!("candle {} open = {}", i, candle.open.to_f64());
    }
    info!("loaded {} minute candles", result.candles.len());

    // Every daily candle since the first trading day, written to all_sber_candles.csv
    let request = HistoricCandlesRequest::new("BBG004730N88", CandleInterval::Day)
        .to_file(Some("all_sber_candles".to_string()));
    let result = market_data.get_all_historic_candles(&request).await?;
    match result.export {
        Some(Ok(path)) => println!(
            "{} daily candles saved to {}",
            result.candles.len(),
            path.display()
        ),
        Some(Err(e)) => warn!("candles loaded but not saved: {}", e),
        None => {}
    }

    Ok(())
}
