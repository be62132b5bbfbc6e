use chrono::{Duration, TimeZone, Utc};
use rust_invest::{CandleInterval, Config, InvestClient};
use std::error::Error;
use tracing::{error, info_span};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,rust_invest=debug".to_string())
        )
        .init();

    let client = InvestClient::new(Config::from_env()?, info_span!("invest"));
    let market_data = client.market_data();

    // Three Russian shares
    let instruments = vec!["BBG004730N88", "BBG00475KKY8", "BBG004RVFCY3"];

    let from = Utc.with_ymd_and_hms(2023, 4, 18, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2023, 4, 19, 0, 0, 0).unwrap();
    match market_data
        .get_candles(instruments[0], CandleInterval::Hour, from, to)
        .await
    {
        Ok(candles) => {
            for (i, candle) in candles.iter().enumerate() {
                println!("candle number {}, low price = {}", i, candle.low.to_f64());
            }
        }
        Err(e) => error!("{}", e)
    }

    match market_data.get_trading_status(instruments[1]).await {
        Ok(status) => println!("trading status = {}", status.trading_status),
        Err(e) => error!("{}", e)
    }

    match market_data.get_last_prices(instruments.clone()).await {
        Ok(prices) => {
            for (i, price) in prices.iter().enumerate() {
                let value = price.price.map(|p| p.to_f64()).unwrap_or_default();
                println!("last price number {} = {}", i, value);
            }
        }
        Err(e) => error!("{}", e)
    }

    match market_data.get_order_book(instruments[2], 1).await {
        Ok(book) => println!("order book bids = {:?}", book.bids),
        Err(e) => error!("{}", e)
    }

    let now = Utc::now();
    match market_data
        .get_last_trades(instruments[1], now - Duration::minutes(1), now)
        .await
    {
        Ok(trades) => {
            for (i, trade) in trades.iter().enumerate() {
                let value = trade.price.map(|p| p.to_f64()).unwrap_or_default();
                println!("last trade number {}, price = {}", i, value);
            }
        }
        Err(e) => error!("{}", e)
    }

    match market_data.get_close_prices(instruments).await {
        Ok(prices) => {
            for price in prices {
                let value = price.price.map(|p| p.to_f64()).unwrap_or_default();
                println!("close price = {}", value);
            }
        }
        Err(e) => error!("{}", e)
    }

    Ok(())
}
