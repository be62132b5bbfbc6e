use rust_invest::{Config, InvestClient};
use std::error::Error;
use tokio::select;
use tracing::{error, info, info_span};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,rust_invest=debug".to_string())
        )
        .init();

    // INVEST_TOKEN and INVEST_ACCOUNT_ID must be set
    let config = Config::from_env()?;
    let client = InvestClient::new(config, info_span!("invest"));
    let operations = client.operations_stream();

    let mut positions_stream = operations.positions_stream(vec![]).await?;
    let mut portfolio_stream = operations.portfolio_stream(vec![]).await?;

    let positions = positions_stream.output();
    let portfolios = portfolio_stream.output();

    let positions_listener = tokio::spawn(async move {
        if let Err(e) = positions_stream.listen().await {
            error!("positions stream: {}", e);
        }
    });
    let portfolio_listener = tokio::spawn(async move {
        if let Err(e) = portfolio_stream.listen().await {
            error!("portfolio stream: {}", e);
        }
    });

    let printer = tokio::spawn(async move {
        let mut positions_open = true;
        let mut portfolios_open = true;
        while positions_open || portfolios_open {
            select! {
                position = positions.recv(), if positions_open => match position {
                    Some(position) => println!("Position {:?}", position),
                    None => positions_open = false
                },
                portfolio = portfolios.recv(), if portfolios_open => match portfolio {
                    Some(portfolio) => println!("Portfolio {:?}", portfolio),
                    None => portfolios_open = false
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    client.stop();

    positions_listener.await?;
    portfolio_listener.await?;
    printer.await?;
    Ok(())
}
