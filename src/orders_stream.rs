use tokio_util::sync::CancellationToken;
use tracing::{info_span, Span};

use crate::config::Config;
use crate::error::InvestError;
use crate::operations_stream::resolve_accounts;
use crate::subscription::{StreamResponse, SubscriptionStream};
use crate::transport::WsTransport;
use crate::types::{AccountsRequest, OrderTrades, TradesStreamResponse};

pub type TradesStream = SubscriptionStream<WsTransport<TradesStreamResponse>>;

impl StreamResponse for TradesStreamResponse {
    type Payload = OrderTrades;

    fn into_payload(self) -> Result<OrderTrades, Self> {
        match self {
            TradesStreamResponse::OrderTrades(trades) => Ok(trades),
            other => Err(other)
        }
    }
}

/// Factory for `OrdersStreamService` subscriptions
#[derive(Debug, Clone)]
pub struct OrdersStreamClient {
    config: Config,
    span: Span,
    token: CancellationToken
}

impl OrdersStreamClient {
    pub fn new(config: Config, span: Span, token: CancellationToken) -> Self {
        Self {
            config,
            span,
            token
        }
    }

    /// Subscribe to trade executions of orders placed on `accounts`.
    pub async fn trades_stream(&self, accounts: Vec<String>) -> Result<TradesStream, InvestError> {
        let accounts = resolve_accounts(accounts, &self.config)?;
        let span = info_span!(parent: &self.span, "trades_stream", accounts = ?accounts);
        let token = self.token.child_token();

        let transport = WsTransport::connect(
            &self.config,
            "OrdersStreamService/TradesStream",
            &AccountsRequest { accounts },
            token.clone(),
            span.clone()
        )
        .await?;

        Ok(SubscriptionStream::new("trades", transport, token, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::scripted::ScriptedTransport;

    #[test]
    fn test_into_payload() {
        let frame: TradesStreamResponse = serde_json::from_str(
            r#"{"orderTrades": {"orderId": "R1", "direction": "ORDER_DIRECTION_BUY",
                "figi": "BBG004730N88", "accountId": "2000123456",
                "trades": [{"dateTime": "2023-04-18T07:00:00Z",
                    "price": {"units": "250", "nano": 0}, "quantity": "10", "tradeId": "T1"}]}}"#
        )
        .unwrap();
        let trades = frame.into_payload().unwrap();
        assert_eq!(trades.order_id, "R1");
        assert_eq!(trades.trades[0].quantity, 10);

        let ping: TradesStreamResponse =
            serde_json::from_str(r#"{"ping": {"time": "2023-04-18T07:00:00Z"}}"#).unwrap();
        assert!(matches!(ping.into_payload(), Err(TradesStreamResponse::Ping(_))));
    }

    #[tokio::test]
    async fn test_parent_token_stops_stream() {
        let parent = CancellationToken::new();
        let token = parent.child_token();
        let script = vec![Ok(TradesStreamResponse::Subscription(serde_json::Value::Null))];
        let transport = ScriptedTransport::<TradesStreamResponse>::new(script, token.clone());
        let mut stream = SubscriptionStream::new("trades", transport, token, Span::none());
        let output = stream.output();

        let listener = tokio::spawn(async move { stream.listen().await });
        parent.cancel();

        assert!(listener.await.unwrap().is_ok());
        assert!(output.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_trades_stream_requires_accounts() {
        let client = OrdersStreamClient::new(
            Config::new("t.test"),
            Span::none(),
            CancellationToken::new()
        );
        assert!(matches!(
            client.trades_stream(vec![]).await,
            Err(InvestError::InvalidRequest(_))
        ));
    }
}
