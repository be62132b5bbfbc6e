use tokio_util::sync::CancellationToken;
use tracing::{info_span, Span};

use crate::config::Config;
use crate::error::InvestError;
use crate::subscription::{StreamResponse, SubscriptionStream};
use crate::transport::WsTransport;
use crate::types::{
    AccountsRequest, PortfolioResponse, PortfolioStreamResponse, PositionData,
    PositionsStreamResponse
};

pub type PortfolioStream = SubscriptionStream<WsTransport<PortfolioStreamResponse>>;
pub type PositionsStream = SubscriptionStream<WsTransport<PositionsStreamResponse>>;

impl StreamResponse for PortfolioStreamResponse {
    type Payload = PortfolioResponse;

    fn into_payload(self) -> Result<PortfolioResponse, Self> {
        match self {
            PortfolioStreamResponse::Portfolio(portfolio) => Ok(portfolio),
            other => Err(other)
        }
    }
}

impl StreamResponse for PositionsStreamResponse {
    type Payload = PositionData;

    fn into_payload(self) -> Result<PositionData, Self> {
        match self {
            PositionsStreamResponse::Position(position) => Ok(position),
            other => Err(other)
        }
    }
}

/// Use the configured account when the caller names none.
pub(crate) fn resolve_accounts(
    accounts: Vec<String>,
    config: &Config
) -> Result<Vec<String>, InvestError> {
    if !accounts.is_empty() {
        return Ok(accounts);
    }
    match &config.account_id {
        Some(account_id) if !account_id.is_empty() => Ok(vec![account_id.clone()]),
        _ => Err(InvestError::InvalidRequest(
            "no accounts given and no default account configured".to_string()
        ))
    }
}

/// Factory for `OperationsStreamService` subscriptions
#[derive(Debug, Clone)]
pub struct OperationsStreamClient {
    config: Config,
    span: Span,
    token: CancellationToken
}

impl OperationsStreamClient {
    /// `token` is the parent of every stream token handed out; cancelling it stops them all.
    pub fn new(config: Config, span: Span, token: CancellationToken) -> Self {
        Self {
            config,
            span,
            token
        }
    }

    /// Subscribe to portfolio updates for `accounts`.
    ///
    /// # Arguments
    /// * `accounts` - Account ids; empty means the configured default account
    ///
    /// The returned stream delivers nothing until [`SubscriptionStream::listen`] runs.
    pub async fn portfolio_stream(
        &self,
        accounts: Vec<String>
    ) -> Result<PortfolioStream, InvestError> {
        let accounts = resolve_accounts(accounts, &self.config)?;
        let span = info_span!(parent: &self.span, "portfolio_stream", accounts = ?accounts);
        let token = self.token.child_token();

        let transport = WsTransport::connect(
            &self.config,
            "OperationsStreamService/PortfolioStream",
            &AccountsRequest { accounts },
            token.clone(),
            span.clone()
        )
        .await?;

        Ok(SubscriptionStream::new("portfolio", transport, token, span))
    }

    /// Subscribe to position changes for `accounts`.
    pub async fn positions_stream(
        &self,
        accounts: Vec<String>
    ) -> Result<PositionsStream, InvestError> {
        let accounts = resolve_accounts(accounts, &self.config)?;
        let span = info_span!(parent: &self.span, "positions_stream", accounts = ?accounts);
        let token = self.token.child_token();

        let transport = WsTransport::connect(
            &self.config,
            "OperationsStreamService/PositionsStream",
            &AccountsRequest { accounts },
            token.clone(),
            span.clone()
        )
        .await?;

        Ok(SubscriptionStream::new("positions", transport, token, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::loopback::{serve, subscription};
    use crate::transport::scripted::ScriptedTransport;
    use futures_util::StreamExt;
    use serde_json::json;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    fn frames<M: serde::de::DeserializeOwned>(raw: &[&str]) -> Vec<Result<M, TransportError>> {
        raw.iter()
            .map(|frame| Ok(serde_json::from_str(frame).unwrap()))
            .collect()
    }

    #[test]
    fn test_resolve_accounts() {
        let mut config = Config::new("t.test");
        assert!(matches!(
            resolve_accounts(vec![], &config),
            Err(InvestError::InvalidRequest(_))
        ));

        config.account_id = Some("2000123456".to_string());
        assert_eq!(
            resolve_accounts(vec![], &config).unwrap(),
            vec!["2000123456".to_string()]
        );
        assert_eq!(
            resolve_accounts(vec!["42".to_string()], &config).unwrap(),
            vec!["42".to_string()]
        );
    }

    #[tokio::test]
    async fn test_portfolio_stream_delivers_portfolios_only() {
        let script = frames::<PortfolioStreamResponse>(&[
            r#"{"subscriptions": {"trackingId": "abc", "accounts": []}}"#,
            r#"{"ping": {"time": "2023-04-18T07:00:00Z"}}"#,
            r#"{"portfolio": {"accountId": "2000123456", "positions": []}}"#,
            r#"{"somethingNew": {}}"#,
            r#"{"portfolio": {"accountId": "2000654321"}}"#,
        ]);
        let token = CancellationToken::new();
        let transport = ScriptedTransport::new(script, token.clone());
        let mut stream = SubscriptionStream::with_capacity(
            "portfolio",
            transport,
            token,
            Span::none(),
            4
        );
        let output = stream.output();
        let stop = stream.stop_handle();

        let listener = tokio::spawn(async move { stream.listen().await });

        let first = output.recv().await.unwrap();
        let second = output.recv().await.unwrap();
        assert_eq!(first.account_id, "2000123456");
        assert_eq!(second.account_id, "2000654321");

        stop.cancel();
        assert!(listener.await.unwrap().is_ok());
        assert!(output.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_positions_stream_surfaces_failure() {
        let mut script = frames::<PositionsStreamResponse>(&[
            r#"{"initialPositions": {"accountId": "2000123456"}}"#,
            r#"{"position": {"accountId": "2000123456",
                "securities": [{"figi": "BBG004730N88", "balance": "10", "blocked": "0"}]}}"#,
        ]);
        script.push(Err(TransportError::Failed("closed by server".to_string())));

        let token = CancellationToken::new();
        let transport = ScriptedTransport::new(script, token.clone());
        let mut stream = SubscriptionStream::with_capacity(
            "positions",
            transport,
            token,
            Span::none(),
            4
        );
        let output = stream.output();

        let result = stream.listen().await;
        assert!(matches!(
            result,
            Err(InvestError::Transport(TransportError::Failed(_)))
        ));

        let position = output.recv().await.unwrap();
        assert_eq!(position.securities[0].balance, 10);
        assert!(output.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_requires_accounts() {
        let client = OperationsStreamClient::new(
            Config::new("t.test"),
            Span::none(),
            CancellationToken::new()
        );
        let result = client.portfolio_stream(vec![]).await;
        assert!(matches!(result, Err(InvestError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_stopped_stream_closes_socket() {
        let (mut config, server) = serve(|mut ws| async move {
            assert_eq!(
                subscription(&mut ws).await,
                json!({ "accounts": ["2000123456"] })
            );
            let next = tokio::time::timeout(Duration::from_secs(2), ws.next())
                .await
                .expect("socket left open after stop");
            assert!(matches!(next, Some(Ok(Message::Close(_)))));
        })
        .await;
        config.account_id = Some("2000123456".to_string());

        let client = OperationsStreamClient::new(config, Span::none(), CancellationToken::new());
        let mut stream = client.portfolio_stream(vec![]).await.unwrap();
        stream.stop();

        assert!(stream.listen().await.is_ok());
        assert!(stream.is_closed());
        server.await.unwrap();
    }
}
