use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::select;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Span};

use crate::config::Config;
use crate::error::TransportError;
use crate::http::method_url;

/// Duplex server stream consumed by [`crate::subscription::SubscriptionStream`].
///
/// `receive` yields the next decoded server message. Once `cancel` has been called,
/// pending and future `receive` calls fail with [`TransportError::Cancelled`].
/// `close` releases the underlying connection; calls after the first do nothing.
pub trait Transport: Send {
    type Message: Send;

    fn receive(&mut self) -> impl Future<Output = Result<Self::Message, TransportError>> + Send;

    fn cancel(&self);

    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Upper bound on the close handshake; a stalled peer must not hold up shutdown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Server stream carried over the gateway's websocket endpoint, one JSON object per text frame.
pub struct WsTransport<M> {
    ws: WsStream,
    token: CancellationToken,
    span: Span,
    closed: bool,
    _message: PhantomData<fn() -> M>
}

impl<M> WsTransport<M>
where
    M: DeserializeOwned + Send
{
    /// Open the stream for `method` (e.g. `OperationsStreamService/PortfolioStream`) and send
    /// the subscription request.
    ///
    /// `token` is shared with the owning stream: cancelling it unblocks `receive`.
    pub async fn connect<R>(
        config: &Config,
        method: &str,
        request: &R,
        token: CancellationToken,
        span: Span
    ) -> Result<Self, TransportError>
    where
        R: Serialize + ?Sized
    {
        let url = method_url(&config.ws_endpoint, method);
        let mut ws_request = url.as_str().into_client_request()?;
        let headers = ws_request.headers_mut();
        headers.insert("Authorization", header_value(&format!("Bearer {}", config.token))?);
        headers.insert("Sec-WebSocket-Protocol", HeaderValue::from_static("json"));
        headers.insert("x-app-name", header_value(&config.app_name)?);

        debug!(parent: &span, %url, "connecting to stream");
        let (mut ws, _) = connect_async(ws_request).await?;

        let payload = serde_json::to_string(request)
            .map_err(|e| TransportError::Failed(format!("cannot encode subscription: {}", e)))?;
        ws.send(Message::Text(payload)).await?;
        info!(parent: &span, method, "subscribed to stream");

        Ok(Self {
            ws,
            token,
            span,
            closed: false,
            _message: PhantomData
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value)
        .map_err(|e| TransportError::Failed(format!("invalid header value: {}", e)))
}

impl<M> Transport for WsTransport<M>
where
    M: DeserializeOwned + Send
{
    type Message = M;

    async fn receive(&mut self) -> Result<M, TransportError> {
        loop {
            let message = select! {
                biased;
                _ = self.token.cancelled() => return Err(TransportError::Cancelled),
                message = self.ws.next() => message
            };

            match message {
                Some(Ok(Message::Text(payload))) => {
                    return serde_json::from_str(&payload).map_err(|e| {
                        TransportError::Failed(format!("malformed frame: {}", e))
                    });
                }
                Some(Ok(Message::Ping(payload))) => {
                    self.ws.send(Message::Pong(payload)).await?;
                }
                Some(Ok(Message::Close(frame))) => {
                    return Err(TransportError::Failed(format!(
                        "closed by server: {:?}",
                        frame
                    )));
                }
                Some(Ok(other)) => {
                    debug!(parent: &self.span, ?other, "ignoring non-text frame");
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Err(TransportError::Failed("stream ended".to_string()))
            }
        }
    }

    fn cancel(&self) {
        self.token.cancel();
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match timeout(CLOSE_TIMEOUT, self.ws.close(None)).await {
            Ok(Ok(())) => debug!(parent: &self.span, "websocket closed"),
            Ok(Err(e)) => debug!(parent: &self.span, error = %e, "websocket already gone"),
            Err(_) => debug!(parent: &self.span, "websocket close timed out")
        }
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// In-memory transport replaying a fixed script, then idling until cancelled.
    pub struct ScriptedTransport<M> {
        script: VecDeque<Result<M, TransportError>>,
        token: CancellationToken,
        pub cancels: Arc<AtomicUsize>,
        pub closes: Arc<AtomicUsize>
    }

    impl<M> ScriptedTransport<M> {
        pub fn new(script: Vec<Result<M, TransportError>>, token: CancellationToken) -> Self {
            Self {
                script: script.into(),
                token,
                cancels: Arc::new(AtomicUsize::new(0)),
                closes: Arc::new(AtomicUsize::new(0))
            }
        }
    }

    impl<M: Send> Transport for ScriptedTransport<M> {
        type Message = M;

        async fn receive(&mut self) -> Result<M, TransportError> {
            if self.token.is_cancelled() {
                return Err(TransportError::Cancelled);
            }
            match self.script.pop_front() {
                Some(next) => next,
                None => {
                    self.token.cancelled().await;
                    Err(TransportError::Cancelled)
                }
            }
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            self.token.cancel();
        }

        async fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
