use std::fmt;
use std::sync::Arc;
use tokio::select;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Span};

use crate::error::InvestError;
use crate::transport::Transport;

/// Capacity of the output queue when none is given: a single slot, so an idle
/// consumer stalls the reader almost immediately.
pub const DEFAULT_CAPACITY: usize = 1;

/// A server message that may carry the payload a stream exists to deliver.
///
/// Everything that is not the payload (pings, subscription acks, unknown kinds)
/// comes back as `Err(self)` and is logged and dropped by the stream.
pub trait StreamResponse: fmt::Debug + Send + 'static {
    type Payload: Send + 'static;

    fn into_payload(self) -> Result<Self::Payload, Self>
    where
        Self: Sized;
}

type Payload<T> = <<T as Transport>::Message as StreamResponse>::Payload;

/// Read side of a stream's output queue.
///
/// Clones share the same FIFO, so several consumers can drain one stream; each item
/// goes to exactly one of them. `recv` returns `None` once the stream has shut down and
/// every buffered item has been taken.
pub struct Output<P> {
    rx: Arc<Mutex<mpsc::Receiver<P>>>
}

impl<P> Clone for Output<P> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx)
        }
    }
}

impl<P> fmt::Debug for Output<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

impl<P> Output<P> {
    pub async fn recv(&self) -> Option<P> {
        self.rx.lock().await.recv().await
    }
}

/// Lifecycle manager for one server stream (portfolio, positions, trades, ...).
///
/// One task drives [`listen`](Self::listen); it is the only reader of the transport and
/// the only producer on the output queue. Other tasks read from [`output`](Self::output)
/// and may request shutdown through [`stop`](Self::stop) or a [`stop_handle`](Self::stop_handle).
///
/// # Example
///
/// ```rust,no_run
/// # async fn run(client: rust_invest::InvestClient) -> Result<(), rust_invest::InvestError> {
/// let mut stream = client
///     .operations_stream()
///     .portfolio_stream(vec!["2000123456".to_string()])
///     .await?;
/// let portfolios = stream.output();
/// let stop = stream.stop_handle();
///
/// let listener = tokio::spawn(async move { stream.listen().await });
///
/// while let Some(portfolio) = portfolios.recv().await {
///     println!("portfolio update for {}", portfolio.account_id);
///     stop.cancel();
/// }
/// listener.await.expect("listener panicked")?;
/// # Ok(())
/// # }
/// ```
pub struct SubscriptionStream<T>
where
    T: Transport,
    T::Message: StreamResponse
{
    name: &'static str,
    transport: T,
    tx: Option<mpsc::Sender<Payload<T>>>,
    output: Output<Payload<T>>,
    token: CancellationToken,
    span: Span
}

impl<T> SubscriptionStream<T>
where
    T: Transport,
    T::Message: StreamResponse
{
    /// Wrap `transport`. `token` must be the token the transport observes for cancellation.
    pub fn new(name: &'static str, transport: T, token: CancellationToken, span: Span) -> Self {
        Self::with_capacity(name, transport, token, span, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(
        name: &'static str,
        transport: T,
        token: CancellationToken,
        span: Span,
        capacity: usize
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            name,
            transport,
            tx: Some(tx),
            output: Output {
                rx: Arc::new(Mutex::new(rx))
            },
            token,
            span
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The queue consumers read from; the same queue for the stream's whole lifetime.
    pub fn output(&self) -> Output<Payload<T>> {
        self.output.clone()
    }

    /// Request shutdown. Does not wait for `listen` to notice.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            debug!(parent: &self.span, stream = self.name, "stop requested");
        }
        self.token.cancel();
    }

    /// Token that stops this stream when cancelled, for use from another task.
    pub fn stop_handle(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    /// Read the transport until it is cancelled or fails, forwarding payloads to the output.
    ///
    /// Returns `Ok(())` after a local stop, the transport error otherwise. The transport is
    /// closed and the output queue is closed when this returns; calling it again
    /// yields [`InvestError::StreamClosed`].
    pub async fn listen(&mut self) -> Result<(), InvestError> {
        let Some(tx) = self.tx.take() else {
            return Err(InvestError::StreamClosed);
        };
        let result = self.run(&tx).await;
        self.shutdown(tx).await;
        result
    }

    async fn run(&mut self, tx: &mpsc::Sender<Payload<T>>) -> Result<(), InvestError> {
        loop {
            if self.token.is_cancelled() {
                return Ok(());
            }

            let message = match self.transport.receive().await {
                Ok(message) => message,
                Err(e) if e.is_cancelled() => {
                    info!(parent: &self.span, stream = self.name, "stop listening");
                    return Ok(());
                }
                Err(e) => return Err(e.into())
            };

            match message.into_payload() {
                Ok(payload) => {
                    // Blocks while the queue is full; only a stop request interrupts it.
                    select! {
                        biased;
                        _ = self.token.cancelled() => return Ok(()),
                        sent = tx.send(payload) => {
                            if sent.is_err() {
                                return Ok(());
                            }
                        }
                    }
                }
                Err(other) => {
                    info!(
                        parent: &self.span,
                        stream = self.name,
                        frame = ?other,
                        "info from stream"
                    );
                }
            }
        }
    }

    async fn shutdown(&mut self, tx: mpsc::Sender<Payload<T>>) {
        info!(parent: &self.span, stream = self.name, "close stream");
        self.transport.cancel();
        self.transport.close().await;
        drop(tx);
    }
}

impl<T> fmt::Debug for SubscriptionStream<T>
where
    T: Transport,
    T::Message: StreamResponse
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionStream")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
