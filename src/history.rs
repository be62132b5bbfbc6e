use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn, Span};

use crate::error::InvestError;
use crate::types::{CandleInterval, HistoricCandle};
use crate::window::plan;

/// Calls allowed before the fetcher pauses; one below the gateway's per-minute quota.
pub const REQUESTS_PER_PAUSE: usize = 299;

/// Length of the pause taken every [`REQUESTS_PER_PAUSE`] calls.
pub const THROTTLE_PAUSE: Duration = Duration::from_secs(60);

/// One unary candles call. Never asked for more than [`crate::window::max_span`] at once.
pub trait CandleSource: Send + Sync {
    fn candles(
        &self,
        instrument_id: &str,
        interval: CandleInterval,
        from: DateTime<Utc>,
        to: DateTime<Utc>
    ) -> impl Future<Output = Result<Vec<HistoricCandle>, InvestError>> + Send;
}

/// Earliest date candles of `interval` exist for an instrument.
pub trait InstrumentLookup: Send + Sync {
    fn earliest_date(
        &self,
        instrument_id: &str,
        interval: CandleInterval
    ) -> impl Future<Output = Result<DateTime<Utc>, InvestError>> + Send;
}

/// Tabular export of a finished fetch. Returns where the records were written.
pub trait CandleExport: Send + Sync {
    fn export(
        &self,
        candles: &[HistoricCandle],
        instrument_id: &str,
        name: Option<&str>
    ) -> Result<PathBuf, InvestError>;
}

/// Pause used by the request throttle; swapped out in tests.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CandlesOutput {
    #[default]
    Memory,
    /// Also write the result to a file; `None` picks a timestamped name.
    File { name: Option<String> }
}

#[derive(Debug, Clone)]
pub struct HistoricCandlesRequest {
    pub instrument: String,
    pub interval: CandleInterval,
    /// Leave both bounds unset to fetch everything from the first available candle until now.
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub output: CandlesOutput
}

impl HistoricCandlesRequest {
    pub fn new(instrument: impl Into<String>, interval: CandleInterval) -> Self {
        Self {
            instrument: instrument.into(),
            interval,
            from: None,
            to: None,
            output: CandlesOutput::Memory
        }
    }

    pub fn range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn to_file(mut self, name: Option<String>) -> Self {
        self.output = CandlesOutput::File { name };
        self
    }
}

/// Result of a fetch. `export` is `None` unless file output was requested; a failed export
/// leaves `candles` intact.
#[derive(Debug)]
pub struct HistoricCandles {
    pub candles: Vec<HistoricCandle>,
    pub export: Option<Result<PathBuf, InvestError>>
}

impl HistoricCandles {
    pub fn export_error(&self) -> Option<&InvestError> {
        self.export.as_ref().and_then(|result| result.as_ref().err())
    }
}

/// Downloads arbitrarily long candle histories one window at a time.
pub struct HistoricFetcher<S, L, E, P = TokioSleeper> {
    source: S,
    lookup: L,
    exporter: E,
    sleeper: P,
    span: Span
}

impl<S, L, E> HistoricFetcher<S, L, E, TokioSleeper>
where
    S: CandleSource,
    L: InstrumentLookup,
    E: CandleExport
{
    pub fn new(source: S, lookup: L, exporter: E, span: Span) -> Self {
        Self {
            source,
            lookup,
            exporter,
            sleeper: TokioSleeper,
            span
        }
    }
}

impl<S, L, E, P> HistoricFetcher<S, L, E, P>
where
    S: CandleSource,
    L: InstrumentLookup,
    E: CandleExport,
    P: Sleeper
{
    pub fn with_sleeper<Q: Sleeper>(self, sleeper: Q) -> HistoricFetcher<S, L, E, Q> {
        HistoricFetcher {
            source: self.source,
            lookup: self.lookup,
            exporter: self.exporter,
            sleeper,
            span: self.span
        }
    }

    /// Fetch every candle in the request's range, oldest window first.
    ///
    /// Any failed call aborts the whole fetch; there are no partial results and no retries.
    pub async fn fetch(
        &self,
        request: &HistoricCandlesRequest
    ) -> Result<HistoricCandles, InvestError> {
        let (from, to) = match (request.from, request.to) {
            (Some(from), Some(to)) => (from, to),
            (None, None) => self.whole_history(request).await?,
            _ => {
                return Err(InvestError::InvalidRange(
                    "set both from and to, or neither".to_string()
                ))
            }
        };
        self.fetch_range(request, from, to).await
    }

    /// Fetch the instrument's whole history, ignoring any range set on the request.
    pub async fn fetch_all(
        &self,
        request: &HistoricCandlesRequest
    ) -> Result<HistoricCandles, InvestError> {
        let (from, to) = self.whole_history(request).await?;
        self.fetch_range(request, from, to).await
    }

    async fn whole_history(
        &self,
        request: &HistoricCandlesRequest
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), InvestError> {
        let from = self
            .lookup
            .earliest_date(&request.instrument, request.interval)
            .await?;
        debug!(
            parent: &self.span,
            instrument = %request.instrument,
            %from,
            "resolved first candle date"
        );
        Ok((from, Utc::now()))
    }

    async fn fetch_range(
        &self,
        request: &HistoricCandlesRequest,
        from: DateTime<Utc>,
        to: DateTime<Utc>
    ) -> Result<HistoricCandles, InvestError> {
        if from > to {
            return Err(InvestError::InvalidRange(format!(
                "from {} is after to {}",
                from, to
            )));
        }

        let windows = plan(from, to, request.interval);
        info!(
            parent: &self.span,
            instrument = %request.instrument,
            interval = %request.interval,
            windows = windows.len(),
            "fetching historic candles"
        );

        let mut candles = Vec::new();
        let mut requests = 0;
        for window in windows.iter().rev() {
            requests += 1;
            let batch = match self
                .source
                .candles(&request.instrument, request.interval, window.from, window.to)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(
                        parent: &self.span,
                        from = %window.from,
                        to = %window.to,
                        error = %e,
                        "candles request failed"
                    );
                    return Err(e);
                }
            };
            candles.extend(batch);

            if requests == REQUESTS_PER_PAUSE {
                info!(
                    parent: &self.span,
                    pause = ?THROTTLE_PAUSE,
                    "request quota reached, pausing"
                );
                self.sleeper.sleep(THROTTLE_PAUSE).await;
                requests = 0;
            }
        }

        let export = match &request.output {
            CandlesOutput::Memory => None,
            CandlesOutput::File { name } => {
                let result = self
                    .exporter
                    .export(&candles, &request.instrument, name.as_deref());
                match &result {
                    Ok(path) => {
                        info!(parent: &self.span, path = %path.display(), "candles exported")
                    }
                    Err(e) => warn!(parent: &self.span, error = %e, "candles export failed")
                }
                Some(result)
            }
        };

        Ok(HistoricCandles { candles, export })
    }
}
