use anyhow::Result;
use cached::proc_macro::cached;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, Span};

use crate::config::Config;
use crate::error::InvestError;
use crate::history::InstrumentLookup;
use crate::http::invest_post;
use crate::types::{CandleInterval, FindInstrumentResponse, InstrumentShort};

/// Client for the `InstrumentsService` search method
#[derive(Debug, Clone)]
pub struct InstrumentsClient {
    config: Config,
    http: Client,
    span: Span
}

impl InstrumentsClient {
    pub fn new(config: Config, http: Client, span: Span) -> Self {
        Self { config, http, span }
    }

    /// Search instruments by FIGI, ticker, uid or name
    ///
    /// # Note
    /// Results are cached for 8 hours; first candle dates do not move.
    pub async fn find_instrument(&self, query: &str) -> Result<Vec<InstrumentShort>> {
        find_instrument(&self.http, &self.config, query).await
    }
}

#[cached(
    ty = "cached::TimedCache<String, Vec<InstrumentShort>>",
    create = r#"{ cached::TimedCache::with_lifespan(60*60*8) }"#,
    key = "String",
    convert = r#"{ format!("{}:{}", config.endpoint, query) }"#,
    result = true
)]
async fn find_instrument(
    http: &Client,
    config: &Config,
    query: &str
) -> Result<Vec<InstrumentShort>> {
    if query.is_empty() {
        anyhow::bail!("Query is required");
    }

    let body = json!({ "query": query });
    let response_text =
        invest_post(http, config, "InstrumentsService/FindInstrument", &body).await?;
    let response: FindInstrumentResponse = serde_json::from_str(&response_text)?;

    Ok(response.instruments)
}

/// First candle date usable for `interval`: daily history for day/week/month,
/// minute history otherwise.
pub fn first_candle_date(
    instrument: &InstrumentShort,
    interval: CandleInterval
) -> Option<DateTime<Utc>> {
    if interval.is_daily_based() {
        instrument.first_1day_candle_date
    } else {
        instrument.first_1min_candle_date
    }
}

impl InstrumentLookup for InstrumentsClient {
    async fn earliest_date(
        &self,
        instrument_id: &str,
        interval: CandleInterval
    ) -> Result<DateTime<Utc>, InvestError> {
        let instruments = self.find_instrument(instrument_id).await?;
        let Some(instrument) = instruments.first() else {
            return Err(InvestError::InstrumentNotFound(instrument_id.to_string()));
        };
        debug!(parent: &self.span, instrument_id, figi = %instrument.figi, "instrument found");

        first_candle_date(instrument, interval)
            .ok_or_else(|| InvestError::InstrumentNotFound(instrument_id.to_string()))
    }
}
