use chrono::{DateTime, Duration, Utc};

use crate::types::CandleInterval;

/// A sub-range `[from, to)` small enough for a single candles request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>
}

impl Window {
    pub fn span(&self) -> Duration {
        self.to - self.from
    }
}

/// Longest range the candles method accepts in one call for `interval`.
///
/// These are the gateway's published limits; unspecified intervals are served as hourly.
pub fn max_span(interval: CandleInterval) -> Duration {
    match interval {
        CandleInterval::Sec5
        | CandleInterval::Sec10
        | CandleInterval::Sec30
        | CandleInterval::Min1
        | CandleInterval::Min2
        | CandleInterval::Min3
        | CandleInterval::Min5
        | CandleInterval::Min10
        | CandleInterval::Min15 => Duration::days(1),
        CandleInterval::Min30 => Duration::days(2),
        CandleInterval::Hour | CandleInterval::Unspecified => Duration::days(7),
        CandleInterval::Hour2 | CandleInterval::Hour4 => Duration::days(30),
        CandleInterval::Day => Duration::days(360),
        CandleInterval::Week | CandleInterval::Month => Duration::days(720)
    }
}

/// Split `[from, to)` into request windows, newest first.
///
/// Boundaries are taken every `max_span` back from `to`; the oldest window always starts
/// exactly at `from` and may be shorter than the others.
pub fn plan(from: DateTime<Utc>, to: DateTime<Utc>, interval: CandleInterval) -> Vec<Window> {
    let span = max_span(interval);
    if to - from <= span {
        return vec![Window { from, to }];
    }

    let mut bounds = Vec::new();
    let mut low = to;
    while low > from {
        bounds.push(low);
        low = match low.checked_sub_signed(span) {
            Some(next) => next,
            None => break
        };
    }
    bounds.push(from);

    bounds
        .windows(2)
        .map(|pair| Window {
            from: pair[1],
            to: pair[0]
        })
        .collect()
}
