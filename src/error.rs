//! Error types shared by the fetch, series and pipeline stages.

use thiserror::Error;

/// Why a call to the exchange produced no usable data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider error {code}: {msg}")]
    Provider { code: i64, msg: String },

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("empty response")]
    Empty,

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

/// A candle series that cannot be used for indicator computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} has a non-finite or negative field")]
    InvalidValue { index: usize },

    #[error("open time not strictly increasing at bar {index}")]
    OutOfOrder { index: usize },
}

/// Per-instrument outcome that keeps the instrument out of the report.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no candles returned")]
    NoCandles,

    #[error("insufficient history: have {bars} bars, need {minimum}")]
    InsufficientHistory { bars: usize, minimum: usize },

    #[error("malformed candles: {0}")]
    MalformedCandles(String),

    #[error("risk/reward undefined or below threshold")]
    BelowRiskReward,

    #[error("filtered by side / signal settings")]
    Filtered,
}

impl From<SeriesError> for SkipReason {
    fn from(err: SeriesError) -> Self {
        SkipReason::MalformedCandles(err.to_string())
    }
}

impl SkipReason {
    /// Stable short label used when aggregating skip counts.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::Fetch(_) => "fetch",
            SkipReason::NoCandles => "no_candles",
            SkipReason::InsufficientHistory { .. } => "insufficient_history",
            SkipReason::MalformedCandles(_) => "malformed_candles",
            SkipReason::BelowRiskReward => "below_risk_reward",
            SkipReason::Filtered => "filtered",
        }
    }
}
