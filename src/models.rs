//! Core market data types: instruments, candles and auxiliary signals.

use crate::error::SeriesError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Spot,
    #[default]
    Futures,
}

impl MarketKind {
    pub fn default_base_url(self) -> &'static str {
        match self {
            MarketKind::Spot => "https://api.binance.com",
            MarketKind::Futures => "https://fapi.binance.com",
        }
    }

    pub fn exchange_info_path(self) -> &'static str {
        match self {
            MarketKind::Spot => "/api/v3/exchangeInfo",
            MarketKind::Futures => "/fapi/v1/exchangeInfo",
        }
    }

    pub fn klines_path(self) -> &'static str {
        match self {
            MarketKind::Spot => "/api/v3/klines",
            MarketKind::Futures => "/fapi/v1/klines",
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketKind::Spot => write!(f, "spot"),
            MarketKind::Futures => write!(f, "futures"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub symbol: String,
    pub market: MarketKind,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, market: MarketKind) -> Self {
        Self {
            symbol: symbol.into(),
            market,
        }
    }
}

/// One OHLCV bar. `open_time` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    fn is_valid(&self) -> bool {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        fields.iter().all(|v| v.is_finite())
            && self.open > 0.0
            && self.close > 0.0
            && self.high >= 0.0
            && self.low >= 0.0
            && self.volume >= 0.0
    }
}

// The `ta` indicators take anything that exposes these accessors.
impl ta::Open for Candle {
    fn open(&self) -> f64 {
        self.open
    }
}

impl ta::High for Candle {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for Candle {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for Candle {
    fn close(&self) -> f64 {
        self.close
    }
}

impl ta::Volume for Candle {
    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Candles for one instrument at one interval, ascending by open time.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validates ordering and values. Duplicate timestamps count as out of order.
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (index, candle) in candles.iter().enumerate() {
            if !candle.is_valid() {
                return Err(SeriesError::InvalidValue { index });
            }
            if index > 0 && candle.open_time <= candles[index - 1].open_time {
                return Err(SeriesError::OutOfOrder { index });
            }
        }
        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

/// Derivatives-market scalars that do not come from candles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AuxSignals {
    /// Latest funding rate as a fraction (0.0001 = 0.01%).
    pub funding_rate: Option<f64>,
    /// Percentage change between the two latest open-interest samples.
    pub oi_change_pct: Option<f64>,
}

/// Percentage change from `prev` to `last`; `None` when `prev` is zero.
pub fn pct_change(prev: f64, last: f64) -> Option<f64> {
    if prev == 0.0 || !prev.is_finite() || !last.is_finite() {
        return None;
    }
    Some((last - prev) / prev * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open_time: i64, close: f64) -> Candle {
        Candle {
            open_time,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn series_accepts_ascending_bars() {
        let series = CandleSeries::new(vec![bar(1, 10.0), bar(2, 11.0), bar(3, 12.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last().map(|c| c.close), Some(12.0));
    }

    #[test]
    fn series_rejects_duplicate_open_time() {
        let err = CandleSeries::new(vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert_eq!(err, SeriesError::OutOfOrder { index: 1 });
    }

    #[test]
    fn series_rejects_nan_close() {
        let err = CandleSeries::new(vec![bar(1, 10.0), bar(2, f64::NAN)]).unwrap_err();
        assert_eq!(err, SeriesError::InvalidValue { index: 1 });
    }

    #[test]
    fn pct_change_guards_zero_base() {
        assert_eq!(pct_change(0.0, 10.0), None);
        assert_eq!(pct_change(200.0, 210.0), Some(5.0));
    }
}
