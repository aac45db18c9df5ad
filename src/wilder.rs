//! RSI and ATR with Wilder smoothing (alpha = 1 / period).
//!
//! `ta` smooths both with a 2 / (period + 1) EMA, which reacts roughly twice
//! as fast. The rule thresholds and ATR multipliers are tuned for Wilder's
//! version, so these two are computed here in the same `Next` style as ADX.

use ta::{Close, High, Low, Next};

/// Relative Strength Index.
///
/// Gains and losses start at zero on the first bar and are then smoothed with
/// `avg += (x - avg) / period`. The first value appears on bar `period`.
/// A window without losses reads 100.
#[derive(Debug, Clone)]
pub struct WilderRsi {
    period: usize,
    prev_close: Option<f64>,
    avg_gain: f64,
    avg_loss: f64,
    bars: usize,
}

impl WilderRsi {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            avg_gain: 0.0,
            avg_loss: 0.0,
            bars: 0,
        }
    }
}

impl Next<f64> for WilderRsi {
    type Output = Option<f64>;

    fn next(&mut self, close: f64) -> Option<f64> {
        self.bars += 1;
        if let Some(prev) = self.prev_close.replace(close) {
            let change = close - prev;
            let w = self.period as f64;
            self.avg_gain += (change.max(0.0) - self.avg_gain) / w;
            self.avg_loss += ((-change).max(0.0) - self.avg_loss) / w;
        }

        if self.bars < self.period {
            return None;
        }
        if self.avg_loss == 0.0 {
            return Some(100.0);
        }
        let rs = self.avg_gain / self.avg_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}

impl<T: Close> Next<&T> for WilderRsi {
    type Output = Option<f64>;

    fn next(&mut self, bar: &T) -> Option<f64> {
        self.next(bar.close())
    }
}

/// Average True Range.
///
/// The first bar's true range is its high - low. The first value is the mean
/// of the first `period` true ranges, after that
/// `atr = (atr * (period - 1) + tr) / period`.
#[derive(Debug, Clone)]
pub struct WilderAtr {
    period: usize,
    prev_close: Option<f64>,
    tr_sum: f64,
    bars: usize,
    atr: Option<f64>,
}

impl WilderAtr {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            tr_sum: 0.0,
            bars: 0,
            atr: None,
        }
    }
}

impl<T: High + Low + Close> Next<&T> for WilderAtr {
    type Output = Option<f64>;

    fn next(&mut self, bar: &T) -> Option<f64> {
        let (high, low) = (bar.high(), bar.low());
        let tr = match self.prev_close.replace(bar.close()) {
            Some(prev) => (high - low).max((high - prev).abs()).max((low - prev).abs()),
            None => high - low,
        };

        let w = self.period as f64;
        self.atr = match self.atr {
            Some(atr) => Some((atr * (w - 1.0) + tr) / w),
            None => {
                self.bars += 1;
                self.tr_sum += tr;
                (self.bars == self.period).then(|| self.tr_sum / w)
            }
        };
        self.atr
    }
}
