//! Average Directional Index with Wilder smoothing.
//!
//! The `ta` crate has no ADX, so this one follows its `Next` convention:
//! feed bars in order, get `None` until the index has warmed up.
//!
//! 1. +DM / -DM and true range from consecutive bars
//! 2. Wilder-smooth all three over `period` bars (seeded with their sum)
//! 3. +DI, -DI = smoothed DM / smoothed TR * 100
//! 4. DX = |+DI - -DI| / (+DI + -DI) * 100
//! 5. ADX = mean of the first `period` DX values, then Wilder-smoothed
//!
//! The first value appears on bar `2 * period`.

use ta::{Close, High, Low, Next};

#[derive(Debug, Clone)]
pub struct AverageDirectionalIndex {
    period: usize,
    prev: Option<(f64, f64, f64)>,
    plus_dm: f64,
    minus_dm: f64,
    tr: f64,
    dm_count: usize,
    dx_sum: f64,
    dx_count: usize,
    adx: Option<f64>,
}

impl AverageDirectionalIndex {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev: None,
            plus_dm: 0.0,
            minus_dm: 0.0,
            tr: 0.0,
            dm_count: 0,
            dx_sum: 0.0,
            dx_count: 0,
            adx: None,
        }
    }

    fn dx(&self) -> f64 {
        if self.tr <= 0.0 {
            return 0.0;
        }
        let di_pos = self.plus_dm / self.tr * 100.0;
        let di_neg = self.minus_dm / self.tr * 100.0;
        let sum = di_pos + di_neg;
        if sum > 0.0 {
            (di_pos - di_neg).abs() / sum * 100.0
        } else {
            0.0
        }
    }
}

impl<T: High + Low + Close> Next<&T> for AverageDirectionalIndex {
    type Output = Option<f64>;

    fn next(&mut self, bar: &T) -> Option<f64> {
        let (high, low, close) = (bar.high(), bar.low(), bar.close());
        let Some((prev_high, prev_low, prev_close)) = self.prev.replace((high, low, close)) else {
            return None;
        };

        let up_move = high - prev_high;
        let down_move = prev_low - low;
        let plus_dm = if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 };
        let minus_dm = if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 };
        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());

        let w = self.period as f64;
        if self.dm_count < self.period {
            self.plus_dm += plus_dm;
            self.minus_dm += minus_dm;
            self.tr += tr;
            self.dm_count += 1;
            if self.dm_count < self.period {
                return None;
            }
        } else {
            self.plus_dm = self.plus_dm - self.plus_dm / w + plus_dm;
            self.minus_dm = self.minus_dm - self.minus_dm / w + minus_dm;
            self.tr = self.tr - self.tr / w + tr;
        }

        let dx = self.dx();
        match self.adx {
            Some(prev_adx) => {
                let adx = (prev_adx * (w - 1.0) + dx) / w;
                self.adx = Some(adx);
            }
            None => {
                self.dx_sum += dx;
                self.dx_count += 1;
                if self.dx_count == self.period {
                    self.adx = Some(self.dx_sum / w);
                }
            }
        }
        self.adx
    }
}
