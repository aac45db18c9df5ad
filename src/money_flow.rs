//! Volume-weighted indicators missing from the `ta` crate: Chaikin Money Flow
//! and On-Balance Volume.

use std::collections::VecDeque;
use ta::{Close, High, Low, Next, Volume};

/// Chaikin Money Flow over a rolling window.
///
/// MFM = ((close - low) - (high - close)) / (high - low), 0 on a zero-range bar
/// CMF = sum(MFM * volume) / sum(volume)
#[derive(Debug, Clone)]
pub struct ChaikinMoneyFlow {
    period: usize,
    window: VecDeque<(f64, f64)>,
    flow_sum: f64,
    volume_sum: f64,
}

impl ChaikinMoneyFlow {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            flow_sum: 0.0,
            volume_sum: 0.0,
        }
    }
}

impl<T: High + Low + Close + Volume> Next<&T> for ChaikinMoneyFlow {
    type Output = Option<f64>;

    fn next(&mut self, bar: &T) -> Option<f64> {
        let range = bar.high() - bar.low();
        let multiplier = if range > 0.0 {
            ((bar.close() - bar.low()) - (bar.high() - bar.close())) / range
        } else {
            0.0
        };
        let flow = multiplier * bar.volume();

        self.window.push_back((flow, bar.volume()));
        self.flow_sum += flow;
        self.volume_sum += bar.volume();
        if self.window.len() > self.period {
            if let Some((old_flow, old_volume)) = self.window.pop_front() {
                self.flow_sum -= old_flow;
                self.volume_sum -= old_volume;
            }
        }

        if self.window.len() < self.period || self.volume_sum <= 0.0 {
            return None;
        }
        Some(self.flow_sum / self.volume_sum)
    }
}

/// On-Balance Volume, accumulated from the first bar and never reset.
///
/// The first bar contributes its volume; afterwards volume is added on an up
/// close, subtracted on a down close and ignored on an unchanged close.
#[derive(Debug, Clone, Default)]
pub struct OnBalanceVolume {
    obv: f64,
    prev_close: Option<f64>,
}

impl OnBalanceVolume {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Close + Volume> Next<&T> for OnBalanceVolume {
    type Output = f64;

    fn next(&mut self, bar: &T) -> f64 {
        match self.prev_close {
            None => self.obv = bar.volume(),
            Some(prev) if bar.close() > prev => self.obv += bar.volume(),
            Some(prev) if bar.close() < prev => self.obv -= bar.volume(),
            Some(_) => {}
        }
        self.prev_close = Some(bar.close());
        self.obv
    }
}
