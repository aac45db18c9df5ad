//! Entry / stop / target levels from the latest ATR.

use crate::signals::Signal;
use serde::{Deserialize, Serialize};

/// Coarse holding horizon; picks the default ATR multipliers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    #[default]
    Daily,
    Weekly,
}

impl Horizon {
    pub fn multipliers(self) -> AtrMultipliers {
        match self {
            Horizon::Daily => AtrMultipliers { stop: 1.5, target: 2.0 },
            Horizon::Weekly => AtrMultipliers { stop: 2.0, target: 4.0 },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AtrMultipliers {
    pub stop: f64,
    pub target: f64,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct TradeLevels {
    pub entry: f64,
    pub stop: Option<f64>,
    pub target: Option<f64>,
    /// Distance entry→stop as a percentage of entry.
    pub stop_pct: Option<f64>,
    /// Distance entry→target as a percentage of entry.
    pub target_pct: Option<f64>,
    pub risk_reward: Option<f64>,
}

impl TradeLevels {
    fn entry_only(entry: f64) -> Self {
        Self {
            entry,
            ..Self::default()
        }
    }

    /// Levels for `signal` at `close`. Neutral, or an ATR that is undefined or
    /// not positive, leaves stop and target undefined.
    pub fn compute(signal: Signal, close: f64, atr: Option<f64>, mult: AtrMultipliers) -> Self {
        let entry = close;
        let Some(atr) = atr.filter(|a| a.is_finite() && *a > 0.0) else {
            return Self::entry_only(entry);
        };

        let (stop, target) = match signal {
            Signal::Long => (entry - mult.stop * atr, entry + mult.target * atr),
            Signal::Short => (entry + mult.stop * atr, entry - mult.target * atr),
            Signal::Neutral => return Self::entry_only(entry),
        };

        let (stop_pct, target_pct) = if entry > 0.0 {
            (
                Some((stop - entry).abs() / entry * 100.0),
                Some((target - entry).abs() / entry * 100.0),
            )
        } else {
            (None, None)
        };

        Self {
            entry,
            stop: Some(stop),
            target: Some(target),
            stop_pct,
            target_pct,
            risk_reward: risk_reward(stop_pct, target_pct),
        }
    }
}

/// Target-side move over stop-side move; undefined unless the stop move is positive.
pub fn risk_reward(stop_pct: Option<f64>, target_pct: Option<f64>) -> Option<f64> {
    match (stop_pct, target_pct) {
        (Some(stop), Some(target)) if stop > 0.0 => Some(target / stop),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DAILY: AtrMultipliers = AtrMultipliers { stop: 1.5, target: 2.0 };

    #[test]
    fn long_levels() {
        let levels = TradeLevels::compute(Signal::Long, 100.0, Some(2.0), DAILY);
        assert_eq!(levels.entry, 100.0);
        assert_relative_eq!(levels.stop.unwrap(), 97.0, epsilon = 1e-9);
        assert_relative_eq!(levels.target.unwrap(), 104.0, epsilon = 1e-9);
        assert_relative_eq!(levels.stop_pct.unwrap(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(levels.target_pct.unwrap(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(levels.risk_reward.unwrap(), 4.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn short_levels_mirror_long() {
        let levels = TradeLevels::compute(Signal::Short, 100.0, Some(2.0), DAILY);
        assert_eq!(levels.entry, 100.0);
        assert_relative_eq!(levels.stop.unwrap(), 103.0, epsilon = 1e-9);
        assert_relative_eq!(levels.target.unwrap(), 96.0, epsilon = 1e-9);
        assert_relative_eq!(levels.risk_reward.unwrap(), 4.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_or_zero_atr_leaves_levels_undefined() {
        for atr in [None, Some(0.0), Some(-1.0), Some(f64::NAN)] {
            let levels = TradeLevels::compute(Signal::Long, 100.0, atr, DAILY);
            assert_eq!(levels.entry, 100.0);
            assert_eq!(levels.stop, None);
            assert_eq!(levels.target, None);
            assert_eq!(levels.risk_reward, None);
        }
    }

    #[test]
    fn neutral_has_entry_only() {
        let levels = TradeLevels::compute(Signal::Neutral, 50.0, Some(1.0), DAILY);
        assert_eq!(levels.entry, 50.0);
        assert!(levels.stop.is_none() && levels.target.is_none());
    }

    #[test]
    fn weekly_horizon_widens_band() {
        let weekly = Horizon::Weekly.multipliers();
        let levels = TradeLevels::compute(Signal::Long, 100.0, Some(2.0), weekly);
        assert_relative_eq!(levels.stop.unwrap(), 96.0, epsilon = 1e-9);
        assert_relative_eq!(levels.target.unwrap(), 108.0, epsilon = 1e-9);
        assert_relative_eq!(levels.risk_reward.unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn risk_reward_needs_positive_stop_move() {
        assert_eq!(risk_reward(Some(0.0), Some(2.0)), None);
        assert_eq!(risk_reward(None, Some(2.0)), None);
        assert_eq!(risk_reward(Some(2.0), Some(5.0)), Some(2.5));
    }
}
