//! Signal classification: the long/short threshold filter and the weighted
//! score with its badges.
//!
//! Every predicate reads `Option<f64>` inputs; an undefined input makes the
//! predicate false, so missing data can only ever push a result to `Neutral`.

use crate::indicators::IndicatorSnapshot;
use crate::models::AuxSignals;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
    Neutral,
}

impl Signal {
    /// Ranking priority: longs first, then shorts, then neutrals.
    pub fn priority(self) -> u8 {
        match self {
            Signal::Long => 0,
            Signal::Short => 1,
            Signal::Neutral => 2,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Short => write!(f, "SHORT"),
            Signal::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Which directions a run reports.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum SideFilter {
    #[default]
    All,
    Long,
    Short,
}

impl SideFilter {
    pub fn allows(self, signal: Signal) -> bool {
        match (self, signal) {
            (SideFilter::All, _) => true,
            (SideFilter::Long, Signal::Long) => true,
            (SideFilter::Short, Signal::Short) => true,
            _ => false,
        }
    }
}

/// An open interval `(low, high)`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| self.low < v && v < self.high)
    }
}

/// Thresholds of the long/short filter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RuleSet {
    /// 1.0 is strict `ema9 > ema21 > ema50`; 0.995 is the soft variant.
    pub trend_tolerance: f64,
    pub long_rsi: Band,
    pub short_rsi: Band,
    pub min_adx: f64,
    /// Last volume must exceed `volume_factor * vol_sma20`.
    pub volume_factor: f64,
    pub long_funding: Band,
    pub short_funding: Band,
    /// When set, longs need `cmf20 > -guard` and shorts `cmf20 < guard`.
    pub cmf_guard: Option<f64>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            trend_tolerance: 1.0,
            long_rsi: Band::new(42.0, 68.0),
            short_rsi: Band::new(32.0, 58.0),
            min_adx: 20.0,
            volume_factor: 1.0,
            long_funding: Band::new(0.0, 0.02),
            short_funding: Band::new(-0.02, 0.0),
            cmf_guard: None,
        }
    }
}

pub const SOFT_TREND_TOLERANCE: f64 = 0.995;

fn gt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

fn lt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

fn scaled(value: Option<f64>, factor: f64) -> Option<f64> {
    value.map(|v| v * factor)
}

impl RuleSet {
    pub fn is_long(&self, snap: &IndicatorSnapshot, aux: Option<&AuxSignals>) -> bool {
        let tol = self.trend_tolerance;
        gt(snap.ema9, scaled(snap.ema21, tol))
            && gt(snap.ema21, scaled(snap.ema50, tol))
            && self.long_rsi.contains(snap.rsi14)
            && snap.adx14.is_some_and(|adx| adx >= self.min_adx)
            && gt(snap.macd_line, snap.macd_signal)
            && gt(snap.volume, scaled(snap.vol_sma20, self.volume_factor))
            && self
                .cmf_guard
                .is_none_or(|guard| snap.cmf20.is_some_and(|cmf| cmf > -guard))
            && aux.is_none_or(|aux| {
                self.long_funding.contains(aux.funding_rate)
                    && aux.oi_change_pct.is_some_and(|oi| oi > 0.0)
            })
    }

    pub fn is_short(&self, snap: &IndicatorSnapshot, aux: Option<&AuxSignals>) -> bool {
        let tol = 2.0 - self.trend_tolerance;
        lt(snap.ema9, scaled(snap.ema21, tol))
            && lt(snap.ema21, scaled(snap.ema50, tol))
            && self.short_rsi.contains(snap.rsi14)
            && snap.adx14.is_some_and(|adx| adx >= self.min_adx)
            && lt(snap.macd_line, snap.macd_signal)
            && gt(snap.volume, scaled(snap.vol_sma20, self.volume_factor))
            && self
                .cmf_guard
                .is_none_or(|guard| snap.cmf20.is_some_and(|cmf| cmf < guard))
            && aux.is_none_or(|aux| {
                self.short_funding.contains(aux.funding_rate)
                    && aux.oi_change_pct.is_some_and(|oi| oi > 0.0)
            })
    }

    /// Binary filter. `aux` is `None` for markets that have no auxiliary
    /// signals at all; a present-but-incomplete `aux` fails its predicates.
    pub fn classify(&self, snap: &IndicatorSnapshot, aux: Option<&AuxSignals>) -> Signal {
        if self.is_long(snap, aux) {
            Signal::Long
        } else if self.is_short(snap, aux) {
            Signal::Short
        } else {
            Signal::Neutral
        }
    }
}

/// Weights and thresholds of the score variant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScoreRules {
    pub cross_weight: u32,
    pub squeeze_weight: u32,
    pub obv_weight: u32,
    pub max_bb_width: f64,
    pub max_atr_pct: f64,
    pub long_rsi_zone: Band,
    pub short_rsi_zone: Band,
    pub volume_spike: f64,
    /// Max distance of close from SMA20, as a fraction of SMA20.
    pub bounce_distance: f64,
}

impl Default for ScoreRules {
    fn default() -> Self {
        Self {
            cross_weight: 3,
            squeeze_weight: 2,
            obv_weight: 2,
            max_bb_width: 0.06,
            max_atr_pct: 3.0,
            long_rsi_zone: Band::new(45.0, 60.0),
            short_rsi_zone: Band::new(40.0, 55.0),
            volume_spike: 1.3,
            bounce_distance: 0.02,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreCard {
    pub score: u32,
    /// Rules worth two points or more, in evaluation order.
    pub strong: Vec<&'static str>,
    /// One-point rules, in evaluation order.
    pub moderate: Vec<&'static str>,
}

impl ScoreCard {
    fn add(&mut self, weight: u32, badge: &'static str) {
        self.score += weight;
        if weight >= 2 {
            self.strong.push(badge);
        } else {
            self.moderate.push(badge);
        }
    }

    /// Badges as one display line: strong ones starred, moderate ones bulleted.
    pub fn badge_line(&self) -> String {
        self.strong
            .iter()
            .map(|b| format!("⭐ {b}"))
            .chain(self.moderate.iter().map(|b| format!("• {b}")))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl ScoreRules {
    /// Scores one side. `side` must be `Long` or `Short`; `Neutral` scores zero.
    pub fn score(&self, snap: &IndicatorSnapshot, side: Signal) -> ScoreCard {
        let mut card = ScoreCard::default();
        let long = match side {
            Signal::Long => true,
            Signal::Short => false,
            Signal::Neutral => return card,
        };

        if long && gt(snap.ema50, snap.ema200) {
            card.add(self.cross_weight, "Golden Cross");
        }
        if !long && lt(snap.ema50, snap.ema200) {
            card.add(self.cross_weight, "Death Cross");
        }
        if long && snap.obv_slope.is_some_and(|s| s > 0.0) {
            card.add(self.obv_weight, "OBV ↑");
        }
        if !long && snap.obv_slope.is_some_and(|s| s < 0.0) {
            card.add(self.obv_weight, "OBV ↓");
        }
        if snap.bb_width.is_some_and(|w| w < self.max_bb_width)
            && snap.atr_pct.is_some_and(|a| a < self.max_atr_pct)
        {
            card.add(self.squeeze_weight, "Squeeze (BB+ATR)");
        }

        if long && gt(snap.macd_line, snap.macd_signal) {
            card.add(1, "MACD Up");
        }
        if !long && lt(snap.macd_line, snap.macd_signal) {
            card.add(1, "MACD Down");
        }
        let zone = if long { self.long_rsi_zone } else { self.short_rsi_zone };
        if zone.contains(snap.rsi14) {
            card.add(1, "RSI Zone");
        }
        if long && snap.cmf20.is_some_and(|c| c > 0.0) {
            card.add(1, "CMF+");
        }
        if !long && snap.cmf20.is_some_and(|c| c < 0.0) {
            card.add(1, "CMF-");
        }
        if snap.volume_ratio().is_some_and(|r| r >= self.volume_spike) {
            card.add(1, "Volume Spike");
        }
        if self.is_bounce(snap, long) {
            card.add(1, "SMA20 Bounce");
        }
        card
    }

    fn is_bounce(&self, snap: &IndicatorSnapshot, long: bool) -> bool {
        let (Some(close), Some(sma)) = (snap.close, snap.sma20) else {
            return false;
        };
        if sma <= 0.0 {
            return false;
        }
        let near = ((close - sma) / sma).abs() <= self.bounce_distance;
        let right_side = if long { close >= sma } else { close <= sma };
        near && right_side
    }
}
