//! Presentation order of the report rows.

use crate::analysis::ReportRow;
use crate::config::Mode;
use crate::models::MarketKind;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Secondary key of the signal ordering, always descending.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Absolute open-interest change.
    OiChange,
    Rsi,
    Adx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Longs, then shorts, then neutrals; ties by the given magnitude.
    Signal(TieBreak),
    /// Score descending, then risk/reward descending.
    Score,
}

impl RankOrder {
    /// Filter mode breaks ties on `tie_break` when given, otherwise on OI
    /// change (futures) or ADX (spot). Score mode ignores it.
    pub fn for_run(mode: Mode, market: MarketKind, tie_break: Option<TieBreak>) -> Self {
        match (mode, market) {
            (Mode::Score, _) => RankOrder::Score,
            (Mode::Filter, MarketKind::Futures) => {
                RankOrder::Signal(tie_break.unwrap_or(TieBreak::OiChange))
            }
            (Mode::Filter, MarketKind::Spot) => RankOrder::Signal(tie_break.unwrap_or(TieBreak::Adx)),
        }
    }

    pub fn compare(self, a: &ReportRow, b: &ReportRow) -> Ordering {
        match self {
            RankOrder::Signal(tie) => a
                .signal
                .priority()
                .cmp(&b.signal.priority())
                .then_with(|| descending(tie.key(a), tie.key(b))),
            RankOrder::Score => b
                .score_value()
                .cmp(&a.score_value())
                .then_with(|| descending(a.levels.risk_reward, b.levels.risk_reward)),
        }
    }
}

impl TieBreak {
    fn key(self, row: &ReportRow) -> Option<f64> {
        match self {
            TieBreak::OiChange => row.aux.and_then(|aux| aux.oi_change_pct).map(f64::abs),
            TieBreak::Rsi => row.snapshot.rsi14,
            TieBreak::Adx => row.snapshot.adx14,
        }
    }
}

// Undefined magnitudes sort after every defined one.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.filter(|v| !v.is_nan()).unwrap_or(f64::NEG_INFINITY);
    let b = b.filter(|v| !v.is_nan()).unwrap_or(f64::NEG_INFINITY);
    b.total_cmp(&a)
}

/// Sorts in place. The sort is stable, so rows with equal keys keep their
/// discovery order.
pub fn rank(rows: &mut [ReportRow], order: RankOrder) {
    rows.sort_by(|a, b| order.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorSnapshot;
    use crate::levels::TradeLevels;
    use crate::models::{AuxSignals, Instrument};
    use crate::signals::{ScoreCard, Signal};

    fn row(symbol: &str, signal: Signal, oi: Option<f64>, adx: Option<f64>) -> ReportRow {
        ReportRow {
            instrument: Instrument::new(symbol, MarketKind::Futures),
            signal,
            score: None,
            levels: TradeLevels::default(),
            snapshot: IndicatorSnapshot {
                adx14: adx,
                ..IndicatorSnapshot::default()
            },
            aux: Some(AuxSignals {
                funding_rate: None,
                oi_change_pct: oi,
            }),
        }
    }

    fn scored(symbol: &str, score: u32, rr: Option<f64>) -> ReportRow {
        ReportRow {
            score: Some(ScoreCard {
                score,
                ..ScoreCard::default()
            }),
            levels: TradeLevels {
                risk_reward: rr,
                ..TradeLevels::default()
            },
            ..row(symbol, Signal::Long, None, None)
        }
    }

    fn symbols(rows: &[ReportRow]) -> Vec<&str> {
        rows.iter().map(|r| r.instrument.symbol.as_str()).collect()
    }

    #[test]
    fn signal_priority_then_absolute_oi() {
        let mut rows = vec![
            row("N1", Signal::Neutral, Some(50.0), None),
            row("S1", Signal::Short, Some(1.0), None),
            row("L1", Signal::Long, Some(2.0), None),
            row("L2", Signal::Long, Some(-7.5), None),
            row("L3", Signal::Long, None, None),
        ];
        rank(&mut rows, RankOrder::Signal(TieBreak::OiChange));
        assert_eq!(symbols(&rows), vec!["L2", "L1", "L3", "S1", "N1"]);
    }

    #[test]
    fn spot_ties_break_on_adx() {
        let mut rows = vec![
            row("A", Signal::Short, None, Some(22.0)),
            row("B", Signal::Short, None, Some(41.0)),
            row("C", Signal::Short, None, None),
        ];
        rank(&mut rows, RankOrder::for_run(Mode::Filter, MarketKind::Spot, None));
        assert_eq!(symbols(&rows), vec!["B", "A", "C"]);
    }

    #[test]
    fn configured_rsi_tie_break_overrides_market_default() {
        let with_rsi = |symbol: &str, rsi: Option<f64>, oi: f64| ReportRow {
            snapshot: IndicatorSnapshot {
                rsi14: rsi,
                ..IndicatorSnapshot::default()
            },
            ..row(symbol, Signal::Long, Some(oi), None)
        };
        let mut rows = vec![
            with_rsi("CALM", Some(48.0), 30.0),
            with_rsi("HOT", Some(66.5), 1.0),
            with_rsi("UNKNOWN", None, 90.0),
        ];
        let order = RankOrder::for_run(Mode::Filter, MarketKind::Futures, Some(TieBreak::Rsi));
        assert_eq!(order, RankOrder::Signal(TieBreak::Rsi));
        rank(&mut rows, order);
        assert_eq!(symbols(&rows), vec!["HOT", "CALM", "UNKNOWN"]);

        assert_eq!(
            RankOrder::for_run(Mode::Filter, MarketKind::Futures, None),
            RankOrder::Signal(TieBreak::OiChange)
        );
    }

    #[test]
    fn equal_keys_keep_discovery_order() {
        let mut rows = vec![
            row("FIRST", Signal::Long, Some(3.0), None),
            row("OTHER", Signal::Short, Some(9.0), None),
            row("SECOND", Signal::Long, Some(-3.0), None),
            row("THIRD", Signal::Long, Some(3.0), None),
        ];
        rank(&mut rows, RankOrder::Signal(TieBreak::OiChange));
        assert_eq!(symbols(&rows), vec!["FIRST", "SECOND", "THIRD", "OTHER"]);
    }

    #[test]
    fn score_order_uses_risk_reward_second() {
        let mut rows = vec![
            scored("LOW", 4, Some(3.0)),
            scored("HIGH_RR", 9, Some(1.8)),
            scored("TOP", 9, Some(2.2)),
            scored("NO_RR", 9, None),
        ];
        rank(&mut rows, RankOrder::for_run(Mode::Score, MarketKind::Spot, Some(TieBreak::Rsi)));
        assert_eq!(symbols(&rows), vec!["TOP", "HIGH_RR", "NO_RR", "LOW"]);
    }
}
