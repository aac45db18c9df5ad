//! This module contains the core screening pipeline logic.

use crate::config::{AppConfig, Mode, SCORE_MIN_BARS};
use crate::error::SkipReason;
use crate::indicators::{IndicatorEngine, IndicatorSnapshot, MIN_BARS};
use crate::levels::TradeLevels;
use crate::models::{AuxSignals, CandleSeries, Instrument};
use crate::ranking::{RankOrder, rank};
use crate::signals::{ScoreCard, Signal};
use crate::source::MarketSource;
use std::collections::BTreeMap;
use std::time::Duration;

/// One line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub instrument: Instrument,
    /// Filter mode: the classification. Score mode: the scored side.
    pub signal: Signal,
    /// Present in score mode only.
    pub score: Option<ScoreCard>,
    pub levels: TradeLevels,
    pub snapshot: IndicatorSnapshot,
    pub aux: Option<AuxSignals>,
}

impl ReportRow {
    pub fn score_value(&self) -> u32 {
        self.score.as_ref().map_or(0, |card| card.score)
    }
}

#[derive(Debug, Default)]
pub struct ScreenOutcome {
    /// Ranked rows.
    pub rows: Vec<ReportRow>,
    pub skipped: Vec<(Instrument, SkipReason)>,
    pub symbols_seen: usize,
}

impl ScreenOutcome {
    /// Number of skipped instruments per skip kind.
    pub fn skip_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for (_, reason) in &self.skipped {
            *counts.entry(reason.kind()).or_insert(0) += 1;
        }
        counts
    }
}

pub struct Screener<S> {
    source: S,
    config: AppConfig,
    engine: IndicatorEngine,
}

impl<S: MarketSource> Screener<S> {
    pub fn new(source: S, config: AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            source,
            config,
            engine: IndicatorEngine::new()
                .map_err(|e| anyhow::anyhow!("indicator setup failed: {e:?}"))?,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs the full pipeline:
    /// 1. Fetches the tradable symbols.
    /// 2. Fetches candles (and aux signals) per symbol, one at a time.
    /// 3. Computes indicators and classifies the last bar.
    /// 4. Ranks the surviving rows.
    ///
    /// Never fails: a supplier that is down yields an empty outcome.
    pub async fn run(&self) -> ScreenOutcome {
        let instruments = match self.source.symbols().await {
            Ok(instruments) => instruments,
            Err(e) => {
                log::error!("symbol list unavailable: {e}");
                Vec::new()
            }
        };

        let mut outcome = ScreenOutcome {
            symbols_seen: instruments.len(),
            ..ScreenOutcome::default()
        };
        // Out-of-range values are rejected by `AppConfig::validate`.
        let pause = Duration::try_from_secs_f64(self.config.klines.sleep_secs).unwrap_or_default();

        for (i, instrument) in instruments.into_iter().enumerate() {
            log::debug!("[{}/{}] {}", i + 1, outcome.symbols_seen, instrument.symbol);
            match self.screen_one(&instrument).await {
                Ok(rows) => outcome.rows.extend(rows),
                Err(reason) => {
                    log::debug!("{} skipped: {reason}", instrument.symbol);
                    outcome.skipped.push((instrument, reason));
                }
            }
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        rank(
            &mut outcome.rows,
            RankOrder::for_run(self.config.mode, self.config.market.kind, self.config.report.tie_break),
        );
        log::info!(
            "{} symbols, {} rows, skipped {:?}",
            outcome.symbols_seen,
            outcome.rows.len(),
            outcome.skip_counts()
        );
        outcome
    }

    /// Fetch and evaluate one instrument.
    pub async fn screen_one(&self, instrument: &Instrument) -> Result<Vec<ReportRow>, SkipReason> {
        let series = self.source.candles(instrument).await?;
        check_history(&series, self.min_bars())?;
        let aux = self.source.aux_signals(instrument).await;
        self.evaluate(instrument, &series, aux)
    }

    /// Pure part of the pipeline: indicators, classification, levels.
    pub fn evaluate(
        &self,
        instrument: &Instrument,
        series: &CandleSeries,
        aux: Option<AuxSignals>,
    ) -> Result<Vec<ReportRow>, SkipReason> {
        check_history(series, self.min_bars())?;
        let snapshot = self.engine.compute(series).last();
        let close = series.last().ok_or(SkipReason::NoCandles)?.close;

        match self.config.mode {
            Mode::Filter => self.evaluate_filter(instrument, snapshot, close, aux),
            Mode::Score => self.evaluate_score(instrument, snapshot, close, aux),
        }
    }

    /// Score mode needs EMA200 for the cross badges and the trend bias.
    fn min_bars(&self) -> usize {
        match self.config.mode {
            Mode::Filter => MIN_BARS,
            Mode::Score => SCORE_MIN_BARS,
        }
    }

    fn evaluate_filter(
        &self,
        instrument: &Instrument,
        snapshot: IndicatorSnapshot,
        close: f64,
        aux: Option<AuxSignals>,
    ) -> Result<Vec<ReportRow>, SkipReason> {
        let report = &self.config.report;
        let signal = self.config.rules.classify(&snapshot, aux.as_ref());
        if (report.only_signal && signal == Signal::Neutral) || !report.side.allows(signal) {
            return Err(SkipReason::Filtered);
        }

        let levels = TradeLevels::compute(signal, close, snapshot.atr14, self.config.levels.multipliers());
        Ok(vec![ReportRow {
            instrument: instrument.clone(),
            signal,
            score: None,
            levels,
            snapshot,
            aux,
        }])
    }

    fn evaluate_score(
        &self,
        instrument: &Instrument,
        snapshot: IndicatorSnapshot,
        close: f64,
        aux: Option<AuxSignals>,
    ) -> Result<Vec<ReportRow>, SkipReason> {
        let report = &self.config.report;
        let rules = &self.config.rules;

        let mut sides: Vec<Signal> = [
            (Signal::Long, rules.is_long(&snapshot, aux.as_ref())),
            (Signal::Short, rules.is_short(&snapshot, aux.as_ref())),
        ]
        .into_iter()
        .filter(|&(side, hit)| hit && report.side.allows(side))
        .map(|(side, _)| side)
        .collect();

        if sides.is_empty() && !report.only_signal {
            sides.extend(trend_bias(&snapshot).filter(|&side| report.side.allows(side)));
        }
        if sides.is_empty() {
            return Err(SkipReason::Filtered);
        }

        let mult = self.config.levels.multipliers();
        let rows: Vec<ReportRow> = sides
            .into_iter()
            .filter_map(|side| {
                let levels = TradeLevels::compute(side, close, snapshot.atr14, mult);
                if !levels.risk_reward.is_some_and(|rr| rr >= report.min_rr) {
                    return None;
                }
                Some(ReportRow {
                    instrument: instrument.clone(),
                    signal: side,
                    score: Some(self.config.score.score(&snapshot, side)),
                    levels,
                    snapshot,
                    aux,
                })
            })
            .collect();

        if rows.is_empty() {
            Err(SkipReason::BelowRiskReward)
        } else {
            Ok(rows)
        }
    }
}

fn check_history(series: &CandleSeries, minimum: usize) -> Result<(), SkipReason> {
    if series.is_empty() {
        return Err(SkipReason::NoCandles);
    }
    if series.len() < minimum {
        return Err(SkipReason::InsufficientHistory {
            bars: series.len(),
            minimum,
        });
    }
    Ok(())
}

/// Side suggested by the long-term averages alone.
fn trend_bias(snapshot: &IndicatorSnapshot) -> Option<Signal> {
    let (ema50, ema200) = (snapshot.ema50?, snapshot.ema200?);
    Some(if ema50 > ema200 { Signal::Long } else { Signal::Short })
}
