//! Command-line / environment overrides. Every flag is optional and, when
//! given, replaces the value loaded from the config file.

use crate::config::{AppConfig, Mode};
use crate::levels::Horizon;
use crate::models::MarketKind;
use crate::ranking::TieBreak;
use crate::signals::{SOFT_TREND_TOLERANCE, SideFilter};
use clap::Parser;
use clap::builder::BoolishValueParser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "signal-screener",
    version,
    about = "Screens exchange pairs for long/short setups and writes an HTML report"
)]
pub struct Cli {
    /// JSON config file. Defaults to storage/config.json next to the binary.
    #[arg(short, long, env = "SCREENER_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "MARKET", value_enum)]
    pub market: Option<MarketKind>,

    #[arg(long, env = "MODE", value_enum)]
    pub mode: Option<Mode>,

    #[arg(long, env = "HORIZON", value_enum)]
    pub horizon: Option<Horizon>,

    /// Candle interval, e.g. 1h, 4h, 1d.
    #[arg(long, env = "INTERVAL")]
    pub interval: Option<String>,

    /// Candles per request.
    #[arg(long, env = "LIMIT")]
    pub limit: Option<u32>,

    /// Seconds to wait between instruments.
    #[arg(long, env = "SLEEP")]
    pub sleep: Option<f64>,

    #[arg(long, env = "ONLY_SIGNAL", value_parser = BoolishValueParser::new())]
    pub only_signal: Option<bool>,

    #[arg(long, env = "SIDE", value_enum, ignore_case = true)]
    pub side: Option<SideFilter>,

    #[arg(long, env = "MIN_RR")]
    pub min_rr: Option<f64>,

    #[arg(long, env = "MIN_ADX")]
    pub min_adx: Option<f64>,

    #[arg(long, env = "ATR_STOP")]
    pub atr_stop: Option<f64>,

    #[arg(long, env = "ATR_TP")]
    pub atr_tp: Option<f64>,

    /// Exchange host override, e.g. a proxy.
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Report path.
    #[arg(short, long, env = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Secondary ordering of filter-mode rows.
    #[arg(long, env = "TIE_BREAK", value_enum)]
    pub tie_break: Option<TieBreak>,

    /// Accept EMAs within 0.5% of alignment.
    #[arg(long, env = "SOFT_TREND", value_parser = BoolishValueParser::new())]
    pub soft_trend: Option<bool>,
}

impl Cli {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(market) = self.market {
            config.market.kind = market;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(horizon) = self.horizon {
            config.levels.horizon = horizon;
        }
        if let Some(interval) = &self.interval {
            config.klines.interval = interval.clone();
        }
        if let Some(limit) = self.limit {
            config.klines.limit = Some(limit);
        }
        if let Some(sleep) = self.sleep {
            config.klines.sleep_secs = sleep;
        }
        if let Some(only_signal) = self.only_signal {
            config.report.only_signal = only_signal;
        }
        if let Some(side) = self.side {
            config.report.side = side;
        }
        if let Some(min_rr) = self.min_rr {
            config.report.min_rr = min_rr;
        }
        if let Some(min_adx) = self.min_adx {
            config.rules.min_adx = min_adx;
        }
        if self.atr_stop.is_some() {
            config.levels.atr_stop = self.atr_stop;
        }
        if self.atr_tp.is_some() {
            config.levels.atr_target = self.atr_tp;
        }
        if let Some(base_url) = &self.base_url {
            config.market.base_url = Some(base_url.clone());
        }
        if let Some(output) = &self.output {
            config.report.output = Some(output.clone());
        }
        if self.tie_break.is_some() {
            config.report.tie_break = self.tie_break;
        }
        match self.soft_trend {
            Some(true) => config.rules.trend_tolerance = SOFT_TREND_TOLERANCE,
            Some(false) => config.rules.trend_tolerance = 1.0,
            None => {}
        }
    }
}
