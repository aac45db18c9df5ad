//! Run configuration: built-in defaults, an optional JSON file, then
//! environment / command-line overrides (see `cli.rs`).

use crate::levels::{AtrMultipliers, Horizon};
use crate::models::MarketKind;
use crate::ranking::TieBreak;
use crate::signals::{RuleSet, ScoreRules, SideFilter};
use crate::storage_utils::{StorageDir, load_json};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which classifier produces the report rows.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Long / short / neutral threshold filter.
    #[default]
    Filter,
    /// Weighted score with badges.
    Score,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MarketConfig {
    pub kind: MarketKind,
    /// Overrides the exchange host, e.g. for a proxy.
    pub base_url: Option<String>,
    pub quote_asset: String,
    pub excluded_bases: Vec<String>,
    /// Open-interest history period used for the OI change.
    pub oi_period: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            kind: MarketKind::Futures,
            base_url: None,
            quote_asset: "USDT".into(),
            excluded_bases: ["USDT", "BUSD", "DAI", "USDC", "TUSD", "FDUSD"]
                .into_iter()
                .map(String::from)
                .collect(),
            oi_period: "1d".into(),
        }
    }
}

impl MarketConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }
}

/// Score mode needs a defined EMA200 plus some room after it.
pub const SCORE_MIN_BARS: usize = 220;
/// Upper bound for the pause and backoff settings, in seconds.
pub const MAX_PAUSE_SECS: f64 = 60.0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KlineConfig {
    /// Candles per request. Unset means 120 in filter mode, 300 in score mode.
    pub limit: Option<u32>,
    pub interval: String, // e.g., "1h", "4h", "1d"
    /// Pause between instruments, in seconds.
    pub sleep_secs: f64,
}

impl Default for KlineConfig {
    fn default() -> Self {
        Self {
            limit: None,
            interval: "1d".into(),
            sleep_secs: 0.08,
        }
    }
}

impl KlineConfig {
    pub fn limit_for(&self, mode: Mode) -> u32 {
        self.limit.unwrap_or(match mode {
            Mode::Filter => 120,
            Mode::Score => 300,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct LevelConfig {
    pub horizon: Horizon,
    pub atr_stop: Option<f64>,
    pub atr_target: Option<f64>,
}

impl LevelConfig {
    /// Horizon defaults with any explicit multiplier layered on top.
    pub fn multipliers(&self) -> AtrMultipliers {
        let base = self.horizon.multipliers();
        AtrMultipliers {
            stop: self.atr_stop.unwrap_or(base.stop),
            target: self.atr_target.unwrap_or(base.target),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Hide neutral rows (filter mode) / skip the trend-bias fallback (score mode).
    pub only_signal: bool,
    pub side: SideFilter,
    /// Score mode drops candidates whose risk/reward is below this.
    pub min_rr: f64,
    pub output: Option<PathBuf>,
    /// Rows shown in the terminal summary.
    pub summary_rows: usize,
    /// Filter-mode ordering within a signal group. Unset means OI change on
    /// futures, ADX on spot.
    pub tie_break: Option<TieBreak>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            only_signal: false,
            side: SideFilter::All,
            min_rr: 1.2,
            output: None,
            summary_rows: 15,
            tie_break: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub timeout_secs: u64,
    pub retries: u32,
    /// Linear backoff step: attempt `n` waits `n * backoff_secs`.
    pub backoff_secs: f64,
    pub max_ban_wait_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            retries: 5,
            backoff_secs: 1.5,
            max_ban_wait_secs: 120,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub mode: Mode,
    pub market: MarketConfig,
    pub klines: KlineConfig,
    pub rules: RuleSet,
    pub score: ScoreRules,
    pub levels: LevelConfig,
    pub report: ReportConfig,
    pub client: ClientConfig,
}

impl AppConfig {
    /// Loads `path` if given, otherwise `storage/config.json` next to the
    /// binary when present, otherwise the defaults. Never creates anything.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return load_json(path)
                .await
                .with_context(|| format!("reading config {}", path.display()));
        }
        let storage = StorageDir::new_relative("storage")?;
        Self::load_from(&storage).await
    }

    async fn load_from(storage: &StorageDir) -> Result<Self> {
        if storage.exists("config") {
            return storage
                .load("config")
                .await
                .with_context(|| format!("reading {}", storage.path_of("config").display()));
        }
        Ok(Self::default())
    }

    /// Candles requested per instrument for the configured mode.
    pub fn kline_limit(&self) -> u32 {
        self.klines.limit_for(self.mode)
    }

    pub fn validate(&self) -> Result<()> {
        let limit = self.kline_limit();
        if !(1..=1500).contains(&limit) {
            bail!("kline limit must be in 1..=1500, got {limit}");
        }
        if self.mode == Mode::Score && (limit as usize) < SCORE_MIN_BARS {
            bail!("score mode needs at least {SCORE_MIN_BARS} candles, limit is {limit}");
        }
        if self.klines.interval.trim().is_empty() {
            bail!("kline interval must not be empty");
        }
        for (name, secs) in [("sleep", self.klines.sleep_secs), ("backoff", self.client.backoff_secs)] {
            if !(0.0..=MAX_PAUSE_SECS).contains(&secs) {
                bail!("{name} must be between 0 and {MAX_PAUSE_SECS} seconds, got {secs}");
            }
        }
        let mult = self.levels.multipliers();
        if !(mult.stop > 0.0 && mult.target > 0.0) {
            bail!("ATR multipliers must be positive, got stop={} target={}", mult.stop, mult.target);
        }
        if !(self.report.min_rr >= 0.0) {
            bail!("min risk/reward must be non-negative, got {}", self.report.min_rr);
        }
        for (name, band) in [("long_rsi", self.rules.long_rsi), ("short_rsi", self.rules.short_rsi)] {
            if !(band.low < band.high) {
                bail!("{name} band is empty: ({}, {})", band.low, band.high);
            }
        }
        if self.client.retries == 0 {
            bail!("retries must be at least 1");
        }
        Ok(())
    }

    /// Report path used when none is configured.
    pub fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.report.output {
            return path.clone();
        }
        let file = match (self.mode, self.market.kind) {
            (Mode::Score, _) => "dashboard.html",
            (Mode::Filter, MarketKind::Futures) => "futures.html",
            (Mode::Filter, MarketKind::Spot) => "spot.html",
        };
        PathBuf::from("public").join(file)
    }
}
