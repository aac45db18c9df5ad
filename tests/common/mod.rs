#![allow(dead_code)]

use signal_screener::AppConfig;
use signal_screener::MarketSource;
use signal_screener::error::{FetchError, SkipReason};
use signal_screener::models::{AuxSignals, Candle, CandleSeries, Instrument, MarketKind};
use std::collections::HashMap;

/// Zig-zag trend: `up` on odd bars, `down` on even bars, 1000 volume
/// except the last bar, which trades `last_volume`.
pub fn zigzag_series(bars: usize, start: f64, up: f64, down: f64, last_volume: f64) -> CandleSeries {
    let mut close = start;
    let candles = (0..bars)
        .map(|i| {
            let open = close;
            if i > 0 {
                close += if i % 2 == 1 { up } else { down };
            }
            Candle {
                open_time: i as i64 * 86_400_000,
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: if i + 1 == bars { last_volume } else { 1000.0 },
            }
        })
        .collect();
    CandleSeries::new(candles).unwrap()
}

/// 120 daily bars climbing +3 / -2, last bar an up bar on 1.5x volume.
pub fn long_setup() -> CandleSeries {
    zigzag_series(120, 100.0, 3.0, -2.0, 1500.0)
}

/// Mirror image of [`long_setup`].
pub fn short_setup() -> CandleSeries {
    zigzag_series(120, 500.0, -3.0, 2.0, 1500.0)
}

/// [`long_setup`] with enough bars for EMA200, as fetched in score mode.
pub fn long_history() -> CandleSeries {
    zigzag_series(300, 100.0, 3.0, -2.0, 1500.0)
}

pub fn short_history() -> CandleSeries {
    zigzag_series(300, 800.0, -3.0, 2.0, 1500.0)
}

pub enum Feed {
    Series(CandleSeries),
    Fail,
}

/// In-memory market: fixed symbol list, canned candles per symbol.
pub struct FakeSource {
    pub market: MarketKind,
    pub symbols: Result<Vec<String>, ()>,
    pub feeds: HashMap<String, Feed>,
    pub aux: AuxSignals,
}

impl FakeSource {
    pub fn spot(feeds: Vec<(&str, Feed)>) -> Self {
        Self::new(MarketKind::Spot, feeds)
    }

    pub fn new(market: MarketKind, feeds: Vec<(&str, Feed)>) -> Self {
        Self {
            market,
            symbols: Ok(feeds.iter().map(|(s, _)| s.to_string()).collect()),
            feeds: feeds
                .into_iter()
                .map(|(s, feed)| (s.to_string(), feed))
                .collect(),
            aux: AuxSignals::default(),
        }
    }

    pub fn down() -> Self {
        Self {
            symbols: Err(()),
            ..Self::spot(Vec::new())
        }
    }
}

impl MarketSource for FakeSource {
    async fn symbols(&self) -> Result<Vec<Instrument>, FetchError> {
        match &self.symbols {
            Ok(symbols) => Ok(symbols
                .iter()
                .map(|s| Instrument::new(s.as_str(), self.market))
                .collect()),
            Err(()) => Err(FetchError::RetriesExhausted {
                attempts: 5,
                last: "connection refused".into(),
            }),
        }
    }

    async fn candles(&self, instrument: &Instrument) -> Result<CandleSeries, SkipReason> {
        match self.feeds.get(&instrument.symbol) {
            Some(Feed::Series(series)) => Ok(series.clone()),
            Some(Feed::Fail) => Err(FetchError::Status {
                status: 500,
                body: "internal error".into(),
            }
            .into()),
            None => Err(SkipReason::NoCandles),
        }
    }

    async fn aux_signals(&self, _: &Instrument) -> Option<AuxSignals> {
        match self.market {
            MarketKind::Spot => None,
            MarketKind::Futures => Some(self.aux),
        }
    }
}

pub fn quiet_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.klines.sleep_secs = 0.0;
    config
}
