//! Where instruments, candles and auxiliary signals come from.

use crate::client::BinanceClient;
use crate::config::{AppConfig, MarketConfig};
use crate::error::{FetchError, SkipReason};
use crate::find_tickers::fetch_instruments;
use crate::klines::{fetch_aux_signals, fetch_candles};
use crate::models::{AuxSignals, CandleSeries, Instrument, MarketKind};

/// Supplier of market data for one run. The screener only ever talks to
/// this trait, so tests can swap the exchange for an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait MarketSource {
    async fn symbols(&self) -> Result<Vec<Instrument>, FetchError>;

    async fn candles(&self, instrument: &Instrument) -> Result<CandleSeries, SkipReason>;

    /// `None` for markets without auxiliary signals (spot). A futures
    /// instrument always gets `Some`, with unavailable fields left undefined.
    async fn aux_signals(&self, instrument: &Instrument) -> Option<AuxSignals>;
}

pub struct BinanceSource {
    client: BinanceClient,
    market: MarketConfig,
    interval: String,
    limit: u32,
}

impl BinanceSource {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: BinanceClient::new(config.market.base_url(), &config.client)?,
            market: config.market.clone(),
            interval: config.klines.interval.clone(),
            limit: config.kline_limit(),
        })
    }
}

impl MarketSource for BinanceSource {
    async fn symbols(&self) -> Result<Vec<Instrument>, FetchError> {
        fetch_instruments(&self.client, &self.market).await
    }

    async fn candles(&self, instrument: &Instrument) -> Result<CandleSeries, SkipReason> {
        fetch_candles(&self.client, instrument, &self.interval, self.limit).await
    }

    async fn aux_signals(&self, instrument: &Instrument) -> Option<AuxSignals> {
        match instrument.market {
            MarketKind::Spot => None,
            MarketKind::Futures => Some(fetch_aux_signals(&self.client, instrument, &self.market).await),
        }
    }
}
