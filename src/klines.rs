use crate::client::BinanceClient;
use crate::config::MarketConfig;
use crate::error::{FetchError, SkipReason};
use crate::models::{AuxSignals, Candle, CandleSeries, Instrument, pct_change};
use serde::de::{self, IgnoredAny, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// One kline as the exchange sends it: a 12-element array.
/// Only open time and OHLCV are kept.
#[derive(Deserialize, Debug)]
pub struct RawKline(
    i64,
    #[serde(deserialize_with = "deserialize_f64_lenient")] Option<f64>,
    #[serde(deserialize_with = "deserialize_f64_lenient")] Option<f64>,
    #[serde(deserialize_with = "deserialize_f64_lenient")] Option<f64>,
    #[serde(deserialize_with = "deserialize_f64_lenient")] Option<f64>,
    #[serde(deserialize_with = "deserialize_f64_lenient")] Option<f64>,
    IgnoredAny, // close time
    IgnoredAny, // quote volume
    IgnoredAny, // trade count
    IgnoredAny, // taker base volume
    IgnoredAny, // taker quote volume
    IgnoredAny, // ignore
);

impl RawKline {
    fn to_candle(&self) -> Option<Candle> {
        Some(Candle {
            open_time: self.0,
            open: self.1?,
            high: self.2?,
            low: self.3?,
            close: self.4?,
            volume: self.5?,
        })
    }
}

/// Converts raw klines into a validated series.
pub fn to_series(raw: &[RawKline]) -> Result<CandleSeries, SkipReason> {
    if raw.is_empty() {
        return Err(SkipReason::NoCandles);
    }
    let candles = raw
        .iter()
        .enumerate()
        .map(|(i, k)| {
            k.to_candle()
                .ok_or_else(|| SkipReason::MalformedCandles(format!("bar {i} has an empty field")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CandleSeries::new(candles)?)
}

pub async fn fetch_candles(
    client: &BinanceClient,
    instrument: &Instrument,
    interval: &str,
    limit: u32,
) -> Result<CandleSeries, SkipReason> {
    let query = [
        ("symbol", instrument.symbol.clone()),
        ("interval", interval.to_string()),
        ("limit", limit.to_string()),
    ];
    let raw: Vec<RawKline> = client
        .get_json(instrument.market.klines_path(), &query)
        .await?;
    to_series(&raw)
}

#[derive(Deserialize, Debug)]
struct FundingRateRecord {
    #[serde(rename = "fundingRate", default, deserialize_with = "deserialize_f64_lenient")]
    funding_rate: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct OpenInterestRecord {
    #[serde(rename = "sumOpenInterest", default, deserialize_with = "deserialize_f64_lenient")]
    sum_open_interest: Option<f64>,
}

async fn fetch_funding_rate(client: &BinanceClient, symbol: &str) -> Result<Option<f64>, FetchError> {
    let query = [("symbol", symbol.to_string()), ("limit", "1".to_string())];
    let records: Vec<FundingRateRecord> = client.get_json("/fapi/v1/fundingRate", &query).await?;
    Ok(records.last().and_then(|r| r.funding_rate))
}

async fn fetch_oi_change(
    client: &BinanceClient,
    symbol: &str,
    period: &str,
) -> Result<Option<f64>, FetchError> {
    let query = [
        ("symbol", symbol.to_string()),
        ("period", period.to_string()),
        ("limit", "2".to_string()),
    ];
    let records: Vec<OpenInterestRecord> = client
        .get_json("/futures/data/openInterestHist", &query)
        .await?;
    Ok(oi_change_from(&records))
}

fn oi_change_from(records: &[OpenInterestRecord]) -> Option<f64> {
    let [.., prev, last] = records else {
        return None;
    };
    pct_change(prev.sum_open_interest?, last.sum_open_interest?)
}

/// Funding rate and OI change for a perpetual. A failed request leaves its
/// field undefined rather than failing the instrument.
pub async fn fetch_aux_signals(
    client: &BinanceClient,
    instrument: &Instrument,
    market: &MarketConfig,
) -> AuxSignals {
    let (funding, oi) = futures::join!(
        fetch_funding_rate(client, &instrument.symbol),
        fetch_oi_change(client, &instrument.symbol, &market.oi_period),
    );
    AuxSignals {
        funding_rate: funding.unwrap_or_else(|e| {
            log::debug!("{} funding rate unavailable: {e}", instrument.symbol);
            None
        }),
        oi_change_pct: oi.unwrap_or_else(|e| {
            log::debug!("{} open interest unavailable: {e}", instrument.symbol);
            None
        }),
    }
}

// Binance sends prices as strings ("42000.10"), some proxies as numbers.
struct LenientF64Visitor;

impl<'de> Visitor<'de> for LenientF64Visitor {
    type Value = Option<f64>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a float, an integer, or a string representing a number")
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if v.trim().is_empty() {
            Ok(None)
        } else {
            v.trim().parse::<f64>().map(Some).map_err(E::custom)
        }
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(None)
    }
}

fn deserialize_f64_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientF64Visitor)
}
