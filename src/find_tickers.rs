use crate::client::BinanceClient;
use crate::config::MarketConfig;
use crate::error::FetchError;
use crate::filter_utils::{is_excluded_base, matches_filters, symbol_filters};
use crate::models::Instrument;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Deserialize, Debug, Default)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<Map<String, Value>>,
}

impl ExchangeInfo {
    /// Tradable instruments of `market`, in exchange order.
    pub fn instruments(&self, market: &MarketConfig) -> Vec<Instrument> {
        let filters = symbol_filters(market);
        self.symbols
            .iter()
            .filter(|s| matches_filters(s, &filters))
            .filter(|s| !is_excluded_base(s, &market.excluded_bases))
            .filter_map(|s| s.get("symbol").and_then(Value::as_str))
            .map(|symbol| Instrument::new(symbol, market.kind))
            .collect()
    }
}

/// Fetches the symbol list. An empty filtered list is treated as a transient
/// failure and retried; once retries run out the result is an empty list.
pub async fn fetch_instruments(
    client: &BinanceClient,
    market: &MarketConfig,
) -> Result<Vec<Instrument>, FetchError> {
    for attempt in 1..=client.retries() {
        let info: ExchangeInfo = client.get_json(market.kind.exchange_info_path(), &[]).await?;
        let instruments = info.instruments(market);
        if !instruments.is_empty() {
            log::info!("{} {} symbols found", instruments.len(), market.kind);
            return Ok(instruments);
        }
        log::warn!("[{attempt}/{}] symbol list came back empty", client.retries());
        if attempt < client.retries() {
            tokio::time::sleep(client.backoff(attempt)).await;
        }
    }
    log::error!("no tradable symbols after {} attempts", client.retries());
    Ok(Vec::new())
}
