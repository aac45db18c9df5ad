use crate::config::MarketConfig;
use crate::models::MarketKind;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Required `exchangeInfo` field values for a tradable symbol of `market`.
pub fn symbol_filters(market: &MarketConfig) -> HashMap<String, String> {
    let mut filters = HashMap::from([
        ("status".to_string(), "TRADING".to_string()),
        ("quoteAsset".to_string(), market.quote_asset.clone()),
    ]);
    match market.kind {
        MarketKind::Futures => {
            filters.insert("contractType".into(), "PERPETUAL".into());
        }
        MarketKind::Spot => {
            filters.insert("isSpotTradingAllowed".into(), "true".into());
        }
    }
    filters
}

pub fn matches_filters(symbol: &Map<String, Value>, filters: &HashMap<String, String>) -> bool {
    filters.iter().all(|(key, required_value)| match symbol.get(key) {
        // e.g. "status": "TRADING"
        Some(Value::String(s)) => s == required_value,
        // e.g. "permissions": ["SPOT", "MARGIN"]
        Some(Value::Array(arr)) => arr.iter().any(|v| v.as_str() == Some(required_value)),
        // Numbers / booleans compare through their JSON text
        Some(v) => v.to_string() == *required_value,
        None => false,
    })
}

pub fn is_excluded_base(symbol: &Map<String, Value>, excluded: &[String]) -> bool {
    symbol
        .get("baseAsset")
        .and_then(Value::as_str)
        .is_some_and(|base| excluded.iter().any(|e| e == base))
}
