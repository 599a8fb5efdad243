use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::LevSimError;
use crate::types::Money;
use crate::LevSimResult;

/// Supplies a current price for a named asset, or `None` when unavailable.
pub trait PriceSource {
    fn current_price(&self, asset: &str) -> Option<Money>;
}

/// Fixed quotes keyed by asset name, e.g. loaded from a JSON map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticQuotes {
    quotes: HashMap<String, Money>,
}

impl StaticQuotes {
    pub fn new(quotes: HashMap<String, Money>) -> Self {
        StaticQuotes { quotes }
    }

    pub fn insert(&mut self, asset: impl Into<String>, price: Money) {
        self.quotes.insert(asset.into(), price);
    }
}

impl PriceSource for StaticQuotes {
    fn current_price(&self, asset: &str) -> Option<Money> {
        self.quotes.get(asset).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceOrigin {
    Market,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrice {
    pub asset: String,
    pub price: Money,
    pub origin: PriceOrigin,
}

/// Ask `source` for a start price; use `fallback` when it has none or the
/// quote is not positive.
pub fn resolve_start_price(
    source: &dyn PriceSource,
    asset: &str,
    fallback: Money,
) -> LevSimResult<ResolvedPrice> {
    match source.current_price(asset) {
        Some(price) if price > Decimal::ZERO => {
            debug!(asset, %price, "using market price");
            Ok(ResolvedPrice {
                asset: asset.to_string(),
                price,
                origin: PriceOrigin::Market,
            })
        }
        quote => {
            if let Some(bad) = quote {
                warn!(asset, price = %bad, "ignoring non-positive market price");
            }
            if fallback <= Decimal::ZERO {
                return Err(LevSimError::InvalidInput {
                    field: "start_price".into(),
                    reason: format!("no market price for '{asset}' and fallback is not positive"),
                });
            }
            debug!(asset, %fallback, "market price unavailable, using fallback");
            Ok(ResolvedPrice {
                asset: asset.to_string(),
                price: fallback,
                origin: PriceOrigin::Fallback,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quotes() -> StaticQuotes {
        let mut q = StaticQuotes::default();
        q.insert("OMXS30", dec!(2450.5));
        q.insert("BROKEN", dec!(0));
        q
    }

    #[test]
    fn test_market_price_preferred() {
        let r = resolve_start_price(&quotes(), "OMXS30", dec!(100)).unwrap();
        assert_eq!(r.price, dec!(2450.5));
        assert_eq!(r.origin, PriceOrigin::Market);
    }

    #[test]
    fn test_missing_asset_uses_fallback() {
        let r = resolve_start_price(&quotes(), "GOLD", dec!(100)).unwrap();
        assert_eq!(r.price, dec!(100));
        assert_eq!(r.origin, PriceOrigin::Fallback);
    }

    #[test]
    fn test_non_positive_quote_uses_fallback() {
        let r = resolve_start_price(&quotes(), "BROKEN", dec!(42)).unwrap();
        assert_eq!(r.origin, PriceOrigin::Fallback);
    }

    #[test]
    fn test_bad_fallback_rejected() {
        assert!(resolve_start_price(&quotes(), "GOLD", dec!(0)).is_err());
    }

    #[test]
    fn test_quotes_from_json() {
        let q: StaticQuotes = serde_json::from_str(r#"{"BTC": "64000", "ETH": 3100.25}"#).unwrap();
        assert_eq!(q.current_price("ETH"), Some(dec!(3100.25)));
        assert_eq!(q.current_price("SOL"), None);
    }
}
