//! Coin records from the market-data service
//!
//! Listings arrive in one of two shapes: a centralized listing with a nested
//! `priceChange` object, or a decentralized trading pair keyed by
//! `baseToken` with string-encoded numbers. [`CoinRecord`] picks the shape by
//! probing for `baseToken` and both normalize into [`Coin`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Window a price change is measured over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl DateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Hour => "1h",
            DateRange::Day => "24h",
            DateRange::Week => "7d",
            DateRange::Month => "30d",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1h" => Ok(DateRange::Hour),
            "24h" | "1d" => Ok(DateRange::Day),
            "7d" | "1w" => Ok(DateRange::Week),
            "30d" | "1m" => Ok(DateRange::Month),
            other => Err(format!("unknown date range: {}", other)),
        }
    }
}

/// Normalized coin statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coin {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub market_cap: f64,
    pub self_reported_market_cap: Option<f64>,
    pub price_change_1h: Option<f64>,
    pub price_change_24h: f64,
    pub price_change_7d: Option<f64>,
    pub price_change_30d: Option<f64>,
    pub volume_24h: f64,
}

impl Coin {
    /// Percentage change over `range`, zero when unknown
    pub fn price_change(&self, range: DateRange) -> f64 {
        match range {
            DateRange::Hour => self.price_change_1h.unwrap_or(0.0),
            DateRange::Day => self.price_change_24h,
            DateRange::Week => self.price_change_7d.unwrap_or(0.0),
            DateRange::Month => self.price_change_30d.unwrap_or(0.0),
        }
    }

    /// Market cap, preferring the reported one over the self-reported one
    pub fn effective_market_cap(&self) -> f64 {
        if self.market_cap > 0.0 {
            self.market_cap
        } else {
            self.self_reported_market_cap.unwrap_or(0.0)
        }
    }
}

/// A coin record in whichever shape the service returned
#[derive(Debug, Clone, PartialEq)]
pub enum CoinRecord {
    CentralizedListing(CentralizedListing),
    DecentralizedPair(DecentralizedPair),
}

impl CoinRecord {
    /// Decode from a JSON value, choosing the shape by the `baseToken` probe
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        if value.get("baseToken").is_some() {
            serde_json::from_value(value).map(CoinRecord::DecentralizedPair)
        } else {
            serde_json::from_value(value).map(CoinRecord::CentralizedListing)
        }
    }
}

impl<'de> Deserialize<'de> for CoinRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        CoinRecord::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl From<CoinRecord> for Coin {
    fn from(record: CoinRecord) -> Self {
        match record {
            CoinRecord::CentralizedListing(listing) => Coin {
                id: listing.id,
                name: listing.name,
                symbol: listing.symbol,
                price: listing.price_change.price,
                market_cap: listing.market_cap.unwrap_or(0.0),
                self_reported_market_cap: listing.self_reported_market_cap,
                price_change_1h: listing.price_change.price_change_1h,
                price_change_24h: listing.price_change.price_change_24h.unwrap_or(0.0),
                price_change_7d: listing.price_change.price_change_7d,
                price_change_30d: listing.price_change.price_change_30d,
                volume_24h: listing.price_change.volume_24h.unwrap_or(0.0),
            },
            CoinRecord::DecentralizedPair(pair) => Coin {
                id: pair
                    .base_token
                    .id
                    .as_deref()
                    .and_then(|id| id.parse().ok())
                    .unwrap_or(0),
                name: pair.base_token_name,
                symbol: pair.base_token_symbol,
                price: pair.price_usd,
                market_cap: pair.market_cap,
                self_reported_market_cap: pair.self_reported_market_cap,
                price_change_1h: None,
                price_change_24h: pair.price_change_24h,
                price_change_7d: None,
                price_change_30d: None,
                volume_24h: pair.volume_24h,
            },
        }
    }
}

/// Centralized exchange listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CentralizedListing {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    pub price_change: PriceStats,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub self_reported_market_cap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    pub price: f64,
    #[serde(default)]
    pub price_change_1h: Option<f64>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub price_change_7d: Option<f64>,
    #[serde(default)]
    pub price_change_30d: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
}

/// Decentralized exchange trading pair
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecentralizedPair {
    pub base_token: BaseToken,
    pub base_token_name: String,
    pub base_token_symbol: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_usd: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_change_24h: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume_24h: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: f64,
    #[serde(default)]
    pub self_reported_market_cap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BaseToken {
    #[serde(default)]
    pub id: Option<String>,
}

/// Accept a number or a numeric string; anything unparsable becomes zero.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_centralized_listing() {
        let value = json!({
            "id": 74,
            "name": "Dogecoin",
            "symbol": "DOGE",
            "marketCap": 23000000000.0,
            "priceChange": {
                "price": 0.158,
                "priceChange1h": -0.2,
                "priceChange24h": 3.4,
                "priceChange7d": 12.0,
                "volume24h": 910000000.0
            }
        });
        let record = CoinRecord::from_value(value).unwrap();
        assert!(matches!(record, CoinRecord::CentralizedListing(_)));

        let coin = Coin::from(record);
        assert_eq!(coin.id, 74);
        assert_eq!(coin.symbol, "DOGE");
        assert_eq!(coin.price, 0.158);
        assert_eq!(coin.price_change(DateRange::Day), 3.4);
        assert_eq!(coin.price_change(DateRange::Month), 0.0);
        assert_eq!(coin.volume_24h, 910000000.0);
        assert_eq!(coin.effective_market_cap(), 23000000000.0);
    }

    #[test]
    fn test_decentralized_pair() {
        let value = json!({
            "baseToken": { "id": "31305" },
            "baseTokenName": "Pepe",
            "baseTokenSymbol": "PEPE",
            "priceUsd": "0.0000121",
            "priceChange24h": "-4.75",
            "volume24h": "1500000",
            "marketCap": "5100000000"
        });
        let coin: Coin = serde_json::from_value::<CoinRecord>(value).unwrap().into();
        assert_eq!(coin.id, 31305);
        assert_eq!(coin.name, "Pepe");
        assert_eq!(coin.price, 0.0000121);
        assert_eq!(coin.price_change_24h, -4.75);
        assert_eq!(coin.price_change_1h, None);
        assert_eq!(coin.market_cap, 5100000000.0);
    }

    #[test]
    fn test_pair_with_unparsable_numbers() {
        let value = json!({
            "baseToken": {},
            "baseTokenName": "Mystery",
            "baseTokenSymbol": "MYST",
            "priceUsd": "n/a",
            "priceChange24h": null
        });
        let coin = Coin::from(CoinRecord::from_value(value).unwrap());
        assert_eq!(coin.id, 0);
        assert_eq!(coin.price, 0.0);
        assert_eq!(coin.volume_24h, 0.0);
    }

    #[test]
    fn test_listing_missing_required_field_fails() {
        let value = json!({ "id": 1, "name": "NoPrice", "symbol": "NP" });
        assert!(CoinRecord::from_value(value).is_err());
    }

    #[test]
    fn test_date_range_parse() {
        assert_eq!("24h".parse::<DateRange>().unwrap(), DateRange::Day);
        assert_eq!("7D".parse::<DateRange>().unwrap(), DateRange::Week);
        assert!("2y".parse::<DateRange>().is_err());
        assert_eq!(DateRange::Month.to_string(), "30d");
    }
}
