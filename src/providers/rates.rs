// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Price-feed clients for display conversions.
//!
//! Two independent lookups: crypto→fiat (CoinGecko-style simple price) and
//! fiat→fiat (exchangerate-api-style latest rates). Each is a single GET
//! returning a scalar rate; no retry, no caching.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde_json::Value;

use crate::config::env_or_default;

const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_FOREX_BASE_URL: &str = "https://api.exchangerate-api.com";

#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("rate request failed: {0}")]
    Request(String),

    #[error("rate response was invalid: {0}")]
    InvalidResponse(String),
}

/// Multiply an amount by an exchange rate.
pub fn convert(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate
}

/// Crypto→fiat quote client.
#[derive(Debug, Clone)]
pub struct CryptoRateClient {
    api_base_url: String,
    http: Client,
}

impl CryptoRateClient {
    pub fn from_env() -> Result<Self, RateError> {
        let api_base_url = env_or_default("COINGECKO_API_BASE_URL", DEFAULT_COINGECKO_BASE_URL);
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| RateError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { api_base_url, http })
    }

    /// Current rate of one unit of `asset` in `vs_currency`
    /// (e.g. `hedera-hashgraph` → `usd`).
    pub async fn get_rate(&self, asset: &str, vs_currency: &str) -> Result<Decimal, RateError> {
        let url = format!(
            "{}/simple/price?ids={asset}&vs_currencies={vs_currency}",
            self.api_base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Request(format!("GET simple/price failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RateError::Request(format!(
                "GET simple/price returned {status}: {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| RateError::InvalidResponse(format!("simple/price invalid JSON: {e}")))?;

        extract_simple_price(&payload, asset, vs_currency)
    }
}

/// Fiat→fiat rate table client.
#[derive(Debug, Clone)]
pub struct ForexRateClient {
    api_base_url: String,
    http: Client,
}

impl ForexRateClient {
    pub fn from_env() -> Result<Self, RateError> {
        let api_base_url = env_or_default("FOREX_API_BASE_URL", DEFAULT_FOREX_BASE_URL);
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| RateError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { api_base_url, http })
    }

    /// Rate table for one base currency (e.g. `USD` → every quote currency).
    pub async fn get_rates(&self, base: &str) -> Result<HashMap<String, Decimal>, RateError> {
        let url = format!(
            "{}/v4/latest/{}",
            self.api_base_url.trim_end_matches('/'),
            base.to_ascii_uppercase()
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Request(format!("GET latest rates failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RateError::Request(format!(
                "GET latest rates returned {status}: {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| RateError::InvalidResponse(format!("latest rates invalid JSON: {e}")))?;

        extract_rates(&payload)
    }

    /// Single quote rate out of the base table.
    pub async fn get_rate(&self, base: &str, quote: &str) -> Result<Decimal, RateError> {
        let rates = self.get_rates(base).await?;
        rates
            .get(&quote.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| RateError::InvalidResponse(format!("no rate for currency {quote}")))
    }
}

fn extract_simple_price(
    payload: &Value,
    asset: &str,
    vs_currency: &str,
) -> Result<Decimal, RateError> {
    let raw = payload
        .get(asset)
        .and_then(|entry| entry.get(vs_currency))
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            RateError::InvalidResponse(format!("missing price for {asset}/{vs_currency}"))
        })?;

    Decimal::from_f64(raw)
        .ok_or_else(|| RateError::InvalidResponse(format!("non-finite price for {asset}")))
}

fn extract_rates(payload: &Value) -> Result<HashMap<String, Decimal>, RateError> {
    let rates = payload
        .get("rates")
        .and_then(Value::as_object)
        .ok_or_else(|| RateError::InvalidResponse("missing rates table".to_string()))?;

    let mut table = HashMap::with_capacity(rates.len());
    for (currency, raw) in rates {
        let rate = raw
            .as_f64()
            .and_then(Decimal::from_f64)
            .ok_or_else(|| RateError::InvalidResponse(format!("bad rate for {currency}")))?;
        table.insert(currency.to_ascii_uppercase(), rate);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn extracts_simple_price_from_nested_payload() {
        let payload = json!({"hedera-hashgraph": {"usd": 0.0612}});
        let rate = extract_simple_price(&payload, "hedera-hashgraph", "usd").unwrap();
        assert_eq!(rate, dec!(0.0612));
    }

    #[test]
    fn missing_asset_is_invalid_response() {
        let payload = json!({"bitcoin": {"usd": 60000.0}});
        let result = extract_simple_price(&payload, "hedera-hashgraph", "usd");
        assert!(matches!(result, Err(RateError::InvalidResponse(_))));
    }

    #[test]
    fn extracts_rate_table() {
        let payload = json!({"base": "USD", "rates": {"NGN": 1530.25, "EUR": 0.92}});
        let table = extract_rates(&payload).unwrap();
        assert_eq!(table.get("NGN"), Some(&dec!(1530.25)));
        assert_eq!(table.get("EUR"), Some(&dec!(0.92)));
    }

    #[test]
    fn payload_without_rates_is_invalid() {
        let payload = json!({"base": "USD"});
        assert!(matches!(
            extract_rates(&payload),
            Err(RateError::InvalidResponse(_))
        ));
    }

    #[test]
    fn convert_multiplies_amount_by_rate() {
        assert_eq!(convert(dec!(10), dec!(1530.25)), dec!(15302.50));
    }
}
