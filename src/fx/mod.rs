//! Exchange-rate resolution
//!
//! A live lookup against the exchangerate-api pair endpoint, degrading to a
//! static NGN rate table when the provider is unreachable or answers with
//! anything other than a well-formed success. Rate resolution never fails:
//! the caller always gets a usable rate.

use crate::config::FxConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Live-rate source seam
///
/// Implementations never error: `None` means "use the fallback table".
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn live_rate(&self, from_currency: &str, to_currency: &str) -> Option<Decimal>;
}

/// Static NGN-equivalent rates used when the live lookup is unavailable.
/// Unknown codes rate at 1.
pub fn fallback_rate(currency: &str) -> Decimal {
    match currency.to_uppercase().as_str() {
        "NGN" => dec!(1),
        "USD" => dec!(1535),
        "GBP" => dec!(1020),
        "ZAR" => dec!(55),
        "EUR" => dec!(900),
        "GHS" => dec!(100),
        "KES" => dec!(7),
        "XAF" => dec!(2.78),
        _ => dec!(1),
    }
}

/// One deterministic rate per request: the live rate when the provider
/// answers, the fallback-table rate otherwise. Same-currency conversions are
/// identity and skip the lookup.
pub async fn resolve_rate(source: &dyn RateSource, from_currency: &str, to_currency: &str) -> Decimal {
    if from_currency.eq_ignore_ascii_case(to_currency) {
        return Decimal::ONE;
    }

    match source.live_rate(from_currency, to_currency).await {
        Some(rate) => rate,
        None => {
            let rate = fallback_rate(from_currency);
            debug!(
                "Using fallback rate {} for {} -> {}",
                rate, from_currency, to_currency
            );
            rate
        }
    }
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    result: String,
    // Kept as a raw JSON number and parsed from its text form so the rate
    // never round-trips through f64
    #[serde(default)]
    conversion_rate: Option<serde_json::Number>,
}

/// Client for the exchangerate-api `GET {base}/{key}/pair/{from}/{to}` endpoint
pub struct ExchangeRateApiClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiClient {
    pub fn new(config: &FxConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl RateSource for ExchangeRateApiClient {
    async fn live_rate(&self, from_currency: &str, to_currency: &str) -> Option<Decimal> {
        let url = format!(
            "{}/{}/pair/{}/{}",
            self.base_url,
            self.api_key,
            from_currency.to_uppercase(),
            to_currency.to_uppercase()
        );

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "Live rate lookup failed for {} -> {}: {}",
                    from_currency, to_currency, e
                );
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Live rate lookup for {} -> {} returned HTTP {}",
                from_currency,
                to_currency,
                response.status()
            );
            return None;
        }

        let body = match response.json::<PairResponse>().await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    "Malformed rate response for {} -> {}: {}",
                    from_currency, to_currency, e
                );
                return None;
            }
        };

        if body.result != "success" {
            warn!(
                "Rate provider reported '{}' for {} -> {}",
                body.result, from_currency, to_currency
            );
            return None;
        }

        let rate = body
            .conversion_rate
            .and_then(|n| Decimal::from_str(&n.to_string()).ok())?;

        debug!(
            "Live rate for {} -> {}: {}",
            from_currency, to_currency, rate
        );
        Some(rate)
    }
}
