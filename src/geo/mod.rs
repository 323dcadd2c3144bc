//! Country and currency resolution
//!
//! Maps a user-supplied country (code or name) to one of the supported
//! country/currency pairs, falling back to IP geolocation and finally to the
//! configured default country. Every payment resolves to exactly one entry of
//! the fixed table below before a charge is attempted.

use crate::config::GeoConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One supported country/currency pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedCountry {
    pub code: &'static str,
    pub currency: &'static str,
    pub name: &'static str,
}

/// The closed set of countries payments are accepted from
pub const SUPPORTED_COUNTRIES: &[SupportedCountry] = &[
    SupportedCountry { code: "NG", currency: "NGN", name: "NIGERIA" },
    SupportedCountry { code: "US", currency: "USD", name: "UNITED STATES" },
    SupportedCountry { code: "GB", currency: "GBP", name: "UNITED KINGDOM" },
    SupportedCountry { code: "ZA", currency: "ZAR", name: "SOUTH AFRICA" },
    SupportedCountry { code: "EU", currency: "EUR", name: "EUROPEAN UNION" },
    SupportedCountry { code: "GH", currency: "GHS", name: "GHANA" },
    SupportedCountry { code: "KE", currency: "KES", name: "KENYA" },
    SupportedCountry { code: "CM", currency: "XAF", name: "CAMEROON" },
];

/// Whether a currency belongs to the supported settlement set
pub fn is_supported_currency(currency: &str) -> bool {
    SUPPORTED_COUNTRIES
        .iter()
        .any(|c| c.currency.eq_ignore_ascii_case(currency))
}

/// Match a country code exactly (case-insensitive)
pub fn by_code(code: &str) -> Option<&'static SupportedCountry> {
    SUPPORTED_COUNTRIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Match user input against country codes and names (case-insensitive)
pub fn lookup(input: &str) -> Option<&'static SupportedCountry> {
    SUPPORTED_COUNTRIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(input) || c.name.eq_ignore_ascii_case(input))
}

/// Human-readable listing used in validation errors
pub fn supported_countries_display() -> String {
    SUPPORTED_COUNTRIES
        .iter()
        .map(|c| format!("{}: {}", c.currency, c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// IP-based country lookup seam
///
/// Implementations never error: any failure is reported as `None` and the
/// caller falls back to the default country.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Two-letter country code for the given IP, if the lookup succeeds
    async fn country_code(&self, ip: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    country: Option<String>,
}

/// Geolocation client for the ipapi `GET {base}/{ip}/json` endpoint
pub struct IpApiLocator {
    http_client: Client,
    base_url: String,
}

impl IpApiLocator {
    pub fn new(config: &GeoConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    async fn country_code(&self, ip: &str) -> Option<String> {
        let url = format!("{}/{}/json", self.base_url, ip);
        debug!("Geolocation lookup for IP: {}", ip);

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Geolocation request failed for {}: {}", ip, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Geolocation lookup for {} returned HTTP {}",
                ip,
                response.status()
            );
            return None;
        }

        match response.json::<GeoResponse>().await {
            Ok(body) => body.country.map(|c| c.trim().to_uppercase()),
            Err(e) => {
                warn!("Failed to parse geolocation response for {}: {}", ip, e);
                None
            }
        }
    }
}

/// Resolved output: always one of [`SUPPORTED_COUNTRIES`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCountry {
    pub code: &'static str,
    pub currency: &'static str,
    pub name: &'static str,
}

impl From<&'static SupportedCountry> for ResolvedCountry {
    fn from(country: &'static SupportedCountry) -> Self {
        Self {
            code: country.code,
            currency: country.currency,
            name: country.name,
        }
    }
}

/// Resolves the payer's country from explicit input or client IP
pub struct CountryResolver {
    locator: Arc<dyn GeoLocator>,
    default_country: String,
}

impl CountryResolver {
    pub fn new(locator: Arc<dyn GeoLocator>, default_country: String) -> Self {
        Self {
            locator,
            default_country,
        }
    }

    /// Resolve explicit input first; without input, geolocate the client IP.
    /// Unknown geolocation results fall back to the default country, while an
    /// unsupported explicit country is a validation error.
    pub async fn resolve(
        &self,
        country_input: Option<&str>,
        client_ip: Option<&str>,
    ) -> AppResult<ResolvedCountry> {
        let input = country_input.map(str::trim).filter(|s| !s.is_empty());

        if let Some(input) = input {
            return match lookup(input) {
                Some(country) => Ok(country.into()),
                None => Err(AppError::validation(
                    "country",
                    format!(
                        "Payments from '{}' are not supported. Supported countries are: {}",
                        input,
                        supported_countries_display()
                    ),
                )),
            };
        }

        let detected = match client_ip {
            Some(ip) => self.locator.country_code(ip).await,
            None => None,
        };

        let country = detected
            .as_deref()
            .and_then(by_code)
            .or_else(|| by_code(&self.default_country))
            .unwrap_or(&SUPPORTED_COUNTRIES[0]);

        debug!(
            "Resolved country '{}' for IP {:?} (detected: {:?})",
            country.code, client_ip, detected
        );

        Ok(country.into())
    }
}
