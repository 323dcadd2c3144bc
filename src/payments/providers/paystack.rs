//! Paystack payment gateway client
//!
//! Integrates with Paystack's transaction initialize and verify endpoints.
//! Every request is a single attempt bounded by the configured timeout;
//! failures surface to the caller as gateway errors and are never retried.

use crate::config::GatewayConfig;
use crate::error::{AppError, AppResult};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{GatewayChargeRequest, GatewayChargeResponse, GatewayVerification};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

// Paystack API response envelope
#[derive(Debug, Deserialize)]
struct PaystackResponse<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

// Initialize transaction response
#[derive(Debug, Deserialize)]
struct PaystackInitializeData {
    authorization_url: String,
    reference: String,
    #[serde(default)]
    access_code: Option<String>,
}

// Verify transaction response
#[derive(Debug, Deserialize)]
struct PaystackVerifyData {
    status: String,
    amount: i64,
    currency: String,
}

pub struct PaystackClient {
    http_client: Client,
    config: GatewayConfig,
}

impl PaystackClient {
    pub fn new(config: &GatewayConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Make an authenticated request and unwrap the Paystack envelope
    async fn make_request<T>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> AppResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.config.base_url, endpoint);
        let mut request = self
            .http_client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.config.secret_key))
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::gateway(e.to_string()))?;

        let status = response.status();
        let response_text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!("Paystack API error: HTTP {}: {}", status, response_text);
            return Err(AppError::gateway(format!("HTTP {}", status)));
        }

        let envelope: PaystackResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse Paystack response: {}", e);
            AppError::gateway(format!("Invalid response format: {}", e))
        })?;

        if !envelope.status {
            let message = envelope
                .message
                .unwrap_or_else(|| "Transaction was not successful".to_string());
            error!("Paystack API error: {}", message);
            return Err(AppError::gateway(message));
        }

        envelope
            .data
            .ok_or_else(|| AppError::gateway("Response contained no data".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize_transaction(
        &self,
        request: GatewayChargeRequest,
    ) -> AppResult<GatewayChargeResponse> {
        info!(
            "Initializing Paystack transaction: {} {} reference={}",
            request.amount_minor, request.currency, request.reference
        );

        let payload = serde_json::to_value(&request)
            .map_err(|e| AppError::gateway(format!("Failed to encode request: {}", e)))?;

        let data: PaystackInitializeData = self
            .make_request(reqwest::Method::POST, "/transaction/initialize", Some(&payload))
            .await?;

        info!(
            "Paystack transaction initialized: reference={}",
            data.reference
        );

        Ok(GatewayChargeResponse {
            authorization_url: data.authorization_url,
            reference: data.reference,
            access_code: data.access_code,
        })
    }

    async fn verify_transaction(&self, reference: &str) -> AppResult<GatewayVerification> {
        info!("Verifying Paystack transaction: reference={}", reference);

        let data: PaystackVerifyData = self
            .make_request(
                reqwest::Method::GET,
                &format!("/transaction/verify/{}", reference),
                None,
            )
            .await?;

        info!(
            "Paystack transaction verified: reference={}, status={}",
            reference, data.status
        );

        let verification = match data.status.as_str() {
            "success" => GatewayVerification::Success {
                amount_minor: data.amount,
                currency: data.currency,
            },
            other => GatewayVerification::Other {
                status: other.to_string(),
            },
        };

        Ok(verification)
    }
}
