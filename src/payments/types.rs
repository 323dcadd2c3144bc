//! Gateway request/response types

use serde::{Deserialize, Serialize};

/// Charge initialization request sent to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayChargeRequest {
    /// Customer email address
    pub email: String,
    /// Settlement amount in the gateway's minor unit (kobo for NGN)
    #[serde(rename = "amount")]
    pub amount_minor: i64,
    /// Settlement currency code
    pub currency: String,
    /// Our reference for this transaction (the record's idempotency key)
    pub reference: String,
    /// Callback URL to redirect after payment
    pub callback_url: String,
    /// Original amount/currency/country/state/phone/name of the request
    pub metadata: serde_json::Value,
}

/// Successful charge initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayChargeResponse {
    /// Authorization URL the payer completes the charge on
    pub authorization_url: String,
    /// The gateway's own reference for the transaction
    pub reference: String,
    /// Access code for inline payment forms, when the gateway returns one
    pub access_code: Option<String>,
}

/// Outcome of a gateway verify call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayVerification {
    /// The charge settled; amount is in minor units
    Success { amount_minor: i64, currency: String },
    /// Any other gateway sub-status (failed, abandoned, ...)
    Other { status: String },
}

impl GatewayVerification {
    pub fn is_success(&self) -> bool {
        matches!(self, GatewayVerification::Success { .. })
    }
}
