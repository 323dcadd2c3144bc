//! Payment gateway trait definition

use crate::error::AppResult;
use crate::payments::types::{GatewayChargeRequest, GatewayChargeResponse, GatewayVerification};
use async_trait::async_trait;

/// Seam in front of the payment gateway so the pipelines can be exercised
/// with test doubles. The production implementation is
/// [`crate::payments::providers::PaystackClient`].
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initialize a charge, returning the authorization URL the payer
    /// completes it on and the gateway's reference.
    ///
    /// Any communication failure or unsuccessful gateway response is an
    /// error; there are no retries.
    async fn initialize_transaction(
        &self,
        request: GatewayChargeRequest,
    ) -> AppResult<GatewayChargeResponse>;

    /// Fetch the final status of a transaction by reference.
    async fn verify_transaction(&self, reference: &str) -> AppResult<GatewayVerification>;
}
