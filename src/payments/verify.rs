//! Payment verification pipeline
//!
//! Reconciles the gateway's final status for a reference against the local
//! record. The write is a partial update of (status, amount_ngn) guarded by
//! the transition invariant, so re-running verification is idempotent and
//! terminal states never reverse.

use crate::database::payment_repository::{Payment, PaymentStatus};
use crate::database::repository::PaymentStore;
use crate::error::{AppError, AppResult};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::GatewayVerification;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

pub struct VerificationPipeline {
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl VerificationPipeline {
    pub fn new(store: Arc<dyn PaymentStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Verify the payment identified by `reference` (gateway reference or
    /// internal idempotency key) and reconcile the stored record.
    ///
    /// Gateway failures leave the record untouched; the caller may retry.
    pub async fn verify(&self, reference: &str) -> AppResult<Payment> {
        let payment = self
            .store
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::not_found("Payment", reference))?;

        let verification = self
            .gateway
            .verify_transaction(payment.gateway_lookup_reference())
            .await?;

        let (status, amount_ngn) = map_verification(&verification);

        let updated = self
            .store
            .apply_verification(payment.id, status, amount_ngn)
            .await?;

        info!(
            "Verified payment {}: gateway said {:?}, stored status {}",
            updated.id, verification, updated.status
        );

        Ok(updated)
    }
}

/// Deterministic mapping from the gateway's verification outcome to the local
/// state: sub-status "success" settles the payment with the confirmed amount
/// (minor units / 100); anything else fails it without touching the amount.
fn map_verification(verification: &GatewayVerification) -> (PaymentStatus, Option<Decimal>) {
    match verification {
        GatewayVerification::Success { amount_minor, .. } => (
            PaymentStatus::Successful,
            Some(Decimal::from(*amount_minor) / dec!(100)),
        ),
        GatewayVerification::Other { .. } => (PaymentStatus::Failed, None),
    }
}
