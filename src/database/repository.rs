use crate::database::error::DbResult;
use crate::database::payment_repository::{NewPayment, Payment, PaymentStatus};
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Storage seam for the payment pipelines.
///
/// The pipelines only ever touch payments through this trait, so tests can
/// substitute an in-memory store. Payments are never deleted, and updates are
/// restricted to the specific lifecycle mutations below rather than a blind
/// row rewrite.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persist a new payment attempt
    async fn insert(&self, payment: NewPayment) -> DbResult<Payment>;

    /// Fetch a payment by its internal ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Payment>>;

    /// Fetch a payment by gateway reference or idempotency key
    async fn find_by_reference(&self, reference: &str) -> DbResult<Option<Payment>>;

    /// Record a successful gateway initialization: assign the gateway
    /// reference and the estimated settlement amount
    async fn record_initialized(
        &self,
        id: Uuid,
        gateway_reference: &str,
        amount_ngn: Decimal,
    ) -> DbResult<Payment>;

    /// Move a pending payment to the terminal `failed_to_initialize` status
    async fn mark_failed_to_initialize(&self, id: Uuid) -> DbResult<Payment>;

    /// Apply a verification outcome as a partial update of status and
    /// settlement amount.
    ///
    /// The stored status only changes when it is `pending` or already equals
    /// `status`; a terminal state is never reversed.
    async fn apply_verification(
        &self,
        id: Uuid,
        status: PaymentStatus,
        amount_ngn: Option<Decimal>,
    ) -> DbResult<Payment>;

    /// All payments, newest first
    async fn list(&self) -> DbResult<Vec<Payment>>;
}
