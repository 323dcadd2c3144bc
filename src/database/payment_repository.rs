use crate::database::error::{DatabaseError, DbResult};
use crate::database::repository::PaymentStore;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

/// Lifecycle state of a payment attempt.
///
/// `pending` is the only non-terminal state; a record moves to exactly one of
/// the terminal states and stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
    FailedToInitialize,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Successful => "successful",
            PaymentStatus::Failed => "failed",
            PaymentStatus::FailedToInitialize => "failed_to_initialize",
        };
        f.write_str(s)
    }
}

/// Payment entity
///
/// `idempotency_key` is assigned at creation and never overwritten;
/// `gateway_reference` is Paystack's reference, set once on a successful
/// initialize. Both are unique at the storage layer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    /// Requested amount in the payer's original currency
    pub amount: Decimal,
    /// Resolved payer currency code
    pub currency: String,
    /// Settlement amount in NGN; estimate from intake, confirmed by verification
    pub amount_ngn: Option<Decimal>,
    pub state: String,
    pub country: String,
    pub idempotency_key: String,
    pub gateway_reference: Option<String>,
    pub status: PaymentStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Payment {
    /// Reference to present to the gateway: the gateway's own reference once
    /// assigned, the internal key before that
    pub fn gateway_lookup_reference(&self) -> &str {
        self.gateway_reference
            .as_deref()
            .unwrap_or(&self.idempotency_key)
    }
}

/// Fields supplied by the intake pipeline when creating a record
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub state: String,
    pub country: String,
    pub idempotency_key: String,
    pub status: PaymentStatus,
}

const PAYMENT_COLUMNS: &str = "id, name, email, phone_number, amount, currency, amount_ngn, \
     state, country, idempotency_key, gateway_reference, status, created_at";

/// Postgres-backed payment store
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn insert(&self, payment: NewPayment) -> DbResult<Payment> {
        sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (id, name, email, phone_number, amount, currency, state, country, idempotency_key, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&payment.name)
        .bind(&payment.email)
        .bind(&payment.phone_number)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.state)
        .bind(&payment.country)
        .bind(&payment.idempotency_key)
        .bind(payment.status)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Payment>> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_reference(&self, reference: &str) -> DbResult<Option<Payment>> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE gateway_reference = $1 OR idempotency_key = $1 \
             LIMIT 1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn record_initialized(
        &self,
        id: Uuid,
        gateway_reference: &str,
        amount_ngn: Decimal,
    ) -> DbResult<Payment> {
        sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments SET gateway_reference = $2, amount_ngn = $3 \
             WHERE id = $1 \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(gateway_reference)
        .bind(amount_ngn)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn mark_failed_to_initialize(&self, id: Uuid) -> DbResult<Payment> {
        sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments SET status = 'failed_to_initialize' \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn apply_verification(
        &self,
        id: Uuid,
        status: PaymentStatus,
        amount_ngn: Option<Decimal>,
    ) -> DbResult<Payment> {
        // Partial update of (status, amount_ngn) only. The WHERE clause is the
        // transition guard: terminal states never reverse.
        let updated = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments \
             SET status = $2, amount_ngn = COALESCE($3, amount_ngn) \
             WHERE id = $1 AND (status = 'pending' OR status = $2) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .bind(amount_ngn)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        match updated {
            Some(payment) => Ok(payment),
            None => {
                // Guard rejected the transition: keep the stored terminal state
                let stored = self
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| DatabaseError::not_found("Payment", id.to_string()))?;
                warn!(
                    "Verification result '{}' contradicts stored status '{}' for payment {}; keeping stored status",
                    status, stored.status, id
                );
                Ok(stored)
            }
        }
    }

    async fn list(&self) -> DbResult<Vec<Payment>> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
