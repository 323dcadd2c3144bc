#![allow(dead_code)]

//! Shared test doubles for the pipeline integration tests: an in-memory
//! payment store mirroring the repository's transition semantics, and
//! configurable gateway/rate/geo mocks.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use paylink_backend::config::PaymentsConfig;
use paylink_backend::database::error::{DatabaseError, DatabaseErrorKind, DbResult};
use paylink_backend::database::payment_repository::{NewPayment, Payment, PaymentStatus};
use paylink_backend::database::repository::PaymentStore;
use paylink_backend::error::{AppError, AppResult};
use paylink_backend::fx::RateSource;
use paylink_backend::geo::{CountryResolver, GeoLocator};
use paylink_backend::payments::intake::IntakePipeline;
use paylink_backend::payments::traits::PaymentGateway;
use paylink_backend::payments::types::{
    GatewayChargeRequest, GatewayChargeResponse, GatewayVerification,
};
use paylink_backend::payments::verify::VerificationPipeline;

/// In-memory payment store with the same uniqueness and transition rules as
/// the Postgres repository
#[derive(Default)]
pub struct InMemoryStore {
    payments: Mutex<Vec<Payment>>,
    sequence: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.payments.lock().unwrap().len()
    }

    pub fn get(&self, id: Uuid) -> Option<Payment> {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    fn unique_violation(constraint: &str) -> DatabaseError {
        DatabaseError::new(DatabaseErrorKind::UniqueConstraintViolation {
            constraint: constraint.to_string(),
        })
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn insert(&self, payment: NewPayment) -> DbResult<Payment> {
        let mut payments = self.payments.lock().unwrap();
        if payments
            .iter()
            .any(|p| p.idempotency_key == payment.idempotency_key)
        {
            return Err(Self::unique_violation("payments_idempotency_key_key"));
        }

        // Spread creation times so descending order is well defined
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) as i64;
        let record = Payment {
            id: Uuid::new_v4(),
            name: payment.name,
            email: payment.email,
            phone_number: payment.phone_number,
            amount: payment.amount,
            currency: payment.currency,
            amount_ngn: None,
            state: payment.state,
            country: payment.country,
            idempotency_key: payment.idempotency_key,
            gateway_reference: None,
            status: payment.status,
            created_at: Utc::now() + Duration::milliseconds(seq),
        };
        payments.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Payment>> {
        Ok(self.get(id))
    }

    async fn find_by_reference(&self, reference: &str) -> DbResult<Option<Payment>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| {
                p.gateway_reference.as_deref() == Some(reference)
                    || p.idempotency_key == reference
            })
            .cloned())
    }

    async fn record_initialized(
        &self,
        id: Uuid,
        gateway_reference: &str,
        amount_ngn: Decimal,
    ) -> DbResult<Payment> {
        let mut payments = self.payments.lock().unwrap();
        if payments
            .iter()
            .any(|p| p.id != id && p.gateway_reference.as_deref() == Some(gateway_reference))
        {
            return Err(Self::unique_violation("payments_gateway_reference_key"));
        }
        let record = payments
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DatabaseError::not_found("Payment", id.to_string()))?;
        record.gateway_reference = Some(gateway_reference.to_string());
        record.amount_ngn = Some(amount_ngn);
        Ok(record.clone())
    }

    async fn mark_failed_to_initialize(&self, id: Uuid) -> DbResult<Payment> {
        let mut payments = self.payments.lock().unwrap();
        let record = payments
            .iter_mut()
            .find(|p| p.id == id && p.status == PaymentStatus::Pending)
            .ok_or_else(|| DatabaseError::not_found("Payment", id.to_string()))?;
        record.status = PaymentStatus::FailedToInitialize;
        Ok(record.clone())
    }

    async fn apply_verification(
        &self,
        id: Uuid,
        status: PaymentStatus,
        amount_ngn: Option<Decimal>,
    ) -> DbResult<Payment> {
        let mut payments = self.payments.lock().unwrap();
        let record = payments
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DatabaseError::not_found("Payment", id.to_string()))?;
        // Transition guard: terminal states never reverse
        if record.status == PaymentStatus::Pending || record.status == status {
            record.status = status;
            if let Some(amount) = amount_ngn {
                record.amount_ngn = Some(amount);
            }
        }
        Ok(record.clone())
    }

    async fn list(&self) -> DbResult<Vec<Payment>> {
        let mut payments = self.payments.lock().unwrap().clone();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }
}

/// Configurable gateway double recording the requests it receives
pub struct MockGateway {
    pub fail_initialize: bool,
    pub assigned_reference: String,
    pub verify_outcome: Mutex<Option<GatewayVerification>>,
    pub last_charge: Mutex<Option<GatewayChargeRequest>>,
    pub last_verify_reference: Mutex<Option<String>>,
}

impl MockGateway {
    pub fn succeeding(reference: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_initialize: false,
            assigned_reference: reference.to_string(),
            verify_outcome: Mutex::new(None),
            last_charge: Mutex::new(None),
            last_verify_reference: Mutex::new(None),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_initialize: true,
            assigned_reference: String::new(),
            verify_outcome: Mutex::new(None),
            last_charge: Mutex::new(None),
            last_verify_reference: Mutex::new(None),
        })
    }

    pub fn set_verify_outcome(&self, outcome: Option<GatewayVerification>) {
        *self.verify_outcome.lock().unwrap() = outcome;
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initialize_transaction(
        &self,
        request: GatewayChargeRequest,
    ) -> AppResult<GatewayChargeResponse> {
        *self.last_charge.lock().unwrap() = Some(request);
        if self.fail_initialize {
            return Err(AppError::gateway(
                "Failed to initialize transaction with Paystack.",
            ));
        }
        Ok(GatewayChargeResponse {
            authorization_url: "https://checkout.paystack.com/mock".to_string(),
            reference: self.assigned_reference.clone(),
            access_code: Some("mock_access".to_string()),
        })
    }

    async fn verify_transaction(&self, reference: &str) -> AppResult<GatewayVerification> {
        *self.last_verify_reference.lock().unwrap() = Some(reference.to_string());
        self.verify_outcome
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::gateway("Failed to verify transaction with Paystack."))
    }
}

pub struct FixedRateSource(pub Option<Decimal>);

#[async_trait]
impl RateSource for FixedRateSource {
    async fn live_rate(&self, _from: &str, _to: &str) -> Option<Decimal> {
        self.0
    }
}

pub struct FixedLocator(pub Option<String>);

#[async_trait]
impl GeoLocator for FixedLocator {
    async fn country_code(&self, _ip: &str) -> Option<String> {
        self.0.clone()
    }
}

pub fn payments_config() -> PaymentsConfig {
    PaymentsConfig {
        settlement_currency: "NGN".to_string(),
        allowed_email_domains: vec![
            "company.com".to_string(),
            "gmail.com".to_string(),
            "yahoo.com".to_string(),
        ],
    }
}

pub fn make_intake(
    store: Arc<InMemoryStore>,
    gateway: Arc<MockGateway>,
    live_rate: Option<Decimal>,
    located_country: Option<&str>,
) -> IntakePipeline {
    let countries = CountryResolver::new(
        Arc::new(FixedLocator(located_country.map(|c| c.to_string()))),
        "NG".to_string(),
    );
    IntakePipeline::new(
        store,
        gateway,
        Arc::new(FixedRateSource(live_rate)),
        countries,
        payments_config(),
        "https://paylink.example.com/api/v1/payments/verify".to_string(),
    )
}

pub fn make_verification(
    store: Arc<InMemoryStore>,
    gateway: Arc<MockGateway>,
) -> VerificationPipeline {
    VerificationPipeline::new(store, gateway)
}

pub fn sample_input() -> paylink_backend::payments::intake::PaymentInput {
    serde_json::from_value(serde_json::json!({
        "name": "John Doe",
        "email": "john@gmail.com",
        "phone_number": "08012345678",
        "amount": "100.00",
        "state": "NY",
        "country": "United States",
    }))
    .unwrap()
}
