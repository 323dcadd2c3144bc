//! Intake pipeline integration tests over in-memory doubles

mod common;

use common::{make_intake, sample_input, InMemoryStore, MockGateway};
use paylink_backend::database::payment_repository::PaymentStatus;
use paylink_backend::database::repository::PaymentStore;
use paylink_backend::error::AppError;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_create_payment_with_live_rate() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::succeeding("T123456");
    let intake = make_intake(store.clone(), gateway.clone(), Some(dec!(1535.451)), None);

    let initiated = intake
        .initiate(sample_input(), Some("203.0.113.7"))
        .await
        .unwrap();

    let payment = &initiated.payment;
    assert_eq!(payment.currency, "USD");
    assert_eq!(payment.country, "UNITED STATES");
    assert_eq!(payment.amount, dec!(100.00));
    assert_eq!(payment.amount_ngn, Some(dec!(153545.10)));
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.gateway_reference.as_deref(), Some("T123456"));
    assert!(payment.idempotency_key.starts_with("PAY-"));
    assert_eq!(initiated.payment_link, "https://checkout.paystack.com/mock");
}

#[tokio::test]
async fn test_create_payment_with_fallback_rate() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::succeeding("T654321");
    let intake = make_intake(store.clone(), gateway, None, None);

    let initiated = intake.initiate(sample_input(), None).await.unwrap();

    // USD falls back to the static 1535 table rate
    assert_eq!(initiated.payment.amount_ngn, Some(dec!(153500.00)));
}

#[tokio::test]
async fn test_gateway_receives_minor_units() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::succeeding("T777");
    let intake = make_intake(store, gateway.clone(), Some(dec!(1535.451)), None);

    intake.initiate(sample_input(), None).await.unwrap();

    let charge = gateway.last_charge.lock().unwrap().clone().unwrap();
    assert_eq!(charge.amount_minor, 15354510);
    assert_eq!(charge.currency, "NGN");
    assert_eq!(charge.email, "john@gmail.com");
    assert_eq!(charge.metadata["original_currency"], "USD");
    assert_eq!(charge.metadata["original_amount"], "100.00");
}

#[tokio::test]
async fn test_unsupported_country_rejected_with_listing() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::succeeding("T1");
    let intake = make_intake(store.clone(), gateway, None, None);

    let mut input = sample_input();
    input.country = Some("Atlantis".to_string());
    let err = intake.initiate(input, None).await.unwrap_err();

    assert!(err.is_validation());
    let message = err.to_string();
    assert!(message.contains("'Atlantis'"));
    assert!(message.contains("NGN: NIGERIA"));
    assert!(message.contains("XAF: CAMEROON"));
    // Nothing was persisted
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_disallowed_email_domain_rejected() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::succeeding("T1");
    let intake = make_intake(store.clone(), gateway, None, None);

    let mut input = sample_input();
    input.email = "eve@hotmail.com".to_string();
    let err = intake.initiate(input, None).await.unwrap_err();

    assert!(err.is_validation());
    assert!(err.to_string().contains("company.com, gmail.com, yahoo.com"));
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_bad_phone_numbers_rejected() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::succeeding("T1");
    let intake = make_intake(store.clone(), gateway, None, None);

    for phone in ["12345678", "1234567890123456", "080-1234567"] {
        let mut input = sample_input();
        input.phone_number = phone.to_string();
        let err = intake.initiate(input, None).await.unwrap_err();
        assert!(err.is_validation(), "expected rejection for {:?}", phone);
    }
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_missing_required_fields_rejected() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::succeeding("T1");
    let intake = make_intake(store.clone(), gateway, None, None);

    let mut no_name = sample_input();
    no_name.name = String::new();
    assert!(intake.initiate(no_name, None).await.is_err());

    let mut no_state = sample_input();
    no_state.state = String::new();
    assert!(intake.initiate(no_state, None).await.is_err());

    let mut small_amount = sample_input();
    small_amount.amount = dec!(0.50);
    assert!(intake.initiate(small_amount, None).await.is_err());

    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_gateway_failure_marks_record_failed_to_initialize() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::failing();
    let intake = make_intake(store.clone(), gateway, Some(dec!(1535.451)), None);

    let err = intake.initiate(sample_input(), None).await.unwrap_err();
    assert!(matches!(err, AppError::Gateway { .. }));

    // The record exists in the terminal failed_to_initialize state, not
    // stuck pending
    let payments = store.list().await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::FailedToInitialize);
    assert!(payments[0].gateway_reference.is_none());
}

#[tokio::test]
async fn test_geolocation_used_when_country_absent() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::succeeding("T2");
    let intake = make_intake(store, gateway, None, Some("GB"));

    let mut input = sample_input();
    input.country = None;
    let initiated = intake.initiate(input, Some("198.51.100.9")).await.unwrap();

    assert_eq!(initiated.payment.currency, "GBP");
    assert_eq!(initiated.payment.country, "UNITED KINGDOM");
    // Fallback table: GBP rates at 1020
    assert_eq!(initiated.payment.amount_ngn, Some(dec!(102000.00)));
}

#[tokio::test]
async fn test_geolocation_failure_defaults_to_nigeria() {
    let store = InMemoryStore::new();
    let gateway = MockGateway::succeeding("T3");
    let intake = make_intake(store, gateway, None, None);

    let mut input = sample_input();
    input.country = None;
    let initiated = intake.initiate(input, Some("203.0.113.9")).await.unwrap();

    assert_eq!(initiated.payment.currency, "NGN");
    // NGN -> NGN is identity; no conversion applied
    assert_eq!(initiated.payment.amount_ngn, Some(dec!(100.00)));
}

#[tokio::test]
async fn test_list_returns_newest_first() {
    let store = InMemoryStore::new();

    for reference in ["T-A", "T-B", "T-C"] {
        let gateway = MockGateway::succeeding(reference);
        let intake = make_intake(store.clone(), gateway, None, None);
        intake.initiate(sample_input(), None).await.unwrap();
    }

    let payments = store.list().await.unwrap();
    assert_eq!(payments.len(), 3);
    assert_eq!(payments[0].gateway_reference.as_deref(), Some("T-C"));
    assert_eq!(payments[2].gateway_reference.as_deref(), Some("T-A"));
    assert!(payments[0].created_at >= payments[1].created_at);
    assert!(payments[1].created_at >= payments[2].created_at);
}
