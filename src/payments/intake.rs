//! Payment intake pipeline
//!
//! Validates the request, resolves the payer's country and currency, computes
//! the NGN settlement amount, persists the record, and initializes the charge
//! with the gateway. A gateway failure moves the record to the terminal
//! `failed_to_initialize` status so nothing is ever stuck in `pending`.

use crate::config::PaymentsConfig;
use crate::database::payment_repository::{NewPayment, Payment, PaymentStatus};
use crate::database::repository::PaymentStore;
use crate::error::{AppError, AppResult};
use crate::fx::{self, RateSource};
use crate::geo::{is_supported_currency, CountryResolver};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::GatewayChargeRequest;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Incoming payment request
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub state: String,
    /// Country code or name; resolved via geolocation when absent
    #[serde(default)]
    pub country: Option<String>,
}

/// Result of a successful intake: the persisted record and the gateway's
/// authorization URL
#[derive(Debug, Clone)]
pub struct InitiatedPayment {
    pub payment: Payment,
    pub payment_link: String,
}

pub struct IntakePipeline {
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    rates: Arc<dyn RateSource>,
    countries: CountryResolver,
    payments: PaymentsConfig,
    callback_url: String,
}

impl IntakePipeline {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        rates: Arc<dyn RateSource>,
        countries: CountryResolver,
        payments: PaymentsConfig,
        callback_url: String,
    ) -> Self {
        Self {
            store,
            gateway,
            rates,
            countries,
            payments,
            callback_url,
        }
    }

    pub async fn initiate(
        &self,
        input: PaymentInput,
        client_ip: Option<&str>,
    ) -> AppResult<InitiatedPayment> {
        validate_email(&input.email, &self.payments.allowed_email_domains)?;
        validate_phone_number(&input.phone_number)?;

        let resolved = self
            .countries
            .resolve(input.country.as_deref(), client_ip)
            .await?;

        validate_required_fields(&input)?;

        let rate = fx::resolve_rate(
            self.rates.as_ref(),
            resolved.currency,
            &self.payments.settlement_currency,
        )
        .await;
        let amount_ngn = settlement_amount(input.amount, rate);

        // The resolver only emits supported pairs; this is the invariant check
        // before any charge is attempted
        let currency_supported = is_supported_currency(resolved.currency);

        let payment = self
            .store
            .insert(NewPayment {
                name: input.name.clone(),
                email: input.email.clone(),
                phone_number: input.phone_number.clone(),
                amount: input.amount,
                currency: resolved.currency.to_string(),
                state: input.state.clone(),
                country: resolved.name.to_string(),
                idempotency_key: new_idempotency_key(),
                status: if currency_supported {
                    PaymentStatus::Pending
                } else {
                    PaymentStatus::Failed
                },
            })
            .await?;

        if !currency_supported {
            warn!(
                "Rejected payment {} with unsupported currency '{}'",
                payment.id, payment.currency
            );
            return Err(AppError::validation(
                "currency",
                format!("Currency '{}' is not supported.", payment.currency),
            ));
        }

        info!(
            "Created payment {} ({} {} -> {} {})",
            payment.id, input.amount, payment.currency, amount_ngn, self.payments.settlement_currency
        );

        let charge = GatewayChargeRequest {
            email: payment.email.clone(),
            amount_minor: to_minor_units(amount_ngn)?,
            currency: self.payments.settlement_currency.clone(),
            reference: payment.idempotency_key.clone(),
            callback_url: self.callback_url.clone(),
            metadata: serde_json::json!({
                "name": payment.name,
                "phone_number": payment.phone_number,
                "original_amount": payment.amount.to_string(),
                "original_currency": payment.currency,
                "country": payment.country,
                "state": payment.state,
            }),
        };

        match self.gateway.initialize_transaction(charge).await {
            Ok(response) => {
                let payment = self
                    .store
                    .record_initialized(payment.id, &response.reference, amount_ngn)
                    .await?;
                info!(
                    "Payment {} initialized with gateway reference {}",
                    payment.id, response.reference
                );
                Ok(InitiatedPayment {
                    payment,
                    payment_link: response.authorization_url,
                })
            }
            Err(gateway_err) => {
                warn!(
                    "Gateway initialization failed for payment {}: {}",
                    payment.id, gateway_err
                );
                if let Err(store_err) = self.store.mark_failed_to_initialize(payment.id).await {
                    error!(
                        "Failed to mark payment {} as failed_to_initialize: {}",
                        payment.id, store_err
                    );
                }
                Err(gateway_err)
            }
        }
    }
}

fn new_idempotency_key() -> String {
    format!("PAY-{}", Uuid::new_v4().simple())
}

fn validate_email(email: &str, allowed_domains: &[String]) -> AppResult<()> {
    let allowed = allowed_domains
        .iter()
        .any(|domain| email.ends_with(&format!("@{}", domain)));
    if !allowed {
        return Err(AppError::validation(
            "email",
            format!(
                "Email must be from the domains: {}",
                allowed_domains.join(", ")
            ),
        ));
    }
    Ok(())
}

fn validate_phone_number(value: &str) -> AppResult<()> {
    let all_digits = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
    if !all_digits || !(9..=15).contains(&value.len()) {
        return Err(AppError::validation(
            "phone_number",
            "Phone number must be between 9 and 15 digits.",
        ));
    }
    Ok(())
}

fn validate_required_fields(input: &PaymentInput) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::validation("name", "Name is required."));
    }
    if input.state.trim().is_empty() {
        return Err(AppError::validation("state", "State is required."));
    }
    if input.amount < dec!(1) {
        return Err(AppError::validation("amount", "Amount must be at least 1."));
    }
    Ok(())
}

/// Settlement amount: requested amount times rate, 2 decimal places, half-up
pub fn settlement_amount(amount: Decimal, rate: Decimal) -> Decimal {
    (amount * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Gateway minor units: amount x 100, truncated to an integer
pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
    (amount * dec!(100))
        .trunc()
        .to_i64()
        .ok_or_else(|| AppError::validation("amount", "Amount is too large."))
}
