//! Payment endpoints: create, verify, list, fetch by id

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::api::AppState;
use crate::database::payment_repository::Payment;
use crate::error::{AppError, AppResult};
use crate::payments::intake::PaymentInput;

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub payment: Payment,
    pub payment_link: String,
}

/// Client IP for geolocation: first hop of `X-Forwarded-For` when present,
/// else the socket peer address
fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

pub async fn create_payment(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(input): Json<PaymentInput>,
) -> AppResult<(StatusCode, Json<CreatePaymentResponse>)> {
    let ip = client_ip(&headers, &addr);
    let initiated = state.intake.initiate(input, Some(&ip)).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePaymentResponse {
            payment: initiated.payment,
            payment_link: initiated.payment_link,
        }),
    ))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> AppResult<Json<Payment>> {
    let payment = state.verification.verify(&reference).await?;
    Ok(Json(payment))
}

pub async fn list_payments(State(state): State<AppState>) -> AppResult<Json<Vec<Payment>>> {
    let payments = state.store.list().await?;
    Ok(Json(payments))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    let payment = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment", id.to_string()))?;
    Ok(Json(payment))
}
