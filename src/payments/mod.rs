//! Payment lifecycle module
//!
//! The gateway seam (Paystack behind the `PaymentGateway` trait) and the two
//! pipelines driving the payment state machine: intake (validate, resolve
//! currency, compute settlement, persist, initialize with the gateway) and
//! verification (reconcile the gateway's final status against the record).

pub mod intake;
pub mod providers;
pub mod traits;
pub mod types;
pub mod verify;
