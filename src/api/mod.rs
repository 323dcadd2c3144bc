pub mod health;
pub mod payments;

use crate::config::Config;
use crate::database::repository::PaymentStore;
use crate::payments::intake::IntakePipeline;
use crate::payments::verify::VerificationPipeline;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub store: Arc<dyn PaymentStore>,
    pub intake: Arc<IntakePipeline>,
    pub verification: Arc<VerificationPipeline>,
}
