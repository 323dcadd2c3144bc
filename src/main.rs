use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use paylink_backend::api::{self, AppState};
use paylink_backend::config::Config;
use paylink_backend::database::repository::PaymentStore;
use paylink_backend::database::{self, payment_repository::PaymentRepository, PoolConfig};
use paylink_backend::fx::{ExchangeRateApiClient, RateSource};
use paylink_backend::geo::{CountryResolver, GeoLocator, IpApiLocator};
use paylink_backend::payments::intake::IntakePipeline;
use paylink_backend::payments::providers::PaystackClient;
use paylink_backend::payments::traits::PaymentGateway;
use paylink_backend::payments::verify::VerificationPipeline;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    // Log startup info
    tracing::info!("Starting Paylink Backend");
    tracing::info!("Environment: {}", config.server.environment);
    tracing::info!(
        "Settlement currency: {}",
        config.payments.settlement_currency
    );

    // Database pool
    let pool_config = PoolConfig {
        max_connections: config.database.max_connections,
        ..Default::default()
    };
    let pool = database::init_pool(&config.database.url, Some(pool_config)).await?;

    // Wire components; each takes its config slice at construction
    let store: Arc<dyn PaymentStore> = Arc::new(PaymentRepository::new(pool.clone()));
    let gateway: Arc<dyn PaymentGateway> = Arc::new(PaystackClient::new(&config.gateway)?);
    let rates: Arc<dyn RateSource> = Arc::new(ExchangeRateApiClient::new(&config.fx)?);
    let locator: Arc<dyn GeoLocator> = Arc::new(IpApiLocator::new(&config.geo)?);
    let countries = CountryResolver::new(locator, config.geo.default_country.clone());

    let intake = Arc::new(IntakePipeline::new(
        store.clone(),
        gateway.clone(),
        rates,
        countries,
        config.payments.clone(),
        config.gateway.callback_url.clone(),
    ));
    let verification = Arc::new(VerificationPipeline::new(store.clone(), gateway));

    let state = AppState {
        config: config.clone(),
        pool,
        store,
        intake,
        verification,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(api::health::health_check))
        .route(
            "/api/v1/payments",
            post(api::payments::create_payment).get(api::payments::list_payments),
        )
        .route(
            "/api/v1/payments/verify/:reference",
            get(api::payments::verify_payment),
        )
        .route("/api/v1/payments/:id", get(api::payments::get_payment))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
