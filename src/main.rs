use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edupay::config::Config;
use edupay::middleware::RequestId;
use edupay::modules::gateways::services::RazorpayClient;
use edupay::modules::installments::{controllers as emi_controllers, SqlInstallmentRepository};
use edupay::modules::notifications::services::SmtpNotifier;
use edupay::modules::payments::{controllers as payment_controllers, SqlPaymentRepository};
use edupay::modules::{courses::repositories::SqlCourseRepository, purchases::SqlPurchaseRepository};
use edupay::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edupay=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting EduPay Course Payment Platform");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool initialized ({}..{} connections)",
        config.database.min_connections,
        config.database.max_connections
    );

    let gateway = RazorpayClient::new(
        config.razorpay.key_id.clone(),
        config.razorpay.key_secret.clone(),
        Some(config.razorpay.base_url.clone()),
    );
    let notifier = SmtpNotifier::new(config.smtp.clone())
        .expect("Failed to create SMTP notifier");

    let state = AppState {
        courses: Arc::new(SqlCourseRepository::new(db_pool.clone())),
        payments: Arc::new(SqlPaymentRepository::new(db_pool.clone())),
        installments: Arc::new(SqlInstallmentRepository::new(db_pool.clone())),
        purchases: Arc::new(SqlPurchaseRepository::new(db_pool.clone())),
        gateway: Arc::new(gateway),
        notifier: Arc::new(notifier),
        jwt_secret: config.security.jwt_secret.clone(),
    };

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(TracingLogger::default())
            .wrap(RequestId)
            .wrap(Cors::permissive())
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/api/v1")
                    .configure(payment_controllers::configure)
                    .configure(emi_controllers::configure),
            )
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "edupay"
    }))
}
