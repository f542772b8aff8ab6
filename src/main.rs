mod auth;
mod bookings;
mod db;
mod models;
mod payments;
mod query;
#[cfg(test)]
mod tests;
mod validation;

use std::sync::Arc;

use axum::{
    response::Json,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;

use bookings::{BookingService, BookingsRepository, CatalogRepository};
use payments::{PaymentGateway, PaymentService, SandboxGateway};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub booking_service: BookingService,
    pub payment_service: PaymentService,
}

/// Handler for GET /health
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
pub fn create_router(
    db: PgPool,
    gateway: Arc<dyn PaymentGateway>,
    webhook_secret: String,
) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let bookings_repo = BookingsRepository::new(db.clone());
    let catalog_repo = CatalogRepository::new(db.clone());
    let booking_service = BookingService::new(bookings_repo.clone(), catalog_repo);
    let payment_service = PaymentService::new(bookings_repo, gateway, webhook_secret);

    let state = AppState {
        db,
        booking_service,
        payment_service,
    };

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        // Booking routes
        .route(
            "/api/bookings/flight",
            post(bookings::create_flight_booking_handler),
        )
        .route(
            "/api/bookings/hotel",
            post(bookings::create_hotel_booking_handler),
        )
        .route(
            "/api/bookings/cab",
            post(bookings::create_cab_booking_handler),
        )
        .route(
            "/api/bookings/package",
            post(bookings::create_package_booking_handler),
        )
        .route("/api/bookings", get(bookings::list_bookings_handler))
        .route(
            "/api/bookings/stats/summary",
            get(bookings::booking_stats_handler),
        )
        .route(
            "/api/bookings/:booking_id",
            get(bookings::get_booking_handler),
        )
        .route(
            "/api/bookings/:booking_id/cancel",
            put(bookings::cancel_booking_handler),
        )
        // Payment routes
        .route(
            "/api/payments/create-payment-intent",
            post(payments::create_payment_intent_handler),
        )
        .route(
            "/api/payments/confirm-payment",
            post(payments::confirm_payment_handler),
        )
        .route("/api/payments/refund", post(payments::refund_handler))
        .route(
            "/api/payments/history",
            get(payments::payment_history_handler),
        )
        .route("/api/payments/webhook", post(payments::webhook_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Travel API - Starting...");

    // Get configuration from environment variables
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let webhook_secret =
        std::env::var("WEBHOOK_SECRET").expect("WEBHOOK_SECRET must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Create the application router
    let gateway = Arc::new(SandboxGateway::new());
    let app = create_router(db_pool, gateway, webhook_secret);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Travel API is running on http://{}", addr);

    axum::serve(listener, app).await.expect("Server error");
}
