//! Rentora Backend Server
//!
//! The main server binary: loads configuration, connects to Postgres, runs
//! migrations, wires up the services, spawns the auto-refund scheduler, and
//! serves the API until a shutdown signal arrives.

use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use rentora_server::auth::AuthService;
use rentora_server::config::Config;
use rentora_server::db;
use rentora_server::middleware::request_tracing;
use rentora_server::product::ProductService;
use rentora_server::rental::RentalService;
use rentora_server::routes::app_router;
use rentora_server::scheduler::{run_scheduler, AutoRefundJob};
use rentora_server::shop::ShopService;
use rentora_server::state::AppState;
use rentora_server::wallet::WalletLedger;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    // Connect to the database and run migrations
    let db_pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = db::run_migrations(&db_pool).await {
        tracing::error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    // Wire up the services
    let auth_service = Arc::new(AuthService::new(
        db_pool.clone(),
        config.jwt_secret.clone(),
        config.jwt_ttl_seconds,
    ));
    let shop_service = Arc::new(ShopService::new(db_pool.clone()));
    let product_service = Arc::new(ProductService::new(db_pool.clone()));
    let rental_service = Arc::new(RentalService::new(
        db_pool.clone(),
        config.payment_window_hours,
    ));
    let wallet_ledger = Arc::new(WalletLedger::new(db_pool.clone()));
    let auto_refund_job = Arc::new(AutoRefundJob::new(db_pool.clone(), config.refund_grace_hours));

    let app_state = AppState::new(
        db_pool,
        auth_service,
        shop_service,
        product_service,
        rental_service,
        wallet_ledger,
        auto_refund_job.clone(),
    );

    // Spawn the auto-refund scheduler; it runs once immediately and then
    // on the configured interval.
    let scheduler_handle = tokio::spawn(run_scheduler(
        auto_refund_job,
        Duration::from_secs(config.scheduler_interval_seconds),
    ));

    // Build the app router
    let app = app_router(app_state)
        .layer(axum::middleware::from_fn(request_tracing))
        .layer(configure_cors());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Serve with graceful shutdown
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    scheduler_handle.abort();

    tracing::info!("Server shutdown complete");
}

fn configure_cors() -> CorsLayer {
    let allowed_origins_str = std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
