//! Tienda-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use tienda_api::{middleware::AppState, router as api_router};
use tienda_common::Config;
use tienda_core::{
    AddressService, CartService, CategoryService, EmailService, NoOpGateway, OrderService,
    PaymentService, PaypalGateway, ProductService, RatingService, SessionService, UserService,
};
use tienda_db::repositories::{
    AddressRepository, CartRepository, CategoryRepository, OrderRepository, ProductRepository,
    RatingRepository, SessionTokenRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Interval between expired-session sweeps.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tienda=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting tienda-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = tienda_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    tienda_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let session_repo = SessionTokenRepository::new(Arc::clone(&db));
    let address_repo = AddressRepository::new(Arc::clone(&db));
    let category_repo = CategoryRepository::new(Arc::clone(&db));
    let product_repo = ProductRepository::new(Arc::clone(&db));
    let rating_repo = RatingRepository::new(Arc::clone(&db));
    let cart_repo = CartRepository::new(Arc::clone(&db));
    let order_repo = OrderRepository::new(Arc::clone(&db));

    // Initialize services
    let session_service = SessionService::new(session_repo, user_repo.clone(), &config.auth);

    let email_service = EmailService::new(config.email.as_ref())?;
    if email_service.is_enabled() {
        info!("Email sending enabled");
    } else {
        info!("Email sending disabled (no SMTP configuration)");
    }

    let gateway: PaymentService = if config.paypal.client_id.is_empty() {
        info!("No PayPal credentials configured, using no-op payment gateway");
        Arc::new(NoOpGateway)
    } else {
        Arc::new(PaypalGateway::new(&config.paypal, &config.server.url)?)
    };

    let user_service = UserService::new(
        user_repo.clone(),
        session_service.clone(),
        email_service.clone(),
    );
    let address_service = AddressService::new(address_repo.clone());
    let category_service = CategoryService::new(category_repo.clone());
    let product_service = ProductService::new(
        product_repo.clone(),
        category_repo,
        rating_repo.clone(),
    );
    let rating_service = RatingService::new(rating_repo, product_repo.clone());
    let cart_service = CartService::new(cart_repo.clone(), product_repo.clone());
    let order_service = OrderService::new(
        order_repo,
        cart_repo,
        address_repo,
        product_repo,
        gateway,
        config.paypal.currency.clone(),
    );

    let state = AppState {
        session_service: session_service.clone(),
        user_service,
        address_service,
        category_service,
        product_service,
        rating_service,
        cart_service,
        order_service,
    };

    // Periodic expired-session sweep
    {
        let sessions = session_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(e) = sessions.purge_expired().await {
                    tracing::warn!(error = %e, "Session purge failed");
                }
            }
        });
    }

    // Build router
    let app = Router::new()
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tienda_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
