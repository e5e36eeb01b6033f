//! Toolyard server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use tokio::signal;
use toolyard_api::{middleware::AppState, router as api_router};
use toolyard_common::Config;
use toolyard_core::{
    CleanupService, LifecycleService, MailerService, NoopMailer, NotificationService,
    ReportService, SmtpMailer, ToolService, UserService,
};
use toolyard_db::repositories::{
    ActivityLogRepository, StatusChangeRepository, ToolRepository, UserRepository,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

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
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolyard=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting toolyard server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = toolyard_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    toolyard_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let tool_repo = ToolRepository::new(Arc::clone(&db));
    let status_repo = StatusChangeRepository::new(Arc::clone(&db));
    let activity_repo = ActivityLogRepository::new(Arc::clone(&db));

    // Outbound mail
    let mailer: MailerService = if config.smtp.enabled {
        Arc::new(SmtpMailer::new(&config.smtp)?)
    } else {
        info!("SMTP disabled, notification emails will be skipped");
        Arc::new(NoopMailer)
    };
    let notifications = NotificationService::new(mailer, &config.smtp);

    // Initialize services
    let user_service = UserService::new(user_repo.clone());
    let tool_service = ToolService::new(
        tool_repo.clone(),
        status_repo.clone(),
        activity_repo.clone(),
    );
    let report_service = ReportService::new(tool_repo, status_repo, activity_repo.clone());
    let lifecycle_service = LifecycleService::new(
        user_repo.clone(),
        activity_repo.clone(),
        notifications.clone(),
    );
    let cleanup_service = CleanupService::new(user_repo, activity_repo, notifications);

    // Start the daily deletion scan
    cleanup_service.start().await;

    // Create app state
    let state = AppState {
        user_service,
        tool_service,
        report_service,
        lifecycle_service,
        cleanup_service: cleanup_service.clone(),
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            toolyard_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the scan timer before exiting
    cleanup_service.stop().await;

    info!("Server shutdown complete");
    Ok(())
}
