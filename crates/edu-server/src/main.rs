//! EduRecords RS Server
//!
//! HTTP server binary wiring the database pool, the object store and the
//! attachment lifecycle managers into the API router.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edu_api::extractors::AppState;
use edu_attachments::{AttachmentLifecycleManager, Bucket, LocalObjectStore, SlotPolicy};
use edu_core::config::AppConfig;
use edu_db::{CourseFileRepository, Database, DatabaseConfig, ReportFileRepository};

mod health;

use health::{HealthChecker, HealthConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.environment.as_str(),
        host = %config.server.host,
        port = config.server.port,
        "Starting EduRecords RS"
    );

    let db_config = DatabaseConfig::with_url(&config.database.url)
        .max_connections(config.database.max_connections);
    let db = Database::connect(&db_config).await?;
    info!("Connected to database");

    let state = build_state(&config, db.pool().clone());

    let health_checker = Arc::new(
        HealthChecker::new(HealthConfig::default())
            .with_pool(db.pool().clone())
            .with_storage_root(PathBuf::from(&config.storage.root)),
    );

    let app = build_router(state, health_checker);

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,edu_server=debug,edu_api=debug,edu_attachments=debug,tower_http=debug".into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Wire the pool and object store into the shared API state
fn build_state(config: &AppConfig, pool: sqlx::PgPool) -> AppState {
    let store = Arc::new(LocalObjectStore::new(
        &config.storage.root,
        &config.storage.public_base_url,
    ));

    let course_attachments = Arc::new(AttachmentLifecycleManager::new(
        Arc::new(CourseFileRepository::new(pool.clone())),
        store.clone(),
        Bucket::Courses,
        SlotPolicy::Multi,
    ));
    let report_attachments = Arc::new(AttachmentLifecycleManager::new(
        Arc::new(ReportFileRepository::new(pool.clone())),
        store,
        Bucket::Reports,
        SlotPolicy::Single,
    ));

    AppState {
        config: Arc::new(config.clone()),
        pool,
        course_attachments,
        report_attachments,
    }
}

/// Build the application router
fn build_router(state: AppState, health_checker: Arc<HealthChecker>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(health_checker);

    Router::new()
        .merge(health_routes)
        .merge(edu_api::router().with_state(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn health_app() -> Router {
        let checker = Arc::new(HealthChecker::new(HealthConfig::default()));

        Router::new()
            .route("/health", get(health::health))
            .route("/health/live", get(health::liveness))
            .route("/health/ready", get(health::readiness))
            .with_state(checker)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = health_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_liveness_endpoint() {
        let app = health_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_endpoint() {
        let app = health_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
