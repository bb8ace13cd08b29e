//! Health check system
//!
//! Reports on the two backends the attachment lifecycle depends on: the
//! PostgreSQL pool and the object storage root. Results are cached briefly
//! so readiness probes do not hammer the database.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::debug;

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Overall health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Health checker configuration
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Cache duration for health results
    pub cache_duration: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            cache_duration: Duration::from_secs(10),
        }
    }
}

struct CachedHealth {
    report: HealthReport,
    cached_at: Instant,
}

/// Health checker service
pub struct HealthChecker {
    config: HealthConfig,
    start_time: Instant,
    cache: RwLock<Option<CachedHealth>>,
    pool: Option<PgPool>,
    storage_root: Option<PathBuf>,
}

impl HealthChecker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            cache: RwLock::new(None),
            pool: None,
            storage_root: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_storage_root(mut self, root: PathBuf) -> Self {
        self.storage_root = Some(root);
        self
    }

    /// Get cached health or perform checks
    pub async fn check(&self) -> HealthReport {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if cached.cached_at.elapsed() < self.config.cache_duration {
                    debug!("Returning cached health report");
                    return cached.report.clone();
                }
            }
        }

        let report = self.perform_checks().await;

        {
            let mut cache = self.cache.write().await;
            *cache = Some(CachedHealth {
                report: report.clone(),
                cached_at: Instant::now(),
            });
        }

        report
    }

    async fn perform_checks(&self) -> HealthReport {
        let mut components = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        if self.pool.is_some() {
            let db_health = self.check_database().await;
            if db_health.status == HealthStatus::Unhealthy {
                overall_status = HealthStatus::Unhealthy;
            }
            components.push(db_health);
        }

        if self.storage_root.is_some() {
            let storage_health = self.check_storage().await;
            if storage_health.status != HealthStatus::Healthy
                && overall_status == HealthStatus::Healthy
            {
                overall_status = HealthStatus::Degraded;
            }
            components.push(storage_health);
        }

        HealthReport {
            status: overall_status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now(),
        }
    }

    async fn check_database(&self) -> ComponentHealth {
        let start = Instant::now();
        let pool = self.pool.as_ref().unwrap();

        let (status, message) = match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => (HealthStatus::Healthy, Some("Connected".to_string())),
            Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
        };

        ComponentHealth {
            name: "database".to_string(),
            status,
            message,
            response_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn check_storage(&self) -> ComponentHealth {
        let start = Instant::now();
        let root = self.storage_root.as_ref().unwrap().clone();

        let (status, message) = match tokio::fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => (HealthStatus::Healthy, None),
            Ok(_) => (
                HealthStatus::Degraded,
                Some(format!("{} is not a directory", root.display())),
            ),
            Err(e) => (HealthStatus::Degraded, Some(e.to_string())),
        };

        ComponentHealth {
            name: "storage".to_string(),
            status,
            message,
            response_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Simple liveness check
pub async fn liveness() -> &'static str {
    "OK"
}

/// Readiness check
pub async fn readiness(
    State(checker): State<Arc<HealthChecker>>,
) -> (StatusCode, Json<HealthReport>) {
    let report = checker.check().await;
    let status = report.http_status();
    (status, Json(report))
}

/// Full health check
pub async fn health(State(checker): State<Arc<HealthChecker>>) -> (StatusCode, Json<HealthReport>) {
    let report = checker.check().await;
    let status = report.http_status();
    (status, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_without_backends() {
        let checker = HealthChecker::new(HealthConfig::default());
        let report = checker.check().await;

        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.components.is_empty());
    }

    #[tokio::test]
    async fn test_health_cache() {
        let checker = HealthChecker::new(HealthConfig {
            cache_duration: Duration::from_secs(60),
        });

        let report1 = checker.check().await;
        let report2 = checker.check().await;

        assert_eq!(report1.timestamp, report2.timestamp);
    }

    #[tokio::test]
    async fn test_missing_storage_root_degrades() {
        let checker = HealthChecker::new(HealthConfig {
            cache_duration: Duration::from_secs(0),
        })
        .with_storage_root(PathBuf::from("/nonexistent/storage/root"));

        let report = checker.check().await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_health_status_http() {
        let unhealthy = HealthReport {
            status: HealthStatus::Unhealthy,
            version: "1.0".to_string(),
            uptime_seconds: 100,
            components: vec![],
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(unhealthy.http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
