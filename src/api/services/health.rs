use std::sync::Arc;
use std::time::Duration;

use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use tracing::{error, trace};

use crate::cache::EdgeCache;
use crate::storage::SeaOrmStorage;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    status: &'static str,
    storage: String,
    events: Option<u64>,
    edge_cache: &'static str,
    error: Option<String>,
}

pub struct HealthService;

impl HealthService {
    /// 存活探针
    pub async fn health() -> impl Responder {
        HttpResponse::Ok().json(json!({ "status": "ok" }))
    }

    /// 就绪探针：数据库可查询
    pub async fn readiness(
        storage: web::Data<Arc<SeaOrmStorage>>,
        cache: web::Data<Arc<dyn EdgeCache>>,
    ) -> impl Responder {
        trace!("Received readiness check request");
        let backend = storage.get_backend_config().storage_type;
        let edge_cache = if cache.is_configured() {
            cache.name()
        } else {
            "unconfigured"
        };

        let (status, events, error) =
            match tokio::time::timeout(Duration::from_secs(5), storage.count_events()).await {
                Ok(Ok(count)) => ("ok", Some(count), None),
                Ok(Err(e)) => {
                    error!("Readiness check failed: {}", e);
                    ("unavailable", None, Some(e.to_string()))
                }
                Err(_) => {
                    error!("Readiness check timed out");
                    ("unavailable", None, Some("timeout".to_string()))
                }
            };

        let body = ReadinessResponse {
            status,
            storage: backend,
            events,
            edge_cache,
            error,
        };
        if status == "ok" {
            HttpResponse::Ok().json(body)
        } else {
            HttpResponse::ServiceUnavailable().json(body)
        }
    }
}

/// 健康检查路由
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health))
        .route("", web::head().to(HealthService::health))
        .route("/ready", web::get().to(HealthService::readiness))
}
