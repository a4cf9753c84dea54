use std::sync::Arc;

use actix_web::http::header::{CACHE_CONTROL, LOCATION};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::{trace, warn};

use crate::analytics::{TapLogger, TapRecord};
use crate::cache::{EdgeCache, RedirectEntry};
use crate::utils::ip::client_ip;

/// 重定向处理器共享的状态（每个 worker 一份 `web::Data`）
#[derive(Clone)]
pub struct EdgeContext {
    pub cache: Arc<dyn EdgeCache>,
    pub logger: TapLogger,
    /// 部署级兜底 URL（缓存未命中时使用）
    pub default_url: String,
    pub trusted_proxies: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TapQuery {
    #[serde(rename = "bandId")]
    pub band_id: Option<String>,
}

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_tap(
        req: HttpRequest,
        query: web::Query<TapQuery>,
        edge: web::Data<EdgeContext>,
    ) -> HttpResponse {
        let Some(band_id) = query
            .into_inner()
            .band_id
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
        else {
            return HttpResponse::BadRequest()
                .insert_header((CACHE_CONTROL, "no-store"))
                .body("Missing bandId");
        };

        match edge.cache.get(&band_id).await {
            Ok(Some(entry)) => {
                let response = Self::redirect_to(&entry.url);
                Self::log_tap(&req, &edge, band_id, entry);
                response
            }
            Ok(None) => {
                trace!("Band {} not in edge cache, using default URL", band_id);
                Self::redirect_to(&edge.default_url)
            }
            Err(e) => {
                warn!("Edge cache lookup failed for band {}: {}", band_id, e);
                Self::redirect_to(&edge.default_url)
            }
        }
    }

    #[inline]
    fn redirect_to(url: &str) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((LOCATION, url))
            .insert_header((CACHE_CONTROL, "no-store"))
            .finish()
    }

    /// 提取请求信息后交给后台任务，不等待
    fn log_tap(req: &HttpRequest, edge: &EdgeContext, band_id: String, entry: RedirectEntry) {
        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(String::from);

        edge.logger.log(TapRecord {
            band_id,
            event_id: entry.event_id,
            window_id: entry.window_id,
            mode: entry.mode,
            url: entry.url,
            tapped_at: chrono::Utc::now(),
            user_agent,
            ip: client_ip(req, &edge.trusted_proxies),
        });
    }
}

/// 重定向路由（默认 `/e`）
pub fn redirect_routes(path: &str) -> actix_web::Resource {
    web::resource(path)
        .route(web::get().to(RedirectService::handle_tap))
        .route(web::head().to(RedirectService::handle_tap))
}
