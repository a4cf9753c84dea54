//! Health probe tests

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use tempfile::TempDir;

use taplinker::api::services::health_routes;
use taplinker::cache::{EdgeCache, NullEdgeCache};
use taplinker::config::DatabaseConfig;
use taplinker::storage::SeaOrmStorage;

#[actix_rt::test]
async fn test_liveness_and_readiness() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = DatabaseConfig {
        database_url: format!(
            "sqlite://{}?mode=rwc",
            temp_dir.path().join("health.db").display()
        ),
        ..Default::default()
    };
    let storage = Arc::new(SeaOrmStorage::new(&config).await.unwrap());
    let cache: Arc<dyn EdgeCache> = Arc::new(NullEdgeCache);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(storage))
            .app_data(web::Data::new(cache))
            .service(health_routes()),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");

    let resp =
        test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "sqlite");
    assert_eq!(body["events"], 0);
    assert_eq!(body["edgeCache"], "unconfigured");
}
