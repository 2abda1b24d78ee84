//! Liveness endpoints under `/api`

use actix_web::{HttpResponse, web};
use serde::Serialize;

use super::with_db;
use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionReport {
    version: &'static str,
}

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .route("/version", web::get().to(get_version)),
    );
}

/// Reports `ok` while the card store answers queries, `unavailable` (503) otherwise
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    match with_db(&state, |db| db.count_cards()).await {
        Ok(_) => HttpResponse::Ok().json(HealthReport {
            status: "ok",
            version: VERSION,
        }),
        Err(e) => {
            log::error!("Health check failed, card store unreachable: {}", e);
            HttpResponse::ServiceUnavailable().json(HealthReport {
                status: "unavailable",
                version: VERSION,
            })
        }
    }
}

async fn get_version() -> HttpResponse {
    HttpResponse::Ok().json(VersionReport { version: VERSION })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_app;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_web::test]
    async fn test_health_and_version() {
        let app = test::init_service(build_app(AppState::for_tests())).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!({ "status": "ok", "version": VERSION }));

        let req = test::TestRequest::get().uri("/api/version").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!({ "version": VERSION }));
    }

    #[actix_web::test]
    async fn test_health_reports_unreachable_store() {
        let state = AppState::for_tests();
        {
            let conn = state.db.conn().unwrap();
            conn.execute_batch("DROP TABLE card_tags; DROP TABLE cards;").unwrap();
        }
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "unavailable");
    }
}
