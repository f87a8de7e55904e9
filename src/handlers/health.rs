use actix_web::{web, HttpResponse, Result};

use crate::config::AppConfig;
use crate::models::HealthResponse;
use crate::services::futures::get_beijing_time;

pub async fn health_check(config: web::Data<AppConfig>) -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: config.server.service_name.clone(),
        timestamp: get_beijing_time(),
    };
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppConfig::default()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "AKShare Futures API");
        assert!(body["timestamp"].as_str().unwrap().contains("+08:00"));
    }
}
