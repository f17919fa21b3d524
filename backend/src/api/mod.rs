// api/mod.rs
pub mod appointments;
pub mod auth;
pub mod cash_register;
pub mod catalog;
pub mod companies;
pub mod lab;
pub mod middleware;
pub mod patients;
pub mod payments;
pub mod professionals;
pub mod reports;
pub mod treatments;

use crate::services::XLSX_CONTENT_TYPE;
use actix_web::{http::header, web, HttpResponse, Responder};
use serde::Deserialize;

/// Paramètre commun des listes de référentiel
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Configure toutes les routes de l'API
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(auth::configure_routes)
            .configure(companies::configure_routes)
            .configure(catalog::configure_routes)
            .configure(patients::configure_routes)
            .configure(professionals::configure_routes)
            .configure(appointments::configure_routes)
            .configure(treatments::configure_routes)
            .configure(payments::configure_routes)
            .configure(cash_register::configure_routes)
            .configure(lab::configure_routes)
            .configure(reports::configure_routes),
    );

    // Endpoint de santé
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
}

/// Réponse de téléchargement d'un classeur Excel
pub fn xlsx_attachment(bytes: Vec<u8>, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(bytes)
}

/// Endpoint de santé pour monitoring
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": crate::NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, test, App};

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().configure(config)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["status"], "healthy");
        assert_eq!(resp["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn test_protected_route_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(crate::utils::Config::for_tests()))
                .configure(config),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/v1/patients").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_xlsx_attachment_headers() {
        let resp = xlsx_attachment(vec![1, 2, 3], "pagos.xlsx");

        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            XLSX_CONTENT_TYPE
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"pagos.xlsx\""
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body.len(), 3);
    }
}
