// api/middleware.rs
//! Authentification des requêtes: jeton Bearer JWT portant l'entreprise courante.
//!
//! `AuthenticatedUser` s'utilise comme extracteur dans les handlers. Les routes
//! d'entreprise appellent ensuite `tenant()` pour obtenir un `TenantContext`
//! vérifié (entreprise active, appartenance en vigueur, droits du module).

use crate::core::CompanyService;
use crate::models::{AppModule, PermissionAction, TenantContext, UserRole};
use crate::utils::config::Config;
use crate::utils::error::AppError;
use crate::utils::security::verify_access_token;
use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

/// Utilisateur extrait du jeton d'accès
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub company_id: Option<Uuid>,
    pub role: Option<UserRole>,
    pub is_superuser: bool,
}

impl AuthenticatedUser {
    /// Contexte d'entreprise autorisé pour `module` / `action`
    pub async fn tenant(
        &self,
        companies: &CompanyService,
        module: AppModule,
        action: PermissionAction,
    ) -> Result<TenantContext, AppError> {
        companies
            .authorize(self.id, self.company_id, module, action)
            .await
    }

    /// Le statut du jeton est revérifié contre le compte enregistré
    pub async fn require_superuser(&self, companies: &CompanyService) -> Result<(), AppError> {
        if !self.is_superuser {
            return Err(AppError::Forbidden("Superuser privileges required".to_string()));
        }
        companies.require_superuser(self.id).await
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".to_string()))
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let config = req.app_data::<web::Data<Config>>().ok_or_else(|| {
        tracing::error!("Configuration absente des données de l'application");
        AppError::Internal
    })?;

    let token = bearer_token(req)?;
    let claims = verify_access_token(token, &config.jwt_secret)?.claims;

    Ok(AuthenticatedUser {
        id: claims.sub,
        email: claims.email,
        company_id: claims.company_id,
        role: claims.role,
        is_superuser: claims.is_superuser,
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::security::{generate_access_token, TokenSubject};
    use actix_web::{http::StatusCode, test, App, HttpResponse};

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({
            "id": user.id,
            "email": user.email,
            "company_id": user.company_id,
        }))
    }

    fn token_for(config: &Config, company_id: Option<Uuid>) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = generate_access_token(
            &TokenSubject {
                user_id,
                email: "recepcion@clinica.cl",
                company_id,
                role: company_id.map(|_| UserRole::Reception),
                is_superuser: false,
            },
            &config.jwt_secret,
            config.jwt_access_token_expiry_hours,
        )
        .unwrap();
        (user_id, token)
    }

    #[actix_web::test]
    async fn test_valid_token_is_extracted() {
        let config = Config::for_tests();
        let company_id = Uuid::new_v4();
        let (user_id, token) = token_for(&config, Some(company_id));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["id"], serde_json::json!(user_id));
        assert_eq!(body["email"], "recepcion@clinica.cl");
        assert_eq!(body["company_id"], serde_json::json!(company_id));
    }

    #[actix_web::test]
    async fn test_missing_header_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let mut other = Config::for_tests();
        other.jwt_secret = "another-secret-another-secret-another".to_string();
        let (_, token) = token_for(&other, None);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_non_bearer_scheme_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}
