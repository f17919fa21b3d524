// api/auth.rs
use crate::api::middleware::AuthenticatedUser;
use crate::core::{CompanyService, UserService};
use crate::models::{
    ChangePasswordRequest, LoginRequest, RegisterUserRequest, SelectCompanyRequest,
    SuccessResponse,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};

/// Configure les routes d'authentification et de gestion des utilisateurs
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            // Connexion email/mot de passe
            .route("/login", web::post().to(login))
            // Profil et entreprises accessibles
            .route("/me", web::get().to(me))
            // Changer d'entreprise courante (nouveau jeton)
            .route("/select-company", web::post().to(select_company))
            .route("/change-password", web::post().to(change_password)),
    )
    .service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(register)),
    );
}

async fn login(
    users: web::Data<UserService>,
    credentials: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = users.login(credentials.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn me(user: AuthenticatedUser, users: web::Data<UserService>) -> Result<HttpResponse, AppError> {
    let response = users.me(user.id, user.company_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn select_company(
    user: AuthenticatedUser,
    users: web::Data<UserService>,
    body: web::Json<SelectCompanyRequest>,
) -> Result<HttpResponse, AppError> {
    let response = users.select_company(user.id, body.company_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn change_password(
    user: AuthenticatedUser,
    users: web::Data<UserService>,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    users.change_password(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::with_message((), "Password updated")))
}

/// Comptes: réservé aux superutilisateurs
async fn list_users(
    user: AuthenticatedUser,
    users: web::Data<UserService>,
    companies: web::Data<CompanyService>,
) -> Result<HttpResponse, AppError> {
    user.require_superuser(&companies).await?;
    let profiles = users.list_users().await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(profiles)))
}

async fn register(
    user: AuthenticatedUser,
    users: web::Data<UserService>,
    companies: web::Data<CompanyService>,
    body: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_superuser(&companies).await?;
    let created = users.register_user(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(created.profile())))
}
