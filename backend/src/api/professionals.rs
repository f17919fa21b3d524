// api/professionals.rs
use crate::api::middleware::AuthenticatedUser;
use crate::core::{CompanyService, ProfessionalService};
use crate::models::{
    AppModule, PermissionAction, ProfessionalFilter, ProfessionalRequest, SuccessResponse,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/professionals")
            .route("", web::get().to(list_professionals))
            .route("", web::post().to(create_professional))
            .route("/{id}", web::get().to(get_professional))
            .route("/{id}", web::put().to(update_professional))
            .route("/{id}", web::delete().to(deactivate_professional)),
    );
}

async fn list_professionals(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    professionals: web::Data<ProfessionalService>,
    query: web::Query<ProfessionalFilter>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Professionals, PermissionAction::View).await?;
    let rows = professionals.list_professionals(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn create_professional(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    professionals: web::Data<ProfessionalService>,
    body: web::Json<ProfessionalRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Professionals, PermissionAction::Create).await?;
    let professional = professionals
        .create_professional(ctx.company_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(professional)))
}

async fn get_professional(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    professionals: web::Data<ProfessionalService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Professionals, PermissionAction::View).await?;
    let professional = professionals
        .get_professional(ctx.company_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(professional)))
}

async fn update_professional(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    professionals: web::Data<ProfessionalService>,
    path: web::Path<Uuid>,
    body: web::Json<ProfessionalRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Professionals, PermissionAction::Edit).await?;
    let professional = professionals
        .update_professional(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(professional)))
}

async fn deactivate_professional(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    professionals: web::Data<ProfessionalService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Professionals, PermissionAction::Delete).await?;
    professionals
        .deactivate_professional(ctx.company_id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
