// api/lab.rs
use crate::api::middleware::AuthenticatedUser;
use crate::api::ListQuery;
use crate::core::{CompanyService, LabService};
use crate::models::{
    AppModule, CreateLabJobRequest, LabJobFilter, LabJobStatusRequest, LaboratoryRequest,
    PermissionAction, SuccessResponse, UpdateLabJobRequest,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lab")
            // Laboratoires
            .route("/laboratories", web::get().to(list_laboratories))
            .route("/laboratories", web::post().to(create_laboratory))
            .route("/laboratories/{id}", web::get().to(get_laboratory))
            .route("/laboratories/{id}", web::put().to(update_laboratory))
            .route("/laboratories/{id}", web::delete().to(deactivate_laboratory))
            // Travaux
            .route("/jobs", web::get().to(list_jobs))
            .route("/jobs", web::post().to(create_job))
            .route("/jobs/overdue", web::get().to(overdue_jobs))
            .route("/jobs/{id}", web::get().to(get_job))
            .route("/jobs/{id}", web::put().to(update_job))
            .route("/jobs/{id}/status", web::post().to(change_status)),
    );
}

// === LABORATOIRES ===

async fn list_laboratories(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Lab, PermissionAction::View).await?;
    let rows = lab.list_laboratories(query.include_inactive).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn get_laboratory(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Lab, PermissionAction::View).await?;
    let laboratory = lab.get_laboratory(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(laboratory)))
}

async fn create_laboratory(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    body: web::Json<LaboratoryRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Lab, PermissionAction::Create).await?;
    let laboratory = lab.create_laboratory(ctx.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(laboratory)))
}

async fn update_laboratory(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    path: web::Path<Uuid>,
    body: web::Json<LaboratoryRequest>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Lab, PermissionAction::Edit).await?;
    let laboratory = lab.update_laboratory(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(laboratory)))
}

async fn deactivate_laboratory(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Lab, PermissionAction::Delete).await?;
    let laboratory = lab.deactivate_laboratory(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(laboratory)))
}

// === TRAVAUX ===

async fn list_jobs(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    query: web::Query<LabJobFilter>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Lab, PermissionAction::View).await?;
    let rows = lab.list_jobs(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn overdue_jobs(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Lab, PermissionAction::View).await?;
    let rows = lab.overdue_jobs(ctx.company_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn create_job(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    body: web::Json<CreateLabJobRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Lab, PermissionAction::Create).await?;
    let job = lab
        .create_job(ctx.company_id, ctx.user_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(job)))
}

async fn get_job(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Lab, PermissionAction::View).await?;
    let job = lab.get_job(ctx.company_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(job)))
}

async fn update_job(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateLabJobRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Lab, PermissionAction::Edit).await?;
    let job = lab
        .update_job(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(job)))
}

async fn change_status(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    lab: web::Data<LabService>,
    path: web::Path<Uuid>,
    body: web::Json<LabJobStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Lab, PermissionAction::Edit).await?;
    let job = lab
        .change_status(ctx.company_id, ctx.user_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(job)))
}
