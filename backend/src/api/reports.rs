// api/reports.rs
use crate::api::middleware::AuthenticatedUser;
use crate::core::{CompanyService, ReportService};
use crate::models::{AppModule, PermissionAction, ReportQuery, SuccessResponse};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reports")
            .route("/dashboard", web::get().to(dashboard))
            .route("/treatments", web::get().to(treatment_report))
            .route("/payments-by-kind", web::get().to(payments_by_kind)),
    );
}

async fn dashboard(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    reports: web::Data<ReportService>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Reports, PermissionAction::View).await?;
    let report = reports.dashboard(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(report)))
}

async fn treatment_report(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    reports: web::Data<ReportService>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Reports, PermissionAction::View).await?;
    let report = reports.treatment_report(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(report)))
}

async fn payments_by_kind(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    reports: web::Data<ReportService>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Reports, PermissionAction::View).await?;
    let report = reports.payments_by_kind(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(report)))
}
