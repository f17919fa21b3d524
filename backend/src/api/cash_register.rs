// api/cash_register.rs
use crate::api::middleware::AuthenticatedUser;
use crate::core::{CashRegisterService, CompanyService};
use crate::models::{
    AppModule, CashClosingFilter, CloseCashRegisterRequest, OpenCashRegisterRequest,
    PermissionAction, SuccessResponse,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cash-register")
            .route("", web::get().to(list_registers))
            .route("/open", web::post().to(open_register))
            .route("/{id}", web::get().to(get_register))
            .route("/{id}/close", web::post().to(close_register)),
    );
}

async fn list_registers(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    registers: web::Data<CashRegisterService>,
    query: web::Query<CashClosingFilter>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::CashRegister, PermissionAction::View).await?;
    let list = registers.list_registers(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(list)))
}

async fn open_register(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    registers: web::Data<CashRegisterService>,
    body: web::Json<OpenCashRegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::CashRegister, PermissionAction::Create).await?;
    let register = registers
        .open_register(ctx.company_id, ctx.user_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(register)))
}

async fn get_register(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    registers: web::Data<CashRegisterService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::CashRegister, PermissionAction::View).await?;
    let register = registers.get_register(ctx.company_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(register)))
}

async fn close_register(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    registers: web::Data<CashRegisterService>,
    path: web::Path<Uuid>,
    body: web::Json<CloseCashRegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::CashRegister, PermissionAction::Edit).await?;
    let register = registers
        .close_register(ctx.company_id, ctx.user_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::with_message(register, "Cash register closed")))
}
