// api/payments.rs
use crate::api::middleware::AuthenticatedUser;
use crate::api::xlsx_attachment;
use crate::core::{CompanyService, PaymentService};
use crate::models::{
    AppModule, CreatePaymentRequest, PaymentFilter, PermissionAction, SuccessResponse,
    UpdatePaymentRequest, VoidPaymentRequest,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("", web::get().to(list_payments))
            .route("", web::post().to(create_payment))
            .route("/export", web::get().to(export_payments))
            .route("/{id}", web::get().to(get_payment))
            .route("/{id}", web::put().to(update_payment))
            .route("/{id}/void", web::post().to(void_payment)),
    );
}

async fn list_payments(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    payments: web::Data<PaymentService>,
    query: web::Query<PaymentFilter>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Payments, PermissionAction::View).await?;
    let rows = payments.list_payments(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn create_payment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    payments: web::Data<PaymentService>,
    body: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Payments, PermissionAction::Create).await?;
    let payment = payments
        .create_payment(ctx.company_id, ctx.user_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(payment)))
}

async fn get_payment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    payments: web::Data<PaymentService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Payments, PermissionAction::View).await?;
    let payment = payments.get_payment(ctx.company_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(payment)))
}

async fn update_payment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    payments: web::Data<PaymentService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Payments, PermissionAction::Edit).await?;
    let payment = payments
        .update_payment(ctx.company_id, ctx.user_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(payment)))
}

async fn void_payment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    payments: web::Data<PaymentService>,
    path: web::Path<Uuid>,
    body: web::Json<VoidPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Payments, PermissionAction::Delete).await?;
    let payment = payments
        .void_payment(ctx.company_id, ctx.user_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(payment)))
}

async fn export_payments(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    payments: web::Data<PaymentService>,
    query: web::Query<PaymentFilter>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Payments, PermissionAction::Export).await?;
    let bytes = payments.export_payments(ctx.company_id, &query).await?;
    let filename = format!("pagos_{}.xlsx", Utc::now().format("%Y%m%d_%H%M%S"));
    Ok(xlsx_attachment(bytes, &filename))
}
