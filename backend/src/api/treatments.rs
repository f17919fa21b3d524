// api/treatments.rs
use crate::api::middleware::AuthenticatedUser;
use crate::core::{CompanyService, PaymentService, TreatmentService};
use crate::models::{
    AppModule, CreateTreatmentRequest, PermissionAction, SuccessResponse, TreatmentFilter,
    TreatmentItemRequest, TreatmentStatusRequest, UpdateTreatmentRequest,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/treatments")
            .route("", web::get().to(list_treatments))
            .route("", web::post().to(create_treatment))
            .route("/{id}", web::get().to(get_treatment))
            .route("/{id}", web::put().to(update_treatment))
            .route("/{id}/status", web::put().to(change_status))
            .route("/{id}/items", web::post().to(add_item))
            .route("/{id}/items/{item_id}", web::delete().to(remove_item))
            // Situation financière
            .route("/{id}/payments", web::get().to(payment_summary)),
    );
}

async fn list_treatments(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    treatments: web::Data<TreatmentService>,
    query: web::Query<TreatmentFilter>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Treatments, PermissionAction::View).await?;
    let rows = treatments.list_treatments(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn create_treatment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    treatments: web::Data<TreatmentService>,
    body: web::Json<CreateTreatmentRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Treatments, PermissionAction::Create).await?;
    let treatment = treatments
        .create_treatment(ctx.company_id, ctx.user_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(treatment)))
}

async fn get_treatment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    treatments: web::Data<TreatmentService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Treatments, PermissionAction::View).await?;
    let treatment = treatments.get_treatment(ctx.company_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(treatment)))
}

async fn update_treatment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    treatments: web::Data<TreatmentService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTreatmentRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Treatments, PermissionAction::Edit).await?;
    let treatment = treatments
        .update_treatment(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(treatment)))
}

async fn change_status(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    treatments: web::Data<TreatmentService>,
    path: web::Path<Uuid>,
    body: web::Json<TreatmentStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Treatments, PermissionAction::Edit).await?;
    let treatment = treatments
        .change_status(ctx.company_id, path.into_inner(), body.status)
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(treatment)))
}

async fn add_item(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    treatments: web::Data<TreatmentService>,
    path: web::Path<Uuid>,
    body: web::Json<TreatmentItemRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Treatments, PermissionAction::Edit).await?;
    let treatment = treatments
        .add_item(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(treatment)))
}

async fn remove_item(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    treatments: web::Data<TreatmentService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Treatments, PermissionAction::Edit).await?;
    let (treatment_id, item_id) = path.into_inner();
    let treatment = treatments
        .remove_item(ctx.company_id, treatment_id, item_id)
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(treatment)))
}

async fn payment_summary(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    payments: web::Data<PaymentService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Payments, PermissionAction::View).await?;
    let summary = payments
        .treatment_summary(ctx.company_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(summary)))
}
