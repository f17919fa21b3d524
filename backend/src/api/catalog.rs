// api/catalog.rs
use crate::api::middleware::AuthenticatedUser;
use crate::api::ListQuery;
use crate::core::{CatalogService, CompanyService};
use crate::models::{
    AppModule, InsurerRequest, PaymentMethodRequest, PermissionAction, ProcedureRequest,
    SpecialtyRequest, SuccessResponse,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
struct ProcedureQuery {
    #[serde(default)]
    include_inactive: bool,
    specialty_id: Option<Uuid>,
}

/// Référentiels: spécialités, actes, moyens de paiement, prévisions
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/catalog")
            .route("/specialties", web::get().to(list_specialties))
            .route("/specialties", web::post().to(create_specialty))
            .route("/specialties/{id}", web::get().to(get_specialty))
            .route("/specialties/{id}", web::put().to(update_specialty))
            .route("/specialties/{id}", web::delete().to(delete_specialty))
            .route("/procedures", web::get().to(list_procedures))
            .route("/procedures", web::post().to(create_procedure))
            .route("/procedures/{id}", web::get().to(get_procedure))
            .route("/procedures/{id}", web::put().to(update_procedure))
            .route("/procedures/{id}", web::delete().to(deactivate_procedure))
            .route("/payment-methods", web::get().to(list_payment_methods))
            .route("/payment-methods", web::post().to(create_payment_method))
            .route("/payment-methods/{id}", web::put().to(update_payment_method))
            .route("/insurers", web::get().to(list_insurers))
            .route("/insurers", web::post().to(create_insurer))
            .route("/insurers/{id}", web::put().to(update_insurer)),
    );
}

// === SPÉCIALITÉS ===

async fn list_specialties(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::View).await?;
    let rows = catalog.list_specialties(query.include_inactive).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn get_specialty(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::View).await?;
    let specialty = catalog.get_specialty(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(specialty)))
}

async fn create_specialty(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    body: web::Json<SpecialtyRequest>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Create).await?;
    let specialty = catalog.create_specialty(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(specialty)))
}

async fn update_specialty(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
    body: web::Json<SpecialtyRequest>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Edit).await?;
    let specialty = catalog.update_specialty(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(specialty)))
}

async fn delete_specialty(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Delete).await?;
    catalog.delete_specialty(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// === ACTES ===

async fn list_procedures(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    query: web::Query<ProcedureQuery>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::View).await?;
    let rows = catalog
        .list_procedures(query.include_inactive, query.specialty_id)
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn get_procedure(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::View).await?;
    let procedure = catalog.get_procedure(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(procedure)))
}

async fn create_procedure(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    body: web::Json<ProcedureRequest>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Create).await?;
    let procedure = catalog.create_procedure(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(procedure)))
}

async fn update_procedure(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
    body: web::Json<ProcedureRequest>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Edit).await?;
    let procedure = catalog.update_procedure(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(procedure)))
}

async fn deactivate_procedure(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Delete).await?;
    catalog.deactivate_procedure(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// === MOYENS DE PAIEMENT ===

async fn list_payment_methods(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::View).await?;
    let rows = catalog.list_payment_methods(query.include_inactive).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn create_payment_method(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    body: web::Json<PaymentMethodRequest>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Create).await?;
    let method = catalog.create_payment_method(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(method)))
}

async fn update_payment_method(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
    body: web::Json<PaymentMethodRequest>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Edit).await?;
    let method = catalog
        .update_payment_method(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(method)))
}

// === PRÉVISIONS ===

async fn list_insurers(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::View).await?;
    let rows = catalog.list_insurers(query.include_inactive).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn create_insurer(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    body: web::Json<InsurerRequest>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Create).await?;
    let insurer = catalog.create_insurer(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(insurer)))
}

async fn update_insurer(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
    body: web::Json<InsurerRequest>,
) -> Result<HttpResponse, AppError> {
    user.tenant(&companies, AppModule::Catalog, PermissionAction::Edit).await?;
    let insurer = catalog.update_insurer(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(insurer)))
}
