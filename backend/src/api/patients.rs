// api/patients.rs
use crate::api::middleware::AuthenticatedUser;
use crate::api::xlsx_attachment;
use crate::core::{CompanyService, PatientService};
use crate::models::{
    AppModule, ClinicalRecordRequest, PatientFilter, PatientRequest, PermissionAction,
    SuccessResponse,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/patients")
            .route("", web::get().to(list_patients))
            .route("", web::post().to(create_patient))
            // Avant "/{id}" pour ne pas être capturé comme identifiant
            .route("/export", web::get().to(export_patients))
            .route("/{id}", web::get().to(get_patient))
            .route("/{id}", web::put().to(update_patient))
            .route("/{id}", web::delete().to(deactivate_patient))
            // Dossier clinique
            .route("/{id}/records", web::get().to(list_clinical_records))
            .route("/{id}/records", web::post().to(add_clinical_record)),
    );
}

async fn list_patients(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    patients: web::Data<PatientService>,
    query: web::Query<PatientFilter>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Patients, PermissionAction::View).await?;
    let rows = patients.list_patients(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn create_patient(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    patients: web::Data<PatientService>,
    body: web::Json<PatientRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Patients, PermissionAction::Create).await?;
    let patient = patients.create_patient(ctx.company_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(patient)))
}

async fn get_patient(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    patients: web::Data<PatientService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Patients, PermissionAction::View).await?;
    let patient = patients.get_patient(ctx.company_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(patient)))
}

async fn update_patient(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    patients: web::Data<PatientService>,
    path: web::Path<Uuid>,
    body: web::Json<PatientRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Patients, PermissionAction::Edit).await?;
    let patient = patients
        .update_patient(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(patient)))
}

async fn deactivate_patient(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    patients: web::Data<PatientService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Patients, PermissionAction::Delete).await?;
    patients.deactivate_patient(ctx.company_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn export_patients(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    patients: web::Data<PatientService>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Patients, PermissionAction::Export).await?;
    let bytes = patients.export_patients(ctx.company_id).await?;
    let filename = format!("pacientes_{}.xlsx", Utc::now().format("%Y%m%d"));
    Ok(xlsx_attachment(bytes, &filename))
}

async fn list_clinical_records(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    patients: web::Data<PatientService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Patients, PermissionAction::View).await?;
    let records = patients
        .list_clinical_records(ctx.company_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(records)))
}

async fn add_clinical_record(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    patients: web::Data<PatientService>,
    path: web::Path<Uuid>,
    body: web::Json<ClinicalRecordRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Patients, PermissionAction::Edit).await?;
    let record = patients
        .add_clinical_record(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(record)))
}
