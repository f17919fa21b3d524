// api/appointments.rs
use crate::api::middleware::AuthenticatedUser;
use crate::core::{AppointmentService, CompanyService};
use crate::models::{
    AppModule, AppointmentFilter, AppointmentRequest, AppointmentStatusRequest, PermissionAction,
    SuccessResponse,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/appointments")
            .route("", web::get().to(list_appointments))
            .route("", web::post().to(create_appointment))
            // Flux de l'agenda (FullCalendar)
            .route("/calendar", web::get().to(calendar_events))
            .route("/{id}", web::get().to(get_appointment))
            .route("/{id}", web::put().to(update_appointment))
            .route("/{id}", web::delete().to(delete_appointment))
            .route("/{id}/status", web::put().to(change_status)),
    );
}

async fn list_appointments(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    appointments: web::Data<AppointmentService>,
    query: web::Query<AppointmentFilter>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Appointments, PermissionAction::View).await?;
    let rows = appointments.list_appointments(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

/// Tableau brut attendu par le calendrier
async fn calendar_events(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    appointments: web::Data<AppointmentService>,
    query: web::Query<AppointmentFilter>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Appointments, PermissionAction::View).await?;
    let events = appointments.calendar_events(ctx.company_id, &query).await?;
    Ok(HttpResponse::Ok().json(events))
}

async fn create_appointment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    appointments: web::Data<AppointmentService>,
    body: web::Json<AppointmentRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Appointments, PermissionAction::Create).await?;
    let appointment = appointments
        .create_appointment(ctx.company_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(appointment)))
}

async fn get_appointment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    appointments: web::Data<AppointmentService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Appointments, PermissionAction::View).await?;
    let appointment = appointments
        .get_appointment(ctx.company_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(appointment)))
}

async fn update_appointment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    appointments: web::Data<AppointmentService>,
    path: web::Path<Uuid>,
    body: web::Json<AppointmentRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Appointments, PermissionAction::Edit).await?;
    let appointment = appointments
        .update_appointment(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(appointment)))
}

async fn change_status(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    appointments: web::Data<AppointmentService>,
    path: web::Path<Uuid>,
    body: web::Json<AppointmentStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Appointments, PermissionAction::Edit).await?;
    let appointment = appointments
        .change_status(ctx.company_id, path.into_inner(), body.status)
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(appointment)))
}

async fn delete_appointment(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    appointments: web::Data<AppointmentService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Appointments, PermissionAction::Delete).await?;
    appointments
        .delete_appointment(ctx.company_id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
