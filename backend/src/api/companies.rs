// api/companies.rs
use crate::api::middleware::AuthenticatedUser;
use crate::api::ListQuery;
use crate::core::CompanyService;
use crate::models::{
    AddMembershipRequest, AppModule, CreateBranchRequest, CreateCompanyRequest,
    PermissionAction, SetPermissionRequest, SuccessResponse, UpdateBranchRequest,
    UpdateCompanyRequest, UpdateMembershipRequest,
};
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// Entreprises (superutilisateur) et administration de l'entreprise courante
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/companies")
            .route("", web::get().to(list_companies))
            .route("", web::post().to(create_company))
            .route("/{id}", web::get().to(get_company))
            .route("/{id}", web::put().to(update_company))
            .route("/{id}", web::delete().to(deactivate_company)),
    )
    .service(
        web::scope("/company")
            // Succursales
            .route("/branches", web::get().to(list_branches))
            .route("/branches", web::post().to(create_branch))
            .route("/branches/{id}", web::get().to(get_branch))
            .route("/branches/{id}", web::put().to(update_branch))
            // Rattachements et permissions
            .route("/memberships", web::get().to(list_memberships))
            .route("/memberships", web::post().to(add_membership))
            .route("/memberships/{id}", web::put().to(update_membership))
            .route("/memberships/{id}", web::delete().to(remove_membership))
            .route("/memberships/{id}/permissions", web::get().to(list_permissions))
            .route("/memberships/{id}/permissions", web::put().to(set_permission)),
    );
}

// === ENTREPRISES ===

async fn list_companies(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    user.require_superuser(&companies).await?;
    let rows = companies.list_companies(query.include_inactive).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(rows)))
}

async fn create_company(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    body: web::Json<CreateCompanyRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_superuser(&companies).await?;
    let company = companies.create_company(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(company)))
}

async fn get_company(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.require_superuser(&companies).await?;
    let company = companies.get_company(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(company)))
}

async fn update_company(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCompanyRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_superuser(&companies).await?;
    let company = companies.update_company(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(company)))
}

async fn deactivate_company(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.require_superuser(&companies).await?;
    companies.deactivate_company(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// === SUCCURSALES ===

async fn list_branches(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::View).await?;
    let branches = companies.list_branches(ctx.company_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(branches)))
}

async fn get_branch(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::View).await?;
    let branch = companies.get_branch(ctx.company_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(branch)))
}

async fn create_branch(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    body: web::Json<CreateBranchRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::Create).await?;
    let branch = companies.create_branch(ctx.company_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(branch)))
}

async fn update_branch(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateBranchRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::Edit).await?;
    let branch = companies
        .update_branch(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(branch)))
}

// === RATTACHEMENTS ===

async fn list_memberships(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::View).await?;
    let memberships = companies.list_memberships(ctx.company_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(memberships)))
}

async fn add_membership(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    body: web::Json<AddMembershipRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::Create).await?;
    let membership = companies.add_membership(ctx.company_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(membership)))
}

async fn update_membership(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateMembershipRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::Edit).await?;
    let membership = companies
        .update_membership(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(membership)))
}

async fn remove_membership(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::Delete).await?;
    let id = path.into_inner();
    // Retirer son propre accès couperait la session en cours
    if ctx.membership_id == Some(id) {
        return Err(AppError::Validation("Cannot remove your own membership".to_string()));
    }
    companies.remove_membership(ctx.company_id, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn list_permissions(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::View).await?;
    let permissions = companies.list_permissions(ctx.company_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(permissions)))
}

async fn set_permission(
    user: AuthenticatedUser,
    companies: web::Data<CompanyService>,
    path: web::Path<Uuid>,
    body: web::Json<SetPermissionRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = user.tenant(&companies, AppModule::Companies, PermissionAction::Edit).await?;
    let permission = companies
        .set_permission(ctx.company_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(permission)))
}
