// core/company_service.rs
use crate::models::{
    can, AddMembershipRequest, AppModule, Branch, Company, CompanyAccess, CreateBranchRequest,
    CreateCompanyRequest, Membership, ModulePermission, PermissionAction, SetPermissionRequest,
    TenantContext, UpdateBranchRequest, UpdateCompanyRequest, UpdateMembershipRequest, User,
    UserRole,
};
use crate::models::company::pick_company;
use crate::services::database::Database;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::normalize_rut;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub struct CompanyService {
    db: Arc<Database>,
}

impl CompanyService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // === AUTORISATION ===

    /// Vérifie l'accès à l'entreprise du jeton et le droit demandé sur le module
    pub async fn authorize(
        &self,
        user_id: Uuid,
        company_id: Option<Uuid>,
        module: AppModule,
        action: PermissionAction,
    ) -> Result<TenantContext> {
        let company_id = company_id.ok_or(AppError::NoCompanySelected)?;
        let is_superuser = self.account_is_superuser(user_id).await?;
        let company = self.db.get_company(company_id).await?;

        if is_superuser {
            return Ok(TenantContext {
                user_id,
                company_id,
                role: UserRole::SuperAdmin,
                membership_id: None,
            });
        }

        if !company.is_active {
            return Err(AppError::Forbidden("Company is inactive".to_string()));
        }

        let today = Utc::now().date_naive();
        let membership = self
            .db
            .find_membership(user_id, company_id)
            .await?
            .filter(|m| m.is_effective(today))
            .ok_or_else(|| AppError::Forbidden("No access to this company".to_string()))?;

        let overrides = self.db.list_permissions(membership.id).await?;
        if !can(membership.role, &overrides, module, action) {
            warn!(
                "Accès refusé: user={} company={} module={:?} action={:?}",
                user_id, company_id, module, action
            );
            return Err(AppError::Forbidden(format!(
                "Missing {:?} permission on {:?}",
                action, module
            )));
        }

        Ok(TenantContext {
            user_id,
            company_id,
            role: membership.role,
            membership_id: Some(membership.id),
        })
    }

    pub async fn require_superuser(&self, user_id: Uuid) -> Result<()> {
        superuser_only(self.account_is_superuser(user_id).await?)
    }

    /// Recharge le compte: le jeton ne vaut que tant que le compte reste actif
    async fn account_is_superuser(&self, user_id: Uuid) -> Result<bool> {
        match self.db.get_user_by_id(user_id).await {
            Ok(user) => account_rights(&user),
            Err(AppError::NotFound(_)) => Err(AppError::Unauthorized("Account not found".to_string())),
            Err(e) => Err(e),
        }
    }

    /// Entreprises accessibles; un superutilisateur voit toutes les entreprises actives
    pub async fn accessible_companies(&self, user: &User) -> Result<Vec<CompanyAccess>> {
        if !user.is_superuser {
            return self.db.list_company_access(user.id).await;
        }

        let companies = self.db.list_companies(false).await?;
        Ok(companies
            .into_iter()
            .map(|c| CompanyAccess {
                membership_id: None,
                company_id: c.id,
                legal_name: c.legal_name,
                trade_name: c.trade_name,
                role: UserRole::SuperAdmin,
                branch_id: None,
            })
            .collect())
    }

    /// Entreprise de la session: celle demandée si accessible, sinon la première
    pub async fn resolve_current_company(
        &self,
        user: &User,
        requested: Option<Uuid>,
    ) -> Result<(CompanyAccess, Vec<CompanyAccess>)> {
        let accessible = self.accessible_companies(user).await?;
        let current = pick_company(&accessible, requested).ok_or(AppError::NoCompanySelected)?;
        Ok((current, accessible))
    }

    // === ENTREPRISES ===

    pub async fn list_companies(&self, include_inactive: bool) -> Result<Vec<Company>> {
        self.db.list_companies(include_inactive).await
    }

    pub async fn get_company(&self, id: Uuid) -> Result<Company> {
        self.db.get_company(id).await
    }

    pub async fn create_company(&self, mut req: CreateCompanyRequest) -> Result<Company> {
        req.validate()?;
        req.rut = normalize_rut(&req.rut)?;

        if self.db.find_company_by_rut(&req.rut).await?.is_some() {
            return Err(AppError::Conflict(format!("A company with RUT {} already exists", req.rut)));
        }

        let company = self.db.create_company(&req).await?;
        info!("🏢 Entreprise créée: {} ({})", company.legal_name, company.id);
        Ok(company)
    }

    pub async fn update_company(&self, id: Uuid, mut req: UpdateCompanyRequest) -> Result<Company> {
        req.validate()?;
        if let Some(rut) = req.rut.as_deref() {
            let rut = normalize_rut(rut)?;
            if let Some(existing) = self.db.find_company_by_rut(&rut).await? {
                if existing.id != id {
                    return Err(AppError::Conflict(format!("A company with RUT {} already exists", rut)));
                }
            }
            req.rut = Some(rut);
        }

        let company = self.db.update_company(id, &req).await?;
        info!("Entreprise mise à jour: {}", company.id);
        Ok(company)
    }

    pub async fn deactivate_company(&self, id: Uuid) -> Result<()> {
        self.db.set_company_active(id, false).await?;
        info!("Entreprise désactivée: {}", id);
        Ok(())
    }

    // === SUCCURSALES ===

    pub async fn list_branches(&self, company_id: Uuid) -> Result<Vec<Branch>> {
        self.db.list_branches(company_id).await
    }

    pub async fn get_branch(&self, company_id: Uuid, id: Uuid) -> Result<Branch> {
        self.db.get_branch(company_id, id).await
    }

    pub async fn create_branch(&self, company_id: Uuid, req: CreateBranchRequest) -> Result<Branch> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        if req.is_principal {
            Database::clear_principal_branch(&mut *tx, company_id, None).await?;
        }
        let branch = Database::insert_branch(&mut *tx, company_id, &req)
            .await
            .map_err(duplicate_branch_name)?;
        tx.commit().await?;

        info!("Succursale créée: {} ({})", branch.name, branch.id);
        Ok(branch)
    }

    pub async fn update_branch(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: UpdateBranchRequest,
    ) -> Result<Branch> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        if req.is_principal == Some(true) {
            Database::clear_principal_branch(&mut *tx, company_id, Some(id)).await?;
        }
        let branch = Database::update_branch(&mut *tx, company_id, id, &req)
            .await
            .map_err(duplicate_branch_name)?;
        tx.commit().await?;

        info!("Succursale mise à jour: {}", branch.id);
        Ok(branch)
    }

    // === RATTACHEMENTS ===

    pub async fn list_memberships(&self, company_id: Uuid) -> Result<Vec<Membership>> {
        self.db.list_memberships(company_id).await
    }

    pub async fn add_membership(
        &self,
        company_id: Uuid,
        req: AddMembershipRequest,
    ) -> Result<Membership> {
        req.validate()?;
        self.db.get_user_by_id(req.user_id).await?;
        if let Some(branch_id) = req.branch_id {
            self.db.get_branch(company_id, branch_id).await?;
        }

        let membership = self.db.create_membership(company_id, &req).await.map_err(|e| match e {
            AppError::Conflict(_) => {
                AppError::Conflict("User already belongs to this company".to_string())
            }
            other => other,
        })?;

        info!(
            "Rattachement créé: user={} company={} role={:?}",
            membership.user_id, company_id, membership.role
        );
        Ok(membership)
    }

    pub async fn update_membership(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: UpdateMembershipRequest,
    ) -> Result<Membership> {
        req.validate()?;
        if let Some(branch_id) = req.branch_id {
            self.db.get_branch(company_id, branch_id).await?;
        }
        self.db.update_membership(company_id, id, &req).await
    }

    pub async fn remove_membership(&self, company_id: Uuid, id: Uuid) -> Result<()> {
        self.db.delete_membership(company_id, id).await?;
        info!("Rattachement supprimé: {}", id);
        Ok(())
    }

    /// Crée ou réactive le rattachement (outil d'administration)
    pub async fn assign_company(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        role: UserRole,
    ) -> Result<Membership> {
        let membership = self.db.upsert_membership(user_id, company_id, role).await?;
        info!("Rattachement actualisé: user={} company={}", user_id, company_id);
        Ok(membership)
    }

    // === PERMISSIONS ===

    pub async fn list_permissions(
        &self,
        company_id: Uuid,
        membership_id: Uuid,
    ) -> Result<Vec<ModulePermission>> {
        self.db.get_membership_by_id(company_id, membership_id).await?;
        self.db.list_permissions(membership_id).await
    }

    pub async fn set_permission(
        &self,
        company_id: Uuid,
        membership_id: Uuid,
        req: SetPermissionRequest,
    ) -> Result<ModulePermission> {
        self.db.get_membership_by_id(company_id, membership_id).await?;
        let permission = self.db.upsert_permission(membership_id, &req).await?;
        info!(
            "Permission enregistrée: membership={} module={:?}",
            membership_id, permission.module
        );
        Ok(permission)
    }
}

fn duplicate_branch_name(err: AppError) -> AppError {
    match err {
        AppError::Conflict(_) => {
            AppError::Conflict("A branch with this name already exists in the company".to_string())
        }
        other => other,
    }
}

/// Statut superutilisateur enregistré; un compte désactivé est refusé
fn account_rights(user: &User) -> Result<bool> {
    if !user.is_active {
        warn!("Jeton présenté pour un compte désactivé: {}", user.id);
        return Err(AppError::Unauthorized("Account is disabled".to_string()));
    }
    Ok(user.is_superuser)
}

fn superuser_only(is_superuser: bool) -> Result<()> {
    if is_superuser {
        Ok(())
    } else {
        Err(AppError::Forbidden("Superuser privileges required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(is_active: bool, is_superuser: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "admin@clinica.cl".to_string(),
            password_hash: String::new(),
            first_name: "Ana".to_string(),
            last_name: "Rojas".to_string(),
            is_superuser,
            is_active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_superuser_only() {
        assert!(superuser_only(true).is_ok());
        assert!(matches!(superuser_only(false), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_account_rights_follow_stored_flags() {
        assert!(matches!(account_rights(&account(true, true)), Ok(true)));
        // Superutilisateur rétrogradé: le compte enregistré l'emporte sur le jeton
        assert!(matches!(account_rights(&account(true, false)), Ok(false)));
    }

    #[test]
    fn test_disabled_account_is_rejected() {
        assert!(matches!(
            account_rights(&account(false, true)),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            account_rights(&account(false, false)),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_duplicate_branch_name_mapping() {
        match duplicate_branch_name(AppError::Conflict("23505".into())) {
            AppError::Conflict(msg) => assert!(msg.contains("branch")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            duplicate_branch_name(AppError::NotFound("Branch".into())),
            AppError::NotFound(_)
        ));
    }
}
