use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{validate_phone, validate_rut};

/// Rôle d'un utilisateur au sein d'une entreprise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,    // Super administrateur
    CompanyAdmin,  // Administrateur d'entreprise
    BranchAdmin,   // Administrateur de succursale
    Professional,  // Professionnel de santé
    Reception,     // Réception
    Assistant,     // Assistant
}

/// Modules fonctionnels soumis aux permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "app_module", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppModule {
    Patients,
    Professionals,
    Appointments,
    Treatments,
    Payments,
    CashRegister,
    Lab,
    Reports,
    Catalog,
    Companies,
}

/// Action demandée sur un module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAction {
    View,
    Create,
    Edit,
    Delete,
    Export,
}

impl UserRole {
    /// Droits par défaut du rôle, sans surcharge enregistrée
    pub fn default_allows(&self, module: AppModule, action: PermissionAction) -> bool {
        use AppModule::*;
        use PermissionAction::*;

        let clinical = matches!(module, Patients | Appointments | Treatments | Lab);
        let reference = matches!(module, Catalog | Professionals);

        match self {
            UserRole::SuperAdmin | UserRole::CompanyAdmin => true,
            UserRole::BranchAdmin => module != Companies || action == View,
            UserRole::Professional => {
                (clinical && matches!(action, View | Create | Edit)) || (reference && action == View)
            }
            UserRole::Reception => {
                let front_desk = matches!(module, Patients | Appointments | Payments | CashRegister);
                (front_desk && matches!(action, View | Create))
                    || ((reference || module == Treatments) && action == View)
            }
            UserRole::Assistant => (clinical || reference) && action == View,
        }
    }
}

/// Surcharge des droits d'un membre sur un module
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModulePermission {
    pub id: Uuid,
    pub membership_id: Uuid,
    pub module: AppModule,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_export: bool,
}

impl ModulePermission {
    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::View => self.can_view,
            PermissionAction::Create => self.can_create,
            PermissionAction::Edit => self.can_edit,
            PermissionAction::Delete => self.can_delete,
            PermissionAction::Export => self.can_export,
        }
    }
}

/// Décide si un rôle peut agir sur un module; la ligne de permission, si présente, l'emporte
pub fn can(
    role: UserRole,
    overrides: &[ModulePermission],
    module: AppModule,
    action: PermissionAction,
) -> bool {
    match overrides.iter().find(|p| p.module == module) {
        Some(permission) => permission.allows(action),
        None => role.default_allows(module, action),
    }
}

/// Entreprise (clinique) cliente
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    /// Raison sociale
    pub legal_name: String,
    /// Nom commercial
    pub trade_name: Option<String>,
    /// RUT au format canonique
    pub rut: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 200, message = "La raison sociale est obligatoire"))]
    pub legal_name: String,

    #[validate(length(max = 200))]
    pub trade_name: Option<String>,

    #[validate(custom = "validate_rut")]
    pub rut: String,

    pub address: Option<String>,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(email(message = "Format d'email invalide"))]
    pub email: Option<String>,

    #[validate(url(message = "URL invalide"))]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 200))]
    pub legal_name: Option<String>,
    #[validate(length(max = 200))]
    pub trade_name: Option<String>,
    #[validate(custom = "validate_rut")]
    pub rut: Option<String>,
    pub address: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email(message = "Format d'email invalide"))]
    pub email: Option<String>,
    #[validate(url(message = "URL invalide"))]
    pub website: Option<String>,
    pub is_active: Option<bool>,
}

/// Succursale d'une entreprise
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Branch {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
    /// Une seule succursale principale par entreprise
    pub is_principal: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 200, message = "Le nom est obligatoire"))]
    pub name: String,
    pub address: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email(message = "Format d'email invalide"))]
    pub email: Option<String>,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_principal: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBranchRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub address: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email(message = "Format d'email invalide"))]
    pub email: Option<String>,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
    pub is_principal: Option<bool>,
    pub is_active: Option<bool>,
}

/// Rattachement d'un utilisateur à une entreprise
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub role: UserRole,
    pub is_active: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// Actif et dans sa période de validité
    pub fn is_effective(&self, today: NaiveDate) -> bool {
        self.is_active
            && self.start_date <= today
            && self.end_date.map_or(true, |end| end >= today)
    }
}

/// Entreprise accessible à l'utilisateur, pour le sélecteur d'entreprise
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyAccess {
    /// Absent pour un superutilisateur sans rattachement
    pub membership_id: Option<Uuid>,
    pub company_id: Uuid,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub role: UserRole,
    pub branch_id: Option<Uuid>,
}

/// Entreprise courante et rôle effectif d'une requête autorisée
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: UserRole,
    pub membership_id: Option<Uuid>,
}

/// Choisit l'entreprise demandée si elle est accessible, sinon la première
pub fn pick_company(accessible: &[CompanyAccess], requested: Option<Uuid>) -> Option<CompanyAccess> {
    requested
        .and_then(|id| accessible.iter().find(|a| a.company_id == id))
        .or_else(|| accessible.first())
        .cloned()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddMembershipRequest {
    pub user_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub role: UserRole,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMembershipRequest {
    pub branch_id: Option<Uuid>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetPermissionRequest {
    pub module: AppModule,
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_create: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub can_export: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectCompanyRequest {
    pub company_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(module: AppModule, can_view: bool, can_create: bool) -> ModulePermission {
        ModulePermission {
            id: Uuid::new_v4(),
            membership_id: Uuid::new_v4(),
            module,
            can_view,
            can_create,
            can_edit: false,
            can_delete: false,
            can_export: false,
        }
    }

    #[test]
    fn test_role_defaults() {
        use AppModule::*;
        use PermissionAction::*;

        assert!(can(UserRole::CompanyAdmin, &[], Reports, Export));
        assert!(can(UserRole::Reception, &[], Payments, Create));
        assert!(!can(UserRole::Reception, &[], Payments, Delete));
        assert!(!can(UserRole::Reception, &[], Reports, View));
        assert!(can(UserRole::Professional, &[], Treatments, Edit));
        assert!(!can(UserRole::Professional, &[], CashRegister, View));
        assert!(can(UserRole::Assistant, &[], Patients, View));
        assert!(!can(UserRole::Assistant, &[], Patients, Create));
        assert!(!can(UserRole::BranchAdmin, &[], Companies, Edit));
    }

    #[test]
    fn test_override_replaces_defaults_for_its_module() {
        let overrides = vec![permission(AppModule::Reports, true, false)];

        assert!(can(UserRole::Reception, &overrides, AppModule::Reports, PermissionAction::View));
        assert!(!can(UserRole::Reception, &overrides, AppModule::Reports, PermissionAction::Export));
        // Les autres modules gardent les droits du rôle
        assert!(can(UserRole::Reception, &overrides, AppModule::Patients, PermissionAction::Create));

        let revoked = vec![permission(AppModule::Patients, false, false)];
        assert!(!can(UserRole::CompanyAdmin, &revoked, AppModule::Patients, PermissionAction::View));
    }

    fn access(company_id: Uuid) -> CompanyAccess {
        CompanyAccess {
            membership_id: Some(Uuid::new_v4()),
            company_id,
            legal_name: "Clínica Dental Sonrisa SpA".to_string(),
            trade_name: None,
            role: UserRole::Reception,
            branch_id: None,
        }
    }

    #[test]
    fn test_pick_company() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let accessible = vec![access(a), access(b)];

        assert_eq!(pick_company(&accessible, Some(b)).map(|c| c.company_id), Some(b));
        assert_eq!(pick_company(&accessible, None).map(|c| c.company_id), Some(a));
        // Entreprise inaccessible: repli sur la première
        assert_eq!(pick_company(&accessible, Some(Uuid::new_v4())).map(|c| c.company_id), Some(a));
        assert!(pick_company(&[], Some(a)).is_none());
    }

    #[test]
    fn test_membership_effective_window() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let mut membership = Membership {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            branch_id: None,
            role: UserRole::Reception,
            is_active: true,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(membership.is_effective(today));

        membership.end_date = NaiveDate::from_ymd_opt(2025, 5, 9);
        assert!(!membership.is_effective(today));

        membership.end_date = None;
        membership.is_active = false;
        assert!(!membership.is_effective(today));
    }
}
