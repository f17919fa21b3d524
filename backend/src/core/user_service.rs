// core/user_service.rs
use crate::core::company_service::CompanyService;
use crate::models::{
    AuthResponse, ChangePasswordRequest, CompanyAccess, LoginRequest, RegisterUserRequest, User,
    UserProfile, UserRole,
};
use crate::services::database::Database;
use crate::utils::error::{AppError, Result};
use crate::utils::security::{
    generate_access_token, generate_random_string, hash_password, verify_password, TokenSubject,
};
use crate::utils::validation::validate_password;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

const GENERATED_PASSWORD_LENGTH: usize = 16;

pub struct UserService {
    db: Arc<Database>,
    companies: Arc<CompanyService>,
    jwt_secret: String,
    token_expiry_hours: i64,
}

impl UserService {
    pub fn new(
        db: Arc<Database>,
        companies: Arc<CompanyService>,
        jwt_secret: String,
        token_expiry_hours: i64,
    ) -> Self {
        Self {
            db,
            companies,
            jwt_secret,
            token_expiry_hours,
        }
    }

    /// Inscription d'un nouvel utilisateur
    pub async fn register_user(&self, req: RegisterUserRequest) -> Result<User> {
        req.validate()?;
        validate_password(&req.password)?;

        let email = normalize_email(&req.email);
        if self.db.user_exists_by_email(&email).await? {
            return Err(AppError::Conflict(format!("A user with email {} already exists", email)));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .db
            .create_user(
                &email,
                &password_hash,
                req.first_name.trim(),
                req.last_name.trim(),
                req.is_superuser,
            )
            .await?;

        info!("👤 Utilisateur créé: {} ({})", user.email, user.id);
        Ok(user)
    }

    /// Authentification email/mot de passe
    pub async fn authenticate_user(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .db
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active || !verify_password(password, &user.password_hash)? {
            warn!("Échec de connexion pour {}", user.email);
            return Err(AppError::InvalidCredentials);
        }

        self.db.update_user_last_login(user.id).await?;
        Ok(user)
    }

    /// Connexion: jeton lié à l'entreprise résolue
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse> {
        req.validate()?;
        let user = self.authenticate_user(&req.email, &req.password).await?;

        let (current, companies) =
            match self.companies.resolve_current_company(&user, req.company_id).await {
                Ok((current, companies)) => (Some(current), companies),
                // Connexion permise; les routes d'entreprise répondront NO_COMPANY_SELECTED
                Err(AppError::NoCompanySelected) => {
                    warn!("Utilisateur {} sans entreprise accessible", user.id);
                    (None, Vec::new())
                }
                Err(e) => return Err(e),
            };

        info!("🔑 Connexion: {}", user.email);
        self.auth_response(&user, current, companies)
    }

    /// Changement d'entreprise courante
    pub async fn select_company(&self, user_id: Uuid, company_id: Uuid) -> Result<AuthResponse> {
        let user = self.db.get_user_by_id(user_id).await?;
        let companies = self.companies.accessible_companies(&user).await?;

        let current = companies
            .iter()
            .find(|c| c.company_id == company_id)
            .cloned()
            .ok_or_else(|| AppError::Forbidden("No access to this company".to_string()))?;

        info!("Entreprise sélectionnée: user={} company={}", user_id, company_id);
        self.auth_response(&user, Some(current), companies)
    }

    /// Profil et entreprises accessibles de l'utilisateur connecté
    pub async fn me(&self, user_id: Uuid, company_id: Option<Uuid>) -> Result<AuthResponse> {
        let user = self.db.get_user_by_id(user_id).await?;
        let companies = self.companies.accessible_companies(&user).await?;
        let current = company_id.and_then(|id| companies.iter().find(|c| c.company_id == id).cloned());
        self.auth_response(&user, current, companies)
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let users = self.db.list_users().await?;
        Ok(users.iter().map(User::profile).collect())
    }

    pub async fn change_password(&self, user_id: Uuid, req: ChangePasswordRequest) -> Result<()> {
        req.validate()?;
        let user = self.db.get_user_by_id(user_id).await?;

        if !verify_password(&req.current_password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        validate_password(&req.new_password)?;
        let password_hash = hash_password(&req.new_password)?;
        self.db.update_user_password(user_id, &password_hash).await?;

        info!("Mot de passe modifié: {}", user.email);
        Ok(())
    }

    /// Crée ou promeut un superutilisateur
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        let normalized = normalize_email(email);
        if let Some(existing) = self.db.find_user_by_email(&normalized).await? {
            self.db.set_user_superuser(existing.id, true).await?;
            info!("Utilisateur promu superutilisateur: {}", existing.email);
            return self.db.get_user_by_id(existing.id).await;
        }

        self.register_user(RegisterUserRequest {
            email: normalized,
            password: password.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_superuser: true,
        })
        .await
    }

    /// Réinitialise le mot de passe; en génère un si absent et le renvoie
    pub async fn reset_password(&self, email: &str, password: Option<String>) -> Result<String> {
        let user = self
            .db
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", email)))?;

        let password = password.unwrap_or_else(|| generate_random_string(GENERATED_PASSWORD_LENGTH));
        validate_password(&password)?;

        let password_hash = hash_password(&password)?;
        self.db.update_user_password(user.id, &password_hash).await?;

        info!("Mot de passe réinitialisé: {}", user.email);
        Ok(password)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        self.db
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", email)))
    }

    fn auth_response(
        &self,
        user: &User,
        current: Option<CompanyAccess>,
        companies: Vec<CompanyAccess>,
    ) -> Result<AuthResponse> {
        let role: Option<UserRole> = current.as_ref().map(|c| c.role);
        let access_token = generate_access_token(
            &TokenSubject {
                user_id: user.id,
                email: &user.email,
                company_id: current.as_ref().map(|c| c.company_id),
                role,
                is_superuser: user.is_superuser,
            },
            &self.jwt_secret,
            self.token_expiry_hours,
        )?;

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiry_hours * 3600,
            user: user.profile(),
            current_company: current,
            role,
            companies,
        })
    }
}

/// Emails stockés en minuscules
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Recepcion@Clinica.CL "), "recepcion@clinica.cl");
        assert_eq!(normalize_email("admin@clinica.cl"), "admin@clinica.cl");
    }
}
