use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::company::{CompanyAccess, UserRole};

/// Représente un utilisateur du système
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Identifiant unique de l'utilisateur (UUID)
    pub id: Uuid,

    /// Email de l'utilisateur (unique, minuscules) - utilisé pour la connexion
    pub email: String,

    /// Hash du mot de passe (stocké sécurisé)
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,

    /// Accès à toutes les entreprises
    pub is_superuser: bool,

    pub is_active: bool,

    /// Date de dernière connexion
    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Nom complet, ou l'email à défaut
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }

    /// Initiales pour l'avatar (ex: "MG")
    pub fn initials(&self) -> String {
        let initial = |s: &str| s.trim().chars().next().map(|c| c.to_uppercase().to_string());
        match (initial(&self.first_name), initial(&self.last_name)) {
            (Some(f), Some(l)) => format!("{}{}", f, l),
            (Some(f), None) => f,
            (None, Some(l)) => l,
            (None, None) => initial(&self.email).unwrap_or_default(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name(),
            initials: self.initials(),
            is_superuser: self.is_superuser,
            last_login_at: self.last_login_at,
        }
    }
}

/// Données requises pour créer un nouvel utilisateur
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,

    #[validate(length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,

    #[serde(default)]
    pub is_superuser: bool,
}

/// Données pour la connexion d'un utilisateur
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,

    pub password: String,

    /// Entreprise souhaitée pour la session
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,

    #[validate(length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"))]
    pub new_password: String,
}

/// Données du profil utilisateur
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub initials: String,
    pub is_superuser: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Réponse de connexion ou de changement d'entreprise
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
    pub current_company: Option<CompanyAccess>,
    pub role: Option<UserRole>,
    pub companies: Vec<CompanyAccess>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "dra.gonzalez@clinica.cl".to_string(),
            password_hash: String::new(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            is_superuser: false,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_full_name_and_initials() {
        let u = user("María", "González");
        assert_eq!(u.full_name(), "María González");
        assert_eq!(u.initials(), "MG");
    }

    #[test]
    fn test_name_fallbacks_to_email() {
        let u = user("", " ");
        assert_eq!(u.full_name(), "dra.gonzalez@clinica.cl");
        assert_eq!(u.initials(), "D");
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let json = serde_json::to_value(user("Ana", "Pérez")).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
