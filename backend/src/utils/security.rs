// utils/security.rs
use crate::models::UserRole;
use crate::utils::error::{AppError, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims JWT pour les tokens d'accès
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: Uuid,                 // User ID
    pub email: String,             // User email
    pub company_id: Option<Uuid>,  // Entreprise courante
    pub role: Option<UserRole>,    // Rôle dans l'entreprise courante
    pub is_superuser: bool,
    pub exp: usize,                // Expiration timestamp
    pub iat: usize,                // Issued at timestamp
    pub jti: String,               // Token ID
}

/// Données nécessaires pour émettre un token
#[derive(Debug, Clone)]
pub struct TokenSubject<'a> {
    pub user_id: Uuid,
    pub email: &'a str,
    pub company_id: Option<Uuid>,
    pub role: Option<UserRole>,
    pub is_superuser: bool,
}

/// Générer un token d'accès JWT
pub fn generate_access_token(
    subject: &TokenSubject<'_>,
    secret: &str,
    expiry_hours: i64,
) -> Result<String> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::hours(expiry_hours);

    let claims = AccessTokenClaims {
        sub: subject.user_id,
        email: subject.email.to_string(),
        company_id: subject.company_id,
        role: subject.role,
        is_superuser: subject.is_superuser,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::EncryptionError(e.to_string()))
}

/// Vérifier un token d'accès
pub fn verify_access_token(token: &str, secret: &str) -> Result<TokenData<AccessTokenClaims>> {
    let token_data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data)
}

/// Générer un hash de mot de passe avec Argon2
pub fn hash_password(password: &str) -> Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };

    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::EncryptionError(e.to_string()))
}

/// Vérifier un mot de passe contre un hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    use argon2::{
        password_hash::{PasswordHash, PasswordVerifier},
        Argon2,
    };

    let argon2 = Argon2::default();
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::EncryptionError(e.to_string()))?;

    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Générer une chaîne aléatoire
pub fn generate_random_string(length: usize) -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-unit-test-secret";

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("Sonrisa2024!").unwrap();
        assert!(verify_password("Sonrisa2024!", &hash).unwrap());
        assert!(!verify_password("otra-clave", &hash).unwrap());
    }

    #[test]
    fn test_token_carries_company_and_role() {
        let company_id = Uuid::new_v4();
        let subject = TokenSubject {
            user_id: Uuid::new_v4(),
            email: "recepcion@clinica.cl",
            company_id: Some(company_id),
            role: Some(UserRole::Reception),
            is_superuser: false,
        };

        let token = generate_access_token(&subject, SECRET, 1).unwrap();
        let data = verify_access_token(&token, SECRET).unwrap();

        assert_eq!(data.claims.sub, subject.user_id);
        assert_eq!(data.claims.company_id, Some(company_id));
        assert_eq!(data.claims.role, Some(UserRole::Reception));
        assert!(!data.claims.is_superuser);
    }

    #[test]
    fn test_token_with_wrong_secret_is_rejected() {
        let subject = TokenSubject {
            user_id: Uuid::new_v4(),
            email: "a@b.cl",
            company_id: None,
            role: None,
            is_superuser: true,
        };
        let token = generate_access_token(&subject, SECRET, 1).unwrap();
        assert!(matches!(
            verify_access_token(&token, "another-secret-another-secret-xx"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_random_string_length() {
        assert_eq!(generate_random_string(16).len(), 16);
    }
}
