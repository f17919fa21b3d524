// services/database/users.rs
use super::Database;
use crate::models::User;
use crate::utils::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

impl Database {
    // === UTILISATEURS ===

    /// Vérifier si un utilisateur existe par email
    pub async fn user_exists_by_email(&self, email: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }

    /// Créer un nouvel utilisateur
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        is_superuser: bool,
    ) -> Result<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(is_superuser)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Récupérer un utilisateur par email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Récupérer un utilisateur par ID
    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY email")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Mettre à jour la dernière connexion
    pub async fn update_user_last_login(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Mettre à jour le mot de passe
    pub async fn update_user_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }

    /// Promouvoir ou rétrograder un superutilisateur
    pub async fn set_user_superuser(&self, user_id: Uuid, is_superuser: bool) -> Result<()> {
        sqlx::query("UPDATE users SET is_superuser = $1, is_active = TRUE, updated_at = NOW() WHERE id = $2")
            .bind(is_superuser)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
