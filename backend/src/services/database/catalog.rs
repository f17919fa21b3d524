// services/database/catalog.rs
use super::Database;
use crate::models::{
    Insurer, InsurerRequest, PaymentMethod, PaymentMethodKind, PaymentMethodRequest, Procedure,
    ProcedureRequest, Specialty, SpecialtyRequest,
};
use crate::utils::error::{AppError, Result};
use uuid::Uuid;

impl Database {
    // === SPÉCIALITÉS ===

    pub async fn list_specialties(&self, include_inactive: bool) -> Result<Vec<Specialty>> {
        let rows = sqlx::query_as::<_, Specialty>(
            "SELECT * FROM specialties WHERE ($1 OR is_active) ORDER BY name",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_specialty(&self, id: Uuid) -> Result<Specialty> {
        sqlx::query_as::<_, Specialty>("SELECT * FROM specialties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Specialty".to_string()))
    }

    pub async fn create_specialty(&self, req: &SpecialtyRequest) -> Result<Specialty> {
        let row = sqlx::query_as::<_, Specialty>(
            r#"
            INSERT INTO specialties (name, description, is_active)
            VALUES ($1, $2, COALESCE($3, TRUE))
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_specialty(&self, id: Uuid, req: &SpecialtyRequest) -> Result<Specialty> {
        sqlx::query_as::<_, Specialty>(
            r#"
            UPDATE specialties SET
                name = $2, description = $3, is_active = COALESCE($4, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Specialty".to_string()))
    }

    /// Nombre d'actes et de professionnels qui référencent la spécialité
    pub async fn count_specialty_references(&self, id: Uuid) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM procedures WHERE specialty_id = $1)
                 + (SELECT COUNT(*) FROM professionals WHERE specialty_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    pub async fn delete_specialty(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM specialties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Specialty".to_string()));
        }
        Ok(())
    }

    /// Insertion idempotente (amorçage)
    pub async fn ensure_specialty(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("INSERT INTO specialties (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === ACTES ===

    pub async fn list_procedures(
        &self,
        include_inactive: bool,
        specialty_id: Option<Uuid>,
    ) -> Result<Vec<Procedure>> {
        let rows = sqlx::query_as::<_, Procedure>(
            r#"
            SELECT * FROM procedures
            WHERE ($1 OR is_active) AND ($2::uuid IS NULL OR specialty_id = $2)
            ORDER BY name
            "#,
        )
        .bind(include_inactive)
        .bind(specialty_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_procedure(&self, id: Uuid) -> Result<Procedure> {
        sqlx::query_as::<_, Procedure>("SELECT * FROM procedures WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Procedure".to_string()))
    }

    pub async fn create_procedure(&self, req: &ProcedureRequest) -> Result<Procedure> {
        let row = sqlx::query_as::<_, Procedure>(
            r#"
            INSERT INTO procedures (name, description, price, estimated_minutes, specialty_id, is_active)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE))
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.estimated_minutes)
        .bind(req.specialty_id)
        .bind(req.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_procedure(&self, id: Uuid, req: &ProcedureRequest) -> Result<Procedure> {
        sqlx::query_as::<_, Procedure>(
            r#"
            UPDATE procedures SET
                name = $2, description = $3, price = $4, estimated_minutes = $5,
                specialty_id = $6, is_active = COALESCE($7, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.estimated_minutes)
        .bind(req.specialty_id)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Procedure".to_string()))
    }

    pub async fn set_procedure_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE procedures SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Procedure".to_string()));
        }
        Ok(())
    }

    // === MOYENS DE PAIEMENT ===

    pub async fn list_payment_methods(&self, include_inactive: bool) -> Result<Vec<PaymentMethod>> {
        let rows = sqlx::query_as::<_, PaymentMethod>(
            "SELECT * FROM payment_methods WHERE ($1 OR is_active) ORDER BY name",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_payment_method(&self, id: Uuid) -> Result<PaymentMethod> {
        sqlx::query_as::<_, PaymentMethod>("SELECT * FROM payment_methods WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment method".to_string()))
    }

    pub async fn create_payment_method(&self, req: &PaymentMethodRequest) -> Result<PaymentMethod> {
        let row = sqlx::query_as::<_, PaymentMethod>(
            r#"
            INSERT INTO payment_methods (name, kind, description, is_active)
            VALUES ($1, $2, $3, COALESCE($4, TRUE))
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(req.kind)
        .bind(&req.description)
        .bind(req.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_payment_method(
        &self,
        id: Uuid,
        req: &PaymentMethodRequest,
    ) -> Result<PaymentMethod> {
        sqlx::query_as::<_, PaymentMethod>(
            r#"
            UPDATE payment_methods SET
                name = $2, kind = $3, description = $4,
                is_active = COALESCE($5, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(req.kind)
        .bind(&req.description)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment method".to_string()))
    }

    pub async fn ensure_payment_method(&self, name: &str, kind: PaymentMethodKind) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO payment_methods (name, kind) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(kind)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === PRÉVISIONS ===

    pub async fn list_insurers(&self, include_inactive: bool) -> Result<Vec<Insurer>> {
        let rows = sqlx::query_as::<_, Insurer>(
            "SELECT * FROM insurers WHERE ($1 OR is_active) ORDER BY name",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_insurer(&self, id: Uuid) -> Result<Insurer> {
        sqlx::query_as::<_, Insurer>("SELECT * FROM insurers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Insurer".to_string()))
    }

    pub async fn create_insurer(&self, req: &InsurerRequest) -> Result<Insurer> {
        let row = sqlx::query_as::<_, Insurer>(
            r#"
            INSERT INTO insurers (name, description, is_active)
            VALUES ($1, $2, COALESCE($3, TRUE))
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_insurer(&self, id: Uuid, req: &InsurerRequest) -> Result<Insurer> {
        sqlx::query_as::<_, Insurer>(
            r#"
            UPDATE insurers SET
                name = $2, description = $3, is_active = COALESCE($4, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Insurer".to_string()))
    }

    pub async fn ensure_insurer(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("INSERT INTO insurers (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
