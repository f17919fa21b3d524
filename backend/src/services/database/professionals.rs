// services/database/professionals.rs
use super::Database;
use crate::models::{Professional, ProfessionalFilter, ProfessionalRequest};
use crate::utils::error::{AppError, Result};
use sqlx::PgConnection;
use uuid::Uuid;

impl Database {
    pub async fn create_professional(
        &self,
        company_id: Uuid,
        req: &ProfessionalRequest,
    ) -> Result<Professional> {
        let row = sqlx::query_as::<_, Professional>(
            r#"
            INSERT INTO professionals
                (company_id, rut, first_names, paternal_surname, maternal_surname, birth_date,
                 gender, phone, email, address, specialty_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(&req.rut)
        .bind(&req.first_names)
        .bind(&req.paternal_surname)
        .bind(&req.maternal_surname)
        .bind(req.birth_date)
        .bind(req.gender)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.address)
        .bind(req.specialty_id)
        .bind(req.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_professional(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: &ProfessionalRequest,
    ) -> Result<Professional> {
        sqlx::query_as::<_, Professional>(
            r#"
            UPDATE professionals SET
                rut = $3, first_names = $4, paternal_surname = $5, maternal_surname = $6,
                birth_date = $7, gender = $8, phone = $9, email = $10, address = $11,
                specialty_id = $12, user_id = $13, updated_at = NOW()
            WHERE id = $2 AND company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(id)
        .bind(&req.rut)
        .bind(&req.first_names)
        .bind(&req.paternal_surname)
        .bind(&req.maternal_surname)
        .bind(req.birth_date)
        .bind(req.gender)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.address)
        .bind(req.specialty_id)
        .bind(req.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Professional".to_string()))
    }

    pub async fn get_professional(&self, company_id: Uuid, id: Uuid) -> Result<Professional> {
        sqlx::query_as::<_, Professional>(
            "SELECT * FROM professionals WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Professional".to_string()))
    }

    /// Verrouille la ligne du professionnel pour sérialiser la prise de rendez-vous
    pub async fn lock_professional(
        conn: &mut PgConnection,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Professional> {
        sqlx::query_as::<_, Professional>(
            "SELECT * FROM professionals WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Professional".to_string()))
    }

    pub async fn list_professionals(
        &self,
        company_id: Uuid,
        filter: &ProfessionalFilter,
    ) -> Result<Vec<Professional>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let rows = sqlx::query_as::<_, Professional>(
            r#"
            SELECT * FROM professionals
            WHERE company_id = $1
              AND ($2 OR is_active)
              AND ($3::uuid IS NULL OR specialty_id = $3)
              AND ($4::text IS NULL
                   OR first_names ILIKE '%' || $4 || '%'
                   OR paternal_surname ILIKE '%' || $4 || '%'
                   OR maternal_surname ILIKE '%' || $4 || '%'
                   OR rut ILIKE '%' || $4 || '%')
            ORDER BY paternal_surname, maternal_surname, first_names
            "#,
        )
        .bind(company_id)
        .bind(filter.include_inactive)
        .bind(filter.specialty_id)
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn set_professional_active(
        &self,
        company_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE professionals SET is_active = $3, updated_at = NOW() WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .bind(is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Professional".to_string()));
        }
        Ok(())
    }

    pub async fn professional_rut_taken(&self, rut: &str, exclude: Option<Uuid>) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM professionals WHERE rut = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(rut)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    pub async fn professional_email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM professionals WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }
}
