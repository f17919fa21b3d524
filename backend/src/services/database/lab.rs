// services/database/lab.rs
use super::Database;
use crate::models::{
    CreateLabJobRequest, LabJob, LabJobEvent, LabJobFilter, LabJobStatus, LabJobSummary,
    Laboratory, LaboratoryRequest, UpdateLabJobRequest,
};
use crate::utils::error::{AppError, Result};
use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

const SUMMARY_SELECT: &str = r#"
    SELECT j.*,
           l.name AS laboratory_name,
           p.first_name || ' ' || p.last_name AS patient_name,
           CONCAT_WS(' ', pr.first_names, pr.paternal_surname, NULLIF(pr.maternal_surname, '')) AS professional_name
    FROM lab_jobs j
    JOIN laboratories l ON l.id = j.laboratory_id
    JOIN patients p ON p.id = j.patient_id
    JOIN professionals pr ON pr.id = j.professional_id
"#;

impl Database {
    // === LABORATOIRES ===

    pub async fn list_laboratories(&self, include_inactive: bool) -> Result<Vec<Laboratory>> {
        let rows = sqlx::query_as::<_, Laboratory>(
            "SELECT * FROM laboratories WHERE ($1 OR is_active) ORDER BY name",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_laboratory(&self, id: Uuid) -> Result<Laboratory> {
        sqlx::query_as::<_, Laboratory>("SELECT * FROM laboratories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Laboratory".to_string()))
    }

    pub async fn create_laboratory(&self, req: &LaboratoryRequest, created_by: Uuid) -> Result<Laboratory> {
        let row = sqlx::query_as::<_, Laboratory>(
            r#"
            INSERT INTO laboratories (name, contact, phone, email, address, is_active, created_by)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE), $7)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.contact)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.address)
        .bind(req.is_active)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_laboratory(&self, id: Uuid, req: &LaboratoryRequest) -> Result<Laboratory> {
        sqlx::query_as::<_, Laboratory>(
            r#"
            UPDATE laboratories SET
                name = $2, contact = $3, phone = $4, email = $5, address = $6,
                is_active = COALESCE($7, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.contact)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.address)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Laboratory".to_string()))
    }

    pub async fn set_laboratory_active(&self, id: Uuid, active: bool) -> Result<Laboratory> {
        sqlx::query_as::<_, Laboratory>(
            "UPDATE laboratories SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Laboratory".to_string()))
    }

    // === TRAVAUX ===

    pub async fn insert_lab_job(
        conn: &mut PgConnection,
        company_id: Uuid,
        req: &CreateLabJobRequest,
        created_by: Uuid,
    ) -> Result<LabJob> {
        let row = sqlx::query_as::<_, LabJob>(
            r#"
            INSERT INTO lab_jobs
                (company_id, laboratory_id, patient_id, professional_id, kind, description,
                 estimated_delivery_date, notes, cost, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(req.laboratory_id)
        .bind(req.patient_id)
        .bind(req.professional_id)
        .bind(req.kind)
        .bind(&req.description)
        .bind(req.estimated_delivery_date)
        .bind(&req.notes)
        .bind(req.cost)
        .bind(created_by)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn update_lab_job(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: &UpdateLabJobRequest,
    ) -> Result<LabJob> {
        sqlx::query_as::<_, LabJob>(
            r#"
            UPDATE lab_jobs SET
                laboratory_id = COALESCE($3, laboratory_id),
                kind = COALESCE($4, kind),
                description = COALESCE($5, description),
                estimated_delivery_date = COALESCE($6, estimated_delivery_date),
                notes = COALESCE($7, notes),
                cost = COALESCE($8, cost),
                updated_at = NOW()
            WHERE id = $2 AND company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(id)
        .bind(req.laboratory_id)
        .bind(req.kind)
        .bind(&req.description)
        .bind(req.estimated_delivery_date)
        .bind(&req.notes)
        .bind(req.cost)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Lab job".to_string()))
    }

    pub async fn lock_lab_job(conn: &mut PgConnection, company_id: Uuid, id: Uuid) -> Result<LabJob> {
        sqlx::query_as::<_, LabJob>(
            "SELECT * FROM lab_jobs WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Lab job".to_string()))
    }

    pub async fn set_lab_job_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: LabJobStatus,
        sent_date: Option<NaiveDate>,
        received_date: Option<NaiveDate>,
    ) -> Result<LabJob> {
        let row = sqlx::query_as::<_, LabJob>(
            r#"
            UPDATE lab_jobs SET
                status = $2, sent_date = $3, received_date = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(sent_date)
        .bind(received_date)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn insert_lab_job_event(
        conn: &mut PgConnection,
        lab_job_id: Uuid,
        status: LabJobStatus,
        notes: &str,
        created_by: Uuid,
    ) -> Result<LabJobEvent> {
        let row = sqlx::query_as::<_, LabJobEvent>(
            r#"
            INSERT INTO lab_job_events (lab_job_id, status, notes, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(lab_job_id)
        .bind(status)
        .bind(notes)
        .bind(created_by)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn list_lab_job_events(&self, lab_job_id: Uuid) -> Result<Vec<LabJobEvent>> {
        let rows = sqlx::query_as::<_, LabJobEvent>(
            "SELECT * FROM lab_job_events WHERE lab_job_id = $1 ORDER BY created_at",
        )
        .bind(lab_job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_lab_job_summary(&self, company_id: Uuid, id: Uuid) -> Result<LabJobSummary> {
        let sql = format!("{} WHERE j.id = $1 AND j.company_id = $2", SUMMARY_SELECT);
        sqlx::query_as::<_, LabJobSummary>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Lab job".to_string()))
    }

    pub async fn list_lab_job_summaries(
        &self,
        company_id: Uuid,
        filter: &LabJobFilter,
    ) -> Result<Vec<LabJobSummary>> {
        let sql = format!(
            r#"{}
            WHERE j.company_id = $1
              AND ($2::lab_job_status IS NULL OR j.status = $2)
              AND ($3::uuid IS NULL OR j.laboratory_id = $3)
              AND ($4::uuid IS NULL OR j.patient_id = $4)
            ORDER BY j.estimated_delivery_date, j.created_at
            "#,
            SUMMARY_SELECT
        );

        let rows = sqlx::query_as::<_, LabJobSummary>(&sql)
            .bind(company_id)
            .bind(filter.status)
            .bind(filter.laboratory_id)
            .bind(filter.patient_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Travaux en retard: échéance dépassée, pas encore revenus du laboratoire
    pub async fn list_overdue_lab_jobs(
        &self,
        company_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<LabJobSummary>> {
        let sql = format!(
            r#"{}
            WHERE j.company_id = $1
              AND j.estimated_delivery_date < $2
              AND j.status NOT IN ('received', 'delivered', 'cancelled')
            ORDER BY j.estimated_delivery_date
            "#,
            SUMMARY_SELECT
        );

        let rows = sqlx::query_as::<_, LabJobSummary>(&sql)
            .bind(company_id)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
