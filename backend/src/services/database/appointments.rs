// services/database/appointments.rs
use super::Database;
use crate::models::{
    Appointment, AppointmentDetail, AppointmentFilter, AppointmentRequest, AppointmentStatus, Slot,
};
use crate::utils::error::{AppError, Result};
use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

const DETAIL_SELECT: &str = r#"
    SELECT a.*,
           p.first_name || ' ' || p.last_name AS patient_name,
           p.phone AS patient_phone,
           CONCAT_WS(' ', pr.first_names, pr.paternal_surname, NULLIF(pr.maternal_surname, '')) AS professional_name
    FROM appointments a
    JOIN patients p ON p.id = a.patient_id
    JOIN professionals pr ON pr.id = a.professional_id
"#;

impl Database {
    pub async fn insert_appointment(
        conn: &mut PgConnection,
        company_id: Uuid,
        req: &AppointmentRequest,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments
                (company_id, patient_id, professional_id, appointment_date, start_time,
                 duration_minutes, status, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(req.patient_id)
        .bind(req.professional_id)
        .bind(req.appointment_date)
        .bind(req.start_time)
        .bind(req.duration_minutes)
        .bind(status)
        .bind(&req.reason)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn update_appointment(
        conn: &mut PgConnection,
        company_id: Uuid,
        id: Uuid,
        req: &AppointmentRequest,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments SET
                patient_id = $3, professional_id = $4, appointment_date = $5, start_time = $6,
                duration_minutes = $7, status = $8, reason = $9, updated_at = NOW()
            WHERE id = $2 AND company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(id)
        .bind(req.patient_id)
        .bind(req.professional_id)
        .bind(req.appointment_date)
        .bind(req.start_time)
        .bind(req.duration_minutes)
        .bind(status)
        .bind(&req.reason)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment".to_string()))
    }

    pub async fn get_appointment(&self, company_id: Uuid, id: Uuid) -> Result<Appointment> {
        sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment".to_string()))
    }

    pub async fn get_appointment_detail(&self, company_id: Uuid, id: Uuid) -> Result<AppointmentDetail> {
        let sql = format!("{} WHERE a.id = $1 AND a.company_id = $2", DETAIL_SELECT);
        sqlx::query_as::<_, AppointmentDetail>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment".to_string()))
    }

    pub async fn list_appointment_details(
        &self,
        company_id: Uuid,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentDetail>> {
        let sql = format!(
            r#"{}
            WHERE a.company_id = $1
              AND ($2::uuid IS NULL OR a.professional_id = $2)
              AND ($3::uuid IS NULL OR a.patient_id = $3)
              AND ($4::appointment_status IS NULL OR a.status = $4)
              AND ($5::date IS NULL OR a.appointment_date >= $5)
              AND ($6::date IS NULL OR a.appointment_date <= $6)
            ORDER BY a.appointment_date, a.start_time
            "#,
            DETAIL_SELECT
        );

        let rows = sqlx::query_as::<_, AppointmentDetail>(&sql)
            .bind(company_id)
            .bind(filter.professional_id)
            .bind(filter.patient_id)
            .bind(filter.status)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Créneaux du professionnel sur une journée, annulés compris
    pub async fn day_slots(
        conn: &mut PgConnection,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>> {
        let rows = sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, start_time AS start, duration_minutes, status
            FROM appointments
            WHERE professional_id = $1 AND appointment_date = $2
            ORDER BY start_time
            "#,
        )
        .bind(professional_id)
        .bind(date)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }

    pub async fn set_appointment_status(
        conn: &mut PgConnection,
        company_id: Uuid,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments SET status = $3, updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(status)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment".to_string()))
    }

    pub async fn delete_appointment(&self, company_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Appointment".to_string()));
        }
        Ok(())
    }
}
