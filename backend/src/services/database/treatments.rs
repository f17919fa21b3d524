// services/database/treatments.rs
use super::Database;
use crate::models::treatment::{TreatmentBalanceRow, TreatmentItemRow};
use crate::models::{
    Treatment, TreatmentFilter, TreatmentItem, TreatmentStatus, TreatmentSummary,
    UpdateTreatmentRequest,
};
use crate::utils::error::{AppError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

const SUMMARY_SELECT: &str = r#"
    SELECT t.*,
           p.first_name || ' ' || p.last_name AS patient_name,
           CONCAT_WS(' ', pr.first_names, pr.paternal_surname, NULLIF(pr.maternal_surname, '')) AS professional_name,
           COALESCE((SELECT SUM(pay.amount) FROM payments pay
                     WHERE pay.treatment_id = t.id AND pay.status = 'completed'), 0) AS total_paid
    FROM treatments t
    JOIN patients p ON p.id = t.patient_id
    JOIN professionals pr ON pr.id = t.professional_id
"#;

/// Champs d'un nouveau traitement
pub struct NewTreatment<'a> {
    pub company_id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<&'a str>,
    pub created_by: Uuid,
}

/// Champs d'une nouvelle ligne, prix déjà figé
pub struct NewTreatmentItem<'a> {
    pub treatment_id: Uuid,
    pub procedure_id: Uuid,
    pub professional_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub notes: Option<&'a str>,
}

impl Database {
    pub async fn insert_treatment(conn: &mut PgConnection, new: &NewTreatment<'_>) -> Result<Treatment> {
        let row = sqlx::query_as::<_, Treatment>(
            r#"
            INSERT INTO treatments (company_id, patient_id, professional_id, start_date, notes, created_by)
            VALUES ($1, $2, $3, COALESCE($4, CURRENT_DATE), $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.company_id)
        .bind(new.patient_id)
        .bind(new.professional_id)
        .bind(new.start_date)
        .bind(new.notes)
        .bind(new.created_by)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn insert_treatment_item(
        conn: &mut PgConnection,
        new: &NewTreatmentItem<'_>,
    ) -> Result<TreatmentItem> {
        let row = sqlx::query_as::<_, TreatmentItem>(
            r#"
            INSERT INTO treatment_items
                (treatment_id, procedure_id, professional_id, quantity, unit_price, discount_percent, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.treatment_id)
        .bind(new.procedure_id)
        .bind(new.professional_id)
        .bind(new.quantity)
        .bind(new.unit_price)
        .bind(new.discount_percent)
        .bind(new.notes)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn delete_treatment_item(
        conn: &mut PgConnection,
        treatment_id: Uuid,
        item_id: Uuid,
    ) -> Result<()> {
        let result = sqlx::query("DELETE FROM treatment_items WHERE id = $1 AND treatment_id = $2")
            .bind(item_id)
            .bind(treatment_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Treatment item".to_string()));
        }
        Ok(())
    }

    pub async fn list_treatment_items(
        conn: &mut PgConnection,
        treatment_id: Uuid,
    ) -> Result<Vec<TreatmentItem>> {
        let rows = sqlx::query_as::<_, TreatmentItem>(
            "SELECT * FROM treatment_items WHERE treatment_id = $1 ORDER BY created_at",
        )
        .bind(treatment_id)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }

    /// Lignes avec le nom de l'acte
    pub async fn list_treatment_item_rows(&self, treatment_id: Uuid) -> Result<Vec<TreatmentItemRow>> {
        let rows = sqlx::query_as::<_, TreatmentItemRow>(
            r#"
            SELECT i.*, pr.name AS procedure_name
            FROM treatment_items i
            JOIN procedures pr ON pr.id = i.procedure_id
            WHERE i.treatment_id = $1
            ORDER BY i.created_at
            "#,
        )
        .bind(treatment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn set_treatment_total(conn: &mut PgConnection, id: Uuid, total: Decimal) -> Result<()> {
        sqlx::query("UPDATE treatments SET total_cost = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(total)
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn set_treatment_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: TreatmentStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE treatments SET
                status = $2,
                end_date = CASE WHEN $2 = 'completed'::treatment_status
                                THEN COALESCE(end_date, CURRENT_DATE) ELSE end_date END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn update_treatment(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: &UpdateTreatmentRequest,
    ) -> Result<Treatment> {
        sqlx::query_as::<_, Treatment>(
            r#"
            UPDATE treatments SET
                professional_id = COALESCE($3, professional_id),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $2 AND company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(id)
        .bind(req.professional_id)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(&req.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Treatment".to_string()))
    }

    /// Lecture verrouillée, pour les écritures qui dépendent du total ou du statut
    pub async fn lock_treatment(
        conn: &mut PgConnection,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Treatment> {
        sqlx::query_as::<_, Treatment>(
            "SELECT * FROM treatments WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Treatment".to_string()))
    }

    pub async fn get_treatment_summary(&self, company_id: Uuid, id: Uuid) -> Result<TreatmentSummary> {
        let sql = format!("{} WHERE t.id = $1 AND t.company_id = $2", SUMMARY_SELECT);
        sqlx::query_as::<_, TreatmentSummary>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Treatment".to_string()))
    }

    pub async fn list_treatment_summaries(
        &self,
        company_id: Uuid,
        filter: &TreatmentFilter,
    ) -> Result<Vec<TreatmentSummary>> {
        let sql = format!(
            r#"{}
            WHERE t.company_id = $1
              AND ($2::uuid IS NULL OR t.patient_id = $2)
              AND ($3::uuid IS NULL OR t.professional_id = $3)
              AND ($4::treatment_status IS NULL OR t.status = $4)
              AND ($5::date IS NULL OR t.start_date >= $5)
              AND ($6::date IS NULL OR t.start_date <= $6)
            ORDER BY t.start_date DESC, t.created_at DESC
            "#,
            SUMMARY_SELECT
        );

        let rows = sqlx::query_as::<_, TreatmentSummary>(&sql)
            .bind(company_id)
            .bind(filter.patient_id)
            .bind(filter.professional_id)
            .bind(filter.status)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Somme des paiements encaissés, hors paiement exclu
    pub async fn completed_paid(
        conn: &mut PgConnection,
        treatment_id: Uuid,
        exclude_payment: Option<Uuid>,
    ) -> Result<Decimal> {
        let total: (Decimal,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0) FROM payments
            WHERE treatment_id = $1 AND status = 'completed'
              AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(treatment_id)
        .bind(exclude_payment)
        .fetch_one(conn)
        .await?;

        Ok(total.0)
    }

    /// Traitements non annulés avec leur montant encaissé
    pub async fn list_treatment_balances(&self) -> Result<Vec<TreatmentBalanceRow>> {
        let rows = sqlx::query_as::<_, TreatmentBalanceRow>(
            r#"
            SELECT t.id, t.status, t.total_cost,
                   COALESCE(SUM(p.amount) FILTER (WHERE p.status = 'completed'), 0) AS total_paid
            FROM treatments t
            LEFT JOIN payments p ON p.treatment_id = t.id
            WHERE t.status <> 'cancelled'
            GROUP BY t.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_treatment_status(&self, id: Uuid, status: TreatmentStatus) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::set_treatment_status(&mut conn, id, status).await
    }
}
