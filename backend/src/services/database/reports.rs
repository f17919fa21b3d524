// services/database/reports.rs
use super::Database;
use crate::models::{DailyAmount, DailyCount, KindBreakdown, ProfessionalBreakdown, StatusBreakdown};
use crate::utils::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

impl Database {
    pub async fn count_active_patients(&self, company_id: Uuid) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM patients WHERE company_id = $1 AND is_active",
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    pub async fn appointments_per_day(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCount>> {
        let rows = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT appointment_date AS day, COUNT(*) AS count
            FROM appointments
            WHERE company_id = $1 AND appointment_date BETWEEN $2 AND $3
            GROUP BY appointment_date
            ORDER BY appointment_date
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn treatments_per_day(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCount>> {
        let rows = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT start_date AS day, COUNT(*) AS count
            FROM treatments
            WHERE company_id = $1 AND start_date BETWEEN $2 AND $3
            GROUP BY start_date
            ORDER BY start_date
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Somme des coûts des traitements démarrés dans la période
    pub async fn treatment_revenue(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Decimal> {
        let total: (Decimal,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_cost), 0) FROM treatments
            WHERE company_id = $1 AND start_date BETWEEN $2 AND $3
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.0)
    }

    pub async fn treatments_by_status(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<StatusBreakdown>> {
        let rows = sqlx::query_as::<_, StatusBreakdown>(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(total_cost), 0) AS revenue
            FROM treatments
            WHERE company_id = $1 AND start_date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR professional_id = $4)
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn treatments_by_professional(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<ProfessionalBreakdown>> {
        let rows = sqlx::query_as::<_, ProfessionalBreakdown>(
            r#"
            SELECT pr.id AS professional_id,
                   CONCAT_WS(' ', pr.first_names, pr.paternal_surname, NULLIF(pr.maternal_surname, '')) AS professional_name,
                   COUNT(t.id) AS count,
                   COALESCE(SUM(t.total_cost), 0) AS revenue
            FROM treatments t
            JOIN professionals pr ON pr.id = t.professional_id
            WHERE t.company_id = $1 AND t.start_date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR t.professional_id = $4)
            GROUP BY pr.id
            ORDER BY revenue DESC
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn treatment_revenue_per_day(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<DailyAmount>> {
        let rows = sqlx::query_as::<_, DailyAmount>(
            r#"
            SELECT start_date AS day, COALESCE(SUM(total_cost), 0) AS amount
            FROM treatments
            WHERE company_id = $1 AND start_date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR professional_id = $4)
            GROUP BY start_date
            ORDER BY start_date
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Encaissements par jour, paiements annulés exclus
    pub async fn payments_per_day(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<DailyAmount>> {
        let rows = sqlx::query_as::<_, DailyAmount>(
            r#"
            SELECT pay.paid_at::date AS day, COALESCE(SUM(pay.amount), 0) AS amount
            FROM payments pay
            JOIN treatments t ON t.id = pay.treatment_id
            WHERE pay.company_id = $1
              AND pay.status = 'completed'
              AND pay.paid_at::date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR t.professional_id = $4)
            GROUP BY pay.paid_at::date
            ORDER BY day
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn payments_by_kind(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<KindBreakdown>> {
        let rows = sqlx::query_as::<_, KindBreakdown>(
            r#"
            SELECT m.kind, COUNT(pay.id) AS count, COALESCE(SUM(pay.amount), 0) AS amount
            FROM payments pay
            JOIN payment_methods m ON m.id = pay.payment_method_id
            WHERE pay.company_id = $1
              AND pay.status = 'completed'
              AND pay.paid_at::date BETWEEN $2 AND $3
            GROUP BY m.kind
            ORDER BY m.kind
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
