// services/database/cash_register.rs
use super::payments::PAYMENT_DETAIL_SELECT;
use super::Database;
use crate::models::{
    CashClosing, CashClosingFilter, KindTotals, OpenCashRegisterRequest, PaymentDetail,
    PaymentMethodKind,
};
use crate::utils::error::{AppError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

/// Paiements encaissés du jour pas encore rattachés à une clôture
const UNLINKED_DAY_PAYMENTS: &str = r#"
    FROM payments pay
    JOIN payment_methods m ON m.id = pay.payment_method_id
    WHERE pay.company_id = $1
      AND pay.status = 'completed'
      AND pay.paid_at::date = $2
      AND NOT EXISTS (SELECT 1 FROM cash_closing_payments ccp WHERE ccp.payment_id = pay.id)
"#;

/// Valeurs calculées à la clôture
pub struct ClosingFigures<'a> {
    pub closing_amount: Decimal,
    pub totals: KindTotals,
    pub difference: Decimal,
    pub notes: Option<&'a str>,
    pub closed_by: Uuid,
}

impl Database {
    pub async fn find_open_closing(
        conn: &mut PgConnection,
        company_id: Uuid,
    ) -> Result<Option<CashClosing>> {
        let row = sqlx::query_as::<_, CashClosing>(
            "SELECT * FROM cash_closings WHERE company_id = $1 AND status = 'open' FOR UPDATE",
        )
        .bind(company_id)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }

    pub async fn insert_closing(
        conn: &mut PgConnection,
        company_id: Uuid,
        req: &OpenCashRegisterRequest,
        opened_by: Uuid,
    ) -> Result<CashClosing> {
        let row = sqlx::query_as::<_, CashClosing>(
            r#"
            INSERT INTO cash_closings (company_id, branch_id, opening_amount, notes, opened_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(req.branch_id)
        .bind(req.opening_amount)
        .bind(&req.notes)
        .bind(opened_by)
        .fetch_one(conn)
        .await
        .map_err(|e| match AppError::from(e) {
            // Index unique partiel: une seule caisse ouverte par entreprise
            AppError::Conflict(_) => AppError::CashRegisterAlreadyOpen,
            other => other,
        })?;

        Ok(row)
    }

    /// Totaux du jour par famille de moyen de paiement
    pub async fn day_totals_by_kind(
        conn: &mut PgConnection,
        company_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<(PaymentMethodKind, Decimal)>> {
        let sql = format!(
            "SELECT m.kind, COALESCE(SUM(pay.amount), 0) {} GROUP BY m.kind",
            UNLINKED_DAY_PAYMENTS
        );
        let rows = sqlx::query_as::<_, (PaymentMethodKind, Decimal)>(&sql)
            .bind(company_id)
            .bind(date)
            .fetch_all(conn)
            .await?;

        Ok(rows)
    }

    /// Rattache les paiements du jour à la clôture
    pub async fn link_day_payments(
        conn: &mut PgConnection,
        closing_id: Uuid,
        company_id: Uuid,
        date: NaiveDate,
    ) -> Result<u64> {
        let sql = format!(
            "INSERT INTO cash_closing_payments (cash_closing_id, payment_id) SELECT $3, pay.id {}",
            UNLINKED_DAY_PAYMENTS
        );
        let result = sqlx::query(&sql)
            .bind(company_id)
            .bind(date)
            .bind(closing_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn close_closing(
        conn: &mut PgConnection,
        id: Uuid,
        figures: &ClosingFigures<'_>,
    ) -> Result<CashClosing> {
        let row = sqlx::query_as::<_, CashClosing>(
            r#"
            UPDATE cash_closings SET
                closing_amount = $2,
                total_cash = $3, total_card = $4, total_transfer = $5, total_other = $6,
                difference = $7,
                notes = COALESCE($8, notes),
                closed_by = $9,
                closed_at = NOW(),
                status = 'closed',
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(figures.closing_amount)
        .bind(figures.totals.cash)
        .bind(figures.totals.card)
        .bind(figures.totals.transfer)
        .bind(figures.totals.other)
        .bind(figures.difference)
        .bind(figures.notes)
        .bind(figures.closed_by)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn get_closing(&self, company_id: Uuid, id: Uuid) -> Result<CashClosing> {
        sqlx::query_as::<_, CashClosing>(
            "SELECT * FROM cash_closings WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Cash closing".to_string()))
    }

    pub async fn list_closings(
        &self,
        company_id: Uuid,
        filter: &CashClosingFilter,
    ) -> Result<Vec<CashClosing>> {
        let rows = sqlx::query_as::<_, CashClosing>(
            r#"
            SELECT * FROM cash_closings
            WHERE company_id = $1
              AND ($2::date IS NULL OR closing_date >= $2)
              AND ($3::date IS NULL OR closing_date <= $3)
              AND ($4::cash_closing_status IS NULL OR status = $4)
            ORDER BY closing_date DESC, opened_at DESC
            "#,
        )
        .bind(company_id)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_closing_payments(&self, closing_id: Uuid) -> Result<Vec<PaymentDetail>> {
        let sql = format!(
            r#"{}
            JOIN cash_closing_payments ccp ON ccp.payment_id = pay.id
            WHERE ccp.cash_closing_id = $1
            ORDER BY pay.paid_at
            "#,
            PAYMENT_DETAIL_SELECT
        );
        let rows = sqlx::query_as::<_, PaymentDetail>(&sql)
            .bind(closing_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
