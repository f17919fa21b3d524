// services/database/payments.rs
use super::Database;
use crate::models::payment::NewPaymentHistory;
use crate::models::{
    CreatePaymentRequest, Payment, PaymentDetail, PaymentFilter, PaymentHistory, PaymentStatus,
};
use crate::utils::error::{AppError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

pub(super) const PAYMENT_DETAIL_SELECT: &str = r#"
    SELECT pay.*,
           p.id AS patient_id,
           p.first_name || ' ' || p.last_name AS patient_name,
           t.status AS treatment_status,
           m.name AS payment_method_name,
           m.kind AS payment_method_kind
    FROM payments pay
    JOIN treatments t ON t.id = pay.treatment_id
    JOIN patients p ON p.id = t.patient_id
    JOIN payment_methods m ON m.id = pay.payment_method_id
"#;

impl Database {
    pub async fn insert_payment(
        conn: &mut PgConnection,
        company_id: Uuid,
        req: &CreatePaymentRequest,
        paid_at: DateTime<Utc>,
        created_by: Uuid,
    ) -> Result<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments
                (company_id, treatment_id, payment_method_id, amount, paid_at,
                 receipt_number, status, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'completed', $7, $8)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(req.treatment_id)
        .bind(req.payment_method_id)
        .bind(req.amount)
        .bind(paid_at)
        .bind(&req.receipt_number)
        .bind(&req.notes)
        .bind(created_by)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn update_payment_fields(
        conn: &mut PgConnection,
        id: Uuid,
        amount: Decimal,
        payment_method_id: Uuid,
        receipt_number: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET
                amount = $2, payment_method_id = $3, receipt_number = $4, notes = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(payment_method_id)
        .bind(receipt_number)
        .bind(notes)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn set_payment_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn insert_payment_history(
        conn: &mut PgConnection,
        entry: &NewPaymentHistory,
    ) -> Result<PaymentHistory> {
        let row = sqlx::query_as::<_, PaymentHistory>(
            r#"
            INSERT INTO payment_history
                (payment_id, action, previous_status, new_status, previous_amount, new_amount,
                 notes, performed_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(entry.payment_id)
        .bind(entry.action)
        .bind(entry.previous_status)
        .bind(entry.new_status)
        .bind(entry.previous_amount)
        .bind(entry.new_amount)
        .bind(&entry.notes)
        .bind(entry.performed_by)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    /// Lecture verrouillée d'un paiement de l'entreprise
    pub async fn lock_payment(conn: &mut PgConnection, company_id: Uuid, id: Uuid) -> Result<Payment> {
        sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment".to_string()))
    }

    pub async fn get_payment_detail(&self, company_id: Uuid, id: Uuid) -> Result<PaymentDetail> {
        let sql = format!("{} WHERE pay.id = $1 AND pay.company_id = $2", PAYMENT_DETAIL_SELECT);
        sqlx::query_as::<_, PaymentDetail>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment".to_string()))
    }

    pub async fn list_payment_history(&self, payment_id: Uuid) -> Result<Vec<PaymentHistory>> {
        let rows = sqlx::query_as::<_, PaymentHistory>(
            "SELECT * FROM payment_history WHERE payment_id = $1 ORDER BY created_at",
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_payment_details(
        &self,
        company_id: Uuid,
        filter: &PaymentFilter,
    ) -> Result<Vec<PaymentDetail>> {
        let sql = format!(
            r#"{}
            WHERE pay.company_id = $1
              AND ($2::date IS NULL OR pay.paid_at::date >= $2)
              AND ($3::date IS NULL OR pay.paid_at::date <= $3)
              AND ($4::payment_status IS NULL OR pay.status = $4)
              AND ($5::uuid IS NULL OR pay.payment_method_id = $5)
              AND ($6::uuid IS NULL OR t.patient_id = $6)
              AND ($7::uuid IS NULL OR pay.treatment_id = $7)
            ORDER BY pay.paid_at DESC
            "#,
            PAYMENT_DETAIL_SELECT
        );

        let rows = sqlx::query_as::<_, PaymentDetail>(&sql)
            .bind(company_id)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(filter.status)
            .bind(filter.payment_method_id)
            .bind(filter.patient_id)
            .bind(filter.treatment_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
