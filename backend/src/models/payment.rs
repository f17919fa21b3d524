use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::catalog::PaymentMethodKind;
use super::treatment::TreatmentStatus;
use crate::utils::error::{AppError, Result};
use crate::utils::helpers::{deserialize_money, deserialize_money_opt};
use crate::utils::validation::validate_money_field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,    // En attente
    Completed,  // Encaissé
    Voided,     // Annulé
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pendiente",
            PaymentStatus::Completed => "Completado",
            PaymentStatus::Voided => "Anulado",
        }
    }
}

/// Action tracée dans l'historique d'un paiement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentAction {
    Created,
    Modified,
    Voided,
}

/// Paiement d'un traitement
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub company_id: Uuid,
    pub treatment_id: Uuid,
    pub payment_method_id: Uuid,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub receipt_number: Option<String>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentHistory {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub action: PaymentAction,
    pub previous_status: Option<PaymentStatus>,
    pub new_status: Option<PaymentStatus>,
    pub previous_amount: Option<Decimal>,
    pub new_amount: Option<Decimal>,
    pub notes: Option<String>,
    pub performed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Entrée d'historique à insérer
#[derive(Debug, Clone)]
pub struct NewPaymentHistory {
    pub payment_id: Uuid,
    pub action: PaymentAction,
    pub previous_status: Option<PaymentStatus>,
    pub new_status: Option<PaymentStatus>,
    pub previous_amount: Option<Decimal>,
    pub new_amount: Option<Decimal>,
    pub notes: Option<String>,
    pub performed_by: Uuid,
}

/// Solde restant dû
pub fn outstanding_balance(total_cost: Decimal, completed_paid: Decimal) -> Decimal {
    (total_cost - completed_paid).max(Decimal::ZERO)
}

/// Vérifie qu'un montant est positif et ne dépasse pas le solde.
/// `completed_paid` exclut déjà le paiement modifié.
pub fn check_amount_against_balance(
    amount: Decimal,
    total_cost: Decimal,
    completed_paid: Decimal,
) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation("amount: must be greater than zero".to_string()));
    }

    let balance = outstanding_balance(total_cost, completed_paid);
    if amount > balance {
        return Err(AppError::PaymentExceedsBalance { amount, balance });
    }
    Ok(())
}

/// Paiement enrichi pour les listes et l'export
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub treatment_status: TreatmentStatus,
    pub payment_method_name: String,
    pub payment_method_kind: PaymentMethodKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentWithHistory {
    #[serde(flatten)]
    pub detail: PaymentDetail,
    pub history: Vec<PaymentHistory>,
}

/// Situation financière d'un traitement
#[derive(Debug, Clone, Serialize)]
pub struct TreatmentPaymentSummary {
    pub treatment_id: Uuid,
    pub total_cost: Decimal,
    pub total_paid: Decimal,
    pub balance: Decimal,
    pub status: TreatmentStatus,
    pub payments: Vec<PaymentDetail>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub treatment_id: Uuid,
    pub payment_method_id: Uuid,
    #[serde(deserialize_with = "deserialize_money")]
    #[validate(custom = "validate_money_field")]
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    #[validate(length(max = 50))]
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    #[serde(default, deserialize_with = "deserialize_money_opt")]
    #[validate(custom = "validate_money_field")]
    pub amount: Option<Decimal>,
    pub payment_method_id: Option<Uuid>,
    #[validate(length(max = 50))]
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VoidPaymentRequest {
    #[validate(length(min = 1, message = "Le motif d'annulation est obligatoire"))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<PaymentStatus>,
    pub payment_method_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub treatment_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_within_balance() {
        let total = Decimal::from(100_000);
        assert!(check_amount_against_balance(Decimal::from(60_000), total, Decimal::from(40_000)).is_ok());
        assert!(check_amount_against_balance(Decimal::from(1), total, Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_amount_exceeding_balance() {
        let err = check_amount_against_balance(
            Decimal::from(60_001),
            Decimal::from(100_000),
            Decimal::from(40_000),
        )
        .unwrap_err();

        match err {
            AppError::PaymentExceedsBalance { amount, balance } => {
                assert_eq!(amount, Decimal::from(60_001));
                assert_eq!(balance, Decimal::from(60_000));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_and_negative_amounts_rejected() {
        let total = Decimal::from(10_000);
        assert!(matches!(
            check_amount_against_balance(Decimal::ZERO, total, Decimal::ZERO),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            check_amount_against_balance(Decimal::from(-5), total, Decimal::ZERO),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_overpaid_treatment_has_zero_balance() {
        assert_eq!(
            outstanding_balance(Decimal::from(10_000), Decimal::from(12_000)),
            Decimal::ZERO
        );
    }
}
