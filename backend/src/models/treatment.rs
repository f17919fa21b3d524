use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::error::{AppError, Result};

/// État d'un traitement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "treatment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
    Pending,     // En attente
    InProgress,  // En cours
    Completed,   // Terminé
    Cancelled,   // Annulé
}

impl TreatmentStatus {
    /// Libellé affiché dans les exports
    pub fn label(&self) -> &'static str {
        match self {
            TreatmentStatus::Pending => "Pendiente",
            TreatmentStatus::InProgress => "En Progreso",
            TreatmentStatus::Completed => "Completado",
            TreatmentStatus::Cancelled => "Cancelado",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Treatment {
    pub id: Uuid,
    pub company_id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: TreatmentStatus,
    pub notes: Option<String>,
    /// Somme des totaux de lignes
    pub total_cost: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ligne d'un traitement; le prix unitaire est figé à l'ajout
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TreatmentItem {
    pub id: Uuid,
    pub treatment_id: Uuid,
    pub procedure_id: Uuid,
    pub professional_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Montants calculés d'une ligne
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineAmounts {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// sous-total = prix × quantité; remise = sous-total × % / 100; total = sous-total − remise
pub fn line_amounts(unit_price: Decimal, quantity: i32, discount_percent: Decimal) -> LineAmounts {
    let subtotal = unit_price * Decimal::from(quantity);
    let discount = (subtotal * discount_percent / Decimal::ONE_HUNDRED).round_dp(2);
    LineAmounts {
        subtotal,
        discount,
        total: subtotal - discount,
    }
}

impl TreatmentItem {
    pub fn amounts(&self) -> LineAmounts {
        line_amounts(self.unit_price, self.quantity, self.discount_percent)
    }
}

/// Coût total d'un traitement
pub fn treatment_total(items: &[TreatmentItem]) -> Decimal {
    items.iter().map(|item| item.amounts().total).sum()
}

/// Professionnel du traitement: celui de la première ligne qui en nomme un
pub fn resolve_professional(items: &[TreatmentItemRequest]) -> Result<Uuid> {
    items
        .iter()
        .find_map(|item| item.professional_id)
        .ok_or_else(|| {
            AppError::Validation(
                "items: at least one item must name a professional".to_string(),
            )
        })
}

/// Nouvel état après un changement de paiements; `None` si inchangé.
/// `promote_pending` fait passer un traitement en attente partiellement payé à "en cours".
pub fn status_after_payments(
    current: TreatmentStatus,
    total_cost: Decimal,
    total_paid: Decimal,
    promote_pending: bool,
) -> Option<TreatmentStatus> {
    if current == TreatmentStatus::Cancelled {
        return None;
    }

    // Un traitement à coût nul est soldé d'office
    let target = if total_paid >= total_cost {
        TreatmentStatus::Completed
    } else if current == TreatmentStatus::Completed {
        TreatmentStatus::InProgress
    } else if promote_pending && current == TreatmentStatus::Pending && total_paid > Decimal::ZERO {
        TreatmentStatus::InProgress
    } else {
        current
    };

    (target != current).then_some(target)
}

/// État financier d'un traitement, pour la resynchronisation en lot
#[derive(Debug, Clone, FromRow)]
pub struct TreatmentBalanceRow {
    pub id: Uuid,
    pub status: TreatmentStatus,
    pub total_cost: Decimal,
    pub total_paid: Decimal,
}

/// Ligne enrichie pour l'affichage
#[derive(Debug, Clone, Serialize)]
pub struct TreatmentItemView {
    #[serde(flatten)]
    pub item: TreatmentItem,
    pub procedure_name: String,
    #[serde(flatten)]
    pub amounts: LineAmounts,
}

#[derive(Debug, Clone, FromRow)]
pub struct TreatmentItemRow {
    #[sqlx(flatten)]
    pub item: TreatmentItem,
    pub procedure_name: String,
}

impl From<TreatmentItemRow> for TreatmentItemView {
    fn from(row: TreatmentItemRow) -> Self {
        Self {
            amounts: row.item.amounts(),
            item: row.item,
            procedure_name: row.procedure_name,
        }
    }
}

/// Traitement avec noms, pour les listes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TreatmentSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub treatment: Treatment,
    pub patient_name: String,
    pub professional_name: String,
    pub total_paid: Decimal,
}

/// Traitement complet avec lignes et solde
#[derive(Debug, Clone, Serialize)]
pub struct TreatmentDetail {
    #[serde(flatten)]
    pub summary: TreatmentSummary,
    pub balance: Decimal,
    pub items: Vec<TreatmentItemView>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TreatmentItemRequest {
    pub procedure_id: Uuid,
    pub professional_id: Option<Uuid>,
    #[validate(range(min = 1, message = "La quantité doit être au moins 1"))]
    pub quantity: i32,
    #[serde(default)]
    pub discount_percent: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTreatmentRequest {
    pub patient_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Au moins une ligne (vérifié par le service)
    #[validate]
    pub items: Vec<TreatmentItemRequest>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTreatmentRequest {
    pub professional_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreatmentStatusRequest {
    pub status: TreatmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreatmentFilter {
    pub patient_id: Option<Uuid>,
    pub professional_id: Option<Uuid>,
    pub status: Option<TreatmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: i32, discount: i64) -> TreatmentItem {
        TreatmentItem {
            id: Uuid::new_v4(),
            treatment_id: Uuid::new_v4(),
            procedure_id: Uuid::new_v4(),
            professional_id: None,
            quantity,
            unit_price: Decimal::from(price),
            discount_percent: Decimal::from(discount),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_amounts() {
        let amounts = line_amounts(Decimal::from(30_000), 2, Decimal::from(10));
        assert_eq!(amounts.subtotal, Decimal::from(60_000));
        assert_eq!(amounts.discount, Decimal::from(6_000));
        assert_eq!(amounts.total, Decimal::from(54_000));

        let no_discount = line_amounts(Decimal::new(1999, 2), 3, Decimal::ZERO);
        assert_eq!(no_discount.total, Decimal::new(5997, 2));
    }

    #[test]
    fn test_treatment_total_sums_lines() {
        let items = vec![item(30_000, 2, 10), item(15_000, 1, 0), item(10_000, 1, 100)];
        assert_eq!(treatment_total(&items), Decimal::from(69_000));
        assert_eq!(treatment_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_resolve_professional_uses_first_named() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let req = |professional_id| TreatmentItemRequest {
            procedure_id: Uuid::new_v4(),
            professional_id,
            quantity: 1,
            discount_percent: Decimal::ZERO,
            notes: None,
        };

        let items = vec![req(None), req(Some(first)), req(Some(second))];
        assert_eq!(resolve_professional(&items).unwrap(), first);
        assert!(resolve_professional(&[req(None)]).is_err());
    }

    #[test]
    fn test_status_after_payments() {
        use TreatmentStatus::*;
        let total = Decimal::from(100_000);

        assert_eq!(status_after_payments(InProgress, total, total, false), Some(Completed));
        assert_eq!(
            status_after_payments(Completed, total, Decimal::from(40_000), false),
            Some(InProgress)
        );
        assert_eq!(status_after_payments(Pending, total, Decimal::from(40_000), false), None);
        assert_eq!(
            status_after_payments(Pending, total, Decimal::from(40_000), true),
            Some(InProgress)
        );
        assert_eq!(status_after_payments(Cancelled, total, total, true), None);
    }

    #[test]
    fn test_zero_cost_treatment_counts_as_paid() {
        use TreatmentStatus::*;

        assert_eq!(
            status_after_payments(Pending, Decimal::ZERO, Decimal::ZERO, false),
            Some(Completed)
        );
        assert_eq!(
            status_after_payments(InProgress, Decimal::ZERO, Decimal::ZERO, true),
            Some(Completed)
        );
        // Retirer une ligne ne fait plus retomber un traitement gratuit en cours
        assert_eq!(status_after_payments(Completed, Decimal::ZERO, Decimal::ZERO, false), None);
        assert_eq!(status_after_payments(Cancelled, Decimal::ZERO, Decimal::ZERO, true), None);
    }
}
