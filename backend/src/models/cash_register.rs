use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::catalog::PaymentMethodKind;
use super::payment::PaymentDetail;
use crate::utils::helpers::deserialize_money;
use crate::utils::validation::validate_money_field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "cash_closing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CashClosingStatus {
    Open,    // Caisse ouverte
    Closed,  // Caisse clôturée
}

/// Ouverture / clôture de caisse
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CashClosing {
    pub id: Uuid,
    pub company_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub closing_date: NaiveDate,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub opening_amount: Decimal,
    pub closing_amount: Option<Decimal>,
    pub total_cash: Decimal,
    pub total_card: Decimal,
    pub total_transfer: Decimal,
    pub total_other: Decimal,
    pub difference: Decimal,
    pub notes: Option<String>,
    pub opened_by: Option<Uuid>,
    pub closed_by: Option<Uuid>,
    pub status: CashClosingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Totaux encaissés par famille de moyen de paiement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindTotals {
    pub cash: Decimal,
    pub card: Decimal,
    pub transfer: Decimal,
    pub other: Decimal,
}

impl KindTotals {
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (PaymentMethodKind, Decimal)>,
    {
        rows.into_iter()
            .fold(KindTotals::default(), |mut totals, (kind, amount)| {
                match kind {
                    PaymentMethodKind::Cash => totals.cash += amount,
                    PaymentMethodKind::Card => totals.card += amount,
                    PaymentMethodKind::Transfer => totals.transfer += amount,
                    PaymentMethodKind::Other => totals.other += amount,
                }
                totals
            })
    }

    pub fn sum(&self) -> Decimal {
        self.cash + self.card + self.transfer + self.other
    }
}

/// Écart = montant compté − (fond de caisse + encaissements)
pub fn reconcile(opening_amount: Decimal, closing_amount: Decimal, totals: &KindTotals) -> Decimal {
    closing_amount - (opening_amount + totals.sum())
}

impl CashClosing {
    pub fn totals(&self) -> KindTotals {
        KindTotals {
            cash: self.total_cash,
            card: self.total_card,
            transfer: self.total_transfer,
            other: self.total_other,
        }
    }

    /// Solde final = fond + encaissements + écart
    pub fn final_balance(&self) -> Decimal {
        self.opening_amount + self.totals().sum() + self.difference
    }

    pub fn is_open(&self) -> bool {
        self.status == CashClosingStatus::Open
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CashClosingView {
    #[serde(flatten)]
    pub closing: CashClosing,
    pub final_balance: Decimal,
}

impl From<CashClosing> for CashClosingView {
    fn from(closing: CashClosing) -> Self {
        Self {
            final_balance: closing.final_balance(),
            closing,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CashClosingDetail {
    #[serde(flatten)]
    pub closing: CashClosingView,
    pub payments: Vec<PaymentDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashClosingList {
    pub has_open_register: bool,
    pub open_register: Option<CashClosingView>,
    pub closings: Vec<CashClosingView>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OpenCashRegisterRequest {
    pub branch_id: Option<Uuid>,
    #[serde(deserialize_with = "deserialize_money")]
    #[validate(custom = "validate_money_field")]
    pub opening_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CloseCashRegisterRequest {
    #[serde(deserialize_with = "deserialize_money")]
    #[validate(custom = "validate_money_field")]
    pub closing_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CashClosingFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<CashClosingStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_totals_grouped_by_kind() {
        let totals = KindTotals::from_rows(vec![
            (PaymentMethodKind::Cash, d(10_000)),
            (PaymentMethodKind::Card, d(25_000)),
            (PaymentMethodKind::Cash, d(5_000)),
            (PaymentMethodKind::Other, d(1_000)),
        ]);
        assert_eq!(totals.cash, d(15_000));
        assert_eq!(totals.card, d(25_000));
        assert_eq!(totals.transfer, Decimal::ZERO);
        assert_eq!(totals.sum(), d(41_000));
    }

    #[test]
    fn test_reconciliation_difference() {
        let totals = KindTotals {
            cash: d(30_000),
            card: d(20_000),
            transfer: d(10_000),
            other: Decimal::ZERO,
        };
        assert_eq!(reconcile(d(50_000), d(110_000), &totals), Decimal::ZERO);
        assert_eq!(reconcile(d(50_000), d(105_000), &totals), d(-5_000));
        assert_eq!(reconcile(d(50_000), d(112_000), &totals), d(2_000));
    }

    #[test]
    fn test_final_balance() {
        let closing = CashClosing {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            branch_id: None,
            closing_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            opened_at: Utc::now(),
            closed_at: Some(Utc::now()),
            opening_amount: d(50_000),
            closing_amount: Some(d(105_000)),
            total_cash: d(30_000),
            total_card: d(20_000),
            total_transfer: d(10_000),
            total_other: Decimal::ZERO,
            difference: d(-5_000),
            notes: None,
            opened_by: None,
            closed_by: None,
            status: CashClosingStatus::Closed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(closing.final_balance(), d(105_000));
        assert!(!closing.is_open());
    }
}
