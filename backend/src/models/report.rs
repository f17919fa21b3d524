use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::catalog::PaymentMethodKind;
use super::treatment::TreatmentStatus;

/// Paramètres communs des rapports
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub professional_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DailyAmount {
    pub day: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub total_patients: i64,
    pub appointments_count: i64,
    pub treatments_count: i64,
    /// Somme des coûts des traitements de la période
    pub revenue: Decimal,
    pub appointments_per_day: Vec<DailyCount>,
    pub treatments_per_day: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusBreakdown {
    pub status: TreatmentStatus,
    pub count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfessionalBreakdown {
    pub professional_id: Uuid,
    pub professional_name: String,
    pub count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreatmentReport {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub professional_id: Option<Uuid>,
    pub total_treatments: i64,
    pub total_revenue: Decimal,
    pub by_status: Vec<StatusBreakdown>,
    pub by_professional: Vec<ProfessionalBreakdown>,
    pub revenue_per_day: Vec<DailyAmount>,
    pub payments_per_day: Vec<DailyAmount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct KindBreakdown {
    pub kind: PaymentMethodKind,
    pub count: i64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentsByKindReport {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub total: Decimal,
    pub by_kind: Vec<KindBreakdown>,
}

impl TreatmentReport {
    /// Totaux déduits de la ventilation par état
    pub fn totals(by_status: &[StatusBreakdown]) -> (i64, Decimal) {
        by_status
            .iter()
            .fold((0, Decimal::ZERO), |(count, revenue), row| {
                (count + row.count, revenue + row.revenue)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_from_status_breakdown() {
        let rows = vec![
            StatusBreakdown {
                status: TreatmentStatus::Completed,
                count: 3,
                revenue: Decimal::from(150_000),
            },
            StatusBreakdown {
                status: TreatmentStatus::Pending,
                count: 2,
                revenue: Decimal::from(40_000),
            },
        ];
        assert_eq!(TreatmentReport::totals(&rows), (5, Decimal::from(190_000)));
        assert_eq!(TreatmentReport::totals(&[]), (0, Decimal::ZERO));
    }
}
