// core/report_service.rs
use crate::models::{
    DashboardReport, PaymentsByKindReport, ReportQuery, TreatmentReport,
};
use crate::services::database::Database;
use crate::utils::error::Result;
use crate::utils::helpers::default_report_range;
use crate::utils::validation::validate_date_range;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct ReportService {
    db: Arc<Database>,
    default_days: i64,
}

impl ReportService {
    pub fn new(db: Arc<Database>, default_days: i64) -> Self {
        Self { db, default_days }
    }

    /// Tableau de bord de la période
    pub async fn dashboard(&self, company_id: Uuid, query: &ReportQuery) -> Result<DashboardReport> {
        let (from, to) = resolve_range(query, Utc::now().date_naive(), self.default_days)?;
        debug!("Tableau de bord {} du {} au {}", company_id, from, to);

        let total_patients = self.db.count_active_patients(company_id).await?;
        let appointments_per_day = self.db.appointments_per_day(company_id, from, to).await?;
        let treatments_per_day = self.db.treatments_per_day(company_id, from, to).await?;
        let revenue = self.db.treatment_revenue(company_id, from, to).await?;

        Ok(DashboardReport {
            date_from: from,
            date_to: to,
            total_patients,
            appointments_count: appointments_per_day.iter().map(|d| d.count).sum(),
            treatments_count: treatments_per_day.iter().map(|d| d.count).sum(),
            revenue,
            appointments_per_day,
            treatments_per_day,
        })
    }

    /// Rapport des traitements, filtrable par professionnel
    pub async fn treatment_report(
        &self,
        company_id: Uuid,
        query: &ReportQuery,
    ) -> Result<TreatmentReport> {
        let (from, to) = resolve_range(query, Utc::now().date_naive(), self.default_days)?;
        let professional_id = query.professional_id;
        if let Some(id) = professional_id {
            self.db.get_professional(company_id, id).await?;
        }

        let by_status = self
            .db
            .treatments_by_status(company_id, from, to, professional_id)
            .await?;
        let by_professional = self
            .db
            .treatments_by_professional(company_id, from, to, professional_id)
            .await?;
        let revenue_per_day = self
            .db
            .treatment_revenue_per_day(company_id, from, to, professional_id)
            .await?;
        let payments_per_day = self
            .db
            .payments_per_day(company_id, from, to, professional_id)
            .await?;

        let (total_treatments, total_revenue) = TreatmentReport::totals(&by_status);
        Ok(TreatmentReport {
            date_from: from,
            date_to: to,
            professional_id,
            total_treatments,
            total_revenue,
            by_status,
            by_professional,
            revenue_per_day,
            payments_per_day,
        })
    }

    pub async fn payments_by_kind(
        &self,
        company_id: Uuid,
        query: &ReportQuery,
    ) -> Result<PaymentsByKindReport> {
        let (from, to) = resolve_range(query, Utc::now().date_naive(), self.default_days)?;
        let by_kind = self.db.payments_by_kind(company_id, from, to).await?;

        Ok(PaymentsByKindReport {
            date_from: from,
            date_to: to,
            total: by_kind.iter().map(|k| k.amount).sum::<Decimal>(),
            by_kind,
        })
    }
}

/// Bornes de la période; les bornes absentes se déduisent de la fenêtre par défaut
fn resolve_range(query: &ReportQuery, today: NaiveDate, days: i64) -> Result<(NaiveDate, NaiveDate)> {
    let (from, to) = match (query.date_from, query.date_to) {
        (Some(from), Some(to)) => (from, to),
        (Some(from), None) => (from, today),
        (None, Some(to)) => (to - Duration::days(days), to),
        (None, None) => default_report_range(today, days),
    };
    validate_date_range(from, to)?;
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_resolve_range_defaults() {
        let today = d(2025, 5, 31);
        let query = ReportQuery::default();
        assert_eq!(resolve_range(&query, today, 30).unwrap(), (d(2025, 5, 1), today));
    }

    #[test]
    fn test_resolve_range_partial_bounds() {
        let today = d(2025, 5, 31);
        let only_from = ReportQuery {
            date_from: Some(d(2025, 5, 10)),
            ..Default::default()
        };
        assert_eq!(resolve_range(&only_from, today, 30).unwrap(), (d(2025, 5, 10), today));

        let only_to = ReportQuery {
            date_to: Some(d(2025, 3, 31)),
            ..Default::default()
        };
        assert_eq!(
            resolve_range(&only_to, today, 30).unwrap(),
            (d(2025, 3, 1), d(2025, 3, 31))
        );
    }

    #[test]
    fn test_resolve_range_rejects_inverted_bounds() {
        let query = ReportQuery {
            date_from: Some(d(2025, 6, 1)),
            date_to: Some(d(2025, 5, 1)),
            professional_id: None,
        };
        assert!(resolve_range(&query, d(2025, 6, 10), 30).is_err());
    }
}
