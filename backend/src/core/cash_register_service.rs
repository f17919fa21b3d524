// core/cash_register_service.rs
use crate::models::{
    reconcile, CashClosingDetail, CashClosingFilter, CashClosingList, CashClosingView,
    CloseCashRegisterRequest, KindTotals, OpenCashRegisterRequest,
};
use crate::services::database::{ClosingFigures, Database};
use crate::utils::error::{AppError, Result};
use crate::utils::helpers::format_clp;
use crate::utils::validation::validate_money;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub struct CashRegisterService {
    db: Arc<Database>,
}

impl CashRegisterService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Ouverture; une seule caisse ouverte par entreprise
    pub async fn open_register(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        req: OpenCashRegisterRequest,
    ) -> Result<CashClosingView> {
        req.validate()?;
        validate_money(req.opening_amount, "opening_amount")?;
        if let Some(branch_id) = req.branch_id {
            self.db.get_branch(company_id, branch_id).await?;
        }

        let mut tx = self.db.begin().await?;
        if let Some(open) = Database::find_open_closing(&mut *tx, company_id).await? {
            warn!("Caisse déjà ouverte: {} (entreprise {})", open.id, company_id);
            return Err(AppError::CashRegisterAlreadyOpen);
        }
        let closing = Database::insert_closing(&mut *tx, company_id, &req, user_id).await?;
        tx.commit().await?;

        info!(
            "🧾 Caisse ouverte: {} (fond {})",
            closing.id,
            format_clp(closing.opening_amount)
        );
        Ok(closing.into())
    }

    /// Clôture: totaux du jour par famille, écart, rattachement des paiements
    pub async fn close_register(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        id: Uuid,
        req: CloseCashRegisterRequest,
    ) -> Result<CashClosingDetail> {
        req.validate()?;
        validate_money(req.closing_amount, "closing_amount")?;

        let mut tx = self.db.begin().await?;
        let open = Database::find_open_closing(&mut *tx, company_id)
            .await?
            .filter(|c| c.id == id)
            .ok_or(AppError::CashRegisterNotOpen)?;

        let rows = Database::day_totals_by_kind(&mut *tx, company_id, open.closing_date).await?;
        let totals = KindTotals::from_rows(rows);
        let difference = reconcile(open.opening_amount, req.closing_amount, &totals);

        let closed = Database::close_closing(
            &mut *tx,
            id,
            &ClosingFigures {
                closing_amount: req.closing_amount,
                totals,
                difference,
                notes: req.notes.as_deref(),
                closed_by: user_id,
            },
        )
        .await?;
        let linked = Database::link_day_payments(&mut *tx, id, company_id, open.closing_date).await?;
        tx.commit().await?;

        if !difference.is_zero() {
            warn!("Écart de caisse {} sur la clôture {}", difference, id);
        }
        info!(
            "🔒 Caisse clôturée: {} ({} paiement(s), encaissé {})",
            closed.id,
            linked,
            format_clp(totals.sum())
        );
        self.get_register(company_id, id).await
    }

    pub async fn list_registers(
        &self,
        company_id: Uuid,
        filter: &CashClosingFilter,
    ) -> Result<CashClosingList> {
        let closings = self.db.list_closings(company_id, filter).await?;

        let mut conn = self.db.pool().acquire().await?;
        let open = Database::find_open_closing(&mut *conn, company_id).await?;

        Ok(CashClosingList {
            has_open_register: open.is_some(),
            open_register: open.map(CashClosingView::from),
            closings: closings.into_iter().map(CashClosingView::from).collect(),
        })
    }

    pub async fn get_register(&self, company_id: Uuid, id: Uuid) -> Result<CashClosingDetail> {
        let closing = self.db.get_closing(company_id, id).await?;
        let payments = self.db.list_closing_payments(id).await?;
        Ok(CashClosingDetail {
            closing: closing.into(),
            payments,
        })
    }
}
