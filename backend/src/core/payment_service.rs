// core/payment_service.rs
use crate::core::treatment_service::sync_status_with_payments;
use crate::models::{
    check_amount_against_balance, outstanding_balance, CreatePaymentRequest, NewPaymentHistory,
    PaymentAction, PaymentDetail, PaymentFilter, PaymentStatus, PaymentWithHistory, TreatmentPaymentSummary,
    TreatmentStatus, UpdatePaymentRequest, VoidPaymentRequest,
};
use crate::services::database::Database;
use crate::services::export::ExportService;
use crate::utils::error::{AppError, Result};
use crate::utils::helpers::format_clp;
use crate::utils::validation::validate_positive_money;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub struct PaymentService {
    db: Arc<Database>,
}

impl PaymentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Encaissement: contrôle du solde, historique et statut du traitement dans une transaction
    pub async fn create_payment(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        req: CreatePaymentRequest,
    ) -> Result<PaymentWithHistory> {
        req.validate()?;
        validate_positive_money(req.amount, "amount")?;
        self.check_method(req.payment_method_id).await?;

        let mut tx = self.db.begin().await?;
        let treatment = Database::lock_treatment(&mut *tx, company_id, req.treatment_id).await?;
        if treatment.status == TreatmentStatus::Cancelled {
            return Err(AppError::Validation(
                "treatment_id: cannot register a payment on a cancelled treatment".to_string(),
            ));
        }

        let paid = Database::completed_paid(&mut *tx, treatment.id, None).await?;
        check_amount_against_balance(req.amount, treatment.total_cost, paid)?;

        let paid_at = req.paid_at.unwrap_or_else(Utc::now);
        let payment = Database::insert_payment(&mut *tx, company_id, &req, paid_at, user_id).await?;
        Database::insert_payment_history(
            &mut *tx,
            &NewPaymentHistory {
                payment_id: payment.id,
                action: PaymentAction::Created,
                previous_status: None,
                new_status: Some(payment.status),
                previous_amount: None,
                new_amount: Some(payment.amount),
                notes: payment.notes.clone(),
                performed_by: user_id,
            },
        )
        .await?;
        sync_status_with_payments(&mut *tx, &treatment).await?;
        tx.commit().await?;

        info!(
            "💰 Paiement enregistré: {} ({} sur traitement {})",
            payment.id,
            format_clp(payment.amount),
            treatment.id
        );
        self.get_payment(company_id, payment.id).await
    }

    /// Modification; le solde se calcule hors paiement modifié
    pub async fn update_payment(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        id: Uuid,
        req: UpdatePaymentRequest,
    ) -> Result<PaymentWithHistory> {
        req.validate()?;
        if let Some(amount) = req.amount {
            validate_positive_money(amount, "amount")?;
        }

        let mut tx = self.db.begin().await?;
        let payment = Database::lock_payment(&mut *tx, company_id, id).await?;
        if payment.status == PaymentStatus::Voided {
            return Err(AppError::Validation("Voided payments cannot be modified".to_string()));
        }
        let treatment = Database::lock_treatment(&mut *tx, company_id, payment.treatment_id).await?;

        let amount = req.amount.unwrap_or(payment.amount);
        let method_id = req.payment_method_id.unwrap_or(payment.payment_method_id);

        let mut changes = Vec::new();
        if method_id != payment.payment_method_id {
            let previous = self.db.get_payment_method(payment.payment_method_id).await?;
            let next = self.check_method(method_id).await?;
            changes.push(format!("Método de pago: {} → {}", previous.name, next));
        }
        if amount != payment.amount {
            changes.push(format!("Monto: {} → {}", payment.amount, amount));
        }

        if payment.status == PaymentStatus::Completed {
            let paid_by_others = Database::completed_paid(&mut *tx, treatment.id, Some(id)).await?;
            check_amount_against_balance(amount, treatment.total_cost, paid_by_others)?;
        }

        let receipt = req.receipt_number.as_deref().or(payment.receipt_number.as_deref());
        let notes = req.notes.as_deref().or(payment.notes.as_deref());
        let updated =
            Database::update_payment_fields(&mut *tx, id, amount, method_id, receipt, notes).await?;

        Database::insert_payment_history(
            &mut *tx,
            &NewPaymentHistory {
                payment_id: id,
                action: PaymentAction::Modified,
                previous_status: Some(payment.status),
                new_status: Some(updated.status),
                previous_amount: Some(payment.amount),
                new_amount: Some(updated.amount),
                notes: (!changes.is_empty()).then(|| changes.join("; ")),
                performed_by: user_id,
            },
        )
        .await?;
        sync_status_with_payments(&mut *tx, &treatment).await?;
        tx.commit().await?;

        info!("Paiement modifié: {}", id);
        self.get_payment(company_id, id).await
    }

    /// Annulation motivée; refusée si déjà annulé
    pub async fn void_payment(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        id: Uuid,
        req: VoidPaymentRequest,
    ) -> Result<PaymentWithHistory> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        let payment = Database::lock_payment(&mut *tx, company_id, id).await?;
        if payment.status == PaymentStatus::Voided {
            return Err(AppError::Conflict("Payment is already voided".to_string()));
        }
        let treatment = Database::lock_treatment(&mut *tx, company_id, payment.treatment_id).await?;

        let voided = Database::set_payment_status(&mut *tx, id, PaymentStatus::Voided).await?;
        Database::insert_payment_history(
            &mut *tx,
            &NewPaymentHistory {
                payment_id: id,
                action: PaymentAction::Voided,
                previous_status: Some(payment.status),
                new_status: Some(voided.status),
                previous_amount: Some(payment.amount),
                new_amount: Some(voided.amount),
                notes: Some(req.reason.trim().to_string()),
                performed_by: user_id,
            },
        )
        .await?;
        sync_status_with_payments(&mut *tx, &treatment).await?;
        tx.commit().await?;

        warn!("Paiement annulé: {} ({})", id, req.reason.trim());
        self.get_payment(company_id, id).await
    }

    pub async fn get_payment(&self, company_id: Uuid, id: Uuid) -> Result<PaymentWithHistory> {
        let detail = self.db.get_payment_detail(company_id, id).await?;
        let history = self.db.list_payment_history(id).await?;
        Ok(PaymentWithHistory { detail, history })
    }

    pub async fn list_payments(
        &self,
        company_id: Uuid,
        filter: &PaymentFilter,
    ) -> Result<Vec<PaymentDetail>> {
        self.db.list_payment_details(company_id, filter).await
    }

    /// Total, encaissé et solde d'un traitement avec ses paiements
    pub async fn treatment_summary(
        &self,
        company_id: Uuid,
        treatment_id: Uuid,
    ) -> Result<TreatmentPaymentSummary> {
        let summary = self.db.get_treatment_summary(company_id, treatment_id).await?;
        let filter = PaymentFilter {
            treatment_id: Some(treatment_id),
            ..Default::default()
        };
        let payments = self.db.list_payment_details(company_id, &filter).await?;

        Ok(TreatmentPaymentSummary {
            treatment_id,
            total_cost: summary.treatment.total_cost,
            total_paid: summary.total_paid,
            balance: outstanding_balance(summary.treatment.total_cost, summary.total_paid),
            status: summary.treatment.status,
            payments,
        })
    }

    /// Classeur Excel des paiements filtrés
    pub async fn export_payments(&self, company_id: Uuid, filter: &PaymentFilter) -> Result<Vec<u8>> {
        let payments = self.db.list_payment_details(company_id, filter).await?;
        info!("📤 Export de {} paiement(s)", payments.len());
        ExportService::payments_workbook(&payments)
    }

    /// Moyen de paiement actif; renvoie son nom
    async fn check_method(&self, id: Uuid) -> Result<String> {
        let method = self.db.get_payment_method(id).await?;
        if !method.is_active {
            return Err(AppError::Validation(format!(
                "payment_method_id: {} is inactive",
                method.name
            )));
        }
        Ok(method.name)
    }
}
