// core/treatment_service.rs
use crate::models::{
    outstanding_balance, resolve_professional, status_after_payments, treatment_total,
    CreateTreatmentRequest, Treatment, TreatmentDetail, TreatmentFilter, TreatmentItemRequest,
    TreatmentItemView, TreatmentStatus, TreatmentSummary, UpdateTreatmentRequest,
};
use crate::services::database::{Database, NewTreatment, NewTreatmentItem};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_discount_percent;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// Ligne validée, avec le prix de l'acte figé
struct PricedItem {
    request: TreatmentItemRequest,
    unit_price: Decimal,
}

pub struct TreatmentService {
    db: Arc<Database>,
}

impl TreatmentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Création du traitement et de ses lignes dans une seule transaction
    pub async fn create_treatment(
        &self,
        company_id: Uuid,
        created_by: Uuid,
        req: CreateTreatmentRequest,
    ) -> Result<TreatmentDetail> {
        req.validate()?;
        if req.items.is_empty() {
            return Err(AppError::Validation("items: at least one item is required".to_string()));
        }

        let patient = self.db.get_patient(company_id, req.patient_id).await?;
        if !patient.is_active {
            return Err(AppError::Validation("patient_id: patient is inactive".to_string()));
        }
        let professional_id = resolve_professional(&req.items)?;
        let priced = self.price_items(company_id, &req.items).await?;

        let mut tx = self.db.begin().await?;
        let treatment = Database::insert_treatment(
            &mut *tx,
            &NewTreatment {
                company_id,
                patient_id: req.patient_id,
                professional_id,
                start_date: req.start_date,
                notes: req.notes.as_deref(),
                created_by,
            },
        )
        .await?;

        for item in &priced {
            insert_item(&mut *tx, &treatment, item).await?;
        }
        let total = refresh_total(&mut *tx, &treatment).await?;
        tx.commit().await?;

        info!(
            "🦷 Traitement créé: {} ({} ligne(s), total {})",
            treatment.id,
            priced.len(),
            total
        );
        self.get_treatment(company_id, treatment.id).await
    }

    pub async fn add_item(
        &self,
        company_id: Uuid,
        treatment_id: Uuid,
        req: TreatmentItemRequest,
    ) -> Result<TreatmentDetail> {
        req.validate()?;
        let priced = self.price_items(company_id, std::slice::from_ref(&req)).await?;

        let mut tx = self.db.begin().await?;
        let treatment = Database::lock_treatment(&mut *tx, company_id, treatment_id).await?;
        ensure_editable(&treatment)?;

        for item in &priced {
            insert_item(&mut *tx, &treatment, item).await?;
        }
        let total = refresh_total(&mut *tx, &treatment).await?;
        tx.commit().await?;

        info!("Ligne ajoutée au traitement {} (total {})", treatment_id, total);
        self.get_treatment(company_id, treatment_id).await
    }

    /// Retrait d'une ligne; un traitement garde au moins une ligne
    pub async fn remove_item(
        &self,
        company_id: Uuid,
        treatment_id: Uuid,
        item_id: Uuid,
    ) -> Result<TreatmentDetail> {
        let mut tx = self.db.begin().await?;
        let treatment = Database::lock_treatment(&mut *tx, company_id, treatment_id).await?;
        ensure_editable(&treatment)?;

        let items = Database::list_treatment_items(&mut *tx, treatment_id).await?;
        if !items.iter().any(|i| i.id == item_id) {
            return Err(AppError::NotFound("Treatment item".to_string()));
        }
        if items.len() == 1 {
            return Err(AppError::Validation(
                "items: a treatment must keep at least one item".to_string(),
            ));
        }

        Database::delete_treatment_item(&mut *tx, treatment_id, item_id).await?;
        let total = refresh_total(&mut *tx, &treatment).await?;
        tx.commit().await?;

        info!("Ligne {} retirée du traitement {} (total {})", item_id, treatment_id, total);
        self.get_treatment(company_id, treatment_id).await
    }

    pub async fn update_treatment(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: UpdateTreatmentRequest,
    ) -> Result<TreatmentDetail> {
        req.validate()?;
        let current = self.db.get_treatment_summary(company_id, id).await?;

        if let Some(professional_id) = req.professional_id {
            self.db.get_professional(company_id, professional_id).await?;
        }
        let start = req.start_date.unwrap_or(current.treatment.start_date);
        if let Some(end) = req.end_date.or(current.treatment.end_date) {
            if end < start {
                return Err(AppError::Validation(
                    "end_date: cannot be before start_date".to_string(),
                ));
            }
        }

        let treatment = self.db.update_treatment(company_id, id, &req).await?;
        info!("Traitement mis à jour: {}", treatment.id);
        self.get_treatment(company_id, id).await
    }

    pub async fn change_status(
        &self,
        company_id: Uuid,
        id: Uuid,
        status: TreatmentStatus,
    ) -> Result<TreatmentDetail> {
        let current = self.db.get_treatment_summary(company_id, id).await?;
        if current.treatment.status != status {
            self.db.update_treatment_status(id, status).await?;
            info!("Traitement {}: {:?} -> {:?}", id, current.treatment.status, status);
        }
        self.get_treatment(company_id, id).await
    }

    /// Traitement avec lignes, montant encaissé et solde
    pub async fn get_treatment(&self, company_id: Uuid, id: Uuid) -> Result<TreatmentDetail> {
        let summary = self.db.get_treatment_summary(company_id, id).await?;
        let items = self.db.list_treatment_item_rows(id).await?;

        Ok(TreatmentDetail {
            balance: outstanding_balance(summary.treatment.total_cost, summary.total_paid),
            summary,
            items: items.into_iter().map(TreatmentItemView::from).collect(),
        })
    }

    pub async fn list_treatments(
        &self,
        company_id: Uuid,
        filter: &TreatmentFilter,
    ) -> Result<Vec<TreatmentSummary>> {
        self.db.list_treatment_summaries(company_id, filter).await
    }

    /// Resynchronisation de tous les traitements; renvoie le nombre modifié
    pub async fn sync_all_statuses(&self) -> Result<usize> {
        let rows = self.db.list_treatment_balances().await?;
        let mut updated = 0;

        for row in &rows {
            if let Some(status) = status_after_payments(row.status, row.total_cost, row.total_paid, true) {
                self.db.update_treatment_status(row.id, status).await?;
                debug!("Traitement {}: {:?} -> {:?}", row.id, row.status, status);
                updated += 1;
            }
        }

        info!("🔄 Statuts resynchronisés: {}/{} traitement(s)", updated, rows.len());
        Ok(updated)
    }

    /// Contrôle des lignes et lecture du prix courant de chaque acte
    async fn price_items(
        &self,
        company_id: Uuid,
        items: &[TreatmentItemRequest],
    ) -> Result<Vec<PricedItem>> {
        let mut priced = Vec::with_capacity(items.len());

        for item in items {
            validate_discount_percent(item.discount_percent)?;

            let procedure = self.db.get_procedure(item.procedure_id).await?;
            if !procedure.is_active {
                return Err(AppError::Validation(format!(
                    "procedure_id: {} is inactive",
                    procedure.name
                )));
            }
            if let Some(professional_id) = item.professional_id {
                self.db.get_professional(company_id, professional_id).await?;
            }

            priced.push(PricedItem {
                request: item.clone(),
                unit_price: procedure.price,
            });
        }
        Ok(priced)
    }
}

/// Aligne le statut du traitement sur ses paiements encaissés; renvoie le nouvel état si modifié
pub async fn sync_status_with_payments(
    conn: &mut PgConnection,
    treatment: &Treatment,
) -> Result<Option<TreatmentStatus>> {
    let paid = Database::completed_paid(&mut *conn, treatment.id, None).await?;
    let next = status_after_payments(treatment.status, treatment.total_cost, paid, false);

    if let Some(status) = next {
        Database::set_treatment_status(&mut *conn, treatment.id, status).await?;
        info!("Traitement {}: {:?} -> {:?} (payé {})", treatment.id, treatment.status, status, paid);
    }
    Ok(next)
}

fn ensure_editable(treatment: &Treatment) -> Result<()> {
    if treatment.status == TreatmentStatus::Cancelled {
        return Err(AppError::Validation("Cancelled treatments cannot be modified".to_string()));
    }
    Ok(())
}

async fn insert_item(conn: &mut PgConnection, treatment: &Treatment, item: &PricedItem) -> Result<()> {
    Database::insert_treatment_item(
        conn,
        &NewTreatmentItem {
            treatment_id: treatment.id,
            procedure_id: item.request.procedure_id,
            // Sans professionnel, la ligne hérite de celui du traitement
            professional_id: item.request.professional_id.or(Some(treatment.professional_id)),
            quantity: item.request.quantity,
            unit_price: item.unit_price,
            discount_percent: item.request.discount_percent,
            notes: item.request.notes.as_deref(),
        },
    )
    .await?;
    Ok(())
}

/// Recalcule le coût total puis resynchronise le statut
async fn refresh_total(conn: &mut PgConnection, treatment: &Treatment) -> Result<Decimal> {
    let items = Database::list_treatment_items(&mut *conn, treatment.id).await?;
    let total = treatment_total(&items);
    Database::set_treatment_total(&mut *conn, treatment.id, total).await?;

    let updated = Treatment {
        total_cost: total,
        ..treatment.clone()
    };
    sync_status_with_payments(conn, &updated).await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn treatment(status: TreatmentStatus) -> Treatment {
        Treatment {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            start_date: Utc::now().date_naive(),
            end_date: None,
            status,
            notes: None,
            total_cost: Decimal::from(50_000),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cancelled_treatment_is_locked() {
        assert!(ensure_editable(&treatment(TreatmentStatus::Cancelled)).is_err());
        assert!(ensure_editable(&treatment(TreatmentStatus::Completed)).is_ok());
        assert!(ensure_editable(&treatment(TreatmentStatus::Pending)).is_ok());
    }
}
