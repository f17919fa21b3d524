// core/lab_service.rs
use crate::models::{
    CreateLabJobRequest, LabJobDetail, LabJobFilter, LabJobStatus, LabJobStatusRequest,
    LabJobSummary, Laboratory, LaboratoryRequest, UpdateLabJobRequest,
};
use crate::services::database::Database;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::normalize_phone;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const CREATED_EVENT_NOTE: &str = "Trabajo registrado";

pub struct LabService {
    db: Arc<Database>,
}

impl LabService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    // === LABORATOIRES ===

    pub async fn list_laboratories(&self, include_inactive: bool) -> Result<Vec<Laboratory>> {
        self.db.list_laboratories(include_inactive).await
    }

    pub async fn get_laboratory(&self, id: Uuid) -> Result<Laboratory> {
        self.db.get_laboratory(id).await
    }

    pub async fn create_laboratory(
        &self,
        user_id: Uuid,
        req: LaboratoryRequest,
    ) -> Result<Laboratory> {
        req.validate()?;
        let req = normalize_laboratory(req);

        let laboratory = self.db.create_laboratory(&req, user_id).await?;
        info!("🔬 Laboratoire créé: {} ({})", laboratory.name, laboratory.id);
        Ok(laboratory)
    }

    pub async fn update_laboratory(&self, id: Uuid, req: LaboratoryRequest) -> Result<Laboratory> {
        req.validate()?;
        let req = normalize_laboratory(req);
        self.db.update_laboratory(id, &req).await
    }

    pub async fn deactivate_laboratory(&self, id: Uuid) -> Result<Laboratory> {
        let laboratory = self.db.set_laboratory_active(id, false).await?;
        info!("Laboratoire désactivé: {}", id);
        Ok(laboratory)
    }

    // === TRAVAUX ===

    /// Création en attente, avec une première entrée de suivi
    pub async fn create_job(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        req: CreateLabJobRequest,
    ) -> Result<LabJobDetail> {
        req.validate()?;
        if req.estimated_delivery_date < Self::today() {
            return Err(AppError::Validation(
                "estimated_delivery_date: cannot be before today".to_string(),
            ));
        }
        self.check_references(company_id, req.laboratory_id, req.patient_id, req.professional_id)
            .await?;

        let mut tx = self.db.begin().await?;
        let job = Database::insert_lab_job(&mut *tx, company_id, &req, user_id).await?;
        Database::insert_lab_job_event(&mut *tx, job.id, job.status, CREATED_EVENT_NOTE, user_id)
            .await?;
        tx.commit().await?;

        info!("Travail de laboratoire créé: {} ({:?})", job.id, job.kind);
        self.get_job(company_id, job.id).await
    }

    pub async fn update_job(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: UpdateLabJobRequest,
    ) -> Result<LabJobDetail> {
        req.validate()?;
        let current = self.db.get_lab_job_summary(company_id, id).await?;
        if current.job.status.is_terminal() {
            return Err(AppError::Validation(format!(
                "Lab job is {} and can no longer be modified",
                current.job.status.as_str()
            )));
        }
        if let Some(laboratory_id) = req.laboratory_id {
            self.check_laboratory(laboratory_id).await?;
        }

        self.db.update_lab_job(company_id, id, &req).await?;
        info!("Travail de laboratoire mis à jour: {}", id);
        self.get_job(company_id, id).await
    }

    pub async fn get_job(&self, company_id: Uuid, id: Uuid) -> Result<LabJobDetail> {
        let summary = self.db.get_lab_job_summary(company_id, id).await?;
        let events = self.db.list_lab_job_events(id).await?;

        Ok(LabJobDetail {
            is_overdue: summary.job.is_overdue(Self::today()),
            summary,
            events,
        })
    }

    pub async fn list_jobs(&self, company_id: Uuid, filter: &LabJobFilter) -> Result<Vec<LabJobSummary>> {
        self.db.list_lab_job_summaries(company_id, filter).await
    }

    pub async fn overdue_jobs(&self, company_id: Uuid) -> Result<Vec<LabJobSummary>> {
        self.db.list_overdue_lab_jobs(company_id, Self::today()).await
    }

    /// Changement d'état avec note de suivi, dans une transaction
    pub async fn change_status(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        id: Uuid,
        req: LabJobStatusRequest,
    ) -> Result<LabJobDetail> {
        req.validate()?;
        let notes = req.notes.trim();
        if notes.is_empty() {
            return Err(AppError::Validation("notes: cannot be empty".to_string()));
        }

        let mut tx = self.db.begin().await?;
        let job = Database::lock_lab_job(&mut *tx, company_id, id).await?;
        job.status.check_transition(req.status)?;

        let (sent_date, received_date) = job.stamped_dates(req.status, Self::today());
        let updated =
            Database::set_lab_job_status(&mut *tx, id, req.status, sent_date, received_date).await?;
        Database::insert_lab_job_event(&mut *tx, id, req.status, notes, user_id).await?;
        tx.commit().await?;

        info!("Travail {}: {} -> {}", id, job.status.as_str(), updated.status.as_str());
        self.get_job(company_id, id).await
    }

    async fn check_references(
        &self,
        company_id: Uuid,
        laboratory_id: Uuid,
        patient_id: Uuid,
        professional_id: Uuid,
    ) -> Result<()> {
        self.check_laboratory(laboratory_id).await?;
        self.db.get_patient(company_id, patient_id).await?;
        self.db.get_professional(company_id, professional_id).await?;
        Ok(())
    }

    async fn check_laboratory(&self, id: Uuid) -> Result<()> {
        let laboratory = self.db.get_laboratory(id).await?;
        if !laboratory.is_active {
            return Err(AppError::Validation(format!(
                "laboratory_id: {} is inactive",
                laboratory.name
            )));
        }
        Ok(())
    }
}

fn normalize_laboratory(mut req: LaboratoryRequest) -> LaboratoryRequest {
    req.name = req.name.trim().to_string();
    req.contact = req.contact.trim().to_string();
    req.phone = normalize_phone(&req.phone);
    req.address = req.address.trim().to_string();
    req.email = req
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    req
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_laboratory() {
        let req = LaboratoryRequest {
            name: "  Lab Dental Sur ".into(),
            contact: "María Soto ".into(),
            phone: "+56 2 2345 6789".into(),
            email: Some(" Contacto@LabSur.cl".into()),
            address: " Av. Matta 123 ".into(),
            is_active: None,
        };

        let req = normalize_laboratory(req);
        assert_eq!(req.name, "Lab Dental Sur");
        assert_eq!(req.contact, "María Soto");
        assert_eq!(req.phone, "+56223456789");
        assert_eq!(req.email.as_deref(), Some("contacto@labsur.cl"));
        assert_eq!(req.address, "Av. Matta 123");
    }

    #[test]
    fn test_cancelled_job_rejects_further_moves() {
        assert!(LabJobStatus::Cancelled.check_transition(LabJobStatus::Sent).is_err());
        assert!(LabJobStatus::Pending.check_transition(LabJobStatus::Sent).is_ok());
    }
}
