// core/patient_service.rs
use crate::models::{
    ClinicalRecord, ClinicalRecordRequest, PatientFilter, PatientRequest, PatientView,
};
use crate::services::database::Database;
use crate::services::export::ExportService;
use crate::utils::error::{AppError, Result};
use crate::utils::helpers::{uppercase_opt, uppercase_trimmed};
use crate::utils::validation::normalize_phone;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub struct PatientService {
    db: Arc<Database>,
}

impl PatientService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn create_patient(&self, company_id: Uuid, req: PatientRequest) -> Result<PatientView> {
        let req = self.prepare(req, None).await?;
        let patient = self.db.create_patient(company_id, &req).await?;

        info!("🧑 Patient créé: {} ({})", patient.full_name(), patient.id);
        Ok(PatientView::new(patient, Self::today()))
    }

    pub async fn update_patient(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: PatientRequest,
    ) -> Result<PatientView> {
        self.db.get_patient(company_id, id).await?;
        let req = self.prepare(req, Some(id)).await?;
        let patient = self.db.update_patient(company_id, id, &req).await?;

        info!("Patient mis à jour: {}", patient.id);
        Ok(PatientView::new(patient, Self::today()))
    }

    pub async fn get_patient(&self, company_id: Uuid, id: Uuid) -> Result<PatientView> {
        let patient = self.db.get_patient(company_id, id).await?;
        Ok(PatientView::new(patient, Self::today()))
    }

    pub async fn list_patients(
        &self,
        company_id: Uuid,
        filter: &PatientFilter,
    ) -> Result<Vec<PatientView>> {
        let today = Self::today();
        let patients = self.db.list_patients(company_id, filter).await?;
        Ok(patients.into_iter().map(|p| PatientView::new(p, today)).collect())
    }

    pub async fn deactivate_patient(&self, company_id: Uuid, id: Uuid) -> Result<()> {
        self.db.set_patient_active(company_id, id, false).await?;
        info!("Patient désactivé: {}", id);
        Ok(())
    }

    /// Classeur Excel de tous les patients de l'entreprise
    pub async fn export_patients(&self, company_id: Uuid) -> Result<Vec<u8>> {
        let filter = PatientFilter {
            search: None,
            include_inactive: true,
        };
        let patients = self.list_patients(company_id, &filter).await?;
        ExportService::patients_workbook(&patients)
    }

    // === DOSSIER CLINIQUE ===

    pub async fn add_clinical_record(
        &self,
        company_id: Uuid,
        patient_id: Uuid,
        req: ClinicalRecordRequest,
    ) -> Result<ClinicalRecord> {
        req.validate()?;
        self.db.get_patient(company_id, patient_id).await?;
        if let Some(professional_id) = req.professional_id {
            self.db.get_professional(company_id, professional_id).await?;
        }

        let record = self.db.create_clinical_record(patient_id, &req).await?;
        info!("Entrée de dossier clinique ajoutée: patient={} ({:?})", patient_id, record.kind);
        Ok(record)
    }

    pub async fn list_clinical_records(
        &self,
        company_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Vec<ClinicalRecord>> {
        self.db.get_patient(company_id, patient_id).await?;
        self.db.list_clinical_records(patient_id).await
    }

    /// Validation puis normalisation des champs saisis
    async fn prepare(&self, req: PatientRequest, exclude: Option<Uuid>) -> Result<PatientRequest> {
        req.validate()?;
        let req = normalize_patient(req);

        if let Some(document) = req.document.as_deref() {
            if self.db.patient_document_taken(document, exclude).await? {
                return Err(AppError::Conflict(format!(
                    "A patient with document {} already exists",
                    document
                )));
            }
        }
        if let Some(insurer_id) = req.insurer_id {
            self.db.get_insurer(insurer_id).await?;
        }
        Ok(req)
    }
}

/// Noms, commune et ville en majuscules; document et téléphone nettoyés
pub fn normalize_patient(mut req: PatientRequest) -> PatientRequest {
    req.first_name = uppercase_trimmed(&req.first_name);
    req.last_name = uppercase_trimmed(&req.last_name);
    req.commune = uppercase_opt(req.commune.as_deref());
    req.city = uppercase_opt(req.city.as_deref());
    req.document = uppercase_opt(req.document.as_deref());
    req.phone = req.phone.as_deref().map(normalize_phone).filter(|p| !p.is_empty());
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
    fn test_normalize_patient() {
        let req = PatientRequest {
            first_name: "  juan pablo ".into(),
            last_name: "pérez soto".into(),
            document: Some(" 12.345.678-k ".into()),
            gender: None,
            birth_date: None,
            phone: Some("+56 9 1234 5678".into()),
            email: Some(" Juan@Mail.CL ".into()),
            address: None,
            commune: Some("ñuñoa".into()),
            city: Some("  ".into()),
            insurer_id: None,
        };

        let req = normalize_patient(req);
        assert_eq!(req.first_name, "JUAN PABLO");
        assert_eq!(req.last_name, "PÉREZ SOTO");
        assert_eq!(req.document.as_deref(), Some("12.345.678-K"));
        assert_eq!(req.commune.as_deref(), Some("ÑUÑOA"));
        assert_eq!(req.city, None);
        assert_eq!(req.email.as_deref(), Some("juan@mail.cl"));
        assert_eq!(req.phone.as_deref(), Some("+56912345678"));
    }
}
