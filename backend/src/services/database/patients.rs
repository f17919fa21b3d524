// services/database/patients.rs
use super::Database;
use crate::models::{ClinicalRecord, ClinicalRecordRequest, Patient, PatientFilter, PatientRequest};
use crate::utils::error::{AppError, Result};
use uuid::Uuid;

impl Database {
    // === PATIENTS ===

    pub async fn create_patient(&self, company_id: Uuid, req: &PatientRequest) -> Result<Patient> {
        let row = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients
                (company_id, first_name, last_name, document, gender, birth_date,
                 phone, email, address, commune, city, insurer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.document)
        .bind(req.gender)
        .bind(req.birth_date)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.address)
        .bind(&req.commune)
        .bind(&req.city)
        .bind(req.insurer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_patient(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: &PatientRequest,
    ) -> Result<Patient> {
        sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients SET
                first_name = $3, last_name = $4, document = $5, gender = $6, birth_date = $7,
                phone = $8, email = $9, address = $10, commune = $11, city = $12,
                insurer_id = $13, updated_at = NOW()
            WHERE id = $2 AND company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.document)
        .bind(req.gender)
        .bind(req.birth_date)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.address)
        .bind(&req.commune)
        .bind(&req.city)
        .bind(req.insurer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Patient".to_string()))
    }

    pub async fn get_patient(&self, company_id: Uuid, id: Uuid) -> Result<Patient> {
        sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Patient".to_string()))
    }

    pub async fn list_patients(&self, company_id: Uuid, filter: &PatientFilter) -> Result<Vec<Patient>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let rows = sqlx::query_as::<_, Patient>(
            r#"
            SELECT * FROM patients
            WHERE company_id = $1
              AND ($2 OR is_active)
              AND ($3::text IS NULL
                   OR first_name ILIKE '%' || $3 || '%'
                   OR last_name ILIKE '%' || $3 || '%'
                   OR document ILIKE '%' || $3 || '%')
            ORDER BY last_name, first_name
            "#,
        )
        .bind(company_id)
        .bind(filter.include_inactive)
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn set_patient_active(&self, company_id: Uuid, id: Uuid, is_active: bool) -> Result<()> {
        let result = sqlx::query(
            "UPDATE patients SET is_active = $3, updated_at = NOW() WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .bind(is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Patient".to_string()));
        }
        Ok(())
    }

    /// Document déjà attribué à un autre patient
    pub async fn patient_document_taken(&self, document: &str, exclude: Option<Uuid>) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM patients WHERE document = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(document)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    // === DOSSIER CLINIQUE ===

    pub async fn create_clinical_record(
        &self,
        patient_id: Uuid,
        req: &ClinicalRecordRequest,
    ) -> Result<ClinicalRecord> {
        let row = sqlx::query_as::<_, ClinicalRecord>(
            r#"
            INSERT INTO clinical_records (patient_id, record_date, kind, description, notes, professional_id)
            VALUES ($1, COALESCE($2, CURRENT_DATE), $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(patient_id)
        .bind(req.record_date)
        .bind(req.kind)
        .bind(&req.description)
        .bind(&req.notes)
        .bind(req.professional_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Plus récentes en premier
    pub async fn list_clinical_records(&self, patient_id: Uuid) -> Result<Vec<ClinicalRecord>> {
        let rows = sqlx::query_as::<_, ClinicalRecord>(
            "SELECT * FROM clinical_records WHERE patient_id = $1 ORDER BY record_date DESC, created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
