// core/professional_service.rs
use crate::models::{ProfessionalFilter, ProfessionalRequest, ProfessionalView};
use crate::services::database::Database;
use crate::utils::error::{AppError, Result};
use crate::utils::helpers::uppercase_trimmed;
use crate::utils::validation::{normalize_phone, normalize_rut};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub struct ProfessionalService {
    db: Arc<Database>,
}

impl ProfessionalService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create_professional(
        &self,
        company_id: Uuid,
        req: ProfessionalRequest,
    ) -> Result<ProfessionalView> {
        let req = self.prepare(req, None).await?;
        let professional = self.db.create_professional(company_id, &req).await?;

        info!("🩺 Professionnel créé: {} ({})", professional.full_name(), professional.id);
        Ok(professional.into())
    }

    pub async fn update_professional(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: ProfessionalRequest,
    ) -> Result<ProfessionalView> {
        self.db.get_professional(company_id, id).await?;
        let req = self.prepare(req, Some(id)).await?;
        let professional = self.db.update_professional(company_id, id, &req).await?;

        info!("Professionnel mis à jour: {}", professional.id);
        Ok(professional.into())
    }

    pub async fn get_professional(&self, company_id: Uuid, id: Uuid) -> Result<ProfessionalView> {
        Ok(self.db.get_professional(company_id, id).await?.into())
    }

    pub async fn list_professionals(
        &self,
        company_id: Uuid,
        filter: &ProfessionalFilter,
    ) -> Result<Vec<ProfessionalView>> {
        let rows = self.db.list_professionals(company_id, filter).await?;
        Ok(rows.into_iter().map(ProfessionalView::from).collect())
    }

    pub async fn deactivate_professional(&self, company_id: Uuid, id: Uuid) -> Result<()> {
        self.db.set_professional_active(company_id, id, false).await?;
        info!("Professionnel désactivé: {}", id);
        Ok(())
    }

    async fn prepare(
        &self,
        req: ProfessionalRequest,
        exclude: Option<Uuid>,
    ) -> Result<ProfessionalRequest> {
        req.validate()?;
        let req = normalize_professional(req)?;

        if self.db.professional_rut_taken(&req.rut, exclude).await? {
            return Err(AppError::Conflict(format!(
                "A professional with RUT {} already exists",
                req.rut
            )));
        }
        if let Some(email) = req.email.as_deref() {
            if self.db.professional_email_taken(email, exclude).await? {
                return Err(AppError::Conflict(format!(
                    "A professional with email {} already exists",
                    email
                )));
            }
        }
        if let Some(specialty_id) = req.specialty_id {
            self.db.get_specialty(specialty_id).await?;
        }
        if let Some(user_id) = req.user_id {
            self.db.get_user_by_id(user_id).await?;
        }
        Ok(req)
    }
}

/// RUT canonique, noms en majuscules
pub fn normalize_professional(mut req: ProfessionalRequest) -> Result<ProfessionalRequest> {
    req.rut = normalize_rut(&req.rut)?;
    req.first_names = uppercase_trimmed(&req.first_names);
    req.paternal_surname = uppercase_trimmed(&req.paternal_surname);
    req.maternal_surname = uppercase_trimmed(&req.maternal_surname);
    req.phone = req.phone.as_deref().map(normalize_phone).filter(|p| !p.is_empty());
    req.email = req
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_professional() {
        let req = ProfessionalRequest {
            rut: "12345678-5".into(),
            first_names: "ana maría".into(),
            paternal_surname: " rojas".into(),
            maternal_surname: String::new(),
            birth_date: None,
            gender: None,
            phone: None,
            email: Some("Ana.Rojas@Clinica.cl".into()),
            address: None,
            specialty_id: None,
            user_id: None,
        };

        let req = normalize_professional(req).unwrap();
        assert_eq!(req.rut, "12.345.678-5");
        assert_eq!(req.first_names, "ANA MARÍA");
        assert_eq!(req.paternal_surname, "ROJAS");
        assert_eq!(req.maternal_surname, "");
        assert_eq!(req.email.as_deref(), Some("ana.rojas@clinica.cl"));
    }
}
