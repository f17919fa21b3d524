use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::patient::Gender;
use crate::utils::validation::{validate_phone, validate_rut};

/// Professionnel de santé rattaché à une entreprise
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Professional {
    pub id: Uuid,
    pub company_id: Uuid,
    /// RUT canonique (12.345.678-5)
    pub rut: String,
    pub first_names: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub specialty_id: Option<Uuid>,
    /// Compte utilisateur lié, le cas échéant
    pub user_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Professional {
    pub fn full_name(&self) -> String {
        full_name(&self.first_names, &self.paternal_surname, &self.maternal_surname)
    }
}

/// "prénoms paternel maternel", sans espaces superflus
pub fn full_name(first_names: &str, paternal: &str, maternal: &str) -> String {
    [first_names, paternal, maternal]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalView {
    #[serde(flatten)]
    pub professional: Professional,
    pub full_name: String,
}

impl From<Professional> for ProfessionalView {
    fn from(professional: Professional) -> Self {
        Self {
            full_name: professional.full_name(),
            professional,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfessionalRequest {
    #[validate(custom = "validate_rut")]
    pub rut: String,

    #[validate(length(min = 1, max = 100, message = "Les prénoms sont obligatoires"))]
    pub first_names: String,

    #[validate(length(min = 1, max = 100, message = "Le nom paternel est obligatoire"))]
    pub paternal_surname: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub maternal_surname: String,

    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(email(message = "Format d'email invalide"))]
    pub email: Option<String>,

    pub address: Option<String>,
    pub specialty_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessionalFilter {
    pub search: Option<String>,
    pub specialty_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_skips_empty_parts() {
        assert_eq!(full_name("ANA MARÍA", "ROJAS", "DÍAZ"), "ANA MARÍA ROJAS DÍAZ");
        assert_eq!(full_name(" PEDRO ", "SOTO", ""), "PEDRO SOTO");
    }

    #[test]
    fn test_request_requires_valid_rut() {
        let mut req = ProfessionalRequest {
            rut: "12.345.678-5".into(),
            first_names: "Pedro".into(),
            paternal_surname: "Soto".into(),
            maternal_surname: String::new(),
            birth_date: None,
            gender: None,
            phone: None,
            email: Some("pedro@clinica.cl".into()),
            address: None,
            specialty_id: None,
            user_id: None,
        };
        assert!(req.validate().is_ok());

        req.rut = "12.345.678-4".into();
        assert!(req.validate().is_err());
    }
}
