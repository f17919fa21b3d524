use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::helpers::age_on;
use crate::utils::validation::validate_phone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Patient d'une entreprise
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: Uuid,
    pub company_id: Uuid,
    /// Prénoms (majuscules)
    pub first_name: String,
    /// Noms de famille (majuscules)
    pub last_name: String,
    /// Document d'identité, unique
    pub document: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub commune: Option<String>,
    pub city: Option<String>,
    pub insurer_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn age(&self, today: NaiveDate) -> Option<i32> {
        self.birth_date.map(|birth| age_on(birth, today))
    }
}

/// Patient avec les champs calculés, pour l'API
#[derive(Debug, Clone, Serialize)]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub full_name: String,
    pub age: Option<i32>,
}

impl PatientView {
    pub fn new(patient: Patient, today: NaiveDate) -> Self {
        Self {
            full_name: patient.full_name(),
            age: patient.age(today),
            patient,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PatientRequest {
    #[validate(length(min = 1, max = 100, message = "Le prénom est obligatoire"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Le nom est obligatoire"))]
    pub last_name: String,

    #[validate(length(min = 1, max = 12))]
    pub document: Option<String>,

    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(email(message = "Format d'email invalide"))]
    pub email: Option<String>,

    pub address: Option<String>,

    #[validate(length(max = 100))]
    pub commune: Option<String>,

    #[validate(length(max = 100))]
    pub city: Option<String>,

    pub insurer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientFilter {
    /// Recherche sur prénom, nom ou document
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// Nature d'une entrée de dossier clinique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "clinical_record_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClinicalRecordKind {
    Consultation,
    Exam,
    Treatment,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub record_date: NaiveDate,
    pub kind: ClinicalRecordKind,
    pub description: String,
    pub notes: Option<String>,
    pub professional_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClinicalRecordRequest {
    pub kind: ClinicalRecordKind,
    #[validate(length(min = 1, message = "La description est obligatoire"))]
    pub description: String,
    pub notes: Option<String>,
    pub professional_id: Option<Uuid>,
    pub record_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Patient {
        Patient {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            first_name: "JUAN".to_string(),
            last_name: "PÉREZ SOTO".to_string(),
            document: Some("12.345.678-5".to_string()),
            gender: Some(Gender::Male),
            birth_date: NaiveDate::from_ymd_opt(1985, 12, 1),
            phone: None,
            email: None,
            address: None,
            commune: None,
            city: None,
            insurer_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_computes_age_and_name() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 30).unwrap();
        let view = PatientView::new(sample(), today);
        assert_eq!(view.full_name, "JUAN PÉREZ SOTO");
        assert_eq!(view.age, Some(39));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["first_name"], "JUAN");
        assert_eq!(json["age"], 39);
    }

    #[test]
    fn test_request_rejects_bad_email() {
        let req = PatientRequest {
            first_name: "Ana".into(),
            last_name: "Rojas".into(),
            document: None,
            gender: None,
            birth_date: None,
            phone: Some("+56 9 8765 4321".into()),
            email: Some("no-es-email".into()),
            address: None,
            commune: None,
            city: None,
            insurer_id: None,
        };
        assert!(req.validate().is_err());
    }
}
