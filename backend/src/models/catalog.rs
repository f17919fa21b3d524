use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::validate_money_field;

/// Spécialité odontologique
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Specialty {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SpecialtyRequest {
    #[validate(length(min = 1, max = 100, message = "Le nom est obligatoire"))]
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Acte facturable
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Procedure {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Prix de référence, copié sur les lignes de traitement
    pub price: Decimal,
    pub estimated_minutes: i32,
    pub specialty_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProcedureRequest {
    #[validate(length(min = 1, max = 100, message = "Le nom est obligatoire"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "validate_money_field")]
    pub price: Decimal,
    #[validate(range(min = 1, message = "La durée estimée doit être positive"))]
    pub estimated_minutes: i32,
    pub specialty_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Famille de moyen de paiement, utilisée par la clôture de caisse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Cash,      // Espèces
    Card,      // Carte
    Transfer,  // Virement
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub name: String,
    pub kind: PaymentMethodKind,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentMethodRequest {
    #[validate(length(min = 1, max = 50, message = "Le nom est obligatoire"))]
    pub name: String,
    pub kind: PaymentMethodKind,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Prévision (assurance santé)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Insurer {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InsurerRequest {
    #[validate(length(min = 1, max = 100, message = "Le nom est obligatoire"))]
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedure_request_rules() {
        let mut req = ProcedureRequest {
            name: "Limpieza".to_string(),
            description: None,
            price: Decimal::from(25_000),
            estimated_minutes: 30,
            specialty_id: None,
            is_active: None,
        };
        assert!(req.validate().is_ok());

        req.price = Decimal::from(-1);
        assert!(req.validate().is_err());

        req.price = Decimal::ZERO;
        req.estimated_minutes = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_payment_method_kind_serde() {
        let kind: PaymentMethodKind = serde_json::from_str("\"transfer\"").unwrap();
        assert_eq!(kind, PaymentMethodKind::Transfer);
    }
}
