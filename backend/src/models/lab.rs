use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_money_field, validate_phone};

/// Laboratoire dentaire partenaire
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Laboratory {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LaboratoryRequest {
    #[validate(length(min = 1, max = 200, message = "Le nom est obligatoire"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "Le contact est obligatoire"))]
    pub contact: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(email(message = "Format d'email invalide"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "L'adresse est obligatoire"))]
    pub address: String,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lab_job_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LabJobKind {
    Crown,       // Couronne
    Bridge,      // Bridge
    Prosthesis,  // Prothèse
    Implant,     // Implant
    Other,
}

/// Étapes du circuit d'un travail de laboratoire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lab_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LabJobStatus {
    Pending,
    Sent,
    InProcess,
    Ready,
    Received,
    Delivered,
    Cancelled,
}

impl LabJobStatus {
    /// Rang dans le circuit; `None` pour l'annulation
    fn rank(&self) -> Option<u8> {
        match self {
            LabJobStatus::Pending => Some(0),
            LabJobStatus::Sent => Some(1),
            LabJobStatus::InProcess => Some(2),
            LabJobStatus::Ready => Some(3),
            LabJobStatus::Received => Some(4),
            LabJobStatus::Delivered => Some(5),
            LabJobStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LabJobStatus::Delivered | LabJobStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabJobStatus::Pending => "pending",
            LabJobStatus::Sent => "sent",
            LabJobStatus::InProcess => "in_process",
            LabJobStatus::Ready => "ready",
            LabJobStatus::Received => "received",
            LabJobStatus::Delivered => "delivered",
            LabJobStatus::Cancelled => "cancelled",
        }
    }

    /// Avancer dans le circuit, ou annuler tant que le travail n'est pas terminé
    pub fn can_transition_to(&self, next: LabJobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(target)) => target > current,
            (None, Some(_)) => false,
        }
    }

    pub fn check_transition(&self, next: LabJobStatus) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LabJob {
    pub id: Uuid,
    pub company_id: Uuid,
    pub laboratory_id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub kind: LabJobKind,
    pub description: String,
    pub status: LabJobStatus,
    pub sent_date: Option<NaiveDate>,
    pub estimated_delivery_date: NaiveDate,
    pub received_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub cost: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LabJob {
    /// Livraison attendue dépassée et travail toujours chez le laboratoire
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.estimated_delivery_date < today
            && !matches!(
                self.status,
                LabJobStatus::Received | LabJobStatus::Delivered | LabJobStatus::Cancelled
            )
    }

    /// Dates à renseigner en entrant dans `next`
    pub fn stamped_dates(&self, next: LabJobStatus, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let sent = match next {
            LabJobStatus::Sent => self.sent_date.or(Some(today)),
            _ => self.sent_date,
        };
        let received = match next {
            LabJobStatus::Received => Some(today),
            _ => self.received_date,
        };
        (sent, received)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LabJobEvent {
    pub id: Uuid,
    pub lab_job_id: Uuid,
    pub status: LabJobStatus,
    pub notes: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LabJobSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: LabJob,
    pub laboratory_name: String,
    pub patient_name: String,
    pub professional_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabJobDetail {
    #[serde(flatten)]
    pub summary: LabJobSummary,
    pub is_overdue: bool,
    pub events: Vec<LabJobEvent>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLabJobRequest {
    pub laboratory_id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub kind: LabJobKind,
    #[validate(length(min = 1, message = "La description est obligatoire"))]
    pub description: String,
    pub estimated_delivery_date: NaiveDate,
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_money_field")]
    pub cost: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLabJobRequest {
    pub laboratory_id: Option<Uuid>,
    pub kind: Option<LabJobKind>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(custom = "validate_money_field")]
    pub cost: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LabJobStatusRequest {
    pub status: LabJobStatus,
    #[validate(length(min = 1, message = "Une note de suivi est obligatoire"))]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabJobFilter {
    pub status: Option<LabJobStatus>,
    pub laboratory_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use LabJobStatus::*;

    fn job(status: LabJobStatus, due: NaiveDate) -> LabJob {
        LabJob {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            laboratory_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            kind: LabJobKind::Crown,
            description: "Corona pieza 16".into(),
            status,
            sent_date: None,
            estimated_delivery_date: due,
            received_date: None,
            notes: None,
            cost: Decimal::from(80_000),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_forward_transitions_only() {
        assert!(Pending.can_transition_to(Sent));
        assert!(Pending.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Received));
        assert!(!Received.can_transition_to(Sent));
        assert!(!Sent.can_transition_to(Sent));
        assert!(Received.can_transition_to(Delivered));
    }

    #[test]
    fn test_cancel_rules() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Received.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));

        match Delivered.check_transition(Cancelled) {
            Err(AppError::InvalidTransition { from, to }) => {
                assert_eq!(from, "delivered");
                assert_eq!(to, "cancelled");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_stamped_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let mut j = job(Pending, today);

        assert_eq!(j.stamped_dates(Sent, today), (Some(today), None));

        let earlier = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        j.sent_date = Some(earlier);
        assert_eq!(j.stamped_dates(Sent, today), (Some(earlier), None));
        assert_eq!(j.stamped_dates(Received, today), (Some(earlier), Some(today)));
    }

    #[test]
    fn test_overdue() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let yesterday = today.pred_opt().unwrap();

        assert!(job(Sent, yesterday).is_overdue(today));
        assert!(!job(Sent, today).is_overdue(today));
        assert!(!job(Received, yesterday).is_overdue(today));
        assert!(!job(Cancelled, yesterday).is_overdue(today));
    }
}
