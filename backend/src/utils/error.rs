// utils/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // Erreurs d'authentification
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    // Multi-entreprise
    #[error("No company selected for this session")]
    NoCompanySelected,

    // Erreurs de données
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    // Erreurs de ressources
    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Règles métier
    #[error("The professional already has an appointment in that time slot")]
    AppointmentOverlap,

    #[error("Payment amount {amount} exceeds the outstanding balance {balance}")]
    PaymentExceedsBalance { amount: Decimal, balance: Decimal },

    #[error("A cash register is already open")]
    CashRegisterAlreadyOpen,

    #[error("Cash register is not open")]
    CashRegisterNotOpen,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    // Erreurs techniques
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Internal server error")]
    Internal,
}

/// Structure de réponse d'erreur standardisée
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl AppError {
    /// Code machine stable exposé aux clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) | AppError::InvalidToken | AppError::InvalidCredentials => {
                "UNAUTHORIZED"
            }
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NoCompanySelected => "NO_COMPANY_SELECTED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::AppointmentOverlap => "APPOINTMENT_OVERLAP",
            AppError::PaymentExceedsBalance { .. } => "PAYMENT_EXCEEDS_BALANCE",
            AppError::CashRegisterAlreadyOpen => "CASH_REGISTER_ALREADY_OPEN",
            AppError::CashRegisterNotOpen => "CASH_REGISTER_NOT_OPEN",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Données structurées jointes à certaines erreurs métier
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::PaymentExceedsBalance { amount, balance } => Some(serde_json::json!({
                "amount": amount,
                "balance": balance,
            })),
            AppError::InvalidTransition { from, to } => Some(serde_json::json!({
                "from": from,
                "to": to,
            })),
            _ => None,
        }
    }

    /// Les erreurs internes ne divulguent pas leur détail au client
    fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 400 - Bad Request
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,

            // 401 - Unauthorized
            AppError::Unauthorized(_) | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }

            // 403 - Forbidden
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,

            // 404 - Not Found
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 - Conflict
            AppError::Conflict(_)
            | AppError::AppointmentOverlap
            | AppError::CashRegisterAlreadyOpen => StatusCode::CONFLICT,

            // 412 - Precondition Failed
            AppError::NoCompanySelected | AppError::CashRegisterNotOpen => {
                StatusCode::PRECONDITION_FAILED
            }

            // 422 - Unprocessable Entity
            AppError::Validation(_)
            | AppError::PaymentExceedsBalance { .. }
            | AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            // 500 - Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal server error: {}", self);
        }

        HttpResponse::build(status).json(ErrorBody {
            error: self.public_message(),
            code: self.code(),
            details: self.details(),
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource".to_string()),
            sqlx::Error::Database(db_error) => match db_error.code().as_deref() {
                Some("23505") => AppError::Conflict("Unique constraint violation".to_string()),
                Some("23503") => {
                    AppError::Conflict("Record is referenced by other records".to_string())
                }
                _ => AppError::Database(err.to_string()),
            },
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializeError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Export(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::InvalidToken
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let error_messages: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect();
        messages.sort();

        AppError::Validation(messages.join("; "))
    }
}

// Type de résultat standard
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::AppointmentOverlap.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NoCompanySelected.status_code(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(
            AppError::PaymentExceedsBalance {
                amount: Decimal::from(10),
                balance: Decimal::from(5),
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_row_not_found_is_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_internal_errors_hide_details() {
        let resp = AppError::Database("password=secret".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["code"], "INTERNAL_ERROR");
    }

    #[actix_web::test]
    async fn test_business_errors_expose_message() {
        let resp = AppError::CashRegisterAlreadyOpen.error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "CASH_REGISTER_ALREADY_OPEN");
        assert_eq!(json["error"], "A cash register is already open");
        assert!(json.get("details").is_none());
    }

    #[actix_web::test]
    async fn test_balance_error_carries_details() {
        let resp = AppError::PaymentExceedsBalance {
            amount: Decimal::from(12_000),
            balance: Decimal::from(10_000),
        }
        .error_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "PAYMENT_EXCEEDS_BALANCE");
        assert_eq!(json["details"]["balance"], "10000");
    }

    #[actix_web::test]
    async fn test_transition_error_body() {
        let resp = AppError::InvalidTransition {
            from: "delivered".into(),
            to: "sent".into(),
        }
        .error_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_json_diff::assert_json_eq!(
            json,
            serde_json::json!({
                "error": "Invalid status transition from delivered to sent",
                "code": "INVALID_TRANSITION",
                "details": { "from": "delivered", "to": "sent" }
            })
        );
    }
}
