// utils/mod.rs
pub mod error;
pub mod config;
pub mod security;
pub mod validation;
pub mod helpers;

// Ré-exports pour faciliter l'import
pub use error::{AppError, Result};
pub use config::Config;
pub use security::{
    generate_access_token, verify_access_token,
    hash_password, verify_password,
    generate_random_string, AccessTokenClaims, TokenSubject,
};
pub use validation::{
    normalize_rut, is_valid_rut, rut_check_digit,
    validate_rut, validate_phone, normalize_phone,
    validate_money, validate_positive_money, validate_discount_percent,
    validate_appointment_date, validate_appointment_time, validate_appointment_duration,
    validate_email, validate_password, validate_non_empty_string, validate_date_range,
};
pub use helpers::{
    uppercase_trimmed, uppercase_opt, age_on,
    parse_money, format_clp, default_report_range, format_date,
};
