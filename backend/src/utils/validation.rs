// utils/validation.rs
use crate::utils::error::{AppError, Result};
use chrono::{NaiveDate, NaiveTime, Timelike};
use rust_decimal::Decimal;
use validator::ValidationError;

/// Plage horaire de prise de rendez-vous
pub const APPOINTMENT_DAY_START: (u32, u32) = (8, 0);
pub const APPOINTMENT_DAY_END: (u32, u32) = (20, 0);
pub const APPOINTMENT_SLOT_MINUTES: u32 = 15;
pub const APPOINTMENT_MIN_DURATION: i32 = 15;
pub const APPOINTMENT_MAX_DURATION: i32 = 120;

// === RUT CHILIEN ===

/// Calcule le chiffre vérificateur (modulo 11) d'un corps de RUT
pub fn rut_check_digit(body: &str) -> Option<char> {
    let mut sum = 0u32;
    let mut multiplier = 2u32;

    for c in body.chars().rev() {
        sum += c.to_digit(10)? * multiplier;
        multiplier = if multiplier < 7 { multiplier + 1 } else { 2 };
    }

    Some(match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        d => char::from_digit(d, 10)?,
    })
}

/// Nettoie, vérifie et formate un RUT (`12.345.678-5`)
pub fn normalize_rut(raw: &str) -> Result<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .collect::<String>()
        .to_uppercase();

    let bad_format = || AppError::Validation("rut: expected format 12.345.678-5".to_string());

    if !(8..=9).contains(&cleaned.chars().count()) {
        return Err(bad_format());
    }

    // Corps en chiffres ASCII uniquement: le découpage par octets reste sûr
    let mut chars = cleaned.chars();
    let Some(dv) = chars.next_back().filter(char::is_ascii_alphanumeric) else {
        return Err(bad_format());
    };
    let body = chars.as_str();
    if !body.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad_format());
    }

    match rut_check_digit(body) {
        Some(expected) if expected == dv => {}
        _ => return Err(AppError::Validation("rut: invalid check digit".to_string())),
    }

    let len = body.len();
    Ok(format!(
        "{}.{}.{}-{}",
        &body[..len - 6],
        &body[len - 6..len - 3],
        &body[len - 3..],
        dv
    ))
}

pub fn is_valid_rut(raw: &str) -> bool {
    normalize_rut(raw).is_ok()
}

/// Validateur custom pour `#[validate(custom = "validate_rut")]`
pub fn validate_rut(rut: &str) -> std::result::Result<(), ValidationError> {
    if is_valid_rut(rut) {
        Ok(())
    } else {
        let mut err = ValidationError::new("rut");
        err.message = Some("RUT invalide (ex: 12.345.678-5)".into());
        Err(err)
    }
}

// === TÉLÉPHONE / EMAIL ===

/// Garde uniquement les chiffres et le `+`
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

pub fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    let cleaned = normalize_phone(phone);
    let digits = cleaned.chars().filter(|c| c.is_ascii_digit()).count();
    let plus_ok = cleaned.rfind('+').map_or(true, |idx| idx == 0);

    if (8..=15).contains(&digits) && plus_ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Numéro de téléphone invalide".into());
        Err(err)
    }
}

/// Valider un email
pub fn validate_email(email: &str) -> Result<()> {
    if !validator::validate_email(email) {
        return Err(AppError::Validation("email: invalid format".to_string()));
    }
    Ok(())
}

/// Valider un mot de passe
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < 8 {
        return Err(AppError::Validation(
            "password: must be at least 8 characters long".to_string(),
        ));
    }
    Ok(())
}

/// Valider une chaîne non vide
pub fn validate_non_empty_string(value: &str, field_name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{}: cannot be empty", field_name)));
    }
    Ok(())
}

// === MONTANTS ===

/// Montant positif ou nul, deux décimales au plus
pub fn validate_money(amount: Decimal, field_name: &str) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::Validation(format!("{}: cannot be negative", field_name)));
    }
    if amount.normalize().scale() > 2 {
        return Err(AppError::Validation(format!(
            "{}: at most two decimal places",
            field_name
        )));
    }
    Ok(())
}

/// Montant strictement positif
pub fn validate_positive_money(amount: Decimal, field_name: &str) -> Result<()> {
    validate_money(amount, field_name)?;
    if amount.is_zero() {
        return Err(AppError::Validation(format!("{}: must be greater than zero", field_name)));
    }
    Ok(())
}

pub fn validate_discount_percent(percent: Decimal) -> Result<()> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(AppError::Validation(
            "discount_percent: must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

/// Validateur custom pour les champs monétaires des DTO
pub fn validate_money_field(amount: &Decimal) -> std::result::Result<(), ValidationError> {
    validate_money(*amount, "amount").map_err(|_| {
        let mut err = ValidationError::new("money");
        err.message = Some("Montant invalide".into());
        err
    })
}

// === RENDEZ-VOUS ===

/// La date d'un rendez-vous ne peut pas être antérieure à aujourd'hui
pub fn validate_appointment_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date < today {
        return Err(AppError::Validation("date: cannot be before today".to_string()));
    }
    Ok(())
}

/// Heure entre 08:00 et 20:00, par pas de 15 minutes; retourne l'heure sans secondes
pub fn validate_appointment_time(time: NaiveTime) -> Result<NaiveTime> {
    let start = NaiveTime::from_hms_opt(APPOINTMENT_DAY_START.0, APPOINTMENT_DAY_START.1, 0)
        .ok_or(AppError::Internal)?;
    let end = NaiveTime::from_hms_opt(APPOINTMENT_DAY_END.0, APPOINTMENT_DAY_END.1, 0)
        .ok_or(AppError::Internal)?;

    let truncated = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
        .ok_or_else(|| AppError::Validation("time: invalid format".to_string()))?;

    if truncated < start || truncated > end {
        return Err(AppError::Validation(
            "time: must be between 08:00 and 20:00".to_string(),
        ));
    }
    if truncated.minute() % APPOINTMENT_SLOT_MINUTES != 0 {
        return Err(AppError::Validation(
            "time: must be on a 15 minute boundary".to_string(),
        ));
    }
    Ok(truncated)
}

pub fn validate_appointment_duration(minutes: i32) -> Result<()> {
    if !(APPOINTMENT_MIN_DURATION..=APPOINTMENT_MAX_DURATION).contains(&minutes) {
        return Err(AppError::Validation(
            "duration_minutes: must be between 15 and 120".to_string(),
        ));
    }
    if minutes % APPOINTMENT_SLOT_MINUTES as i32 != 0 {
        return Err(AppError::Validation(
            "duration_minutes: must be a multiple of 15".to_string(),
        ));
    }
    Ok(())
}

/// Valider une plage de dates
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(AppError::Validation(
            "date range: start must not be after end".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rut_check_digit() {
        assert_eq!(rut_check_digit("12345678"), Some('5'));
        assert_eq!(rut_check_digit("11111111"), Some('1'));
        assert_eq!(rut_check_digit("1000005"), Some('K'));
        assert_eq!(rut_check_digit("1000030"), Some('0'));
        assert_eq!(rut_check_digit("12a"), None);
    }

    #[test]
    fn test_normalize_rut_formats() {
        assert_eq!(normalize_rut("12.345.678-5").unwrap(), "12.345.678-5");
        assert_eq!(normalize_rut("123456785").unwrap(), "12.345.678-5");
        assert_eq!(normalize_rut("1000005-k").unwrap(), "1.000.005-K");
        assert_eq!(normalize_rut(" 11.111.111-1 ").unwrap(), "11.111.111-1");
    }

    #[test]
    fn test_normalize_rut_rejects_bad_input() {
        assert!(normalize_rut("12.345.678-9").is_err());
        assert!(normalize_rut("1234").is_err());
        assert!(normalize_rut("12.3A5.678-5").is_err());
        assert!(!is_valid_rut(""));
        assert!(validate_rut("12.345.678-5").is_ok());
        assert!(validate_rut("12.345.678-0").is_err());
    }

    #[test]
    fn test_normalize_rut_rejects_multibyte_input() {
        assert!(normalize_rut("1234567é").is_err());
        assert!(normalize_rut("12.345.678-ñ").is_err());
        assert!(normalize_rut("1é.345.678-5").is_err());
        assert!(validate_rut("12.345.67é").is_err());
    }

    #[test]
    fn test_phone_validation() {
        assert_eq!(normalize_phone("+56 9 1234-5678"), "+56912345678");
        assert!(validate_phone("+56 9 1234 5678").is_ok());
        assert!(validate_phone("1234").is_err());
        assert!(validate_phone("56+912345678").is_err());
    }

    #[test]
    fn test_money_validation() {
        assert!(validate_money(Decimal::new(150050, 2), "amount").is_ok());
        assert!(validate_money(Decimal::new(-1, 0), "amount").is_err());
        assert!(validate_money(Decimal::new(1001, 3), "amount").is_err());
        // 1.500 se normalise à 1.5
        assert!(validate_money(Decimal::new(1500, 3), "amount").is_ok());
        assert!(validate_positive_money(Decimal::ZERO, "amount").is_err());
    }

    #[test]
    fn test_appointment_time_rules() {
        let t = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();

        assert_eq!(validate_appointment_time(t(8, 0, 0)).unwrap(), t(8, 0, 0));
        assert_eq!(validate_appointment_time(t(9, 45, 30)).unwrap(), t(9, 45, 0));
        assert!(validate_appointment_time(t(20, 0, 0)).is_ok());
        assert!(validate_appointment_time(t(7, 45, 0)).is_err());
        assert!(validate_appointment_time(t(20, 15, 0)).is_err());
        assert!(validate_appointment_time(t(10, 10, 0)).is_err());
    }

    #[test]
    fn test_appointment_duration_rules() {
        assert!(validate_appointment_duration(15).is_ok());
        assert!(validate_appointment_duration(120).is_ok());
        assert!(validate_appointment_duration(0).is_err());
        assert!(validate_appointment_duration(135).is_err());
        assert!(validate_appointment_duration(40).is_err());
    }

    #[test]
    fn test_appointment_date_not_in_past() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert!(validate_appointment_date(today, today).is_ok());
        assert!(validate_appointment_date(today.pred_opt().unwrap(), today).is_err());
    }

    #[test]
    fn test_discount_bounds() {
        assert!(validate_discount_percent(Decimal::ZERO).is_ok());
        assert!(validate_discount_percent(Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_discount_percent(Decimal::new(1001, 1)).is_err());
    }
}
