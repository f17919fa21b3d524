// utils/helpers.rs
use crate::utils::error::{AppError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Nom en majuscules, espaces de bord retirés
pub fn uppercase_trimmed(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Variante pour les champs optionnels; une chaîne vide devient `None`
pub fn uppercase_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_uppercase)
}

/// Âge en années révolues à la date donnée
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age.max(0)
}

/// Interprète un montant saisi à la main (`$ 1.234.567`, `1.234,50`, `1234.50`)
pub fn parse_money(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ' ' | '\u{a0}'))
        .collect();

    if cleaned.is_empty() {
        return Err(AppError::Validation("amount: cannot be empty".to_string()));
    }

    let normalized = if cleaned.contains(',') {
        // Format local: point = milliers, virgule = décimales
        cleaned.replace('.', "").replace(',', ".")
    } else {
        let dots = cleaned.matches('.').count();
        let thousands_only = dots > 1
            || cleaned
                .rsplit_once('.')
                .map_or(false, |(_, decimals)| decimals.len() == 3);
        if thousands_only {
            cleaned.replace('.', "")
        } else {
            cleaned
        }
    };

    Decimal::from_str(&normalized)
        .map_err(|_| AppError::Validation(format!("amount: '{}' is not a valid amount", raw)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyInput {
    // Le texte d'abord: "15.000" doit passer par `parse_money`
    Text(String),
    Number(Decimal),
}

impl MoneyInput {
    fn into_decimal(self) -> Result<Decimal> {
        match self {
            MoneyInput::Text(raw) => parse_money(&raw),
            MoneyInput::Number(value) => Ok(value),
        }
    }
}

/// Montant JSON accepté en nombre ou en texte saisi (`"$15.000"`)
pub fn deserialize_money<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    MoneyInput::deserialize(deserializer)?
        .into_decimal()
        .map_err(serde::de::Error::custom)
}

pub fn deserialize_money_opt<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<MoneyInput>::deserialize(deserializer)?
        .map(MoneyInput::into_decimal)
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Affichage en pesos chiliens: `$1.234.567`
pub fn format_clp(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{}${}", if negative { "-" } else { "" }, grouped)
}

/// Plage par défaut des rapports: les `days` derniers jours jusqu'à aujourd'hui
pub fn default_report_range(today: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(days), today)
}

/// Formater une date pour l'affichage (jj/mm/aaaa)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_uppercase_helpers() {
        assert_eq!(uppercase_trimmed("  maría josé "), "MARÍA JOSÉ");
        assert_eq!(uppercase_opt(Some("ñuñoa")), Some("ÑUÑOA".to_string()));
        assert_eq!(uppercase_opt(Some("   ")), None);
        assert_eq!(uppercase_opt(None), None);
    }

    #[test]
    fn test_age_on_birthday_boundary() {
        assert_eq!(age_on(d(1990, 6, 15), d(2025, 6, 14)), 34);
        assert_eq!(age_on(d(1990, 6, 15), d(2025, 6, 15)), 35);
        assert_eq!(age_on(d(2030, 1, 1), d(2025, 1, 1)), 0);
    }

    #[test]
    fn test_parse_money_formats() {
        assert_eq!(parse_money("$ 1.234.567").unwrap(), Decimal::from(1_234_567));
        assert_eq!(parse_money("15.000").unwrap(), Decimal::from(15_000));
        assert_eq!(parse_money("1.234,50").unwrap(), Decimal::new(123450, 2));
        assert_eq!(parse_money("1234.50").unwrap(), Decimal::new(123450, 2));
        assert!(parse_money("abc").is_err());
        assert!(parse_money("  ").is_err());
    }

    #[derive(Debug, serde::Deserialize)]
    struct AmountBody {
        #[serde(deserialize_with = "deserialize_money")]
        amount: Decimal,
        #[serde(default, deserialize_with = "deserialize_money_opt")]
        extra: Option<Decimal>,
    }

    #[test]
    fn test_deserialize_money_accepts_text_and_numbers() {
        let body: AmountBody = serde_json::from_str(r#"{"amount": "$ 15.000"}"#).unwrap();
        assert_eq!(body.amount, Decimal::from(15_000));
        assert_eq!(body.extra, None);

        let body: AmountBody = serde_json::from_str(r#"{"amount": 2500, "extra": "1.234,50"}"#).unwrap();
        assert_eq!(body.amount, Decimal::from(2_500));
        assert_eq!(body.extra, Some(Decimal::new(123450, 2)));

        assert!(serde_json::from_str::<AmountBody>(r#"{"amount": "abc"}"#).is_err());
    }

    #[test]
    fn test_format_clp() {
        assert_eq!(format_clp(Decimal::from(1_234_567)), "$1.234.567");
        assert_eq!(format_clp(Decimal::from(950)), "$950");
        assert_eq!(format_clp(Decimal::new(99950, 2)), "$1.000");
        assert_eq!(format_clp(Decimal::from(-15_000)), "-$15.000");
        assert_eq!(format_clp(Decimal::ZERO), "$0");
    }

    #[test]
    fn test_default_report_range() {
        let (start, end) = default_report_range(d(2025, 3, 31), 30);
        assert_eq!(start, d(2025, 3, 1));
        assert_eq!(end, d(2025, 3, 31));
        assert_eq!(format_date(start), "01/03/2025");
    }
}
