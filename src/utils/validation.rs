// utils/validation.rs
use crate::models::candidat::License;
use crate::utils::error::{ApiError, Result};
use chrono::{Datelike, Local, NaiveDate};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Âge minimum pour s'inscrire
pub const MINIMUM_AGE: i32 = 18;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Valider une structure et convertir les erreurs
pub fn validate_object<T: Validate>(obj: &T) -> Result<()> {
    obj.validate().map_err(ApiError::from)
}

/// Téléphone: au moins 8 caractères parmi chiffres, espaces, - + ( )
pub fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    let phone = phone.trim();
    if phone.chars().count() < 8 {
        return Err(error(
            "phone_length",
            "Le téléphone doit avoir au moins 8 caractères",
        ));
    }
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')');
    if !phone.chars().all(allowed) {
        return Err(error("phone_format", "Le format du téléphone est invalide"));
    }
    Ok(())
}

/// Âge révolu à une date donnée
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Date de naissance passée et âge minimum atteint à `today`
pub fn check_birth_date(
    birth_date: NaiveDate,
    today: NaiveDate,
) -> std::result::Result<(), ValidationError> {
    if birth_date > today {
        return Err(error(
            "birth_date_future",
            "La date de naissance ne peut pas être dans le futur",
        ));
    }
    if age_on(birth_date, today) < MINIMUM_AGE {
        return Err(error(
            "birth_date_minimum_age",
            "L'âge minimum requis est de 18 ans",
        ));
    }
    Ok(())
}

pub fn validate_adult_birth_date(birth_date: &NaiveDate) -> std::result::Result<(), ValidationError> {
    check_birth_date(*birth_date, Local::now().date_naive())
}

/// Cohérence des dates de chaque permis détenu
pub fn validate_owned_licenses(licenses: &[License]) -> std::result::Result<(), ValidationError> {
    for license in licenses {
        if license.issuing_authority.trim().is_empty() {
            return Err(error(
                "license_authority",
                "Autorité de délivrance requise",
            ));
        }
        if license.issue_date < license.obtention_date {
            return Err(error(
                "license_issue_date",
                "La date de délivrance doit être après la date d'obtention",
            ));
        }
        if license.expiration_date <= license.issue_date {
            return Err(error(
                "license_expiration_date",
                "La date d'expiration doit être après la date de délivrance",
            ));
        }
    }
    Ok(())
}

/// Photo encodée en data URI d'image
pub fn validate_photo_data_uri(value: &str) -> std::result::Result<(), ValidationError> {
    let Some(rest) = value.strip_prefix("data:image/") else {
        return Err(error("photo_format", "La photo doit être une image encodée en base64"));
    };
    match rest.split_once(";base64,") {
        Some((mime, payload)) if !mime.is_empty() && !payload.is_empty() => Ok(()),
        _ => Err(error("photo_format", "La photo doit être une image encodée en base64")),
    }
}

/// Montant d'un paiement
pub fn validate_positive_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::Validation(
            "Le montant doit être supérieur à zéro".to_string(),
        ));
    }
    Ok(())
}

/// Supprime les espaces en bordure et les chevrons
pub fn sanitize_string(s: &str) -> String {
    s.trim().replace(['<', '>'], "")
}
