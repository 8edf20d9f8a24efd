use crate::utils::helpers::{flexible_date, flexible_date_opt};
use crate::utils::validation::{
    validate_adult_birth_date, validate_owned_licenses, validate_phone, validate_photo_data_uri,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Étape du parcours d'un candidat
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatus {
    Registered,     // Inscrit
    InTraining,     // En formation
    ReadyForExam,   // Prêt pour l'examen
    ExamScheduled,  // Examen planifié
    Licensed,       // Permis obtenu
    DroppedOut,     // Abandon
}

impl StudentStatus {
    pub const ALL: [StudentStatus; 6] = [
        StudentStatus::Registered,
        StudentStatus::InTraining,
        StudentStatus::ReadyForExam,
        StudentStatus::ExamScheduled,
        StudentStatus::Licensed,
        StudentStatus::DroppedOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Registered => "REGISTERED",
            StudentStatus::InTraining => "IN_TRAINING",
            StudentStatus::ReadyForExam => "READY_FOR_EXAM",
            StudentStatus::ExamScheduled => "EXAM_SCHEDULED",
            StudentStatus::Licensed => "LICENSED",
            StudentStatus::DroppedOut => "DROPPED_OUT",
        }
    }

    /// Libellé affiché dans la console
    pub fn label(&self) -> &'static str {
        match self {
            StudentStatus::Registered => "Inscrit",
            StudentStatus::InTraining => "En Formation",
            StudentStatus::ReadyForExam => "Prêt Examen",
            StudentStatus::ExamScheduled => "Examen Planifié",
            StudentStatus::Licensed => "Permis Obtenu",
            StudentStatus::DroppedOut => "Abandonné",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catégorie de permis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LicenseCategory {
    A1,
    A2,
    B,
    C1,
    C2,
    E,
    D,
}

impl LicenseCategory {
    pub const ALL: [LicenseCategory; 7] = [
        LicenseCategory::A1,
        LicenseCategory::A2,
        LicenseCategory::B,
        LicenseCategory::C1,
        LicenseCategory::C2,
        LicenseCategory::E,
        LicenseCategory::D,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseCategory::A1 => "A1",
            LicenseCategory::A2 => "A2",
            LicenseCategory::B => "B",
            LicenseCategory::C1 => "C1",
            LicenseCategory::C2 => "C2",
            LicenseCategory::E => "E",
            LicenseCategory::D => "D",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for LicenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenderType {
    Male,
    Female,
}

/// Nom et prénom
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HumanName {
    #[validate(length(min = 1, max = 50, message = "Le prénom doit contenir entre 1 et 50 caractères"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Le nom doit contenir entre 1 et 50 caractères"))]
    pub last_name: String,
}

impl HumanName {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Permis déjà détenu par un candidat
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(with = "flexible_date")]
    pub obtention_date: NaiveDate,

    pub license_number: u64,

    pub license_category: LicenseCategory,

    #[serde(with = "flexible_date")]
    pub issue_date: NaiveDate,

    pub issuing_authority: String,

    #[serde(with = "flexible_date")]
    pub expiration_date: NaiveDate,
}

/// Validité d'un permis à une date donnée (attribut dérivé, jamais persisté)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseValidity {
    Expired,
    ExpiringSoon,
    Valid,
}

impl License {
    /// Fenêtre d'alerte avant expiration
    pub const EXPIRY_WARNING_DAYS: i64 = 90;

    pub fn validity(&self, today: NaiveDate) -> LicenseValidity {
        if self.expiration_date < today {
            LicenseValidity::Expired
        } else if self.expiration_date < today + Duration::days(Self::EXPIRY_WARNING_DAYS) {
            LicenseValidity::ExpiringSoon
        } else {
            LicenseValidity::Valid
        }
    }
}

/// Candidat tel que renvoyé par l'API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Identifiant attribué par le serveur
    pub id: i64,

    /// Numéro d'inscription à l'auto-école
    #[serde(default)]
    pub inscription_id: String,

    #[serde(default, with = "flexible_date_opt")]
    pub inscription_date: Option<NaiveDate>,

    /// Numéro et date d'inscription auprès de la wilaya
    #[serde(default)]
    pub gov_inscription_id: Option<String>,

    #[serde(default, with = "flexible_date_opt")]
    pub gov_inscription_date: Option<NaiveDate>,

    pub status: StudentStatus,

    pub name: HumanName,

    #[serde(with = "flexible_date")]
    pub birth_date: NaiveDate,

    #[serde(default)]
    pub place_of_birth: Option<String>,

    #[serde(default)]
    pub gender: Option<GenderType>,

    #[serde(default)]
    pub father_name: Option<HumanName>,

    #[serde(default)]
    pub mother_name: Option<HumanName>,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub phone_number: String,

    pub requested_license: LicenseCategory,

    #[serde(default)]
    pub owned_license: Option<Vec<License>>,

    /// Photo encodée en data URI
    #[serde(default)]
    pub photo_base64: Option<String>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name.first_name, self.name.last_name)
    }

    /// Nom complet suivi du prénom du père (ou de la mère) pour lever les homonymies
    pub fn display_name(&self) -> String {
        let parent = self
            .father_name
            .as_ref()
            .filter(|n| !n.first_name.is_empty())
            .or_else(|| self.mother_name.as_ref().filter(|n| !n.first_name.is_empty()));

        match parent {
            Some(parent) => format!("{} ({})", self.full_name(), parent.first_name),
            None => self.full_name(),
        }
    }

    /// Recherche insensible à la casse sur le nom affiché ou le numéro d'inscription
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        self.display_name().to_lowercase().contains(&term.to_lowercase())
            || self.inscription_id.contains(term)
    }
}

/// Données de création d'un candidat
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    #[validate]
    pub name: HumanName,

    #[serde(with = "flexible_date")]
    #[validate(custom = "validate_adult_birth_date")]
    pub birth_date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<GenderType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub father_name: Option<HumanName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<HumanName>,

    #[validate(length(min = 5, max = 200, message = "L'adresse doit contenir entre 5 et 200 caractères"))]
    pub address: String,

    #[validate(custom = "validate_phone")]
    pub phone_number: String,

    pub requested_license: LicenseCategory,

    pub status: StudentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inscription_id: Option<String>,

    #[serde(
        default,
        with = "flexible_date_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub inscription_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gov_inscription_id: Option<String>,

    #[serde(
        default,
        with = "flexible_date_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub gov_inscription_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_owned_licenses")]
    pub owned_license: Option<Vec<License>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_photo_data_uri")]
    pub photo_base64: Option<String>,
}

impl StudentDraft {
    /// Brouillon minimal, statut REGISTERED
    pub fn new(
        name: HumanName,
        birth_date: NaiveDate,
        address: impl Into<String>,
        phone_number: impl Into<String>,
        requested_license: LicenseCategory,
    ) -> Self {
        Self {
            name,
            birth_date,
            place_of_birth: None,
            gender: None,
            father_name: None,
            mother_name: None,
            address: address.into(),
            phone_number: phone_number.into(),
            requested_license,
            status: StudentStatus::Registered,
            inscription_id: None,
            inscription_date: None,
            gov_inscription_id: None,
            gov_inscription_date: None,
            owned_license: None,
            photo_base64: None,
        }
    }

    /// Supprime les espaces et les chevrons des champs texte libres
    pub fn sanitized(mut self) -> Self {
        use crate::utils::validation::sanitize_string;

        self.name.first_name = sanitize_string(&self.name.first_name);
        self.name.last_name = sanitize_string(&self.name.last_name);
        self.address = sanitize_string(&self.address);
        self.phone_number = self.phone_number.trim().to_string();
        self.place_of_birth = self.place_of_birth.map(|p| sanitize_string(&p));
        self
    }
}

/// Modification partielle d'un candidat, fusionnée sur l'enregistrement complet avant envoi
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<HumanName>,

    #[serde(
        default,
        with = "flexible_date_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<GenderType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub father_name: Option<HumanName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<HumanName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_license: Option<LicenseCategory>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inscription_id: Option<String>,

    #[serde(
        default,
        with = "flexible_date_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub inscription_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gov_inscription_id: Option<String>,

    #[serde(
        default,
        with = "flexible_date_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub gov_inscription_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_license: Option<Vec<License>>,
}

/// Filtres de la liste des candidats
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_license: Option<LicenseCategory>,
}

impl StudentFilters {
    pub fn is_empty(&self) -> bool {
        self == &StudentFilters::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn license_expiring(expiration: NaiveDate) -> License {
        License {
            obtention_date: date(2015, 1, 10),
            license_number: 123456,
            license_category: LicenseCategory::B,
            issue_date: date(2015, 2, 1),
            issuing_authority: "Wilaya de M'Sila".to_string(),
            expiration_date: expiration,
        }
    }

    #[test]
    fn test_license_validity_windows() {
        let today = date(2026, 10, 19);
        assert_eq!(license_expiring(date(2026, 10, 18)).validity(today), LicenseValidity::Expired);
        assert_eq!(license_expiring(date(2026, 12, 1)).validity(today), LicenseValidity::ExpiringSoon);
        assert_eq!(license_expiring(date(2027, 6, 1)).validity(today), LicenseValidity::Valid);
    }

    #[test]
    fn test_student_deserializes_api_payload() {
        let raw = json!({
            "id": 12,
            "inscriptionId": "AE-2024-012",
            "inscriptionDate": "2024-03-01T00:00:00",
            "status": "IN_TRAINING",
            "name": {"firstName": "Yacine", "lastName": "Benali"},
            "birthDate": "2001-06-15",
            "gender": "MALE",
            "fatherName": {"firstName": "Karim", "lastName": "Benali"},
            "address": "Cité 500 logements, Magra",
            "phoneNumber": "0555123456",
            "requestedLicense": "B",
            "ownedLicense": null
        });

        let student: Student = serde_json::from_value(raw).unwrap();
        assert_eq!(student.status, StudentStatus::InTraining);
        assert_eq!(student.inscription_date, Some(date(2024, 3, 1)));
        assert_eq!(student.display_name(), "Yacine Benali (Karim)");
        assert!(student.matches_search("benali"));
        assert!(student.matches_search("AE-2024"));
        assert!(!student.matches_search("Saidi"));
    }

    #[test]
    fn test_display_name_falls_back_to_mother() {
        let raw = json!({
            "id": 1,
            "status": "REGISTERED",
            "name": {"firstName": "Sara", "lastName": "Hamdi"},
            "birthDate": "2000-01-01",
            "fatherName": {"firstName": "", "lastName": ""},
            "motherName": {"firstName": "Nadia", "lastName": "Mokhtari"},
            "requestedLicense": "A1"
        });
        let student: Student = serde_json::from_value(raw).unwrap();
        assert_eq!(student.display_name(), "Sara Hamdi (Nadia)");
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = StudentPatch {
            phone_number: Some("0666000000".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"phoneNumber": "0666000000"}));
    }

    #[test]
    fn test_status_parse_and_labels() {
        assert_eq!(StudentStatus::parse("in_training"), Some(StudentStatus::InTraining));
        assert_eq!(StudentStatus::parse("unknown"), None);
        assert_eq!(StudentStatus::Licensed.label(), "Permis Obtenu");
        assert_eq!(LicenseCategory::parse("c1"), Some(LicenseCategory::C1));
    }

    #[test]
    fn test_filters_serialize_camel_case_without_nulls() {
        let filters = StudentFilters {
            last_name: Some("Benali".to_string()),
            status: Some(StudentStatus::InTraining),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&filters).unwrap(),
            json!({"lastName": "Benali", "status": "IN_TRAINING"})
        );
        assert!(StudentFilters::default().is_empty());
    }
}
