use crate::utils::helpers::{flexible_date, flexible_date_opt};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Épreuve passée par le candidat
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamCategory {
    Code,         // Code de la route
    Conduite,     // Conduite
    #[serde(alias = "PLATEAU")]
    Creneau,      // Créneau / plateau
    Circulation,  // Circulation
}

impl ExamCategory {
    pub const ALL: [ExamCategory; 4] = [
        ExamCategory::Code,
        ExamCategory::Conduite,
        ExamCategory::Creneau,
        ExamCategory::Circulation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamCategory::Code => "CODE",
            ExamCategory::Conduite => "CONDUITE",
            ExamCategory::Creneau => "CRENEAU",
            ExamCategory::Circulation => "CIRCULATION",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("PLATEAU") {
            return Some(ExamCategory::Creneau);
        }
        Self::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

impl Default for ExamCategory {
    fn default() -> Self {
        ExamCategory::Code
    }
}

impl fmt::Display for ExamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// État d'une participation à un créneau
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamStatus {
    Planned,
    Scheduled,
    Passed,
    Cancelled,
}

/// Résultat d'une épreuve
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamResult {
    Pass,
    Fail,
    Pending,
    AbsentJustified,
    AbsentUnjustified,
}

impl ExamResult {
    /// Statut de la participation une fois le résultat saisi
    pub fn resulting_status(&self) -> ExamStatus {
        match self {
            ExamResult::Pending => ExamStatus::Planned,
            _ => ExamStatus::Passed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExamResult::Pass => "Admis",
            ExamResult::Fail => "Ajourné",
            ExamResult::Pending => "En attente",
            ExamResult::AbsentJustified => "Absent justifié",
            ExamResult::AbsentUnjustified => "Absent non justifié",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PASS" => Some(ExamResult::Pass),
            "FAIL" => Some(ExamResult::Fail),
            "PENDING" => Some(ExamResult::Pending),
            "ABSENT_JUSTIFIED" => Some(ExamResult::AbsentJustified),
            "ABSENT_UNJUSTIFIED" => Some(ExamResult::AbsentUnjustified),
            _ => None,
        }
    }
}

/// Session d'examen planifiée
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamSlot {
    pub id: i64,

    #[serde(with = "flexible_date")]
    pub exam_date: NaiveDate,

    /// Wilaya où se tient l'examen
    #[serde(default)]
    pub wilaya: String,

    /// Centre d'examen
    #[serde(default)]
    pub center: String,

    /// Date limite de dépôt de la liste des candidats
    #[serde(default, with = "flexible_date_opt")]
    pub deadline_list: Option<NaiveDate>,

    #[serde(default)]
    pub active: bool,
}

/// Création d'un créneau, les champs absents prennent les valeurs de configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamSlotDraft {
    #[serde(with = "flexible_date")]
    pub exam_date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wilaya: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<String>,

    #[serde(
        default,
        with = "flexible_date_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline_list: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl ExamSlotDraft {
    pub fn on(exam_date: NaiveDate) -> Self {
        Self {
            exam_date,
            wilaya: None,
            center: None,
            deadline_list: None,
            active: None,
        }
    }
}

/// Participation d'un candidat à un créneau pour une épreuve
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamStudent {
    pub id: i64,

    pub student_id: i64,

    #[serde(default)]
    pub exam_slot_id: Option<i64>,

    pub category: ExamCategory,

    pub status: ExamStatus,

    #[serde(default)]
    pub result: Option<ExamResult>,

    #[serde(default, with = "flexible_date_opt")]
    pub date: Option<NaiveDate>,
}

/// Création d'une participation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamStudentDraft {
    pub student_id: i64,

    pub exam_slot_id: i64,

    pub category: ExamCategory,

    pub status: ExamStatus,

    #[serde(with = "flexible_date")]
    pub date: NaiveDate,
}

/// Modification partielle d'une participation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamStudentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ExamCategory>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExamStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExamResult>,
}

impl ExamStudentPatch {
    /// Saisie d'un résultat avec le statut qui en découle
    pub fn result(result: ExamResult) -> Self {
        Self {
            category: None,
            status: Some(result.resulting_status()),
            result: Some(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_drives_status() {
        assert_eq!(ExamResult::Pending.resulting_status(), ExamStatus::Planned);
        assert_eq!(ExamResult::Pass.resulting_status(), ExamStatus::Passed);
        assert_eq!(ExamResult::Fail.resulting_status(), ExamStatus::Passed);
        assert_eq!(ExamResult::AbsentJustified.resulting_status(), ExamStatus::Passed);
    }

    #[test]
    fn test_plateau_is_an_alias_of_creneau() {
        let category: ExamCategory = serde_json::from_value(json!("PLATEAU")).unwrap();
        assert_eq!(category, ExamCategory::Creneau);
        assert_eq!(ExamCategory::parse("plateau"), Some(ExamCategory::Creneau));
        assert_eq!(serde_json::to_value(ExamCategory::Creneau).unwrap(), json!("CRENEAU"));
    }

    #[test]
    fn test_exam_student_wire_format() {
        let raw = json!({
            "id": 5,
            "studentId": 12,
            "examSlotId": 3,
            "category": "CODE",
            "status": "PLANNED",
            "result": "ABSENT_UNJUSTIFIED",
            "date": "2026-11-04T00:00:00"
        });
        let record: ExamStudent = serde_json::from_value(raw).unwrap();
        assert_eq!(record.result, Some(ExamResult::AbsentUnjustified));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 11, 4));
    }

    #[test]
    fn test_result_patch_payload() {
        let patch = ExamStudentPatch::result(ExamResult::Pending);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"status": "PLANNED", "result": "PENDING"})
        );
    }
}
