use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstructorStatus {
    Active,
    Inactive,
}

/// Moniteur de l'auto-école
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub license_number: String,
    /// Catégories enseignées, ex. ["B", "C1"]
    #[serde(default)]
    pub categories: Vec<String>,
    pub status: InstructorStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Instructor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn teaches(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InstructorDraft {
    #[validate(length(min = 1, max = 50, message = "Le prénom est requis"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Le nom est requis"))]
    pub last_name: String,
    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub phone: String,
    #[validate(length(min = 1, message = "Le numéro de permis est requis"))]
    pub license_number: String,
    #[validate(length(min = 1, message = "Au moins une catégorie est requise"))]
    pub categories: Vec<String>,
    pub status: InstructorStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstructorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InstructorStatus>,
}
