use serde::{Deserialize, Serialize};
use std::fmt;

/// Catégorie tarifaire
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PricingCategory {
    A,
    B,
    C,
    D,
}

impl PricingCategory {
    pub const ALL: [PricingCategory; 4] = [
        PricingCategory::A,
        PricingCategory::B,
        PricingCategory::C,
        PricingCategory::D,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PricingCategory::A => "A",
            PricingCategory::B => "B",
            PricingCategory::C => "C",
            PricingCategory::D => "D",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for PricingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grille tarifaire d'une catégorie (montants en dinars)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub id: i64,
    pub license_category: PricingCategory,
    /// Frais de formation
    pub base_course_fee: u64,
    /// Frais par passage d'examen
    pub exam_unit_fee: u64,
    /// Timbre par passage d'examen
    pub stamp_unit_fee: u64,
    pub active: bool,
    pub max_vehicles: u32,
    pub candidates_per_vehicle: u32,
    pub bill_exam_on_justified_absence: bool,
    pub bill_stamp_on_justified_absence: bool,
    pub bill_exam_on_unjustified_absence: bool,
    pub bill_stamp_on_unjustified_absence: bool,
}

impl Pricing {
    /// Nombre de candidats pouvant être présentés par session
    pub fn total_capacity(&self) -> u32 {
        self.max_vehicles * self.candidates_per_vehicle
    }
}

/// Nouvelle grille, créée avec le barème par défaut
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPricing {
    pub license_category: PricingCategory,
    pub base_course_fee: u64,
    pub exam_unit_fee: u64,
    pub stamp_unit_fee: u64,
    pub active: bool,
    pub max_vehicles: u32,
    pub candidates_per_vehicle: u32,
    pub bill_exam_on_justified_absence: bool,
    pub bill_stamp_on_justified_absence: bool,
    pub bill_exam_on_unjustified_absence: bool,
    pub bill_stamp_on_unjustified_absence: bool,
}

impl NewPricing {
    pub fn with_defaults(license_category: PricingCategory) -> Self {
        Self {
            license_category,
            base_course_fee: 30_000,
            exam_unit_fee: 2_000,
            stamp_unit_fee: 300,
            active: true,
            max_vehicles: 2,
            candidates_per_vehicle: 20,
            bill_exam_on_justified_absence: false,
            bill_stamp_on_justified_absence: false,
            bill_exam_on_unjustified_absence: false,
            bill_stamp_on_unjustified_absence: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_course_fee: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_unit_fee: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamp_unit_fee: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_vehicles: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates_per_vehicle: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_exam_on_justified_absence: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_stamp_on_justified_absence: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_exam_on_unjustified_absence: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_stamp_on_unjustified_absence: Option<bool>,
}
