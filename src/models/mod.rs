// Modèle: candidat.rs
pub mod candidat;
pub use candidat::{
    GenderType, HumanName, License, LicenseCategory, LicenseValidity,
    Student, StudentDraft, StudentFilters, StudentPatch, StudentStatus,
};

// Modèle: exam.rs
pub mod exam;
pub use exam::{
    ExamCategory, ExamResult, ExamSlot, ExamSlotDraft, ExamStatus,
    ExamStudent, ExamStudentDraft, ExamStudentPatch,
};

// Modèle: instructor.rs
pub mod instructor;
pub use instructor::{Instructor, InstructorDraft, InstructorPatch, InstructorStatus};

// Modèle: pricing.rs
pub mod pricing;
pub use pricing::{NewPricing, Pricing, PricingCategory, PricingPatch};

// Modèle: finance.rs
pub mod finance;
pub use finance::{Invoice, Payment, PaymentStatus};

// Modèle: auth.rs
pub mod auth;
pub use auth::{AuthResponse, AuthState, LoginCredentials, RefreshResponse, User};

use serde::{Deserialize, Serialize};

/// Enveloppe paginée renvoyée par l'API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawPage<T>")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub page: u32,
    pub size: u32,
    pub first: bool,
    pub last: bool,
}

/// Forme tolérante: seul `content` est obligatoire
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage<T> {
    content: Vec<T>,
    total_elements: Option<u64>,
    total_pages: Option<u32>,
    #[serde(alias = "number")]
    page: Option<u32>,
    size: Option<u32>,
    first: Option<bool>,
    last: Option<bool>,
}

impl<T> From<RawPage<T>> for Page<T> {
    fn from(raw: RawPage<T>) -> Self {
        let len = raw.content.len();
        let total_elements = raw.total_elements.unwrap_or(len as u64);
        let size = raw.size.unwrap_or(len as u32);
        let page = raw.page.unwrap_or(0);
        let total_pages = raw.total_pages.unwrap_or(match size {
            0 => u32::from(total_elements > 0),
            size => total_elements.div_ceil(u64::from(size)) as u32,
        });

        Self {
            content: raw.content,
            total_elements,
            total_pages,
            page,
            size,
            first: raw.first.unwrap_or(page == 0),
            last: raw.last.unwrap_or(page.saturating_add(1) >= total_pages),
        }
    }
}

impl<T> Page<T> {
    /// Une collection brute devient une page unique
    pub fn single(content: Vec<T>) -> Self {
        let len = content.len();
        Self {
            content,
            total_elements: len as u64,
            total_pages: 1,
            page: 0,
            size: len as u32,
            first: true,
            last: true,
        }
    }

    /// Page vide affichée tant qu'aucune donnée n'est disponible
    pub fn empty(page_size: u32) -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            page: 0,
            size: page_size,
            first: true,
            last: true,
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Réponse de liste: paginée ou tableau brut selon le backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged(Page<T>),
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_page(self) -> Page<T> {
        match self {
            ListResponse::Paged(page) => page,
            ListResponse::Bare(items) => Page::single(items),
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Paged(page) => page.content,
            ListResponse::Bare(items) => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array_normalizes_to_single_page() {
        let raw = json!([1, 2, 3, 4, 5, 6, 7]);
        let response: ListResponse<u32> = serde_json::from_value(raw).unwrap();
        let page = response.into_page();

        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_elements, 7);
        assert_eq!(page.page, 0);
        assert_eq!(page.size, 7);
        assert!(page.first && page.last);
    }

    #[test]
    fn test_envelope_is_kept_as_is() {
        let raw = json!({
            "content": [10, 11],
            "totalElements": 42,
            "totalPages": 21,
            "page": 3,
            "size": 2,
            "first": false,
            "last": false
        });
        let response: ListResponse<u32> = serde_json::from_value(raw).unwrap();
        let page = response.into_page();

        assert_eq!(page.content, vec![10, 11]);
        assert_eq!(page.total_pages, 21);
        assert_eq!(page.page, 3);
    }

    #[test]
    fn test_partial_envelope_fills_missing_fields() {
        let raw = json!({
            "content": [],
            "totalElements": 0,
            "totalPages": 0,
            "number": 0,
            "size": 20
        });
        let response: ListResponse<u32> = serde_json::from_value(raw).unwrap();
        let page = response.into_page();

        assert!(page.is_empty());
        assert_eq!(page.page, 0);
        assert_eq!(page.size, 20);
        assert!(page.first && page.last);
    }

    #[test]
    fn test_content_only_envelope_derives_pagination() {
        let raw = json!({ "content": [1, 2, 3], "number": 1, "size": 3, "totalElements": 8 });
        let page: Page<u32> = serde_json::from_value(raw).unwrap();

        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 1);
        assert!(!page.first);
        assert!(!page.last);

        let bare: Page<u32> = serde_json::from_value(json!({ "content": [4, 5] })).unwrap();
        assert_eq!(bare, Page::single(vec![4, 5]));
    }

    #[test]
    fn test_empty_page_keeps_requested_size() {
        let page: Page<u32> = Page::empty(20);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.size, 20);
        assert!(page.is_empty());
    }
}
