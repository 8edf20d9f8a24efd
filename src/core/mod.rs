// core/mod.rs
pub mod resource;
pub mod filters;
pub mod auth_service;
pub mod candidat_service;
pub mod exam_service;
pub mod instructor_service;
pub mod pricing_service;
pub mod finance_service;
pub mod assignment;

// Ré-exports pour faciliter l'import
pub use resource::{QueryContext, Resource, ResourceHooks};
pub use filters::{reduce, CandidateTab, FilterChange, FilterController, ListQuery, TextField};
pub use auth_service::AuthService;
pub use candidat_service::CandidatService;
pub use exam_service::{ExamSlotService, ExamStudentService};
pub use instructor_service::InstructorService;
pub use pricing_service::PricingService;
pub use finance_service::FinanceService;
pub use assignment::{AssignedParticipant, ExamAssignmentWorkflow, SlotRoster};
