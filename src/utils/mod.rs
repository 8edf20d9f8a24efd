// utils/mod.rs
pub mod error;
pub mod config;
pub mod validation;
pub mod helpers;

// Ré-exports pour faciliter l'import
pub use error::{ApiError, ErrorMessage, Result};
pub use config::ClientConfig;
pub use validation::{
    validate_phone, age_on, check_birth_date,
    validate_adult_birth_date, validate_owned_licenses,
    validate_photo_data_uri, validate_positive_amount,
    sanitize_string, validate_object,
};
pub use helpers::{
    parse_calendar_date, merge_json,
    to_query_pairs, truncate_string,
};
