// src/lib.rs
// Modules principaux
pub mod models;
pub mod core;
pub mod services;
pub mod utils;
pub mod state;

// Ré-exports pour faciliter l'utilisation
pub use models::*;
pub use self::core::*;
pub use services::*;
pub use utils::*;
pub use state::AppState;

// Version de l'application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Auto-École Manager";

// Types communs
pub use chrono::NaiveDate;
pub use serde::{Serialize, Deserialize};
pub use validator::Validate;
