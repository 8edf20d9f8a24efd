// services/mod.rs
pub mod storage;
pub mod session;
pub mod navigator;
pub mod notifier;
pub mod http;
pub mod cache;

// Ré-exports pour faciliter l'import
pub use storage::{CredentialStore, FileStorage, MemoryStorage};
pub use session::SessionHandle;
pub use navigator::{login_location, MemoryNavigator, Navigator, TracingNavigator};
pub use notifier::{MemoryNotifier, Notification, Notifier, TracingNotifier};
pub use http::{ApiRequest, HttpClient};
pub use cache::{CacheStats, Lookup, QueryCache, QueryKey, ResourceKind, Scope};
