// services/navigator.rs
use std::sync::{Arc, Mutex};
use tracing::info;

/// Navigation côté client (redirection vers l'écran de connexion)
pub trait Navigator: Send + Sync {
    /// Chemin actuellement affiché
    fn current_path(&self) -> String;

    fn navigate(&self, location: &str);
}

/// Construire l'adresse de connexion en conservant le chemin demandé
pub fn login_location(login_path: &str, current_path: &str) -> String {
    format!("{}?redirect={}", login_path, urlencoding::encode(current_path))
}

/// Navigateur du binaire: le chemin est fixe et la redirection est tracée
#[derive(Debug, Clone)]
pub struct TracingNavigator {
    path: String,
}

impl TracingNavigator {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Navigator for TracingNavigator {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn navigate(&self, location: &str) {
        info!(location = %location, "Session expirée, reconnexion requise");
    }
}

#[derive(Debug, Default)]
struct History {
    current: String,
    redirects: Vec<String>,
}

/// Navigateur en mémoire avec historique des redirections
#[derive(Debug, Clone, Default)]
pub struct MemoryNavigator {
    history: Arc<Mutex<History>>,
}

impl MemoryNavigator {
    pub fn at(path: impl Into<String>) -> Self {
        let navigator = Self::default();
        navigator.visit(path);
        navigator
    }

    pub fn visit(&self, path: impl Into<String>) {
        if let Ok(mut history) = self.history.lock() {
            history.current = path.into();
        }
    }

    pub fn redirects(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|h| h.redirects.clone())
            .unwrap_or_default()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.history
            .lock()
            .map(|h| h.current.clone())
            .unwrap_or_default()
    }

    fn navigate(&self, location: &str) {
        if let Ok(mut history) = self.history.lock() {
            history.redirects.push(location.to_string());
            history.current = location.to_string();
        }
    }
}
