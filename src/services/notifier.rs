// services/notifier.rs
use crate::utils::error::ErrorMessage;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Notifications transitoires affichées à l'utilisateur
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, error: &ErrorMessage);
}

/// Notifications envoyées dans les logs (binaire)
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(notification = "success", "{}", message);
    }

    fn error(&self, error: &ErrorMessage) {
        warn!(
            notification = "error",
            code = error.code.as_deref().unwrap_or(""),
            "{}: {}",
            error.title,
            error.message
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(ErrorMessage),
}

/// Notifications conservées en mémoire
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn successes(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Success(message) => Some(message),
                Notification::Error(_) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<ErrorMessage> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Error(error) => Some(error),
                Notification::Success(_) => None,
            })
            .collect()
    }

    fn push(&self, notification: Notification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification);
        }
    }
}

impl Notifier for MemoryNotifier {
    fn success(&self, message: &str) {
        self.push(Notification::Success(message.to_string()));
    }

    fn error(&self, error: &ErrorMessage) {
        self.push(Notification::Error(error.clone()));
    }
}
