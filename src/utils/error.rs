// utils/error.rs
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    // Erreurs de transport
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    // Erreurs HTTP
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Unexpected error: {0}")]
    Unknown(String),

    // Erreurs d'authentification
    #[error("Invalid credentials")]
    InvalidCredentials,

    // Erreurs locales
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Message affichable dans une notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub title: String,
    pub message: String,
    pub code: Option<String>,
}

impl ErrorMessage {
    fn new(title: &str, message: impl Into<String>, code: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            code: code.map(str::to_string),
        }
    }
}

/// Corps d'erreur renvoyé par l'API
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Classer une réponse non-2xx
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let server_message = server_message(body);
        let message = server_message
            .clone()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

        match status.as_u16() {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            422 => ApiError::Validation(message),
            503 => ApiError::ServiceUnavailable,
            code @ 500..=599 => ApiError::Server { status: code, message },
            code => ApiError::Unknown(format!("HTTP {}: {}", code, message)),
        }
    }

    /// Code HTTP associé, quand l'erreur vient d'une réponse
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict(_) => Some(409),
            ApiError::Validation(_) => Some(422),
            ApiError::Server { status, .. } => Some(*status),
            ApiError::ServiceUnavailable => Some(503),
            _ => None,
        }
    }

    /// Seules les erreurs réseau, timeout et 5xx sont rejouées
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_)
                | ApiError::Timeout
                | ApiError::Server { .. }
                | ApiError::ServiceUnavailable
        )
    }

    /// Traduire l'erreur en message utilisateur
    pub fn to_error_message(&self) -> ErrorMessage {
        match self {
            ApiError::BadRequest(msg) => ErrorMessage::new(
                "Requête invalide",
                non_empty(msg, "Les données envoyées sont invalides."),
                Some("BAD_REQUEST"),
            ),
            ApiError::Unauthorized => ErrorMessage::new(
                "Non autorisé",
                "Votre session a expiré. Veuillez vous reconnecter.",
                Some("UNAUTHORIZED"),
            ),
            ApiError::InvalidCredentials => ErrorMessage::new(
                "Non autorisé",
                "Email ou mot de passe incorrect.",
                Some("UNAUTHORIZED"),
            ),
            ApiError::Forbidden => ErrorMessage::new(
                "Accès refusé",
                "Vous n'avez pas les permissions nécessaires pour effectuer cette action.",
                Some("FORBIDDEN"),
            ),
            ApiError::NotFound(_) => ErrorMessage::new(
                "Ressource introuvable",
                "La ressource demandée n'a pas été trouvée.",
                Some("NOT_FOUND"),
            ),
            ApiError::Conflict(msg) => ErrorMessage::new(
                "Conflit",
                non_empty(msg, "Cette ressource existe déjà."),
                Some("CONFLICT"),
            ),
            ApiError::Validation(msg) => ErrorMessage::new(
                "Erreur de validation",
                non_empty(msg, "Les données fournies ne sont pas valides."),
                Some("VALIDATION_ERROR"),
            ),
            ApiError::Server { .. } => ErrorMessage::new(
                "Erreur serveur",
                "Une erreur s'est produite sur le serveur. Veuillez réessayer plus tard.",
                Some("SERVER_ERROR"),
            ),
            ApiError::ServiceUnavailable => ErrorMessage::new(
                "Service indisponible",
                "Le service est temporairement indisponible. Veuillez réessayer plus tard.",
                Some("SERVICE_UNAVAILABLE"),
            ),
            ApiError::Timeout => ErrorMessage::new(
                "Timeout",
                "La requête a pris trop de temps. Veuillez réessayer.",
                Some("TIMEOUT"),
            ),
            ApiError::Network(_) => ErrorMessage::new(
                "Erreur réseau",
                "Impossible de se connecter au serveur. Vérifiez votre connexion internet.",
                Some("NETWORK_ERROR"),
            ),
            ApiError::Unknown(msg) => ErrorMessage::new(
                "Erreur de connexion",
                non_empty(
                    msg,
                    "Une erreur s'est produite lors de la communication avec le serveur.",
                ),
                Some("CONNECTION_ERROR"),
            ),
            ApiError::Parse(_) | ApiError::Storage(_) | ApiError::Config(_) => {
                error!("Erreur locale: {}", self);
                ErrorMessage::new(
                    "Erreur",
                    "Une erreur inattendue s'est produite. Veuillez réessayer.",
                    None,
                )
            }
        }
    }
}

fn server_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}

fn non_empty(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() || err.is_request() {
            ApiError::Network(err.to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status, "")
        } else {
            ApiError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<std::env::VarError> for ApiError {
    fn from(err: std::env::VarError) -> Self {
        ApiError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let error_messages: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect();
        messages.sort();

        ApiError::Validation(messages.join("; "))
    }
}

// Type de résultat standard
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message":"champ manquant"}"#),
            ApiError::BadRequest("champ manquant".to_string())
        );
        assert_eq!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized);
        assert_eq!(ApiError::from_status(StatusCode::FORBIDDEN, ""), ApiError::Forbidden);
        assert_eq!(
            ApiError::from_status(StatusCode::CONFLICT, r#"{"error":"déjà configuré"}"#),
            ApiError::Conflict("déjà configuré".to_string())
        );
        assert_eq!(
            ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            ApiError::ServiceUnavailable
        );
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "not json"),
            ApiError::Server { status: 502, .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::Unknown(_)
        ));
    }

    #[test]
    fn test_retry_classes() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::Network("refused".into()).is_retryable());
        assert!(ApiError::ServiceUnavailable.is_retryable());
        assert!(ApiError::Server { status: 500, message: String::new() }.is_retryable());

        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::Forbidden.is_retryable());
        assert!(!ApiError::NotFound(String::new()).is_retryable());
        assert!(!ApiError::Validation(String::new()).is_retryable());
    }

    #[test]
    fn test_error_message_prefers_server_text() {
        let msg = ApiError::Validation("Téléphone invalide".into()).to_error_message();
        assert_eq!(msg.title, "Erreur de validation");
        assert_eq!(msg.message, "Téléphone invalide");
        assert_eq!(msg.code.as_deref(), Some("VALIDATION_ERROR"));

        let msg = ApiError::Conflict(String::new()).to_error_message();
        assert_eq!(msg.message, "Cette ressource existe déjà.");
    }

    #[test]
    fn test_error_message_fixed_texts() {
        let msg = ApiError::Unauthorized.to_error_message();
        assert_eq!(msg.code.as_deref(), Some("UNAUTHORIZED"));

        let msg = ApiError::Server { status: 500, message: "stacktrace".into() }.to_error_message();
        assert_eq!(msg.code.as_deref(), Some("SERVER_ERROR"));
        assert!(!msg.message.contains("stacktrace"));

        let msg = ApiError::Storage("disk".into()).to_error_message();
        assert_eq!(msg.code, None);
    }
}
