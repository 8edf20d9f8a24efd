// core/auth_service.rs
use crate::models::{AuthResponse, AuthState, LoginCredentials, RefreshResponse};
use crate::services::cache::QueryCache;
use crate::services::http::{ApiRequest, HttpClient};
use crate::services::session::SessionHandle;
use crate::utils::error::{ApiError, Result};
use crate::utils::validation::validate_object;
use serde_json::json;
use tracing::{info, warn};

/// Seul point d'écriture de la session: connexion, déconnexion, renouvellement
#[derive(Clone)]
pub struct AuthService {
    http: HttpClient,
    cache: QueryCache,
}

impl AuthService {
    pub fn new(http: HttpClient, cache: QueryCache) -> Self {
        Self { http, cache }
    }

    fn session(&self) -> &SessionHandle {
        self.http.session()
    }

    /// Restaurer la session persistée au démarrage
    pub fn initialize(&self) -> AuthState {
        self.session().restore()
    }

    pub fn state(&self) -> AuthState {
        self.session().snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthState> {
        validate_object(credentials)?;

        let request = ApiRequest::post("/auth/login").anonymous().json(credentials)?;
        let response: AuthResponse = self.http.request(&request).await.map_err(|e| match e {
            ApiError::BadRequest(_) | ApiError::Unauthorized => ApiError::InvalidCredentials,
            other => other,
        })?;

        // Les lectures de l'utilisateur précédent ne doivent pas être servies
        self.cache.clear().await;
        self.session().establish(
            &response.token,
            response.refresh_token.as_deref(),
            response.user,
        );
        info!(email = %credentials.email, "Connexion réussie");
        Ok(self.state())
    }

    /// Toujours effective localement, même si l'API est injoignable
    pub async fn logout(&self) {
        if self.session().token().is_some() {
            if let Err(e) = self.http.execute(&ApiRequest::post("/auth/logout")).await {
                warn!(error = %e, "Déconnexion côté serveur échouée, poursuite locale");
            }
        }
        self.session().clear();
        self.cache.clear().await;
    }

    /// Échanger le jeton de rafraîchissement; `None` s'il n'y en a pas.
    /// Un échec ferme la session.
    pub async fn refresh_token(&self) -> Result<Option<String>> {
        let Some(refresh_token) = self.session().store().refresh_token() else {
            return Ok(None);
        };

        let request = ApiRequest::post("/auth/refresh")
            .anonymous()
            .body(json!({ "refreshToken": refresh_token }));

        match self.http.request::<RefreshResponse>(&request).await {
            Ok(response) => {
                self.session().replace_token(&response.token);
                Ok(Some(response.token))
            }
            Err(e) => {
                warn!(error = %e, "Renouvellement du jeton échoué");
                self.logout().await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::services::navigator::MemoryNavigator;
    use crate::services::storage::CredentialStore;
    use crate::utils::config::ClientConfig;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer, store: CredentialStore) -> AuthService {
        let config = ClientConfig::default().with_api_url(server.uri());
        let session = SessionHandle::new(store);
        let http = HttpClient::new(&config, session, Arc::new(MemoryNavigator::at("/fr"))).unwrap();
        AuthService::new(http, QueryCache::new(Duration::from_secs(30)))
    }

    fn credentials(password: &str) -> LoginCredentials {
        LoginCredentials {
            email: "admin@auto-ecole.dz".to_string(),
            password: password.to_string(),
        }
    }

    fn login_response() -> serde_json::Value {
        json!({
            "token": "jeton-1",
            "refreshToken": "refresh-1",
            "user": {"id": 1, "email": "admin@auto-ecole.dz", "name": "Admin"}
        })
    }

    #[tokio::test]
    async fn test_login_persists_across_restart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "admin@auto-ecole.dz", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_response()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("credentials.json");

        let auth = service(&server, CredentialStore::file(&file));
        let state = auth.login(&credentials("secret")).await.unwrap();
        assert!(state.is_authenticated);
        assert_eq!(state.token.as_deref(), Some("jeton-1"));

        // Nouveau processus: la session est relue depuis le disque
        let restarted = service(&server, CredentialStore::file(&file));
        let restored = restarted.initialize();
        assert!(restored.is_authenticated);
        assert_eq!(restored.user.unwrap().name.as_deref(), Some("Admin"));
    }

    #[tokio::test]
    async fn test_rejected_login_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let auth = service(&server, CredentialStore::memory());
        assert_eq!(
            auth.login(&credentials("wrong")).await.unwrap_err(),
            ApiError::InvalidCredentials
        );
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_validates_locally() {
        let server = MockServer::start().await;
        let auth = service(&server, CredentialStore::memory());

        let invalid = LoginCredentials {
            email: "pas-un-email".to_string(),
            password: String::new(),
        };
        assert!(matches!(
            auth.login(&invalid).await.unwrap_err(),
            ApiError::Validation(_)
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_succeeds_when_server_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .and(header("authorization", "Bearer jeton"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let store = CredentialStore::memory();
        let auth = service(&server, store.clone());
        auth.session().establish("jeton", Some("refresh"), User {
            id: 1,
            email: "admin@auto-ecole.dz".to_string(),
            name: None,
            role: None,
        });

        auth.logout().await;
        assert_eq!(auth.state(), AuthState::default());
        assert_eq!(store.token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[tokio::test]
    async fn test_refresh_token_lifecycle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({"refreshToken": "refresh-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "jeton-2"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let store = CredentialStore::memory();
        let auth = service(&server, store.clone());
        assert_eq!(auth.refresh_token().await.unwrap(), None);

        auth.session().establish("jeton-1", Some("refresh-1"), User {
            id: 1,
            email: "admin@auto-ecole.dz".to_string(),
            name: None,
            role: None,
        });

        assert_eq!(auth.refresh_token().await.unwrap().as_deref(), Some("jeton-2"));
        assert_eq!(store.token().as_deref(), Some("jeton-2"));
        assert!(auth.is_authenticated());

        assert!(auth.refresh_token().await.is_err());
        assert!(!auth.is_authenticated());
        assert_eq!(store.refresh_token(), None);
    }
}
