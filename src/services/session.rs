// services/session.rs
use crate::models::{AuthState, User};
use crate::services::storage::CredentialStore;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Session partagée entre le client HTTP et le gestionnaire d'authentification.
///
/// Lecture libre; les écritures passent uniquement par `AuthService` et par
/// le traitement des 401 du client HTTP.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<AuthState>>,
    store: CredentialStore,
}

impl SessionHandle {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            state: Arc::new(RwLock::new(AuthState::default())),
            store,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Jeton joint aux requêtes sortantes
    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn snapshot(&self) -> AuthState {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated
    }

    fn read(&self) -> RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Recharger la session depuis le stockage persistant
    pub(crate) fn restore(&self) -> AuthState {
        let token = self.store.token();
        let user = self.store.user();
        let restored = AuthState {
            is_authenticated: token.is_some() && user.is_some(),
            user,
            token,
        };

        *self.write() = restored.clone();
        debug!(authenticated = restored.is_authenticated, "Session restaurée");
        restored
    }

    pub(crate) fn establish(&self, token: &str, refresh_token: Option<&str>, user: User) {
        let mut state = self.write();
        self.store.save_credentials(token, refresh_token, &user);
        info!(user_id = user.id, "Session ouverte");
        *state = AuthState {
            user: Some(user),
            token: Some(token.to_string()),
            is_authenticated: true,
        };
    }

    pub(crate) fn replace_token(&self, token: &str) {
        let mut state = self.write();
        self.store.set(crate::services::storage::TOKEN_KEY, token);
        state.token = Some(token.to_string());
        state.is_authenticated = state.user.is_some();
        debug!("Jeton renouvelé");
    }

    /// Effacer la session, sans condition
    pub(crate) fn clear(&self) {
        let mut state = self.write();
        self.store.clear_credentials();
        *state = AuthState::default();
        info!("Session fermée");
    }

    /// Effacer la session suite à un 401 reçu pour une requête envoyée avec `sent_token`.
    ///
    /// Renvoie `false` quand la session a déjà changé depuis l'envoi (effacée par une
    /// autre requête ou rouverte): l'appelant ne doit alors pas rediriger.
    pub(crate) fn expire(&self, sent_token: Option<&str>) -> bool {
        let mut state = self.write();
        if state.token.as_deref() != sent_token {
            debug!("Session déjà modifiée, 401 ignoré");
            return false;
        }
        self.store.clear_credentials();
        *state = AuthState::default();
        info!("Session expirée");
        true
    }
}
