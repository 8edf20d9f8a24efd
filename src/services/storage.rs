// services/storage.rs
use crate::models::User;
use crate::utils::error::{ApiError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Clés persistées, toujours effacées ensemble
pub const TOKEN_KEY: &str = "auth_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "auth_user";

/// Stockage d'un objet JSON sur disque, relu à chaque accès
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(ApiError::Storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn save(&self, map: Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|e| ApiError::Storage(e.to_string()))?;
        let map = self.load()?;
        Ok(map.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn update<F: FnOnce(&mut Map<String, Value>)>(&self, change: F) -> Result<()> {
        let _guard = self.lock.lock().map_err(|e| ApiError::Storage(e.to_string()))?;
        let mut map = self.load()?;
        change(&mut map);
        self.save(map)
    }
}

/// Stockage en mémoire, perdu à la fin du processus
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|e| ApiError::Storage(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn update<F: FnOnce(&mut HashMap<String, String>)>(&self, change: F) -> Result<()> {
        let mut values = self.values.lock().map_err(|e| ApiError::Storage(e.to_string()))?;
        change(&mut values);
        Ok(())
    }
}

#[derive(Debug)]
enum Backend {
    File(FileStorage),
    Memory(MemoryStorage),
    Unavailable,
}

/// Magasin des identifiants de session.
///
/// Aucune opération ne renvoie d'erreur: un support indisponible ou illisible
/// se comporte comme un magasin vide (`None` / `false`) et l'incident est tracé.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    backend: Arc<Backend>,
}

impl CredentialStore {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            backend: Arc::new(Backend::File(FileStorage::new(path))),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: Arc::new(Backend::Memory(MemoryStorage::default())),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            backend: Arc::new(Backend::Unavailable),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(*self.backend, Backend::Unavailable)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let result = match &*self.backend {
            Backend::File(file) => file.get(key),
            Backend::Memory(memory) => memory.get(key),
            Backend::Unavailable => return None,
        };
        result.unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Lecture du stockage impossible");
            None
        })
    }

    pub fn set(&self, key: &str, value: &str) -> bool {
        let result = match &*self.backend {
            Backend::File(file) => file.update(|map| {
                map.insert(key.to_string(), Value::String(value.to_string()));
            }),
            Backend::Memory(memory) => memory.update(|values| {
                values.insert(key.to_string(), value.to_string());
            }),
            Backend::Unavailable => return false,
        };
        self.report(key, result)
    }

    pub fn remove(&self, key: &str) -> bool {
        let result = match &*self.backend {
            Backend::File(file) => file.update(|map| {
                map.remove(key);
            }),
            Backend::Memory(memory) => memory.update(|values| {
                values.remove(key);
            }),
            Backend::Unavailable => return false,
        };
        self.report(key, result)
    }

    fn report(&self, key: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Écriture du stockage impossible");
                false
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    /// Profil utilisateur; un contenu illisible est ignoré
    pub fn user(&self) -> Option<User> {
        let raw = self.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Profil utilisateur stocké illisible");
                None
            }
        }
    }

    /// Enregistrer le résultat d'une connexion
    pub fn save_credentials(&self, token: &str, refresh_token: Option<&str>, user: &User) -> bool {
        let user_json = match serde_json::to_string(user) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Sérialisation du profil impossible");
                return false;
            }
        };

        let mut saved = self.set(TOKEN_KEY, token) && self.set(USER_KEY, &user_json);
        saved &= match refresh_token {
            Some(refresh) => self.set(REFRESH_TOKEN_KEY, refresh),
            None => self.remove(REFRESH_TOKEN_KEY),
        };
        debug!(saved, "Identifiants enregistrés");
        saved
    }

    /// Effacer jeton, jeton de rafraîchissement et profil
    pub fn clear_credentials(&self) -> bool {
        let token = self.remove(TOKEN_KEY);
        let refresh = self.remove(REFRESH_TOKEN_KEY);
        let user = self.remove(USER_KEY);
        token && refresh && user
    }
}
