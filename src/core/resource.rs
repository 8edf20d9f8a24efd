// core/resource.rs
use crate::models::{ListResponse, Page};
use crate::services::cache::{Lookup, QueryCache, QueryKey, ResourceKind};
use crate::services::http::{ApiRequest, HttpClient};
use crate::services::notifier::Notifier;
use crate::utils::error::{ApiError, Result};
use crate::utils::helpers::merge_json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ressource exposée par l'API REST sous `ENDPOINT`
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;
    const ENDPOINT: &'static str;

    /// Libellé utilisé dans les messages d'erreur
    const LABEL: &'static str;
    const CREATED: &'static str;
    const UPDATED: &'static str;
    const DELETED: &'static str;

    fn id(&self) -> i64;
}

/// Dépendances partagées par toutes les lectures et écritures
#[derive(Clone)]
pub struct QueryContext {
    pub http: HttpClient,
    pub cache: QueryCache,
    pub notifier: Arc<dyn Notifier>,
    pub read_retries: u32,
    pub retry_delay: Duration,
}

impl QueryContext {
    pub fn new(
        http: HttpClient,
        cache: QueryCache,
        notifier: Arc<dyn Notifier>,
        read_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            http,
            cache,
            notifier,
            read_retries,
            retry_delay,
        }
    }

    /// Lecture à travers le cache.
    ///
    /// Fraîche: servie telle quelle. Périmée: servie, puis rafraîchie en tâche de fond.
    /// Invalidée ou absente: rechargée avant d'être servie. En cas d'échec, la valeur
    /// précédente est renvoyée si elle existe.
    pub async fn read(&self, key: QueryKey, request: ApiRequest) -> Result<Value> {
        match self.cache.lookup(&key).await {
            Lookup::Fresh(value) => {
                debug!(key = %key, "Cache frais");
                Ok(value)
            }
            Lookup::Stale(value) => {
                debug!(key = %key, "Cache périmé, rafraîchissement en arrière-plan");
                self.spawn_refresh(key, request);
                Ok(value)
            }
            Lookup::Refreshing(value) => {
                debug!(key = %key, "Cache périmé, rafraîchissement déjà en cours");
                Ok(value)
            }
            Lookup::Invalidated(previous) => self.fetch_and_store(key, request, Some(previous)).await,
            Lookup::Miss => self.fetch_and_store(key, request, None).await,
        }
    }

    pub async fn read_as<T: DeserializeOwned>(&self, key: QueryKey, request: ApiRequest) -> Result<T> {
        let value = self.read(key, request).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn fetch_and_store(
        &self,
        key: QueryKey,
        request: ApiRequest,
        previous: Option<Value>,
    ) -> Result<Value> {
        let generation = self.cache.generation(key.kind).await;
        match self.fetch_with_retry(&request).await {
            Ok(value) => {
                self.cache.store(key, value.clone(), generation).await;
                Ok(value)
            }
            Err(e) => {
                self.notifier.error(&e.to_error_message());
                match previous {
                    Some(value) => {
                        warn!(key = %key, error = %e, "Lecture échouée, données précédentes conservées");
                        Ok(value)
                    }
                    None => Err(e),
                }
            }
        }
    }

    fn spawn_refresh(&self, key: QueryKey, request: ApiRequest) {
        let ctx = self.clone();
        tokio::spawn(async move {
            let generation = ctx.cache.generation(key.kind).await;
            match ctx.fetch_with_retry(&request).await {
                Ok(value) => ctx.cache.store(key, value, generation).await,
                Err(e) => {
                    warn!(key = %key, error = %e, "Rafraîchissement en arrière-plan échoué");
                    ctx.cache.release_refresh(&key).await;
                    ctx.notifier.error(&e.to_error_message());
                }
            }
        });
    }

    /// Une seule nouvelle tentative, et seulement pour les erreurs réseau, timeout et 5xx
    async fn fetch_with_retry(&self, request: &ApiRequest) -> Result<Value> {
        let mut attempt = 0;
        loop {
            match self.http.execute(request).await {
                Ok(value) => return Ok(value.unwrap_or(Value::Null)),
                Err(e) if e.is_retryable() && attempt < self.read_retries => {
                    attempt += 1;
                    warn!(path = %request.path, attempt, error = %e, "Nouvelle tentative de lecture");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Écriture: jamais rejouée; invalidation puis notification après succès uniquement
    pub async fn mutate(
        &self,
        request: ApiRequest,
        kind: ResourceKind,
        success_message: &str,
    ) -> Result<Option<Value>> {
        match self.http.execute(&request).await {
            Ok(value) => {
                self.cache.invalidate(kind.invalidation_set()).await;
                info!(method = %request.method, path = %request.path, "Écriture confirmée");
                self.notifier.success(success_message);
                Ok(value)
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Notifier un échec et le rendre à l'appelant
    pub fn reject(&self, error: ApiError) -> ApiError {
        warn!(error = %error, "Opération refusée");
        self.notifier.error(&error.to_error_message());
        error
    }
}

fn decode<T: DeserializeOwned>(value: Option<Value>) -> Result<T> {
    Ok(serde_json::from_value(value.unwrap_or(Value::Null))?)
}

/// Lectures et écritures génériques d'une ressource
pub struct ResourceHooks<R: Resource> {
    ctx: QueryContext,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceHooks<R> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceHooks<R> {
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            _resource: PhantomData,
        }
    }

    pub fn context(&self) -> &QueryContext {
        &self.ctx
    }

    pub fn item_path(id: i64) -> String {
        format!("{}/{}", R::ENDPOINT, id)
    }

    pub fn list_key(params: Vec<(String, String)>) -> QueryKey {
        QueryKey::list(R::KIND, params)
    }

    pub fn item_key(id: i64) -> QueryKey {
        QueryKey::item(R::KIND, id)
    }

    /// Liste paginée; un tableau brut devient une page unique
    pub async fn list_page(&self, params: Vec<(String, String)>) -> Result<Page<R>> {
        let request = ApiRequest::get(R::ENDPOINT).params(params.clone());
        let response: ListResponse<R> = self.ctx.read_as(Self::list_key(params), request).await?;
        Ok(response.into_page())
    }

    /// Liste à plat, quelle que soit la forme de la réponse
    pub async fn list(&self, params: Vec<(String, String)>) -> Result<Vec<R>> {
        let request = ApiRequest::get(R::ENDPOINT).params(params.clone());
        let response: ListResponse<R> = self.ctx.read_as(Self::list_key(params), request).await?;
        Ok(response.into_items())
    }

    pub async fn get(&self, id: i64) -> Result<R> {
        let request = ApiRequest::get(Self::item_path(id));
        self.ctx.read_as(Self::item_key(id), request).await
    }

    pub async fn create<D: Serialize + ?Sized>(&self, draft: &D) -> Result<R> {
        let request = ApiRequest::post(R::ENDPOINT).json(draft)?;
        let created = self.ctx.mutate(request, R::KIND, R::CREATED).await?;
        decode(created)
    }

    /// Mise à jour complète: l'enregistrement courant (cache, sinon API) est fusionné
    /// avec `patch` puis envoyé en entier.
    pub async fn update<P: Serialize + ?Sized>(&self, id: i64, patch: &P) -> Result<R> {
        let baseline = match self.baseline(id).await {
            Ok(baseline) => baseline,
            Err(e) => return Err(self.ctx.reject(e)),
        };

        let mut payload = merge_json(baseline, serde_json::to_value(patch)?)?;
        if let Value::Object(map) = &mut payload {
            map.insert("id".to_string(), Value::from(id));
        }

        let request = ApiRequest::put(Self::item_path(id)).body(payload.clone());
        let updated = self.ctx.mutate(request, R::KIND, R::UPDATED).await?;
        // Certains endpoints renvoient un corps vide: la charge envoyée fait foi
        decode(Some(updated.unwrap_or(payload)))
    }

    async fn baseline(&self, id: i64) -> Result<Value> {
        if let Some(cached) = self.ctx.cache.peek(&Self::item_key(id)).await {
            debug!(kind = %R::KIND, id, "Base de mise à jour lue dans le cache");
            return Ok(cached);
        }

        let request = ApiRequest::get(Self::item_path(id));
        match self.ctx.http.execute(&request).await {
            Ok(Some(value)) if value.is_object() => Ok(value),
            Ok(_) | Err(_) => Err(ApiError::NotFound(format!(
                "Impossible de récupérer {} {} pour la mise à jour",
                R::LABEL,
                id
            ))),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let request = ApiRequest::delete(Self::item_path(id));
        self.ctx.mutate(request, R::KIND, R::DELETED).await?;
        self.ctx.cache.remove(&Self::item_key(id)).await;
        Ok(())
    }
}
