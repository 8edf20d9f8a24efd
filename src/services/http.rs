// services/http.rs
use crate::services::navigator::{login_location, Navigator};
use crate::services::session::SessionHandle;
use crate::utils::config::ClientConfig;
use crate::utils::error::{ApiError, Result};
use crate::utils::helpers::truncate_string;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Requête vers l'API REST
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Joindre le jeton et appliquer le traitement global des 401
    pub authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        Ok(self.body(serde_json::to_value(body)?))
    }

    /// Requête hors session (connexion, rafraîchissement)
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// Client HTTP de l'API: URL de base, JSON, jeton Bearer et gestion des 401.
/// Aucune nouvelle tentative à ce niveau.
#[derive(Clone)]
pub struct HttpClient {
    http_client: Arc<ReqwestClient>,
    base_url: String,
    login_path: String,
    session: SessionHandle,
    navigator: Arc<dyn Navigator>,
}

impl HttpClient {
    pub fn new(
        config: &ClientConfig,
        session: SessionHandle,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client: Arc::new(http_client),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Envoyer la requête; `None` pour une réponse 2xx sans corps
    pub async fn execute(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let token = if request.authenticated {
            self.session.token()
        } else {
            None
        };

        let mut builder = self
            .http_client
            .request(request.method.clone(), self.url(&request.path))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            params = ?request.params,
            authenticated = token.is_some(),
            "Requête API"
        );

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "Échec réseau");
            ApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED && request.authenticated {
            self.handle_unauthorized(token.as_deref());
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let error = ApiError::from_status(status, &text);
            warn!(
                method = %request.method,
                path = %request.path,
                status = status.as_u16(),
                body = %truncate_string(&text, 200),
                "Réponse API en erreur"
            );
            return Err(error);
        }

        debug!(method = %request.method, path = %request.path, status = status.as_u16(), "Réponse API");

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Réponse décodée; un corps vide est lu comme `null`
    pub async fn request<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let value = self.execute(request).await?.unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    pub async fn request_optional<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Option<T>> {
        match self.execute(request).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn handle_unauthorized(&self, sent_token: Option<&str>) {
        if !self.session.expire(sent_token) {
            return;
        }
        let location = login_location(&self.login_path, &self.navigator.current_path());
        warn!(location = %location, "401 reçu, redirection vers la connexion");
        self.navigator.navigate(&location);
    }
}
