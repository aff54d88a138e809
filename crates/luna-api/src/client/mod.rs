use std::sync::{Arc, PoisonError, RwLock};

use luna_logging::LogBuffer;
use luna_settings::SettingsStore;
use luna_types::{keys, LoginResult, TokenResponse};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::{endpoint, normalize_server_url, DEBUG_LOGS_PATH, LOGIN_PATH};
use crate::error::ApiError;

pub mod chat;
pub mod resources;

pub use chat::{ChatCallbacks, ChatHandler};

/// Client for the Luna Villa backend.
///
/// Server address and auth token are read from the settings store at
/// construction and written back whenever they change. All methods take
/// `&self`, so one client can serve several concurrent requests.
pub struct ApiClient {
    http: reqwest::Client,
    store: Arc<dyn SettingsStore>,
    base_url: RwLock<String>,
    token: RwLock<Option<String>>,
    verbose: bool,
}

impl ApiClient {
    pub fn new(store: Arc<dyn SettingsStore>) -> Result<Self, ApiError> {
        let base_url = normalize_server_url(&store.get(keys::SERVER_URL)?.unwrap_or_default());
        let token = store.get(keys::AUTH_TOKEN)?.filter(|t| !t.is_empty());

        Ok(Self {
            http: reqwest::Client::new(),
            store,
            base_url: RwLock::new(base_url),
            token: RwLock::new(token),
            verbose: false,
        })
    }

    /// Print request and stream diagnostics to the console
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn server_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_server_url(&self, url: &str) -> Result<(), ApiError> {
        let url = normalize_server_url(url);
        self.store.set(keys::SERVER_URL, &url)?;
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = url;
        Ok(())
    }

    /// Point this client at `url` without saving it
    pub fn use_server_url(&self, url: &str) {
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = normalize_server_url(url);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn verbose(&self) -> bool {
        self.verbose
    }

    fn set_token(&self, token: Option<String>) -> Result<(), ApiError> {
        match &token {
            Some(t) => self.store.set(keys::AUTH_TOKEN, t)?,
            None => self.store.remove(keys::AUTH_TOKEN)?,
        }
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
        Ok(())
    }

    pub async fn login(&self, password: &str) -> LoginResult {
        let url = endpoint(&self.server_url(), LOGIN_PATH);
        let response = match self
            .http
            .post(&url)
            .json(&serde_json::json!({ "password": password }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::error!("Login error: {}", e);
                return LoginResult::NetworkError;
            }
        };

        if response.status() == StatusCode::UNAUTHORIZED {
            return LoginResult::WrongPassword;
        }
        if !response.status().is_success() {
            log::warn!("Login failed with status {}", response.status());
            return LoginResult::NetworkError;
        }

        let token = match response.json::<TokenResponse>().await {
            Ok(body) => body.access_token,
            Err(e) => {
                log::error!("Login response unreadable: {}", e);
                return LoginResult::NetworkError;
            }
        };
        if let Err(e) = self.set_token(Some(token)) {
            log::error!("Failed to persist auth token: {}", e);
            return LoginResult::NetworkError;
        }
        LoginResult::Success
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.set_token(None)
    }

    /// Upload buffered device logs.
    ///
    /// Entries are removed from the buffer only when the upload succeeds.
    /// Returns `false` when there was nothing to send or the upload failed.
    pub async fn send_logs(&self, buffer: &LogBuffer) -> bool {
        let logs = buffer.drain();
        if logs.is_empty() {
            return false;
        }

        let result = self
            .http
            .post(endpoint(&self.server_url(), DEBUG_LOGS_PATH))
            .json(&serde_json::json!({ "logs": logs }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                buffer.restore(logs);
                log::warn!("Log transmission failed: status {}", response.status());
                false
            }
            Err(e) => {
                buffer.restore(logs);
                log::warn!("Log transmission failed: {}", e);
                false
            }
        }
    }

    /// Start a request to `path` carrying the bearer token, if any.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, endpoint(&self.server_url(), path))
            .header("Content-Type", "application/json");
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode its JSON body, mapping non-2xx to `Status`.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(ApiError::from_reqwest)?;
        let status = response.status();
        luna_logging::log_response_status(status.as_u16(), self.verbose);
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        response.json::<T>().await.map_err(ApiError::from_reqwest)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
