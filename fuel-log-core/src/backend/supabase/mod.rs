//! Supabase client: GoTrue for auth, PostgREST for tables.
//!
//! The client keeps the signed-in session in memory and, when a session file
//! is configured, on disk so that separate invocations share one sign-in.
//! Session changes are published on a broadcast channel.

mod auth;
mod rest;
mod session_file;

use std::sync::{PoisonError, RwLock};

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use super::{error_message, AuthChange, BackendError};
use crate::models::Session;

pub use rest::Query;
pub use session_file::SessionFile;

/// Refresh the access token when it expires within this many seconds.
const EXPIRY_MARGIN_SECS: i64 = 30;
/// Capacity of the auth event channel.
const EVENT_CAPACITY: usize = 16;

/// Client for one Supabase project.
#[derive(Debug)]
pub struct SupabaseClient {
    http: reqwest::Client,
    url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    session_file: Option<SessionFile>,
    events: broadcast::Sender<AuthChange>,
}

impl SupabaseClient {
    /// Creates a client for the project at `url` using its anon (public) key.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            session: RwLock::new(None),
            session_file: None,
            events,
        }
    }

    /// Persists the session to `file` and restores it from there.
    pub fn with_session_file(mut self, file: SessionFile) -> Self {
        self.session_file = Some(file);
        self
    }

    /// Returns the project URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/'))
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// Session held in memory, without touching disk.
    pub(crate) fn cached_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the current session in memory and on disk.
    pub(crate) fn store_session(&self, session: Option<Session>) -> Result<(), BackendError> {
        if let Some(file) = &self.session_file {
            match &session {
                Some(s) => file.save(s)?,
                None => file.clear()?,
            }
        }
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
        Ok(())
    }

    /// Loads the persisted session into memory if nothing is cached yet.
    pub(crate) fn restore_session(&self) -> Result<Option<Session>, BackendError> {
        if let Some(session) = self.cached_session() {
            return Ok(Some(session));
        }
        let restored = match &self.session_file {
            Some(file) => file.load()?,
            None => None,
        };
        if let Some(session) = &restored {
            tracing::debug!(user = %session.user.id, "Restored persisted session");
            *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        }
        Ok(restored)
    }

    pub(crate) fn emit(&self, change: AuthChange) {
        tracing::debug!(event = ?change.event, "Auth state change");
        // No receivers is fine; nobody is listening yet.
        let _ = self.events.send(change);
    }

    /// Bearer token for table requests: the user's access token, else the anon key.
    fn bearer(&self) -> String {
        self.cached_session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    /// Starts an authenticated request against the project.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!(%method, url, "Supabase request");
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }
}

/// Decodes a JSON body, turning non-success statuses into [`BackendError::Api`].
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = read_body(response).await?;
    serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Returns the body of a successful response.
pub(crate) async fn read_body(response: Response) -> Result<String, BackendError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = error_message(status.as_u16(), &body);
        tracing::debug!(status = status.as_u16(), %message, "Supabase request failed");
        return Err(BackendError::api(status.as_u16(), message));
    }
    Ok(body)
}

fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
