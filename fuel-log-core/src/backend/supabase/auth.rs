//! GoTrue endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tokio::sync::broadcast;

use super::{now_timestamp, read_body, read_json, SupabaseClient, EXPIRY_MARGIN_SECS};
use crate::backend::{AuthBackend, AuthChange, AuthEvent, BackendError};
use crate::models::{Session, SignUpResponse, User};

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Statuses from `/logout` meaning the session is already gone server-side.
const STALE_SESSION_STATUSES: [u16; 3] = [401, 403, 404];

impl SupabaseClient {
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, BackendError> {
        let response = self
            .request(Method::POST, &self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;
        let session: Session = read_json(response).await?;
        Ok(session.with_expiry_from(now_timestamp()))
    }
}

/// Parses a sign-up body, which is a session when the project auto-confirms
/// accounts and a bare user when confirmation email is pending.
fn parse_sign_up(body: &str) -> Result<SignUpResponse, BackendError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;

    if value.get("access_token").is_some() {
        let session: Session =
            serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))?;
        return Ok(SignUpResponse {
            user: Some(session.user.clone()),
            session: Some(session.with_expiry_from(now_timestamp())),
        });
    }

    let user: Option<User> = if value.get("id").is_some() {
        Some(serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))?)
    } else {
        None
    };
    Ok(SignUpResponse {
        user,
        session: None,
    })
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let session = match self.restore_session()? {
            Some(session) => session,
            None => return Ok(None),
        };

        if !session.expires_within(now_timestamp(), EXPIRY_MARGIN_SECS) {
            return Ok(Some(session));
        }

        tracing::info!(user = %session.user.id, "Access token expired, refreshing session");
        match self.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => {
                self.store_session(Some(refreshed.clone()))?;
                self.emit(AuthChange {
                    event: AuthEvent::TokenRefreshed,
                    session: Some(refreshed.clone()),
                });
                Ok(Some(refreshed))
            }
            Err(e) => {
                // A rejected refresh token cannot be retried; drop the session.
                if e.status().is_some() {
                    tracing::warn!("Session refresh rejected: {}", e);
                    self.store_session(None)?;
                    self.emit(AuthChange::signed_out());
                }
                Err(e)
            }
        }
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError> {
        let response = self
            .request(Method::POST, &self.auth_url("signup"))
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        let body = read_body(response).await?;
        parse_sign_up(&body)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let response = self
            .request(Method::POST, &self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        let session: Session = read_json(response).await?;
        let session = session.with_expiry_from(now_timestamp());

        self.store_session(Some(session.clone()))?;
        tracing::info!(user = %session.user.id, "Signed in");
        self.emit(AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.restore_session()?.is_some() {
            let response = self
                .request(Method::POST, &self.auth_url("logout"))
                .send()
                .await?;
            match read_body(response).await {
                Ok(_) => {}
                Err(e) if e.status().is_some_and(|s| STALE_SESSION_STATUSES.contains(&s)) => {
                    tracing::debug!("Session already revoked server-side: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        self.store_session(None)?;
        tracing::info!("Signed out");
        self.emit(AuthChange::signed_out());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sign_up_pending_confirmation() {
        let body = r#"{
            "id": "0b4b7ae2-0d55-4a0e-8f51-0a3f35d1b7c4",
            "aud": "authenticated",
            "email": "new@example.com",
            "confirmation_sent_at": "2025-01-01T00:00:00Z"
        }"#;

        let response = parse_sign_up(body).unwrap();
        assert!(response.needs_confirmation());
        assert_eq!(
            response.user.unwrap().email.as_deref(),
            Some("new@example.com")
        );
    }

    #[test]
    fn test_parse_sign_up_auto_confirmed() {
        let body = r#"{
            "access_token": "token",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": { "id": "0b4b7ae2-0d55-4a0e-8f51-0a3f35d1b7c4", "email": "new@example.com" }
        }"#;

        let response = parse_sign_up(body).unwrap();
        assert!(!response.needs_confirmation());
        assert!(response.session.unwrap().expires_at.is_some());
    }

    #[test]
    fn test_parse_sign_up_garbage() {
        assert!(matches!(
            parse_sign_up("<html>"),
            Err(BackendError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_out_without_session_emits_event() {
        let client = SupabaseClient::new("http://127.0.0.1:9", "anon");
        let mut events = client.on_auth_state_change();

        client.sign_out().await.unwrap();

        let change = events.recv().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedOut);
        assert!(change.session.is_none());
    }

    #[tokio::test]
    async fn test_get_session_without_session() {
        let client = SupabaseClient::new("http://127.0.0.1:9", "anon");
        assert_eq!(client.get_session().await.unwrap(), None);
    }
}
