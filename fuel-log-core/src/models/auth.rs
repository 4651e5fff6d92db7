use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user as returned by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Email if present, otherwise the user id.
    pub fn display_name(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// A signed-in session issued by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Seconds the access token is valid for, from issue time.
    pub expires_in: i64,
    /// Unix timestamp (seconds) when the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Fills in `expires_at` from `expires_in` when the server omitted it.
    pub fn with_expiry_from(mut self, issued_at: i64) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = Some(issued_at + self.expires_in);
        }
        self
    }

    /// Whether the access token expires within `margin_secs` of `now`.
    ///
    /// A session without an expiry is treated as still valid.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - margin_secs <= now,
            None => false,
        }
    }
}

/// Result of a sign-up call.
///
/// When email confirmation is required the service returns only the user.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}

impl SignUpResponse {
    pub fn needs_confirmation(&self) -> bool {
        self.session.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: Option<i64>) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at,
            user: User {
                id: Uuid::new_v4(),
                email: Some("driver@example.com".to_string()),
                email_confirmed_at: None,
                last_sign_in_at: None,
                created_at: None,
            },
        }
    }

    #[test]
    fn test_expiry_filled_from_expires_in() {
        let s = session(None).with_expiry_from(1_000);
        assert_eq!(s.expires_at, Some(4_600));

        let s = session(Some(10)).with_expiry_from(1_000);
        assert_eq!(s.expires_at, Some(10));
    }

    #[test]
    fn test_expires_within_margin() {
        let s = session(Some(1_000));
        assert!(!s.expires_within(900, 10));
        assert!(s.expires_within(995, 10));
        assert!(s.expires_within(2_000, 0));
        assert!(!session(None).expires_within(i64::MAX - 1, 10));
    }

    #[test]
    fn test_session_from_token_response() {
        let json = r#"{
            "access_token": "eyJ...",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1735689600,
            "refresh_token": "r3fr3sh",
            "user": {
                "id": "0b4b7ae2-0d55-4a0e-8f51-0a3f35d1b7c4",
                "aud": "authenticated",
                "email": "driver@example.com",
                "created_at": "2025-01-01T00:00:00Z"
            }
        }"#;

        let s: Session = serde_json::from_str(json).unwrap();
        assert_eq!(s.user.display_name(), "driver@example.com");
        assert_eq!(s.expires_at, Some(1735689600));
    }
}
