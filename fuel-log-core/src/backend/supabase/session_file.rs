use std::path::{Path, PathBuf};

use crate::backend::BackendError;
use crate::models::Session;

/// JSON file holding the signed-in session between runs.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the session. A missing file means signed out; an unreadable one
    /// is logged and treated the same way.
    pub fn load(&self) -> Result<Option<Session>, BackendError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Storage(e.to_string())),
        };

        match serde_json::from_str(&contents) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt session file '{}': {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), BackendError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BackendError::Storage(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(session).map_err(|e| BackendError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| BackendError::Storage(e.to_string()))
    }

    pub fn clear(&self) -> Result<(), BackendError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::Storage(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: Some(1_900_000_000),
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
    fn test_missing_file_is_signed_out() {
        let dir = tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        assert_eq!(file.load().unwrap(), None);
        file.clear().unwrap();
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));
        let s = session();

        file.save(&s).unwrap();
        assert_eq!(file.load().unwrap(), Some(s));

        file.clear().unwrap();
        assert!(!file.path().exists());
        assert_eq!(file.load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let file = SessionFile::new(path);
        assert_eq!(file.load().unwrap(), None);
    }
}
