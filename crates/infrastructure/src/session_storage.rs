//! Persisted session storage.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tenantdesk_application::SessionStorage;
use tenantdesk_core::{AppError, AppResult};
use tenantdesk_domain::Session;

/// Session storage backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    /// Creates a storage that reads and writes `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> AppResult<Option<Session>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read session file '{}': {error}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_slice::<Session>(&contents)
            .map(Some)
            .map_err(|error| {
                AppError::Internal(format!("failed to decode stored session: {error}"))
            })
    }

    async fn store(&self, session: &Session) -> AppResult<()> {
        let contents = serde_json::to_vec(session)
            .map_err(|error| AppError::Internal(format!("failed to encode session: {error}")))?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create session directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        tokio::fs::write(&self.path, contents).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to write session file '{}': {error}",
                self.path.display()
            ))
        })
    }

    async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Internal(format!(
                "failed to remove session file '{}': {error}",
                self.path.display()
            ))),
        }
    }
}

/// Process-local session storage.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    session: RwLock<Option<Session>>,
}

impl InMemorySessionStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn load(&self) -> AppResult<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn store(&self, session: &Session) -> AppResult<()> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.session.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tenantdesk_application::SessionStorage;
    use tenantdesk_core::{Identity, UserId};
    use tenantdesk_domain::Session;

    use super::FileSessionStorage;

    fn sample_session() -> Session {
        Session {
            access_token: "access".to_owned(),
            refresh_token: "refresh".to_owned(),
            expires_at: 1_900_000_000,
            user: Identity::new(UserId::new(), Some("owner@example.com".to_owned())),
        }
    }

    #[tokio::test]
    async fn file_storage_persists_and_clears_session() {
        let path = std::env::temp_dir()
            .join(format!("tenantdesk-{}", uuid::Uuid::new_v4()))
            .join("session.json");
        let storage = FileSessionStorage::new(&path);
        let session = sample_session();

        assert!(matches!(storage.load().await, Ok(None)));
        assert!(storage.store(&session).await.is_ok());
        assert_eq!(storage.load().await.ok().flatten(), Some(session));

        assert!(storage.clear().await.is_ok());
        assert!(matches!(storage.load().await, Ok(None)));
        assert!(storage.clear().await.is_ok());

        if let Some(parent) = path.parent() {
            let _ = tokio::fs::remove_dir_all(parent).await;
        }
    }

    #[tokio::test]
    async fn corrupt_session_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("tenantdesk-{}.json", uuid::Uuid::new_v4()));
        let written = tokio::fs::write(&path, b"{not json").await;
        assert!(written.is_ok());

        let storage = FileSessionStorage::new(&path);
        assert!(storage.load().await.is_err());

        let _ = tokio::fs::remove_file(&path).await;
    }
}
