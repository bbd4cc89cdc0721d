//! Persistence of the session token between process runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Identity;

/// Tokens issued for a signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Identity,
}

/// File-backed store for the current session. A store without a path keeps
/// nothing, so every process start begins signed out.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    path: Option<PathBuf>,
}

impl TokenStore {
    /// Persist sessions at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A store that never persists anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the persisted session. Unreadable or corrupt files count as no session.
    pub async fn load(&self) -> Option<StoredSession> {
        let path = self.path.as_ref()?;
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read session file");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
                None
            }
        }
    }

    /// Persist a session, replacing any previous one.
    pub async fn save(&self, session: &StoredSession) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string(session)?;
        tokio::fs::write(path, content).await?;
        debug!(path = %path.display(), "Session persisted");
        Ok(())
    }

    /// Remove the persisted session.
    pub async fn clear(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
