//! Session persistence.
//!
//! Keeps the access token and username of the signed-in user in a JSON
//! file next to the CLI configuration.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use motionlab_transfer::CredentialProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Environment variable whose value takes precedence over the stored token.
pub const TOKEN_ENV: &str = "MOTIONLAB_TOKEN";

/// Stored session of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Persistent session store.
///
/// The session is cached in memory and written to disk on every change.
pub struct SessionStore {
    path: PathBuf,
    session: RwLock<Session>,
    env_token: Option<String>,
}

impl SessionStore {
    /// Opens the store at `path`, loading any saved session.
    ///
    /// A missing file is an empty session; an unreadable one is logged and
    /// treated the same way so that `logout` can always recover.
    pub fn new(path: PathBuf) -> Result<Self, ApiError> {
        let session = load_session(&path)?;
        let env_token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Ok(Self {
            path,
            session: RwLock::new(session),
            env_token,
        })
    }

    /// Opens the store at the default location.
    pub fn open_default() -> Result<Self, ApiError> {
        let path = default_session_path()
            .ok_or_else(|| ApiError::Io(std::io::Error::other("no config directory")))?;
        Self::new(path)
    }

    /// Replaces the token override read from the environment.
    pub fn with_env_token(mut self, token: Option<String>) -> Self {
        self.env_token = token;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn username(&self) -> Option<String> {
        self.session().username
    }

    /// Returns `true` when the token comes from the environment.
    pub fn token_from_env(&self) -> bool {
        self.env_token.is_some()
    }

    /// Stores a new session.
    pub fn save(&self, token: &str, username: Option<&str>) -> Result<(), ApiError> {
        {
            let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
            session.access_token = Some(token.to_string());
            session.username = username.map(str::to_string);
        }
        self.persist()
    }

    /// Forgets the stored session.
    pub fn clear(&self) -> Result<(), ApiError> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Session::default();
        self.persist()
    }

    fn persist(&self) -> Result<(), ApiError> {
        let json = serde_json::to_string_pretty(&self.session())?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        set_permissions_0600(&self.path);
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }
}

impl CredentialProvider for SessionStore {
    fn token(&self) -> Option<String> {
        self.env_token.clone().or_else(|| {
            self.session
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .access_token
                .clone()
        })
    }
}

fn load_session(path: &Path) -> Result<Session, ApiError> {
    if !path.exists() {
        return Ok(Session::default());
    }
    let data = std::fs::read_to_string(path)?;
    match serde_json::from_str(&data) {
        Ok(session) => {
            debug!(path = %path.display(), "loaded session");
            Ok(session)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse session, ignoring it");
            Ok(Session::default())
        }
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Returns the default session file path.
pub fn default_session_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("motionlab").join("session.json"))
}

/// Returns the platform-specific config directory.
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}
