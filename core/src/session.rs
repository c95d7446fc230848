//! Session ownership: the bearer token and user profile in durable storage.
//!
//! # Design
//! All reads and writes of the persisted session go through
//! [`SessionManager`]. Nothing is cached in memory; every query re-reads the
//! [`KeyValueStore`], so a logout is visible to the very next caller (the
//! route guard relies on this). Storage is a trait so hosts can persist to a
//! file, a browser's local storage, or memory in tests.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{LoginRequest, RegisterRequest, User};

/// Storage key holding the raw token string.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-encoded user profile.
pub const USER_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("no session is stored; log in first")]
    NotAuthenticated,
}

/// Durable string key-value storage shared by the session and the guard.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object on disk.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FileStore {
    /// `<file name>.tmp` next to the target, e.g. `session.json.tmp`.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// An established session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Single entry point for reading and mutating the persisted session.
#[derive(Debug, Clone)]
pub struct SessionManager<S> {
    store: S,
    client: ApiClient,
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(store: S, client: ApiClient) -> Self {
        Self { store, client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The stored token; an empty string counts as no token.
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.store.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// The stored profile. A value that no longer decodes is treated as absent.
    pub fn user(&self) -> Result<Option<User>, StorageError> {
        let Some(raw) = self.store.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Option<User>>(&raw) {
            Ok(user) => Ok(user),
            Err(e) => {
                warn!(error = %e, "stored user profile is unreadable, ignoring it");
                Ok(None)
            }
        }
    }

    pub fn current(&self) -> Result<Option<Session>, StorageError> {
        match (self.token()?, self.user()?) {
            (Some(token), Some(user)) => Ok(Some(Session { token, user })),
            _ => Ok(None),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        match self.token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "could not read session token");
                false
            }
        }
    }

    /// Post credentials and, on a 2xx answer, persist token and user.
    ///
    /// Returns `Ok(false)` for any non-2xx answer; stored state is untouched
    /// in that case.
    pub fn login(&self, transport: &impl Transport, email: &str, password: &str) -> Result<bool, SessionError> {
        let request = self.client.build_login(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let response = transport.execute(&request).map_err(ApiError::from)?;
        if !response.is_success() {
            info!(status = response.status, "login rejected");
            return Ok(false);
        }

        let login = self.client.parse_login(response)?;
        let user = serde_json::to_string(&login.user).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let persisted = self
            .store
            .set(USER_KEY, &user)
            .and_then(|()| self.store.set(TOKEN_KEY, &login.token));
        if let Err(e) = persisted {
            // Never leave half a session behind, old or new.
            for key in [TOKEN_KEY, USER_KEY] {
                if let Err(cleanup) = self.store.remove(key) {
                    warn!(key, error = %cleanup, "could not clear partial session");
                }
            }
            return Err(e.into());
        }
        info!(user_id = login.user.id, "session established");
        Ok(true)
    }

    /// Create an account. Never establishes a session.
    pub fn register(
        &self,
        transport: &impl Transport,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<bool, SessionError> {
        let request = self.client.build_register(&RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        })?;
        let response = transport.execute(&request).map_err(ApiError::from)?;
        if !response.is_success() {
            info!(status = response.status, "registration rejected");
        }
        Ok(response.is_success())
    }

    /// Forget the session. Safe to call when nothing is stored.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        debug!("session cleared");
        Ok(())
    }

    /// Run one API call with the stored token.
    ///
    /// ```ignore
    /// let vehicles = session.authorized(&transport, |c, t| Ok(c.build_list_vehicles(t)), ApiClient::parse_list_vehicles)?;
    /// ```
    pub fn authorized<R>(
        &self,
        transport: &impl Transport,
        build: impl FnOnce(&ApiClient, &str) -> Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&ApiClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, SessionError> {
        let token = self.token()?.ok_or(SessionError::NotAuthenticated)?;
        let request = build(&self.client, &token)?;
        let response = transport.execute(&request).map_err(ApiError::from)?;
        Ok(parse(&self.client, response)?)
    }
}
