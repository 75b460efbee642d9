//! Key-value session stores with expiry.

use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::io;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::error::{ServiceError, ServiceResult};
use crate::session::Session;
#[cfg(not(target_arch = "wasm32"))]
use crate::session::{is_valid_session_id, now_millis};
#[cfg(not(target_arch = "wasm32"))]
use crate::storage::write_atomic;

/// Storage for session records keyed by session id.
///
/// Implementations must never return an expired session.
pub trait SessionStore: Send + Sync {
    /// Store `session` under its id, replacing any previous record, for `ttl`.
    fn put(&self, session: &Session, ttl: Duration) -> ServiceResult<()>;

    /// Look up a live session.
    fn get(&self, id: &str) -> ServiceResult<Option<Session>>;

    /// Drop expired records and return how many were removed.
    fn purge_expired(&self) -> ServiceResult<usize>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Expiry instant, or `None` when the TTL reaches past what the clock can
/// represent.
type Expiry = Option<Instant>;

fn has_expired(expires: Expiry, now: Instant) -> bool {
    expires.is_some_and(|at| at <= now)
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, (Session, Expiry)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ServiceResult<std::sync::MutexGuard<'_, HashMap<String, (Session, Expiry)>>> {
        self.entries
            .lock()
            .map_err(|_| ServiceError::storage("session store lock poisoned"))
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, session: &Session, ttl: Duration) -> ServiceResult<()> {
        let expires = Instant::now().checked_add(ttl);
        self.lock()?
            .insert(session.id.clone(), (session.clone(), expires));
        log::debug!("Session {} stored (ttl {}s)", session.id, ttl.as_secs());
        Ok(())
    }

    fn get(&self, id: &str) -> ServiceResult<Option<Session>> {
        let mut entries = self.lock()?;
        match entries.get(id) {
            Some((_, expires)) if has_expired(*expires, Instant::now()) => {
                entries.remove(id);
                log::debug!("Session {} expired", id);
                Ok(None)
            }
            Some((session, _)) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    fn purge_expired(&self) -> ServiceResult<usize> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, (_, expires)| !has_expired(*expires, now));
        Ok(before - entries.len())
    }
}

// ============================================================================
// Filesystem store
// ============================================================================

/// On-disk record: the session plus its absolute expiry.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    /// Expiry in milliseconds since the Unix epoch
    expires_at: u64,
    session: Session,
}

/// Session store keeping one JSON file per session in a directory.
///
/// Survives restarts; expiry is checked against wall-clock time.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileSessionStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> ServiceResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        log::info!("Session store at {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read(path: &Path) -> ServiceResult<Option<StoredSession>> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|err| ServiceError::storage(format!("failed to parse {}: {err}", path.display())))
    }

    fn remove(path: &Path) -> ServiceResult<()> {
        match fs::remove_file(path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionStore for FileSessionStore {
    fn put(&self, session: &Session, ttl: Duration) -> ServiceResult<()> {
        if !is_valid_session_id(&session.id) {
            return Err(ServiceError::invalid_request(format!(
                "Invalid session id '{}'",
                session.id
            )));
        }

        let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let record = StoredSession {
            expires_at: now_millis().saturating_add(ttl_millis),
            session: session.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&record)?;

        let final_path = self.path_for(&session.id);
        write_atomic(&final_path, &bytes)?;

        log::debug!("Session {} written to {}", session.id, final_path.display());
        Ok(())
    }

    fn get(&self, id: &str) -> ServiceResult<Option<Session>> {
        if !is_valid_session_id(id) {
            return Ok(None);
        }
        let path = self.path_for(id);
        let Some(record) = Self::read(&path)? else {
            return Ok(None);
        };
        if record.expires_at <= now_millis() {
            log::debug!("Session {} expired", id);
            Self::remove(&path)?;
            return Ok(None);
        }
        Ok(Some(record.session))
    }

    fn purge_expired(&self) -> ServiceResult<usize> {
        let now = now_millis();
        let mut removed = 0;

        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(Some(record)) if record.expires_at <= now => {
                    Self::remove(&path)?;
                    removed += 1;
                }
                Ok(_) => {}
                Err(err) => log::warn!("Skipping unreadable session file: {err}"),
            }
        }
        Ok(removed)
    }
}
