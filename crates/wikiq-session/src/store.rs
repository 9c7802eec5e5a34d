//! Token persistence behind the `SessionStore` seam.
//!
//! # Design
//! - One token per storage scope, stored under [`ACCESS_TOKEN_KEY`].
//! - Storage failures are logged and swallowed; a store that cannot read
//!   reports "no token", which the gatekeeper treats as unauthenticated.
//! - Locks are held only for the duration of a single read or write.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;
use url::Url;

use crate::token::SessionToken;

/// Fixed key under which the bearer token is stored.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Persistence for the single session token of a storage scope.
pub trait SessionStore: Send + Sync {
    /// Current token, if one is stored and non-blank.
    fn get(&self) -> Option<SessionToken>;
    /// Store `token`, replacing any previous one.
    fn set(&self, token: SessionToken);
    /// Remove the stored token.
    fn clear(&self);
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<SessionToken>>,
}

impl MemorySessionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token`.
    #[must_use]
    pub fn with_token(token: SessionToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<SessionToken> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|token| !token.is_blank())
    }

    fn set(&self, token: SessionToken) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// Key/value entries for every origin, keyed by origin then entry name.
type SessionDocument = BTreeMap<String, BTreeMap<String, String>>;

/// JSON file store scoped to the origin of an API base URL.
///
/// Several origins can share one file; each only ever touches its own entry.
/// Writes are staged in a uniquely named temporary file and renamed over the
/// session file.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    origin: String,
    staging_dir: Option<PathBuf>,
    guard: Mutex<()>,
}

impl FileSessionStore {
    /// Store at `path` scoped to the origin of `base_url`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, base_url: &Url) -> Self {
        Self {
            path: path.into(),
            origin: origin_key(base_url),
            staging_dir: None,
            guard: Mutex::new(()),
        }
    }

    /// Stage writes in `dir` instead of the session file's directory.
    ///
    /// `dir` must live on the same filesystem as the session file.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Origin this store reads and writes.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn read_document(&self) -> io::Result<SessionDocument> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(SessionDocument::new()),
            Err(err) => return Err(err),
        };
        if raw.trim().is_empty() {
            return Ok(SessionDocument::new());
        }
        serde_json::from_str(&raw).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn write_document(&self, document: &SessionDocument) -> io::Result<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent)?;
        let payload = encode_document(document)?;

        let staging_dir = self.staging_dir.as_deref().unwrap_or(parent);
        let mut staged = tempfile::Builder::new()
            .prefix(".wikiq-session-")
            .suffix(".tmp")
            .tempfile_in(staging_dir)?;
        staged.write_all(&payload)?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path)?;
        Ok(())
    }

    fn write_in_place(&self, document: &SessionDocument) -> io::Result<()> {
        let payload = encode_document(document)?;
        let mut file = open_private(&self.path)?;
        file.write_all(&payload)?;
        file.sync_all()
    }

    fn update(&self, apply: impl FnOnce(&mut SessionDocument)) -> io::Result<()> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                log_storage_error("read", &self.path, &err);
                SessionDocument::new()
            }
            Err(err) => return Err(err),
        };
        apply(&mut document);
        self.write_document(&document)
    }

    /// Last resort after a failed staged clear: the token must not survive on
    /// disk, so rewrite the file in place and, failing that, delete it.
    fn force_clear(&self) {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let rewritten = self.read_document().and_then(|mut document| {
            remove_origin(&mut document, &self.origin);
            self.write_in_place(&document)
        });
        let Err(err) = rewritten else {
            return;
        };
        log_storage_error("clear", &self.path, &err);
        match fs::remove_file(&self.path) {
            Ok(()) => warn!(path = %self.path.display(), "session file removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => log_storage_error("clear", &self.path, &err),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<SessionToken> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let document = match self.read_document() {
            Ok(document) => document,
            Err(err) => {
                log_storage_error("get", &self.path, &err);
                return None;
            }
        };
        document
            .get(&self.origin)
            .and_then(|entries| entries.get(ACCESS_TOKEN_KEY))
            .map(SessionToken::new)
            .filter(|token| !token.is_blank())
    }

    fn set(&self, token: SessionToken) {
        let origin = self.origin.clone();
        let result = self.update(move |document| {
            document
                .entry(origin)
                .or_default()
                .insert(ACCESS_TOKEN_KEY.to_string(), token.expose().to_string());
        });
        if let Err(err) = result {
            log_storage_error("set", &self.path, &err);
        }
    }

    fn clear(&self) {
        let origin = self.origin.clone();
        let result = self.update(move |document| remove_origin(document, &origin));
        if let Err(err) = result {
            log_storage_error("clear", &self.path, &err);
            self.force_clear();
        }
    }
}

fn remove_origin(document: &mut SessionDocument, origin: &str) {
    if let Some(entries) = document.get_mut(origin) {
        entries.remove(ACCESS_TOKEN_KEY);
        if entries.is_empty() {
            document.remove(origin);
        }
    }
}

fn encode_document(document: &SessionDocument) -> io::Result<Vec<u8>> {
    serde_json::to_vec_pretty(document).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

/// Storage scope key for a base URL: `scheme://host[:port]`.
#[must_use]
pub fn origin_key(base_url: &Url) -> String {
    base_url.origin().ascii_serialization()
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

fn log_storage_error(operation: &'static str, path: &Path, err: &io::Error) {
    warn!(
        operation,
        path = %path.display(),
        error = %err,
        "session storage operation failed"
    );
}
