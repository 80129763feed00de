use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};

use crate::Client;

pub const DEFAULT_TOKEN_FILE: &str = ".auth-token";
/// Session ids are reused for two hours after they were stored.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(2 * 60 * 60);

/// File-backed cache for the session id returned by login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokenCache {
    path: PathBuf,
    freshness: Duration,
}

impl SessionTokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            freshness: DEFAULT_FRESHNESS,
        }
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// The cached token, if the file exists, is fresh and is not blank.
    pub fn load(&self) -> Result<Option<String>> {
        self.load_at(SystemTime::now())
    }

    pub fn load_at(&self, now: SystemTime) -> Result<Option<String>> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to inspect {}", self.path.display()))
            }
        };
        let modified = metadata
            .modified()
            .with_context(|| format!("failed to read mtime of {}", self.path.display()))?;
        if !is_fresh(modified, now, self.freshness) {
            tracing::debug!(path = %self.path.display(), "cached session token is stale");
            return Ok(None);
        }

        let token = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }

    pub fn store(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            bail!("refusing to cache an empty session token");
        }
        write_text_atomic(&self.path, token)
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => {
                Err(error).with_context(|| format!("failed to remove {}", self.path.display()))
            }
        }
    }
}

/// True when `modified` lies within `freshness` of `now`. Timestamps in the
/// future count as fresh.
pub fn is_fresh(modified: SystemTime, now: SystemTime, freshness: Duration) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age <= freshness,
        Err(_) => true,
    }
}

/// Authenticates `client` with a fresh cached token, or logs in and caches
/// the new one. Cache failures are logged and never block authentication.
pub fn authenticate(
    client: &mut Client,
    cache: &SessionTokenCache,
    login: &str,
    password: &str,
) -> Result<String> {
    match cache.load() {
        Ok(Some(token)) => {
            tracing::debug!(path = %cache.path().display(), "reusing cached session token");
            client.set_auth(&token);
            return Ok(token);
        }
        Ok(None) => {}
        Err(error) => tracing::warn!(error = %error, "ignoring unreadable session cache"),
    }

    let token = client
        .login(login, password)
        .with_context(|| format!("login as '{login}' failed"))?;
    if let Err(error) = cache.store(&token) {
        tracing::warn!(error = %error, "failed to cache session token");
    }
    Ok(token)
}

fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("session cache path cannot be empty");
    }
    if path.is_dir() {
        bail!("session cache path '{}' is a directory", path.display());
    }

    let parent_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("failed to create {}", parent_dir.display()))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = parent_dir.join(format!(
        ".{}.tmp-{}-{nanos}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("auth-token"),
        std::process::id(),
    ));
    std::fs::write(&temp_path, content)
        .with_context(|| format!("failed to write {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            temp_path.display(),
            path.display()
        )
    })
}
