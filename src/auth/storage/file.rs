//! File-based session storage.

use super::SessionStorage;
use crate::auth::error::AuthError;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// File permissions for session files (Unix only): owner read/write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Directory permissions (Unix only): owner read/write/execute.
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

/// Stores each key as its own file: `{dir}/{key}.json`.
///
/// Files are written through a temp file and renamed into place. On Unix
/// the file is created 0600 and the directory 0700.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, AuthError> {
        if key.is_empty() {
            return Err(AuthError::Storage("Storage key cannot be empty".to_string()));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AuthError::Storage(format!(
                "Invalid storage key '{key}': only [A-Za-z0-9_-] allowed"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn ensure_dir(&self) -> Result<(), AuthError> {
        if self.dir.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| io_err("create directory", &self.dir, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(DIR_MODE))
                .map_err(|e| io_err("set permissions on", &self.dir, e))?;
        }
        Ok(())
    }

    fn write_temp(&self, temp_path: &Path, value: &str) -> Result<(), AuthError> {
        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(FILE_MODE)
                .open(temp_path)
                .map_err(|e| io_err("create", temp_path, e))?;
            file.write_all(value.as_bytes())
                .map_err(|e| io_err("write", temp_path, e))?;
            file.sync_all().map_err(|e| io_err("sync", temp_path, e))?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(temp_path, value).map_err(|e| io_err("write", temp_path, e))?;
        }

        Ok(())
    }
}

fn io_err(action: &str, path: &Path, err: std::io::Error) -> AuthError {
    AuthError::Storage(format!("Failed to {action} '{}': {err}", path.display()))
}

impl SessionStorage for FileSessionStorage {
    #[instrument(skip(self))]
    fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        let path = self.key_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err("read", &path, e)),
        }
    }

    #[instrument(skip(self, value))]
    fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let path = self.key_path(key)?;
        self.ensure_dir()?;

        let temp_path = path.with_extension("tmp");
        self.write_temp(&temp_path, value)?;

        if let Err(e) = std::fs::rename(&temp_path, &path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_err("rename temp file to", &path, e));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<(), AuthError> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err("remove", &path, e)),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}
