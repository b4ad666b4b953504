//! Durable client-side credential storage.
//!
//! The on-disk layout is a flat JSON object with the keys `access_token` and
//! `refresh_token`; a missing file or missing keys mean "logged out".

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::util::lock::{rw_read, rw_write};

use super::error::InfraError;

const SOURCE: &str = "infra::storage";

/// Credentials as persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl StoredCredentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Key/value persistence for the credential pair.
pub trait CredentialStorage: Send + Sync {
    fn load(&self) -> Result<StoredCredentials, InfraError>;
    fn save(&self, credentials: &StoredCredentials) -> Result<(), InfraError>;
    fn clear(&self) -> Result<(), InfraError>;
}

/// Process-local storage; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<StoredCredentials>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> Result<StoredCredentials, InfraError> {
        Ok(rw_read(&self.inner, SOURCE, "memory.load").clone())
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), InfraError> {
        *rw_write(&self.inner, SOURCE, "memory.save") = credentials.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), InfraError> {
        *rw_write(&self.inner, SOURCE, "memory.clear") = StoredCredentials::default();
        Ok(())
    }
}

/// JSON file storage with atomic replacement.
///
/// Writes go to a temporary file in the target directory which is then
/// renamed over the destination. On Unix the temporary file is created with
/// mode 0600, so the token file is never readable by other users.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl CredentialStorage for FileStorage {
    fn load(&self) -> Result<StoredCredentials, InfraError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredCredentials::default());
            }
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(StoredCredentials::default());
        }
        serde_json::from_str(&raw)
            .map_err(|err| InfraError::corrupt_credentials(&self.path, err.to_string()))
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), InfraError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let payload = serde_json::to_vec_pretty(credentials)
            .map_err(|err| InfraError::corrupt_credentials(&self.path, err.to_string()))?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&payload)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;

        debug!(path = %self.path.display(), "Credentials persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), InfraError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn pair() -> StoredCredentials {
        StoredCredentials {
            access_token: Some("access-1".into()),
            refresh_token: Some("refresh-1".into()),
        }
    }

    #[test]
    fn missing_file_means_logged_out() {
        let dir = TempDir::new().expect("tempdir");
        let storage = FileStorage::new(dir.path().join("credentials.json"));
        assert!(storage.load().expect("load").is_empty());
    }

    #[test]
    fn file_storage_persists_and_clears() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested/credentials.json");
        let storage = FileStorage::new(&path);

        storage.save(&pair()).expect("save");
        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\"access_token\""));
        assert!(raw.contains("\"refresh_token\""));
        assert_eq!(FileStorage::new(&path).load().expect("load"), pair());

        storage.clear().expect("clear");
        assert!(!path.exists());
        storage.clear().expect("clear twice is fine");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{not json").expect("write");

        let err = FileStorage::new(&path).load().expect_err("corrupt");
        assert!(matches!(err, InfraError::CorruptCredentials { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn credential_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("credentials.json");
        FileStorage::new(&path).save(&pair()).expect("save");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        storage.save(&pair()).expect("save");
        assert_eq!(storage.load().expect("load"), pair());
        storage.clear().expect("clear");
        assert!(storage.load().expect("load").is_empty());
    }
}
