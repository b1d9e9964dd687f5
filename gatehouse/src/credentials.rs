//! Credential lookup for the automated certificate login.

use std::path::{Path, PathBuf};

use crate::config::PortalConfig;
use crate::errors::NavigationError;

/// A certificate password. Redacted in all formatting output.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(***)")
    }
}

/// Supplies the login secret, or reports that none is available.
///
/// `Ok(None)` means "no credential, a human must log in"; an `Err` means the
/// source exists but cannot be used. Implementations must fail fast and never
/// block indefinitely.
pub trait CredentialSource: Send + Sync {
    fn secret(&self) -> Result<Option<Secret>, NavigationError>;
}

/// Reads the secret from a single file, trimming trailing whitespace.
pub struct FileCredentialSource {
    path: PathBuf,
}

impl FileCredentialSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        let path = config
            .credential_file
            .clone()
            .unwrap_or_else(default_credential_path);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialSource for FileCredentialSource {
    fn secret(&self) -> Result<Option<Secret>, NavigationError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "credential file absent, manual login expected");
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            NavigationError::CredentialError(format!(
                "cannot read {}: {e}",
                self.path.display()
            ))
        })?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            tracing::warn!(path = %self.path.display(), "credential file is empty, treating as absent");
            return Ok(None);
        }
        Ok(Some(Secret::new(trimmed)))
    }
}

/// Default credential location: the certificate store path on Windows, a
/// dotfile under the home directory elsewhere.
pub fn default_credential_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\GPKI\password.txt")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gpki")
            .join("password.txt")
    }
}
