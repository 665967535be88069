//! The per-user UPM config file (`~/.upmconfig.toml`).
//!
//! Each registry gets one three-line record:
//!
//! ```toml
//! registry_url = "https://registry.example.com"
//! auth_token = "..."
//! alwaysAuth = false
//! ```
//!
//! Records are only ever appended. A registry that already has a record is
//! left alone.

use std::ffi::OsString;
use std::fmt::{self, Debug, Display};
use std::path::{Path, PathBuf};

use async_std::fs::{self as afs, OpenOptions};
use async_std::prelude::*;
use directories::BaseDirs;

use crate::error::UpmAccountError;

pub const UPM_CONFIG_FILE: &str = ".upmconfig.toml";

/// Mode applied to the config file on non-Windows platforms: read/write for
/// everyone, so a later CI step running as another user can read it.
pub const DEFAULT_FILE_MODE: u32 = 0o666;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    fn home_var(self) -> &'static str {
        match self {
            Platform::Windows => "USERPROFILE",
            Platform::Unix => "HOME",
        }
    }
}

/// Where the config file lives depends on the host. This is the seam tests
/// use to simulate either platform without touching the real home directory.
pub trait HostInfo: Send + Sync {
    fn platform(&self) -> Platform;

    fn var_os(&self, key: &str) -> Option<OsString>;

    /// Used when the platform's home variable is unset.
    fn fallback_home_dir(&self) -> Option<PathBuf> {
        None
    }
}

/// The machine we're actually running on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostInfo for SystemHost {
    fn platform(&self) -> Platform {
        Platform::current()
    }

    fn var_os(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }

    fn fallback_home_dir(&self) -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.home_dir().to_owned())
    }
}

/// A host with a fixed platform and home directory.
#[derive(Debug, Clone)]
pub struct FixedHost {
    pub platform: Platform,
    pub home: Option<PathBuf>,
}

impl HostInfo for FixedHost {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn var_os(&self, key: &str) -> Option<OsString> {
        if key == self.platform.home_var() {
            self.home.clone().map(OsString::from)
        } else {
            None
        }
    }
}

pub fn upm_config_path(host: &dyn HostInfo) -> Result<PathBuf, UpmAccountError> {
    let var = host.platform().home_var();
    host.var_os(var)
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .or_else(|| host.fallback_home_dir())
        .map(|home| home.join(UPM_CONFIG_FILE))
        .ok_or(UpmAccountError::HomeDirectoryError { var })
}

/// One registry's entry in the config file.
pub struct UpmRecord<'a> {
    pub registry_url: &'a str,
    pub auth_token: &'a str,
    pub always_auth: bool,
}

impl Debug for UpmRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpmRecord")
            .field("registry_url", &self.registry_url)
            .field("auth_token", &"***")
            .field("always_auth", &self.always_auth)
            .finish()
    }
}

impl Display for UpmRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "registry_url = \"{}\"", self.registry_url)?;
        writeln!(f, "auth_token = \"{}\"", escape(self.auth_token))?;
        writeln!(f, "alwaysAuth = {}", self.always_auth)
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Whether `contents` already holds a record for exactly `registry_url`.
///
/// Only `registry_url = "..."` lines are considered, and the value must match
/// in full: a registry whose URL is a prefix of another one still gets its
/// own record.
pub fn has_registry_record(contents: &str, registry_url: &str) -> bool {
    contents.lines().any(|line| {
        line.trim()
            .strip_prefix("registry_url")
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::trim)
            .and_then(|value| value.strip_prefix('"'))
            .and_then(|value| value.strip_suffix('"'))
            .map_or(false, |value| value == registry_url)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Appended,
    AlreadyPresent,
}

#[derive(Debug, Clone)]
pub struct UpmConfigFile {
    path: PathBuf,
    platform: Platform,
    mode: u32,
}

impl UpmConfigFile {
    pub fn new(path: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            path: path.into(),
            platform,
            mode: DEFAULT_FILE_MODE,
        }
    }

    pub fn locate(host: &dyn HostInfo) -> Result<Self, UpmAccountError> {
        Ok(Self::new(upm_config_path(host)?, host.platform()))
    }

    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `record` unless the file already has one for its registry.
    pub async fn save(&self, record: &UpmRecord<'_>) -> Result<SaveOutcome, UpmAccountError> {
        tracing::debug!("Saving {}", self.path.display());
        self.ensure_exists().await?;
        if self.platform != Platform::Windows {
            self.relax_permissions().await?;
        }
        let contents = self.read().await?;
        if has_registry_record(&contents, record.registry_url) {
            tracing::info!(
                "{} already has a record for {}",
                self.path.display(),
                record.registry_url
            );
            return Ok(SaveOutcome::AlreadyPresent);
        }
        let separator = if contents.is_empty() || contents.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        self.append(&format!("{separator}{record}")).await?;
        tracing::info!(
            "Added {} to {}",
            record.registry_url,
            self.path.display()
        );
        Ok(SaveOutcome::Appended)
    }

    /// Creates the file, empty, if it isn't there yet. Existing contents are
    /// never truncated.
    pub async fn ensure_exists(&self) -> Result<(), UpmAccountError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.fs_error("create", source))?;
        Ok(())
    }

    #[cfg(unix)]
    pub async fn relax_permissions(&self) -> Result<(), UpmAccountError> {
        use std::os::unix::fs::PermissionsExt;

        afs::set_permissions(&self.path, afs::Permissions::from_mode(self.mode))
            .await
            .map_err(|source| self.fs_error("set permissions on", source))?;
        if self.mode & 0o004 != 0 {
            tracing::info!(
                "{} holds a registry token and is readable by all users (mode {:o})",
                self.path.display(),
                self.mode
            );
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub async fn relax_permissions(&self) -> Result<(), UpmAccountError> {
        tracing::debug!(
            "Not changing permissions on {}: unsupported on this host",
            self.path.display()
        );
        Ok(())
    }

    pub async fn read(&self) -> Result<String, UpmAccountError> {
        afs::read_to_string(&self.path)
            .await
            .map_err(|source| self.fs_error("read", source))
    }

    async fn append(&self, text: &str) -> Result<(), UpmAccountError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.fs_error("open", source))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|source| self.fs_error("append to", source))?;
        file.flush()
            .await
            .map_err(|source| self.fs_error("append to", source))?;
        Ok(())
    }

    fn fs_error(&self, action: &'static str, source: std::io::Error) -> UpmAccountError {
        UpmAccountError::FilesystemError {
            action,
            path: self.path.clone(),
            source,
        }
    }
}
