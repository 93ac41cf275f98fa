//! Layered CLI settings
//!
//! Resolution order, later layers winning:
//! built-in defaults, `patchx.toml`, `PATCHX_*` environment variables,
//! command-line flags.

use patchx_core::errors::PatchError;
use patchx_core::logging_facility::Profile;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = ".patchx/patchx.toml";
pub const DEFAULT_STORE_PATH: &str = ".patchx/store.db";

pub const ENV_STORE: &str = "PATCHX_STORE";
pub const ENV_LOG: &str = "PATCHX_LOG";

/// Contents of `patchx.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    store: Option<PathBuf>,
    log_profile: Option<Profile>,
}

/// Values taken from command-line flags
#[derive(Debug, Default)]
pub struct FlagOverrides {
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub log_profile: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: PathBuf,
    pub log_profile: Profile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: PathBuf::from(DEFAULT_STORE_PATH),
            log_profile: Profile::Production,
        }
    }
}

fn config_error(message: impl Into<String>) -> PatchError {
    PatchError::Config {
        message: message.into(),
    }
}

impl Settings {
    /// Resolve settings from the process environment
    ///
    /// # Errors
    ///
    /// `Config` if an explicitly named config file is missing, a config file
    /// does not parse, or `PATCHX_LOG` names an unknown profile.
    pub fn resolve(flags: FlagOverrides) -> Result<Self, PatchError> {
        Self::resolve_with(flags, |name| std::env::var(name).ok())
    }

    /// Resolve settings with an injectable environment lookup
    ///
    /// # Errors
    ///
    /// See [`Settings::resolve`].
    pub fn resolve_with<F>(flags: FlagOverrides, env: F) -> Result<Self, PatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        let file = match &flags.config {
            Some(path) => Some(read_config(path)?),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Some(read_config(path)?)
                } else {
                    None
                }
            }
        };
        if let Some(file) = file {
            if let Some(store) = file.store {
                settings.store = store;
            }
            if let Some(profile) = file.log_profile {
                settings.log_profile = profile;
            }
        }

        if let Some(store) = env(ENV_STORE).filter(|s| !s.is_empty()) {
            settings.store = PathBuf::from(store);
        }
        if let Some(profile) = env(ENV_LOG).filter(|s| !s.is_empty()) {
            settings.log_profile = profile
                .parse()
                .map_err(|e: String| config_error(format!("{}: {}", ENV_LOG, e)))?;
        }

        if let Some(store) = flags.store {
            settings.store = store;
        }
        if let Some(profile) = flags.log_profile {
            settings.log_profile = profile;
        }

        Ok(settings)
    }
}

fn read_config(path: &Path) -> Result<FileConfig, PatchError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_error(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&text)
        .map_err(|e| config_error(format!("invalid {}: {}", path.display(), e)))
}
