//! Application configuration.
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables:
//!
//! | Setting | TOML key | Environment variable | Default |
//! |---------|----------|----------------------|---------|
//! | Database URL | `database_url` | `DATABASE_URL` | unset |
//! | Sweep interval | `autoclose.interval_secs` | `AUTOCLOSE_INTERVAL_SECS` | 900 |
//! | Store call timeout | `autoclose.store_timeout_secs` | `AUTOCLOSE_STORE_TIMEOUT_SECS` | 5 |
//! | Project limit | `limits.max_projects` | `MAX_NUMBER_OF_PROJECT` | 10 |
//! | Tasks per project | `limits.max_tasks_per_project` | `MAX_NUMBER_OF_TASK` | 50 |

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the database URL.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable holding the sweep interval in seconds.
pub const INTERVAL_ENV: &str = "AUTOCLOSE_INTERVAL_SECS";
/// Environment variable holding the store call timeout in seconds.
pub const STORE_TIMEOUT_ENV: &str = "AUTOCLOSE_STORE_TIMEOUT_SECS";
/// Environment variable holding the project limit.
pub const MAX_PROJECTS_ENV: &str = "MAX_NUMBER_OF_PROJECT";
/// Environment variable holding the per-project task limit.
pub const MAX_TASKS_ENV: &str = "MAX_NUMBER_OF_TASK";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`AppConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable holds an unparseable value.
    #[error("invalid value '{value}' for environment variable {key}")]
    InvalidEnv {
        /// Variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },

    /// A setting that must be positive is zero.
    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
}

/// Autoclose sweep settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutocloseConfig {
    /// Seconds between the end of one sweep and the start of the next.
    pub interval_secs: u64,
    /// Upper bound in seconds on each store call made by a sweep.
    pub store_timeout_secs: u64,
}

impl AutocloseConfig {
    /// Returns the sweep interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Returns the store call timeout.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Returns the bound the database itself enforces on one store call.
    ///
    /// This is half the store timeout, spent on each of the pool checkout and
    /// the statement, so the database has aborted a call before the sweep
    /// gives up on it.
    #[must_use]
    pub const fn database_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_secs.saturating_mul(500))
    }
}

impl Default for AutocloseConfig {
    fn default() -> Self {
        Self {
            interval_secs: 15 * 60,
            store_timeout_secs: 5,
        }
    }
}

/// Capacity limits enforced by the management services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum number of projects.
    pub max_projects: usize,
    /// Maximum number of tasks in one project.
    pub max_tasks_per_project: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_projects: 10,
            max_tasks_per_project: 50,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: Option<String>,
    /// Autoclose sweep settings.
    pub autoclose: AutocloseConfig,
    /// Capacity limits.
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::MustBePositive`] for zero-valued settings.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from an optional file, then applies the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, an
    /// environment value is malformed, or a setting fails validation.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(file) => Self::from_toml_str(&read_config_file(file)?)?,
            None => Self::default(),
        };
        base.with_env(|key| std::env::var(key).ok())
    }

    /// Applies environment overrides using `lookup` and re-validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable does not parse and
    /// [`ConfigError::MustBePositive`] when an override is zero.
    pub fn with_env(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.database_url = Some(url);
        }
        override_from(&lookup, INTERVAL_ENV, &mut self.autoclose.interval_secs)?;
        override_from(&lookup, STORE_TIMEOUT_ENV, &mut self.autoclose.store_timeout_secs)?;
        override_from(&lookup, MAX_PROJECTS_ENV, &mut self.limits.max_projects)?;
        override_from(&lookup, MAX_TASKS_ENV, &mut self.limits.max_tasks_per_project)?;
        self.validate()?;
        Ok(self)
    }

    /// Checks that every setting is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MustBePositive`] naming the first zero setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autoclose.interval_secs == 0 {
            return Err(ConfigError::MustBePositive("autoclose.interval_secs"));
        }
        if self.autoclose.store_timeout_secs == 0 {
            return Err(ConfigError::MustBePositive("autoclose.store_timeout_secs"));
        }
        if self.limits.max_projects == 0 {
            return Err(ConfigError::MustBePositive("limits.max_projects"));
        }
        if self.limits.max_tasks_per_project == 0 {
            return Err(ConfigError::MustBePositive("limits.max_tasks_per_project"));
        }
        Ok(())
    }
}

fn override_from<T: FromStr>(
    lookup: &impl Fn(&'static str) -> Option<String>,
    key: &'static str,
    target: &mut T,
) -> Result<(), ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(());
    };
    *target = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value: raw })?;
    Ok(())
}

fn read_config_file(path: &Utf8Path) -> Result<String, ConfigError> {
    let read_error = |source: std::io::Error| ConfigError::Read {
        path: path.to_string(),
        source,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| read_error(std::io::Error::other("path must include a file name")))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    dir.read_to_string(file_name).map_err(read_error)
}
