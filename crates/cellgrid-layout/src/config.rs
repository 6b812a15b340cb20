//! Tuning for the rearrangement engine and drag adapter.
//!
//! # Loading
//!
//! ```toml
//! # cellgrid.toml
//! smart_adjust = true
//! adjacency_reach = 1
//! verify_commits = true
//! ```
//!
//! ```rust,ignore
//! let config = RearrangeConfig::from_toml_file("cellgrid.toml")?;
//! let config = RearrangeConfig::from_env();
//! ```
//!
//! `RearrangeConfig::default()` matches the behavior hosts get without any
//! configuration.

#[cfg(feature = "config-file")]
use std::path::Path;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default width of the strip next to a spanning item that redirects drops.
pub const DEFAULT_ADJACENCY_REACH: u16 = 1;

/// Largest accepted adjacency reach.
pub const MAX_ADJACENCY_REACH: u16 = 8;

/// Engine and adapter tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RearrangeConfig {
    /// Redirect plain-item drops on or next to a spanning item to that item.
    pub smart_adjust: bool,
    /// Rows/columns right of and below a spanning item that count as
    /// "adjacent" for smart adjustment.
    pub adjacency_reach: u16,
    /// Rebuild and check the full occupancy table on every commit.
    pub verify_commits: bool,
}

impl Default for RearrangeConfig {
    fn default() -> Self {
        Self {
            smart_adjust: true,
            adjacency_reach: DEFAULT_ADJACENCY_REACH,
            verify_commits: true,
        }
    }
}

impl RearrangeConfig {
    #[must_use]
    pub fn with_smart_adjust(mut self, enabled: bool) -> Self {
        self.smart_adjust = enabled;
        self
    }

    #[must_use]
    pub fn with_adjacency_reach(mut self, reach: u16) -> Self {
        self.adjacency_reach = reach;
        self
    }

    #[must_use]
    pub fn with_verify_commits(mut self, verify: bool) -> Self {
        self.verify_commits = verify;
        self
    }

    /// Load config from environment variables.
    ///
    /// Reads:
    /// - `CELLGRID_SMART_ADJUST`: "1"/"true" or "0"/"false"
    /// - `CELLGRID_ADJACENCY_REACH`: strip width in cells
    /// - `CELLGRID_VERIFY_COMMITS`: "1"/"true" or "0"/"false"
    ///
    /// Unparseable values are ignored; the result is clamped.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`RearrangeConfig::from_env`] with a custom lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = get_env("CELLGRID_SMART_ADJUST")
            && let Some(enabled) = parse_flag(&val)
        {
            config.smart_adjust = enabled;
        }

        if let Some(val) = get_env("CELLGRID_ADJACENCY_REACH")
            && let Ok(reach) = val.trim().parse::<u16>()
        {
            config.adjacency_reach = reach;
        }

        if let Some(val) = get_env("CELLGRID_VERIFY_COMMITS")
            && let Some(verify) = parse_flag(&val)
        {
            config.verify_commits = verify;
        }

        config.validated()
    }

    /// Clamp `adjacency_reach` into `1..=MAX_ADJACENCY_REACH`.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.adjacency_reach = self.adjacency_reach.clamp(1, MAX_ADJACENCY_REACH);
        self
    }

    /// Validate parameters without clamping.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.adjacency_reach == 0 {
            errors.push("adjacency_reach must be > 0".into());
        }
        if self.adjacency_reach > MAX_ADJACENCY_REACH {
            errors.push(format!(
                "adjacency_reach must be <= {MAX_ADJACENCY_REACH}, got {}",
                self.adjacency_reach
            ));
        }
        errors
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    #[cfg(feature = "config-file")]
    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    let val = val.trim();
    if val == "1" || val.eq_ignore_ascii_case("true") {
        Some(true)
    } else if val == "0" || val.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Errors from loading configuration files.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "config validation failed: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
