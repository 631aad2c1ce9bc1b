//! Configuration system
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high -> low):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. User-level (~/.config/lisp-session/config.toml)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use lisp_session::util::config::{load_user_config, UserConfig};
//!
//! // Missing file means defaults
//! let config = load_user_config().unwrap();
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::DEFAULT_MAX_DEPTH;
use crate::util::logger::LogLevel;

/// Directory name under the platform config root
const APP_DIR: &str = "lisp-session";

/// User-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// REPL settings
    #[serde(default)]
    pub repl: ReplConfig,
    /// Session and worker settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// REPL configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Primary prompt
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Prompt shown while an expression spans lines
    #[serde(default = "default_continuation_prompt")]
    pub continuation_prompt: String,
    /// Use vi key bindings instead of emacs
    #[serde(default)]
    pub vi_mode: bool,
    /// History file path
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    /// History size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Color error output
    #[serde(default = "default_colors")]
    pub colors: bool,
}

fn default_prompt() -> String {
    "> ".to_string()
}

fn default_continuation_prompt() -> String {
    ". ".to_string()
}

fn default_history_size() -> usize {
    1000
}

fn default_colors() -> bool {
    true
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            continuation_prompt: default_continuation_prompt(),
            vi_mode: false,
            history_file: None,
            history_size: default_history_size(),
            colors: default_colors(),
        }
    }
}

/// Where the evaluator runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Isolation {
    /// Dedicated OS thread in this process
    #[default]
    Thread,
    /// Child process speaking JSON lines over stdio
    Process,
}

impl FromStr for Isolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thread" => Ok(Isolation::Thread),
            "process" => Ok(Isolation::Process),
            other => Err(format!("unknown isolation '{}' (expected thread or process)", other)),
        }
    }
}

impl fmt::Display for Isolation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Isolation::Thread => f.write_str("thread"),
            Isolation::Process => f.write_str("process"),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub isolation: Isolation,
    /// Worker respawns allowed before the session gives up
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,
    /// Bound on nested evaluation depth
    #[serde(default = "default_max_eval_depth")]
    pub max_eval_depth: usize,
}

fn default_max_restarts() -> u32 {
    3
}

fn default_max_eval_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            isolation: Isolation::default(),
            max_restarts: default_max_restarts(),
            max_eval_depth: default_max_eval_depth(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    // Try XDG config directory on Unix
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join(APP_DIR));
    }

    // Fallback to ~/.config/lisp-session
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join(APP_DIR));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join(APP_DIR));
    }

    None
}

/// Get the user config file path (~/.config/lisp-session/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load user-level configuration
/// Returns default config if file doesn't exist
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    match get_config_path() {
        Some(path) => load_from(&path),
        None => Ok(UserConfig::default()),
    }
}

/// Load configuration from an explicit path; a missing file yields defaults
pub fn load_from(path: &Path) -> Result<UserConfig, ConfigError> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
