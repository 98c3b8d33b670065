//! Configuration management for tiny86-emu.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (TINY86_STACK_SIZE, etc.)
//! 2. Project-local config file (`./tiny86-emu.toml`)
//! 3. User config file (`~/.config/tiny86-emu/config.toml`)
//! 4. Built-in defaults
//!
//! Command-line flags are applied on top by the binary.
//!
//! # Config File Format
//!
//! ```toml
//! # tiny86-emu.toml
//!
//! # Stack memory size in bytes (positive multiple of 4)
//! stack_size = 1024
//!
//! # Abort after this many instructions (unset = unbounded)
//! max_steps = 1000000
//!
//! # "strict" faults on out-of-range stack access, "lenient" reads 0
//! memory_policy = "strict"
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::interpreter::state::{MemoryPolicy, DEFAULT_STACK_SIZE};

/// File name of the project-local config.
const LOCAL_CONFIG: &str = "tiny86-emu.toml";

/// tiny86-emu configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Stack memory size in bytes; also the initial stack pointer.
    pub stack_size: Option<usize>,

    /// Instruction budget for one run.
    pub max_steps: Option<u64>,

    /// Handling of out-of-range stack accesses.
    pub memory_policy: Option<MemoryPolicy>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `tiny86-emu.toml`
    /// 3. User config `~/.config/tiny86-emu/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load user config first (lowest priority of file configs)
        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        // Load project-local config (higher priority)
        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        // Environment variables override everything
        config.apply_env_overrides();

        log::debug!("Loaded configuration: {:?}", config);
        config
    }

    /// Stack size, defaulting to 1024 bytes.
    pub fn stack_size(&self) -> usize {
        self.stack_size.unwrap_or(DEFAULT_STACK_SIZE)
    }

    /// Instruction budget; `None` is unbounded.
    pub fn max_steps(&self) -> Option<u64> {
        self.max_steps
    }

    /// Memory policy, defaulting to strict.
    pub fn memory_policy(&self) -> MemoryPolicy {
        self.memory_policy.unwrap_or_default()
    }

    /// Check that the resolved values describe a usable machine.
    pub fn validate(&self) -> Result<()> {
        let size = self.stack_size();
        if size == 0 || size % 4 != 0 {
            bail!("stack size must be a positive multiple of 4, got {}", size);
        }
        if i32::try_from(size).is_err() {
            bail!("stack size {} does not fit in the stack pointer register", size);
        }
        if self.max_steps == Some(0) {
            bail!("max steps must be at least 1");
        }
        Ok(())
    }

    /// Load user configuration from ~/.config/tiny86-emu/config.toml
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Load project-local configuration from ./tiny86-emu.toml
    fn load_local_config() -> Option<Self> {
        Self::load_from_file(Path::new(LOCAL_CONFIG))
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    pub fn merge(&mut self, other: Self) {
        if other.stack_size.is_some() {
            self.stack_size = other.stack_size;
        }
        if other.max_steps.is_some() {
            self.max_steps = other.max_steps;
        }
        if other.memory_policy.is_some() {
            self.memory_policy = other.memory_policy;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a key lookup (the environment, or a map in tests).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(size) = parse_override(&lookup, "TINY86_STACK_SIZE") {
            self.stack_size = Some(size);
        }
        if let Some(steps) = parse_override(&lookup, "TINY86_MAX_STEPS") {
            self.max_steps = Some(steps);
        }
        if let Some(policy) = parse_override(&lookup, "TINY86_MEMORY_POLICY") {
            self.memory_policy = Some(policy);
        }
    }

    /// Get the path to the user config file.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tiny86-emu").join("config.toml"))
    }
}

/// Parse one override. Unparsable values are logged and ignored.
fn parse_override<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => {
            log::info!("Using {} from environment: {}", key, raw.trim());
            Some(value)
        }
        Err(e) => {
            log::warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.stack_size(), 1024);
        assert_eq!(config.max_steps(), None);
        assert_eq!(config.memory_policy(), MemoryPolicy::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config {
            stack_size: Some(2048),
            max_steps: None,
            memory_policy: Some(MemoryPolicy::Strict),
        };

        let overlay = Config {
            stack_size: None,
            max_steps: Some(500),
            memory_policy: Some(MemoryPolicy::Lenient),
        };

        base.merge(overlay);

        // stack_size unchanged (overlay was None)
        assert_eq!(base.stack_size, Some(2048));
        // max_steps set from overlay
        assert_eq!(base.max_steps, Some(500));
        // memory_policy overridden by overlay
        assert_eq!(base.memory_policy, Some(MemoryPolicy::Lenient));
    }

    #[test]
    fn test_toml_parses() {
        let config: Config = toml::from_str(
            r#"
            stack_size = 4096
            memory_policy = "lenient"
            "#,
        )
        .unwrap();
        assert_eq!(config.stack_size, Some(4096));
        assert_eq!(config.max_steps, None);
        assert_eq!(config.memory_policy, Some(MemoryPolicy::Lenient));
    }

    #[test]
    fn test_toml_rejects_unknown_policy() {
        let result: std::result::Result<Config, _> = toml::from_str(r#"memory_policy = "loose""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCAL_CONFIG);
        std::fs::write(&path, "max_steps = 10\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.max_steps, Some(10));

        std::fs::write(&path, "max_steps = \"many\"\n").unwrap();
        assert!(Config::load_from_file(&path).is_none());

        assert!(Config::load_from_file(&dir.path().join("missing.toml")).is_none());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config {
            stack_size: Some(64),
            ..Default::default()
        };
        config.apply_overrides(lookup_from(&[
            ("TINY86_STACK_SIZE", " 256 "),
            ("TINY86_MEMORY_POLICY", "Lenient"),
        ]));
        assert_eq!(config.stack_size, Some(256));
        assert_eq!(config.max_steps, None);
        assert_eq!(config.memory_policy, Some(MemoryPolicy::Lenient));
    }

    #[test]
    fn test_bad_override_is_ignored() {
        let mut config = Config {
            max_steps: Some(7),
            ..Default::default()
        };
        config.apply_overrides(lookup_from(&[("TINY86_MAX_STEPS", "-3")]));
        assert_eq!(config.max_steps, Some(7));
    }

    #[test]
    fn test_validate() {
        for bad in [0, 6, 1023] {
            let config = Config {
                stack_size: Some(bad),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "stack size {} accepted", bad);
        }

        let config = Config {
            max_steps: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            stack_size: Some(16),
            max_steps: Some(1),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
