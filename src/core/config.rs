//! Runtime configuration
//!
//! Every field has a default that reproduces the long-standing command-line
//! behavior, so running without a config file is always valid. A TOML file
//! can tighten the grammar, switch dispatch to best-effort, change exit
//! codes, or replace the platform with a simulated device list.

use crate::command::compiler::CompileOptions;
use crate::command::dispatcher::FailurePolicy;
use crate::core::error::AppError;
use crate::core::types::Direction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for one invocation of the tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,

    pub syntax: SyntaxConfig,

    pub dispatch: DispatchConfig,

    pub exit: ExitConfig,

    /// Run against this in-memory device list instead of the platform.
    ///
    /// Devices are enumerated in the order given here, per direction.
    pub simulate: Option<Vec<SimulatedDevice>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntaxConfig {
    /// Fail when direction/role flags at the end of the line have no device name
    pub reject_trailing_flags: bool,

    /// A device name given before any -in/-out applies to both directions
    pub allow_directionless: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    pub failure_policy: FailurePolicy,
}

/// Process exit codes
///
/// A syntax error exits 0 by default. Scripts that relied on the old
/// behavior keep working; set `syntax_error = 2` to make it detectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExitConfig {
    pub syntax_error: i32,
    pub platform_error: i32,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            syntax_error: 0,
            platform_error: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatedDevice {
    pub direction: Direction,
    pub name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "set_audio_device=warn".to_string(),
            syntax: SyntaxConfig::default(),
            dispatch: DispatchConfig::default(),
            exit: ExitConfig::default(),
            simulate: None,
        }
    }
}

impl AppConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                let reason = format!("Failed to read {}: {}", path.display(), e);
                return Err(AppError::Config(reason));
            }
        };
        let config = Self::from_toml(&contents)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(contents: &str) -> Result<Self, AppError> {
        let config: AppConfig = toml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Invalid TOML: {}", e)))?;
        config.validate().map_err(AppError::Config)?;
        Ok(config)
    }

    /// Defaults when no path is given, otherwise the file at `path`
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.log_filter.trim().is_empty() {
            return Err("log_filter must not be empty".into());
        }

        for (name, code) in [
            ("exit.syntax_error", self.exit.syntax_error),
            ("exit.platform_error", self.exit.platform_error),
        ] {
            if !(0..=255).contains(&code) {
                return Err(format!("{} ({}) must be in 0..=255", name, code));
            }
        }

        if let Some(devices) = &self.simulate {
            if let Some(device) = devices.iter().find(|d| d.name.is_empty()) {
                let direction = device.direction;
                return Err(format!("simulated {} device has an empty name", direction));
            }
        }

        Ok(())
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            reject_trailing_flags: self.syntax.reject_trailing_flags,
            allow_directionless: self.syntax.allow_directionless,
        }
    }
}
