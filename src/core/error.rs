use crate::core::types::{Direction, Field, Role};
use thiserror::Error;

/// Malformed token stream. Compilation is all-or-nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("syntax error: {0} given twice for the same device")]
    DuplicateField(Field),

    #[error("syntax error: device name {pattern:?} given before a direction (-in/-out)")]
    IncompleteCommand { pattern: String },

    #[error("syntax error: flags at the end of the command line are not followed by a device name")]
    DanglingFlags,
}

/// Failure at the platform boundary while listing or assigning devices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("error enumerating {} devices: {}", direction_label(.direction), .reason)]
    EnumerationFailed {
        direction: Option<Direction>,
        reason: String,
    },

    #[error("error getting device name: {reason}")]
    NameLookupFailed { reason: String },

    #[error("error setting default {role} device {device:?}: {reason}")]
    SetDefaultFailed {
        /// Friendly name, or the endpoint id when the name cannot be read
        device: String,
        role: Role,
        reason: String,
    },
}

impl DispatchError {
    pub fn enumeration(direction: impl Into<Option<Direction>>, reason: impl ToString) -> Self {
        DispatchError::EnumerationFailed {
            direction: direction.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Syntax(#[from] CompileError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// Errors the operator fixes by changing the command line
    pub fn is_syntax(&self) -> bool {
        matches!(self, AppError::Syntax(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

fn direction_label(direction: &Option<Direction>) -> &'static str {
    match direction {
        Some(Direction::Input) => "input",
        Some(Direction::Output) => "output",
        None => "audio",
    }
}
