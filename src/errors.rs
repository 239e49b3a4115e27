//! # Application Error Types
//!
//! Typed errors for configuration loading and user-input validation. Runtime
//! handler failures travel as `anyhow::Error` through the dispatcher; these
//! variants exist where the kind of failure matters to the caller (config
//! rejection at startup, validation replies to the user).

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration loading/validation errors
    Config(String),
    /// User input validation errors (track codes, calculator input)
    Validation(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
