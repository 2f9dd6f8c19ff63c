//! Core error types for formwork.
//!
//! [`FormError`] covers the few ways the form layer itself can fail:
//! declaration mistakes, failing user hooks, and configuration loading.
//! Validation failures are *not* errors here; they are data collected by
//! the validation layer. [`ValidationError`] is the per-check failure a
//! validator reports before it is turned into a message.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A single failed validation check.
///
/// # Examples
///
/// ```
/// use formwork_core::error::ValidationError;
///
/// let err = ValidationError::new("is too short (minimum is 3 characters)", "too_short")
///     .with_param("count", "3");
/// assert_eq!(err.code, "too_short");
/// assert_eq!(err.params.get("count").unwrap(), "3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The human-readable message, without the field name.
    pub message: String,
    /// A short code identifying the failure (e.g. "blank", "invalid").
    pub code: String,
    /// Interpolation parameters for the message template.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// A failure with a rendered message and its machine-readable code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
        }
    }

    /// Attaches an interpolation parameter, such as `count`.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for formwork.
#[derive(Error, Debug)]
pub enum FormError {
    /// A declaration received an argument it cannot accept, such as an
    /// unknown processor outcome. Raised while a form type is being declared.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A user-supplied hook (cleaner, processor, initializer) failed.
    #[error("Hook '{hook}' failed: {message}")]
    Hook {
        /// The hook identifier, or the name of the overridable method.
        hook: String,
        /// What went wrong.
        message: String,
    },

    /// Settings could not be loaded or installed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading a settings file failed at the OS level.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormError {
    /// Builds a [`FormError::Hook`] for the named hook.
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// A convenience type alias for `Result<T, FormError>`.
pub type FormResult<T> = Result<T, FormError>;
