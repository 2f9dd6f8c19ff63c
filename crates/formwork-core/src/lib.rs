//! # formwork-core
//!
//! Core types, settings, and error types for the formwork form-object layer.
//! This crate has no knowledge of forms and provides the foundation the
//! `formwork-forms` crate builds on.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`value`] - The dynamic [`Value`] held by form fields
//! - [`utils`] - Naming helpers (`underscore`, `humanize`, ...)
//! - [`settings`] - Library settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use error::{FormError, FormResult, ValidationError};
pub use settings::{Settings, SETTINGS};
pub use value::Value;
