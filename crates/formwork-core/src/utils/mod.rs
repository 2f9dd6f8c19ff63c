//! Utility functions for formwork.
//!
//! - [`text`]: naming helpers used to derive model names, parameter
//!   namespaces, and human-readable field labels.

pub mod text;
