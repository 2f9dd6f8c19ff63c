//! Reading [`Settings`] from configuration files and the process environment.
//!
//! A configuration file is a partial document layered over
//! [`Settings::default`]: tables merge key by key, so a `[messages]` table
//! that overrides `blank` keeps every other template. Environment variables
//! are applied last when a `*_with_env` loader is used.
//!
//! | Variable | Field |
//! |---|---|
//! | `FORMWORK_DEBUG` | `debug` |
//! | `FORMWORK_LOG_LEVEL` | `log_level` |
//! | `FORMWORK_SYMBOL_KEY_PREFIX` | `symbol_key_prefix` |
//!
//! ```rust,no_run
//! use formwork_core::settings_loader;
//!
//! let settings = settings_loader::from_file_with_env("config/formwork.toml").unwrap();
//! formwork_core::SETTINGS.configure(settings).unwrap();
//! ```

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value as Json};

use crate::error::{FormError, FormResult};
use crate::settings::Settings;

/// A supported configuration file syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Picks a format from a file extension; anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    fn parse(self, source: &str) -> FormResult<Json> {
        match self {
            Self::Toml => toml::from_str::<toml::Value>(source)
                .map(toml_into_json)
                .map_err(|e| FormError::Configuration(format!("invalid {self} settings: {e}"))),
            Self::Json => serde_json::from_str(source)
                .map_err(|e| FormError::Configuration(format!("invalid {self} settings: {e}"))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        })
    }
}

/// Parses `source` in `format` and layers it over the defaults.
///
/// # Errors
///
/// Returns [`FormError::Configuration`] when the document does not parse or a
/// field has the wrong type.
pub fn from_str(format: Format, source: &str) -> FormResult<Settings> {
    let layer = format.parse(source)?;
    let defaults = serde_json::to_value(Settings::default())
        .map_err(|e| FormError::Configuration(format!("default settings: {e}")))?;
    serde_json::from_value(overlay(defaults, layer))
        .map_err(|e| FormError::Configuration(format!("invalid {format} settings: {e}")))
}

/// TOML shorthand for [`from_str`].
///
/// # Errors
///
/// See [`from_str`].
pub fn from_toml_str(source: &str) -> FormResult<Settings> {
    from_str(Format::Toml, source)
}

/// JSON shorthand for [`from_str`].
///
/// # Errors
///
/// See [`from_str`].
pub fn from_json_str(source: &str) -> FormResult<Settings> {
    from_str(Format::Json, source)
}

/// Reads a settings file, choosing the syntax from its extension.
///
/// # Errors
///
/// Returns [`FormError::Configuration`] when the file cannot be read or
/// parsed.
pub fn from_file(path: impl AsRef<Path>) -> FormResult<Settings> {
    let path = path.as_ref();
    read_as(Format::from_path(path), path)
}

/// Reads a settings file, then applies environment overrides.
///
/// # Errors
///
/// See [`from_file`].
pub fn from_file_with_env(path: impl AsRef<Path>) -> FormResult<Settings> {
    let mut settings = from_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Reads a TOML settings file regardless of its extension.
///
/// # Errors
///
/// See [`from_file`].
pub fn from_toml_file(path: impl AsRef<Path>) -> FormResult<Settings> {
    read_as(Format::Toml, path.as_ref())
}

/// Reads a JSON settings file regardless of its extension.
///
/// # Errors
///
/// See [`from_file`].
pub fn from_json_file(path: impl AsRef<Path>) -> FormResult<Settings> {
    read_as(Format::Json, path.as_ref())
}

/// [`from_toml_file`] followed by [`apply_env_overrides`].
///
/// # Errors
///
/// See [`from_file`].
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> FormResult<Settings> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// [`from_json_file`] followed by [`apply_env_overrides`].
///
/// # Errors
///
/// See [`from_file`].
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> FormResult<Settings> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults with environment overrides applied.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Overwrites fields from `FORMWORK_*` variables that are set.
///
/// `FORMWORK_DEBUG` accepts `1`, `true`, `yes` or `on` (any case) as true and
/// anything else as false. An empty `FORMWORK_SYMBOL_KEY_PREFIX` is ignored,
/// since an empty prefix would make every key a symbol key.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(flag) = lookup("FORMWORK_DEBUG") {
        settings.debug = matches!(
            flag.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }
    if let Some(filter) = lookup("FORMWORK_LOG_LEVEL") {
        settings.log_level = filter;
    }
    if let Some(prefix) = lookup("FORMWORK_SYMBOL_KEY_PREFIX").filter(|p| !p.is_empty()) {
        settings.symbol_key_prefix = prefix;
    }
}

fn read_as(format: Format, path: &Path) -> FormResult<Settings> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        FormError::Configuration(format!("cannot read {format} settings at {}: {e}", path.display()))
    })?;
    from_str(format, &source)
}

fn toml_into_json(value: toml::Value) -> Json {
    match value {
        toml::Value::String(s) => Json::String(s),
        toml::Value::Integer(i) => Json::from(i),
        toml::Value::Float(f) => Json::from(f),
        toml::Value::Boolean(b) => Json::Bool(b),
        toml::Value::Datetime(dt) => Json::String(dt.to_string()),
        toml::Value::Array(items) => Json::Array(items.into_iter().map(toml_into_json).collect()),
        toml::Value::Table(table) => Json::Object(
            table
                .into_iter()
                .map(|(key, item)| (key, toml_into_json(item)))
                .collect::<Map<_, _>>(),
        ),
    }
}

/// Layers `top` over `base`; objects merge recursively, anything else in
/// `top` replaces the base value.
fn overlay(base: Json, top: Json) -> Json {
    match (base, top) {
        (Json::Object(mut merged), Json::Object(top)) => {
            for (key, value) in top {
                let combined = match merged.remove(&key) {
                    Some(existing) => overlay(existing, value),
                    None => value,
                };
                merged.insert(key, combined);
            }
            Json::Object(merged)
        }
        (_, top) => top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_toml_layer_keeps_unlisted_defaults() {
        let settings = from_toml_str(
            r#"
            debug = false
            log_level = "formwork_forms=debug"
            "#,
        )
        .unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "formwork_forms=debug");
        assert_eq!(settings.symbol_key_prefix, ":");
    }

    #[test]
    fn test_message_table_merges_per_key() {
        let settings = from_toml_str("[messages]\nblank = \"must be filled in\"").unwrap();
        assert_eq!(settings.message("blank"), Some("must be filled in"));
        assert_eq!(settings.message("invalid"), Some("is invalid"));
    }

    #[test]
    fn test_empty_document_is_defaults() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            from_toml_str("this is not [valid toml"),
            Err(FormError::Configuration(_))
        ));
    }

    #[test]
    fn test_wrong_field_type() {
        let err = from_toml_str("debug = \"sometimes\"").unwrap_err();
        assert!(err.to_string().contains("invalid TOML settings"));
    }

    #[test]
    fn test_json_layer() {
        let settings =
            from_json_str(r#"{"symbol_key_prefix": "@", "messages": {"invalid": "looks wrong"}}"#)
                .unwrap();
        assert_eq!(settings.symbol_key_prefix, "@");
        assert_eq!(settings.message("invalid"), Some("looks wrong"));
        assert_eq!(settings.message("blank"), Some("can't be blank"));
        assert!(from_json_str("{not json").is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("app/formwork.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("app/formwork.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("app/formwork.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("app/formwork")), Format::Toml);
    }

    #[test]
    fn test_missing_file() {
        let err = from_file("/definitely/not/here/formwork.toml").unwrap_err();
        assert!(err.to_string().contains("cannot read TOML settings"));
    }

    #[test]
    fn test_json_file_by_extension() {
        let path = std::env::temp_dir().join(format!("formwork_settings_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"debug": false}"#).unwrap();
        let settings = from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(!settings.unwrap().debug);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("FORMWORK_DEBUG", "Off"),
            ("FORMWORK_LOG_LEVEL", "warn"),
            ("FORMWORK_SYMBOL_KEY_PREFIX", ""),
        ]
        .into_iter()
        .collect();
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |name| vars.get(name).map(ToString::to_string));
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.symbol_key_prefix, ":");

        apply_overrides(&mut settings, |name| {
            (name == "FORMWORK_DEBUG").then(|| "YES".to_string())
        });
        assert!(settings.debug);
    }

    #[test]
    fn test_overlay_nested_objects() {
        let merged = overlay(
            serde_json::json!({"a": {"x": 1, "y": 2}, "b": 3}),
            serde_json::json!({"a": {"y": 20}, "c": [1]}),
        );
        assert_eq!(merged, serde_json::json!({"a": {"x": 1, "y": 20}, "b": 3, "c": [1]}));
    }

    #[test]
    fn test_overlay_scalar_replaces_object() {
        let merged = overlay(serde_json::json!({"a": {"x": 1}}), serde_json::json!({"a": 5}));
        assert_eq!(merged, serde_json::json!({"a": 5}));
    }
}
