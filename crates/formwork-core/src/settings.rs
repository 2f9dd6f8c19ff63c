//! Library-wide settings.
//!
//! [`Settings`] carries the few knobs formwork has: logging, the spelling of
//! symbol-form parameter keys, and validation message templates. The
//! process-wide copy lives in [`SETTINGS`]; until an application configures
//! it, readers see [`Settings::default`].

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{FormError, FormResult};

/// The complete set of library settings.
///
/// # Examples
///
/// ```
/// use formwork_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.symbol_key_prefix, ":");
/// assert_eq!(settings.message("blank"), Some("can't be blank"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Pretty, human-oriented log output instead of JSON lines.
    pub debug: bool,
    /// An `EnvFilter` directive such as `"info"` or `"formwork_forms=trace"`.
    pub log_level: String,
    /// How symbol-form keys are spelled in raw input (`":email"`).
    ///
    /// Keys carrying this prefix and keys without it address the same field;
    /// both forms are folded together when raw input enters a form.
    pub symbol_key_prefix: String,
    /// Validation message templates keyed by failure code.
    ///
    /// Templates may reference `%{count}` and similar parameters supplied by
    /// the validator that failed.
    pub messages: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            symbol_key_prefix: ":".to_string(),
            messages: default_messages(),
        }
    }
}

impl Settings {
    /// Returns the message template for a validation failure code.
    pub fn message(&self, code: &str) -> Option<&str> {
        self.messages.get(code).map(String::as_str)
    }

    /// The process-wide settings; shorthand for `SETTINGS.get()`.
    pub fn current() -> &'static Self {
        SETTINGS.get()
    }
}

fn default_messages() -> HashMap<String, String> {
    [
        ("blank", "can't be blank"),
        ("invalid", "is invalid"),
        ("too_short", "is too short (minimum is %{count} characters)"),
        ("too_long", "is too long (maximum is %{count} characters)"),
        ("inclusion", "is not included in the list"),
        ("not_a_number", "is not a number"),
        ("greater_than_or_equal_to", "must be greater than or equal to %{count}"),
        ("less_than_or_equal_to", "must be less than or equal to %{count}"),
        ("confirmation", "doesn't match %{attribute}"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Write-once storage for the process-wide [`Settings`].
///
/// ```
/// use formwork_core::settings::{GlobalSettings, Settings};
///
/// static LOCAL: GlobalSettings = GlobalSettings::new();
///
/// assert_eq!(LOCAL.get().log_level, "info");
/// LOCAL.configure(Settings { log_level: "debug".into(), ..Settings::default() }).unwrap();
/// assert_eq!(LOCAL.get().log_level, "debug");
/// assert!(LOCAL.configure(Settings::default()).is_err());
/// ```
#[derive(Debug, Default)]
pub struct GlobalSettings {
    configured: OnceLock<Settings>,
    fallback: OnceLock<Settings>,
}

impl GlobalSettings {
    /// Creates empty storage.
    pub const fn new() -> Self {
        Self {
            configured: OnceLock::new(),
            fallback: OnceLock::new(),
        }
    }

    /// Installs `settings`. Only the first call succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Configuration`] if settings were already installed.
    pub fn configure(&self, settings: Settings) -> FormResult<()> {
        self.configured.set(settings).map_err(|_| {
            FormError::Configuration("formwork settings are already configured".to_string())
        })?;
        tracing::debug!("formwork settings configured");
        Ok(())
    }

    /// The installed settings, or the defaults when nothing was installed.
    pub fn get(&self) -> &Settings {
        self.configured
            .get()
            .unwrap_or_else(|| self.fallback.get_or_init(Settings::default))
    }

    /// The installed settings only.
    pub fn try_get(&self) -> Option<&Settings> {
        self.configured.get()
    }

    /// Whether [`configure`](Self::configure) has succeeded.
    pub fn is_configured(&self) -> bool {
        self.configured.get().is_some()
    }
}

/// The process-wide settings.
pub static SETTINGS: GlobalSettings = GlobalSettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.symbol_key_prefix, ":");
        assert_eq!(s.message("blank"), Some("can't be blank"));
        assert_eq!(
            s.message("too_short"),
            Some("is too short (minimum is %{count} characters)")
        );
        assert_eq!(s.message("no_such_code"), None);
    }

    #[test]
    fn test_current_is_always_usable() {
        // Another test in the same binary may have configured the global.
        assert!(!Settings::current().symbol_key_prefix.is_empty());
    }

    #[test]
    fn test_unconfigured_storage_falls_back_to_defaults() {
        let storage = GlobalSettings::new();
        assert!(!storage.is_configured());
        assert!(storage.try_get().is_none());
        assert_eq!(storage.get(), &Settings::default());
    }

    #[test]
    fn test_configure_once() {
        let storage = GlobalSettings::new();
        let custom = Settings {
            debug: false,
            symbol_key_prefix: "@".to_string(),
            ..Settings::default()
        };

        storage.configure(custom.clone()).unwrap();
        assert!(storage.is_configured());
        assert_eq!(storage.get(), &custom);

        let err = storage.configure(Settings::default()).unwrap_err();
        assert!(matches!(err, FormError::Configuration(_)));
        assert_eq!(storage.get().symbol_key_prefix, "@");
    }
}
