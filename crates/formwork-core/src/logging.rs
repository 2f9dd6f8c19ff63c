//! [`tracing`] setup and the span that wraps each form pass.
//!
//! Libraries should not install subscribers behind an application's back, so
//! nothing here runs implicitly. Applications that have no subscriber of their
//! own can call [`setup_logging`] once at startup.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Installs a global subscriber configured from `settings`.
///
/// `settings.log_level` is parsed as an [`EnvFilter`] directive; an invalid
/// directive falls back to `info`. Debug mode selects multi-line pretty
/// output with source locations, otherwise events are written as JSON lines.
///
/// Returns `false` when a global subscriber was already installed, in which
/// case the existing one is kept.
pub fn setup_logging(settings: &Settings) -> bool {
    let filter = log_filter(&settings.log_level);
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if settings.debug {
        builder
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
    } else {
        builder.json().flatten_event(true).try_init()
    };
    installed.is_ok()
}

fn log_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Creates the span entered for one pass of a form through `process`.
///
/// Events emitted by cleaners, validators and processors inherit the
/// `model` field.
///
/// # Examples
///
/// ```
/// use formwork_core::logging::form_span;
///
/// let span = form_span("signup_form");
/// let _guard = span.enter();
/// tracing::debug!("cleaning");
/// ```
pub fn form_span(model_name: &str) -> tracing::Span {
    tracing::debug_span!("form", model = model_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_setup_keeps_first_subscriber() {
        let quiet = Settings {
            debug: false,
            log_level: "formwork=loudest".to_string(),
            ..Settings::default()
        };
        // Other tests may have installed a subscriber first.
        let _ = setup_logging(&quiet);
        assert!(!setup_logging(&Settings::default()));
    }

    #[test]
    fn test_invalid_directive_falls_back() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(log_filter("formwork=loudest").max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter("formwork_forms=trace").max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn test_form_span_enters() {
        let span = form_span("contact_form");
        let _guard = span.enter();
        tracing::debug!("inside span");
    }
}
