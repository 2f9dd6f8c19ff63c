//! Text helpers used to derive names and messages.
//!
//! These helpers implement the naming conventions the form layer relies on:
//! a form type called `SignupForm` is addressed as `signup_form` in request
//! parameters, and a field called `email_address` is shown as
//! "Email address" in error messages.

use regex::Regex;
use std::sync::OnceLock;

/// Converts a `CamelCase` type name to `snake_case`.
///
/// Module paths and generic arguments are dropped, so the output of
/// [`std::any::type_name`] can be passed directly.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::text::underscore;
///
/// assert_eq!(underscore("SignupForm"), "signup_form");
/// assert_eq!(underscore("my_app::forms::HTTPRequestForm"), "http_request_form");
/// assert_eq!(underscore("Wrapper<Inner>"), "wrapper");
/// ```
pub fn underscore(s: &str) -> String {
    static ACRONYM: OnceLock<Regex> = OnceLock::new();
    static LOWER_UPPER: OnceLock<Regex> = OnceLock::new();

    let acronym = ACRONYM.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
    let lower_upper = LOWER_UPPER.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").unwrap());

    let base = s.split('<').next().unwrap_or(s);
    let base = base.rsplit("::").next().unwrap_or(base);

    let s = acronym.replace_all(base, "${1}_${2}");
    let s = lower_upper.replace_all(&s, "${1}_${2}");
    s.replace('-', "_").to_lowercase()
}

/// Turns a field identifier into a human-readable label.
///
/// Underscores become spaces, a trailing `_id` is dropped, and the first
/// character is capitalized.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::text::humanize;
///
/// assert_eq!(humanize("email_address"), "Email address");
/// assert_eq!(humanize("author_id"), "Author");
/// ```
pub fn humanize(s: &str) -> String {
    let s = s.strip_suffix("_id").unwrap_or(s);
    let s = s.replace('_', " ").trim().to_lowercase();
    capfirst(&s)
}

/// Uppercases the first character only.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::text::capfirst;
///
/// assert_eq!(capfirst("hello"), "Hello");
/// assert_eq!(capfirst(""), "");
/// assert_eq!(capfirst("HELLO"), "HELLO");
/// ```
pub fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |c| {
        let mut result = c.to_uppercase().to_string();
        result.extend(chars);
        result
    })
}

/// Naive English pluralization for `snake_case` identifiers.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::text::pluralize;
///
/// assert_eq!(pluralize("signup_form"), "signup_forms");
/// assert_eq!(pluralize("address"), "addresses");
/// assert_eq!(pluralize("category"), "categories");
/// ```
pub fn pluralize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    if let Some(stem) = s.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    if s.ends_with(['s', 'x', 'z']) || s.ends_with("ch") || s.ends_with("sh") {
        return format!("{s}es");
    }
    format!("{s}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── underscore ───────────────────────────────────────────────────

    #[test]
    fn test_underscore_simple() {
        assert_eq!(underscore("Form"), "form");
        assert_eq!(underscore("SignupForm"), "signup_form");
    }

    #[test]
    fn test_underscore_acronym() {
        assert_eq!(underscore("HTTPForm"), "http_form");
        assert_eq!(underscore("APIKeyForm"), "api_key_form");
    }

    #[test]
    fn test_underscore_digits() {
        assert_eq!(underscore("Step2Form"), "step2_form");
    }

    #[test]
    fn test_underscore_path_and_generics() {
        assert_eq!(underscore("crate::forms::ContactForm"), "contact_form");
        assert_eq!(underscore("forms::Wrapper<forms::Inner>"), "wrapper");
    }

    #[test]
    fn test_underscore_already_snake() {
        assert_eq!(underscore("already_snake"), "already_snake");
    }

    // ── humanize ─────────────────────────────────────────────────────

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("name"), "Name");
        assert_eq!(humanize("password_confirmation"), "Password confirmation");
        assert_eq!(humanize("user_id"), "User");
        assert_eq!(humanize(""), "");
    }

    // ── capfirst ─────────────────────────────────────────────────────

    #[test]
    fn test_capfirst_lower() {
        assert_eq!(capfirst("hello"), "Hello");
    }

    #[test]
    fn test_capfirst_empty() {
        assert_eq!(capfirst(""), "");
    }

    // ── pluralize ────────────────────────────────────────────────────

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("form"), "forms");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("survey"), "surveys");
        assert_eq!(pluralize("entry"), "entries");
        assert_eq!(pluralize(""), "");
    }
}
