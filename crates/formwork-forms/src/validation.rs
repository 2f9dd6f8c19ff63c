//! The validation collaborator.
//!
//! Validators are attached to fields when a form type is declared and run
//! when a form validates. Each one checks a single rule and reports a
//! [`ValidationError`]; the runner turns failures into human-readable
//! messages collected in [`Errors`]. Failures are data, never `Err` values
//! bubbling out of `process`.
//!
//! A blank value skips every validator except [`Presence`], so optional
//! fields only need the rules that apply once something was submitted.

use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use formwork_core::utils::text::humanize;
use formwork_core::{Settings, ValidationError, Value};

use crate::descriptor::FieldValidator;
use crate::state::FormState;

/// The pseudo-field that holds errors about the form as a whole.
pub const BASE: &str = "base";

/// A trait for validating a single field value.
///
/// # Examples
///
/// ```
/// use formwork_forms::state::FormState;
/// use formwork_forms::validation::{Length, Validator};
/// use formwork_core::Value;
///
/// let state = FormState::with_fields("SignupForm", ["name"]);
/// let v = Length::maximum(3);
/// assert!(v.validate("name", &Value::from("Bob"), &state).is_ok());
/// assert!(v.validate("name", &Value::from("Robert"), &state).is_err());
/// ```
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates `value`, the current value of `field` on `form`.
    fn validate(&self, field: &str, value: &Value, form: &FormState) -> Result<(), ValidationError>;

    /// Returns a human-readable name for this validator.
    fn name(&self) -> &str;

    /// Whether a blank value passes without running [`validate`](Self::validate).
    fn allows_blank(&self) -> bool {
        true
    }
}

/// Builds a [`ValidationError`] for `code`, interpolating `%{key}` params
/// into the configured message template.
pub fn error_for(code: &str, params: &[(&str, String)]) -> ValidationError {
    let template = Settings::current()
        .message(code)
        .map_or_else(|| code.replace('_', " "), str::to_string);

    let mut message = template;
    let mut error = ValidationError::new(String::new(), code);
    for (key, value) in params {
        message = message.replace(&format!("%{{{key}}}"), value);
        error = error.with_param(*key, value.clone());
    }
    error.message = message;
    error
}

// ============================================================
// Built-in validators
// ============================================================

/// Requires the value to be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct Presence;

impl Validator for Presence {
    fn validate(&self, _field: &str, value: &Value, _form: &FormState) -> Result<(), ValidationError> {
        if value.is_blank() {
            return Err(error_for("blank", &[]));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "Presence"
    }

    fn allows_blank(&self) -> bool {
        false
    }
}

/// Bounds the length of a string (in characters) or a list (in items).
#[derive(Debug, Clone, Copy, Default)]
pub struct Length {
    /// Minimum length, inclusive.
    pub min: Option<usize>,
    /// Maximum length, inclusive.
    pub max: Option<usize>,
}

impl Length {
    /// A length with only a lower bound.
    pub const fn minimum(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// A length with only an upper bound.
    pub const fn maximum(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// A length bounded on both sides.
    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl Validator for Length {
    fn validate(&self, _field: &str, value: &Value, _form: &FormState) -> Result<(), ValidationError> {
        let len = match value {
            Value::String(s) => s.chars().count(),
            Value::List(items) => items.len(),
            other => other.to_string().chars().count(),
        };
        if let Some(min) = self.min {
            if len < min {
                return Err(error_for("too_short", &[("count", min.to_string())]));
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return Err(error_for("too_long", &[("count", max.to_string())]));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "Length"
    }
}

/// Requires the string form of the value to match a regular expression.
#[derive(Debug, Clone)]
pub struct Format {
    pattern: Regex,
}

impl Format {
    /// Wraps an already-compiled pattern.
    pub const fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// Compiles `pattern`.
    pub fn try_new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::new)
    }
}

impl Validator for Format {
    fn validate(&self, _field: &str, value: &Value, _form: &FormState) -> Result<(), ValidationError> {
        if self.pattern.is_match(&value.to_string()) {
            Ok(())
        } else {
            Err(error_for("invalid", &[]))
        }
    }

    fn name(&self) -> &str {
        "Format"
    }
}

/// Requires a plausible e-mail address.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Validator for Email {
    fn validate(&self, _field: &str, value: &Value, _form: &FormState) -> Result<(), ValidationError> {
        static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
        let email_re = EMAIL_RE.get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").unwrap()
        });

        match value.as_str() {
            Some(s) if email_re.is_match(s.trim()) => Ok(()),
            _ => Err(error_for("invalid", &[])),
        }
    }

    fn name(&self) -> &str {
        "Email"
    }
}

/// Requires the value to be one of a fixed set.
#[derive(Debug, Clone, Default)]
pub struct Inclusion {
    allowed: Vec<Value>,
}

impl Inclusion {
    /// Creates an inclusion check over `allowed`.
    pub fn new<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for Inclusion {
    fn validate(&self, _field: &str, value: &Value, _form: &FormState) -> Result<(), ValidationError> {
        if self.allowed.contains(value) {
            Ok(())
        } else {
            Err(error_for("inclusion", &[]))
        }
    }

    fn name(&self) -> &str {
        "Inclusion"
    }
}

/// Requires a number, optionally bounded. Numeric strings are accepted,
/// since raw form input is text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberRange {
    /// Minimum value, inclusive.
    pub min: Option<f64>,
    /// Maximum value, inclusive.
    pub max: Option<f64>,
}

impl NumberRange {
    /// Any number, no bounds.
    pub const fn any() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// A number within `min..=max`.
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl Validator for NumberRange {
    fn validate(&self, _field: &str, value: &Value, _form: &FormState) -> Result<(), ValidationError> {
        let number = match value {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            other => other.as_float(),
        };
        let Some(number) = number else {
            return Err(error_for("not_a_number", &[]));
        };

        if let Some(min) = self.min {
            if number < min {
                return Err(error_for("greater_than_or_equal_to", &[("count", min.to_string())]));
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return Err(error_for("less_than_or_equal_to", &[("count", max.to_string())]));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "NumberRange"
    }
}

/// Requires the value to equal another field's value.
///
/// Attach it to the confirming field (`password_confirmation`) and name the
/// field it confirms (`password`).
#[derive(Debug, Clone)]
pub struct Confirmation {
    other: String,
}

impl Confirmation {
    /// Confirms the field called `other`.
    pub fn of(other: impl Into<String>) -> Self {
        Self {
            other: other.into(),
        }
    }
}

impl Validator for Confirmation {
    fn validate(&self, _field: &str, value: &Value, form: &FormState) -> Result<(), ValidationError> {
        if form.get(&self.other) == Some(value) {
            Ok(())
        } else {
            Err(error_for("confirmation", &[("attribute", humanize(&self.other))]))
        }
    }

    fn name(&self) -> &str {
        "Confirmation"
    }
}

// ============================================================
// Error collection
// ============================================================

/// Validation messages keyed by field, in the order fields first failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Errors {
    messages: IndexMap<String, Vec<String>>,
}

impl Errors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.messages
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Adds the message of a failed check for `field`.
    pub fn add_error(&mut self, field: impl Into<String>, error: &ValidationError) {
        self.add(field, error.message.clone());
    }

    /// Returns the messages recorded for `field` (empty if none).
    pub fn get(&self, field: &str) -> &[String] {
        self.messages.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `field` has at least one message.
    pub fn contains(&self, field: &str) -> bool {
        self.messages.get(field).is_some_and(|m| !m.is_empty())
    }

    /// Returns `true` if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.messages.values().all(Vec::is_empty)
    }

    /// Total number of messages across all fields.
    pub fn len(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Moves every message from `other` into this collection.
    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.messages {
            self.messages.entry(field).or_default().extend(messages);
        }
    }

    /// Iterates over `(field, messages)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.messages
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// Messages prefixed with the humanized field name ("Email can't be
    /// blank"). Messages on [`BASE`] are returned unprefixed.
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(field, messages)| {
                messages.iter().map(move |message| full_message(field, message))
            })
            .collect()
    }

    /// Full messages for a single field.
    pub fn full_messages_for(&self, field: &str) -> Vec<String> {
        self.get(field)
            .iter()
            .map(|message| full_message(field, message))
            .collect()
    }

    /// Borrows the underlying map.
    pub const fn as_map(&self) -> &IndexMap<String, Vec<String>> {
        &self.messages
    }
}

fn full_message(field: &str, message: &str) -> String {
    if field == BASE {
        message.to_string()
    } else {
        format!("{} {message}", humanize(field))
    }
}

/// Runs `validators` against `form`, collecting every failure.
///
/// Errors accumulate rather than short-circuiting, so all problems are
/// reported at once. Validators for undeclared fields see `Value::Null`.
pub fn run_validators(validators: &[FieldValidator], form: &FormState) -> Errors {
    let mut errors = Errors::new();
    for (field, validator) in validators {
        let value = &form[field.as_str()];
        if value.is_blank() && validator.allows_blank() {
            continue;
        }
        if let Err(err) = validator.validate(field, value, form) {
            tracing::trace!(field = %field, validator = validator.name(), code = %err.code, "validation failed");
            errors.add_error(field.clone(), &err);
        }
    }
    errors
}
