//! Per-instance form state.
//!
//! A [`FormState`] holds one slot per declared field, the raw parameters of
//! the last `process` call, and the validation errors. Field access is
//! deliberately permissive: reading an undeclared name yields nothing and
//! writing one is a silent no-op, so rendering code can probe for optional
//! fields without failing.

use std::ops::Index;

use indexmap::IndexMap;

use formwork_core::Value;

use crate::descriptor::FormDescriptor;
use crate::model_name::ModelName;
use crate::params::RawParams;
use crate::validation::Errors;

static NULL: Value = Value::Null;

/// The mutable state of a single form instance.
///
/// # Examples
///
/// ```
/// use formwork_forms::state::FormState;
/// use formwork_core::Value;
///
/// let mut state = FormState::with_fields("ContactForm", ["name", "email"]);
/// assert!(state.set("name", "Alice"));
/// assert!(!state.set("nickname", "Al"));
/// assert_eq!(state["name"], Value::from("Alice"));
/// assert_eq!(state["nickname"], Value::Null);
/// assert!(!state.persisted());
/// ```
#[derive(Debug, Clone)]
pub struct FormState {
    model_name: ModelName,
    fields: IndexMap<String, Value>,
    raw_params: RawParams,
    errors: Errors,
}

impl FormState {
    /// Creates state with a slot for every field `descriptor` declares.
    pub fn new<F>(descriptor: &FormDescriptor<F>) -> Self {
        Self {
            model_name: descriptor.model_name().clone(),
            fields: descriptor
                .field_names()
                .iter()
                .map(|name| (name.clone(), Value::Null))
                .collect(),
            raw_params: RawParams::new(),
            errors: Errors::new(),
        }
    }

    /// Creates standalone state for the named type with the given fields.
    pub fn with_fields<I, S>(type_name: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model_name: ModelName::new(type_name),
            fields: fields
                .into_iter()
                .map(|name| (name.into(), Value::Null))
                .collect(),
            raw_params: RawParams::new(),
            errors: Errors::new(),
        }
    }

    /// Returns the value of a declared field, or `None` for undeclared names.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Assigns a declared field. Undeclared names are ignored.
    ///
    /// Returns `true` if the field exists and was assigned.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> bool {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `name` is a declared field.
    pub fn is_declared(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// A snapshot of the fields that currently hold a present value, in
    /// declaration order. Blank fields are omitted.
    pub fn attributes(&self) -> IndexMap<String, Value> {
        self.fields
            .iter()
            .filter(|(_, value)| value.is_present())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Form objects are never backed by a stored record.
    pub const fn persisted(&self) -> bool {
        false
    }

    /// The inverse of [`persisted`](Self::persisted); always `true`.
    pub const fn is_new_record(&self) -> bool {
        true
    }

    /// Identifying key values; a transient object has none.
    pub const fn to_key(&self) -> Option<Vec<Value>> {
        None
    }

    /// URL parameter identifying the record; a transient object has none.
    pub const fn to_param(&self) -> Option<String> {
        None
    }

    /// The conventional names of the owning form type.
    pub const fn model_name(&self) -> &ModelName {
        &self.model_name
    }

    /// The namespaced parameters of the last `process` call.
    pub const fn raw_params(&self) -> &RawParams {
        &self.raw_params
    }

    /// Validation errors from the last validation run.
    pub const fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Mutable access to the validation errors.
    pub fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    /// Stores `params` and copies every present value onto the matching
    /// declared field. Blank or missing values leave the field untouched.
    ///
    /// Returns the number of fields assigned.
    pub fn assign_params(&mut self, params: RawParams) -> usize {
        let mut assigned = 0;
        for (name, slot) in &mut self.fields {
            if let Some(value) = params.get(name).filter(|v| v.is_present()) {
                *slot = value.clone();
                assigned += 1;
            }
        }
        self.raw_params = params;
        assigned
    }

    /// A template context describing the form: model name, every declared
    /// field (blank ones as `null`), errors, and persistence state.
    pub fn as_context(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::from(value)))
            .collect();

        serde_json::json!({
            "model_name": self.model_name.param_key,
            "human_name": self.model_name.human,
            "fields": fields,
            "errors": self.errors,
            "full_messages": self.errors.full_messages(),
            "persisted": self.persisted(),
        })
    }
}

impl Index<&str> for FormState {
    type Output = Value;

    /// Reads a field, yielding `Value::Null` for undeclared names.
    fn index(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&NULL)
    }
}
