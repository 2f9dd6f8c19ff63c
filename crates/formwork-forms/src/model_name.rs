//! Conventional naming for form types.
//!
//! Rendering layers and the parameter boundary both need a stable,
//! introspectable name for a form type: the request parameters for a
//! `SignupForm` arrive namespaced under `signup_form`, and labels use the
//! human form "Signup form". [`ModelName`] derives every variant from the
//! Rust type name once, when the form's descriptor is built.

use serde::Serialize;

use formwork_core::utils::text::{humanize, pluralize, underscore};

/// The set of conventional names derived from a form type.
///
/// # Examples
///
/// ```
/// use formwork_forms::model_name::ModelName;
///
/// let name = ModelName::new("my_app::forms::SignupForm");
/// assert_eq!(name.name, "SignupForm");
/// assert_eq!(name.param_key, "signup_form");
/// assert_eq!(name.plural, "signup_forms");
/// assert_eq!(name.human, "Signup form");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelName {
    /// The bare type name (`SignupForm`).
    pub name: String,
    /// `snake_case` singular (`signup_form`).
    pub singular: String,
    /// `snake_case` plural (`signup_forms`).
    pub plural: String,
    /// The key request parameters are namespaced under.
    pub param_key: String,
    /// The key used for route helpers.
    pub route_key: String,
    /// The key used for message catalogs.
    pub i18n_key: String,
    /// A human-readable label (`Signup form`).
    pub human: String,
}

impl ModelName {
    /// Derives all names from a (possibly path-qualified) type name.
    pub fn new(type_name: &str) -> Self {
        let base = type_name.split('<').next().unwrap_or(type_name);
        let name = base.rsplit("::").next().unwrap_or(base).to_string();
        let singular = underscore(&name);
        let plural = pluralize(&singular);

        Self {
            name,
            param_key: singular.clone(),
            route_key: plural.clone(),
            i18n_key: singular.clone(),
            human: humanize(&singular),
            singular,
            plural,
        }
    }

    /// Derives the names for the Rust type `T`.
    pub fn from_type<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// Overrides the parameter namespace, keeping every other name.
    #[must_use]
    pub fn with_param_key(mut self, param_key: impl Into<String>) -> Self {
        self.param_key = param_key.into();
        self
    }
}
