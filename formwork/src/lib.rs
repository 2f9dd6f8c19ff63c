//! # formwork
//!
//! Declarative form objects for Rust.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `formwork` to get everything, or on the individual
//! crates for finer-grained control.

/// Core types, settings, logging, and error types.
pub use formwork_core as core;

/// Form descriptors, form objects, parameters, and validation.
pub use formwork_forms as forms;

/// Third-party crates used in the public API.
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// The types most form definitions need.
///
/// ```
/// use formwork::prelude::*;
///
/// let params = RawParams::from_query_string("signup[name]=Alice");
/// assert_eq!(params.namespace("signup").get("name"), Some(&Value::from("Alice")));
/// ```
pub mod prelude {
    pub use formwork_core::{FormError, FormResult, Settings, ValidationError, Value, SETTINGS};
    pub use formwork_forms::descriptor::{
        Augmentation, FormDescriptor, FormDescriptorBuilder, Outcome,
    };
    pub use formwork_forms::form::FormObject;
    pub use formwork_forms::params::RawParams;
    pub use formwork_forms::state::FormState;
    pub use formwork_forms::validation::{
        Confirmation, Email, Errors, Format, Inclusion, Length, NumberRange, Presence, Validator,
        BASE,
    };
}
