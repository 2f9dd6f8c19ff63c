//! # formwork-forms
//!
//! Declarative form objects. A form type declares its fields, cleaners,
//! defaults, validators, and outcome processors once in a
//! [`FormDescriptor`]; each instance then runs request input through
//! [`FormObject::process`].
//!
//! ## Modules
//!
//! - [`descriptor`] - Per-type declarations and the builder that collects them
//! - [`form`] - The [`FormObject`] trait and the `process` pipeline
//! - [`model_name`] - Conventional names derived from the form type
//! - [`params`] - Raw request parameters and key normalization
//! - [`state`] - Per-instance field values and errors
//! - [`validation`] - Validators and the error collection

pub mod descriptor;
pub mod form;
pub mod model_name;
pub mod params;
pub mod state;
pub mod validation;

pub use descriptor::{Augmentation, FormDescriptor, FormDescriptorBuilder, NamedHook, Outcome};
pub use form::FormObject;
pub use model_name::ModelName;
pub use params::RawParams;
pub use state::FormState;
pub use validation::{Errors, Validator, BASE};
