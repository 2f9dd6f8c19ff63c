//! The [`FormObject`] trait and the `process` pipeline.
//!
//! A form object is any type that owns a [`FormState`] and points at a
//! shared [`FormDescriptor`]. Implementors override only the hooks they
//! need; everything else has a no-op default.
//!
//! [`FormObject::process`] runs the whole request pipeline:
//!
//! 1. resolve the form's namespace in the raw input and store it;
//! 2. copy present values onto declared fields;
//! 3. run [`clean_data`](FormObject::clean_data), then every registered cleaner;
//! 4. fill blank fields from the declared defaults;
//! 5. validate;
//! 6. run the valid or invalid hook and processors, then the always ones;
//! 7. return the validity.
//!
//! The first hook that returns an error aborts the pipeline and the error is
//! returned unchanged. Nothing is rolled back.
//!
//! # Examples
//!
//! ```
//! use std::sync::OnceLock;
//!
//! use formwork_core::{FormResult, Value};
//! use formwork_forms::descriptor::FormDescriptor;
//! use formwork_forms::form::FormObject;
//! use formwork_forms::state::FormState;
//! use formwork_forms::validation::Presence;
//!
//! struct ContactForm {
//!     state: FormState,
//! }
//!
//! impl ContactForm {
//!     fn downcase_email(&mut self) -> FormResult<()> {
//!         if let Some(email) = self.get("email").and_then(Value::as_str) {
//!             let email = email.to_lowercase();
//!             self.set("email", email);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl FormObject for ContactForm {
//!     type Args = ();
//!
//!     fn descriptor() -> &'static FormDescriptor<Self> {
//!         static DESCRIPTOR: OnceLock<FormDescriptor<ContactForm>> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             FormDescriptor::define(|b| {
//!                 b.declare_fields(["name", "email"])
//!                     .register_cleaner("downcase_email", ContactForm::downcase_email)
//!                     .declare_defaults([("name", "Anonymous")])
//!                     .validates("email", Presence);
//!                 Ok(())
//!             })
//!             .expect("contact form declarations are valid")
//!         })
//!     }
//!
//!     fn from_state(state: FormState) -> Self {
//!         Self { state }
//!     }
//!
//!     fn state(&self) -> &FormState {
//!         &self.state
//!     }
//!
//!     fn state_mut(&mut self) -> &mut FormState {
//!         &mut self.state
//!     }
//! }
//!
//! let mut form = ContactForm::build(()).unwrap();
//! let input = serde_json::json!({"contact_form": {"email": "ALICE@Example.com"}});
//! assert!(form.process(input).unwrap());
//! assert_eq!(form.get("email"), Some(&Value::from("alice@example.com")));
//! assert_eq!(form.get("name"), Some(&Value::from("Anonymous")));
//! ```

use indexmap::IndexMap;

use formwork_core::logging::form_span;
use formwork_core::{FormResult, Value};

use crate::descriptor::{FormDescriptor, Outcome};
use crate::model_name::ModelName;
use crate::params::RawParams;
use crate::state::FormState;
use crate::validation::{run_validators, Errors};

/// A declarative form object.
pub trait FormObject: Sized + 'static {
    /// Arguments passed through [`build`](Self::build) to
    /// [`after_initialize`](Self::after_initialize).
    type Args;

    /// The shared declarations of this form type.
    fn descriptor() -> &'static FormDescriptor<Self>;

    /// Wraps freshly created state. Perform setup in
    /// [`after_initialize`](Self::after_initialize) instead.
    fn from_state(state: FormState) -> Self;

    /// Borrows the instance state.
    fn state(&self) -> &FormState;

    /// Mutably borrows the instance state.
    fn state_mut(&mut self) -> &mut FormState;

    /// Instance setup, run once by [`build`](Self::build) with its arguments.
    fn after_initialize(&mut self, _args: Self::Args) -> FormResult<()> {
        Ok(())
    }

    /// Primary cleaning step, run before the registered cleaners.
    fn clean_data(&mut self) -> FormResult<()> {
        Ok(())
    }

    /// Cross-field validation, run after the field validators. Add failures
    /// to `errors`; [`raw_params`](Self::raw_params) still holds the
    /// unparsed input.
    fn validate_form(&self, _errors: &mut Errors) {}

    /// Replaces the error collection with a fresh validation run and
    /// returns whether the form is valid.
    fn validate(&mut self) -> bool {
        let mut errors = run_validators(Self::descriptor().validators(), self.state());
        self.validate_form(&mut errors);

        let state_errors = self.state_mut().errors_mut();
        state_errors.clear();
        state_errors.merge(errors);
        state_errors.is_empty()
    }

    /// Runs when validation passed, before the `valid` processors.
    fn process_valid(&mut self) -> FormResult<()> {
        Ok(())
    }

    /// Runs when validation failed, before the `invalid` processors.
    fn process_invalid(&mut self) -> FormResult<()> {
        Ok(())
    }

    /// Runs after either outcome, before the `always` processors.
    fn process_always(&mut self) -> FormResult<()> {
        Ok(())
    }

    /// Creates an instance with a slot for every declared field, then runs
    /// [`after_initialize`](Self::after_initialize).
    fn build(args: Self::Args) -> FormResult<Self> {
        let mut form = Self::from_state(FormState::new(Self::descriptor()));
        form.after_initialize(args)?;
        Ok(form)
    }

    /// Runs the full pipeline over `input` and returns whether the form is
    /// valid. Hook errors abort the pipeline and are returned as-is.
    fn process(&mut self, input: impl Into<RawParams>) -> FormResult<bool> {
        run_pipeline(self, input.into())
    }

    /// Reads a declared field; `None` for undeclared names.
    fn get(&self, name: &str) -> Option<&Value> {
        self.state().get(name)
    }

    /// Writes a declared field; undeclared names are ignored.
    fn set(&mut self, name: &str, value: impl Into<Value>) -> bool {
        self.state_mut().set(name, value)
    }

    /// Present fields in declaration order.
    fn attributes(&self) -> IndexMap<String, Value> {
        self.state().attributes()
    }

    /// Always `false`: form objects are transient.
    fn persisted(&self) -> bool {
        self.state().persisted()
    }

    /// The namespaced input of the last `process` call.
    fn raw_params(&self) -> &RawParams {
        self.state().raw_params()
    }

    /// Errors from the last validation run.
    fn errors(&self) -> &Errors {
        self.state().errors()
    }

    /// The conventional names of this form type.
    fn model_name(&self) -> &ModelName {
        Self::descriptor().model_name()
    }
}

fn run_pipeline<F: FormObject>(form: &mut F, input: RawParams) -> FormResult<bool> {
    let descriptor = F::descriptor();
    let span = form_span(&descriptor.model_name().param_key);
    let _guard = span.enter();

    let params = input.namespace(&descriptor.model_name().param_key);
    let assigned = form.state_mut().assign_params(params);
    tracing::debug!(assigned, "assigned fields from params");

    form.clean_data()?;
    for cleaner in descriptor.cleaners() {
        tracing::trace!(cleaner = cleaner.name(), "running cleaner");
        cleaner.call(form)?;
    }

    apply_defaults(descriptor, form.state_mut());

    form.state_mut().errors_mut().clear();
    let valid = form.validate();
    tracing::debug!(valid, errors = form.errors().len(), "validated");

    let outcome = if valid { Outcome::Valid } else { Outcome::Invalid };
    tracing::debug!(%outcome, "dispatching outcome");
    if valid {
        form.process_valid()?;
    } else {
        form.process_invalid()?;
    }
    dispatch(descriptor, outcome, form)?;
    form.process_always()?;
    dispatch(descriptor, Outcome::Always, form)?;

    Ok(valid)
}

fn apply_defaults<F>(descriptor: &FormDescriptor<F>, state: &mut FormState) {
    for (field, default) in descriptor.defaults() {
        if state.get(field).map_or(true, Value::is_blank) && state.set(field, default.clone()) {
            tracing::trace!(field = %field, "applied default");
        }
    }
}

fn dispatch<F: FormObject>(
    descriptor: &FormDescriptor<F>,
    outcome: Outcome,
    form: &mut F,
) -> FormResult<()> {
    for processor in descriptor.processors(outcome) {
        tracing::trace!(processor = processor.name(), %outcome, "running processor");
        processor.call(form)?;
    }
    Ok(())
}
