//! Form type descriptors.
//!
//! A [`FormDescriptor`] is the per-type configuration every instance of a
//! form shares: the declared field names, the ordered cleaner hooks, the
//! processors for each validation outcome, default values, and field
//! validators. It is assembled once through a [`FormDescriptorBuilder`] and
//! is immutable afterwards, typically stored in a `static OnceLock`.
//!
//! Reusable bundles of declarations are expressed as [`Augmentation`]s and
//! applied to a builder explicitly, in order.
//!
//! # Examples
//!
//! ```
//! use formwork_core::FormResult;
//! use formwork_forms::descriptor::FormDescriptor;
//!
//! struct Signup;
//!
//! fn noop(_form: &mut Signup) -> FormResult<()> {
//!     Ok(())
//! }
//!
//! let descriptor = FormDescriptor::<Signup>::define(|b| {
//!     b.declare_fields(["name", "email"])
//!         .register_cleaner("strip", noop)
//!         .declare_defaults([("email", "n/a")]);
//!     b.register_processor("notify", "valid", noop)?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(descriptor.field_names(), ["name", "email"]);
//! assert_eq!(descriptor.processor_names("valid".parse().unwrap()), vec!["notify"]);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use formwork_core::{FormError, FormResult, Value};

use crate::model_name::ModelName;
use crate::validation::Validator;

/// A user hook run against a form instance.
pub type Hook<F> = Arc<dyn Fn(&mut F) -> FormResult<()> + Send + Sync>;

/// A validator bound to the field it checks.
pub type FieldValidator = (String, Arc<dyn Validator>);

/// The validation outcome a processor is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Runs only when validation passed.
    Valid,
    /// Runs only when validation failed.
    Invalid,
    /// Runs after either outcome.
    Always,
}

impl Outcome {
    /// Every outcome, in dispatch order.
    pub const ALL: [Self; 3] = [Self::Valid, Self::Invalid, Self::Always];

    /// The tag used when registering processors by name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            "always" => Ok(Self::Always),
            other => Err(FormError::InvalidArgument(format!(
                "processor outcome must be one of valid, invalid, always (got '{other}')"
            ))),
        }
    }
}

/// A hook together with the identifier it was registered under.
pub struct NamedHook<F> {
    name: String,
    hook: Hook<F>,
}

impl<F> NamedHook<F> {
    /// Wraps `hook` under `name`.
    pub fn new(name: impl Into<String>, hook: Hook<F>) -> Self {
        Self {
            name: name.into(),
            hook,
        }
    }

    /// The identifier the hook was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the hook against `form`.
    pub fn call(&self, form: &mut F) -> FormResult<()> {
        (self.hook)(form)
    }
}

impl<F> Clone for NamedHook<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            hook: Arc::clone(&self.hook),
        }
    }
}

impl<F> fmt::Debug for NamedHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedHook").field(&self.name).finish()
    }
}

struct Processors<F> {
    valid: Vec<NamedHook<F>>,
    invalid: Vec<NamedHook<F>>,
    always: Vec<NamedHook<F>>,
}

impl<F> Default for Processors<F> {
    fn default() -> Self {
        Self {
            valid: Vec::new(),
            invalid: Vec::new(),
            always: Vec::new(),
        }
    }
}

impl<F> Processors<F> {
    fn get(&self, outcome: Outcome) -> &[NamedHook<F>] {
        match outcome {
            Outcome::Valid => &self.valid,
            Outcome::Invalid => &self.invalid,
            Outcome::Always => &self.always,
        }
    }

    fn get_mut(&mut self, outcome: Outcome) -> &mut Vec<NamedHook<F>> {
        match outcome {
            Outcome::Valid => &mut self.valid,
            Outcome::Invalid => &mut self.invalid,
            Outcome::Always => &mut self.always,
        }
    }
}

/// The immutable, shared configuration of a form type.
pub struct FormDescriptor<F> {
    model_name: ModelName,
    field_names: Vec<String>,
    cleaners: Vec<NamedHook<F>>,
    processors: Processors<F>,
    defaults: IndexMap<String, Value>,
    validators: Vec<FieldValidator>,
}

impl<F> FormDescriptor<F> {
    /// Starts a builder named after the Rust type `F`.
    pub fn builder() -> FormDescriptorBuilder<F> {
        FormDescriptorBuilder::new(ModelName::from_type::<F>())
    }

    /// Builds a descriptor by running `declare` against a fresh builder.
    ///
    /// Any declaration error (such as an unknown processor outcome) aborts
    /// the definition.
    pub fn define(
        declare: impl FnOnce(&mut FormDescriptorBuilder<F>) -> FormResult<()>,
    ) -> FormResult<Self> {
        let mut builder = Self::builder();
        declare(&mut builder)?;
        Ok(builder.build())
    }

    /// The conventional names of this form type.
    pub const fn model_name(&self) -> &ModelName {
        &self.model_name
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Returns `true` if `name` is a declared field.
    pub fn is_field(&self, name: &str) -> bool {
        self.field_names.iter().any(|f| f == name)
    }

    /// Cleaner hooks, in registration order.
    pub fn cleaners(&self) -> &[NamedHook<F>] {
        &self.cleaners
    }

    /// Cleaner identifiers, in registration order.
    pub fn cleaner_names(&self) -> Vec<&str> {
        self.cleaners.iter().map(NamedHook::name).collect()
    }

    /// Processors registered for `outcome`, in registration order.
    pub fn processors(&self, outcome: Outcome) -> &[NamedHook<F>] {
        self.processors.get(outcome)
    }

    /// Processor identifiers registered for `outcome`.
    pub fn processor_names(&self, outcome: Outcome) -> Vec<&str> {
        self.processors(outcome).iter().map(NamedHook::name).collect()
    }

    /// Default values keyed by field.
    pub const fn defaults(&self) -> &IndexMap<String, Value> {
        &self.defaults
    }

    /// Field validators, in declaration order.
    pub fn validators(&self) -> &[FieldValidator] {
        &self.validators
    }
}

impl<F> fmt::Debug for FormDescriptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormDescriptor")
            .field("model_name", &self.model_name.name)
            .field("field_names", &self.field_names)
            .field("cleaners", &self.cleaners)
            .field("valid", &self.processors.valid)
            .field("invalid", &self.processors.invalid)
            .field("always", &self.processors.always)
            .field("defaults", &self.defaults)
            .field("validators", &self.validators)
            .finish()
    }
}

/// Accumulates declarations for a [`FormDescriptor`].
///
/// Cleaner and processor registrations are never de-duplicated: registering
/// the same identifier twice runs it twice. Field names form an ordered set.
pub struct FormDescriptorBuilder<F> {
    model_name: ModelName,
    field_names: IndexSet<String>,
    cleaners: Vec<NamedHook<F>>,
    processors: Processors<F>,
    defaults: IndexMap<String, Value>,
    validators: Vec<FieldValidator>,
}

impl<F> FormDescriptorBuilder<F> {
    /// Creates an empty builder for a form with the given names.
    pub fn new(model_name: ModelName) -> Self {
        Self {
            model_name,
            field_names: IndexSet::new(),
            cleaners: Vec::new(),
            processors: Processors::default(),
            defaults: IndexMap::new(),
            validators: Vec::new(),
        }
    }

    /// Overrides the parameter namespace the form reads its input from.
    pub fn param_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.model_name = self.model_name.clone().with_param_key(key);
        self
    }

    /// Declares fields. Re-declaring a name keeps its first position.
    pub fn declare_fields<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Appends a cleaner, run after `clean_data` in registration order.
    pub fn register_cleaner(
        &mut self,
        name: impl Into<String>,
        hook: impl Fn(&mut F) -> FormResult<()> + Send + Sync + 'static,
    ) -> &mut Self {
        self.cleaners.push(NamedHook::new(name, Arc::new(hook)));
        self
    }

    /// Appends a processor for the outcome named by `outcome`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidArgument`] unless `outcome` is one of
    /// `valid`, `invalid`, or `always`.
    pub fn register_processor(
        &mut self,
        name: impl Into<String>,
        outcome: &str,
        hook: impl Fn(&mut F) -> FormResult<()> + Send + Sync + 'static,
    ) -> FormResult<&mut Self> {
        let outcome = outcome.parse::<Outcome>()?;
        Ok(self.register_processor_for(name, outcome, hook))
    }

    /// Appends a processor for a typed outcome.
    pub fn register_processor_for(
        &mut self,
        name: impl Into<String>,
        outcome: Outcome,
        hook: impl Fn(&mut F) -> FormResult<()> + Send + Sync + 'static,
    ) -> &mut Self {
        self.processors
            .get_mut(outcome)
            .push(NamedHook::new(name, Arc::new(hook)));
        self
    }

    /// Merges default values; a later declaration of the same field wins.
    pub fn declare_defaults<I, K, V>(&mut self, defaults: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.defaults
            .extend(defaults.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attaches a validator to `field`.
    pub fn validates(
        &mut self,
        field: impl Into<String>,
        validator: impl Validator + 'static,
    ) -> &mut Self {
        self.validators.push((field.into(), Arc::new(validator)));
        self
    }

    /// Applies a reusable bundle of declarations.
    pub fn augment(&mut self, augmentation: &impl Augmentation<F>) -> FormResult<&mut Self> {
        augmentation.augment(self)?;
        Ok(self)
    }

    /// Copies the parent descriptor's declarations into this one: fields,
    /// cleaners, processors, defaults and validators.
    ///
    /// `project` maps this form to the embedded parent form that the
    /// parent's hooks operate on. For the parent's hooks to see this form's
    /// fields, the embedded parent must share this form's
    /// [`FormState`](crate::state::FormState).
    ///
    /// Only descriptor declarations are copied. Trait methods the parent
    /// overrides (`clean_data`, `validate_form`, `process_valid`,
    /// `process_invalid`, `process_always`) do not run for the child unless
    /// the child's own implementations delegate to the embedded parent.
    pub fn inherit<P: 'static>(
        &mut self,
        parent: &FormDescriptor<P>,
        project: fn(&mut F) -> &mut P,
    ) -> &mut Self
    where
        F: 'static,
    {
        self.field_names.extend(parent.field_names.iter().cloned());
        self.cleaners
            .extend(parent.cleaners.iter().map(|h| lift(h, project)));
        for outcome in Outcome::ALL {
            let lifted: Vec<NamedHook<F>> = parent
                .processors(outcome)
                .iter()
                .map(|h| lift(h, project))
                .collect();
            self.processors.get_mut(outcome).extend(lifted);
        }
        self.defaults
            .extend(parent.defaults.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.validators.extend(parent.validators.iter().cloned());
        self
    }

    /// Freezes the declarations.
    pub fn build(self) -> FormDescriptor<F> {
        tracing::trace!(
            form = %self.model_name.name,
            fields = self.field_names.len(),
            cleaners = self.cleaners.len(),
            "form descriptor built"
        );
        FormDescriptor {
            model_name: self.model_name,
            field_names: self.field_names.into_iter().collect(),
            cleaners: self.cleaners,
            processors: self.processors,
            defaults: self.defaults,
            validators: self.validators,
        }
    }
}

fn lift<P: 'static, F: 'static>(hook: &NamedHook<P>, project: fn(&mut F) -> &mut P) -> NamedHook<F> {
    let inner = Arc::clone(&hook.hook);
    NamedHook::new(
        hook.name.clone(),
        Arc::new(move |form: &mut F| inner(project(form))),
    )
}

/// A reusable bundle of field, cleaner, processor, and validator
/// declarations that can be applied to any compatible form type.
///
/// Any `Fn(&mut FormDescriptorBuilder<F>) -> FormResult<()>` is an
/// augmentation, so plain functions work:
///
/// ```
/// use formwork_core::FormResult;
/// use formwork_forms::descriptor::{FormDescriptor, FormDescriptorBuilder};
///
/// struct Contact;
///
/// fn with_audit_fields<F>(b: &mut FormDescriptorBuilder<F>) -> FormResult<()> {
///     b.declare_fields(["created_by", "reason"]);
///     Ok(())
/// }
///
/// let d = FormDescriptor::<Contact>::define(|b| {
///     b.declare_fields(["name"]).augment(&with_audit_fields::<Contact>)?;
///     Ok(())
/// })
/// .unwrap();
/// assert_eq!(d.field_names(), ["name", "created_by", "reason"]);
/// ```
pub trait Augmentation<F> {
    /// Appends this bundle's declarations to `builder`.
    fn augment(&self, builder: &mut FormDescriptorBuilder<F>) -> FormResult<()>;
}

impl<F, T> Augmentation<F> for T
where
    T: Fn(&mut FormDescriptorBuilder<F>) -> FormResult<()>,
{
    fn augment(&self, builder: &mut FormDescriptorBuilder<F>) -> FormResult<()> {
        self(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Presence;

    #[derive(Default)]
    struct Probe {
        calls: Vec<String>,
    }

    fn record(tag: &'static str) -> impl Fn(&mut Probe) -> FormResult<()> + Send + Sync {
        move |probe: &mut Probe| {
            probe.calls.push(tag.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_outcome_parse() {
        assert_eq!("valid".parse::<Outcome>().unwrap(), Outcome::Valid);
        assert_eq!("invalid".parse::<Outcome>().unwrap(), Outcome::Invalid);
        assert_eq!("always".parse::<Outcome>().unwrap(), Outcome::Always);
        assert!(matches!(
            "bogus".parse::<Outcome>(),
            Err(FormError::InvalidArgument(_))
        ));
        assert!("Valid".parse::<Outcome>().is_err());
        assert_eq!(Outcome::Always.to_string(), "always");
    }

    #[test]
    fn test_register_processor_rejects_unknown_outcome() {
        let mut b = FormDescriptor::<Probe>::builder();
        let err = b.register_processor("p", "bogus", record("p")).err().unwrap();
        assert!(matches!(err, FormError::InvalidArgument(_)));
        assert!(b.register_processor("p", "valid", record("p")).is_ok());
        let d = b.build();
        assert_eq!(d.processor_names(Outcome::Valid), vec!["p"]);
        assert!(d.processors(Outcome::Invalid).is_empty());
    }

    #[test]
    fn test_define_propagates_declaration_error() {
        let result = FormDescriptor::<Probe>::define(|b| {
            b.register_processor("p", "sometimes", record("p"))?;
            Ok(())
        });
        assert!(matches!(result, Err(FormError::InvalidArgument(_))));
    }

    #[test]
    fn test_field_names_unique_in_order() {
        let mut b = FormDescriptor::<Probe>::builder();
        b.declare_fields(["name", "email"]).declare_fields(["name", "age"]);
        let d = b.build();
        assert_eq!(d.field_names(), ["name", "email", "age"]);
        assert!(d.is_field("age"));
        assert!(!d.is_field("nickname"));
    }

    #[test]
    fn test_cleaners_keep_duplicates() {
        let mut b = FormDescriptor::<Probe>::builder();
        b.register_cleaner("a", record("a"))
            .register_cleaner("b", record("b"))
            .register_cleaner("a", record("a"));
        let d = b.build();
        assert_eq!(d.cleaner_names(), vec!["a", "b", "a"]);

        let mut probe = Probe::default();
        for cleaner in d.cleaners() {
            cleaner.call(&mut probe).unwrap();
        }
        assert_eq!(probe.calls, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_defaults_merge_last_wins() {
        let mut b = FormDescriptor::<Probe>::builder();
        b.declare_defaults([("email", "n/a"), ("role", "user")])
            .declare_defaults([("email", "none")]);
        let d = b.build();
        assert_eq!(d.defaults().len(), 2);
        assert_eq!(d.defaults()["email"], Value::from("none"));
        assert_eq!(d.defaults()["role"], Value::from("user"));
    }

    #[test]
    fn test_model_name_and_param_key() {
        let mut b = FormDescriptor::<Probe>::builder();
        b.param_key("probe_params");
        let d = b.build();
        assert_eq!(d.model_name().name, "Probe");
        assert_eq!(d.model_name().param_key, "probe_params");
    }

    #[test]
    fn test_augment_in_order() {
        fn first(b: &mut FormDescriptorBuilder<Probe>) -> FormResult<()> {
            b.declare_fields(["a"]).register_cleaner("first", record("first"));
            Ok(())
        }
        let second = |b: &mut FormDescriptorBuilder<Probe>| -> FormResult<()> {
            b.declare_fields(["b"]);
            b.register_processor("second", "always", record("second"))?;
            Ok(())
        };

        let d = FormDescriptor::<Probe>::define(|b| {
            b.augment(&first)?.augment(&second)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(d.field_names(), ["a", "b"]);
        assert_eq!(d.cleaner_names(), vec!["first"]);
        assert_eq!(d.processor_names(Outcome::Always), vec!["second"]);
    }

    #[test]
    fn test_failing_augmentation_aborts_define() {
        let bad = |b: &mut FormDescriptorBuilder<Probe>| -> FormResult<()> {
            b.register_processor("x", "never", record("x"))?;
            Ok(())
        };
        let result = FormDescriptor::<Probe>::define(|b| {
            b.augment(&bad)?;
            Ok(())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_inherit_lifts_hooks() {
        struct Child {
            parent: Probe,
        }

        let mut pb = FormDescriptor::<Probe>::builder();
        pb.declare_fields(["name"])
            .register_cleaner("parent_clean", record("parent_clean"))
            .register_processor_for("parent_valid", Outcome::Valid, record("parent_valid"))
            .declare_defaults([("name", "anon")])
            .validates("name", Presence);
        let parent = pb.build();

        let mut cb = FormDescriptor::<Child>::builder();
        cb.inherit(&parent, |c: &mut Child| &mut c.parent)
            .declare_fields(["email"]);
        let child = cb.build();

        assert_eq!(child.field_names(), ["name", "email"]);
        assert_eq!(child.defaults()["name"], Value::from("anon"));
        assert_eq!(child.validators().len(), 1);
        assert_eq!(child.model_name().name, "Child");

        let mut c = Child {
            parent: Probe::default(),
        };
        child.cleaners()[0].call(&mut c).unwrap();
        child.processors(Outcome::Valid)[0].call(&mut c).unwrap();
        assert_eq!(c.parent.calls, vec!["parent_clean", "parent_valid"]);
    }

    #[test]
    fn test_debug_shows_hook_names() {
        let mut b = FormDescriptor::<Probe>::builder();
        b.register_cleaner("strip", record("strip"));
        let rendered = format!("{:?}", b.build());
        assert!(rendered.contains("strip"));
        assert!(rendered.contains("Probe"));
    }
}
