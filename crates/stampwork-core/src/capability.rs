//! # Capability Module
//!
//! A capability is a named bundle of methods, default properties and an
//! optional initializer. Capabilities are immutable once built and carry no
//! instance state of their own.
//!
//! ```
//! use stampwork_core::{Capability, Reply};
//!
//! let describable = Capability::builder("Describable")
//!     .default("description", "object")
//!     .method("describe", |this, _args| {
//!         Ok(Reply::Value(this.get("description").cloned().unwrap_or_default()))
//!     })
//!     .build()
//!     .expect("valid capability");
//!
//! assert!(describable.has_method("describe"));
//! ```

use crate::error::{MethodError, Result, StampError};
use crate::instance::Instance;
use crate::value::{State, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// METHOD & INITIALIZER TYPES
// =============================================================================

/// What a method hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The instance itself, so calls can be chained.
    This,
    /// A plain value.
    Value(Value),
}

impl Reply {
    /// The replied value, or `None` for [`Reply::This`].
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::This => None,
            Self::Value(v) => Some(v),
        }
    }

    #[must_use]
    pub fn is_this(&self) -> bool {
        matches!(self, Self::This)
    }
}

/// Shared method body. `this` is the instance the method was invoked on.
pub type MethodFn =
    Arc<dyn Fn(&mut Instance, &[Value]) -> std::result::Result<Reply, MethodError> + Send + Sync>;

/// Shared initializer body, run once per instance with the creation config.
pub type InitFn =
    Arc<dyn Fn(&mut Instance, &State) -> std::result::Result<(), MethodError> + Send + Sync>;

/// Share a method body as a [`MethodFn`].
pub fn into_method<F>(body: F) -> MethodFn
where
    F: Fn(&mut Instance, &[Value]) -> std::result::Result<Reply, MethodError> + Send + Sync + 'static,
{
    Arc::new(body)
}

/// Share an initializer body as an [`InitFn`].
pub fn into_init<F>(body: F) -> InitFn
where
    F: Fn(&mut Instance, &State) -> std::result::Result<(), MethodError> + Send + Sync + 'static,
{
    Arc::new(body)
}

/// Check that a method or property name is a plain identifier.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

// =============================================================================
// CAPABILITY
// =============================================================================

/// A composable bundle of behavior.
#[derive(Clone)]
pub struct Capability {
    name: String,
    methods: BTreeMap<String, MethodFn>,
    defaults: State,
    init: Option<InitFn>,
}

impl Capability {
    /// Start building a capability with the given name.
    pub fn builder(name: impl Into<String>) -> CapabilityBuilder {
        CapabilityBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method names in deterministic order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub(crate) fn methods(&self) -> &BTreeMap<String, MethodFn> {
        &self.methods
    }

    #[must_use]
    pub fn defaults(&self) -> &State {
        &self.defaults
    }

    pub(crate) fn init(&self) -> Option<&InitFn> {
        self.init.as_ref()
    }

    #[must_use]
    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("defaults", &self.defaults)
            .field("init", &self.init.is_some())
            .finish()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for [`Capability`].
///
/// Entries are validated in [`CapabilityBuilder::build`]; the first malformed
/// entry is reported as [`StampError::InvalidCapability`].
pub struct CapabilityBuilder {
    name: String,
    methods: BTreeMap<String, MethodFn>,
    defaults: State,
    init: Option<InitFn>,
}

impl CapabilityBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: BTreeMap::new(),
            defaults: State::new(),
            init: None,
        }
    }

    /// Add a method. A later method with the same name replaces this one.
    #[must_use]
    pub fn method<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> std::result::Result<Reply, MethodError>
            + Send
            + Sync
            + 'static,
    {
        self.method_fn(name, into_method(body))
    }

    /// Add an already shared method body.
    #[must_use]
    pub fn method_fn(mut self, name: impl Into<String>, body: MethodFn) -> Self {
        self.methods.insert(name.into(), body);
        self
    }

    /// Add a default property.
    #[must_use]
    pub fn default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Merge a whole map of default properties.
    #[must_use]
    pub fn defaults(mut self, defaults: State) -> Self {
        self.defaults.extend(defaults);
        self
    }

    /// Set the initializer. Only one initializer per capability.
    #[must_use]
    pub fn init<F>(self, body: F) -> Self
    where
        F: Fn(&mut Instance, &State) -> std::result::Result<(), MethodError>
            + Send
            + Sync
            + 'static,
    {
        self.init_fn(into_init(body))
    }

    #[must_use]
    pub fn init_fn(mut self, body: InitFn) -> Self {
        self.init = Some(body);
        self
    }

    /// Validate and freeze the capability.
    pub fn build(self) -> Result<Capability> {
        if self.name.trim().is_empty() {
            return Err(StampError::invalid(self.name, "capability name is empty"));
        }
        if let Some(bad) = self.methods.keys().find(|k| !is_identifier(k)) {
            return Err(StampError::invalid(
                &self.name,
                format!("method name `{bad}` is not an identifier"),
            ));
        }
        if let Some(bad) = self.defaults.keys().find(|k| !is_identifier(k)) {
            return Err(StampError::invalid(
                &self.name,
                format!("default name `{bad}` is not an identifier"),
            ));
        }

        Ok(Capability {
            name: self.name,
            methods: self.methods,
            defaults: self.defaults,
            init: self.init,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Instance, _: &[Value]) -> std::result::Result<Reply, MethodError> {
        Ok(Reply::This)
    }

    #[test]
    fn builder_collects_entries() {
        let cap = Capability::builder("Switch")
            .default("state", false)
            .method("toggle", noop)
            .init(|_, _| Ok(()))
            .build()
            .expect("valid capability");

        assert_eq!(cap.name(), "Switch");
        assert!(cap.has_method("toggle"));
        assert!(cap.has_init());
        assert_eq!(cap.defaults().get("state"), Some(&Value::Bool(false)));
    }

    #[test]
    fn empty_name_is_rejected() {
        let result = Capability::builder("  ").build();
        assert!(matches!(result, Err(StampError::InvalidCapability { .. })));
    }

    #[test]
    fn malformed_method_name_is_rejected() {
        let result = Capability::builder("Car").method("go fast", noop).build();
        assert!(matches!(
            result,
            Err(StampError::InvalidCapability { ref capability, .. }) if capability == "Car"
        ));
    }

    #[test]
    fn malformed_default_name_is_rejected() {
        let result = Capability::builder("Car").default("", 1).build();
        assert!(result.is_err());
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("turn_off"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn later_method_with_same_name_wins_inside_builder() {
        let cap = Capability::builder("Twice")
            .method("m", |_, _| Ok(Reply::Value(Value::Int(1))))
            .method("m", |_, _| Ok(Reply::Value(Value::Int(2))))
            .build()
            .expect("valid capability");

        assert_eq!(cap.method_names().count(), 1);
    }
}
