//! # Composer Module
//!
//! Merges capabilities into a [`Blueprint`].
//!
//! Merge rules:
//! - Capabilities are walked left to right
//! - Methods and defaults are last-write-wins by name
//! - Initializers are appended, never replaced
//! - The result copies every entry, so it keeps no link to its inputs
//!
//! Every replacement is recorded as an [`Override`] so callers can report
//! which capability shadowed which.

use crate::capability::{Capability, InitFn, MethodFn};
use crate::value::State;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// BLUEPRINT
// =============================================================================

/// Which namespace an override happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideKind {
    Method,
    Default,
}

/// A same-named entry replaced during composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub kind: OverrideKind,
    pub name: String,
    /// Capability whose entry was replaced.
    pub replaced: String,
    /// Capability whose entry won.
    pub by: String,
}

/// An initializer together with the capability that declared it.
#[derive(Clone)]
pub(crate) struct Initializer {
    pub(crate) capability: String,
    pub(crate) body: InitFn,
}

/// The merged, immutable result of composing capabilities.
///
/// A blueprint is `Send + Sync` and can be shared across threads; the factory
/// only ever reads it.
#[derive(Clone, Default)]
pub struct Blueprint {
    capabilities: Vec<String>,
    methods: Arc<BTreeMap<String, MethodFn>>,
    method_origin: BTreeMap<String, String>,
    defaults: State,
    default_origin: BTreeMap<String, String>,
    inits: Vec<Initializer>,
    overrides: Vec<Override>,
}

impl Blueprint {
    /// A blueprint with no behavior.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Names of the composed capabilities, in composition order.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Method names in deterministic order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Capability that supplied the winning body of `method`.
    #[must_use]
    pub fn method_origin(&self, method: &str) -> Option<&str> {
        self.method_origin.get(method).map(String::as_str)
    }

    /// Capability that supplied the winning value of default `name`.
    #[must_use]
    pub fn default_origin(&self, name: &str) -> Option<&str> {
        self.default_origin.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn defaults(&self) -> &State {
        &self.defaults
    }

    /// Number of initializers that run on creation.
    #[must_use]
    pub fn init_count(&self) -> usize {
        self.inits.len()
    }

    /// Capabilities whose initializers run, in order.
    pub fn init_order(&self) -> impl Iterator<Item = &str> {
        self.inits.iter().map(|i| i.capability.as_str())
    }

    /// Replacements that happened while composing.
    #[must_use]
    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.defaults.is_empty() && self.inits.is_empty()
    }

    pub(crate) fn shared_methods(&self) -> Arc<BTreeMap<String, MethodFn>> {
        Arc::clone(&self.methods)
    }

    pub(crate) fn initializers(&self) -> &[Initializer] {
        &self.inits
    }

    /// Compose more capabilities on top of this blueprint.
    ///
    /// `self` is left untouched.
    #[must_use]
    pub fn extend<'a, I>(&self, capabilities: I) -> Blueprint
    where
        I: IntoIterator<Item = &'a Capability>,
    {
        Composer::from_blueprint(self)
            .with_all(capabilities)
            .build()
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("capabilities", &self.capabilities)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("defaults", &self.defaults)
            .field("inits", &self.inits.len())
            .finish()
    }
}

// =============================================================================
// COMPOSER
// =============================================================================

/// Accumulates capabilities into a blueprint.
#[derive(Default)]
pub struct Composer {
    capabilities: Vec<String>,
    methods: BTreeMap<String, MethodFn>,
    method_origin: BTreeMap<String, String>,
    defaults: State,
    default_origin: BTreeMap<String, String>,
    inits: Vec<Initializer>,
    overrides: Vec<Override>,
}

impl Composer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing blueprint, as if its capabilities came first.
    #[must_use]
    pub fn from_blueprint(blueprint: &Blueprint) -> Self {
        Self {
            capabilities: blueprint.capabilities.clone(),
            methods: (*blueprint.methods).clone(),
            method_origin: blueprint.method_origin.clone(),
            defaults: blueprint.defaults.clone(),
            default_origin: blueprint.default_origin.clone(),
            inits: blueprint.inits.clone(),
            overrides: blueprint.overrides.clone(),
        }
    }

    /// Compose a sequence of capabilities in one step.
    pub fn compose<'a, I>(capabilities: I) -> Blueprint
    where
        I: IntoIterator<Item = &'a Capability>,
    {
        Self::new().with_all(capabilities).build()
    }

    /// Merge one capability.
    #[must_use]
    pub fn with(mut self, capability: &Capability) -> Self {
        let source = capability.name().to_string();

        for (name, body) in capability.methods() {
            if let Some(previous) = self.method_origin.insert(name.clone(), source.clone()) {
                self.overrides.push(Override {
                    kind: OverrideKind::Method,
                    name: name.clone(),
                    replaced: previous,
                    by: source.clone(),
                });
            }
            self.methods.insert(name.clone(), Arc::clone(body));
        }

        for (name, value) in capability.defaults() {
            if let Some(previous) = self.default_origin.insert(name.clone(), source.clone()) {
                self.overrides.push(Override {
                    kind: OverrideKind::Default,
                    name: name.clone(),
                    replaced: previous,
                    by: source.clone(),
                });
            }
            self.defaults.insert(name.clone(), value.clone());
        }

        if let Some(body) = capability.init() {
            self.inits.push(Initializer {
                capability: source.clone(),
                body: Arc::clone(body),
            });
        }

        self.capabilities.push(source);
        self
    }

    /// Merge several capabilities in order.
    #[must_use]
    pub fn with_all<'a, I>(self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = &'a Capability>,
    {
        capabilities.into_iter().fold(self, Self::with)
    }

    /// Merge every entry of another blueprint, in its original order.
    #[must_use]
    pub fn with_blueprint(mut self, other: &Blueprint) -> Self {
        self.overrides.extend(other.overrides.iter().cloned());

        for (name, body) in other.methods.iter() {
            let source = other
                .method_origin
                .get(name)
                .cloned()
                .unwrap_or_default();
            if let Some(previous) = self.method_origin.insert(name.clone(), source.clone()) {
                self.overrides.push(Override {
                    kind: OverrideKind::Method,
                    name: name.clone(),
                    replaced: previous,
                    by: source,
                });
            }
            self.methods.insert(name.clone(), Arc::clone(body));
        }

        for (name, value) in &other.defaults {
            let source = other
                .default_origin
                .get(name)
                .cloned()
                .unwrap_or_default();
            if let Some(previous) = self.default_origin.insert(name.clone(), source.clone()) {
                self.overrides.push(Override {
                    kind: OverrideKind::Default,
                    name: name.clone(),
                    replaced: previous,
                    by: source,
                });
            }
            self.defaults.insert(name.clone(), value.clone());
        }

        self.inits.extend(other.inits.iter().cloned());
        self.capabilities.extend(other.capabilities.iter().cloned());
        self
    }

    /// Freeze the accumulated entries.
    #[must_use]
    pub fn build(self) -> Blueprint {
        Blueprint {
            capabilities: self.capabilities,
            methods: Arc::new(self.methods),
            method_origin: self.method_origin,
            defaults: self.defaults,
            default_origin: self.default_origin,
            inits: self.inits,
            overrides: self.overrides,
        }
    }
}

/// Compose capabilities left to right into a blueprint.
pub fn compose<'a, I>(capabilities: I) -> Blueprint
where
    I: IntoIterator<Item = &'a Capability>,
{
    Composer::compose(capabilities)
}

// =============================================================================
// TESTS
// =============================================================================
