//! # Handler Registry
//!
//! Tag-addressed method and initializer bodies. Data-driven capability
//! definitions name behavior by tag (`car.start`, `describable.init`); the
//! registry turns those tags back into callable bodies.

use crate::capability::{Capability, InitFn, MethodFn};
use crate::catalog;
use crate::error::Result;
use crate::storage::SharedStore;
use std::collections::BTreeMap;
use std::fmt;

/// A registered body.
#[derive(Clone)]
pub enum Handler {
    Method(MethodFn),
    Init(InitFn),
}

impl Handler {
    /// `"method"` or `"init"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Method(_) => "method",
            Self::Init(_) => "init",
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{}", self.kind())
    }
}

/// Convert `StorageInterface` into `storage_interface`.
pub fn tag_prefix(capability: &str) -> String {
    let mut out = String::with_capacity(capability.len() + 4);
    for (i, c) in capability.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Map from tag to handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Handler>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in capability's handlers.
    pub fn with_builtins(store: SharedStore) -> Result<Self> {
        let mut registry = Self::new();
        for capability in catalog::builtins(store)? {
            registry.register_capability(&capability);
        }
        Ok(registry)
    }

    pub fn register_method(&mut self, tag: impl Into<String>, body: MethodFn) {
        self.handlers.insert(tag.into(), Handler::Method(body));
    }

    pub fn register_init(&mut self, tag: impl Into<String>, body: InitFn) {
        self.handlers.insert(tag.into(), Handler::Init(body));
    }

    /// Register a capability's methods as `<prefix>.<method>` and its
    /// initializer as `<prefix>.init`, where the prefix is the snake-cased
    /// capability name.
    pub fn register_capability(&mut self, capability: &Capability) {
        let prefix = tag_prefix(capability.name());
        for (name, body) in capability.methods() {
            self.register_method(format!("{prefix}.{name}"), body.clone());
        }
        if let Some(init) = capability.init() {
            self.register_init(format!("{prefix}.init"), init.clone());
        }
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Handler> {
        self.handlers.get(tag)
    }

    /// Tags and kinds in deterministic order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.handlers.iter().map(|(t, h)| (t.as_str(), h.kind()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
