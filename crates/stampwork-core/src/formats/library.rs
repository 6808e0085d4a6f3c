//! Named capability library.
//!
//! Each library entry is a named, ordered sequence of capabilities: a plain
//! capability is a sequence of one, a definition with `includes` expands to
//! the included sequences followed by its own capability.

use super::definition::{CapabilityDef, DefinitionFile};
use crate::capability::Capability;
use crate::catalog;
use crate::composer::{Blueprint, Composer};
use crate::error::{Result, StampError};
use crate::registry::{Handler, HandlerRegistry};
use crate::storage::SharedStore;
use crate::value::Value;
use std::collections::BTreeMap;

/// Capabilities addressable by name.
#[derive(Debug, Clone, Default)]
pub struct Library {
    entries: BTreeMap<String, Vec<Capability>>,
}

impl Library {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Library holding every built-in capability plus the `Ball` entry.
    pub fn with_builtins(store: SharedStore) -> Result<Self> {
        let mut library = Self::new();
        for capability in catalog::builtins(store)? {
            library.insert(capability);
        }
        library.entries.insert(
            "Ball".to_string(),
            vec![
                catalog::describable()?,
                catalog::dribbles()?,
                catalog::shootable()?,
            ],
        );
        Ok(library)
    }

    /// Add or replace a single capability under its own name.
    pub fn insert(&mut self, capability: Capability) {
        self.entries
            .insert(capability.name().to_string(), vec![capability]);
    }

    /// Resolve a definition against `registry` and add it.
    ///
    /// A redefinition replaces the earlier entry.
    pub fn define(&mut self, def: &CapabilityDef, registry: &HandlerRegistry) -> Result<()> {
        let mut sequence = Vec::new();
        for include in &def.includes {
            sequence.extend(self.resolve(include)?.iter().cloned());
        }
        sequence.push(build_capability(def, registry)?);

        self.entries.insert(def.name.clone(), sequence);
        Ok(())
    }

    /// Define every capability of a file, in file order.
    ///
    /// On error the library is left exactly as it was.
    pub fn load(&mut self, file: &DefinitionFile, registry: &HandlerRegistry) -> Result<()> {
        let mut staged = self.clone();
        for def in &file.capabilities {
            staged.define(def, registry)?;
        }
        *self = staged;
        Ok(())
    }

    /// The capability sequence registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&[Capability]> {
        self.entries
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| StampError::UnknownCapability(name.to_string()))
    }

    /// Compose named entries left to right.
    pub fn compose<S: AsRef<str>>(&self, names: &[S]) -> Result<Blueprint> {
        let mut composer = Composer::new();
        for name in names {
            composer = composer.with_all(self.resolve(name.as_ref())?);
        }
        Ok(composer.build())
    }

    /// Entry names in deterministic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// Turn one definition's own entries into a capability.
fn build_capability(def: &CapabilityDef, registry: &HandlerRegistry) -> Result<Capability> {
    let mut builder = Capability::builder(&def.name);

    for (method, entry) in &def.methods {
        let Value::Text(tag) = entry else {
            return Err(StampError::invalid(
                &def.name,
                format!("method `{method}` is not callable (found {})", entry.kind()),
            ));
        };
        match registry.get(tag) {
            Some(Handler::Method(body)) => builder = builder.method_fn(method, body.clone()),
            Some(Handler::Init(_)) => {
                return Err(StampError::invalid(
                    &def.name,
                    format!("method `{method}` is not callable: `{tag}` is an initializer"),
                ));
            }
            None => {
                return Err(StampError::invalid(
                    &def.name,
                    format!("method `{method}` is not callable: no handler `{tag}`"),
                ));
            }
        }
    }

    builder = builder.defaults(def.defaults.clone());

    if let Some(tag) = &def.init {
        match registry.get(tag) {
            Some(Handler::Init(body)) => builder = builder.init_fn(body.clone()),
            Some(Handler::Method(_)) => {
                return Err(StampError::invalid(
                    &def.name,
                    format!("init `{tag}` is a method, not an initializer"),
                ));
            }
            None => {
                return Err(StampError::invalid(
                    &def.name,
                    format!("no initializer `{tag}`"),
                ));
            }
        }
    }

    builder.build()
}

// =============================================================================
// TESTS
// =============================================================================
