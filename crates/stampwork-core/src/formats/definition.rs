//! Definition file schema.
//!
//! ```json
//! { "capabilities": [
//!   { "name": "Racer",
//!     "includes": ["Describable", "Car"],
//!     "methods": { "honk": "racer.honk" },
//!     "defaults": { "speed": 20 },
//!     "init": "describable.init" } ] }
//! ```

use crate::value::{State, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One capability declared in data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilityDef {
    pub name: String,

    /// Capabilities composed before this one's own entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    /// Method name to handler tag. Entries are kept as raw values so a
    /// non-text entry can be reported as not callable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: State,

    /// Initializer handler tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
}

impl CapabilityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn include(mut self, name: impl Into<String>) -> Self {
        self.includes.push(name.into());
        self
    }

    #[must_use]
    pub fn method(mut self, name: impl Into<String>, tag: impl Into<String>) -> Self {
        self.methods.insert(name.into(), Value::Text(tag.into()));
        self
    }

    #[must_use]
    pub fn default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn init(mut self, tag: impl Into<String>) -> Self {
        self.init = Some(tag.into());
        self
    }
}

/// A whole definition file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionFile {
    #[serde(default)]
    pub capabilities: Vec<CapabilityDef>,
}
