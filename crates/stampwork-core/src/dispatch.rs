//! # Dispatch Table
//!
//! Action-tag dispatch without reflection: a map from tag to handler plus a
//! default action. The handler is looked up once and invoked with the
//! remaining arguments.

use crate::error::{MethodError, Result, StampError};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared action handler.
pub type ActionFn = Arc<dyn Fn(&[Value]) -> std::result::Result<Value, MethodError> + Send + Sync>;

/// Tag-to-handler table with a default action.
#[derive(Clone)]
pub struct DispatchTable {
    handlers: BTreeMap<String, ActionFn>,
    default_action: String,
}

impl DispatchTable {
    /// Start a table whose default action is `default_action`.
    pub fn builder(default_action: impl Into<String>) -> DispatchTableBuilder {
        DispatchTableBuilder {
            handlers: BTreeMap::new(),
            default_action: default_action.into(),
        }
    }

    #[must_use]
    pub fn default_action(&self) -> &str {
        &self.default_action
    }

    /// Registered tags in deterministic order.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    #[must_use]
    pub fn handles(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Pick the action from the arguments and run it.
    ///
    /// When the first argument is text naming a registered action, that
    /// action runs with the rest of the arguments. Otherwise the default
    /// action runs with all of them.
    pub fn dispatch(&self, args: &[Value]) -> Result<Value> {
        match args.split_first() {
            Some((Value::Text(tag), rest)) if self.handles(tag) => self.invoke(tag, rest),
            _ => self.invoke(&self.default_action, args),
        }
    }

    /// Run a named action.
    pub fn invoke(&self, action: &str, args: &[Value]) -> Result<Value> {
        let handler = self
            .handlers
            .get(action)
            .ok_or_else(|| StampError::UnknownAction(action.to_string()))?;

        handler(args).map_err(|source| StampError::Method {
            method: action.to_string(),
            source,
        })
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("actions", &self.handlers.keys().collect::<Vec<_>>())
            .field("default_action", &self.default_action)
            .finish()
    }
}

/// Builder for [`DispatchTable`].
pub struct DispatchTableBuilder {
    handlers: BTreeMap<String, ActionFn>,
    default_action: String,
}

impl DispatchTableBuilder {
    #[must_use]
    pub fn action<F>(mut self, tag: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, MethodError> + Send + Sync + 'static,
    {
        self.handlers.insert(tag.into(), into_action(handler));
        self
    }

    /// Fails with [`StampError::UnknownAction`] if the default action has no
    /// handler.
    pub fn build(self) -> Result<DispatchTable> {
        if !self.handlers.contains_key(&self.default_action) {
            return Err(StampError::UnknownAction(self.default_action));
        }
        Ok(DispatchTable {
            handlers: self.handlers,
            default_action: self.default_action,
        })
    }
}

/// Join arguments the way the greeter expects: display form, comma separated.
fn joined(args: &[Value]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Share an action handler as an [`ActionFn`].
pub fn into_action<F>(handler: F) -> ActionFn
where
    F: Fn(&[Value]) -> std::result::Result<Value, MethodError> + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// The greeting table: `init` by default, plus `hello` and `goodbye`.
pub fn greeter() -> DispatchTable {
    let handlers = BTreeMap::from([
        (
            "init".to_string(),
            into_action(|_| Ok(Value::from("initializing..."))),
        ),
        (
            "hello".to_string(),
            into_action(|args| Ok(Value::from(format!("Hello, {}", joined(args))))),
        ),
        (
            "goodbye".to_string(),
            into_action(|args| Ok(Value::from(format!("Goodbye, cruel {}", joined(args))))),
        ),
    ]);

    DispatchTable {
        handlers,
        default_action: "init".to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
