//! # Instance Module
//!
//! A concrete object produced by the factory: its own property state plus
//! shared references to the blueprint's method bodies.
//!
//! Instances are mutated only through their methods or the explicit state
//! setters below. Methods cannot be added or rebound after creation.

use crate::capability::{MethodFn, Reply};
use crate::error::{Result, StampError};
use crate::value::{State, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An object built from a blueprint.
#[derive(Clone)]
pub struct Instance {
    state: State,
    methods: Arc<BTreeMap<String, MethodFn>>,
}

impl Instance {
    pub(crate) fn new(state: State, methods: Arc<BTreeMap<String, MethodFn>>) -> Self {
        Self { state, methods }
    }

    // -------------------------------------------------------------------------
    // STATE
    // -------------------------------------------------------------------------

    /// Read a top-level property.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Mutable access to a top-level property.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.state.get_mut(key)
    }

    /// Read a dotted path such as `position.x`.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, rest),
            None => (path, ""),
        };
        self.state.get(head)?.lookup(rest)
    }

    /// Write a top-level property. Returns the instance for chaining.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.state.insert(key.into(), value.into());
        self
    }

    /// Remove a top-level property.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.state.remove(key)
    }

    /// Read an integer property, `None` if absent or not an integer.
    #[must_use]
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// Read a text property, `None` if absent or not text.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    /// The full property map.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Consume the instance, keeping only its properties.
    #[must_use]
    pub fn into_state(self) -> State {
        self.state
    }

    // -------------------------------------------------------------------------
    // METHODS
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn responds_to(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Method names in deterministic order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Invoke a method and return its reply.
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<Reply> {
        let body = self
            .methods
            .get(method)
            .map(Arc::clone)
            .ok_or_else(|| StampError::UnknownMethod(method.to_string()))?;

        body(self, args).map_err(|source| StampError::Method {
            method: method.to_string(),
            source,
        })
    }

    /// Invoke a method that returns the instance, for fluent chains:
    ///
    /// ```ignore
    /// car.send("start", &[])?.send("accelerate", &[])?;
    /// ```
    pub fn send(&mut self, method: &str, args: &[Value]) -> Result<&mut Self> {
        match self.call(method, args)? {
            Reply::This => Ok(self),
            Reply::Value(_) => Err(StampError::NotChainable(method.to_string())),
        }
    }

    /// Invoke a method that replies with a value.
    ///
    /// A method answering [`Reply::This`] yields [`Value::Null`].
    pub fn ask(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        Ok(self.call(method, args)?.into_value().unwrap_or_default())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("state", &self.state)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::into_method;
    use crate::error::MethodError;

    fn counter() -> Instance {
        let mut methods: BTreeMap<String, MethodFn> = BTreeMap::new();
        methods.insert(
            "bump".to_string(),
            into_method(|this, _| {
                let n = this.int("count").unwrap_or(0);
                this.set("count", n.saturating_add(1));
                Ok(Reply::This)
            }),
        );
        methods.insert(
            "count".to_string(),
            into_method(|this, _| {
                Ok(Reply::Value(this.get("count").cloned().unwrap_or_default()))
            }),
        );
        methods.insert(
            "fail".to_string(),
            into_method(|_, _| Err(MethodError::Failed("boom".into()))),
        );

        let mut state = State::new();
        state.insert("count".to_string(), Value::Int(0));
        Instance::new(state, Arc::new(methods))
    }

    #[test]
    fn send_chains_fluent_methods() {
        let mut inst = counter();
        inst.send("bump", &[])
            .and_then(|i| i.send("bump", &[]))
            .expect("chain");

        assert_eq!(inst.int("count"), Some(2));
    }

    #[test]
    fn send_rejects_value_replies() {
        let mut inst = counter();
        let result = inst.send("count", &[]);
        assert!(matches!(result, Err(StampError::NotChainable(ref m)) if m == "count"));
    }

    #[test]
    fn unknown_method_is_reported() {
        let mut inst = counter();
        let result = inst.call("fly", &[]);
        assert_eq!(result, Err(StampError::UnknownMethod("fly".into())));
    }

    #[test]
    fn method_failure_names_the_method() {
        let mut inst = counter();
        let err = inst.call("fail", &[]).expect_err("should fail");
        assert!(matches!(err, StampError::Method { ref method, .. } if method == "fail"));
    }

    #[test]
    fn ask_returns_value() {
        let mut inst = counter();
        inst.send("bump", &[]).expect("bump");
        assert_eq!(inst.ask("count", &[]), Ok(Value::Int(1)));
        assert_eq!(inst.ask("bump", &[]), Ok(Value::Null));
    }

    #[test]
    fn get_path_reads_nested() {
        let mut inst = counter();
        inst.set("position", Value::map_of([("x", 10), ("y", 0)]));

        assert_eq!(inst.get_path("position.x"), Some(&Value::Int(10)));
        assert_eq!(inst.get_path("count"), Some(&Value::Int(0)));
        assert_eq!(inst.get_path("position.z"), None);
    }

    #[test]
    fn responds_to_lists_methods() {
        let inst = counter();
        assert!(inst.responds_to("bump"));
        assert!(!inst.responds_to("fly"));
        assert_eq!(inst.method_names().collect::<Vec<_>>(), vec!["bump", "count", "fail"]);
    }
}
