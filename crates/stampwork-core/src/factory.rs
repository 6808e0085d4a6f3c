//! # Instance Factory
//!
//! Turns a [`Blueprint`] plus a configuration map into an [`Instance`].
//!
//! Construction steps:
//! 1. Copy the blueprint defaults into a fresh state map
//! 2. Overlay the config (config wins on collision)
//! 3. Attach the blueprint's shared method table
//! 4. Run every initializer in composition order
//!
//! Construction is all-or-nothing: if an initializer fails the partially
//! built instance is dropped and only the error reaches the caller.

use crate::composer::Blueprint;
use crate::error::{Result, StampError};
use crate::instance::Instance;
use crate::value::State;

/// Create an instance from a blueprint and a config overlay.
pub fn create(blueprint: &Blueprint, config: State) -> Result<Instance> {
    // Clone is deep: nested lists and maps are never shared between instances.
    let mut state = blueprint.defaults().clone();
    state.extend(config.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut instance = Instance::new(state, blueprint.shared_methods());

    for (index, init) in blueprint.initializers().iter().enumerate() {
        (init.body)(&mut instance, &config).map_err(|source| StampError::Initialization {
            capability: init.capability.clone(),
            index,
            source,
        })?;
    }

    Ok(instance)
}

impl Blueprint {
    /// Create an instance with the given config overlay.
    pub fn create(&self, config: State) -> Result<Instance> {
        create(self, config)
    }

    /// Create an instance with no config.
    pub fn instance(&self) -> Result<Instance> {
        create(self, State::new())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, Reply};
    use crate::composer::compose;
    use crate::error::MethodError;
    use crate::value::{Value, state_of};

    fn logger(name: &'static str) -> Capability {
        Capability::builder(name)
            .default("log", Value::List(Vec::new()))
            .init(move |this, _| {
                let log = this
                    .get_mut("log")
                    .and_then(Value::as_list_mut)
                    .ok_or_else(|| MethodError::MissingField("log".into()))?;
                log.push(Value::from(name));
                Ok(())
            })
            .build()
            .expect("valid capability")
    }

    #[test]
    fn config_overlays_defaults() {
        let cap = Capability::builder("Point")
            .default("x", 0)
            .default("y", 1)
            .build()
            .expect("valid capability");
        let blueprint = compose([&cap]);

        let inst = blueprint
            .create(state_of([("x", 5)]))
            .expect("create");

        assert_eq!(inst.state(), &state_of([("x", 5), ("y", 1)]));
    }

    #[test]
    fn config_may_add_new_keys() {
        let blueprint = Blueprint::empty();
        let inst = blueprint
            .create(state_of([("color", "pink")]))
            .expect("create");

        assert_eq!(inst.text("color"), Some("pink"));
        assert_eq!(inst.method_names().count(), 0);
    }

    #[test]
    fn initializers_run_in_composition_order() {
        let a = logger("a");
        let b = logger("b");

        let inst = compose([&a, &b]).instance().expect("create");
        assert_eq!(inst.get("log"), Some(&Value::from(vec!["a", "b"])));

        let inst = compose([&b, &a]).instance().expect("create");
        assert_eq!(inst.get("log"), Some(&Value::from(vec!["b", "a"])));
    }

    #[test]
    fn initializer_sees_config_and_defaults() {
        let cap = Capability::builder("Describable")
            .default("description", "object")
            .init(|this, config| {
                let seen = this.text("description").unwrap_or_default().to_string();
                this.set("seen_before_init", seen);
                if let Some(desc) = config.get("label") {
                    this.set("description", desc.clone());
                }
                Ok(())
            })
            .build()
            .expect("valid capability");

        let inst = compose([&cap])
            .create(state_of([("label", "soft tennis ball")]))
            .expect("create");

        assert_eq!(inst.text("seen_before_init"), Some("object"));
        assert_eq!(inst.text("description"), Some("soft tennis ball"));
    }

    #[test]
    fn failing_initializer_yields_no_instance() {
        let ok = logger("ok");
        let broken = Capability::builder("Broken")
            .init(|_, _| Err(MethodError::Failed("no id source".into())))
            .build()
            .expect("valid capability");

        let result = compose([&ok, &broken]).instance();
        assert_eq!(
            result.map(|_| ()),
            Err(StampError::Initialization {
                capability: "Broken".into(),
                index: 1,
                source: MethodError::Failed("no id source".into()),
            })
        );
    }

    #[test]
    fn instances_do_not_share_nested_defaults() {
        let cart = Capability::builder("Cart")
            .default("items", Value::List(Vec::new()))
            .method("add_item", |this, args| {
                let item = args.first().cloned().ok_or(MethodError::BadArgument {
                    index: 0,
                    expected: "item",
                })?;
                this.get_mut("items")
                    .and_then(Value::as_list_mut)
                    .ok_or_else(|| MethodError::MissingField("items".into()))?
                    .push(item);
                Ok(Reply::This)
            })
            .build()
            .expect("valid capability");
        let blueprint = compose([&cart]);

        let mut saved = blueprint.instance().expect("create");
        let session = blueprint.instance().expect("create");
        saved
            .send("add_item", &[Value::from("grapefruit")])
            .expect("add_item");

        assert_eq!(saved.get("items"), Some(&Value::from(vec!["grapefruit"])));
        assert_eq!(session.get("items"), Some(&Value::List(Vec::new())));
        assert_eq!(blueprint.defaults().get("items"), Some(&Value::List(Vec::new())));
    }

    #[test]
    fn blueprint_is_reusable_across_threads() {
        let blueprint = compose([&logger("a")]);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| blueprint.instance().map(Instance::into_state)))
                .collect();
            for handle in handles {
                let state = handle.join().expect("thread").expect("create");
                assert_eq!(state.get("log"), Some(&Value::from(vec!["a"])));
            }
        });
    }
}
