//! # Built-in Capability Catalog
//!
//! Ready-made capabilities: balls that dribble and shoot, a fluent car, a
//! toggle switch, a flyweight enemy, a shopping cart, a post with a
//! generated identifier, and the storage interface/provider pair.
//!
//! State-transition methods reply with [`Reply::This`] so they chain;
//! readers reply with a value.

use crate::capability::{Capability, Reply};
use crate::composer::{Blueprint, compose};
use crate::error::{MethodError, Result};
use crate::instance::Instance;
use crate::storage::{SharedStore, with_store};
use crate::value::Value;

/// Step used by `accelerate` and `brake` when no amount is given.
pub const DEFAULT_SPEED_STEP: i64 = 10;

// =============================================================================
// ARGUMENT & STATE HELPERS
// =============================================================================

fn text_arg(args: &[Value], index: usize) -> std::result::Result<&str, MethodError> {
    args.get(index)
        .and_then(Value::as_text)
        .ok_or(MethodError::BadArgument {
            index,
            expected: "text",
        })
}

fn int_arg(args: &[Value], index: usize) -> std::result::Result<i64, MethodError> {
    args.get(index)
        .and_then(Value::as_int)
        .ok_or(MethodError::BadArgument {
            index,
            expected: "int",
        })
}

/// Optional integer argument: absent or null falls back to `default`.
fn int_arg_or(
    args: &[Value],
    index: usize,
    default: i64,
) -> std::result::Result<i64, MethodError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(default),
        Some(_) => int_arg(args, index),
    }
}

fn field_text<'a>(this: &'a Instance, key: &str) -> std::result::Result<&'a str, MethodError> {
    this.text(key)
        .ok_or_else(|| MethodError::MissingField(key.to_string()))
}

fn field_int(this: &Instance, key: &str) -> std::result::Result<i64, MethodError> {
    this.int(key)
        .ok_or_else(|| MethodError::MissingField(key.to_string()))
}

fn field_value(this: &Instance, key: &str) -> Reply {
    Reply::Value(this.get(key).cloned().unwrap_or_default())
}

// =============================================================================
// BALLS
// =============================================================================

/// `description` property (default `"object"`) that config may replace.
pub fn describable() -> Result<Capability> {
    Capability::builder("Describable")
        .default("description", "object")
        .method("describe", |this, _| Ok(field_value(this, "description")))
        .init(|this, config| {
            if let Some(description) = config.get("description") {
                this.set("description", description.clone());
            }
            Ok(())
        })
        .build()
}

pub fn dribbles() -> Result<Capability> {
    Capability::builder("Dribbles")
        .method("dribble", |this, _| {
            let description = field_text(this, "description")?;
            Ok(Reply::Value(Value::from(format!(
                "Go dribble this {description}!"
            ))))
        })
        .build()
}

pub fn shootable() -> Result<Capability> {
    Capability::builder("Shootable")
        .method("shoot", |this, args| {
            let target = text_arg(args, 0)?;
            let description = field_text(this, "description")?;
            Ok(Reply::Value(Value::from(format!(
                "Go shoot this {description} above the {target}!"
            ))))
        })
        .build()
}

/// Describable + Dribbles + Shootable.
pub fn ball() -> Result<Blueprint> {
    let parts = [describable()?, dribbles()?, shootable()?];
    Ok(compose(&parts))
}

// =============================================================================
// CAR
// =============================================================================

/// A car that only changes speed while running. Every transition chains,
/// including the parking brake toggle.
pub fn car() -> Result<Capability> {
    Capability::builder("Car")
        .default("state", "off")
        .default("speed", 0)
        .method("start", |this, _| {
            this.set("state", "on");
            Ok(Reply::This)
        })
        .method("turn_off", |this, _| {
            this.set("state", "off").set("speed", 0);
            Ok(Reply::This)
        })
        .method("accelerate", |this, args| {
            let step = int_arg_or(args, 0, DEFAULT_SPEED_STEP)?;
            if field_text(this, "state")? == "on" {
                let speed = field_int(this, "speed")?;
                this.set("speed", speed.saturating_add(step));
            }
            Ok(Reply::This)
        })
        .method("brake", |this, args| {
            let step = int_arg_or(args, 0, DEFAULT_SPEED_STEP)?;
            if field_text(this, "state")? == "on" {
                let speed = field_int(this, "speed")?;
                this.set("speed", speed.saturating_sub(step).max(0));
            }
            Ok(Reply::This)
        })
        .method("speed", |this, _| Ok(field_value(this, "speed")))
        .method("status", |this, _| Ok(field_value(this, "state")))
        .method("toggle_parking_brake", |this, _| {
            let parked = is_parked(this);
            this.set("parking_brake", !parked);
            Ok(Reply::This)
        })
        .method("is_parked", |this, _| Ok(Reply::Value(Value::Bool(is_parked(this)))))
        .build()
}

/// An absent `parking_brake` means released.
fn is_parked(this: &Instance) -> bool {
    this.get("parking_brake")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

// =============================================================================
// SWITCH
// =============================================================================

pub fn switch() -> Result<Capability> {
    Capability::builder("Switch")
        .default("state", false)
        .default("meta", Value::map_of([("name", "Light switch")]))
        .method("toggle", |this, _| {
            let on = this.get("state").and_then(Value::as_bool).unwrap_or(false);
            this.set("state", !on);
            Ok(Reply::This)
        })
        .method("is_on", |this, _| {
            let on = this.get("state").and_then(Value::as_bool).unwrap_or(false);
            Ok(Reply::Value(Value::Bool(on)))
        })
        .build()
}

// =============================================================================
// ENEMY (flyweight defaults)
// =============================================================================

pub fn enemy() -> Result<Capability> {
    Capability::builder("Enemy")
        .default("name", "Wolf")
        .default("health", 20)
        .default("position", Value::map_of([("x", 0), ("y", 0)]))
        .method("set_position", |this, args| {
            let x = int_arg(args, 0)?;
            let y = int_arg(args, 1)?;
            this.set("position", Value::map_of([("x", x), ("y", y)]));
            Ok(Reply::This)
        })
        .method("bite", |_, _| Ok(Reply::This))
        .method("evade", |_, _| Ok(Reply::This))
        .build()
}

// =============================================================================
// CART
// =============================================================================

pub fn cart() -> Result<Capability> {
    Capability::builder("Cart")
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
        .method("items", |this, _| Ok(field_value(this, "items")))
        .build()
}

// =============================================================================
// POST, IDENTIFIERS & STORAGE
// =============================================================================

pub fn post() -> Result<Capability> {
    Capability::builder("Post")
        .default(
            "data",
            Value::map_of([
                ("message", Value::from("")),
                ("published", Value::Bool(false)),
            ]),
        )
        .method("set", |this, args| {
            let name = text_arg(args, 0)?.to_string();
            let value = args.get(1).cloned().unwrap_or_default();
            this.get_mut("data")
                .and_then(Value::as_map_mut)
                .ok_or_else(|| MethodError::MissingField("data".into()))?
                .insert(name, value);
            Ok(Reply::This)
        })
        .build()
}

/// Assigns a fresh UUID v4 to `id` unless one was configured.
pub fn identified() -> Result<Capability> {
    Capability::builder("Identified")
        .default("id", Value::Null)
        .init(|this, _| {
            if this.get("id").is_none_or(Value::is_null) {
                this.set("id", uuid::Uuid::new_v4().to_string());
            }
            Ok(())
        })
        .build()
}

/// Declares `save` without a provider.
pub fn storage_interface() -> Result<Capability> {
    Capability::builder("StorageInterface")
        .method("save", |_, _| Err(MethodError::NotImplemented("save".into())))
        .build()
}

/// Saves and loads the instance's `data` under its `id` in `store`.
pub fn persistable(store: SharedStore) -> Result<Capability> {
    let loader = store.clone();

    Capability::builder("Persistable")
        .method("save", move |this, _| {
            let id = field_text(this, "id")?.to_string();
            let data = this
                .get("data")
                .cloned()
                .ok_or_else(|| MethodError::MissingField("data".into()))?;
            with_store(&store, |s| s.save(&id, data))
                .map_err(|e| MethodError::Failed(e.to_string()))?;
            Ok(Reply::This)
        })
        .method("load", move |this, _| {
            let id = field_text(this, "id")?.to_string();
            let data = with_store(&loader, |s| s.load(&id))
                .map_err(|e| MethodError::Failed(e.to_string()))?
                .ok_or_else(|| MethodError::Failed(format!("nothing stored under `{id}`")))?;
            this.set("data", data);
            Ok(Reply::This)
        })
        .build()
}

/// Every built-in capability, in catalog order.
pub fn builtins(store: SharedStore) -> Result<Vec<Capability>> {
    Ok(vec![
        describable()?,
        dribbles()?,
        shootable()?,
        car()?,
        switch()?,
        enemy()?,
        cart()?,
        post()?,
        identified()?,
        storage_interface()?,
        persistable(store)?,
    ])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StampError;
    use crate::storage::{MemoryStore, shared};
    use crate::value::state_of;

    #[test]
    fn ball_dribbles_and_shoots_with_its_own_description() {
        let ball = ball().expect("ball");

        let mut basketball = ball
            .create(state_of([("description", "pumped up basketball")]))
            .expect("create");
        let mut tennis = ball
            .create(state_of([("description", "soft tennis ball")]))
            .expect("create");

        assert_eq!(
            basketball.ask("dribble", &[]),
            Ok(Value::from("Go dribble this pumped up basketball!"))
        );
        assert_eq!(
            basketball.ask("shoot", &[Value::from("hoop")]),
            Ok(Value::from("Go shoot this pumped up basketball above the hoop!"))
        );
        assert_eq!(
            tennis.ask("shoot", &[Value::from("net")]),
            Ok(Value::from("Go shoot this soft tennis ball above the net!"))
        );
    }

    #[test]
    fn ball_defaults_description() {
        let mut plain = ball().expect("ball").instance().expect("create");
        assert_eq!(plain.ask("describe", &[]), Ok(Value::from("object")));
    }

    #[test]
    fn shoot_requires_target() {
        let mut inst = ball().expect("ball").instance().expect("create");
        let err = inst.call("shoot", &[]).expect_err("missing target");
        assert_eq!(
            err,
            StampError::Method {
                method: "shoot".into(),
                source: MethodError::BadArgument {
                    index: 0,
                    expected: "text"
                },
            }
        );
    }

    #[test]
    fn car_chains_fluently() {
        let blueprint = compose([&car().expect("car")]);
        let mut car = blueprint.instance().expect("create");

        car.send("start", &[])
            .and_then(|c| c.send("accelerate", &[]))
            .expect("chain");
        assert_eq!(car.text("state"), Some("on"));
        assert_eq!(car.int("speed"), Some(10));

        car.send("brake", &[])
            .and_then(|c| c.send("turn_off", &[]))
            .expect("chain");
        assert_eq!(car.ask("speed", &[]), Ok(Value::Int(0)));
        assert_eq!(car.ask("status", &[]), Ok(Value::from("off")));
    }

    #[test]
    fn car_ignores_pedals_while_off() {
        let mut car = compose([&car().expect("car")]).instance().expect("create");
        car.send("accelerate", &[]).expect("accelerate");
        assert_eq!(car.int("speed"), Some(0));
    }

    #[test]
    fn car_brake_takes_amount_and_floors_at_zero() {
        let mut car = compose([&car().expect("car")]).instance().expect("create");
        car.send("start", &[])
            .and_then(|c| c.send("accelerate", &[]))
            .and_then(|c| c.send("brake", &[Value::Int(5)]))
            .expect("chain");
        assert_eq!(car.int("speed"), Some(5));

        car.send("brake", &[Value::Int(50)]).expect("brake");
        assert_eq!(car.int("speed"), Some(0));
    }

    #[test]
    fn parking_brake_toggles_per_car() {
        let cars = compose([&car().expect("car")]);
        let mut mine = cars.instance().expect("create");
        let mut other = cars.instance().expect("create");

        assert_eq!(mine.ask("is_parked", &[]), Ok(Value::Bool(false)));
        let parked = mine
            .send("toggle_parking_brake", &[])
            .and_then(|c| c.ask("is_parked", &[]));
        assert_eq!(parked, Ok(Value::Bool(true)));
        assert_eq!(other.ask("is_parked", &[]), Ok(Value::Bool(false)));

        mine.send("toggle_parking_brake", &[]).expect("toggle");
        assert_eq!(mine.ask("is_parked", &[]), Ok(Value::Bool(false)));
    }

    #[test]
    fn switches_toggle_independently() {
        let blueprint = compose([&switch().expect("switch")]);
        let mut first = blueprint.instance().expect("create");
        let mut second = blueprint.instance().expect("create");

        let on = first
            .send("toggle", &[])
            .and_then(|s| s.ask("is_on", &[]))
            .expect("toggle");
        assert_eq!(on, Value::Bool(true));
        assert_eq!(second.ask("is_on", &[]), Ok(Value::Bool(false)));
    }

    #[test]
    fn switch_meta_is_per_instance() {
        let blueprint = compose([&switch().expect("switch")]);
        let first = blueprint.instance().expect("create");
        let mut second = blueprint.instance().expect("create");

        if let Some(meta) = second.get_mut("meta").and_then(Value::as_map_mut) {
            meta.insert("name".into(), Value::from("Breaker switch"));
        }

        assert_eq!(
            first.get_path("meta.name"),
            Some(&Value::from("Light switch"))
        );
        assert_eq!(
            second.get_path("meta.name"),
            Some(&Value::from("Breaker switch"))
        );
    }

    #[test]
    fn flyweight_enemies_keep_their_own_health_and_position() {
        let blueprint = compose([&enemy().expect("enemy")]);
        let mut wolf1 = blueprint.instance().expect("create");
        let wolf2 = blueprint.instance().expect("create");

        wolf1.set("health", 5);
        let x = wolf1
            .send("set_position", &[Value::Int(10), Value::Int(10)])
            .map(|w| w.get_path("position.x").cloned())
            .expect("set_position");

        assert_eq!(x, Some(Value::Int(10)));
        assert_eq!(wolf2.int("health"), Some(20));
        assert_eq!(wolf2.get_path("position.x"), Some(&Value::Int(0)));
    }

    #[test]
    fn identified_assigns_unique_ids_unless_configured() {
        let blueprint = compose([&identified().expect("identified")]);
        let a = blueprint.instance().expect("create");
        let b = blueprint.instance().expect("create");
        let fixed = blueprint
            .create(state_of([("id", "post-1")]))
            .expect("create");

        let a_id = a.text("id").expect("id assigned");
        assert_eq!(a_id.len(), 36);
        assert_ne!(a.text("id"), b.text("id"));
        assert_eq!(fixed.text("id"), Some("post-1"));
    }

    #[test]
    fn storage_interface_without_provider_fails() {
        let mut inst = compose([&storage_interface().expect("interface")])
            .instance()
            .expect("create");
        let err = inst.call("save", &[]).expect_err("not implemented");
        assert!(matches!(
            err,
            StampError::Method {
                source: MethodError::NotImplemented(_),
                ..
            }
        ));
    }

    #[test]
    fn provider_overrides_interface_and_persists_posts() {
        let store = shared(MemoryStore::new());
        let parts = [
            post().expect("post"),
            identified().expect("identified"),
            storage_interface().expect("interface"),
            persistable(store.clone()).expect("persistable"),
        ];
        let blueprint = compose(&parts);
        assert_eq!(blueprint.method_origin("save"), Some("Persistable"));

        let mut post = blueprint.instance().expect("create");
        post.send("set", &[Value::from("message"), Value::from("Hello, world!")])
            .and_then(|p| p.send("save", &[]))
            .expect("save");

        let id = post.text("id").expect("id").to_string();
        let stored = with_store(&store, |s| s.load(&id)).expect("load");
        let message = stored
            .as_ref()
            .and_then(|data| data.lookup("message"))
            .cloned();
        assert_eq!(message, Some(Value::from("Hello, world!")));

        let mut reloaded = blueprint
            .create(state_of([("id", id.as_str())]))
            .expect("create");
        reloaded.send("load", &[]).expect("load");
        assert_eq!(
            reloaded.get_path("data.message"),
            Some(&Value::from("Hello, world!"))
        );
    }

    #[test]
    fn load_without_saved_data_fails() {
        let store = shared(MemoryStore::new());
        let parts = [
            post().expect("post"),
            identified().expect("identified"),
            persistable(store).expect("persistable"),
        ];
        let mut post = compose(&parts).instance().expect("create");
        assert!(post.call("load", &[]).is_err());
    }

    #[test]
    fn builtins_are_all_valid() {
        let all = builtins(shared(MemoryStore::new())).expect("builtins");
        assert_eq!(all.len(), 11);
    }
}
