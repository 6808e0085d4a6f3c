//! # CLI Commands
//!
//! Each `cmd_*` function backs one subcommand and prints to stdout; the
//! matching `run_*` function does the work and returns structured output
//! so tests can inspect it.

use crate::store::FileStore;
use serde::Serialize;
use stampwork_core::storage::shared;
use stampwork_core::{
    BlueprintReport, DefinitionFile, HandlerRegistry, Library, MemoryStore, Reply, SharedStore,
    StampError, State, StoreError, Value, catalog, compose, greeter, state_of,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Built-in scenarios accepted by `stampwork demo`.
pub const DEMOS: &[&str] = &["ball", "car", "flyweight", "cart", "post", "greet"];

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Stamp(#[from] StampError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// =============================================================================
// LOGGING
// =============================================================================

/// Filter directive for the log subscriber: a non-empty `RUST_LOG` wins,
/// then `--verbose` selects `debug`, otherwise `warn`.
pub fn log_directive(verbose: bool, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim) {
        Some(directive) if !directive.is_empty() => directive.to_string(),
        _ if verbose => "debug".to_string(),
        _ => "warn".to_string(),
    }
}

// =============================================================================
// INPUT HELPERS
// =============================================================================

/// Read a JSON definition file.
pub fn load_definitions(path: &Path) -> Result<DefinitionFile, CliError> {
    let content = fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Built-in library, extended with the definitions in `defs` if given.
pub fn load_library(defs: Option<&Path>, store: SharedStore) -> Result<Library, CliError> {
    let mut library = Library::with_builtins(store.clone())?;

    if let Some(path) = defs {
        let registry = HandlerRegistry::with_builtins(store)?;
        let file = load_definitions(path)?;
        library.load(&file, &registry)?;
        info!(
            path = %path.display(),
            count = file.capabilities.len(),
            "Loaded capability definitions"
        );
    }

    Ok(library)
}

/// Parse `--config` as a JSON object. Absent means empty.
pub fn parse_config(raw: Option<&str>) -> Result<State, CliError> {
    let Some(raw) = raw else {
        return Ok(State::new());
    };
    match serde_json::from_str::<Value>(raw)? {
        Value::Map(map) => Ok(map),
        other => Err(CliError::Usage(format!(
            "--config must be a JSON object, got {}",
            other.kind()
        ))),
    }
}

/// One `--call` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: String,
    pub args: Vec<Value>,
}

/// Parse `method` or `method:arg,arg`. Each argument is read as JSON and
/// falls back to plain text, so `hoop` and `"hoop"` are the same.
pub fn parse_call(spec: &str) -> Result<Call, CliError> {
    let (method, rest) = match spec.split_once(':') {
        Some((method, rest)) => (method.trim(), Some(rest)),
        None => (spec.trim(), None),
    };

    if method.is_empty() {
        return Err(CliError::Usage(format!("call `{spec}` names no method")));
    }

    let args = match rest {
        Some(rest) if !rest.trim().is_empty() => rest.split(',').map(parse_arg).collect(),
        _ => Vec::new(),
    };

    Ok(Call {
        method: method.to_string(),
        args,
    })
}

fn parse_arg(raw: &str) -> Value {
    let raw = raw.trim();
    serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw))
}

fn memory_store() -> SharedStore {
    shared(MemoryStore::new())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// LIST COMMAND
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerEntry {
    pub tag: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub capabilities: Vec<String>,
    pub handlers: Vec<HandlerEntry>,
}

pub fn run_list() -> Result<Listing, CliError> {
    let store = memory_store();
    let library = Library::with_builtins(store.clone())?;
    let registry = HandlerRegistry::with_builtins(store)?;

    Ok(Listing {
        capabilities: library.names().map(str::to_string).collect(),
        handlers: registry
            .entries()
            .map(|(tag, kind)| HandlerEntry {
                tag: tag.to_string(),
                kind: kind.to_string(),
            })
            .collect(),
    })
}

/// List built-in capabilities and handler tags.
pub fn cmd_list(json: bool) -> Result<(), CliError> {
    let listing = run_list()?;
    info!(
        capabilities = listing.capabilities.len(),
        handlers = listing.handlers.len(),
        "Listing built-ins"
    );

    if json {
        return print_json(&listing);
    }

    println!("Capabilities:");
    for name in &listing.capabilities {
        println!("  {name}");
    }
    println!();
    println!("Handlers:");
    for entry in &listing.handlers {
        println!("  {:<28} {}", entry.tag, entry.kind);
    }
    Ok(())
}

// =============================================================================
// COMPOSE COMMAND
// =============================================================================

pub fn run_compose(defs: Option<&Path>, names: &[String]) -> Result<BlueprintReport, CliError> {
    if names.is_empty() {
        return Err(CliError::Usage("compose needs at least one capability".into()));
    }

    let library = load_library(defs, memory_store())?;
    let blueprint = library.compose(names)?;

    for o in blueprint.overrides() {
        debug!(name = %o.name, replaced = %o.replaced, by = %o.by, "Override");
    }

    Ok(BlueprintReport::from_blueprint(&blueprint))
}

/// Compose capabilities by name and print the blueprint report.
pub fn cmd_compose(defs: Option<&Path>, names: &[String], json: bool) -> Result<(), CliError> {
    info!(names = ?names, "Composing");
    let report = run_compose(defs, names)?;

    if json {
        print_json(&report)
    } else {
        print!("{}", report.to_text());
        Ok(())
    }
}

// =============================================================================
// CREATE COMMAND
// =============================================================================

/// A call and its reply. `reply` is `None` when the method chained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub call: String,
    pub reply: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOutcome {
    pub capabilities: Vec<String>,
    pub calls: Vec<CallRecord>,
    pub state: State,
}

/// Create an instance, run `calls` against it in order, and return the
/// replies and final state. With `store`, `persistable` writes to that
/// file, which is flushed once every call has succeeded.
pub fn run_create(
    defs: Option<&Path>,
    names: &[String],
    config: Option<&str>,
    calls: &[String],
    store: Option<&Path>,
) -> Result<CreateOutcome, CliError> {
    if names.is_empty() {
        return Err(CliError::Usage("create needs at least one capability".into()));
    }

    let file_store = match store {
        Some(path) => Some(Arc::new(Mutex::new(FileStore::open(path)?))),
        None => None,
    };
    let shared_store = match &file_store {
        Some(file) => Arc::clone(file) as SharedStore,
        None => memory_store(),
    };

    let calls = calls
        .iter()
        .map(|spec| parse_call(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let config = parse_config(config)?;

    let library = load_library(defs, shared_store)?;
    let blueprint = library.compose(names)?;

    let mut instance = blueprint.create(config).inspect_err(|e| {
        if let StampError::Initialization { capability, .. } = e {
            warn!(capability = %capability, error = %e, "Instance initialization failed");
        }
    })?;

    let mut records = Vec::with_capacity(calls.len());
    for call in &calls {
        debug!(method = %call.method, args = call.args.len(), "Calling");
        let reply = match instance.call(&call.method, &call.args)? {
            Reply::This => None,
            Reply::Value(value) => Some(value),
        };
        records.push(CallRecord {
            call: call.method.clone(),
            reply,
        });
    }

    if let Some(file) = &file_store {
        let mut guard = file.lock().map_err(|_| StoreError::Poisoned)?;
        if guard.is_dirty() {
            info!(path = %guard.path().display(), "Flushing store");
        }
        guard.flush()?;
    }

    Ok(CreateOutcome {
        capabilities: blueprint.capabilities().to_vec(),
        calls: records,
        state: instance.into_state(),
    })
}

/// Create an instance, run calls, print replies and final state.
pub fn cmd_create(
    defs: Option<&Path>,
    names: &[String],
    config: Option<&str>,
    calls: &[String],
    store: Option<&Path>,
    json: bool,
) -> Result<(), CliError> {
    info!(names = ?names, calls = calls.len(), "Creating instance");
    let outcome = run_create(defs, names, config, calls, store)?;

    if json {
        return print_json(&outcome);
    }

    println!("Instance of [{}]", outcome.capabilities.join(" + "));
    for record in &outcome.calls {
        match &record.reply {
            Some(value) => println!("  {} -> {}", record.call, value),
            None => println!("  {} -> (chained)", record.call),
        }
    }
    println!("State:");
    println!("{}", serde_json::to_string_pretty(&outcome.state)?);
    Ok(())
}

// =============================================================================
// DEMO COMMAND
// =============================================================================

/// Run a built-in scenario and return its output lines.
pub fn run_demo(name: &str) -> Result<Vec<String>, CliError> {
    match name {
        "ball" => demo_ball(),
        "car" => demo_car(),
        "flyweight" => demo_flyweight(),
        "cart" => demo_cart(),
        "post" => demo_post(),
        "greet" => demo_greet(),
        other => Err(CliError::Usage(format!(
            "unknown demo `{other}` (expected one of: {})",
            DEMOS.join(", ")
        ))),
    }
}

/// Run a built-in scenario and print it.
pub fn cmd_demo(name: &str, json: bool) -> Result<(), CliError> {
    info!(demo = name, "Running demo");
    let lines = run_demo(name)?;

    if json {
        return print_json(&lines);
    }
    for line in &lines {
        println!("{line}");
    }
    Ok(())
}

fn demo_ball() -> Result<Vec<String>, CliError> {
    let ball = catalog::ball()?;
    let mut basketball = ball.create(state_of([("description", "pumped up basketball")]))?;
    let mut tennis = ball.create(state_of([("description", "soft tennis ball")]))?;

    Ok(vec![
        basketball.ask("dribble", &[])?.to_string(),
        basketball.ask("shoot", &[Value::from("hoop")])?.to_string(),
        tennis.ask("dribble", &[])?.to_string(),
        tennis.ask("shoot", &[Value::from("net")])?.to_string(),
    ])
}

fn demo_car() -> Result<Vec<String>, CliError> {
    let car = catalog::car()?;
    let mut my_car = compose([&car]).instance()?;
    let mut lines = Vec::new();

    my_car
        .send("start", &[])?
        .send("accelerate", &[])?
        .send("accelerate", &[Value::Int(25)])?;
    lines.push(format!(
        "started and accelerated: state={}, speed={}",
        my_car.ask("status", &[])?,
        my_car.ask("speed", &[])?
    ));

    my_car.send("brake", &[Value::Int(100)])?;
    lines.push(format!("hard brake: speed={}", my_car.ask("speed", &[])?));

    my_car.send("turn_off", &[])?.send("accelerate", &[])?;
    lines.push(format!(
        "turned off, accelerate ignored: state={}, speed={}",
        my_car.ask("status", &[])?,
        my_car.ask("speed", &[])?
    ));

    Ok(lines)
}

fn demo_flyweight() -> Result<Vec<String>, CliError> {
    let enemy = catalog::enemy()?;
    let wolves = compose([&enemy]);

    let mut wolf1 = wolves.instance()?;
    let wolf2 = wolves.instance()?;

    wolf1
        .set("health", 5)
        .send("set_position", &[Value::Int(10), Value::Int(10)])?;

    Ok(vec![
        format!("wolf 1: {}", Value::from(wolf1.state().clone())),
        format!("wolf 2: {}", Value::from(wolf2.state().clone())),
    ])
}

fn demo_cart() -> Result<Vec<String>, CliError> {
    let cart = catalog::cart()?;
    let carts = compose([&cart]);

    let mut saved = carts.instance()?;
    let mut session = carts.instance()?;
    saved.send("add_item", &[Value::from("apple")])?;
    session
        .send("add_item", &[Value::from("pear")])?
        .send("add_item", &[Value::from("plum")])?;

    Ok(vec![
        format!("saved cart: {}", saved.ask("items", &[])?),
        format!("session cart: {}", session.ask("items", &[])?),
    ])
}

fn demo_post() -> Result<Vec<String>, CliError> {
    let store = memory_store();
    let mut lines = Vec::new();

    let interface_only = [
        catalog::identified()?,
        catalog::post()?,
        catalog::storage_interface()?,
    ];
    let mut draft = compose(&interface_only).instance()?;
    if let Err(e) = draft.call("save", &[]) {
        lines.push(format!("interface only: {e}"));
    }

    let parts = [
        catalog::identified()?,
        catalog::post()?,
        catalog::storage_interface()?,
        catalog::persistable(store.clone())?,
    ];
    let posts = compose(&parts);

    let mut post = posts.create(state_of([("id", "post-1")]))?;
    post.send("set", &[Value::from("message"), Value::from("hello")])?
        .send("set", &[Value::from("published"), Value::Bool(true)])?
        .send("save", &[])?;
    lines.push(format!("saved post-1: {}", post.get("data").cloned().unwrap_or_default()));

    let mut copy = posts.create(state_of([("id", "post-1")]))?;
    copy.send("load", &[])?;
    lines.push(format!("loaded post-1: {}", copy.get("data").cloned().unwrap_or_default()));

    let fresh = posts.instance()?;
    lines.push(format!(
        "fresh post id: {}",
        fresh.text("id").unwrap_or_default()
    ));

    Ok(lines)
}

fn demo_greet() -> Result<Vec<String>, CliError> {
    let table = greeter();
    Ok(vec![
        table.dispatch(&[])?.to_string(),
        table
            .dispatch(&[Value::from("hello"), Value::from("world")])?
            .to_string(),
        table
            .dispatch(&[Value::from("goodbye"), Value::from("world")])?
            .to_string(),
    ])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_without_args() {
        assert_eq!(
            parse_call("start").expect("parse"),
            Call {
                method: "start".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn call_args_prefer_json() {
        let call = parse_call("set_position:10, 20").expect("parse");
        assert_eq!(call.method, "set_position");
        assert_eq!(call.args, vec![Value::Int(10), Value::Int(20)]);

        let call = parse_call("set:published,true").expect("parse");
        assert_eq!(call.args, vec![Value::from("published"), Value::Bool(true)]);

        let call = parse_call(r#"shoot:"hoop""#).expect("parse");
        assert_eq!(call.args, vec![Value::from("hoop")]);
    }

    #[test]
    fn call_needs_a_method() {
        assert!(matches!(parse_call(":1,2"), Err(CliError::Usage(_))));
        assert!(matches!(parse_call(""), Err(CliError::Usage(_))));
    }

    #[test]
    fn config_must_be_an_object() {
        assert_eq!(parse_config(None).expect("empty"), State::new());
        assert_eq!(
            parse_config(Some(r#"{"speed": 5}"#)).expect("object"),
            state_of([("speed", 5)])
        );
        assert!(matches!(parse_config(Some("[1]")), Err(CliError::Usage(_))));
        assert!(matches!(parse_config(Some("{")), Err(CliError::Json(_))));
    }

    #[test]
    fn rust_log_takes_precedence_over_verbose() {
        assert_eq!(log_directive(false, None), "warn");
        assert_eq!(log_directive(true, None), "debug");
        assert_eq!(log_directive(true, Some("stampwork=trace")), "stampwork=trace");
        assert_eq!(log_directive(false, Some("info")), "info");
        assert_eq!(log_directive(true, Some("  ")), "debug");
    }

    #[test]
    fn unknown_demo_is_a_usage_error() {
        assert!(matches!(run_demo("rocket"), Err(CliError::Usage(_))));
    }
}
