//! # stampwork-core
//!
//! Capability composition: build objects out of independent, reusable
//! behavior fragments, each instance owning its own state.
//!
//! ```text
//! Capability ─┐
//! Capability ─┼─► Composer ─► Blueprint ─► create(config) ─► Instance
//! Capability ─┘   (ordered,                (defaults copied,
//!                  last write wins)         config overlaid,
//!                                           inits run in order)
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use stampwork_core::{catalog, compose, Value};
//!
//! let car = catalog::car().expect("car");
//! let blueprint = compose([&car]);
//!
//! let mut my_car = blueprint.instance().expect("create");
//! my_car.send("start", &[]).and_then(|c| c.send("accelerate", &[])).expect("chain");
//!
//! assert_eq!(my_car.get("state"), Some(&Value::from("on")));
//! assert_eq!(my_car.get("speed"), Some(&Value::Int(10)));
//! ```
//!
//! ## Modules
//!
//! - [`capability`]: descriptors and their builder
//! - [`composer`]: ordered merge into a [`Blueprint`]
//! - [`factory`]: instance creation
//! - [`instance`]: state access and method invocation
//! - [`dispatch`]: action-tag dispatch tables
//! - [`storage`]: the key-value collaborator trait
//! - [`catalog`]: built-in capabilities
//! - [`registry`] and [`formats`]: data-driven definitions
//! - [`report`]: blueprint summaries

pub mod capability;
pub mod catalog;
pub mod composer;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod formats;
pub mod instance;
pub mod registry;
pub mod report;
pub mod storage;
pub mod value;

pub use capability::{Capability, CapabilityBuilder, InitFn, MethodFn, Reply};
pub use composer::{Blueprint, Composer, Override, OverrideKind, compose};
pub use dispatch::{DispatchTable, greeter};
pub use error::{MethodError, Result, StampError};
pub use factory::create;
pub use formats::{CapabilityDef, DefinitionFile, Library};
pub use instance::Instance;
pub use registry::{Handler, HandlerRegistry};
pub use report::BlueprintReport;
pub use storage::{KeyValueStore, MemoryStore, SharedStore, StoreError};
pub use value::{State, Value, state_of};
