//! # Formats Module
//!
//! Data-driven capability definitions.
//!
//! This module contains:
//! - The serde schema of a definition file
//! - The `Library` that resolves definitions against a handler registry
//!
//! Note: reading files and parsing JSON stay in the app layer
//! (apps/stampwork). This module only converts already-deserialized
//! definitions into capabilities.

mod definition;
mod library;

pub use definition::*;
pub use library::*;
