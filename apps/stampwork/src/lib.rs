//! # stampwork Library
//!
//! This library exposes the stampwork command modules for testing and
//! integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod store;

// Re-export stampwork_core for convenience
pub use stampwork_core;
