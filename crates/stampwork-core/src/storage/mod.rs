//! # Storage Module
//!
//! The key-value collaborator that persistence-minded capabilities talk to.
//!
//! The core never touches disks or networks. It defines the
//! [`KeyValueStore`] trait and ships an in-memory implementation; anything
//! durable (the CLI's JSON file store, for instance) lives outside the core
//! and plugs in through the same trait.

mod memory;

pub use memory::MemoryStore;

use crate::value::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised by a key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The key is empty.
    #[error("store key must not be empty")]
    EmptyKey,

    /// The backing medium failed.
    #[error("store backend failed: {0}")]
    Backend(String),

    /// Another holder of the shared store panicked while writing.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Minimal key-value persistence contract.
pub trait KeyValueStore {
    /// Store `value` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Read the value under `key`.
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// All keys in deterministic order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// A store shared between every instance that persists through it.
pub type SharedStore = Arc<Mutex<dyn KeyValueStore + Send>>;

/// Wrap a store so capabilities can share it.
pub fn shared<S: KeyValueStore + Send + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Run `f` with the shared store locked.
pub fn with_store<T>(
    store: &SharedStore,
    f: impl FnOnce(&mut dyn KeyValueStore) -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    let mut guard = store.lock().map_err(|_| StoreError::Poisoned)?;
    f(&mut *guard)
}
