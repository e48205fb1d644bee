//! Named durable slots.
//!
//! A slot is one key holding one textual value. The store serializes its whole
//! item sequence into a single slot, so a write either replaces the previous
//! value completely or does not happen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;

use crate::app_response::AppResponse;

/// Backend of named durable slots.
pub trait DurableSlot {
    /// Returns `Ok(None)` when the slot has never been written.
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse>;

    /// Replaces the slot value. Must be complete once it returns `Ok`.
    fn write(&self, key: &str, value: &str) -> Result<(), AppResponse>;

    /// Deletes the slot. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool, AppResponse>;
}

/// In-process slots, shared between clones.
///
/// Useful for hosts that persist elsewhere and for tests: two stores built on
/// clones of the same `MemorySlots` see each other's writes, just like two
/// sessions reading the same LMDB environment.
#[derive(Debug, Clone, Default)]
pub struct MemorySlots {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppResponse> {
        self.values
            .lock()
            .map_err(|_| AppResponse::StorageError("Memory slots lock poisoned".to_string()))
    }
}

impl DurableSlot for MemorySlots {
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        debug!("Writing {} bytes to memory slot '{}'", value.len(), key);
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, AppResponse> {
        Ok(self.lock()?.remove(key).is_some())
    }
}
