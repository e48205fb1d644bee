//! Toggled collection store.
//!
//! A [`ToggledCollection`] keeps an insertion-ordered set of records keyed by
//! id, optionally capped, and mirrored into one durable slot. The only way to
//! change it is [`toggle`](ToggledCollection::toggle),
//! [`clear`](ToggledCollection::clear), [`purge`](ToggledCollection::purge)
//! or [`reload`](ToggledCollection::reload); readers get `&[T]`.
//!
//! ```rust
//! use shortlist_core::config::CollectionConfig;
//! use shortlist_core::entity::Entity;
//! use shortlist_core::slot::MemorySlots;
//! use shortlist_core::store::{ToggleOutcome, ToggledCollection};
//!
//! let slots = MemorySlots::new();
//! let mut compare = ToggledCollection::<Entity, _>::initialize(slots.clone(), CollectionConfig::compare());
//!
//! assert_eq!(compare.toggle(Entity::new(1))?, ToggleOutcome::Added);
//! assert_eq!(compare.toggle(Entity::new(1))?, ToggleOutcome::Removed);
//! # Ok::<(), shortlist_core::AppResponse>(())
//! ```

use std::num::NonZeroUsize;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::config::CollectionConfig;
use crate::entity::{EntityId, Keyed};
use crate::slot::DurableSlot;

/// Result of a single toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The id was absent and the collection is full. Nothing changed.
    RejectedCapacity,
}

/// Capacity state of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityState {
    WithinCapacity,
    /// Only reachable when a capacity is configured.
    AtCapacity,
}

/// What observers are told after a completed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    Added(EntityId),
    Removed(EntityId),
    Cleared { removed: usize },
    /// The slot was re-read and its contents differed.
    Reloaded { len: usize },
}

/// Token returned by [`ToggledCollection::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CollectionEvent)>;

pub struct ToggledCollection<T, S> {
    items: Vec<T>,
    config: CollectionConfig,
    slot: S,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<T, S> std::fmt::Debug for ToggledCollection<T, S>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggledCollection")
            .field("key", &self.config.key)
            .field("capacity", &self.config.capacity)
            .field("items", &self.items)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T, S> ToggledCollection<T, S>
where
    T: Keyed + Serialize + DeserializeOwned,
    S: DurableSlot,
{
    /// Rehydrates the collection from its slot.
    ///
    /// A missing slot is a first run. An unreadable or unparseable slot is
    /// logged and treated the same way; this never fails.
    pub fn initialize(slot: S, config: CollectionConfig) -> Self {
        let items = load_items(&slot, &config);
        info!(
            "Initialized collection '{}' with {} item(s), capacity {:?}",
            config.key,
            items.len(),
            config.capacity
        );

        Self {
            items,
            config,
            slot,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Adds the record if its id is absent, removes it if present.
    ///
    /// On `Added` and `Removed` the slot has been rewritten before this
    /// returns. If that write fails the change is undone and the storage error
    /// is returned. `RejectedCapacity` never touches the slot.
    pub fn toggle(&mut self, entity: T) -> Result<ToggleOutcome, AppResponse> {
        let id = entity.key();

        if let Some(index) = self.position(id) {
            let removed = self.items.remove(index);
            if let Err(e) = self.persist() {
                self.items.insert(index, removed);
                return Err(e);
            }
            debug!("Removed {} from '{}'", id, self.config.key);
            self.notify(&CollectionEvent::Removed(id));
            return Ok(ToggleOutcome::Removed);
        }

        if self.state() == CapacityState::AtCapacity {
            debug!("Rejected {} from full collection '{}'", id, self.config.key);
            return Ok(ToggleOutcome::RejectedCapacity);
        }

        self.items.push(entity);
        if let Err(e) = self.persist() {
            self.items.pop();
            return Err(e);
        }
        debug!("Added {} to '{}'", id, self.config.key);
        self.notify(&CollectionEvent::Added(id));
        Ok(ToggleOutcome::Added)
    }

    /// Empties the collection and the slot.
    pub fn clear(&mut self) -> Result<(), AppResponse> {
        let previous = std::mem::take(&mut self.items);
        if let Err(e) = self.persist() {
            self.items = previous;
            return Err(e);
        }
        info!("Cleared {} item(s) from '{}'", previous.len(), self.config.key);
        self.notify(&CollectionEvent::Cleared {
            removed: previous.len(),
        });
        Ok(())
    }

    /// Empties the collection and deletes its slot altogether, as on sign-out.
    ///
    /// Unlike [`clear`](Self::clear), a later `initialize` sees a first run.
    /// Returns whether the slot existed.
    pub fn purge(&mut self) -> Result<bool, AppResponse> {
        let existed = self.slot.remove(&self.config.key).map_err(|e| {
            warn!("Failed to purge '{}': {}", self.config.key, e);
            e
        })?;
        let removed = std::mem::take(&mut self.items).len();
        info!("Purged slot '{}' ({} item(s))", self.config.key, removed);
        self.notify(&CollectionEvent::Cleared { removed });
        Ok(existed)
    }

    /// Re-reads the slot, picking up writes made by another session.
    ///
    /// Same recovery policy as [`initialize`](Self::initialize). Returns
    /// whether the contents changed.
    pub fn reload(&mut self) -> bool {
        let fresh: Vec<T> = load_items(&self.slot, &self.config);
        let changed = match (serde_json::to_value(&fresh), serde_json::to_value(&self.items)) {
            (Ok(fresh_json), Ok(current_json)) => fresh_json != current_json,
            _ => true,
        };

        self.items = fresh;
        if changed {
            info!("Reloaded '{}' from slot: {} item(s)", self.config.key, self.items.len());
            self.notify(&CollectionEvent::Reloaded {
                len: self.items.len(),
            });
        }
        changed
    }
}

impl<T, S> ToggledCollection<T, S>
where
    T: Keyed,
{
    pub fn contains(&self, id: EntityId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.position(id).map(|index| &self.items[index])
    }

    /// Items in insertion order.
    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(|item| item.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> Option<NonZeroUsize> {
        self.config.capacity
    }

    pub fn key(&self) -> &str {
        &self.config.key
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Backend this collection persists into.
    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn state(&self) -> CapacityState {
        match self.config.capacity {
            Some(cap) if self.items.len() >= cap.get() => CapacityState::AtCapacity,
            _ => CapacityState::WithinCapacity,
        }
    }

    /// Registers a listener called after every completed mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CollectionEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        let listener: Listener = Box::new(listener);
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        self.items.iter().position(|item| item.key() == id)
    }

    fn notify(&mut self, event: &CollectionEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

impl<T, S> ToggledCollection<T, S>
where
    T: Serialize,
    S: DurableSlot,
{
    fn persist(&self) -> Result<(), AppResponse> {
        let json = serde_json::to_string(&self.items)?;
        self.slot.write(&self.config.key, &json).map_err(|e| {
            warn!("Failed to persist '{}': {}", self.config.key, e);
            e
        })
    }
}

/// Reads and normalizes a slot. Never fails: anything unusable yields empty.
fn load_items<T, S>(slot: &S, config: &CollectionConfig) -> Vec<T>
where
    T: Keyed + DeserializeOwned,
    S: DurableSlot,
{
    let raw = match slot.read(&config.key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Could not read slot '{}', starting empty: {}", config.key, e);
            return Vec::new();
        }
    };

    let parsed: Vec<T> = match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!("Slot '{}' is not a valid item list, starting empty: {}", config.key, e);
            return Vec::new();
        }
    };

    normalize(parsed, config)
}

/// Drops repeated ids (first occurrence wins) and anything beyond capacity.
fn normalize<T: Keyed>(parsed: Vec<T>, config: &CollectionConfig) -> Vec<T> {
    let total = parsed.len();
    let mut items: Vec<T> = Vec::with_capacity(total);
    for item in parsed {
        if !items.iter().any(|kept| kept.key() == item.key()) {
            items.push(item);
        }
    }
    if items.len() != total {
        warn!(
            "Slot '{}' held {} duplicate id(s), keeping first occurrences",
            config.key,
            total - items.len()
        );
    }

    if let Some(cap) = config.capacity {
        if items.len() > cap.get() {
            warn!(
                "Slot '{}' held {} item(s) over capacity {}, truncating",
                config.key,
                items.len() - cap.get(),
                cap
            );
            items.truncate(cap.get());
        }
    }
    items
}
