//! Entity registry: the server's in-memory map of connected entities.
//!
//! The registry is read by the scheduled broadcast pass and written by the
//! host's connect/disconnect callbacks, which run on a different task. The
//! lock therefore lives *inside* the type; critical sections are a handful of
//! map operations and the lock is never held across an `.await`.
//!
//! # Snapshot semantics
//!
//! A broadcast pass must observe a consistent point-in-time view of who is
//! online — never a half-applied connect or disconnect. [`EntityRegistry::snapshot`]
//! clones the current handles out under the read lock and the pass iterates
//! the clone. An entity connecting mid-pass appears on the next pass; an
//! entity disconnecting mid-pass gets its markers retired by the explicit
//! disconnect purge.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use radar_core::{EntityId, EntityRef};

/// Concurrency-safe registry of all currently connected entities.
///
/// # HashMap choice
///
/// A `HashMap<EntityId, EntityRef>` provides O(1) lookup by UUID. Iteration
/// order is not guaranteed, which is fine — no ordering is promised among
/// entities anywhere in the system.
#[derive(Default)]
pub struct EntityRegistry {
    entities: RwLock<HashMap<EntityId, EntityRef>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity, overwriting any previous handle with the same id.
    pub fn add(&self, entity: EntityRef) {
        self.write_guard().insert(entity.id(), entity);
    }

    /// Removes an entity, returning its handle so callers can run cleanup.
    ///
    /// Removing an unknown id is a benign no-op and returns `None`.
    pub fn remove(&self, id: &EntityId) -> Option<EntityRef> {
        self.write_guard().remove(id)
    }

    /// Returns the handle for a specific entity, if connected.
    pub fn get(&self, id: &EntityId) -> Option<EntityRef> {
        self.read_guard().get(id).cloned()
    }

    /// Returns `true` if the entity is currently registered.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.read_guard().contains_key(id)
    }

    /// Returns a consistent point-in-time enumeration of all entities.
    pub fn snapshot(&self) -> Vec<EntityRef> {
        self.read_guard().values().cloned().collect()
    }

    /// Current number of registered entities, for observability.
    pub fn count(&self) -> usize {
        self.read_guard().len()
    }

    // Poisoning only happens if another thread panicked while holding the
    // guard; the map itself is still valid, so keep serving it.
    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, HashMap<EntityId, EntityRef>> {
        self.entities.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<EntityId, EntityRef>> {
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
