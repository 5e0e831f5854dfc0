//! Entity identity and live position.
//!
//! An [`EntityRef`] is the server's handle to one connected participant: a
//! stable UUID, a display name, and a *live* position that the host process
//! mutates at its own rate (movement ticks, teleports). The radar reads the
//! position fresh on every broadcast pass; it never caches it.
//!
//! # Why a shared position handle? (for beginners)
//!
//! The radar does not own player movement — the host's world simulation does.
//! Rather than pushing position updates into the radar, the host hands the
//! radar a [`SharedPosition`] (`Arc<RwLock<Position>>`) that both sides hold.
//! The host writes to it whenever the player moves; the radar takes a short
//! read lock each tick. The lock is never held across an `.await`, so the
//! write side can never be starved by a slow broadcast.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable unique identifier for a connected entity.
pub type EntityId = Uuid;

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Live position cell shared between the host simulation and the radar.
pub type SharedPosition = Arc<RwLock<Position>>;

/// Handle to one connected entity.
///
/// Cloning is cheap: the name is cloned, the position cell is shared.
#[derive(Debug, Clone)]
pub struct EntityRef {
    id: EntityId,
    name: String,
    position: SharedPosition,
}

impl EntityRef {
    /// Creates a new entity handle with a fresh position cell.
    pub fn new(id: EntityId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position: Arc::new(RwLock::new(position)),
        }
    }

    /// Creates an entity handle around an existing position cell owned by the host.
    pub fn with_shared_position(
        id: EntityId,
        name: impl Into<String>,
        position: SharedPosition,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the current position.
    ///
    /// A poisoned lock (a writer panicked mid-update) still yields the last
    /// written value; a stale coordinate is strictly better than taking the
    /// whole broadcast pass down.
    pub fn position(&self) -> Position {
        *self.position.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrites the position. Called by the host's movement handling.
    pub fn set_position(&self, position: Position) {
        *self
            .position
            .write()
            .unwrap_or_else(PoisonError::into_inner) = position;
    }

    /// Returns the shared position cell for the host to keep writing into.
    pub fn position_handle(&self) -> SharedPosition {
        Arc::clone(&self.position)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
