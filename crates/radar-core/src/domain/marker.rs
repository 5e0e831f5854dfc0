//! Ephemeral compass markers and marker id composition.
//!
//! A [`Marker`] describes one entity to one viewer for exactly one broadcast
//! pass. Markers are never stored server-side beyond the id set needed to
//! retire them on the next pass.
//!
//! # Marker id scheme
//!
//! Ids are `prefix + entity_uuid + "_" + tick`, e.g.
//! `radar_6f9619ff-8b86-d011-b42d-00c04fc964ff_1042`. Embedding the tick makes
//! every id unique per pass, which forces the client to treat each update as
//! remove-old/add-new instead of updating a marker in place — the compass has
//! no in-place update path, and a fresh marker guarantees the distance label
//! is re-rendered. Embedding the entity UUID lets disconnect handling find
//! every marker belonging to a departed entity by substring match.

use serde::{Deserialize, Serialize};

use crate::domain::entity::{EntityId, Position};

/// An ephemeral visual indicator describing one entity to one viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Unique per (entity, tick); see the module docs for the id scheme.
    pub id: String,
    /// Display name plus distance, e.g. `"steve (42m)"`.
    pub label: String,
    /// Icon asset identifier shown on the compass.
    pub icon: String,
    /// World position at the time the marker was synthesized.
    pub position: Position,
}

/// Composes a marker id for `entity_id` at `tick`.
pub fn compose_marker_id(prefix: &str, entity_id: EntityId, tick: u64) -> String {
    format!("{prefix}{entity_id}_{tick}")
}

/// Returns `true` if `marker_id` belongs to `entity_id`.
///
/// Matches on the embedded UUID rather than parsing the full id, so it works
/// regardless of which prefix or tick the id carries.
pub fn marker_belongs_to(marker_id: &str, entity_id: EntityId) -> bool {
    marker_id.contains(&entity_id.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
