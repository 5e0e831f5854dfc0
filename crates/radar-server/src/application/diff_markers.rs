//! MarkerDiffEngine: computes each viewer's compass delta and dispatches it.
//!
//! This is the heart of the radar. Once per (viewer, tick) it synthesizes a
//! marker for every *other* connected entity — fresh id, distance label,
//! current position — looks up the id set it sent to that viewer on the
//! previous pass, and emits a single update retiring the old set and adding
//! the new one.
//!
//! # Why full replace instead of an incremental diff?
//!
//! Marker ids embed the tick number, so every pass produces entirely new ids
//! and the "diff" degenerates to all-old-removed / all-new-added. The compass
//! client has no in-place update path for a marker by stable id, and a fresh
//! marker guarantees the distance text is re-rendered, so the bandwidth cost
//! is accepted.
//!
//! # Previous-set invariant
//!
//! For every viewer, the stored id set equals exactly the marker ids carried
//! by the most recent *successful* update (or the empty set before the first
//! one). A failed send leaves the stored set untouched; the next pass retires
//! it again, and the client treats removal of an unknown id as a no-op.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use radar_core::{
    compose_marker_id, marker_belongs_to, EntityId, EntityRef, Marker, MarkerUpdateMessage,
    TickCounter,
};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Error type for per-viewer diff passes.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The transport could not deliver the update to this viewer.
    #[error("delivery to viewer {viewer} failed: {reason}")]
    Delivery { viewer: EntityId, reason: String },
}

/// Trait for delivering a compass update to one viewer.
///
/// Infrastructure implementations encode and write to the viewer's connection
/// handle; test implementations record calls. Delivery is fire-and-forget and
/// may fail independently per call — a failure for one viewer must never
/// affect another.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarkerTransport: Send + Sync {
    /// Sends one marker update to the specified viewer.
    async fn send_update(
        &self,
        viewer: EntityId,
        update: MarkerUpdateMessage,
    ) -> Result<(), String>;
}

/// Per-viewer marker diff engine.
///
/// Owns the previous-marker-set bookkeeping exclusively: nothing outside this
/// type reads or writes a viewer's previous set. The map is written by the
/// scheduler's tick and by the connect/disconnect passes, which run on
/// different tasks, so it sits behind a `Mutex` that is only held across map
/// operations — never across an `.await`.
pub struct MarkerDiffEngine {
    transport: std::sync::Arc<dyn MarkerTransport>,
    /// viewer id -> marker ids carried by the viewer's last successful update.
    previous: Mutex<HashMap<EntityId, HashSet<String>>>,
    ticks: TickCounter,
    icon: String,
    prefix: String,
}

impl MarkerDiffEngine {
    pub fn new(
        transport: std::sync::Arc<dyn MarkerTransport>,
        icon: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            previous: Mutex::new(HashMap::new()),
            ticks: TickCounter::new(),
            icon: icon.into(),
            prefix: prefix.into(),
        }
    }

    /// Draws the next tick number. Shared by the scheduled pass and the
    /// out-of-band connect/disconnect passes so ids are never reused.
    pub fn next_tick(&self) -> u64 {
        self.ticks.next()
    }

    /// Ensures a previous-set record exists for a newly connected viewer.
    ///
    /// A record already holding ids is kept as is: if a pass delivered to the
    /// viewer before its connect handling got here, wiping the record would
    /// leave those ids on the client forever. Stale ids in a kept record are
    /// harmless, the client ignores removals of unknown ids.
    pub fn register_viewer(&self, viewer: EntityId) {
        self.previous_guard().entry(viewer).or_default();
    }

    /// Drops the previous-set record for a departed viewer.
    pub fn forget_viewer(&self, viewer: &EntityId) {
        self.previous_guard().remove(viewer);
    }

    /// Returns a copy of the viewer's previous marker-id set, if any.
    ///
    /// Observability/testing helper; the authoritative copy stays inside.
    pub fn previous_ids(&self, viewer: &EntityId) -> Option<HashSet<String>> {
        self.previous_guard().get(viewer).cloned()
    }

    /// Synthesizes the markers `viewer` should see given `entities`, at `tick`.
    ///
    /// The viewer itself is excluded unconditionally — no entity ever receives
    /// a marker for itself. Distance is Euclidean, truncated to whole metres.
    pub fn compute_markers(
        &self,
        viewer: &EntityRef,
        entities: &[EntityRef],
        tick: u64,
    ) -> Vec<Marker> {
        let viewer_pos = viewer.position();
        entities
            .iter()
            .filter(|target| target.id() != viewer.id())
            .map(|target| {
                let pos = target.position();
                let distance = viewer_pos.distance_to(&pos) as i32;
                Marker {
                    id: compose_marker_id(&self.prefix, target.id(), tick),
                    label: format!("{} ({}m)", target.name(), distance),
                    icon: self.icon.clone(),
                    position: pos,
                }
            })
            .collect()
    }

    /// Runs one full pass for `viewer`: compute markers, retire the previous
    /// set, send, and record the new set.
    ///
    /// `entities` is the registry snapshot for this pass; it may include the
    /// viewer, which is filtered out here.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::Delivery`] if the transport rejects the update.
    /// The previous set is left untouched in that case.
    pub async fn refresh_viewer(
        &self,
        viewer: &EntityRef,
        entities: &[EntityRef],
        tick: u64,
    ) -> Result<(), DiffError> {
        let viewer_id = viewer.id();
        let markers = self.compute_markers(viewer, entities, tick);
        let new_ids: HashSet<String> = markers.iter().map(|m| m.id.clone()).collect();

        let old_ids: Vec<String> = self
            .previous_guard()
            .get(&viewer_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        // A lone viewer with nothing previously displayed has nothing to say.
        if markers.is_empty() && old_ids.is_empty() {
            self.previous_guard().insert(viewer_id, new_ids);
            return Ok(());
        }

        trace!(
            viewer = %viewer_id,
            tick,
            add = markers.len(),
            remove = old_ids.len(),
            "sending compass update"
        );

        let update = MarkerUpdateMessage::new(markers, old_ids);
        self.transport
            .send_update(viewer_id, update)
            .await
            .map_err(|reason| DiffError::Delivery {
                viewer: viewer_id,
                reason,
            })?;

        self.previous_guard().insert(viewer_id, new_ids);
        Ok(())
    }

    /// Retires every marker belonging to `departed` from each of `viewers`.
    ///
    /// Called on disconnect, before the entity leaves the registry, so no
    /// viewer keeps a stale marker for up to a full interval. Each viewer's
    /// stored set loses exactly the ids that embed the departed entity's id.
    /// A delivery failure for one viewer is logged and skipped — the next
    /// scheduled pass retires the ids anyway.
    pub async fn retire_entity(&self, departed: EntityId, viewers: &[EntityRef]) {
        for viewer in viewers {
            let viewer_id = viewer.id();
            if viewer_id == departed {
                continue;
            }

            let stale_ids: Vec<String> = match self.previous_guard().get(&viewer_id) {
                Some(set) => set
                    .iter()
                    .filter(|id| marker_belongs_to(id, departed))
                    .cloned()
                    .collect(),
                None => continue,
            };
            if stale_ids.is_empty() {
                continue;
            }

            let update = MarkerUpdateMessage::removal_only(stale_ids.clone());
            match self.transport.send_update(viewer_id, update).await {
                Ok(()) => {
                    let mut guard = self.previous_guard();
                    if let Some(set) = guard.get_mut(&viewer_id) {
                        for id in &stale_ids {
                            set.remove(id);
                        }
                    }
                    debug!(
                        viewer = %viewer_id,
                        departed = %departed,
                        retired = stale_ids.len(),
                        "retired markers for departed entity"
                    );
                }
                Err(reason) => {
                    warn!(
                        viewer = %viewer_id,
                        departed = %departed,
                        "failed to retire markers: {reason}"
                    );
                }
            }
        }
    }

    fn previous_guard(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<EntityId, HashSet<String>>> {
        self.previous.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
