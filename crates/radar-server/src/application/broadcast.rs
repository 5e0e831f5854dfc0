//! RadarService: the broadcast scheduler and the host-facing facade.
//!
//! Owns the fixed-cadence tick loop that drives the diff engine across all
//! viewers, plus the `on_connect`/`on_disconnect` hooks the host process
//! calls from its event delivery context. Lifecycle is a simple
//! `Stopped → Running → Stopped` machine: [`RadarService::start`] is a no-op
//! while running, [`RadarService::stop`] is safe to call repeatedly and
//! guarantees no further passes start after it returns.
//!
//! # Fault isolation
//!
//! A failure diffing or sending for one viewer is logged and skipped; it
//! never aborts the remaining viewers in that tick and never cancels future
//! ticks. Only an explicit `stop()` ends the loop.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};
use std::time::Duration;

use radar_core::{EntityId, EntityRef};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::application::diff_markers::{MarkerDiffEngine, MarkerTransport};
use crate::application::track_entities::EntityRegistry;

/// Configuration for the broadcast loop.
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Time between scheduled passes.
    pub update_interval: Duration,
    /// Icon asset identifier stamped on every marker.
    pub marker_icon: String,
    /// Prefix for generated marker ids.
    pub marker_id_prefix: String,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(500),
            marker_icon: "Player.png".to_string(),
            marker_id_prefix: "radar_".to_string(),
        }
    }
}

/// One spawned scheduler loop and the flag that ends it.
///
/// Each `start()` gets its own flag, so a loop left over from a previous
/// start/stop cycle can never be revived by a restart.
struct TickLoop {
    handle: JoinHandle<()>,
    shutdown: Arc<AtomicBool>,
}

/// The radar broadcast service.
///
/// Shared between the host's event delivery and the scheduler task via `Arc`;
/// all methods take `&self`.
pub struct RadarService {
    registry: Arc<EntityRegistry>,
    engine: Arc<MarkerDiffEngine>,
    update_interval: Duration,
    tick_task: Mutex<Option<TickLoop>>,
}

impl RadarService {
    /// Creates a stopped service around the given transport.
    pub fn new(config: BroadcastConfig, transport: Arc<dyn MarkerTransport>) -> Self {
        Self {
            registry: Arc::new(EntityRegistry::new()),
            engine: Arc::new(MarkerDiffEngine::new(
                transport,
                config.marker_icon,
                config.marker_id_prefix,
            )),
            update_interval: config.update_interval,
            tick_task: Mutex::new(None),
        }
    }

    /// Starts the broadcast loop. No-op if already running.
    ///
    /// The first pass fires immediately, then once per interval. Fixed-rate
    /// semantics: if a pass overruns the interval the next one fires as soon
    /// as it finishes (ticks delay, they never pile up or drop).
    pub fn start(&self) {
        let mut guard = self.task_guard();
        if guard.is_some() {
            debug!("radar broadcast already running");
            return;
        }

        let registry = Arc::clone(&self.registry);
        let engine = Arc::clone(&self.engine);
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let interval = self.update_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                run_tick(&registry, &engine).await;
            }
            debug!("broadcast loop exited");
        });
        *guard = Some(TickLoop { handle, shutdown });

        info!(
            interval_ms = self.update_interval.as_millis() as u64,
            "radar broadcast started"
        );
    }

    /// Stops the broadcast loop. Safe to call repeatedly.
    ///
    /// No further passes start after this returns. A pass already in flight
    /// is allowed to finish, so the previous-set bookkeeping always matches
    /// what actually went out; the loop task notices the flag at its next
    /// wakeup and exits on its own.
    pub fn stop(&self) {
        if let Some(tick_loop) = self.task_guard().take() {
            tick_loop.shutdown.store(true, Ordering::Relaxed);
            info!("radar broadcast stopped");
        }
    }

    /// `true` while the broadcast loop is scheduled.
    pub fn is_running(&self) -> bool {
        self.task_guard()
            .as_ref()
            .is_some_and(|tick_loop| !tick_loop.handle.is_finished())
    }

    /// Handles an entity connect: register it and immediately send it markers
    /// for every existing peer, so the new viewer does not wait out the
    /// remainder of the current interval. Other viewers pick the newcomer up
    /// on their next scheduled pass.
    pub async fn on_connect(&self, entity: EntityRef) {
        let id = entity.id();
        // Record before registry insert: a scheduled pass must never see an
        // entity whose previous-set record does not exist yet.
        self.engine.register_viewer(id);
        self.registry.add(entity.clone());
        info!(
            entity = %id,
            name = entity.name(),
            tracking = self.registry.count(),
            "entity connected"
        );

        let snapshot = self.registry.snapshot();
        let tick = self.engine.next_tick();
        if let Err(e) = self.engine.refresh_viewer(&entity, &snapshot, tick).await {
            warn!(viewer = %id, "initial compass pass failed: {e}");
        }
    }

    /// Handles an entity disconnect: purge its markers from every other
    /// viewer's compass, then drop it from the registry. A second disconnect
    /// for the same id is a no-op.
    pub async fn on_disconnect(&self, id: EntityId) {
        if !self.registry.contains(&id) {
            debug!(entity = %id, "disconnect for unknown entity ignored");
            return;
        }

        // Purge before removal so no viewer keeps a stale marker for up to a
        // full interval waiting on the next scheduled pass.
        let viewers: Vec<EntityRef> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|e| e.id() != id)
            .collect();
        self.engine.retire_entity(id, &viewers).await;

        let removed = self.registry.remove(&id);
        self.engine.forget_viewer(&id);
        if let Some(entity) = removed {
            info!(
                entity = %id,
                name = entity.name(),
                tracking = self.registry.count(),
                "entity disconnected"
            );
        }
    }

    /// Number of currently tracked entities, for observability.
    pub fn active_count(&self) -> usize {
        self.registry.count()
    }

    /// The diff engine, exposed for integration tests and diagnostics.
    pub fn engine(&self) -> &MarkerDiffEngine {
        &self.engine
    }

    fn task_guard(&self) -> std::sync::MutexGuard<'_, Option<TickLoop>> {
        self.tick_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RadarService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One scheduled pass over all viewers.
///
/// Errors are handled per viewer; nothing escapes to the loop, so a bad
/// viewer (or a transport hiccup) cannot take the scheduler down.
async fn run_tick(registry: &EntityRegistry, engine: &MarkerDiffEngine) {
    let tick = engine.next_tick();
    let entities = registry.snapshot();
    for viewer in &entities {
        if let Err(e) = engine.refresh_viewer(viewer, &entities, tick).await {
            warn!(viewer = %viewer.id(), tick, "per-viewer pass failed: {e}");
        }
    }
    trace!(tick, viewers = entities.len(), "broadcast pass complete");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
