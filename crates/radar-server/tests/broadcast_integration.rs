//! Integration tests for the radar broadcast pipeline.
//!
//! These tests exercise the application layer of radar-server end-to-end:
//! `RadarService` + `EntityRegistry` + `MarkerDiffEngine` + a recording
//! transport, driven through the same public API the host process uses
//! (`start`/`stop`, `on_connect`/`on_disconnect`) with the Tokio clock
//! paused so scheduled passes are deterministic.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use radar_core::{marker_belongs_to, EntityId, EntityRef, MarkerUpdateMessage, Position};
use radar_server::application::broadcast::{BroadcastConfig, RadarService};
use radar_server::application::diff_markers::MarkerTransport;
use uuid::Uuid;

// ── Test doubles ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingTransport {
    updates: Mutex<Vec<(EntityId, MarkerUpdateMessage)>>,
}

impl RecordingTransport {
    /// All updates addressed to `viewer`, in delivery order.
    fn updates_for(&self, viewer: EntityId) -> Vec<MarkerUpdateMessage> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter(|(v, _)| *v == viewer)
            .map(|(_, u)| u.clone())
            .collect()
    }
}

#[async_trait]
impl MarkerTransport for RecordingTransport {
    async fn send_update(
        &self,
        viewer: EntityId,
        update: MarkerUpdateMessage,
    ) -> Result<(), String> {
        self.updates.lock().unwrap().push((viewer, update));
        Ok(())
    }
}

fn make_service() -> (Arc<RadarService>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let service = Arc::new(RadarService::new(
        BroadcastConfig::default(),
        Arc::clone(&transport) as Arc<dyn MarkerTransport>,
    ));
    (service, transport)
}

fn entity(name: &str, x: f64, z: f64) -> EntityRef {
    EntityRef::new(Uuid::new_v4(), name, Position::new(x, 64.0, z))
}

/// Runs the scheduler for `passes` intervals under the paused clock.
async fn run_passes(service: &RadarService, passes: u32) {
    service.start();
    // The first pass fires immediately; each further pass every 500 ms.
    tokio::time::sleep(Duration::from_millis(500 * (passes as u64 - 1) + 100)).await;
    service.stop();
}

// ── Broadcast scenarios ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_first_tick_with_two_entities_adds_without_removals() {
    // Scenario: registry has {A, B}; the first scheduled tick fires.
    let (service, tx) = make_service();
    let a = entity("a", 0.0, 0.0);
    let b = entity("b", 30.0, 0.0);
    let (a_id, b_id) = (a.id(), b.id());
    service.on_connect(a).await; // alone: connect pass sends nothing
    service.on_connect(b).await; // receives marker(A) immediately

    run_passes(&service, 1).await;

    // A's first update comes from the scheduled tick: add=[marker(B)], remove=[]
    let a_updates = tx.updates_for(a_id);
    assert_eq!(a_updates.len(), 1);
    assert_eq!(a_updates[0].markers_to_add.len(), 1);
    assert!(marker_belongs_to(&a_updates[0].markers_to_add[0].id, b_id));
    assert!(a_updates[0].marker_ids_to_remove.is_empty());

    // B already had its connect pass; the tick retires that marker and adds
    // a fresh one for A.
    let b_updates = tx.updates_for(b_id);
    assert_eq!(b_updates.len(), 2);
    assert_eq!(b_updates[1].markers_to_add.len(), 1);
    assert_eq!(
        b_updates[1].marker_ids_to_remove,
        vec![b_updates[0].markers_to_add[0].id.clone()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_each_tick_fully_replaces_the_previous_markers() {
    // Scenario: two consecutive ticks; the second retires exactly what the
    // first added, under fresh ids.
    let (service, tx) = make_service();
    let a = entity("a", 0.0, 0.0);
    let b = entity("b", 30.0, 0.0);
    let a_id = a.id();
    service.on_connect(a).await;
    service.on_connect(b).await;

    run_passes(&service, 2).await;

    let a_updates = tx.updates_for(a_id);
    assert_eq!(a_updates.len(), 2);
    let first_added: Vec<String> = a_updates[0]
        .markers_to_add
        .iter()
        .map(|m| m.id.clone())
        .collect();
    assert_eq!(a_updates[1].marker_ids_to_remove, first_added);
    assert_ne!(a_updates[1].markers_to_add[0].id, first_added[0]);
}

#[tokio::test(start_paused = true)]
async fn test_remove_list_size_always_matches_previous_add_list_size() {
    // Property: for every viewer, remove-size at pass i equals add-size at
    // pass i−1 (0 for the first pass).
    let (service, tx) = make_service();
    let entities: Vec<EntityRef> = (0..4)
        .map(|i| entity(&format!("p{i}"), i as f64 * 25.0, 0.0))
        .collect();
    let ids: Vec<EntityId> = entities.iter().map(|e| e.id()).collect();
    for e in entities {
        service.on_connect(e).await;
    }

    run_passes(&service, 3).await;

    for id in ids {
        let updates = tx.updates_for(id);
        assert!(!updates.is_empty());
        assert!(updates[0].marker_ids_to_remove.is_empty());
        for pair in updates.windows(2) {
            assert_eq!(
                pair[1].marker_ids_to_remove.len(),
                pair[0].markers_to_add.len(),
                "each pass must retire exactly the previous pass's markers"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_viewer_never_receives_its_own_marker() {
    let (service, tx) = make_service();
    let entities: Vec<EntityRef> = (0..3)
        .map(|i| entity(&format!("p{i}"), i as f64 * 10.0, 5.0))
        .collect();
    let ids: Vec<EntityId> = entities.iter().map(|e| e.id()).collect();
    for e in entities {
        service.on_connect(e).await;
    }

    run_passes(&service, 2).await;

    for id in ids {
        for update in tx.updates_for(id) {
            for marker in &update.markers_to_add {
                assert!(
                    !marker_belongs_to(&marker.id, id),
                    "viewer {id} received its own marker {}",
                    marker.id
                );
            }
        }
    }
}

#[tokio::test]
async fn test_late_joiner_receives_all_peers_immediately() {
    // Scenario: C connects while {A, B} are present. No scheduler running —
    // the connect pass alone must deliver both peers.
    let (service, tx) = make_service();
    service.on_connect(entity("a", 0.0, 0.0)).await;
    service.on_connect(entity("b", 10.0, 0.0)).await;

    let c = entity("c", 20.0, 0.0);
    let c_id = c.id();
    service.on_connect(c).await;

    let c_updates = tx.updates_for(c_id);
    assert_eq!(c_updates.len(), 1);
    assert_eq!(c_updates[0].markers_to_add.len(), 2);
    assert!(c_updates[0].marker_ids_to_remove.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_peers_see_late_joiner_on_their_next_tick() {
    let (service, tx) = make_service();
    let a = entity("a", 0.0, 0.0);
    let b = entity("b", 10.0, 0.0);
    let (a_id, b_id) = (a.id(), b.id());
    service.on_connect(a).await;
    service.on_connect(b).await;
    run_passes(&service, 1).await;

    let c = entity("c", 20.0, 0.0);
    let c_id = c.id();
    service.on_connect(c).await;
    run_passes(&service, 1).await;

    for id in [a_id, b_id] {
        let last = tx.updates_for(id).last().cloned().unwrap();
        assert_eq!(last.markers_to_add.len(), 2);
        assert!(
            last.markers_to_add
                .iter()
                .any(|m| marker_belongs_to(&m.id, c_id)),
            "existing viewers must see the newcomer after their next pass"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_purges_markers_before_the_next_tick() {
    // Scenario: B disconnects. A receives an explicit removal with an empty
    // add list without waiting for the scheduler.
    let (service, tx) = make_service();
    let a = entity("a", 0.0, 0.0);
    let b = entity("b", 10.0, 0.0);
    let (a_id, b_id) = (a.id(), b.id());
    service.on_connect(a).await;
    service.on_connect(b).await;
    run_passes(&service, 1).await;

    service.on_disconnect(b_id).await;

    let a_updates = tx.updates_for(a_id);
    let purge = a_updates.last().unwrap();
    assert!(purge.markers_to_add.is_empty());
    assert_eq!(purge.marker_ids_to_remove.len(), 1);
    assert!(marker_belongs_to(&purge.marker_ids_to_remove[0], b_id));
    assert_eq!(service.active_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_purge_targets_only_the_departed_entitys_ids() {
    // Three entities; B leaves; A's stored set must keep C's marker id and
    // lose exactly B's.
    let (service, tx) = make_service();
    let a = entity("a", 0.0, 0.0);
    let b = entity("b", 10.0, 0.0);
    let c = entity("c", 20.0, 0.0);
    let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
    service.on_connect(a).await;
    service.on_connect(b).await;
    service.on_connect(c).await;
    run_passes(&service, 1).await;

    service.on_disconnect(b_id).await;

    let purge = tx.updates_for(a_id).last().cloned().unwrap();
    assert!(purge
        .marker_ids_to_remove
        .iter()
        .all(|id| marker_belongs_to(id, b_id)));

    let remaining = service.engine().previous_ids(&a_id).unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.iter().all(|id| marker_belongs_to(id, c_id)));
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_entity_vanishes_from_subsequent_ticks() {
    // B leaves while C stays, so A's post-disconnect tick still carries a
    // real update; nothing in it may reference B.
    let (service, tx) = make_service();
    let a = entity("a", 0.0, 0.0);
    let b = entity("b", 10.0, 0.0);
    let c = entity("c", 20.0, 0.0);
    let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
    service.on_connect(a).await;
    service.on_connect(b).await;
    service.on_connect(c).await;
    run_passes(&service, 1).await;
    service.on_disconnect(b_id).await;

    run_passes(&service, 1).await;

    let last = tx.updates_for(a_id).last().cloned().unwrap();
    assert_eq!(last.markers_to_add.len(), 1);
    assert!(marker_belongs_to(&last.markers_to_add[0].id, c_id));
    assert!(last
        .marker_ids_to_remove
        .iter()
        .all(|id| !marker_belongs_to(id, b_id)));
}

#[tokio::test(start_paused = true)]
async fn test_distance_labels_refresh_as_entities_move() {
    let (service, tx) = make_service();
    let a = entity("a", 0.0, 0.0);
    let b = entity("b", 10.0, 0.0);
    let a_id = a.id();
    service.on_connect(a).await;
    service.on_connect(b.clone()).await;
    run_passes(&service, 1).await;

    // B moves between passes; the live position handle is read fresh.
    b.set_position(Position::new(100.0, 64.0, 0.0));
    run_passes(&service, 1).await;

    let a_updates = tx.updates_for(a_id);
    assert_eq!(a_updates[0].markers_to_add[0].label, "b (10m)");
    assert_eq!(
        a_updates.last().unwrap().markers_to_add[0].label,
        "b (100m)"
    );
}
