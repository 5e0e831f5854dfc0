//! Session event pump: bridges host connect/disconnect delivery to the service.
//!
//! The host process (the game server runtime) owns sessions. It tells the
//! radar about lifecycle changes by pushing [`SessionEvent`]s onto an mpsc
//! channel; the pump task forwards each one to the matching [`RadarService`]
//! hook. The radar owns no thread of its own for event handling — it reacts
//! on the pump task, which runs in the host's runtime.

use std::sync::Arc;

use radar_core::{EntityId, EntityRef};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::broadcast::RadarService;

/// A session lifecycle notification from the host.
#[derive(Debug)]
pub enum SessionEvent {
    /// An entity connected; the handle carries its live position cell.
    Connected(EntityRef),
    /// An entity disconnected.
    Disconnected(EntityId),
}

/// Spawns the pump task forwarding `events` into `service`.
///
/// The task exits when the host drops the send side of the channel.
pub fn spawn_session_pump(
    service: Arc<RadarService>,
    mut events: mpsc::Receiver<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Connected(entity) => service.on_connect(entity).await,
                SessionEvent::Disconnected(id) => service.on_disconnect(id).await,
            }
        }
        debug!("session event channel closed; pump exiting");
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
