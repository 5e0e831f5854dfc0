//! Channel-based outbound transport.
//!
//! The host process owns the real network connections. For each entity it
//! hands the radar an opaque *packet writer*: a bounded `mpsc::Sender` of
//! encoded frames. [`ChannelTransport`] implements the application layer's
//! [`MarkerTransport`] seam on top of those writers — it encodes a
//! [`MarkerUpdateMessage`] into a wire frame and pushes it onto the viewer's
//! queue without ever blocking.
//!
//! Delivery is fire-and-forget: a full queue or a closed connection is a
//! per-viewer failure reported back to the diff engine, which logs it and
//! moves on. One slow or dead client can never stall the broadcast pass for
//! everyone else.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use radar_core::{encode_update_now, EntityId, MarkerUpdateMessage, ProtocolError};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::diff_markers::MarkerTransport;

/// The host-provided outbound packet queue for one connection.
pub type PacketSender = mpsc::Sender<Vec<u8>>;

/// Error type for outbound delivery.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No packet writer is registered for this entity.
    #[error("no connection registered for entity {0}")]
    NotConnected(EntityId),

    /// The outbound queue is full; the frame was dropped.
    #[error("outbound queue full for entity {0}")]
    QueueFull(EntityId),

    /// The receive side of the connection is gone.
    #[error("connection closed for entity {0}")]
    Closed(EntityId),

    /// The update could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[from] ProtocolError),
}

/// Outbound transport multiplexing marker updates onto per-entity packet queues.
#[derive(Default)]
pub struct ChannelTransport {
    connections: RwLock<HashMap<EntityId, PacketSender>>,
    /// Wire sequence numbers, one stream across all connections.
    sequence: AtomicU64,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the packet writer for a newly connected entity.
    pub fn register_connection(&self, entity: EntityId, sender: PacketSender) {
        self.connections_write().insert(entity, sender);
    }

    /// Drops the packet writer for a departed entity. No-op if unknown.
    pub fn unregister_connection(&self, entity: &EntityId) {
        self.connections_write().remove(entity);
    }

    /// Number of registered connections, for observability.
    pub fn connection_count(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Encodes `update` and queues it for `viewer` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the viewer has no registered connection,
    /// the frame cannot be encoded, or the queue rejects the frame.
    pub fn try_deliver(
        &self,
        viewer: EntityId,
        update: &MarkerUpdateMessage,
    ) -> Result<(), TransportError> {
        let sender = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&viewer)
            .cloned()
            .ok_or(TransportError::NotConnected(viewer))?;

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let frame = encode_update_now(update, seq)?;
        let frame_len = frame.len();

        sender.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull(viewer),
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed(viewer),
        })?;

        debug!(viewer = %viewer, seq, bytes = frame_len, "queued compass frame");
        Ok(())
    }

    fn connections_write(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<EntityId, PacketSender>> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MarkerTransport for ChannelTransport {
    async fn send_update(
        &self,
        viewer: EntityId,
        update: MarkerUpdateMessage,
    ) -> Result<(), String> {
        self.try_deliver(viewer, &update).map_err(|e| e.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
