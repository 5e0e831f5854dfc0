//! Player-Radar outbound protocol message types.
//!
//! The server only ever pushes one kind of message to a client: a compass
//! marker update carrying additions and retirements together. The type-code
//! space is laid out with room for future control messages.

use serde::{Deserialize, Serialize};

use crate::domain::marker::Marker;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Total size of the common message header in bytes.
pub const HEADER_SIZE: usize = 24;

// ── Message type codes ────────────────────────────────────────────────────────

/// Message type codes carried in the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// Compass marker add/remove update (0x10).
    MarkerUpdate = 0x10,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x10 => Ok(MessageType::MarkerUpdate),
            _ => Err(()),
        }
    }
}

// ── Marker update ─────────────────────────────────────────────────────────────

/// MARKER_UPDATE (0x10): one viewer's compass delta for one pass.
///
/// The client applies `marker_ids_to_remove` before `markers_to_add`, so a
/// full refresh (every previous id retired, every current marker re-added)
/// travels as a single message. Removing an unknown id and adding a duplicate
/// id are both no-ops client-side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkerUpdateMessage {
    /// Fresh markers to display, one per visible entity.
    pub markers_to_add: Vec<Marker>,
    /// Ids from the viewer's previous pass that must disappear.
    pub marker_ids_to_remove: Vec<String>,
}

impl MarkerUpdateMessage {
    pub fn new(markers_to_add: Vec<Marker>, marker_ids_to_remove: Vec<String>) -> Self {
        Self {
            markers_to_add,
            marker_ids_to_remove,
        }
    }

    /// An update that only retires markers, e.g. after a disconnect.
    pub fn removal_only(marker_ids_to_remove: Vec<String>) -> Self {
        Self {
            markers_to_add: Vec::new(),
            marker_ids_to_remove,
        }
    }

    /// `true` when there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.markers_to_add.is_empty() && self.marker_ids_to_remove.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
