//! # radar-core
//!
//! Shared library for Player-Radar containing the domain entities and the
//! outbound wire protocol for HUD compass marker updates.
//!
//! This crate is used by the radar server and by any host process that wants
//! to decode what the server puts on the wire. It has zero dependencies on
//! OS APIs, the async runtime, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! Player-Radar keeps every connected player's on-screen compass in sync with
//! the positions of all other players. Each connected player is both an
//! *entity* (something shown on other players' compasses) and a *viewer*
//! (someone receiving markers for everyone else).
//!
//! This crate defines:
//!
//! - **`domain`** – Pure value types: entity identity, live position, and the
//!   ephemeral [`Marker`] synthesized for one viewer on one tick.
//!
//! - **`protocol`** – How marker updates travel over the wire. An update is
//!   encoded into a compact binary frame (24-byte header + bincode payload)
//!   and decoded back into a typed Rust struct on the other end. The
//!   [`TickCounter`] produces the monotonically increasing tick numbers
//!   embedded in marker ids.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `radar_core::Marker` instead of `radar_core::domain::marker::Marker`.
pub use domain::entity::{EntityId, EntityRef, Position, SharedPosition};
pub use domain::marker::{compose_marker_id, marker_belongs_to, Marker};
pub use protocol::codec::{decode_update, encode_update, encode_update_now, ProtocolError};
pub use protocol::messages::MarkerUpdateMessage;
pub use protocol::tick::TickCounter;
