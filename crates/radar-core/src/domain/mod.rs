//! Domain module containing pure value types with no I/O dependencies.

pub mod entity;
pub mod marker;

pub use entity::{EntityId, EntityRef, Position, SharedPosition};
pub use marker::Marker;
