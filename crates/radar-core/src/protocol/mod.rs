//! Protocol module containing the outbound message types and the binary codec.

pub mod codec;
pub mod messages;
pub mod tick;

pub use codec::{decode_update, encode_update, encode_update_now, ProtocolError};
pub use messages::{MarkerUpdateMessage, MessageType, HEADER_SIZE, PROTOCOL_VERSION};
pub use tick::TickCounter;
