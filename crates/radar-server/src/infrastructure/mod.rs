//! Infrastructure layer for the radar server.
//!
//! Contains host-facing adapters: the outbound channel transport, the session
//! event pump, and file-system config storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `radar_core`, but MUST NOT be imported by the `application` layer.

pub mod session;
pub mod storage;
pub mod transport;
