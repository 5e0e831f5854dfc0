//! Application layer for the radar server.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules, here in `radar-core`) and the infrastructure
//! (OS/network/storage).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a goal (e.g., "compute and send
//!   the compass delta every connected player should see this tick").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the transport can be swapped without changing this code.
//! - **Contain no OS calls, no network I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`diff_markers`** – Computes, per viewer and per tick, the set of
//!   markers that should exist and the ids from the previous pass that must
//!   be retired, then hands the delta to the transport.  This is the heart
//!   of the system — it runs for every viewer on every tick.
//!
//! - **`track_entities`** – Maintains the concurrency-safe registry of all
//!   currently connected entities and their live position handles.
//!
//! - **`broadcast`** – Drives the diff engine at a fixed cadence, owns the
//!   start/stop lifecycle, and exposes the connect/disconnect hooks the host
//!   process calls.

pub mod broadcast;
pub mod diff_markers;
pub mod track_entities;
