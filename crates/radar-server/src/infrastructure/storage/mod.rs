//! File-system storage for the radar server.

pub mod config;
