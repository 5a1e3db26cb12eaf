//! HTTP server for the esport arena platform.
//!
//! Exposes the `esport_arena` operations as a JSON API. The binary in
//! `main.rs` wires configuration, logging, metrics and the PostgreSQL store;
//! the router itself is store-agnostic so it can be driven in tests.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
