//! Offline Sync Server Library
//!
//! Per-user push/pull synchronization with caller-directed conflict
//! resolution. The binary in main.rs wires these modules to the environment.
//!
//! # Modules
//!
//! - `sync`: protocol types and the push / pull / resolve service
//! - `store`: the `RecordStore` trait and its file, SQLite and memory backings
//! - `routes`: axum routers for the HTTP surface

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
pub mod sync;

pub use routes::app;
pub use state::AppState;
