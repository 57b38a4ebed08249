//! # jiraprompt-memory
//!
//! Persistent key/value store for jiraprompt (SQLite-backed).

pub mod store;

pub use store::Store;
