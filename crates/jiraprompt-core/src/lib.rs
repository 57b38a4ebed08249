//! # jiraprompt-core
//!
//! Core types, traits, configuration, and error handling for jiraprompt:
//! the prompt library, its CSV codec, the redaction pass, and the popup
//! readiness rules.

pub mod config;
pub mod csv;
pub mod error;
pub mod popup;
pub mod prompt;
pub mod redact;
pub mod traits;

pub use config::shellexpand;
