//! # jiraprompt-providers
//!
//! Chat-completion provider implementations for jiraprompt.

pub mod openai;

pub use openai::OpenAiProvider;
