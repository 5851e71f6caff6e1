//! docchat-core
//!
//! Pure domain types, prompt assembly, and the process-local
//! conversation state (document store, conversation memory).
//! No HTTP or model-backend dependency — this is the shared
//! vocabulary of the docchat system.

pub mod memory;
pub mod models;
pub mod prompt;
pub mod store;
