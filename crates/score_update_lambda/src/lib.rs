//! Lambda handler and backend adapters for the score update function.
//!
//! This crate owns runtime integration details (the handler, the HTTP
//! backend client, environment configuration and logging setup). Contract and
//! URI primitives come from `score_update_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
