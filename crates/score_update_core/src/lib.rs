//! Shared score update primitives.
//!
//! This crate owns the invocation contract (parameters, request context,
//! validation) and object URI handling. It intentionally excludes HTTP
//! transport and Lambda runtime concerns, which live in `score_update_lambda`.

pub mod contract;
pub mod object_uri;
