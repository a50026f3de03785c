//! Shared pieces used by every Trawl crate and binary.
//!
//! Right now that is only [`observability`], the single place where the global
//! `tracing` subscriber is installed.
pub mod observability;

pub use observability::{init_logging, LogConfig, LogFormat};
