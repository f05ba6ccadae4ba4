//! Shared building blocks for SubMergeX: the hostname model, run
//! configuration, the command registry and pipeline errors.

pub mod config;
pub mod error;
pub mod hostname;
pub mod macros;

#[doc(hidden)]
pub use tracing as __tracing;
