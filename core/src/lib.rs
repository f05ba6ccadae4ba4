//! # SubMergeX Core
//!
//! The enumeration-and-liveness engine.
//!
//! * **[`process`]**: runs one external command with a deadline and collects its lines.
//! * **[`enumeration`]**: fans a domain out to many producers and merges the results.
//! * **[`liveness`]**: decides which hostnames answer over HTTP(S).
//! * **[`storage`]**: output folder, host list files and the summary report.
//! * **[`tools`]**: binary availability checks.

pub mod enumeration;
pub mod liveness;
pub mod process;
pub mod storage;
pub mod tools;
