//! Status-line macros.
//!
//! Thin wrappers over `tracing` so library code reports progress the same way
//! the terminal formatter expects. `success!` is an `INFO` event on its own
//! target so the formatter can mark it differently.

pub const SUCCESS_TARGET: &str = "submergex::success";

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "submergex::status", $($arg)*)
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "submergex::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::__tracing::warn!(target: "submergex::status", $($arg)*)
    };
}
