//! FILENAME: pivot-tree/src/logging.rs
// PURPOSE: Category-tagged logging macros on top of the `log` facade.
// The category becomes the log target so hosts can filter per subsystem.

macro_rules! log_trace {
    ($cat:expr, $($arg:tt)*) => {
        log::trace!(target: $cat, $($arg)*)
    };
}

macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        log::debug!(target: $cat, $($arg)*)
    };
}

macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        log::warn!(target: $cat, $($arg)*)
    };
}
