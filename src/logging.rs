#![allow(unused_macros, dead_code)]

//! Logging macros. Events are emitted through `tracing` under the crate's
//! target, only when the `logging` feature is on and the level is enabled.

pub(crate) const TARGET: &str = "keystone10a";

macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        if ::log::log_enabled!(target: $crate::logging::TARGET, ::log::Level::Trace) {
            ::tracing::trace!(target: "keystone10a", $($arg)*);
        }
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        if ::log::log_enabled!(target: $crate::logging::TARGET, ::log::Level::Debug) {
            ::tracing::debug!(target: "keystone10a", $($arg)*);
        }
    };
}

macro_rules! info {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        if ::log::log_enabled!(target: $crate::logging::TARGET, ::log::Level::Info) {
            ::tracing::info!(target: "keystone10a", $($arg)*);
        }
    };
}

macro_rules! warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        if ::log::log_enabled!(target: $crate::logging::TARGET, ::log::Level::Warn) {
            ::tracing::warn!(target: "keystone10a", $($arg)*);
        }
    };
}

macro_rules! error {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        if ::log::log_enabled!(target: $crate::logging::TARGET, ::log::Level::Error) {
            ::tracing::error!(target: "keystone10a", $($arg)*);
        }
    };
}
