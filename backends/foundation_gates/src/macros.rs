//! Logging macros that forward to `tracing` only when the matching
//! `log_*` feature is enabled, so release builds can compile them out.

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => {
        if cfg!(feature="log_info") {
            tracing::info!($($t)*);
        }
    };
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => {
        if cfg!(feature="log_warnings") {
            tracing::warn!($($t)*);
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => {
        if cfg!(feature="log_debug") {
            tracing::debug!($($t)*);
        }
    };
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => {
        if cfg!(feature="log_errors") {
            tracing::error!($($t)*);
        }
    };
}
