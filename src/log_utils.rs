//! Internal logging utilities for consistent log formatting across the library
//!
//! This module provides macros that adapt log messages based on feature flags:
//! - `tracing`: Enable/disable all logging (enabled by default)
//! - `plain-logs`: When enabled with `tracing`, uses plain text prefixes instead of emojis
//!
//! ## Usage
//!
//! ```toml
//! # Default: tracing enabled with emojis
//! dioxus-backend-hooks = "0.1"
//!
//! # Disable all logging
//! dioxus-backend-hooks = { version = "0.1", default-features = false }
//!
//! # Enable tracing with plain text (no emojis)
//! dioxus-backend-hooks = { version = "0.1", features = ["plain-logs"] }
//! ```

/// Internal debug logging macro that respects the tracing feature flag
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
    };
}

/// Logs the start of a new generation
#[macro_export]
macro_rules! log_generation_start {
    ($($arg:tt)*) => {
        #[cfg(all(feature = "tracing", not(feature = "plain-logs")))]
        tracing::debug!("🆕 [GENERATION] {}", format!($($arg)*));
        #[cfg(all(feature = "tracing", feature = "plain-logs"))]
        tracing::debug!("[GENERATION] {}", format!($($arg)*));
    };
}

/// Logs a settled (resolved or rejected) generation
#[macro_export]
macro_rules! log_settled {
    ($($arg:tt)*) => {
        #[cfg(all(feature = "tracing", not(feature = "plain-logs")))]
        tracing::debug!("✅ [SETTLED] {}", format!($($arg)*));
        #[cfg(all(feature = "tracing", feature = "plain-logs"))]
        tracing::debug!("[SETTLED] {}", format!($($arg)*));
    };
}

/// Logs a result that arrived for a superseded generation
#[macro_export]
macro_rules! log_stale_dropped {
    ($($arg:tt)*) => {
        #[cfg(all(feature = "tracing", not(feature = "plain-logs")))]
        tracing::debug!("🗑️ [STALE] {}", format!($($arg)*));
        #[cfg(all(feature = "tracing", feature = "plain-logs"))]
        tracing::debug!("[STALE] {}", format!($($arg)*));
    };
}

/// Logs a subscription being opened
#[macro_export]
macro_rules! log_subscribe {
    ($($arg:tt)*) => {
        #[cfg(all(feature = "tracing", not(feature = "plain-logs")))]
        tracing::debug!("📡 [SUBSCRIBE] {}", format!($($arg)*));
        #[cfg(all(feature = "tracing", feature = "plain-logs"))]
        tracing::debug!("[SUBSCRIBE] {}", format!($($arg)*));
    };
}

/// Logs a subscription being released
#[macro_export]
macro_rules! log_unsubscribe {
    ($($arg:tt)*) => {
        #[cfg(all(feature = "tracing", not(feature = "plain-logs")))]
        tracing::debug!("🧹 [UNSUBSCRIBE] {}", format!($($arg)*));
        #[cfg(all(feature = "tracing", feature = "plain-logs"))]
        tracing::debug!("[UNSUBSCRIBE] {}", format!($($arg)*));
    };
}

/// Logs a one-shot read falling back to another source
#[macro_export]
macro_rules! log_fallback {
    ($($arg:tt)*) => {
        #[cfg(all(feature = "tracing", not(feature = "plain-logs")))]
        tracing::debug!("🔄 [FALLBACK] {}", format!($($arg)*));
        #[cfg(all(feature = "tracing", feature = "plain-logs"))]
        tracing::debug!("[FALLBACK] {}", format!($($arg)*));
    };
}
