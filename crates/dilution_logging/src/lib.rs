#![deny(missing_docs)]
//! Shared logging utilities for the dilution workspace.
//!
//! This crate provides the `dilution_*` logging macros used across the codebase,
//! a thread-local trial context that those macros prefix onto every message,
//! and a minimal test initializer for the global logger.

use std::cell::RefCell;

#[doc(hidden)]
pub use log as __log;

thread_local! {
    /// Thread-local label for the trial currently being executed.
    static TRIAL_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Marks the current thread as running trial `trial` for target length `target_tokens`.
/// Every `dilution_*` message logged afterwards carries the label until cleared.
pub fn set_trial_context(target_tokens: usize, trial: u32) {
    TRIAL_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(format!("len={target_tokens} trial={trial}")));
}

/// Removes the trial label from the current thread.
pub fn clear_trial_context() {
    TRIAL_CONTEXT.with(|ctx| *ctx.borrow_mut() = None);
}

/// Returns the prefix the logging macros put in front of a message.
/// Empty when no trial context is set.
pub fn context_prefix() -> String {
    TRIAL_CONTEXT.with(|ctx| match ctx.borrow().as_deref() {
        Some(label) => format!("[{label}] "),
        None => String::new(),
    })
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! dilution_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! dilution_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! dilution_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! dilution_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! dilution_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_empty_without_context() {
        clear_trial_context();
        assert_eq!(context_prefix(), "");
    }

    #[test]
    fn prefix_carries_trial_label_until_cleared() {
        set_trial_context(2000, 3);
        assert_eq!(context_prefix(), "[len=2000 trial=3] ");
        dilution_info!("message with {} context", "trial");
        clear_trial_context();
        assert_eq!(context_prefix(), "");
    }
}
