//! Logging facilities.
//!
//! The macros below prefix messages with the current simulation time and the name of the context
//! they are called with, e.g. `[12.500 DEBUG clerk] served customer 3`. Messages go to the [`log`]
//! facade with the context name as the target, so they can be filtered per context with
//! `env_logger` and similar loggers.
//!
//! The context argument is anything exposing `time()` and `name()`, in practice a
//! [`SimulationContext`](crate::SimulationContext).

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with_ctx {
    ($level:expr, $label:expr, $ctx:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::colored::Colorize;
        let ctx = &$ctx;
        $crate::__log::log!(
            target: ctx.name(),
            $level,
            "[{:.3} {} {}] {}",
            ctx.time(),
            $label,
            ctx.name(),
            format_args!($($arg)+)
        );
    }};
}

/// Logs a message at the trace level.
#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::__log_with_ctx!($crate::__log::Level::Trace, "TRACE".blue(), $ctx, $($arg)+)
    };
}

/// Logs a message at the debug level.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::__log_with_ctx!($crate::__log::Level::Debug, "DEBUG".cyan(), $ctx, $($arg)+)
    };
}

/// Logs a message at the info level.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::__log_with_ctx!($crate::__log::Level::Info, "INFO".green(), $ctx, $($arg)+)
    };
}

/// Logs a message at the warn level.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::__log_with_ctx!($crate::__log::Level::Warn, "WARN".yellow(), $ctx, $($arg)+)
    };
}

/// Logs a message at the error level.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::__log_with_ctx!($crate::__log::Level::Error, "ERROR".red(), $ctx, $($arg)+)
    };
}
