//! Level macros, in the spirit of the teacher's `pr_info!`/`pr_err!` family:
//! one macro per severity, each expanding to a pre-filtered write.
//!
//! Unlike `pr_info!`, these don't format a string up front — `format_args!`
//! would defeat the allocation-free contract. Instead each macro begins a
//! record on the given logger, appends its trailing arguments through
//! [`crate::logger::Loggable`], and submits; `begin_record` already performs
//! the "skip if below the effective level" check from §4.2 step 1.

/// Core expansion shared by every level macro.
#[macro_export]
macro_rules! __swiftlog_record {
    ($level:expr, $logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        if let Some(mut __builder) = $logger.begin_record($level, Some($template)) {
            $( __builder.append($arg); )*
            __builder.submit();
        }
    }};
}

/// Logs at [`Level::Trace`](crate::level::Level::Trace).
#[macro_export]
macro_rules! trace {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::__swiftlog_record!($crate::level::Level::Trace, $logger, $template $(, $arg)*)
    };
}

/// Logs at [`Level::Debug`](crate::level::Level::Debug).
#[macro_export]
macro_rules! debug {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::__swiftlog_record!($crate::level::Level::Debug, $logger, $template $(, $arg)*)
    };
}

/// Logs at [`Level::Info`](crate::level::Level::Info).
#[macro_export]
macro_rules! info {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::__swiftlog_record!($crate::level::Level::Info, $logger, $template $(, $arg)*)
    };
}

/// Logs at [`Level::Warn`](crate::level::Level::Warn).
#[macro_export]
macro_rules! warn {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::__swiftlog_record!($crate::level::Level::Warn, $logger, $template $(, $arg)*)
    };
}

/// Logs at [`Level::Error`](crate::level::Level::Error).
#[macro_export]
macro_rules! error {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::__swiftlog_record!($crate::level::Level::Error, $logger, $template $(, $arg)*)
    };
}

/// Logs at [`Level::Fatal`](crate::level::Level::Fatal).
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::__swiftlog_record!($crate::level::Level::Fatal, $logger, $template $(, $arg)*)
    };
}
