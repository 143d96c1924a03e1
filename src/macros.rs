//! printf-style convenience macros over [`Logger::log`](crate::Logger::log).
//!
//! Arguments are only formatted when the level passes the logger's filter.
//! The per-level macros evaluate to `true` when the record was queued; `log!`
//! hands back the full [`Outcome`](crate::Outcome) since its level may be FATAL.

/// Submit a message at an explicit level.
///
/// ```rust,no_run
/// # let logger = rotalog::Logger::init(&rotalog::LogConfig::new())?;
/// let _ = rotalog::log!(logger, rotalog::Level::Warn, "disk at {}%", 91);
/// # Ok::<(), rotalog::Error>(())
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, ::std::format_args!($($arg)+))
    };
}

/// Submit a DEBUG message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+).is_accepted()
    };
}

/// Submit an INFO message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+).is_accepted()
    };
}

/// Submit a WARN message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+).is_accepted()
    };
}

/// Submit an ERROR message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+).is_accepted()
    };
}

/// Submit a FATAL message; evaluates to a [`Fatal`](crate::Fatal) once the logger has shut down.
///
/// ```rust,no_run
/// # let logger = rotalog::Logger::init(&rotalog::LogConfig::new())?;
/// rotalog::fatal!(logger, "cannot continue: {}", "config missing").exit();
/// # Ok::<(), rotalog::Error>(())
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatal(::std::format_args!($($arg)+))
    };
}
