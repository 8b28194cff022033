// SPDX-License-Identifier: MIT OR Apache-2.0

//! The leveled logging macros and the functions they expand to.
//!
//! Each macro takes a logger and then one of three shapes:
//!
//! * a template and its arguments: `info!(logger, "loaded %d items", count)`;
//! * only an error: `error!(logger, err = &e)`;
//! * an error, a template and arguments: `error!(logger, err = &e, "while loading %s", path)`.
//!
//! Arguments are converted with [`Arg::from`](crate::Arg), so anything with a `From` impl into
//! [`Arg`](crate::Arg) can be passed directly.
//!
//! ```rust
//! use std::sync::Arc;
//! use scopedlog::{InMemoryConsole, LogContext, MethodScopedLogger};
//!
//! let console = Arc::new(InMemoryConsole::new());
//! let context = Arc::new(LogContext::builder().console(console.clone()).build());
//! let logger = MethodScopedLogger::new_in(&context, "Importer", false).into_logger();
//!
//! let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
//! scopedlog::info!(logger, "importing %d rows from %s", 12, "a.csv");
//! scopedlog::error!(logger, err = &missing, "giving up on %s", "b.csv");
//! scopedlog::wtf!(logger, err = &missing);
//!
//! assert_eq!(
//!     console.drain_logs(),
//!     "I/[scopedlog]: [Class Importer] importing 12 rows from a.csv\n\
//!      E/[scopedlog]: [Class Importer] giving up on b.csv :: no such file\n\
//!      A/[scopedlog]: [Class Importer]  :: no such file"
//! );
//! ```

use std::error::Error as StdError;

use crate::arg::Arg;
use crate::level::Level;
use crate::logger::Logger;

/// Anything the macros accept after `err =`.
///
/// Implemented for every sized error type and for `dyn Error` trait objects, so both `&io_error`
/// and `&*boxed_error` work.
pub trait AsDynError {
    fn as_dyn_error(&self) -> &(dyn StdError + '_);
}

impl<E: StdError> AsDynError for E {
    fn as_dyn_error(&self) -> &(dyn StdError + '_) {
        self
    }
}

impl AsDynError for dyn StdError + '_ {
    fn as_dyn_error(&self) -> &(dyn StdError + '_) {
        self
    }
}

impl AsDynError for dyn StdError + Send + Sync + '_ {
    fn as_dyn_error(&self) -> &(dyn StdError + '_) {
        self
    }
}

#[inline]
pub fn log(logger: &Logger, level: Level, template: &str, args: &[Arg]) {
    logger.log(level, None, template, args);
}

#[inline]
pub fn log_error<E: AsDynError + ?Sized>(
    logger: &Logger,
    level: Level,
    error: &E,
    template: &str,
    args: &[Arg],
) {
    logger.log(level, Some(error.as_dyn_error()), template, args);
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:expr, $logger:expr, err = $err:expr $(,)?) => {
        $crate::hidden::log_error(&$logger, $level, $err, "", &[])
    };
    ($level:expr, $logger:expr, err = $err:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::hidden::log_error(
            &$logger,
            $level,
            $err,
            $template,
            &[$($crate::Arg::from($arg)),*],
        )
    };
    ($level:expr, $logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::hidden::log(&$logger, $level, $template, &[$($crate::Arg::from($arg)),*])
    };
}

/// Logs at [`Level::Verbose`](crate::Level::Verbose).
#[macro_export]
macro_rules! verbose {
    ($($args:tt)*) => { $crate::__log_at!($crate::Level::Verbose, $($args)*) };
}

/// Logs at [`Level::Debug`](crate::Level::Debug).
#[macro_export]
macro_rules! debug {
    ($($args:tt)*) => { $crate::__log_at!($crate::Level::Debug, $($args)*) };
}

/// Logs at [`Level::Info`](crate::Level::Info).
#[macro_export]
macro_rules! info {
    ($($args:tt)*) => { $crate::__log_at!($crate::Level::Info, $($args)*) };
}

/// Logs at [`Level::Warn`](crate::Level::Warn).
#[macro_export]
macro_rules! warn {
    ($($args:tt)*) => { $crate::__log_at!($crate::Level::Warn, $($args)*) };
}

/// Logs at [`Level::Error`](crate::Level::Error).
#[macro_export]
macro_rules! error {
    ($($args:tt)*) => { $crate::__log_at!($crate::Level::Error, $($args)*) };
}

/// Logs at [`Level::Wtf`](crate::Level::Wtf), for conditions that should never happen.
#[macro_export]
macro_rules! wtf {
    ($($args:tt)*) => { $crate::__log_at!($crate::Level::Wtf, $($args)*) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::InMemoryConsole;
    use crate::context::LogContext;
    use crate::sink::SinkLogger;
    use std::sync::Arc;

    #[test]
    fn boxed_errors_are_accepted() {
        let console = Arc::new(InMemoryConsole::new());
        let context = Arc::new(LogContext::builder().console(console.clone()).build());
        let logger = SinkLogger::new_in(&context).into_logger();

        let boxed: Box<dyn StdError + Send + Sync> = "bad input".into();
        crate::warn!(logger, err = &*boxed, "line %d", 3u8);
        crate::debug!(&logger, "trailing comma %s", 'x',);
        assert_eq!(
            console.drain_logs(),
            "W/[scopedlog]: line 3 :: bad input\nD/[scopedlog]: trailing comma x"
        );
    }
}
