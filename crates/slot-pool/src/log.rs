//! Diagnostic logging.
//!
//! The pool reports what it does through a [`Logger`] installed once with
//! [`set_logger`]. Until one is installed every message is discarded. The
//! pool logs from whatever context calls it, including interrupt handlers,
//! so a logger must not block or allocate.

use core::fmt;

use spin::Once;

macro_rules! log {
    ($level:expr, $($arg:tt)*) => {
        $crate::log::log($level, format_args!($($arg)*))
    };
}

macro_rules! trace {
    ($($arg:tt)*) => {
        log!($crate::log::LogLevel::Trace, $($arg)*)
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        log!($crate::log::LogLevel::Debug, $($arg)*)
    };
}

macro_rules! error {
    ($($arg:tt)*) => {
        log!($crate::log::LogLevel::Error, $($arg)*)
    };
}

/// Receives log messages emitted by the pool.
pub trait Logger: Sync {
    fn log(&self, level: LogLevel, message: fmt::Arguments<'_>);
}

static LOGGER: Once<&'static dyn Logger> = Once::new();

/// Installs the process-wide logger.
///
/// Returns `false` if a logger was already installed; the first one stays.
pub fn set_logger(logger: &'static dyn Logger) -> bool {
    let mut installed = false;
    LOGGER.call_once(|| {
        installed = true;
        logger
    });
    installed
}

pub(crate) fn log(level: LogLevel, message: fmt::Arguments<'_>) {
    if let Some(logger) = LOGGER.get() {
        logger.log(level, message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Error => "ERROR",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    pub(crate) struct CaptureLogger {
        messages: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Logger for CaptureLogger {
        fn log(&self, level: LogLevel, message: fmt::Arguments<'_>) {
            self.messages
                .lock()
                .unwrap()
                .push((level, format!("{message}")));
        }
    }

    impl CaptureLogger {
        pub(crate) fn contains(&self, level: LogLevel, needle: &str) -> bool {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .any(|(l, m)| *l == level && m.contains(needle))
        }
    }

    static CAPTURE: CaptureLogger = CaptureLogger {
        messages: Mutex::new(Vec::new()),
    };

    /// Installs the capturing logger shared by every test in the crate.
    pub(crate) fn capture_logs() -> &'static CaptureLogger {
        set_logger(&CAPTURE);
        &CAPTURE
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::capture_logs, *};

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", LogLevel::Trace), "TRACE");
        assert_eq!(format!("{}", LogLevel::Debug), "DEBUG");
        assert_eq!(format!("{}", LogLevel::Error), "ERROR");
    }

    #[test]
    fn test_level_order() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Error);
    }

    #[test]
    fn test_macros_reach_installed_logger() {
        let logs = capture_logs();
        trace!("message {}", 17);
        error!("message {}", 23);
        assert!(logs.contains(LogLevel::Trace, "message 17"));
        assert!(logs.contains(LogLevel::Error, "message 23"));
        assert!(!logs.contains(LogLevel::Debug, "message 17"));
    }

    #[test]
    fn test_second_logger_is_rejected() {
        struct Discard;
        impl Logger for Discard {
            fn log(&self, _level: LogLevel, _message: fmt::Arguments<'_>) {}
        }
        static DISCARD: Discard = Discard;

        capture_logs();
        assert!(!set_logger(&DISCARD));
    }
}
