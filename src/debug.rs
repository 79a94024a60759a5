use parking_lot::Mutex;
/// Debug logging for the tmux control-mode engine
///
/// Controlled by the DEBUG_LEVEL environment variable:
/// - 0 or unset: No debugging
/// - 1: Errors only
/// - 2: Info level (connection lifecycle, command submission)
/// - 3: Debug level (unmatched blocks, skipped lines, layout reconciliation)
/// - 4: Trace level (every protocol line and notification)
///
/// Output goes to `par_term_tmux_debug.log` in the system temp directory.
/// Control mode shares the terminal with the user, so nothing is ever
/// written to stdout/stderr from here.
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Debug level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    fn from_env() -> Self {
        match std::env::var("DEBUG_LEVEL") {
            Ok(val) => Self::from_value(&val),
            Err(_) => DebugLevel::Off,
        }
    }

    fn from_value(val: &str) -> Self {
        match val.trim().parse::<u8>() {
            Ok(1) => DebugLevel::Error,
            Ok(2) => DebugLevel::Info,
            Ok(3) => DebugLevel::Debug,
            Ok(4) => DebugLevel::Trace,
            _ => DebugLevel::Off,
        }
    }

    fn label(self) -> &'static str {
        match self {
            DebugLevel::Off => "",
            DebugLevel::Error => "ERROR",
            DebugLevel::Info => "INFO ",
            DebugLevel::Debug => "DEBUG",
            DebugLevel::Trace => "TRACE",
        }
    }
}

/// Path of the debug log file
pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("par_term_tmux_debug.log")
}

struct DebugLogger {
    level: DebugLevel,
    file: Option<std::fs::File>,
}

impl DebugLogger {
    fn new() -> Self {
        let level = DebugLevel::from_env();
        if level == DebugLevel::Off {
            return DebugLogger { level, file: None };
        }

        // An unopenable log file silently disables output
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(log_path())
            .ok();

        let mut logger = DebugLogger { level, file };
        logger.write_raw(&format!(
            "\n{}\npar-term-tmux debug session started at {} (level={:?})\n{}\n",
            "=".repeat(80),
            get_timestamp(),
            level,
            "=".repeat(80)
        ));
        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.file {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }

    fn log(&mut self, level: DebugLevel, category: &str, msg: &str) {
        if level == DebugLevel::Off || level > self.level {
            return;
        }
        let line = format!(
            "[{}] [{}] [{}] {}\n",
            get_timestamp(),
            level.label(),
            category,
            msg
        );
        self.write_raw(&line);
    }
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();

fn get_logger() -> &'static Mutex<DebugLogger> {
    LOGGER.get_or_init(|| Mutex::new(DebugLogger::new()))
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Check if debugging is enabled at given level
pub fn is_enabled(level: DebugLevel) -> bool {
    let logger = get_logger().lock();
    level <= logger.level
}

/// Log a message at specified level
pub fn log(level: DebugLevel, category: &str, msg: &str) {
    let mut logger = get_logger().lock();
    logger.log(level, category, msg);
}

/// Log formatted message
pub fn logf(level: DebugLevel, category: &str, args: fmt::Arguments) {
    if is_enabled(level) {
        log(level, category, &format!("{}", args));
    }
}

// Convenience macros for logging
#[macro_export]
macro_rules! debug_error {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Error, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_info {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Info, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_log {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Debug, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_trace {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Trace, $category, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_value() {
        assert_eq!(DebugLevel::from_value("0"), DebugLevel::Off);
        assert_eq!(DebugLevel::from_value(" 3 "), DebugLevel::Debug);
        assert_eq!(DebugLevel::from_value("4"), DebugLevel::Trace);
        assert_eq!(DebugLevel::from_value("verbose"), DebugLevel::Off);
    }

    #[test]
    fn test_level_ordering() {
        assert!(DebugLevel::Error < DebugLevel::Trace);
        assert!(DebugLevel::Off < DebugLevel::Error);
    }
}
