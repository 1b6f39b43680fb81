use std::fmt;

/// Verbosity level for [`Logger`], ordered from quietest to loudest.
///
/// Maps directly onto the CLI's `-v` flag: 0 is [`LogLevel::Silent`], 3 is
/// [`LogLevel::Debug2`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Silent,
    Info,
    Debug,
    Debug2,
}

impl LogLevel {
    pub fn from_verbosity(level: u8) -> LogLevel {
        match level {
            0 => LogLevel::Silent,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Debug2,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Silent => "silent",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Debug2 => "debug2",
        };
        write!(f, "{}", name)
    }
}

/// A small, injected logger, built once at startup from the CLI's `-v` flag
/// and passed down by value or reference to whatever needs to speak.
///
/// There's no global logging framework here on purpose: every component
/// that wants to log takes a `&Logger` (or a clone) as a constructor
/// argument, the way the rest of the studio threads its configuration.
#[derive(Clone, Debug)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    pub fn new(level: LogLevel) -> Logger {
        Logger { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn info(&self, msg: impl fmt::Display) {
        if self.level >= LogLevel::Info {
            println!("[info] {}", msg);
        }
    }

    pub fn debug(&self, msg: impl fmt::Display) {
        if self.level >= LogLevel::Debug {
            println!("[debug] {}", msg);
        }
    }

    pub fn debug2(&self, msg: impl fmt::Display) {
        if self.level >= LogLevel::Debug2 {
            println!("[debug2] {}", msg);
        }
    }
}

impl Default for Logger {
    fn default() -> Logger {
        Logger::new(LogLevel::Silent)
    }
}
