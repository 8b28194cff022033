// SPDX-License-Identifier: MIT OR Apache-2.0

/// Severity of a message, and the threshold type for the console and file sinks.
///
/// Levels are totally ordered: a sink configured with a minimum level accepts every message at
/// or above it. [`Level::Off`] is only meaningful as a threshold and silences the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    /// Chatty diagnostics
    #[default]
    Verbose,
    Debug,
    Info,
    /// Suspicious condition
    Warn,
    /// Runtime error
    Error,
    /// Should never happen; the platform's "assert" priority
    Wtf,
    /// Threshold only: nothing passes
    Off,
}

impl Level {
    /// Upper-case name written into the persisted log file.
    pub const fn name(self) -> &'static str {
        match self {
            Level::Verbose => "VERBOSE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Wtf => "WTF",
            Level::Off => "NONE",
        }
    }

    /// Single-letter priority in the style of logcat (`A` is assert, used for WTF).
    pub const fn mnemonic(self) -> char {
        match self {
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Info => 'I',
            Level::Warn => 'W',
            Level::Error => 'E',
            Level::Wtf => 'A',
            Level::Off => 'S',
        }
    }

    /// Whether a message at `self` passes a sink whose threshold is `min`.
    #[inline]
    pub fn passes(self, min: Level) -> bool {
        self != Level::Off && self >= min
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
