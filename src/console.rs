// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console destinations.
//!
//! The console is the platform log the sink writes every passing message to. It receives lines
//! in the `(priority, tag, message)` shape of a system logger; the sink has already composed the
//! tag (library tag plus global prefix) and the message (local prefix plus formatted body).
//!
//! Two implementations ship with the crate:
//!
//! * [`StdErrorConsole`], the default, prints `L/tag: message` lines to stderr.
//! * [`InMemoryConsole`] keeps lines in memory, for tests and for showing logs inside an app.
//!
//! ```rust
//! use scopedlog::{Console, InMemoryConsole, Level};
//!
//! let console = InMemoryConsole::new();
//! console.write(Level::Info, "[scopedlog]", "[Class Worker] started");
//! assert_eq!(console.drain_logs(), "I/[scopedlog]: [Class Worker] started");
//! ```

use std::fmt::{Debug, Display, Formatter};
use std::io::Write;

use parking_lot::Mutex;

use crate::level::Level;

/// Console tag of every line this library writes; the global tag prefix follows it.
pub const LIBRARY_TAG: &str = "[scopedlog]";
/// Console tag of the library's own diagnostics: internal faults and persistence notices.
pub const LIBRARY_FAULT_TAG: &str = "[LIB-scopedlog]";

/// A destination for console lines.
pub trait Console: Debug + Send + Sync {
    /**
    Writes one line.

    Called synchronously from the logging thread. Implementations must not panic; a line that
    cannot be written is dropped.
    */
    fn write(&self, level: Level, tag: &str, message: &str);
}

/*
Boilerplate notes.

# Console

Clone on a console makes little sense; it owns a destination.
PartialEq/Eq would be unclear between data equality and destination identity, so none.
Default depends on the implementation.
Send/Sync are required since one console serves every thread.
*/

/// Writes `L/tag: message` lines to stderr, holding the stderr lock for the whole line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StdErrorConsole;

impl StdErrorConsole {
    pub const fn new() -> Self {
        StdErrorConsole
    }
}

impl Console for StdErrorConsole {
    fn write(&self, level: Level, tag: &str, message: &str) {
        let mut lock = std::io::stderr().lock();
        let _ = writeln!(lock, "{}/{tag}: {message}", level.mnemonic());
    }
}

/// One line captured by an [`InMemoryConsole`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsoleLine {
    pub level: Level,
    pub tag: String,
    pub message: String,
}

impl Display for ConsoleLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}: {}", self.level.mnemonic(), self.tag, self.message)
    }
}

/**
Keeps console lines in memory.

Useful in tests, or where stderr is not visible and lines are collected for display later.

```rust
use std::sync::Arc;
use scopedlog::{InMemoryConsole, Level, LogContext, MethodScopedLogger};

let console = Arc::new(InMemoryConsole::new());
let context = Arc::new(LogContext::builder().console(console.clone()).build());
let logger = MethodScopedLogger::new_in(&context, "Worker", false).into_logger();
logger.info("ready", &[]);

let lines = console.drain_lines();
assert_eq!(lines[0].level, Level::Info);
assert_eq!(lines[0].message, "[Class Worker] ready");
```
*/
#[derive(Debug, Default)]
pub struct InMemoryConsole {
    lines: Mutex<Vec<ConsoleLine>>,
}

impl InMemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all captured lines and returns them rendered, one per line.
    pub fn drain_logs(&self) -> String {
        let mut lines = self.lines.lock();
        let result = lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        lines.clear();
        result
    }

    /// Removes all captured lines and returns them.
    pub fn drain_lines(&self) -> Vec<ConsoleLine> {
        std::mem::take(&mut *self.lines.lock())
    }

    /// Moves all captured lines to stderr.
    pub fn drain_to_console(&self) {
        let mut lines = self.lines.lock();
        for line in lines.iter() {
            StdErrorConsole.write(line.level, &line.tag, &line.message);
        }
        lines.clear();
    }
}

impl Console for InMemoryConsole {
    fn write(&self, level: Level, tag: &str, message: &str) {
        self.lines.lock().push(ConsoleLine {
            level,
            tag: tag.to_string(),
            message: message.to_string(),
        });
    }
}
