// SPDX-License-Identifier: MIT OR Apache-2.0

//! The terminal layer of every logger chain.

use std::sync::Arc;

use crate::context::{LogContext, global_context};
use crate::console::LIBRARY_TAG;
use crate::error::Error;
use crate::logger::{Layer, Logger};
use crate::record::LogRecord;

/**
Writes finished messages to the console and, when persistence is on, to the day's log file.

The console tag is the library tag followed by the current global prefix. The console message is
the chain's local prefix, a space, and the formatted body; the space is left out when no layer
contributed a prefix. The file line carries the global prefix directly before that message.

```rust
use std::sync::Arc;
use scopedlog::{InMemoryConsole, LogContext, SinkLogger};

let console = Arc::new(InMemoryConsole::new());
let context = Arc::new(LogContext::builder().console(console.clone()).build());
context.add_persistent_tag("USER", "42");

let logger = SinkLogger::new_in(&context).into_logger();
logger.info("plain %s", &["message".into()]);
assert_eq!(console.drain_logs(), "I/[scopedlog][USER 42]: plain message");
```
*/
#[derive(Debug, Clone)]
pub struct SinkLogger {
    context: Arc<LogContext>,
}

impl SinkLogger {
    /// A sink on the global context.
    pub fn new() -> Self {
        Self::new_in(&global_context())
    }

    pub fn new_in(context: &Arc<LogContext>) -> Self {
        SinkLogger {
            context: context.clone(),
        }
    }

    pub fn context(&self) -> &Arc<LogContext> {
        &self.context
    }

    pub fn into_logger(self) -> Logger {
        self.into()
    }

    pub(crate) fn emit(&self, record: &LogRecord<'_>) -> Result<(), Error> {
        let level = record.level();
        let to_console = level.passes(self.context.min_console_level());
        let to_file = self.context.persistence().accepts(level);
        if !to_console && !to_file {
            return Ok(());
        }

        let body = record.body();
        let local = record.local_prefix();
        let message = if local.is_empty() {
            body
        } else {
            format!("{local} {body}")
        };
        let global = self.context.tags().current_prefix();

        if to_console {
            self.context
                .console()
                .write(level, &format!("{LIBRARY_TAG}{global}"), &message);
        }
        if to_file {
            self.context
                .persistence()
                .append(level, &format!("{global}{message}"));
        }
        Ok(())
    }
}

impl Default for SinkLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl From<SinkLogger> for Logger {
    fn from(sink: SinkLogger) -> Self {
        Logger::from_layer(Layer::Sink(sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::{AppContext, InitOptions};
    use crate::console::InMemoryConsole;
    use crate::level::Level;
    use chrono::NaiveDate;

    fn context() -> (Arc<LogContext>, Arc<InMemoryConsole>) {
        let console = Arc::new(InMemoryConsole::new());
        let now = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let context = LogContext::builder()
            .console(console.clone())
            .clock(Arc::new(FixedClock::new(now)))
            .build();
        (Arc::new(context), console)
    }

    #[test]
    fn console_threshold_filters() {
        let (context, console) = context();
        let app = AppContext::new("com.app", std::env::temp_dir());
        context.initialize(&app, InitOptions::default().with_min_console_level(Level::Warn));
        let logger = SinkLogger::new_in(&context).into_logger();
        logger.info("dropped", &[]);
        logger.warn("kept", &[]);
        assert_eq!(console.drain_logs(), "W/[scopedlog]: kept");
    }

    #[test]
    fn file_line_carries_global_prefix() {
        let (context, console) = context();
        let dir = tempfile::tempdir().unwrap();
        let app = AppContext::new("com.app", dir.path());
        context.initialize(
            &app,
            InitOptions::default()
                .with_persist_to_file(true)
                .with_min_persistence_level(Level::Error)
                .with_min_console_level(Level::Off),
        );
        context.add_persistent_tag("USER", "42");
        console.drain_lines();

        let logger = SinkLogger::new_in(&context).into_logger();
        logger.info("not persisted", &[]);
        logger.error("persisted", &[]);
        assert!(console.drain_lines().is_empty());

        let files = context.log_files().unwrap();
        assert_eq!(files.len(), 1);
        let contents = std::fs::read_to_string(&files[0]).unwrap();
        assert_eq!(
            contents,
            "2024/05/17 09:00:00 Session Started\n\
             2024/05/17 09:00:00 ERROR/[USER 42]persisted\n"
        );
    }
}
