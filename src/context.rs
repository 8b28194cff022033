// SPDX-License-Identifier: MIT OR Apache-2.0

//! The state every logger shares.
//!
//! A [`LogContext`] bundles the persistent tag registry, the console threshold, the package used
//! for full traces, file persistence, and the collaborators the loggers talk to: the
//! [`Console`], the [`CallStackCapture`] and the [`Clock`].
//!
//! # The global context
//!
//! Loggers built without an explicit context use the process-wide one returned by
//! [`global_context`]. It is created on first use with the default collaborators
//! ([`StdErrorConsole`], [`BacktraceCapture`], [`SystemClock`]) and lives for the rest of the
//! process.
//!
//! ```
//! use scopedlog::global_context;
//!
//! let context = global_context();
//! let id = context.add_persistent_tag("SESSION", "a1");
//! assert!(context.tags().current_prefix().contains("[SESSION a1]"));
//! context.remove_persistent_tag(id);
//! ```
//!
//! # Independent contexts
//!
//! Tests, and hosts that need isolated logging, build their own context and hand it to the
//! `*_in` constructors of the loggers.
//!
//! ```
//! use std::sync::Arc;
//! use scopedlog::{InMemoryConsole, LogContext, MethodScopedLogger};
//!
//! let console = Arc::new(InMemoryConsole::new());
//! let context = Arc::new(LogContext::builder().console(console.clone()).build());
//! context.add_persistent_tag("USER", "42");
//!
//! let logger = MethodScopedLogger::new_in(&context, "Worker", false).into_logger();
//! logger.warn("disk at %d%%", &[91.into()]);
//! assert_eq!(
//!     console.drain_logs(),
//!     "W/[scopedlog][USER 42]: [Class Worker] disk at 91%"
//! );
//! ```

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use crate::clock::{Clock, SystemClock};
use crate::config::{AppContext, InitOptions};
use crate::console::{Console, LIBRARY_FAULT_TAG, StdErrorConsole};
use crate::error::Error;
use crate::format::format_message;
use crate::level::Level;
use crate::persistence::FilePersistence;
use crate::stack::{BacktraceCapture, CallStack, CallStackCapture};
use crate::tags::{RemoveStatus, TagId, TagRegistry};

/// Settings replaced wholesale by [`LogContext::initialize`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Settings {
    min_console_level: Level,
    package_name: Option<String>,
}

/// Shared logging state. See the [module docs](self).
#[derive(Debug)]
pub struct LogContext {
    tags: TagRegistry,
    settings: ArcSwap<Settings>,
    persistence: FilePersistence,
    console: Arc<dyn Console>,
    capture: Arc<dyn CallStackCapture>,
    clock: Arc<dyn Clock>,
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a [`LogContext`] with injected collaborators.
#[derive(Debug, Default)]
pub struct LogContextBuilder {
    console: Option<Arc<dyn Console>>,
    capture: Option<Arc<dyn CallStackCapture>>,
    clock: Option<Arc<dyn Clock>>,
}

impl LogContextBuilder {
    pub fn console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }

    pub fn capture(mut self, capture: Arc<dyn CallStackCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> LogContext {
        let console = self.console.unwrap_or_else(|| Arc::new(StdErrorConsole));
        let capture = self.capture.unwrap_or_else(|| Arc::new(BacktraceCapture::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        LogContext {
            tags: TagRegistry::new(),
            settings: ArcSwap::from_pointee(Settings::default()),
            persistence: FilePersistence::new(clock.clone(), console.clone()),
            console,
            capture,
            clock,
        }
    }
}

impl LogContext {
    /// A context with the default collaborators.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> LogContextBuilder {
        LogContextBuilder::default()
    }

    /**
    Configures the library for the host application.

    * The console threshold becomes `options.min_console_level`.
    * Full traces are enabled for `app.package_name` when `options.enable_full_trace` is set,
      and disabled otherwise.
    * With `options.persist_to_file`, persistence is initialized (the directory is chosen only
      once) at `options.min_persistence_level`; without it, persistence is turned off.
    */
    pub fn initialize(&self, app: &AppContext, options: InitOptions) {
        self.settings.store(Arc::new(Settings {
            min_console_level: options.min_console_level,
            package_name: options
                .enable_full_trace
                .then(|| app.package_name.clone()),
        }));
        if options.persist_to_file {
            self.persistence.init(app, options.min_persistence_level);
        } else {
            self.persistence.deactivate();
        }
    }

    /// Initializes file persistence at [`Level::Verbose`], leaving everything else unchanged.
    #[deprecated(note = "use `initialize` with `InitOptions::with_persist_to_file`")]
    pub fn init_persistence(&self, app: &AppContext) {
        self.persistence.init(app, Level::Verbose);
    }

    /// Enables full traces for `app.package_name`, leaving everything else unchanged.
    #[deprecated(note = "use `initialize` with `InitOptions::with_full_trace`")]
    pub fn init_full_trace(&self, app: &AppContext) {
        self.settings.rcu(|settings| Settings {
            package_name: Some(app.package_name.clone()),
            ..Settings::clone(settings)
        });
    }

    /// Returns everything to its freshly built state: no tags, default settings, no persistence.
    pub fn reset(&self) {
        self.tags.clear();
        self.settings.store(Arc::new(Settings::default()));
        self.persistence.reset();
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn add_persistent_tag<'a>(
        &self,
        key: impl Into<Option<&'a str>>,
        value: impl Into<Option<&'a str>>,
    ) -> Option<TagId> {
        self.tags.add(key, value)
    }

    pub fn remove_persistent_tag(&self, id: Option<TagId>) -> RemoveStatus {
        self.tags.remove(id)
    }

    pub fn remove_all_persistent_tags_from_key<'a>(
        &self,
        key: impl Into<Option<&'a str>>,
    ) -> usize {
        self.tags.remove_all_by_key(key)
    }

    pub fn clear_persistent_tags(&self) -> usize {
        self.tags.clear()
    }

    /// Persisted log files, oldest first; `None` until persistence has been initialized.
    pub fn log_files(&self) -> Option<Vec<PathBuf>> {
        self.persistence.log_files()
    }

    pub fn min_console_level(&self) -> Level {
        self.settings.load().min_console_level
    }

    /// The package full traces are filtered by, when full traces are enabled.
    pub fn package_name(&self) -> Option<String> {
        self.settings.load().package_name.clone()
    }

    pub fn console(&self) -> &dyn Console {
        &*self.console
    }

    pub fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    pub(crate) fn persistence(&self) -> &FilePersistence {
        &self.persistence
    }

    pub(crate) fn capture_stack(&self) -> Result<CallStack, Error> {
        self.capture.capture()
    }

    /// Writes a library fault to the console, tagged so it stands apart from application logs.
    pub(crate) fn report_fault(&self, origin: &str, fault: &Error) {
        self.console.write(
            Level::Wtf,
            LIBRARY_FAULT_TAG,
            &format_message(Some(fault), origin, &[]),
        );
    }
}

static GLOBAL_CONTEXT: OnceLock<Arc<LogContext>> = OnceLock::new();

/// The process-wide context, created with default collaborators on first use.
pub fn global_context() -> Arc<LogContext> {
    GLOBAL_CONTEXT
        .get_or_init(|| Arc::new(LogContext::new()))
        .clone()
}
