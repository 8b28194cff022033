// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logger handle and the dispatch down a chain of layers.
//!
//! A [`Logger`] is a cheap, clonable, immutable handle to one layer of a chain. Scoped layers
//! ([`MethodScopedLogger`], [`AutoMethodLogger`], [`FullTraceLogger`]) each hold the next layer
//! inward; every chain ends in exactly one [`SinkLogger`]. A logging call walks the chain from
//! the handle it was made on, collecting each layer's prefix, and the sink writes the result.
//!
//! # Failure handling
//!
//! Logging calls return nothing. A fault inside the library (a stack that cannot be captured, a
//! panicking collaborator) is reported once on the console at [`Level::Wtf`] under the
//! [`LIBRARY_FAULT_TAG`](crate::LIBRARY_FAULT_TAG), then the caller's message is written
//! directly to the console under the plain library tag, without the scoped prefix.
//!
//! The one exception is a [`FullTraceLogger`] used while its context has no package configured:
//! that call panics with [`Error::NotInitialized`], since a silently wrong trace is worse than a
//! crash during development.

use std::any::Any;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::arg::Arg;
use crate::auto_method::AutoMethodLogger;
use crate::console::LIBRARY_TAG;
use crate::context::LogContext;
use crate::error::Error;
use crate::format::{format_message, unformatted};
use crate::full_trace::FullTraceLogger;
use crate::level::Level;
use crate::record::LogRecord;
use crate::scoped::MethodScopedLogger;
use crate::sink::SinkLogger;

/// The closed set of layer kinds.
#[derive(Debug)]
pub(crate) enum Layer {
    Sink(SinkLogger),
    MethodScoped(MethodScopedLogger),
    AutoMethod(AutoMethodLogger),
    FullTrace(FullTraceLogger),
}

impl Layer {
    fn name(&self) -> &'static str {
        match self {
            Layer::Sink(_) => "SinkLogger",
            Layer::MethodScoped(_) => "MethodScopedLogger",
            Layer::AutoMethod(_) => "AutoMethodLogger",
            Layer::FullTrace(_) => "FullTraceLogger",
        }
    }

    fn context(&self) -> &Arc<LogContext> {
        match self {
            Layer::Sink(sink) => sink.context(),
            Layer::MethodScoped(logger) => logger.base().context(),
            Layer::AutoMethod(logger) => logger.base().context(),
            Layer::FullTrace(logger) => logger.base().context(),
        }
    }
}

/// Walks the chain from `layer` to the sink, then emits.
fn dispatch(mut layer: &Layer, record: &mut LogRecord<'_>) -> Result<(), Error> {
    loop {
        let (prefix, inner) = match layer {
            Layer::Sink(sink) => return sink.emit(record),
            Layer::MethodScoped(logger) => {
                (logger.base().prefix().to_string(), logger.base().inner())
            }
            Layer::AutoMethod(logger) => (logger.call_prefix(record)?, logger.base().inner()),
            Layer::FullTrace(logger) => (logger.call_prefix(record)?, logger.base().inner()),
        };
        record.push_prefix(prefix);
        layer = inner.layer();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/**
A handle to a logger chain.

Obtained from one of the layer builders via `into_logger()` or `From`. Clones share the chain.

```rust
use std::sync::Arc;
use scopedlog::{InMemoryConsole, Level, LogContext, Logger, MethodScopedLogger};

let console = Arc::new(InMemoryConsole::new());
let context = Arc::new(LogContext::builder().console(console.clone()).build());

let class_logger: Logger = MethodScopedLogger::new_in(&context, "Worker", false).into();
let method_logger = MethodScopedLogger::for_method(&class_logger, "start")
    .unwrap()
    .into_logger();

method_logger.error(
    "Encountered %d errors while doing %s for %.2f seconds",
    &[0.into(), "nothing".into(), 3.237.into()],
);
assert_eq!(
    console.drain_logs(),
    "E/[scopedlog]: [Class Worker][Method start] Encountered 0 errors while doing nothing for 3.24 seconds"
);
```
*/
#[derive(Debug, Clone)]
pub struct Logger {
    layer: Arc<Layer>,
}

impl Default for Logger {
    /// A bare sink on the global context.
    fn default() -> Self {
        SinkLogger::new().into()
    }
}

impl Logger {
    pub(crate) fn from_layer(layer: Layer) -> Self {
        Logger {
            layer: Arc::new(layer),
        }
    }

    pub(crate) fn layer(&self) -> &Layer {
        &self.layer
    }

    /// The context this layer reports to.
    pub fn context(&self) -> &Arc<LogContext> {
        self.layer.context()
    }

    /// Whether two handles share the same layer.
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.layer, &other.layer)
    }

    /// Logs `template` formatted with `args` at `level`, with an optional attached error.
    pub fn log(&self, level: Level, error: Option<&dyn StdError>, template: &str, args: &[Arg]) {
        let mut record = LogRecord::new(level, error, template, args);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| dispatch(&self.layer, &mut record)));
        let fault = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(Error::NotInitialized(what))) => {
                panic!("{}", Error::NotInitialized(what))
            }
            Ok(Err(fault)) => fault,
            Err(payload) => Error::Internal(panic_message(&*payload)),
        };
        let context = self.context();
        context.report_fault(self.layer.name(), &fault);
        let message =
            panic::catch_unwind(AssertUnwindSafe(|| format_message(error, template, args)))
                .unwrap_or_else(|_| unformatted(template, args));
        context.console().write(level, LIBRARY_TAG, &message);
    }

    pub fn verbose(&self, template: &str, args: &[Arg]) {
        self.log(Level::Verbose, None, template, args);
    }

    pub fn verbose_err(&self, error: &dyn StdError, template: &str, args: &[Arg]) {
        self.log(Level::Verbose, Some(error), template, args);
    }

    pub fn debug(&self, template: &str, args: &[Arg]) {
        self.log(Level::Debug, None, template, args);
    }

    pub fn debug_err(&self, error: &dyn StdError, template: &str, args: &[Arg]) {
        self.log(Level::Debug, Some(error), template, args);
    }

    pub fn info(&self, template: &str, args: &[Arg]) {
        self.log(Level::Info, None, template, args);
    }

    pub fn info_err(&self, error: &dyn StdError, template: &str, args: &[Arg]) {
        self.log(Level::Info, Some(error), template, args);
    }

    pub fn warn(&self, template: &str, args: &[Arg]) {
        self.log(Level::Warn, None, template, args);
    }

    pub fn warn_err(&self, error: &dyn StdError, template: &str, args: &[Arg]) {
        self.log(Level::Warn, Some(error), template, args);
    }

    pub fn error(&self, template: &str, args: &[Arg]) {
        self.log(Level::Error, None, template, args);
    }

    /// Logs at [`Level::Error`] with `error` attached. Pass `""` and `&[]` to log only the error.
    pub fn error_err(&self, error: &dyn StdError, template: &str, args: &[Arg]) {
        self.log(Level::Error, Some(error), template, args);
    }

    pub fn wtf(&self, template: &str, args: &[Arg]) {
        self.log(Level::Wtf, None, template, args);
    }

    pub fn wtf_err(&self, error: &dyn StdError, template: &str, args: &[Arg]) {
        self.log(Level::Wtf, Some(error), template, args);
    }
}

/*
Boilerplate notes.

# Logger

Clone is cheap (one Arc) and is how a chain is shared between wrappers.
PartialEq is left out: data equality of chains is unclear, and identity is available as ptr_eq.
Default builds a sink on the global context, the same root a scoped logger gets without an inner.
Send/Sync hold because every layer is immutable once built.
*/
