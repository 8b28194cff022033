// SPDX-License-Identifier: MIT OR Apache-2.0

//! A layer that renders the whole in-package call path on every call.

use std::sync::Arc;

use crate::context::{LogContext, global_context};
use crate::error::Error;
use crate::logger::{Layer, Logger};
use crate::record::LogRecord;
use crate::resolve::resolve_full_trace;
use crate::scoped::ScopedBase;

const NEEDS_PACKAGE: &str = "full-trace logging";

/**
The most detailed layer: every message carries the path from the program's entry down to the
logging call, restricted to frames of the application's package.

Requires full traces to be enabled through [`LogContext::initialize`]; construction fails with
[`Error::NotInitialized`] otherwise. Meant for development builds.

```rust
use std::sync::Arc;
use scopedlog::{
    AppContext, FixedStackCapture, FullTraceLogger, InMemoryConsole, InitOptions, LogContext,
    StackFrame,
};

let frames = Arc::new(FixedStackCapture::new(Vec::new()));
let console = Arc::new(InMemoryConsole::new());
let context = Arc::new(
    LogContext::builder().console(console.clone()).capture(frames.clone()).build(),
);
let app = AppContext::new("shop", std::env::temp_dir());
assert!(FullTraceLogger::new_in(&context).is_err());

context.initialize(&app, InitOptions::default().with_full_trace(true));
let logger = FullTraceLogger::new_in(&context).unwrap().into_logger();

frames.set(vec![
    StackFrame::new("shop::Cart", "total", None),
    StackFrame::new("shop::Cart", "checkout", None),
    StackFrame::new("shop::Main", "main", None),
    StackFrame::new("std::rt", "lang_start", None),
]);
logger.debug("computing", &[]);
assert_eq!(
    console.drain_logs(),
    "D/[scopedlog]: [Class Main][Method main][Class Cart][Method checkout][Method total] computing"
);
```
*/
#[derive(Debug, Clone)]
pub struct FullTraceLogger {
    base: ScopedBase,
}

impl FullTraceLogger {
    /// A root logger on the global context.
    pub fn new() -> Result<Self, Error> {
        Self::new_in(&global_context())
    }

    pub fn new_in(context: &Arc<LogContext>) -> Result<Self, Error> {
        Self::checked(ScopedBase::new(None, context))
    }

    /// Wraps `inner`, reporting to the inner chain's context.
    pub fn wrap(inner: &Logger) -> Result<Self, Error> {
        Self::checked(ScopedBase::wrapping(inner))
    }

    fn checked(base: ScopedBase) -> Result<Self, Error> {
        if base.context().package_name().is_none() {
            return Err(Error::NotInitialized(NEEDS_PACKAGE));
        }
        Ok(FullTraceLogger { base })
    }

    /// Appends `[key value]`; with `require_value`, an absent or empty value is an error.
    pub fn add_tag(
        &mut self,
        key: &str,
        value: Option<&str>,
        require_value: bool,
    ) -> Result<(), Error> {
        self.base.add_tag(key, value, require_value)
    }

    pub fn prefix(&self) -> &str {
        self.base.prefix()
    }

    pub fn into_logger(self) -> Logger {
        self.into()
    }

    pub(crate) fn base(&self) -> &ScopedBase {
        &self.base
    }

    pub(crate) fn call_prefix(&self, record: &LogRecord<'_>) -> Result<String, Error> {
        let package = self
            .base
            .context()
            .package_name()
            .ok_or(Error::NotInitialized(NEEDS_PACKAGE))?;
        let stack = record.stack(self.base.context())?;
        Ok(format!(
            "{}{}",
            self.base.prefix(),
            resolve_full_trace(stack, &package)
        ))
    }
}

impl From<FullTraceLogger> for Logger {
    fn from(logger: FullTraceLogger) -> Self {
        Logger::from_layer(Layer::FullTrace(logger))
    }
}
