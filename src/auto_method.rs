// SPDX-License-Identifier: MIT OR Apache-2.0

//! A layer that works out the calling method on every call.

use std::sync::Arc;

use crate::context::{LogContext, global_context};
use crate::error::Error;
use crate::logger::{Layer, Logger};
use crate::record::LogRecord;
use crate::resolve::{OriginId, TAG_KEY_METHOD, render_tag, resolve_at_depth, resolve_method};
use crate::scoped::ScopedBase;

/**
A class-level logger that tags every message with the method it was logged from.

The class it belongs to is taken from the caller's frame when it is built. Each logging call then
captures the stack and finds the innermost frame of that class, so one instance stored on an
object serves all of its methods. Costs one stack capture per call.

```rust
use std::sync::Arc;
use scopedlog::{AutoMethodLogger, FixedStackCapture, InMemoryConsole, LogContext, StackFrame};

let frames = Arc::new(FixedStackCapture::new(vec![
    StackFrame::new("app::Player", "new", None),
]));
let console = Arc::new(InMemoryConsole::new());
let context = Arc::new(
    LogContext::builder().console(console.clone()).capture(frames.clone()).build(),
);
let logger = AutoMethodLogger::new_in(&context, false).into_logger();

frames.set(vec![
    StackFrame::new("app::Player", "seek", None),
    StackFrame::new("app::Ui", "on_drag", None),
]);
logger.info("to %ds", &[42.into()]);
assert_eq!(console.drain_logs(), "I/[scopedlog]: [Class Player][Method seek] to 42s");
```
*/
#[derive(Debug, Clone)]
pub struct AutoMethodLogger {
    base: ScopedBase,
    origin: Option<OriginId>,
}

impl AutoMethodLogger {
    /// A root logger on the global context for the calling class.
    pub fn new(add_instance_tag: bool) -> Self {
        Self::new_in(&global_context(), add_instance_tag)
    }

    pub fn new_in(context: &Arc<LogContext>, add_instance_tag: bool) -> Self {
        let base = ScopedBase::new(None, context);
        let home = home_frame(context);
        Self::build(base, home, add_instance_tag)
    }

    /**
    Wraps `inner` for the calling class.

    When `inner` is itself an auto-method logger created in the same class, `inner` is returned
    unchanged so the class tag is not repeated.
    */
    pub fn wrap(inner: &Logger, add_instance_tag: bool) -> Logger {
        let base = ScopedBase::wrapping(inner);
        let home = home_frame(base.context());
        if let (Layer::AutoMethod(existing), Some((origin, _))) = (inner.layer(), &home) {
            if existing.origin.as_ref() == Some(origin) {
                return inner.clone();
            }
        }
        Self::build(base, home, add_instance_tag).into()
    }

    fn build(
        mut base: ScopedBase,
        home: Option<(OriginId, String)>,
        add_instance_tag: bool,
    ) -> Self {
        let origin = home.map(|(origin, class)| {
            base.add_class_tags(&class, add_instance_tag);
            origin
        });
        AutoMethodLogger { base, origin }
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

    /// The class this logger resolves methods for; `None` if it could not be determined.
    pub fn origin(&self) -> Option<&OriginId> {
        self.origin.as_ref()
    }

    /// The tags fixed at construction.
    pub fn prefix(&self) -> &str {
        self.base.prefix()
    }

    pub fn into_logger(self) -> Logger {
        self.into()
    }

    pub(crate) fn base(&self) -> &ScopedBase {
        &self.base
    }

    /// Fixed tags plus the method resolved from this call's stack.
    pub(crate) fn call_prefix(&self, record: &LogRecord<'_>) -> Result<String, Error> {
        let stack = record.stack(self.base.context())?;
        let mut prefix = self.base.prefix().to_string();
        if let Some(method) = self
            .origin
            .as_ref()
            .and_then(|origin| resolve_method(stack, origin.as_str()))
        {
            prefix.push_str(&render_tag(TAG_KEY_METHOD, &method));
        }
        Ok(prefix)
    }
}

impl From<AutoMethodLogger> for Logger {
    fn from(logger: AutoMethodLogger) -> Self {
        Logger::from_layer(Layer::AutoMethod(logger))
    }
}

/// The caller's class identity and simple name, reporting a fault when the stack is unavailable.
fn home_frame(context: &LogContext) -> Option<(OriginId, String)> {
    let stack = match context.capture_stack() {
        Ok(stack) => stack,
        Err(fault) => {
            context.report_fault("AutoMethodLogger", &fault);
            return None;
        }
    };
    let frame = resolve_at_depth(&stack, 0)?;
    Some((OriginId::of(frame), frame.simple_class_name().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{InMemoryConsole, LIBRARY_FAULT_TAG};
    use crate::level::Level;
    use crate::stack::{FixedStackCapture, StackFrame};

    fn frame(class: &str, method: &str) -> StackFrame {
        StackFrame::new(class, method, None)
    }

    fn context(
        frames: Vec<StackFrame>,
    ) -> (Arc<LogContext>, Arc<FixedStackCapture>, Arc<InMemoryConsole>) {
        let capture = Arc::new(FixedStackCapture::new(frames));
        let console = Arc::new(InMemoryConsole::new());
        let context = LogContext::builder()
            .console(console.clone())
            .capture(capture.clone())
            .build();
        (Arc::new(context), capture, console)
    }

    #[test]
    fn resolves_method_per_call() {
        let (context, capture, console) = context(vec![frame("app::Worker", "new")]);
        let logger = AutoMethodLogger::new_in(&context, false).into_logger();

        capture.set(vec![frame("app::Worker", "start"), frame("app::Main", "main")]);
        logger.info("one", &[]);
        capture.set(vec![frame("app::Worker", "stop"), frame("app::Main", "main")]);
        logger.info("two", &[]);
        assert_eq!(
            console.drain_logs(),
            "I/[scopedlog]: [Class Worker][Method start] one\n\
             I/[scopedlog]: [Class Worker][Method stop] two"
        );
    }

    #[test]
    fn no_match_means_no_method_tag() {
        let (context, capture, console) = context(vec![frame("app::Worker", "new")]);
        let logger = AutoMethodLogger::new_in(&context, false).into_logger();
        capture.set(vec![frame("app::Other", "run")]);
        logger.debug("elsewhere", &[]);
        assert_eq!(console.drain_logs(), "D/[scopedlog]: [Class Worker] elsewhere");
    }

    #[test]
    fn closure_frames_are_annotated() {
        let (context, capture, console) = context(vec![frame("app::Worker", "new")]);
        let logger = AutoMethodLogger::new_in(&context, false).into_logger();
        capture.set(vec![
            frame("app::Worker$closure", "start::{{closure}}"),
            frame("app::Pool", "execute"),
            frame("app::Worker", "start"),
        ]);
        logger.info("in callback", &[]);
        assert_eq!(
            console.drain_logs(),
            "I/[scopedlog]: [Class Worker][Method start::{{closure}} <- Worker#start(args)] in callback"
        );
    }

    #[test]
    fn wrap_is_elided_for_the_same_class() {
        let (context, capture, _) = context(vec![frame("app::Worker", "new")]);
        let inner = AutoMethodLogger::new_in(&context, false).into_logger();

        capture.set(vec![frame("app::Worker$closure", "start::{{closure}}")]);
        let same = AutoMethodLogger::wrap(&inner, false);
        assert!(same.ptr_eq(&inner));

        capture.set(vec![frame("app::Screen", "open")]);
        let other = AutoMethodLogger::wrap(&inner, false);
        assert!(!other.ptr_eq(&inner));
    }

    #[test]
    fn wrapping_composes_prefixes() {
        let (context, capture, console) = context(vec![frame("app::Screen", "new")]);
        let screen = AutoMethodLogger::new_in(&context, false).into_logger();
        capture.set(vec![frame("app::Adapter", "new"), frame("app::Screen", "create")]);
        let adapter = AutoMethodLogger::wrap(&screen, false);

        capture.set(vec![frame("app::Adapter", "bind"), frame("app::Screen", "create")]);
        adapter.info("bound", &[]);
        assert_eq!(
            console.drain_logs(),
            "I/[scopedlog]: [Class Screen][Method create][Class Adapter][Method bind] bound"
        );
    }

    #[test]
    fn construction_without_stack_reports_fault() {
        let console = Arc::new(InMemoryConsole::new());
        let context = Arc::new(
            LogContext::builder()
                .console(console.clone())
                .capture(Arc::new(FixedStackCapture::unavailable()))
                .build(),
        );
        let logger = AutoMethodLogger::new_in(&context, false);
        assert!(logger.origin().is_none());
        assert_eq!(logger.prefix(), "");
        let lines = console.drain_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].level, Level::Wtf);
        assert_eq!(lines[0].tag, LIBRARY_FAULT_TAG);
    }
}
