// SPDX-License-Identifier: MIT OR Apache-2.0

//! Library faults never reach the caller, but the caller's message still does.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use scopedlog::{
    AutoMethodLogger, CallStack, CallStackCapture, Error, InMemoryConsole, LIBRARY_FAULT_TAG,
    LIBRARY_TAG, Level, LogContext, MethodScopedLogger, StackFrame,
};

/// Succeeds for the first `healthy` captures, then panics.
#[derive(Debug)]
struct FlakyCapture {
    healthy: usize,
    calls: AtomicUsize,
}

impl CallStackCapture for FlakyCapture {
    fn capture(&self) -> Result<CallStack, Error> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.healthy {
            Ok(CallStack::new(vec![StackFrame::new("app::Job", "run", None)]))
        } else {
            panic!("symbol table went away")
        }
    }
}

#[test]
fn panicking_capture_is_reported_then_message_emitted() {
    let console = Arc::new(InMemoryConsole::new());
    let context = Arc::new(
        LogContext::builder()
            .console(console.clone())
            .capture(Arc::new(FlakyCapture {
                healthy: 2,
                calls: AtomicUsize::new(0),
            }))
            .build(),
    );
    let job = AutoMethodLogger::new_in(&context, false).into_logger();
    let step = MethodScopedLogger::for_method(&job, "step").unwrap().into_logger();

    step.info("ok %d", &[1.into()]);
    step.info("lost prefix %d", &[2.into()]);

    let lines = console.drain_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].message, "[Class Job][Method run][Method step] ok 1");

    assert_eq!(lines[1].level, Level::Wtf);
    assert_eq!(lines[1].tag, LIBRARY_FAULT_TAG);
    assert_eq!(
        lines[1].message,
        "MethodScopedLogger :: internal fault: symbol table went away"
    );

    assert_eq!(lines[2].level, Level::Info);
    assert_eq!(lines[2].tag, LIBRARY_TAG);
    assert_eq!(lines[2].message, "lost prefix 2");
}

#[test]
fn usage_errors_fail_at_construction() {
    let console = Arc::new(InMemoryConsole::new());
    let context = Arc::new(LogContext::builder().console(console.clone()).build());
    let class = MethodScopedLogger::new_in(&context, "Job", false).into_logger();

    let err = MethodScopedLogger::for_method(&class, "").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(err.to_string().starts_with("invalid argument"));

    assert!(matches!(
        scopedlog::FullTraceLogger::new_in(&context),
        Err(Error::NotInitialized(_))
    ));
    assert!(console.drain_lines().is_empty());
}
