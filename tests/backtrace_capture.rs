// SPDX-License-Identifier: MIT OR Apache-2.0

//! Method resolution against real stack frames.

use std::sync::Arc;

use scopedlog::{
    AutoMethodLogger, BacktraceCapture, CallStackCapture, InMemoryConsole, LogContext, Logger,
};

struct Player {
    log: Logger,
}

impl Player {
    #[inline(never)]
    fn new(context: &Arc<LogContext>) -> (Self, Option<String>) {
        let logger = AutoMethodLogger::new_in(context, false);
        let origin = logger.origin().map(|origin| origin.to_string());
        (
            Player {
                log: logger.into_logger(),
            },
            origin,
        )
    }

    #[inline(never)]
    fn seek(&self, seconds: u32) {
        self.log.info("to %ds", &[seconds.into()]);
    }
}

#[test]
fn auto_method_finds_the_calling_method() {
    let console = Arc::new(InMemoryConsole::new());
    let context = Arc::new(LogContext::builder().console(console.clone()).build());

    let (player, origin) = Player::new(&context);
    assert_eq!(origin.as_deref(), Some("backtrace_capture::Player"));

    player.seek(42);
    let lines = console.drain_lines();
    assert_eq!(lines.len(), 1, "unexpected lines: {lines:?}");
    assert!(
        lines[0].message.starts_with("[Class Player][Method seek]"),
        "{}",
        lines[0].message
    );
    assert!(lines[0].message.ends_with(" to 42s"));
}

#[test]
#[inline(never)]
fn capture_starts_outside_the_library() {
    let stack = BacktraceCapture::new().capture().unwrap();
    let first = stack.get(0).unwrap();
    assert!(
        first.class_name().starts_with("backtrace_capture"),
        "first frame was {first}"
    );
    assert_eq!(first.file_name(), None);
    assert!(
        stack
            .frames()
            .iter()
            .all(|frame| !frame.class_name().starts_with("scopedlog"))
    );
}

#[test]
#[inline(never)]
fn file_names_are_opt_in() {
    let stack = BacktraceCapture::new().with_file_names().capture().unwrap();
    let first = stack.get(0).unwrap();
    if let Some(file) = first.file_name() {
        assert_eq!(file, "backtrace_capture.rs");
        assert_eq!(first.simple_class_name(), "backtrace_capture");
    }
}
