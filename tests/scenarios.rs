// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end behaviour of logger chains against an in-memory console.

use std::sync::Arc;

use scopedlog::{
    AppContext, AutoMethodLogger, FixedStackCapture, FullTraceLogger, InMemoryConsole, InitOptions,
    Level, LogContext, Logger, MethodScopedLogger, SinkLogger, StackFrame,
};

fn context() -> (Arc<LogContext>, Arc<InMemoryConsole>) {
    let console = Arc::new(InMemoryConsole::new());
    let context = LogContext::builder().console(console.clone()).build();
    (Arc::new(context), console)
}

fn worker_start(context: &Arc<LogContext>) -> Logger {
    let root = SinkLogger::new_in(context).into_logger();
    MethodScopedLogger::with_method(Some(&root), "Worker", Some("start")).into_logger()
}

#[test]
fn formats_numbers_like_the_platform() {
    let (context, console) = context();
    let app = AppContext::new("com.app", std::env::temp_dir());
    context.initialize(&app, InitOptions::default());
    let logger = worker_start(&context);

    scopedlog::error!(
        logger,
        "Encountered %d errors while doing %s for %.2f seconds",
        0,
        "nothing",
        3.237
    );
    let lines = console.drain_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].level, Level::Error);
    assert_eq!(lines[0].tag, "[scopedlog]");
    assert_eq!(
        lines[0].message,
        "[Class Worker][Method start] Encountered 0 errors while doing nothing for 3.24 seconds"
    );
}

#[test]
fn missing_arguments_keep_the_template() {
    let (context, console) = context();
    let logger = worker_start(&context);

    scopedlog::info!(logger, "Message with broken placeholders: %s");
    assert_eq!(
        console.drain_logs(),
        "I/[scopedlog]: [Class Worker][Method start] Message with broken placeholders: %s - args: no_args_passed"
    );

    scopedlog::info!(logger, "count=%d", "three");
    assert_eq!(
        console.drain_logs(),
        "I/[scopedlog]: [Class Worker][Method start] count=%d - args: three;"
    );
}

#[test]
fn nested_tags_compose_in_construction_order() {
    let (context, console) = context();
    context.add_persistent_tag("USER", "42");
    context.add_persistent_tag("BUILD", "dev");

    let mut logger = SinkLogger::new_in(&context).into_logger();
    for depth in 0..5 {
        let mut layer = MethodScopedLogger::extend(Some(&logger), &format!("L{depth}"), false);
        layer.add_tag("Depth", Some(&depth.to_string()), true).unwrap();
        logger = layer.into_logger();
    }
    logger.info("deep", &[]);

    let lines = console.drain_lines();
    assert_eq!(lines[0].tag, "[scopedlog][USER 42][BUILD dev]");
    assert_eq!(
        lines[0].message,
        "[Class L0][Depth 0][Class L1][Depth 1][Class L2][Depth 2][Class L3][Depth 3][Class L4][Depth 4] deep"
    );
}

#[test]
fn persistent_tags_follow_every_logger() {
    let (context, console) = context();
    let a = MethodScopedLogger::new_in(&context, "A", false).into_logger();
    let b = MethodScopedLogger::new_in(&context, "B", false).into_logger();

    let id = context.add_persistent_tag("SESSION", "s1");
    a.info("1", &[]);
    b.info("2", &[]);
    context.remove_persistent_tag(id);
    a.info("3", &[]);

    assert_eq!(
        console.drain_logs(),
        "I/[scopedlog][SESSION s1]: [Class A] 1\n\
         I/[scopedlog][SESSION s1]: [Class B] 2\n\
         I/[scopedlog]: [Class A] 3"
    );
}

#[test]
fn error_overloads() {
    let (context, console) = context();
    let logger = worker_start(&context);
    let failure = std::io::Error::other("disk full");

    logger.warn_err(&failure, "saving %s", &["a.txt".into()]);
    logger.error_err(&failure, "", &[]);
    logger.info_err(&failure, "", &[7.into()]);
    assert_eq!(
        console.drain_logs(),
        "W/[scopedlog]: [Class Worker][Method start] saving a.txt :: disk full\n\
         E/[scopedlog]: [Class Worker][Method start]  :: disk full\n\
         I/[scopedlog]: [Class Worker][Method start] no_message_provided - args: 7; :: disk full"
    );
}

#[test]
fn closure_hop_is_visible_in_a_full_trace() {
    let capture = Arc::new(FixedStackCapture::new(Vec::new()));
    let console = Arc::new(InMemoryConsole::new());
    let context = Arc::new(
        LogContext::builder()
            .console(console.clone())
            .capture(capture.clone())
            .build(),
    );
    let app = AppContext::new("app", std::env::temp_dir());
    context.initialize(&app, InitOptions::default().with_full_trace(true));
    let logger = FullTraceLogger::new_in(&context).unwrap().into_logger();

    // method_a hands a closure to itself; the log call is inside it.
    capture.set(vec![
        StackFrame::new("app::Sync$closure", "run", None),
        StackFrame::new("app::Sync", "method_a", None),
        StackFrame::new("app::Main", "main", None),
    ]);
    logger.info("inside", &[]);
    assert_eq!(
        console.drain_logs(),
        "I/[scopedlog]: [Class Main][Method main][Class Sync][Method run <- Sync#method_a(args)] inside"
    );
}

#[test]
fn mixed_chain_shares_one_stack_capture() {
    let capture = Arc::new(FixedStackCapture::new(vec![StackFrame::new(
        "app::Screen",
        "new",
        None,
    )]));
    let console = Arc::new(InMemoryConsole::new());
    let context = Arc::new(
        LogContext::builder()
            .console(console.clone())
            .capture(capture.clone())
            .build(),
    );
    let app = AppContext::new("app", std::env::temp_dir());
    context.initialize(&app, InitOptions::default().with_full_trace(true));

    let screen = AutoMethodLogger::new_in(&context, false).into_logger();
    let traced = FullTraceLogger::wrap(&screen).unwrap().into_logger();
    capture.set(vec![
        StackFrame::new("app::Screen", "render", None),
        StackFrame::new("app::Main", "main", None),
    ]);
    traced.debug("frame", &[]);
    assert_eq!(
        console.drain_logs(),
        "D/[scopedlog]: [Class Screen][Method render][Class Main][Method main][Class Screen][Method render] frame"
    );
}
