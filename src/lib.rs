//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# scopedlog

scopedlog is a contextual logging library. It adds the calling class, the calling method and an
optional per-instance identifier to every log line, so that a line can be traced back to where
it came from without tagging each call by hand.

# The problem

A log line like

```text
W/app: retrying
```

says nothing about who is retrying. The usual fix is to repeat the context in every message,
which drifts out of date as code moves around. scopedlog keeps that context in the logger
instead, and composes it when loggers wrap each other:

```text
W/[scopedlog][USER 42]: [Class CheckoutScreen][Class CartLoader][Method load] retrying
```

# Loggers

A [`Logger`] is a handle to a chain of layers ending in a [`SinkLogger`], which writes to the
console and, optionally, a daily log file. Three scoped layers differ in how much they work out
at construction time versus on every call:

| Layer                  | Prefix                                      | Cost per call        |
|------------------------|---------------------------------------------|----------------------|
| [`MethodScopedLogger`] | fixed at construction (class, method, tags) | none                 |
| [`AutoMethodLogger`]   | class at construction, method per call      | one stack capture    |
| [`FullTraceLogger`]    | every in-package frame, per call            | one stack capture    |

Wrapping never consumes the inner logger; one class-level logger can back many method loggers.

```rust
use std::sync::Arc;
use scopedlog::{InMemoryConsole, LogContext, MethodScopedLogger};

let console = Arc::new(InMemoryConsole::new());
let context = Arc::new(LogContext::builder().console(console.clone()).build());

let worker = MethodScopedLogger::new_in(&context, "Worker", false).into_logger();
let start = MethodScopedLogger::for_method(&worker, "start").unwrap().into_logger();
scopedlog::error!(
    start,
    "Encountered %d errors while doing %s for %.2f seconds",
    0,
    "nothing",
    3.237
);
assert_eq!(
    console.drain_logs(),
    "E/[scopedlog]: [Class Worker][Method start] Encountered 0 errors while doing nothing for 3.24 seconds"
);
```

# Messages

Templates use printf-style placeholders (`%s`, `%d`, `%.2f`, `%1$s`, ...). A template that does
not fit its arguments is never an error: the template is kept as written and the arguments are
listed after it. See [`format_message`].

# Persistent tags

Tags added with [`add_persistent_tag`] appear in the console tag of every message from every
logger until they are removed, which suits values like a user or session id.

```rust
let id = scopedlog::add_persistent_tag("SESSION", "a1f3");
// ... every message now carries [SESSION a1f3]
scopedlog::remove_persistent_tag(id);
```

# Persistence

[`initialize`] with [`InitOptions::with_persist_to_file`] appends every message at or above a
minimum level to `<files_dir>/scopedlog_files/yyyy_MM_dd_Log.txt`.

# Failures

Logging calls never return errors. Faults inside the library are written to the console under
[`LIBRARY_FAULT_TAG`] and the caller's message is still emitted, without its scoped prefix.
*/

mod arg;
mod auto_method;
mod clock;
mod config;
mod console;
mod context;
mod error;
mod format;
mod full_trace;
mod level;
mod logger;
mod macros;
mod persistence;
mod record;
mod resolve;
mod scoped;
mod sink;
mod stack;
mod tags;

use std::path::PathBuf;

pub use arg::Arg;
pub use auto_method::AutoMethodLogger;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppContext, InitOptions};
pub use console::{
    Console, ConsoleLine, InMemoryConsole, LIBRARY_FAULT_TAG, LIBRARY_TAG, StdErrorConsole,
};
pub use context::{LogContext, LogContextBuilder, global_context};
pub use error::Error;
pub use format::format_message;
pub use full_trace::FullTraceLogger;
pub use level::Level;
pub use logger::Logger;
pub use macros::AsDynError;
pub use persistence::{LOG_DIR_NAME, log_file_path};
pub use resolve::{
    OriginId, TAG_KEY_CLASS, TAG_KEY_INSTANCE, TAG_KEY_METHOD, TraceEntry, full_trace,
    resolve_full_trace, resolve_method,
};
pub use scoped::MethodScopedLogger;
pub use sink::SinkLogger;
pub use stack::{BacktraceCapture, CallStack, CallStackCapture, FixedStackCapture, StackFrame};
pub use tags::{PersistentTag, RemoveStatus, TagId, TagRegistry};

#[doc(hidden)]
pub mod hidden {
    pub use crate::macros::{log, log_error};
}

/// Configures the global context. See [`LogContext::initialize`].
pub fn initialize(app: &AppContext, options: InitOptions) {
    global_context().initialize(app, options);
}

/// Initializes file persistence on the global context at [`Level::Verbose`].
#[deprecated(note = "use `initialize` with `InitOptions::with_persist_to_file`")]
pub fn init_persistence(app: &AppContext) {
    #[allow(deprecated)]
    global_context().init_persistence(app);
}

/// Enables full traces on the global context for `app.package_name`.
#[deprecated(note = "use `initialize` with `InitOptions::with_full_trace`")]
pub fn init_full_trace(app: &AppContext) {
    #[allow(deprecated)]
    global_context().init_full_trace(app);
}

/// Adds a tag to every message; `None` when the key or value is absent.
pub fn add_persistent_tag<'a>(
    key: impl Into<Option<&'a str>>,
    value: impl Into<Option<&'a str>>,
) -> Option<TagId> {
    global_context().add_persistent_tag(key, value)
}

pub fn remove_persistent_tag(id: Option<TagId>) -> RemoveStatus {
    global_context().remove_persistent_tag(id)
}

/// Removes every tag with `key`, returning how many were removed.
pub fn remove_all_persistent_tags_from_key<'a>(key: impl Into<Option<&'a str>>) -> usize {
    global_context().remove_all_persistent_tags_from_key(key)
}

/// Removes every tag, returning how many there were.
pub fn clear_persistent_tags() -> usize {
    global_context().clear_persistent_tags()
}

/// Persisted log files of the global context, oldest first; `None` until persistence is on.
pub fn log_files() -> Option<Vec<PathBuf>> {
    global_context().log_files()
}
