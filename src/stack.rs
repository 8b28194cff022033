// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
Call stack snapshots and the capability that produces them.

Resolution works on an abstract [`CallStack`]: an innermost-first list of [`StackFrame`]s that
starts at the first frame outside this library (the code that called the logging API). How the
frames are obtained is up to the [`CallStackCapture`] implementation:

* [`BacktraceCapture`] walks the native stack with the `backtrace` crate and maps demangled
  symbol paths onto class/method pairs.
* [`FixedStackCapture`] hands out whatever frames it was given, for tests and for hosts that
  supply their own stack information.

A frame whose class name contains [`CLOSURE_MARKER`] runs inside a closure or anonymous
callback defined in the class before the marker.
*/

use std::fmt::{Display, Formatter};

use parking_lot::Mutex;

use crate::error::Error;

/// Separates an enclosing class from the synthetic name of a closure defined inside it.
pub const CLOSURE_MARKER: char = '$';

/// One frame of a captured call stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackFrame {
    class_name: String,
    method_name: String,
    file_name: Option<String>,
}

impl StackFrame {
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        file_name: Option<&str>,
    ) -> Self {
        StackFrame {
            class_name: class_name.into(),
            method_name: method_name.into(),
            file_name: file_name.map(str::to_string),
        }
    }

    /// Fully-qualified class name, closure suffix included.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Whether the frame runs inside a closure (its class carries the synthetic marker).
    pub fn is_closure(&self) -> bool {
        self.class_name.contains(CLOSURE_MARKER)
    }

    /// The class name with any closure suffix removed.
    pub fn owner_class(&self) -> &str {
        match self.class_name.find(CLOSURE_MARKER) {
            Some(index) => &self.class_name[..index],
            None => &self.class_name,
        }
    }

    /**
    Short class name used for tags.

    Taken from the source file name, up to its first `.`; this assumes one class per file and
    no renaming of files by an obfuscator. Frames without a file name fall back to the last
    path segment of [`owner_class`](Self::owner_class).
    */
    pub fn simple_class_name(&self) -> &str {
        if let Some(file) = self.file_name.as_deref().filter(|f| !f.is_empty()) {
            return file.split('.').next().unwrap_or(file);
        }
        let owner = self.owner_class();
        let after_path = owner.rsplit("::").next().unwrap_or(owner);
        after_path.rsplit('.').next().unwrap_or(after_path)
    }
}

impl Display for StackFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.class_name, self.method_name)?;
        if let Some(file) = &self.file_name {
            write!(f, " ({file})")?;
        }
        Ok(())
    }
}

/// An innermost-first snapshot of the frames above the library boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStack {
    frames: Vec<StackFrame>,
}

impl CallStack {
    pub fn new(frames: Vec<StackFrame>) -> Self {
        CallStack { frames }
    }

    /// Frames, innermost (the caller of the logging API) first.
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// The frame `depth` calls above the library boundary.
    pub fn get(&self, depth: usize) -> Option<&StackFrame> {
        self.frames.get(depth)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl From<Vec<StackFrame>> for CallStack {
    fn from(frames: Vec<StackFrame>) -> Self {
        CallStack::new(frames)
    }
}

/**
Produces a snapshot of the current call stack.

Implementations must return frames starting at the first frame outside this library, innermost
first. They are called on the logging thread, once per logging call that needs stack
information, and may be called from many threads at once.
*/
pub trait CallStackCapture: std::fmt::Debug + Send + Sync {
    fn capture(&self) -> Result<CallStack, Error>;
}

/// Frames handed out verbatim; replaceable between calls.
#[derive(Debug, Default)]
pub struct FixedStackCapture {
    frames: Mutex<Option<Vec<StackFrame>>>,
}

impl FixedStackCapture {
    pub fn new(frames: Vec<StackFrame>) -> Self {
        FixedStackCapture {
            frames: Mutex::new(Some(frames)),
        }
    }

    /// A capture that always reports [`Error::StackUnavailable`].
    pub fn unavailable() -> Self {
        FixedStackCapture {
            frames: Mutex::new(None),
        }
    }

    /// Replaces the frames returned by subsequent captures.
    pub fn set(&self, frames: Vec<StackFrame>) {
        *self.frames.lock() = Some(frames);
    }
}

impl CallStackCapture for FixedStackCapture {
    fn capture(&self) -> Result<CallStack, Error> {
        match &*self.frames.lock() {
            Some(frames) => Ok(CallStack::new(frames.clone())),
            None => Err(Error::StackUnavailable(
                "no frames configured".to_string(),
            )),
        }
    }
}

/// Crates whose frames are never attributed to a caller.
const RUNTIME_CRATES: &[&str] = &["std", "core", "alloc", "backtrace", "test"];

const LIBRARY_CRATE: &str = env!("CARGO_CRATE_NAME");

/**
Native stack capture through the `backtrace` crate.

Symbols are demangled and mapped as follows:

| demangled symbol                       | class               | method                  |
|----------------------------------------|---------------------|-------------------------|
| `app::jobs::Worker::start`             | `app::jobs::Worker` | `start`                 |
| `<app::Worker as app::Job>::run`       | `app::Worker`       | `run`                   |
| `app::Worker::start::{{closure}}`      | `app::Worker$closure` | `start::{{closure}}`  |

Frames of the capture machinery and of this library are skipped up to the first foreign
frame; `std`, `core` and `alloc` frames are dropped throughout.

# File names

By default frames carry no file name, so class tags come from the type path (`[Class Worker]`).
[`with_file_names`](Self::with_file_names) records the source file when debug info has one.
[`StackFrame::simple_class_name`] then prefers the file stem: a `Worker` defined in
`src/lib.rs` is tagged `[Class lib]`, and full traces merge types that share a file.
*/
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceCapture {
    file_names: bool,
}

impl BacktraceCapture {
    pub fn new() -> Self {
        BacktraceCapture::default()
    }

    /// Records each frame's source file name.
    pub fn with_file_names(self) -> Self {
        BacktraceCapture { file_names: true }
    }
}

impl CallStackCapture for BacktraceCapture {
    fn capture(&self) -> Result<CallStack, Error> {
        let mut frames = Vec::new();
        let mut resolved_any = false;
        let mut past_library = false;
        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                let Some(name) = symbol.name() else {
                    return;
                };
                resolved_any = true;
                let demangled = format!("{name:#}");
                let Some(parsed) = parse_symbol(&demangled) else {
                    return;
                };
                let runtime = RUNTIME_CRATES.contains(&parsed.krate);
                if !past_library {
                    if runtime || parsed.krate == LIBRARY_CRATE {
                        return;
                    }
                    past_library = true;
                }
                if runtime {
                    return;
                }
                let file = symbol
                    .filename()
                    .filter(|_| self.file_names)
                    .and_then(|path| path.file_name())
                    .map(|file| file.to_string_lossy().into_owned());
                frames.push(StackFrame {
                    class_name: parsed.class_name,
                    method_name: parsed.method_name,
                    file_name: file,
                });
            });
            true
        });
        if !resolved_any {
            return Err(Error::StackUnavailable(
                "no symbols could be resolved".to_string(),
            ));
        }
        Ok(CallStack::new(frames))
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ParsedSymbol<'a> {
    krate: &'a str,
    class_name: String,
    method_name: String,
}

/// Removes `<...>` generic argument lists, leaving no empty `::` segments behind.
fn strip_generics(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// `<T as Trait>::rest` and `<T>::rest` become `T::rest`.
fn unqualify(symbol: &str) -> &str {
    symbol.strip_prefix('<').map_or(symbol, |inner| {
        let mut depth = 0usize;
        for (index, c) in inner.char_indices() {
            match c {
                '<' => depth += 1,
                '>' if depth == 0 => return &inner[..index],
                '>' => depth -= 1,
                ' ' if depth == 0 && inner[index..].starts_with(" as ") => {
                    return &inner[..index];
                }
                _ => {}
            }
        }
        inner
    })
}

fn parse_symbol(demangled: &str) -> Option<ParsedSymbol<'_>> {
    if demangled.contains(" as core::ops::function::") {
        return None;
    }
    let self_type = unqualify(demangled);
    let rest = demangled
        .strip_prefix('<')
        .and_then(|inner| inner.find(">::").map(|index| &inner[index + 3..]));
    let self_type = self_type
        .trim_start_matches('&')
        .trim_start_matches("mut ")
        .trim_start_matches("dyn ");
    let krate = self_type.split("::").next()?;
    if krate.is_empty() || (!self_type.contains("::") && rest.is_none()) {
        return None;
    }

    let full = match rest {
        Some(rest) => format!("{self_type}::{rest}"),
        None => self_type.to_string(),
    };
    let stripped = strip_generics(&full);
    let segments: Vec<&str> = stripped
        .split("::")
        .filter(|segment| !segment.is_empty() && !segment.starts_with("{{vtable"))
        .collect();
    build_parsed(krate, &segments)
}

fn is_closure_segment(segment: &str) -> bool {
    segment.starts_with("{{closure}}") || segment.starts_with("{closure")
}

fn build_parsed<'a>(krate: &'a str, segments: &[&str]) -> Option<ParsedSymbol<'a>> {
    let closure_at = segments.iter().position(|segment| is_closure_segment(segment));
    let named = &segments[..closure_at.unwrap_or(segments.len())];
    let (method, owner) = named.split_last()?;
    let class = owner.join("::");
    Some(match closure_at {
        Some(_) => ParsedSymbol {
            krate,
            class_name: format!("{class}{CLOSURE_MARKER}closure"),
            method_name: format!("{method}::{{{{closure}}}}"),
        },
        None => ParsedSymbol {
            krate,
            class_name: class,
            method_name: method.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_class_name_prefers_file_name() {
        let frame = StackFrame::new("app::jobs::Worker$closure", "run", Some("worker.rs"));
        assert_eq!(frame.simple_class_name(), "worker");
        assert!(frame.is_closure());
        assert_eq!(frame.owner_class(), "app::jobs::Worker");

        let rust = StackFrame::new("app::jobs::Worker$closure", "start::{{closure}}", None);
        assert_eq!(rust.simple_class_name(), "Worker");
        let dotted = StackFrame::new("app.jobs.Worker", "start", None);
        assert_eq!(dotted.simple_class_name(), "Worker");
    }

    #[test]
    fn fixed_capture_returns_configured_frames() {
        let capture = FixedStackCapture::new(vec![StackFrame::new("A", "a", None)]);
        assert_eq!(capture.capture().unwrap().len(), 1);
        capture.set(Vec::new());
        assert!(capture.capture().unwrap().is_empty());
        assert!(matches!(
            FixedStackCapture::unavailable().capture(),
            Err(Error::StackUnavailable(_))
        ));
    }

    #[test]
    fn parses_inherent_and_trait_methods() {
        let parsed = parse_symbol("app::jobs::Worker::start").unwrap();
        assert_eq!(parsed.krate, "app");
        assert_eq!(parsed.class_name, "app::jobs::Worker");
        assert_eq!(parsed.method_name, "start");

        let parsed = parse_symbol("<app::Worker as app::Job>::run").unwrap();
        assert_eq!(parsed.class_name, "app::Worker");
        assert_eq!(parsed.method_name, "run");

        let parsed = parse_symbol("<app::Cache<u32>>::get").unwrap();
        assert_eq!(parsed.class_name, "app::Cache");
        assert_eq!(parsed.method_name, "get");
    }

    #[test]
    fn parses_closures() {
        let parsed = parse_symbol("app::Worker::start::{{closure}}::{{closure}}").unwrap();
        assert_eq!(parsed.class_name, "app::Worker$closure");
        assert_eq!(parsed.method_name, "start::{{closure}}");
    }

    #[test]
    fn rejects_foreign_and_shim_symbols() {
        assert_eq!(parse_symbol("main"), None);
        assert_eq!(
            parse_symbol("<F as core::ops::function::FnOnce<()>>::call_once"),
            None
        );
    }
}
