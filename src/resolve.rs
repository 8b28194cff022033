// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
Call-site resolution over a captured [`CallStack`].

Three strategies, from cheapest to richest:

* [`resolve_at_depth`]: the frame a fixed number of calls above the library boundary. Depth 0
  is the code that called into the library. Only meaningful while the caller controls how many
  frames sit between it and the capture, so the loggers use it solely at construction time.
* [`resolve_method`]: the method currently executing in a known class, found by name. Closure
  frames are annotated with the method that encloses them.
* [`resolve_full_trace`]: every frame belonging to a package, grouped by class, outermost first.

None of these treat "nothing found" as an error; callers simply add no tag.
*/

use std::fmt::{Display, Formatter};

use crate::stack::{CallStack, CLOSURE_MARKER, StackFrame};

/// Tag key for class names.
pub const TAG_KEY_CLASS: &str = "Class";
/// Tag key for method names.
pub const TAG_KEY_METHOD: &str = "Method";
/// Tag key for per-instance identifiers.
pub const TAG_KEY_INSTANCE: &str = "Instance";

/// Comparable identity of the class a logger was created in, closure suffix stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OriginId(String);

impl OriginId {
    pub fn new(class_name: &str) -> Self {
        let owner = match class_name.find(CLOSURE_MARKER) {
            Some(index) => &class_name[..index],
            None => class_name,
        };
        OriginId(owner.to_string())
    }

    pub fn of(frame: &StackFrame) -> Self {
        OriginId::new(frame.class_name())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OriginId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The frame `depth` calls above the library boundary.
pub fn resolve_at_depth(stack: &CallStack, depth: usize) -> Option<&StackFrame> {
    stack.get(depth)
}

fn closure_hop(closure_method: &str, enclosing_class: &str, enclosing_methods: &str) -> String {
    format!("{closure_method} <- {enclosing_class}{enclosing_methods}")
}

/**
Name of the method currently executing in `class_name`.

The innermost frame whose class (closure suffix ignored) equals `class_name` wins. When that
frame is inside a closure, the result names the closure's method and the method it was defined
in, e.g. `run <- Worker#start(args)`. The enclosing method is the next outer frame of the owning
class, or else the frame directly outside the closure.
*/
pub fn resolve_method(stack: &CallStack, class_name: &str) -> Option<String> {
    let class_name = OriginId::new(class_name);
    let frames = stack.frames();
    let index = frames
        .iter()
        .position(|frame| frame.owner_class() == class_name.as_str())?;
    let frame = &frames[index];
    if !frame.is_closure() {
        return Some(frame.method_name().to_string());
    }
    let outer = &frames[index + 1..];
    let enclosing = outer
        .iter()
        .find(|candidate| !candidate.is_closure() && candidate.class_name() == class_name.as_str())
        .or_else(|| outer.first());
    Some(match enclosing {
        Some(enclosing) => closure_hop(
            frame.method_name(),
            enclosing.simple_class_name(),
            &format!("#{}(args)", enclosing.method_name()),
        ),
        None => frame.method_name().to_string(),
    })
}

/// One class in a full trace, with the methods called in it in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub class_name: String,
    pub methods: Vec<String>,
}

impl TraceEntry {
    fn new(class_name: &str, method: String) -> Self {
        TraceEntry {
            class_name: class_name.to_string(),
            methods: vec![method],
        }
    }
}

/**
Groups every frame whose class contains `package` into per-class entries, outermost first.

Consecutive frames of one class share an entry. A closure frame does not open an entry of its
own: it replaces the method it was called from with a `closure <- Class#method(args)` hop. When
the closure belongs to a different class than the current entry, every method of that entry is
folded into the hop and the entry is merged into the one before it.
*/
pub fn full_trace(stack: &CallStack, package: &str) -> Vec<TraceEntry> {
    let mut entries: Vec<TraceEntry> = Vec::new();
    for frame in stack.frames().iter().rev() {
        if !frame.class_name().contains(package) {
            continue;
        }
        let class = frame.simple_class_name();
        let method = frame.method_name().to_string();
        let closure = frame.is_closure();

        let same_class = entries.last().is_some_and(|last| last.class_name == class);
        if same_class {
            if let Some(last) = entries.last_mut() {
                let entry = if closure {
                    match last.methods.pop() {
                        Some(caller) => closure_hop(&method, class, &format!("#{caller}(args)")),
                        None => method,
                    }
                } else {
                    method
                };
                last.methods.push(entry);
            }
        } else if closure && !entries.is_empty() {
            let folded = entries.remove(entries.len() - 1);
            let callers: String = folded
                .methods
                .iter()
                .map(|caller| format!("#{caller}(args)"))
                .collect();
            let hop = closure_hop(&method, &folded.class_name, &callers);
            match entries.last_mut() {
                Some(previous) => previous.methods.push(hop),
                None => entries.push(TraceEntry::new(class, hop)),
            }
        } else {
            entries.push(TraceEntry::new(class, method));
        }
    }
    entries
}

/// Renders [`full_trace`] as `[Class A][Method m1][Method m2][Class B]...`.
pub fn resolve_full_trace(stack: &CallStack, package: &str) -> String {
    let mut out = String::new();
    for entry in full_trace(stack, package) {
        out.push_str(&render_tag(TAG_KEY_CLASS, &entry.class_name));
        for method in &entry.methods {
            out.push_str(&render_tag(TAG_KEY_METHOD, method));
        }
    }
    out
}

/// `[KEY value]`
pub fn render_tag(key: &str, value: &str) -> String {
    format!("[{key} {value}]")
}
