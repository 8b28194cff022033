// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-call record carried down a logger chain.
//!
//! A [`LogRecord`] is created once per logging call and handed from layer to layer. Each scoped
//! layer writes its own prefix into the record on the way down; the sink at the bottom reads the
//! prefixes back in construction order (innermost layer first) and formats the message.
//!
//! The call stack is captured lazily: the first layer that needs it triggers the capture, and
//! every later layer reuses the same snapshot. A chain made only of method-scoped layers never
//! inspects the stack at all.

use std::cell::OnceCell;
use std::error::Error as StdError;

use crate::arg::Arg;
use crate::context::LogContext;
use crate::error::Error;
use crate::format::format_message;
use crate::level::Level;
use crate::stack::CallStack;

pub(crate) struct LogRecord<'a> {
    level: Level,
    error: Option<&'a dyn StdError>,
    template: &'a str,
    args: &'a [Arg],
    /// Written by the outermost layer first.
    prefixes: Vec<String>,
    stack: OnceCell<CallStack>,
}

impl<'a> LogRecord<'a> {
    pub(crate) fn new(
        level: Level,
        error: Option<&'a dyn StdError>,
        template: &'a str,
        args: &'a [Arg],
    ) -> Self {
        LogRecord {
            level,
            error,
            template,
            args,
            prefixes: Vec::new(),
            stack: OnceCell::new(),
        }
    }

    pub(crate) fn level(&self) -> Level {
        self.level
    }

    /// Records one layer's prefix. Empty prefixes are skipped.
    pub(crate) fn push_prefix(&mut self, prefix: String) {
        if !prefix.is_empty() {
            self.prefixes.push(prefix);
        }
    }

    /// All layer prefixes, innermost (first constructed) layer first.
    pub(crate) fn local_prefix(&self) -> String {
        self.prefixes.iter().rev().map(String::as_str).collect()
    }

    /// The formatted message, without any prefix.
    pub(crate) fn body(&self) -> String {
        format_message(self.error, self.template, self.args)
    }

    /// The stack snapshot for this call, captured through `context` on first use.
    pub(crate) fn stack(&self, context: &LogContext) -> Result<&CallStack, Error> {
        if let Some(stack) = self.stack.get() {
            return Ok(stack);
        }
        let captured = context.capture_stack()?;
        Ok(self.stack.get_or_init(|| captured))
    }
}

impl std::fmt::Debug for LogRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRecord")
            .field("level", &self.level)
            .field("template", &self.template)
            .field("args", &self.args)
            .field("prefixes", &self.prefixes)
            .finish_non_exhaustive()
    }
}

/*
Boilerplate notes for LogRecord:

Debug is hand-written because the attached error is only `dyn Error`.
Clone would duplicate a lazily captured stack; records live for one call, so no.
PartialEq/Hash: no meaningful identity.
Send/Sync: not needed, a record never leaves the logging thread.
*/
