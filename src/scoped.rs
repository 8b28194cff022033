// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared scoped-layer base and the method-scoped logger.

use std::sync::Arc;

use uuid::Uuid;

use crate::context::{LogContext, global_context};
use crate::error::Error;
use crate::logger::{Layer, Logger};
use crate::resolve::{TAG_KEY_CLASS, TAG_KEY_INSTANCE, TAG_KEY_METHOD, render_tag};
use crate::sink::SinkLogger;

const INSTANCE_ID_LEN: usize = 6;

/// A short random identifier for the instance tag.
pub(crate) fn instance_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(INSTANCE_ID_LEN);
    id
}

/// State every scoped layer carries: its own tags and the next layer inward.
#[derive(Debug, Clone)]
pub(crate) struct ScopedBase {
    prefix: String,
    inner: Logger,
    context: Arc<LogContext>,
}

impl ScopedBase {
    /// Wraps `inner`, or a fresh sink on `context` when there is none.
    pub(crate) fn new(inner: Option<&Logger>, context: &Arc<LogContext>) -> Self {
        let inner = match inner {
            Some(inner) => inner.clone(),
            None => SinkLogger::new_in(context).into(),
        };
        ScopedBase {
            prefix: String::new(),
            inner,
            context: context.clone(),
        }
    }

    /// A base over `inner`, reporting to the inner chain's context.
    pub(crate) fn wrapping(inner: &Logger) -> Self {
        let context = inner.context().clone();
        Self::new(Some(inner), &context)
    }

    /// A root base on the context of `inner` if given, else the global one.
    pub(crate) fn over(inner: Option<&Logger>) -> Self {
        match inner {
            Some(inner) => Self::wrapping(inner),
            None => Self::new(None, &global_context()),
        }
    }

    pub(crate) fn add_tag(
        &mut self,
        key: &str,
        value: Option<&str>,
        require_value: bool,
    ) -> Result<(), Error> {
        match value {
            Some(value) if !value.is_empty() => {
                self.prefix.push_str(&render_tag(key, value));
                Ok(())
            }
            _ if require_value => Err(Error::invalid(format!("tag `{key}` requires a value"))),
            _ => Ok(()),
        }
    }

    pub(crate) fn add_class_tags(&mut self, class: &str, add_instance: bool) {
        // Neither call can fail with `require_value` off.
        let _ = self.add_tag(TAG_KEY_CLASS, Some(class), false);
        if add_instance {
            let _ = self.add_tag(TAG_KEY_INSTANCE, Some(&instance_id()), false);
        }
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn inner(&self) -> &Logger {
        &self.inner
    }

    pub(crate) fn context(&self) -> &Arc<LogContext> {
        &self.context
    }
}

/**
A layer whose prefix is fixed when it is built.

Build one at the top of each method (or once per object, for a class-level logger) and log
through it. Nothing is inspected at logging time, which makes this the cheapest layer.

```rust
use std::sync::Arc;
use scopedlog::{InMemoryConsole, LogContext, MethodScopedLogger};

let console = Arc::new(InMemoryConsole::new());
let context = Arc::new(LogContext::builder().console(console.clone()).build());

let screen = MethodScopedLogger::new_in(&context, "CheckoutScreen", false).into_logger();
let mut load = MethodScopedLogger::with_method(Some(&screen), "CartLoader", Some("load"));
load.add_tag("Attempt", Some("2"), true).unwrap();
let load = load.into_logger();

load.warn("retrying", &[]);
assert_eq!(
    console.drain_logs(),
    "W/[scopedlog]: [Class CheckoutScreen][Class CartLoader][Method load][Attempt 2] retrying"
);
```
*/
#[derive(Debug, Clone)]
pub struct MethodScopedLogger {
    base: ScopedBase,
}

impl MethodScopedLogger {
    /// A root logger on the global context with a class tag, and an instance tag if asked.
    pub fn new(class: &str, add_instance_tag: bool) -> Self {
        Self::new_in(&global_context(), class, add_instance_tag)
    }

    pub fn new_in(context: &Arc<LogContext>, class: &str, add_instance_tag: bool) -> Self {
        let mut base = ScopedBase::new(None, context);
        base.add_class_tags(class, add_instance_tag);
        MethodScopedLogger { base }
    }

    /// Class (and instance) tags on top of `inner`, or on a fresh global sink without one.
    pub fn extend(inner: Option<&Logger>, class: &str, add_instance_tag: bool) -> Self {
        let mut base = ScopedBase::over(inner);
        base.add_class_tags(class, add_instance_tag);
        MethodScopedLogger { base }
    }

    /// Class and method tags on top of `inner`. An absent or empty method is skipped.
    pub fn with_method(inner: Option<&Logger>, class: &str, method: Option<&str>) -> Self {
        let mut base = ScopedBase::over(inner);
        base.add_class_tags(class, false);
        let _ = base.add_tag(TAG_KEY_METHOD, method, false);
        MethodScopedLogger { base }
    }

    /// Only a method tag on top of `inner`, typically a class-level logger.
    pub fn for_method(inner: &Logger, method: &str) -> Result<Self, Error> {
        let mut base = ScopedBase::wrapping(inner);
        base.add_tag(TAG_KEY_METHOD, Some(method), true)?;
        Ok(MethodScopedLogger { base })
    }

    /**
    A root logger on the global context whose class tag is the name of `T`.

    ```rust
    struct Uploader;
    let logger = scopedlog::MethodScopedLogger::for_type::<Uploader>(false);
    assert_eq!(logger.prefix(), "[Class Uploader]");
    ```
    */
    pub fn for_type<T: ?Sized>(add_instance_tag: bool) -> Self {
        Self::new(short_type_name::<T>(), add_instance_tag)
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

    /// The tags this layer adds.
    pub fn prefix(&self) -> &str {
        self.base.prefix()
    }

    pub fn into_logger(self) -> Logger {
        self.into()
    }

    pub(crate) fn base(&self) -> &ScopedBase {
        &self.base
    }
}

impl From<MethodScopedLogger> for Logger {
    fn from(logger: MethodScopedLogger) -> Self {
        Logger::from_layer(Layer::MethodScoped(logger))
    }
}

/// Last path segment of `T`'s name, generic arguments removed.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let plain = match full.find('<') {
        Some(index) => &full[..index],
        None => full,
    };
    plain.rsplit("::").next().unwrap_or(plain)
}
