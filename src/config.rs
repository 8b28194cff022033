// SPDX-License-Identifier: MIT OR Apache-2.0

//! Initialization inputs supplied by the host application.
//!
//! ```rust
//! use scopedlog::{AppContext, InitOptions, Level};
//!
//! let app = AppContext::new("com.example.app", "/data/com.example.app/files");
//! let options = InitOptions::default()
//!     .with_persist_to_file(true)
//!     .with_min_persistence_level(Level::Info)
//!     .with_full_trace(true);
//! assert_eq!(options.min_console_level, Level::Verbose);
//! # let _ = app;
//! ```

use std::path::{Path, PathBuf};

use crate::level::Level;

/// What the library needs to know about the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    /// Base package (or crate path) of the application; filters full-trace frames.
    pub package_name: String,
    /// Application-private files directory.
    pub files_dir: PathBuf,
    /// External storage directory, when the platform has one.
    pub external_files_dir: Option<PathBuf>,
}

impl AppContext {
    pub fn new(package_name: impl Into<String>, files_dir: impl AsRef<Path>) -> Self {
        AppContext {
            package_name: package_name.into(),
            files_dir: files_dir.as_ref().to_path_buf(),
            external_files_dir: None,
        }
    }

    pub fn with_external_files_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.external_files_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

/// Options for [`LogContext::initialize`](crate::LogContext::initialize).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOptions {
    pub persist_to_file: bool,
    pub min_persistence_level: Level,
    pub min_console_level: Level,
    pub enable_full_trace: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        InitOptions {
            persist_to_file: false,
            min_persistence_level: Level::Verbose,
            min_console_level: Level::Verbose,
            enable_full_trace: false,
        }
    }
}

impl InitOptions {
    pub const fn with_persist_to_file(mut self, persist: bool) -> Self {
        self.persist_to_file = persist;
        self
    }

    pub const fn with_min_persistence_level(mut self, level: Level) -> Self {
        self.min_persistence_level = level;
        self
    }

    pub const fn with_min_console_level(mut self, level: Level) -> Self {
        self.min_console_level = level;
        self
    }

    pub const fn with_full_trace(mut self, enable: bool) -> Self {
        self.enable_full_trace = enable;
        self
    }
}
