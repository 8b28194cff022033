// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide persistent tags.
//!
//! A [`TagRegistry`] holds `[KEY VALUE]` tags that are prepended to every message reaching the
//! sink, whichever logger produced it. Mutations are serialized by one lock; the rendered prefix
//! is recomputed and published while that lock is held, and readers load it without locking.
//! A reader racing a mutation sees the prefix from before or after it, never a mix.
//!
//! ```rust
//! use scopedlog::{RemoveStatus, TagRegistry};
//!
//! let registry = TagRegistry::new();
//! let user = registry.add("USER", "42").unwrap();
//! registry.add("BUILD", "debug");
//! assert_eq!(registry.current_prefix().as_str(), "[USER 42][BUILD debug]");
//!
//! assert_eq!(registry.remove(Some(user)), RemoveStatus::Removed);
//! assert_eq!(registry.current_prefix().as_str(), "[BUILD debug]");
//! ```

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use uuid::Uuid;

/// Opaque identity of a [`PersistentTag`], handed out by [`TagRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagId(Uuid);

impl TagId {
    fn new() -> Self {
        TagId(Uuid::new_v4())
    }
}

impl Display for TagId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/**
An immutable key/value tag.

Keys are not unique: two tags may share a key and even a value. Equality is by [`TagId`] only.
*/
#[derive(Debug, Clone)]
pub struct PersistentTag {
    id: TagId,
    key: String,
    value: String,
}

impl PersistentTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        PersistentTag {
            id: TagId::new(),
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl PartialEq for PersistentTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PersistentTag {}

impl Display for PersistentTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}]", self.key, self.value)
    }
}

/// Outcome of [`TagRegistry::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveStatus {
    /// No tag with that id was registered.
    NotFound,
    /// The caller passed no id.
    IdNull,
    Removed,
}

/// Ordered, concurrently mutable set of [`PersistentTag`]s with a cached rendering.
#[derive(Debug)]
pub struct TagRegistry {
    tags: Mutex<Vec<PersistentTag>>,
    prefix: ArcSwap<String>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TagRegistry {
    pub fn new() -> Self {
        TagRegistry {
            tags: Mutex::new(Vec::new()),
            prefix: ArcSwap::from_pointee(String::new()),
        }
    }

    /// Must be called with the lock held so that publication order matches mutation order.
    fn publish(&self, tags: &[PersistentTag]) {
        let rendered: String = tags.iter().map(ToString::to_string).collect();
        self.prefix.store(Arc::new(rendered));
    }

    /**
    Appends a tag and returns its id.

    Returns `None` without touching the registry when either `key` or `value` is absent.
    */
    pub fn add<'a>(
        &self,
        key: impl Into<Option<&'a str>>,
        value: impl Into<Option<&'a str>>,
    ) -> Option<TagId> {
        let (key, value) = (key.into()?, value.into()?);
        let tag = PersistentTag::new(key, value);
        let id = tag.id();
        let mut tags = self.tags.lock();
        tags.push(tag);
        self.publish(&tags);
        Some(id)
    }

    /// Removes the tag with the given id.
    pub fn remove(&self, id: Option<TagId>) -> RemoveStatus {
        let Some(id) = id else {
            return RemoveStatus::IdNull;
        };
        let mut tags = self.tags.lock();
        match tags.iter().position(|tag| tag.id == id) {
            Some(index) => {
                tags.remove(index);
                self.publish(&tags);
                RemoveStatus::Removed
            }
            None => RemoveStatus::NotFound,
        }
    }

    /// Removes every tag whose key equals `key` (case-sensitive) and returns how many went.
    pub fn remove_all_by_key<'a>(&self, key: impl Into<Option<&'a str>>) -> usize {
        let Some(key) = key.into() else {
            return 0;
        };
        let mut tags = self.tags.lock();
        let before = tags.len();
        tags.retain(|tag| tag.key != key);
        let removed = before - tags.len();
        if removed > 0 {
            self.publish(&tags);
        }
        removed
    }

    /// Removes every tag and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut tags = self.tags.lock();
        let count = tags.len();
        tags.clear();
        self.publish(&tags);
        count
    }

    /// The concatenated rendering of all tags, in insertion order. Never blocks.
    pub fn current_prefix(&self) -> Arc<String> {
        self.prefix.load_full()
    }

    /// A copy of the registered tags, in insertion order.
    pub fn tags(&self) -> Vec<PersistentTag> {
        self.tags.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.tags.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
