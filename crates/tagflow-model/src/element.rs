//! The unit of data flowing through a pipeline.
//!
//! An element carries caller-supplied input, the output produced by
//! transformation steps, a routing tag, and the notices accumulated along the
//! way. One element instance is mutated in place across all steps of a chain;
//! it is cloned only where isolation is required (parallel fan-out and
//! any-chain attempts).

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::kind::DataKind;
use crate::notice::{Level, Notice};

/// Resolver invoked on every read of a derived tag.
pub type TagResolver<V> = dyn Fn(&Element<V>) -> anyhow::Result<Option<String>> + Send + Sync;

/// Routing tag of an element: a fixed value, or a function of the element
/// evaluated lazily on every read.
pub enum Tag<V: DataKind> {
    Fixed(Option<String>),
    Derived(Arc<TagResolver<V>>),
}

impl<V: DataKind> Clone for Tag<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(tag) => Self::Fixed(tag.clone()),
            Self::Derived(resolver) => Self::Derived(Arc::clone(resolver)),
        }
    }
}

impl<V: DataKind> fmt::Debug for Tag<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(tag) => f.debug_tuple("Fixed").field(tag).finish(),
            Self::Derived(_) => f.debug_tuple("Derived").field(&"<resolver>").finish(),
        }
    }
}

/// Raised when a derived tag resolver fails.
///
/// The element records the failure as an ERROR notice before this error is
/// returned, so every consumer of [`Element::tag`] must handle it but none
/// has to report it again.
#[derive(Debug, Error)]
#[error("tag of element {id:?} could not be resolved: {source}")]
pub struct TagError {
    pub id: Option<String>,
    #[source]
    pub source: anyhow::Error,
}

/// A mutable record holding input, output, tag, and diagnostics.
#[derive(Debug, Clone)]
pub struct Element<V: DataKind> {
    /// Caller-assigned identifier; never generated by the engine.
    pub id: Option<String>,
    /// Caller-supplied value, mutated in place by mutable steps.
    pub input: V,
    /// Produced by transformer steps; absent until the first one runs.
    pub output: Option<V>,
    tag: Tag<V>,
    notices: BTreeSet<Notice>,
}

impl<V: DataKind> Element<V> {
    pub fn new(input: V) -> Self {
        Self {
            id: None,
            input,
            output: None,
            tag: Tag::Fixed(None),
            notices: BTreeSet::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Tag::Fixed(Some(tag.into()));
        self
    }

    pub fn with_tag_fn<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Element<V>) -> anyhow::Result<Option<String>> + Send + Sync + 'static,
    {
        self.tag = Tag::Derived(Arc::new(resolver));
        self
    }

    /// Resolve the routing tag.
    ///
    /// A fixed tag is returned as-is. A derived tag runs its resolver against
    /// the element; on failure the element gains exactly one ERROR notice and
    /// the error is surfaced to the caller.
    pub fn tag(&mut self) -> Result<Option<String>, TagError> {
        let resolver = match &self.tag {
            Tag::Fixed(tag) => return Ok(tag.clone()),
            Tag::Derived(resolver) => Arc::clone(resolver),
        };
        match resolver.as_ref()(self) {
            Ok(tag) => Ok(tag),
            Err(source) => {
                let err = TagError {
                    id: self.id.clone(),
                    source,
                };
                self.push_notice(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Append a notice. Notices are never removed; identical diagnostics
    /// collapse into one.
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.insert(notice);
    }

    pub fn notices(&self) -> &BTreeSet<Notice> {
        &self.notices
    }

    /// Whether the element carries at least one notice of any given level.
    pub fn has_any(&self, levels: &[Level]) -> bool {
        self.notices.iter().any(|n| levels.contains(&n.level))
    }

    /// Whether the element carries a notice at or above the given level.
    pub fn has_at_least(&self, level: Level) -> bool {
        self.notices.iter().any(|n| n.level >= level)
    }
}
