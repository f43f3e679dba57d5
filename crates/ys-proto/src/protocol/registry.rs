//! Kind registry: maps kind tags to record layouts.
//!
//! # Lifecycle
//!
//! A registry is filled once, at startup, through `&mut self` methods.  After
//! that it is shared by reference (`&KindRegistry` or `Arc<KindRegistry>`),
//! and the borrow checker guarantees nobody can register into it anymore.
//! Lookups take `&self` and need no lock, so any number of threads can
//! resolve kinds concurrently.
//!
//! The process-wide registry behind [`KindRegistry::global`] is built exactly
//! once inside a [`OnceLock`]: every reader either waits for the build to
//! finish or sees the finished table, never a partial one.

use std::collections::btree_map::{self, BTreeMap};
use std::iter::Copied;
use std::sync::OnceLock;

use tracing::debug;

use crate::kinds;
use crate::protocol::codec::ProtocolError;
use crate::protocol::layout::RecordLayout;

/// Immutable-after-startup map from kind tag to [`RecordLayout`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindRegistry {
    entries: BTreeMap<u32, RecordLayout>,
}

/// Iterator over registered kind tags, in ascending order.
///
/// The iterator is lazy and `Clone`; a clone replays the tags not yet
/// consumed.  Call [`KindRegistry::all`] again to start from the beginning.
pub type KindTags<'a> = Copied<btree_map::Keys<'a, u32, RecordLayout>>;

static GLOBAL: OnceLock<Result<KindRegistry, ProtocolError>> = OnceLock::new();

impl KindRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a set of layouts.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::DuplicateKind`] on the first repeated tag.
    pub fn from_layouts(
        layouts: impl IntoIterator<Item = RecordLayout>,
    ) -> Result<Self, ProtocolError> {
        let mut registry = Self::new();
        for layout in layouts {
            registry.register(layout)?;
        }
        Ok(registry)
    }

    /// Builds a registry holding every kind compiled into the library.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidLayout`] if a compiled-in table is
    /// inconsistent, or [`ProtocolError::DuplicateKind`] if two tables claim
    /// the same tag.
    pub fn standard() -> Result<Self, ProtocolError> {
        let registry = Self::from_layouts(kinds::standard_layouts()?)?;
        debug!("standard kind registry built with {} kinds", registry.len());
        Ok(registry)
    }

    /// The process-wide standard registry, built on first use.
    ///
    /// # Errors
    ///
    /// Returns the error [`KindRegistry::standard`] produced, on every call.
    pub fn global() -> Result<&'static KindRegistry, ProtocolError> {
        GLOBAL
            .get_or_init(Self::standard)
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Adds a layout under its kind tag.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::DuplicateKind`] if the tag is already taken;
    /// the existing layout is left in place.
    pub fn register(&mut self, layout: RecordLayout) -> Result<(), ProtocolError> {
        let tag = layout.kind_tag();
        match self.entries.entry(tag) {
            btree_map::Entry::Occupied(_) => Err(ProtocolError::DuplicateKind(tag)),
            btree_map::Entry::Vacant(slot) => {
                debug!(
                    "registered kind {} ({}), {} bytes, {} fields",
                    tag,
                    layout.name(),
                    layout.total_size(),
                    layout.fields().len()
                );
                slot.insert(layout);
                Ok(())
            }
        }
    }

    /// Resolves a kind tag to its layout.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownKind`] if nothing is registered for `tag`.
    pub fn lookup(&self, tag: u32) -> Result<&RecordLayout, ProtocolError> {
        self.entries.get(&tag).ok_or(ProtocolError::UnknownKind(tag))
    }

    /// Returns `true` if `tag` is registered.
    pub fn contains(&self, tag: u32) -> bool {
        self.entries.contains_key(&tag)
    }

    /// All registered kind tags, ascending.
    pub fn all(&self) -> KindTags<'_> {
        self.entries.keys().copied()
    }

    /// All registered layouts, ordered by tag.
    pub fn iter(&self) -> impl Iterator<Item = &RecordLayout> + '_ {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
