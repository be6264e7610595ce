//! Snippet registry for content-management integration.
//!
//! Types become discoverable by an external admin surface only when the
//! composition root registers them here. Nothing registers itself.

use std::collections::BTreeMap;

use schemars::{JsonSchema, Schema};

use crate::store::Event;

/// A record type the admin surface can list and edit.
pub trait Snippet: JsonSchema {
    /// Stable name the admin surface uses for this type.
    const NAME: &'static str;
}

impl Snippet for Event {
    const NAME: &'static str = "meetup";
}

/// Registered snippet types, keyed by name.
#[derive(Debug, Default, Clone)]
pub struct SnippetRegistry {
    entries: BTreeMap<&'static str, Schema>,
}

impl SnippetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under [`Snippet::NAME`] along with its JSON schema.
    ///
    /// Registering the same type again is a no-op.
    pub fn register<T: Snippet>(&mut self) -> &mut Self {
        self.entries.entry(T::NAME).or_insert_with(|| {
            tracing::debug!(snippet = T::NAME, "registered snippet");
            schemars::schema_for!(T)
        });
        self
    }

    pub fn is_registered<T: Snippet>(&self) -> bool {
        self.entries.contains_key(T::NAME)
    }

    /// Schema of the snippet registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.entries.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}
