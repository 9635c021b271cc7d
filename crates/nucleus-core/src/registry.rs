//! Part registry - one entry per successfully loaded part

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

use crate::annotation::Annotation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("part {0:?} is already registered")]
    DuplicateName(String),
    #[error("render handle for part {name:?} is already registered as {existing:?}")]
    DuplicateHandle { name: String, existing: String },
}

/// Registration index of a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub usize);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

/// A loaded part and its interaction state
#[derive(Debug, Clone)]
pub struct PartEntry<H, L> {
    id: PartId,
    name: String,
    handle: H,
    /// Mirrors the external handle's visibility
    pub(crate) visible: bool,
    pub(crate) annotation: Option<Annotation<L>>,
}

impl<H: Copy, L> PartEntry<H, L> {
    pub fn id(&self) -> PartId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> H {
        self.handle
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn annotation(&self) -> Option<&Annotation<L>> {
        self.annotation.as_ref()
    }
}

/// Registry of parts, keyed by name and by render handle.
///
/// Entries are never removed. Iteration follows registration order.
#[derive(Debug, Clone)]
pub struct PartRegistry<H, L> {
    entries: Vec<PartEntry<H, L>>,
    by_name: HashMap<String, PartId>,
    by_handle: HashMap<H, PartId>,
}

impl<H, L> Default for PartRegistry<H, L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
            by_handle: HashMap::new(),
        }
    }
}

impl<H, L> PartRegistry<H, L>
where
    H: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a part under a unique name.
    ///
    /// The entry starts visible with no annotation. Re-registering a name or
    /// a handle is rejected and leaves the registry unchanged.
    pub fn register(&mut self, name: &str, handle: H) -> Result<&PartEntry<H, L>, RegistryError> {
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        if let Some(existing) = self.by_handle.get(&handle) {
            return Err(RegistryError::DuplicateHandle {
                name: name.to_string(),
                existing: self.entries[existing.0].name.clone(),
            });
        }

        let id = PartId(self.entries.len());
        self.entries.push(PartEntry {
            id,
            name: name.to_string(),
            handle,
            visible: true,
            annotation: None,
        });
        self.by_name.insert(name.to_string(), id);
        self.by_handle.insert(handle, id);

        Ok(&self.entries[id.0])
    }

    pub fn get(&self, id: PartId) -> Option<&PartEntry<H, L>> {
        self.entries.get(id.0)
    }

    pub fn get_mut(&mut self, id: PartId) -> Option<&mut PartEntry<H, L>> {
        self.entries.get_mut(id.0)
    }

    pub fn lookup(&self, name: &str) -> Option<&PartEntry<H, L>> {
        self.by_name.get(name).and_then(|id| self.entries.get(id.0))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut PartEntry<H, L>> {
        let id = *self.by_name.get(name)?;
        self.entries.get_mut(id.0)
    }

    pub fn lookup_by_handle(&self, handle: H) -> Option<&PartEntry<H, L>> {
        self.by_handle.get(&handle).and_then(|id| self.entries.get(id.0))
    }

    /// All entries in registration order
    pub fn all(&self) -> &[PartEntry<H, L>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
