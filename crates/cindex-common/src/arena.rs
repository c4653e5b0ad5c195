//! Generational handle table for native objects.
//!
//! Every disposable native object the adapter hands out is stored here and
//! referred to by a [`RawId`]: a slot index plus the generation the slot had
//! when the object was wrapped. Disposal empties the slot and bumps its
//! generation, so a stale id is detected by comparison instead of by touching
//! a dangling pointer.
//!
//! Each entry also carries
//! - a liveness flag (`Live` or `Poisoned`),
//! - an epoch counter that value-like handles derived from it are tagged with,
//! - an in-use count, raised while a native traversal is walking the object,
//! - its parent container and the set of children created under it.

use crate::error::{LifecycleError, Result};
use rustc_hash::FxHashSet;
use std::fmt;

/// The kinds of native object tracked by a [`HandleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleClass {
    Index,
    TranslationUnit,
    IndexAction,
    DiagnosticSet,
    CursorSet,
    Remapping,
    ResourceUsage,
    TokenBatch,
    /// A native string returned by value (`CXString`).
    String,
    /// Value-like handles (cursor, type, location, token...) derived from a
    /// translation unit. Only used to label epoch errors.
    Derived(&'static str),
}

impl HandleClass {
    pub fn name(self) -> &'static str {
        match self {
            HandleClass::Index => "index",
            HandleClass::TranslationUnit => "translation unit",
            HandleClass::IndexAction => "index action",
            HandleClass::DiagnosticSet => "diagnostic set",
            HandleClass::CursorSet => "cursor set",
            HandleClass::Remapping => "remapping",
            HandleClass::ResourceUsage => "resource usage",
            HandleClass::TokenBatch => "token batch",
            HandleClass::String => "string",
            HandleClass::Derived(name) => name,
        }
    }
}

impl fmt::Display for HandleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of one wrapped native object.
///
/// Only a [`HandleTable`] can mint these, so a `RawId` can't be forged from
/// a pointer or an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawId {
    index: u32,
    generation: u32,
    class: HandleClass,
}

impl RawId {
    pub fn class(self) -> HandleClass {
        self.class
    }
}

/// Whether a live entry may still be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live,
    /// Terminal failure state; the entry may only be disposed.
    Poisoned,
}

#[derive(Debug)]
struct Entry<R> {
    raw: R,
    class: HandleClass,
    liveness: Liveness,
    epoch: u32,
    in_use: u32,
    parent: Option<RawId>,
    children: FxHashSet<RawId>,
}

#[derive(Debug)]
struct Slot<R> {
    generation: u32,
    entry: Option<Entry<R>>,
}

/// Table of wrapped native objects of raw type `R`.
#[derive(Debug)]
pub struct HandleTable<R> {
    slots: Vec<Slot<R>>,
    free: Vec<u32>,
}

impl<R> Default for HandleTable<R> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<R: Copy> HandleTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a raw native value with no parent container. Never fails.
    pub fn wrap(&mut self, class: HandleClass, raw: R) -> RawId {
        self.insert(class, raw, None)
    }

    /// Wrap a raw native value created inside `parent`.
    ///
    /// The parent must be usable; the new entry is recorded as one of its
    /// children until it is disposed.
    pub fn wrap_child(&mut self, parent: RawId, class: HandleClass, raw: R) -> Result<RawId> {
        self.get(parent)?;
        let id = self.insert(class, raw, Some(parent));
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.insert(id);
        }
        Ok(id)
    }

    fn insert(&mut self, class: HandleClass, raw: R, parent: Option<RawId>) -> RawId {
        let entry = Entry {
            raw,
            class,
            liveness: Liveness::Live,
            epoch: 0,
            in_use: 0,
            parent,
            children: FxHashSet::default(),
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            RawId {
                index,
                generation: slot.generation,
                class,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            RawId {
                index,
                generation: 0,
                class,
            }
        }
    }

    fn entry(&self, id: RawId) -> Option<&Entry<R>> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: RawId) -> Option<&mut Entry<R>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    /// Use a handle: return its raw value if it is live.
    pub fn get(&self, id: RawId) -> Result<R> {
        let entry = self
            .entry(id)
            .ok_or(LifecycleError::UseAfterDispose { class: id.class })?;
        match entry.liveness {
            Liveness::Live => Ok(entry.raw),
            Liveness::Poisoned => Err(LifecycleError::Poisoned { class: id.class }),
        }
    }

    /// Whether `id` still refers to a wrapped (possibly poisoned) object.
    pub fn contains(&self, id: RawId) -> bool {
        self.entry(id).is_some()
    }

    /// Whether `id` refers to a wrapped object that may be used.
    pub fn is_live(&self, id: RawId) -> bool {
        matches!(self.entry(id), Some(e) if e.liveness == Liveness::Live)
    }

    /// Current epoch of a live entry.
    pub fn epoch(&self, id: RawId) -> Result<u32> {
        self.get(id)?;
        Ok(self.entry(id).map(|e| e.epoch).unwrap_or_default())
    }

    /// Use a handle on behalf of a value derived from it at epoch `held`.
    pub fn get_at_epoch(&self, id: RawId, held: u32, derived: HandleClass) -> Result<R> {
        let raw = self.get(id)?;
        let current = self.entry(id).map(|e| e.epoch).unwrap_or_default();
        if current != held {
            return Err(LifecycleError::StaleHandle {
                class: derived,
                held,
                current,
            });
        }
        Ok(raw)
    }

    /// Mark a live entry as being walked by a native traversal.
    ///
    /// Nested traversals stack; every `enter` must be paired with a
    /// [`HandleTable::leave`].
    pub fn enter(&mut self, id: RawId) -> Result<R> {
        let raw = self.get(id)?;
        if let Some(entry) = self.entry_mut(id) {
            entry.in_use += 1;
        }
        Ok(raw)
    }

    /// End one traversal started with [`HandleTable::enter`].
    pub fn leave(&mut self, id: RawId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.in_use = entry.in_use.saturating_sub(1);
        }
    }

    /// Fail with `InUse` while a traversal is walking `id`.
    pub fn ensure_idle(&self, id: RawId) -> Result<()> {
        let entry = self
            .entry(id)
            .ok_or(LifecycleError::UseAfterDispose { class: id.class })?;
        if entry.in_use > 0 {
            return Err(LifecycleError::InUse { class: id.class });
        }
        Ok(())
    }

    /// Invalidate every value derived from `id` so far. Returns the new epoch.
    pub fn advance_epoch(&mut self, id: RawId) -> Result<u32> {
        self.ensure_idle(id)?;
        let entry = self
            .entry_mut(id)
            .ok_or(LifecycleError::UseAfterDispose { class: id.class })?;
        entry.epoch = entry.epoch.wrapping_add(1);
        Ok(entry.epoch)
    }

    /// Move an entry into the terminal poisoned state.
    pub fn poison(&mut self, id: RawId) -> Result<()> {
        self.ensure_idle(id)?;
        let entry = self
            .entry_mut(id)
            .ok_or(LifecycleError::UseAfterDispose { class: id.class })?;
        entry.liveness = Liveness::Poisoned;
        Ok(())
    }

    /// Number of children of `id` that have not been disposed.
    pub fn live_children(&self, id: RawId) -> Result<usize> {
        self.entry(id)
            .map(|e| e.children.len())
            .ok_or(LifecycleError::UseAfterDispose { class: id.class })
    }

    /// Dispose a handle, returning the raw value the caller must release.
    ///
    /// Disposing twice fails with `DoubleDispose`. Disposing a container
    /// whose children are still alive fails with `ChildrenStillLive`, and
    /// disposing an entry a traversal is walking fails with `InUse`; both
    /// leave the entry untouched.
    pub fn dispose(&mut self, id: RawId) -> Result<R> {
        let live = match self.entry(id) {
            None => return Err(LifecycleError::DoubleDispose { class: id.class }),
            Some(entry) if entry.in_use > 0 => {
                return Err(LifecycleError::InUse { class: id.class })
            }
            Some(entry) => entry.children.len(),
        };
        if live > 0 {
            return Err(LifecycleError::ChildrenStillLive {
                class: id.class,
                live,
            });
        }

        let slot = &mut self.slots[id.index as usize];
        let entry = slot
            .entry
            .take()
            .ok_or(LifecycleError::DoubleDispose { class: id.class })?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        if let Some(parent) = entry.parent {
            if let Some(parent) = self.entry_mut(parent) {
                parent.children.remove(&id);
            }
        }

        Ok(entry.raw)
    }

    /// Number of wrapped objects not yet disposed.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every remaining entry, children before their parents.
    pub fn drain(&mut self) -> Vec<(HandleClass, R)> {
        let mut live: Vec<(usize, RawId)> = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = &slot.entry {
                let id = RawId {
                    index: index as u32,
                    generation: slot.generation,
                    class: entry.class,
                };
                live.push((self.depth(id), id));
            }
        }
        live.sort_by(|a, b| b.0.cmp(&a.0));

        let mut drained = Vec::with_capacity(live.len());
        for (_, id) in live {
            let slot = &mut self.slots[id.index as usize];
            if let Some(entry) = slot.entry.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                drained.push((id.class, entry.raw));
            }
        }
        drained
    }

    fn depth(&self, id: RawId) -> usize {
        let mut depth = 0;
        let mut current = self.entry(id).and_then(|e| e.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.entry(parent).and_then(|e| e.parent);
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_then_get_returns_raw() {
        let mut table = HandleTable::new();
        let id = table.wrap(HandleClass::Index, 0xdead_usize);
        assert_eq!(table.get(id), Ok(0xdead));
        assert_eq!(id.class(), HandleClass::Index);
    }

    #[test]
    fn test_use_after_dispose() {
        let mut table = HandleTable::new();
        let id = table.wrap(HandleClass::CursorSet, 7u32);
        assert_eq!(table.dispose(id), Ok(7));
        assert_eq!(
            table.get(id),
            Err(LifecycleError::UseAfterDispose {
                class: HandleClass::CursorSet
            })
        );
    }

    #[test]
    fn test_double_dispose() {
        let mut table = HandleTable::new();
        let id = table.wrap(HandleClass::Remapping, 1u8);
        table.dispose(id).unwrap();
        assert_eq!(
            table.dispose(id),
            Err(LifecycleError::DoubleDispose {
                class: HandleClass::Remapping
            })
        );
    }

    #[test]
    fn test_reused_slot_does_not_revive_old_id() {
        let mut table = HandleTable::new();
        let old = table.wrap(HandleClass::DiagnosticSet, 1u32);
        table.dispose(old).unwrap();
        let new = table.wrap(HandleClass::DiagnosticSet, 2u32);

        assert_eq!(table.get(new), Ok(2));
        assert!(table.get(old).is_err());
        assert!(table.dispose(old).is_err());
        assert_eq!(table.get(new), Ok(2));
    }

    #[test]
    fn test_container_rejects_dispose_with_live_children() {
        let mut table = HandleTable::new();
        let index = table.wrap(HandleClass::Index, 1u32);
        let tu = table
            .wrap_child(index, HandleClass::TranslationUnit, 2u32)
            .unwrap();

        assert_eq!(
            table.dispose(index),
            Err(LifecycleError::ChildrenStillLive {
                class: HandleClass::Index,
                live: 1
            })
        );
        // The rejected dispose left the index usable.
        assert_eq!(table.get(index), Ok(1));

        table.dispose(tu).unwrap();
        assert_eq!(table.live_children(index), Ok(0));
        assert_eq!(table.dispose(index), Ok(1));
    }

    #[test]
    fn test_child_of_disposed_parent_is_rejected() {
        let mut table = HandleTable::new();
        let index = table.wrap(HandleClass::Index, 1u32);
        table.dispose(index).unwrap();
        assert!(table
            .wrap_child(index, HandleClass::TranslationUnit, 2u32)
            .is_err());
    }

    #[test]
    fn test_epoch_staleness() {
        let mut table = HandleTable::new();
        let tu = table.wrap(HandleClass::TranslationUnit, 5u32);
        let held = table.epoch(tu).unwrap();
        let cursor = HandleClass::Derived("cursor");

        assert_eq!(table.get_at_epoch(tu, held, cursor), Ok(5));
        let current = table.advance_epoch(tu).unwrap();
        assert_eq!(
            table.get_at_epoch(tu, held, cursor),
            Err(LifecycleError::StaleHandle {
                class: cursor,
                held,
                current
            })
        );
        assert_eq!(table.get_at_epoch(tu, current, cursor), Ok(5));
    }

    #[test]
    fn test_poisoned_entry_only_disposes() {
        let mut table = HandleTable::new();
        let tu = table.wrap(HandleClass::TranslationUnit, 9u32);
        table.poison(tu).unwrap();

        assert_eq!(
            table.get(tu),
            Err(LifecycleError::Poisoned {
                class: HandleClass::TranslationUnit
            })
        );
        assert!(!table.is_live(tu));
        assert!(table.contains(tu));
        assert_eq!(table.dispose(tu), Ok(9));
    }

    #[test]
    fn test_entry_in_use_rejects_dispose_and_reparse() {
        let mut table = HandleTable::new();
        let tu = table.wrap(HandleClass::TranslationUnit, 3u32);
        let in_use = LifecycleError::InUse {
            class: HandleClass::TranslationUnit,
        };

        assert_eq!(table.enter(tu), Ok(3));
        assert_eq!(table.enter(tu), Ok(3));
        assert_eq!(table.dispose(tu), Err(in_use.clone()));
        assert_eq!(table.advance_epoch(tu), Err(in_use.clone()));
        assert_eq!(table.poison(tu), Err(in_use.clone()));
        // Reads are still fine while walking.
        assert_eq!(table.get(tu), Ok(3));

        table.leave(tu);
        assert_eq!(table.ensure_idle(tu), Err(in_use));
        table.leave(tu);
        assert_eq!(table.ensure_idle(tu), Ok(()));
        assert_eq!(table.advance_epoch(tu), Ok(1));
        assert_eq!(table.dispose(tu), Ok(3));
    }

    #[test]
    fn test_drain_releases_children_first() {
        let mut table = HandleTable::new();
        let index = table.wrap(HandleClass::Index, "index");
        let tu = table
            .wrap_child(index, HandleClass::TranslationUnit, "tu")
            .unwrap();
        table
            .wrap_child(tu, HandleClass::TokenBatch, "tokens")
            .unwrap();
        table
            .wrap_child(index, HandleClass::IndexAction, "action")
            .unwrap();

        let order: Vec<_> = table.drain().into_iter().map(|(_, raw)| raw).collect();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], "tokens");
        assert_eq!(order[3], "index");
        assert!(table.is_empty());
    }
}
