//! Per-index handle registry.
//!
//! Every disposable object created under one [`Index`](crate::Index) lives in
//! a shared [`Registry`]. Handles keep an `Rc` to it, so the registry (and the
//! native objects it still owns) outlives the last handle. Dropping the
//! registry releases whatever was never disposed, children first.
//!
//! No `RefCell` borrow is held across a native call: callbacks fired from
//! inside libclang may re-enter the registry freely. What they may not do is
//! release or reparse an object libclang is walking; an [`InUse`] guard
//! marks that object for the duration of the native call.

use cindex_common::{HandleClass, HandleTable, LifecycleError, RawId};
use clang_sys::*;
use std::cell::RefCell;
use std::os::raw::c_uint;
use std::rc::Rc;

/// A raw native object together with what it takes to dispose it.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Native {
    Index(CXIndex),
    TranslationUnit(CXTranslationUnit),
    IndexAction(CXIndexAction),
    /// Sets loaded from a file are owned by the caller; sets taken from a
    /// translation unit belong to it and are freed on reparse.
    DiagnosticSet {
        set: CXDiagnosticSet,
        owned: bool,
    },
    CursorSet(CXCursorSet),
    Remapping(CXRemapping),
    ResourceUsage(CXTUResourceUsage),
    Tokens {
        tu: CXTranslationUnit,
        tokens: *mut CXToken,
        count: c_uint,
    },
}

impl Native {
    pub(crate) fn class(&self) -> HandleClass {
        match self {
            Native::Index(_) => HandleClass::Index,
            Native::TranslationUnit(_) => HandleClass::TranslationUnit,
            Native::IndexAction(_) => HandleClass::IndexAction,
            Native::DiagnosticSet { .. } => HandleClass::DiagnosticSet,
            Native::CursorSet(_) => HandleClass::CursorSet,
            Native::Remapping(_) => HandleClass::Remapping,
            Native::ResourceUsage(_) => HandleClass::ResourceUsage,
            Native::Tokens { .. } => HandleClass::TokenBatch,
        }
    }

    pub(crate) fn index(self) -> CXIndex {
        match self {
            Native::Index(index) => index,
            _ => std::ptr::null_mut(),
        }
    }

    pub(crate) fn translation_unit(self) -> CXTranslationUnit {
        match self {
            Native::TranslationUnit(tu) => tu,
            _ => std::ptr::null_mut(),
        }
    }

    pub(crate) fn index_action(self) -> CXIndexAction {
        match self {
            Native::IndexAction(action) => action,
            _ => std::ptr::null_mut(),
        }
    }

    pub(crate) fn diagnostic_set(self) -> CXDiagnosticSet {
        match self {
            Native::DiagnosticSet { set, .. } => set,
            _ => std::ptr::null_mut(),
        }
    }

    pub(crate) fn cursor_set(self) -> CXCursorSet {
        match self {
            Native::CursorSet(set) => set,
            _ => std::ptr::null_mut(),
        }
    }

    pub(crate) fn remapping(self) -> CXRemapping {
        match self {
            Native::Remapping(remap) => remap,
            _ => std::ptr::null_mut(),
        }
    }

    pub(crate) fn tokens(self) -> (*mut CXToken, c_uint) {
        match self {
            Native::Tokens { tokens, count, .. } => (tokens, count),
            _ => (std::ptr::null_mut(), 0),
        }
    }

    pub(crate) fn resource_usage(self) -> Option<CXTUResourceUsage> {
        match self {
            Native::ResourceUsage(usage) => Some(usage),
            _ => None,
        }
    }

    /// Call the native dispose routine for this object.
    ///
    /// # Safety
    /// The object must be live and must not be used afterwards.
    unsafe fn dispose(self) {
        match self {
            Native::Index(index) => clang_disposeIndex(index),
            Native::TranslationUnit(tu) => clang_disposeTranslationUnit(tu),
            Native::IndexAction(action) => clang_IndexAction_dispose(action),
            Native::DiagnosticSet { set, owned: true } => clang_disposeDiagnosticSet(set),
            Native::DiagnosticSet { owned: false, .. } => {}
            Native::CursorSet(set) => clang_disposeCXCursorSet(set),
            Native::Remapping(remap) => clang_remap_dispose(remap),
            Native::ResourceUsage(usage) => clang_disposeCXTUResourceUsage(usage),
            Native::Tokens { tu, tokens, count } => clang_disposeTokens(tu, tokens, count),
        }
    }
}

/// Shared table of the native objects created under one index.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    table: RefCell<HandleTable<Native>>,
}

impl Registry {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub(crate) fn wrap(&self, raw: Native) -> RawId {
        let id = self.table.borrow_mut().wrap(raw.class(), raw);
        tracing::trace!(class = %raw.class(), "wrapped native handle");
        id
    }

    /// Wrap `raw` as a child of `parent`.
    ///
    /// If the parent is no longer usable the native object is released
    /// immediately so it cannot leak.
    pub(crate) fn wrap_child(&self, parent: RawId, raw: Native) -> cindex_common::Result<RawId> {
        let wrapped = self.table.borrow_mut().wrap_child(parent, raw.class(), raw);
        if wrapped.is_err() {
            unsafe { raw.dispose() };
        }
        wrapped
    }

    pub(crate) fn get(&self, id: RawId) -> cindex_common::Result<Native> {
        self.table.borrow().get(id)
    }

    pub(crate) fn get_at_epoch(
        &self,
        id: RawId,
        held: u32,
        derived: &'static str,
    ) -> cindex_common::Result<Native> {
        self.table
            .borrow()
            .get_at_epoch(id, held, HandleClass::Derived(derived))
    }

    pub(crate) fn epoch(&self, id: RawId) -> cindex_common::Result<u32> {
        self.table.borrow().epoch(id)
    }

    pub(crate) fn advance_epoch(&self, id: RawId) -> cindex_common::Result<u32> {
        self.table.borrow_mut().advance_epoch(id)
    }

    pub(crate) fn poison(&self, id: RawId) -> cindex_common::Result<()> {
        self.table.borrow_mut().poison(id)
    }

    /// Mark `id` as walked by a native call until the guard drops.
    pub(crate) fn enter(registry: &Rc<Self>, id: RawId) -> cindex_common::Result<InUse> {
        registry.table.borrow_mut().enter(id)?;
        Ok(InUse {
            registry: registry.clone(),
            id,
        })
    }

    /// Fail with `InUse` while a native call is walking `id`.
    pub(crate) fn ensure_idle(&self, id: RawId) -> cindex_common::Result<()> {
        self.table.borrow().ensure_idle(id)
    }

    pub(crate) fn contains(&self, id: RawId) -> bool {
        self.table.borrow().contains(id)
    }

    pub(crate) fn is_live(&self, id: RawId) -> bool {
        self.table.borrow().is_live(id)
    }

    /// Remove `id` from the table and release the native object.
    pub(crate) fn dispose(&self, id: RawId) -> cindex_common::Result<()> {
        let raw = self.table.borrow_mut().dispose(id)?;
        tracing::trace!(class = %id.class(), "disposing native handle");
        unsafe { raw.dispose() };
        Ok(())
    }

    /// Dispose from a `Drop` impl: ignore handles that are already gone and
    /// leave containers with live children to the registry teardown.
    pub(crate) fn dispose_on_drop(&self, id: RawId) {
        if !self.contains(id) {
            return;
        }
        match self.dispose(id) {
            Ok(()) => {}
            Err(LifecycleError::ChildrenStillLive { class, live }) => {
                tracing::debug!(%class, live, "deferring release until children are disposed");
            }
            Err(LifecycleError::InUse { class }) => {
                tracing::debug!(%class, "dropped while in use; released with the registry");
            }
            Err(err) => tracing::debug!(%err, "dispose on drop failed"),
        }
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        let leftover = self.table.get_mut().drain();
        if leftover.is_empty() {
            return;
        }
        tracing::warn!(
            count = leftover.len(),
            "releasing native handles that were never disposed"
        );
        for (class, raw) in leftover {
            tracing::trace!(%class, "releasing leaked handle");
            unsafe { raw.dispose() };
        }
    }
}

/// Holds a registry entry in use; see [`Registry::enter`].
#[derive(Debug)]
pub(crate) struct InUse {
    registry: Rc<Registry>,
    id: RawId,
}

impl Drop for InUse {
    fn drop(&mut self) {
        self.registry.table.borrow_mut().leave(self.id);
    }
}

/// Link from a value-like handle back to the object it was derived from,
/// tagged with the epoch it was derived at.
///
/// The owner is usually a translation unit. Locations and ranges read from
/// a diagnostic set loaded from disk point into the set's storage instead,
/// so their owner is the set; [`TuRef::check`] then yields a null unit.
#[derive(Debug, Clone)]
pub(crate) struct TuRef {
    registry: Rc<Registry>,
    id: RawId,
    epoch: u32,
}

impl TuRef {
    pub(crate) fn new(registry: Rc<Registry>, id: RawId) -> cindex_common::Result<Self> {
        let epoch = registry.epoch(id)?;
        Ok(Self {
            registry,
            id,
            epoch,
        })
    }

    /// The translation unit, if `derived` values from this epoch are still valid.
    pub(crate) fn check(&self, derived: &'static str) -> cindex_common::Result<CXTranslationUnit> {
        self.registry
            .get_at_epoch(self.id, self.epoch, derived)
            .map(Native::translation_unit)
    }

    /// Check the owner and hold it in use until the guard drops.
    pub(crate) fn enter(&self, derived: &'static str) -> cindex_common::Result<InUse> {
        self.check(derived)?;
        Registry::enter(&self.registry, self.id)
    }
}

impl PartialEq for TuRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry)
            && self.id == other.id
            && self.epoch == other.epoch
    }
}

/// Check an optional owner. Null values carry no owner and always pass.
pub(crate) fn check_owner(
    tu: &Option<TuRef>,
    derived: &'static str,
) -> cindex_common::Result<Option<CXTranslationUnit>> {
    tu.as_ref().map(|tu| tu.check(derived)).transpose()
}
