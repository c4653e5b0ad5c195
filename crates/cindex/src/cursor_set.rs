//! Sets of cursors.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::registry::{Native, Registry};
use cindex_common::RawId;
use clang_sys::*;
use std::rc::Rc;

/// A hash set of cursors kept by libclang.
///
/// Not tied to an index: a set can hold cursors from any translation unit.
/// Cursors are checked against their unit when inserted or looked up.
#[derive(Debug)]
pub struct CursorSet {
    registry: Rc<Registry>,
    id: RawId,
}

impl CursorSet {
    pub fn new() -> Result<Self> {
        let raw = unsafe { clang_createCXCursorSet() };
        if raw.is_null() {
            return Err(Error::NullHandle { what: "cursor set" });
        }
        let registry = Registry::new();
        let id = registry.wrap(Native::CursorSet(raw));
        Ok(Self { registry, id })
    }

    fn raw(&self) -> Result<CXCursorSet> {
        Ok(self.registry.get(self.id)?.cursor_set())
    }

    pub fn contains(&self, cursor: &Cursor) -> Result<bool> {
        let raw = self.raw()?;
        let cursor = cursor.check()?;
        Ok(unsafe { clang_CXCursorSet_contains(raw, cursor) } != 0)
    }

    /// Insert a cursor; returns `false` if it was already present.
    pub fn insert(&self, cursor: &Cursor) -> Result<bool> {
        let raw = self.raw()?;
        let cursor = cursor.check()?;
        Ok(unsafe { clang_CXCursorSet_insert(raw, cursor) } != 0)
    }

    pub fn is_live(&self) -> bool {
        self.registry.is_live(self.id)
    }

    /// Release the set. Fails with `DoubleDispose` the second time.
    pub fn dispose(&self) -> Result<()> {
        Ok(self.registry.dispose(self.id)?)
    }
}

impl Drop for CursorSet {
    fn drop(&mut self) {
        self.registry.dispose_on_drop(self.id);
    }
}
