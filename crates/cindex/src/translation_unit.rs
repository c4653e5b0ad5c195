//! Translation units.
//!
//! A translation unit is the parsed form of one main file. Cursors, types,
//! locations and tokens obtained from it are only valid until it is
//! reparsed or disposed; each reparse starts a new epoch and values from an
//! older epoch fail with `StaleHandle`.
//!
//! A reparse that fails leaves libclang's translation unit unusable. The
//! handle is poisoned: every query fails with `Poisoned` and only
//! [`TranslationUnit::dispose`] still works.

use crate::cursor::Cursor;
use crate::error::{Error, ErrorCode, Result, SaveError};
use crate::index::Index;
use crate::location::{File, SourceLocation, SourceRange};
use crate::registry::{Native, Registry, TuRef};
use crate::string::cx_string_to_string;
use crate::unsaved::{self, UnsavedFile};
use crate::visit::{self, Visit, VisitOutcome};
use cindex_common::{HandleClass, RawId, Release, Tracked};
use clang_sys::*;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A parsed source file and everything it includes.
#[derive(Debug)]
pub struct TranslationUnit {
    registry: Rc<Registry>,
    id: RawId,
    path: PathBuf,
}

/// Target a translation unit was compiled for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    /// Normalized target triple, e.g. `x86_64-unknown-linux-gnu`.
    pub triple: String,
    /// Pointer width in bits.
    pub pointer_width: u32,
}

#[derive(Debug)]
struct NativeRangeList(*mut CXSourceRangeList);

impl Release for NativeRangeList {
    const CLASS: HandleClass = HandleClass::Derived("source range list");

    fn release(&mut self) {
        if !self.0.is_null() {
            unsafe { clang_disposeSourceRangeList(self.0) }
        }
    }
}

impl TranslationUnit {
    pub(crate) fn wrap(index: &Index, raw: CXTranslationUnit, path: &Path) -> Result<Self> {
        let registry = index.registry().clone();
        let id = registry.wrap_child(index.id(), Native::TranslationUnit(raw))?;
        Ok(Self {
            registry,
            id,
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn raw(&self) -> Result<CXTranslationUnit> {
        Ok(self.registry.get(self.id)?.translation_unit())
    }

    /// Link for values derived from the current epoch.
    pub(crate) fn owner(&self) -> Result<TuRef> {
        Ok(TuRef::new(self.registry.clone(), self.id)?)
    }

    pub(crate) fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    pub(crate) fn id(&self) -> RawId {
        self.id
    }

    /// The main file this unit was parsed from, as given to `parse`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The main file name as libclang reports it.
    pub fn spelling(&self) -> Result<String> {
        let raw = self.raw()?;
        Ok(cx_string_to_string(unsafe {
            clang_getTranslationUnitSpelling(raw)
        }))
    }

    /// The root cursor.
    pub fn cursor(&self) -> Result<Cursor> {
        let raw = self.raw()?;
        Ok(Cursor::from_raw(
            unsafe { clang_getTranslationUnitCursor(raw) },
            Some(self.owner()?),
        ))
    }

    /// The most specific cursor covering `location`, which must come from
    /// this unit at its current epoch.
    pub fn cursor_at(&self, location: &SourceLocation) -> Result<Cursor> {
        let raw = self.raw()?;
        let owner = self.owner()?;
        if let Some(tu) = &location.tu {
            tu.check("source location")?;
            if *tu != owner {
                return Err(Error::InvalidArgument("clang_getCursor"));
            }
        }
        Ok(Cursor::from_raw(
            unsafe { clang_getCursor(raw, location.raw) },
            Some(owner),
        ))
    }

    /// A file that is part of this unit.
    pub fn file(&self, name: impl AsRef<Path>) -> Result<Option<File>> {
        let raw = self.raw()?;
        let name = CString::new(name.as_ref().to_string_lossy().as_bytes())?;
        let file = unsafe { clang_getFile(raw, name.as_ptr()) };
        Ok(File::from_raw(file, Some(self.owner()?)))
    }

    /// The contents of `file` as libclang saw them.
    pub fn file_contents(&self, file: &File) -> Result<Option<String>> {
        let raw = self.raw()?;
        crate::registry::check_owner(&file.tu, "file")?;
        let mut size = 0;
        let ptr = unsafe { clang_getFileContents(raw, file.raw, &mut size) };
        if ptr.is_null() {
            return Ok(None);
        }
        let bytes = unsafe { std::slice::from_raw_parts(ptr as *const u8, size as usize) };
        Ok(Some(String::from_utf8_lossy(bytes).into_owned()))
    }

    /// A location by file, line and column.
    pub fn location(&self, file: &File, line: u32, column: u32) -> Result<SourceLocation> {
        self.raw()?;
        file.location(line, column)
    }

    /// A location by file and byte offset.
    pub fn location_for_offset(&self, file: &File, offset: u32) -> Result<SourceLocation> {
        self.raw()?;
        file.location_at_offset(offset)
    }

    /// Whether `file` is guarded against multiple inclusion.
    pub fn is_multiple_include_guarded(&self, file: &File) -> Result<bool> {
        self.raw()?;
        file.is_multiple_include_guarded()
    }

    pub fn target_info(&self) -> Result<TargetInfo> {
        let raw = self.raw()?;
        unsafe {
            let info = clang_getTranslationUnitTargetInfo(raw);
            let target = TargetInfo {
                triple: cx_string_to_string(clang_TargetInfo_getTriple(info)),
                pointer_width: clang_TargetInfo_getPointerWidth(info).max(0) as u32,
            };
            clang_TargetInfo_dispose(info);
            Ok(target)
        }
    }

    /// Ranges skipped by the preprocessor in `file` (`#if 0` blocks and the like).
    pub fn skipped_ranges(&self, file: &File) -> Result<Vec<SourceRange>> {
        let raw = self.raw()?;
        crate::registry::check_owner(&file.tu, "file")?;
        let list = unsafe { clang_getSkippedRanges(raw, file.raw) };
        self.range_list(list)
    }

    /// Skipped ranges across every file of the unit.
    pub fn all_skipped_ranges(&self) -> Result<Vec<SourceRange>> {
        let raw = self.raw()?;
        let list = unsafe { clang_getAllSkippedRanges(raw) };
        self.range_list(list)
    }

    fn range_list(&self, list: *mut CXSourceRangeList) -> Result<Vec<SourceRange>> {
        let list = Tracked::acquire(NativeRangeList(list));
        let owner = self.owner()?;
        let native = list.get()?.0;
        if native.is_null() {
            return Ok(Vec::new());
        }
        let native = unsafe { &*native };
        if native.ranges.is_null() {
            return Ok(Vec::new());
        }
        let ranges = unsafe { std::slice::from_raw_parts(native.ranges, native.count as usize) };
        Ok(ranges
            .iter()
            .map(|r| SourceRange::from_raw(*r, Some(owner.clone())))
            .collect())
    }

    /// Visit every file included by this unit.
    ///
    /// The visitor gets the included file and its inclusion stack, innermost
    /// first. The stack is empty for the main file.
    pub fn inclusions<F>(&self, visitor: F) -> Result<()>
    where
        F: FnMut(File, &[SourceLocation]),
    {
        let raw = self.raw()?;
        visit::visit_inclusions(raw, &self.owner()?, visitor)
    }

    /// Visit every `#include` directive in `file`.
    pub fn find_includes_in_file<F>(&self, file: &File, visitor: F) -> Result<VisitOutcome>
    where
        F: FnMut(Cursor, SourceRange) -> Visit,
    {
        let raw = self.raw()?;
        visit::find_includes_in_file(raw, &self.owner()?, file, visitor)
    }

    /// Parse the main file again, with `unsaved` overriding disk contents.
    ///
    /// Every cursor, type, location and token obtained before the call is
    /// stale afterwards. On failure the unit is poisoned. Fails with `InUse`
    /// when called from a callback that is walking this unit.
    pub fn reparse(&self, unsaved: &[UnsavedFile]) -> Result<()> {
        let raw = self.raw()?;
        self.registry.ensure_idle(self.id)?;
        let mut native_unsaved = unsaved::to_native(unsaved);

        let code = unsafe {
            let options = clang_defaultReparseOptions(raw);
            clang_reparseTranslationUnit(
                raw,
                native_unsaved.len() as _,
                unsaved::as_native_ptr(&mut native_unsaved),
                options,
            )
        };
        let epoch = self.registry.advance_epoch(self.id)?;

        if let Some(code) = ErrorCode::from_raw(code as i32) {
            self.registry.poison(self.id)?;
            tracing::warn!(path = %self.path.display(), %code, "reparse failed; translation unit poisoned");
            return Err(Error::ReparseFailed {
                path: self.path.display().to_string(),
                code,
            });
        }

        tracing::debug!(path = %self.path.display(), epoch, "reparsed translation unit");
        Ok(())
    }

    /// Release most of the memory held by this unit until the next reparse.
    ///
    /// Values derived before suspension are stale afterwards.
    pub fn suspend(&self) -> Result<bool> {
        let raw = self.raw()?;
        self.registry.ensure_idle(self.id)?;
        let suspended = unsafe { clang_suspendTranslationUnit(raw) } != 0;
        self.registry.advance_epoch(self.id)?;
        Ok(suspended)
    }

    /// Save the unit as an AST file that [`Index::load_ast`] can read back.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let raw = self.raw()?;
        let c_path = CString::new(path.to_string_lossy().as_bytes())?;

        let code = unsafe {
            let options = clang_defaultSaveOptions(raw);
            clang_saveTranslationUnit(raw, c_path.as_ptr(), options)
        };
        if let Some(error) = SaveError::from_raw(code as i32) {
            return Err(Error::Save {
                path: path.display().to_string(),
                error,
            });
        }

        tracing::debug!(path = %path.display(), "saved translation unit");
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.registry.is_live(self.id)
    }

    /// Whether a failed reparse left the unit unusable.
    pub fn is_poisoned(&self) -> bool {
        self.registry.contains(self.id) && !self.registry.is_live(self.id)
    }

    /// Release the unit.
    ///
    /// Fails with `ChildrenStillLive` while token batches, diagnostic sets or
    /// resource usage reports created from it are live, with `InUse` from
    /// inside a traversal of the unit, and with `DoubleDispose` the second
    /// time.
    pub fn dispose(&self) -> Result<()> {
        self.registry.dispose(self.id)?;
        tracing::debug!(path = %self.path.display(), "disposed translation unit");
        Ok(())
    }
}

impl Drop for TranslationUnit {
    fn drop(&mut self) {
        self.registry.dispose_on_drop(self.id);
    }
}
