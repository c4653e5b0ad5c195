//! The index: root container for translation units and index actions.

use crate::error::{Error, ErrorCode, Result};
use crate::flags::{GlobalOptions, TranslationUnitFlags};
use crate::registry::{Native, Registry};
use crate::translation_unit::TranslationUnit;
use crate::unsaved::{self, UnsavedFile};
use cindex_build::{CindexConfig, IndexConfig, ParseSettings};
use cindex_common::RawId;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr;
use std::rc::Rc;

/// A set of translation units that share state.
///
/// Translation units and index actions are children of the index: disposing
/// the index while any of them is live fails with `ChildrenStillLive`.
/// Handles are not `Send`; libclang objects created from one index must be
/// used from one thread at a time.
#[derive(Debug)]
pub struct Index {
    registry: Rc<Registry>,
    id: RawId,
}

impl Index {
    /// Create an index.
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let raw = unsafe {
            clang_sys::clang_createIndex(
                config.exclude_declarations_from_pch as c_int,
                config.display_diagnostics as c_int,
            )
        };
        if raw.is_null() {
            return Err(Error::NullHandle { what: "index" });
        }

        let registry = Registry::new();
        let id = registry.wrap(Native::Index(raw));
        let index = Self { registry, id };

        let mut options = GlobalOptions::empty();
        if config.background_indexing {
            options |= GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_INDEXING;
        }
        if config.background_editing {
            options |= GlobalOptions::THREAD_BACKGROUND_PRIORITY_FOR_EDITING;
        }
        if !options.is_empty() {
            index.set_global_options(options)?;
        }

        tracing::debug!(?config, "created index");
        Ok(index)
    }

    /// Create an index from the `[index]` section of a configuration.
    pub fn from_config(config: &CindexConfig) -> Result<Self> {
        Self::new(&config.index)
    }

    pub(crate) fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    pub(crate) fn id(&self) -> RawId {
        self.id
    }

    pub(crate) fn raw(&self) -> Result<clang_sys::CXIndex> {
        Ok(self.registry.get(self.id)?.index())
    }

    pub fn global_options(&self) -> Result<GlobalOptions> {
        let raw = self.raw()?;
        let bits = unsafe { clang_sys::clang_CXIndex_getGlobalOptions(raw) };
        Ok(GlobalOptions::from_bits_retain(bits as u32))
    }

    pub fn set_global_options(&self, options: GlobalOptions) -> Result<()> {
        let raw = self.raw()?;
        unsafe { clang_sys::clang_CXIndex_setGlobalOptions(raw, options.bits() as _) };
        Ok(())
    }

    /// Directory where libclang should store invocation emission logs.
    pub fn set_invocation_emission_path(&self, path: &Path) -> Result<()> {
        let raw = self.raw()?;
        let path = CString::new(path.to_string_lossy().as_bytes())?;
        unsafe { clang_sys::clang_CXIndex_setInvocationEmissionPathOption(raw, path.as_ptr()) };
        Ok(())
    }

    /// Parse a source file.
    ///
    /// `args` are compiler arguments without the compiler name; `unsaved`
    /// overrides file contents on disk.
    pub fn parse(
        &self,
        path: impl AsRef<Path>,
        args: &[&str],
        unsaved: &[UnsavedFile],
        flags: TranslationUnitFlags,
    ) -> Result<TranslationUnit> {
        let path = path.as_ref();
        let raw = self.raw()?;
        let c_path = CString::new(path.to_string_lossy().as_bytes())?;
        let c_args = args
            .iter()
            .map(|a| CString::new(*a))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let arg_ptrs: Vec<*const c_char> = c_args.iter().map(|a| a.as_ptr()).collect();
        let mut native_unsaved = unsaved::to_native(unsaved);

        let mut tu: clang_sys::CXTranslationUnit = ptr::null_mut();
        let code = unsafe {
            clang_sys::clang_parseTranslationUnit2(
                raw,
                c_path.as_ptr(),
                arg_ptrs.as_ptr(),
                arg_ptrs.len() as c_int,
                unsaved::as_native_ptr(&mut native_unsaved),
                native_unsaved.len() as _,
                flags.bits() as _,
                &mut tu,
            )
        };

        if let Some(code) = ErrorCode::from_raw(code as i32) {
            tracing::debug!(path = %path.display(), %code, "parse failed");
            return Err(Error::Creation {
                path: path.display().to_string(),
                code,
            });
        }
        if tu.is_null() {
            return Err(Error::Creation {
                path: path.display().to_string(),
                code: ErrorCode::Failure,
            });
        }

        tracing::debug!(path = %path.display(), args = args.len(), ?flags, "parsed translation unit");
        TranslationUnit::wrap(self, tu, path)
    }

    /// Parse a file whose contents, and possibly those of its headers, are
    /// given in memory, with the flags an editor would use.
    pub fn parse_unsaved(
        &self,
        path: impl AsRef<Path>,
        args: &[&str],
        unsaved: &[UnsavedFile],
    ) -> Result<TranslationUnit> {
        self.parse(path, args, unsaved, TranslationUnitFlags::editing())
    }

    /// Parse a file with settings resolved from configuration.
    pub fn parse_with(
        &self,
        settings: &ParseSettings,
        unsaved: &[UnsavedFile],
    ) -> Result<TranslationUnit> {
        let flags = TranslationUnitFlags::from_names(&settings.flags)?;
        let args: Vec<&str> = settings.args.iter().map(String::as_str).collect();
        self.parse(&settings.file, &args, unsaved, flags)
    }

    /// Load a translation unit saved with [`TranslationUnit::save`].
    pub fn load_ast(&self, ast_file: impl AsRef<Path>) -> Result<TranslationUnit> {
        let path = ast_file.as_ref();
        let raw = self.raw()?;
        let c_path = CString::new(path.to_string_lossy().as_bytes())?;

        let mut tu: clang_sys::CXTranslationUnit = ptr::null_mut();
        let code = unsafe { clang_sys::clang_createTranslationUnit2(raw, c_path.as_ptr(), &mut tu) };
        if let Some(code) = ErrorCode::from_raw(code as i32) {
            return Err(Error::Creation {
                path: path.display().to_string(),
                code,
            });
        }
        if tu.is_null() {
            return Err(Error::Creation {
                path: path.display().to_string(),
                code: ErrorCode::AstReadError,
            });
        }

        tracing::debug!(path = %path.display(), "loaded AST file");
        TranslationUnit::wrap(self, tu, path)
    }

    pub fn is_live(&self) -> bool {
        self.registry.is_live(self.id)
    }

    /// Release the index.
    ///
    /// Fails with `ChildrenStillLive` while translation units or actions
    /// created from it are live, and with `DoubleDispose` the second time.
    pub fn dispose(&self) -> Result<()> {
        self.registry.dispose(self.id)?;
        tracing::debug!("disposed index");
        Ok(())
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        self.registry.dispose_on_drop(self.id);
    }
}
