//! Clang modules.

use crate::cursor::Cursor;
use crate::error::Result;
use crate::location::File;
use crate::registry::TuRef;
use crate::string::cx_string_to_string;
use crate::translation_unit::TranslationUnit;
use clang_sys::*;
use std::fmt;

/// A module imported by a translation unit.
#[derive(Clone)]
pub struct Module {
    raw: CXModule,
    tu: TuRef,
}

impl Module {
    fn from_raw(raw: CXModule, tu: TuRef) -> Option<Self> {
        (!raw.is_null()).then_some(Self { raw, tu })
    }

    fn check(&self) -> Result<CXTranslationUnit> {
        Ok(self.tu.check("module")?)
    }

    /// The last component of the name, e.g. `vector` for `std.vector`.
    pub fn name(&self) -> Result<String> {
        self.check()?;
        Ok(cx_string_to_string(unsafe { clang_Module_getName(self.raw) }))
    }

    pub fn full_name(&self) -> Result<String> {
        self.check()?;
        Ok(cx_string_to_string(unsafe {
            clang_Module_getFullName(self.raw)
        }))
    }

    pub fn parent(&self) -> Result<Option<Module>> {
        self.check()?;
        let parent = unsafe { clang_Module_getParent(self.raw) };
        Ok(Module::from_raw(parent, self.tu.clone()))
    }

    /// The module file the module was loaded from.
    pub fn ast_file(&self) -> Result<Option<File>> {
        self.check()?;
        let file = unsafe { clang_Module_getASTFile(self.raw) };
        Ok(File::from_raw(file, Some(self.tu.clone())))
    }

    pub fn is_system(&self) -> Result<bool> {
        self.check()?;
        Ok(unsafe { clang_Module_isSystem(self.raw) } != 0)
    }

    pub fn top_level_headers(&self) -> Result<Vec<File>> {
        let tu = self.check()?;
        let n = unsafe { clang_Module_getNumTopLevelHeaders(tu, self.raw) };
        Ok((0..n)
            .filter_map(|i| {
                let file = unsafe { clang_Module_getTopLevelHeader(tu, self.raw, i) };
                File::from_raw(file, Some(self.tu.clone()))
            })
            .collect())
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.tu == other.tu
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.full_name().unwrap_or_default();
        f.debug_struct("Module").field("name", &name).finish()
    }
}

impl Cursor {
    /// The module a module import declaration refers to.
    pub fn module(&self) -> Result<Option<Module>> {
        let raw = self.check()?;
        let Some(tu) = self.owner() else {
            return Ok(None);
        };
        let module = unsafe { clang_Cursor_getModule(raw) };
        Ok(Module::from_raw(module, tu.clone()))
    }
}

impl TranslationUnit {
    /// The module `file` belongs to, if any.
    pub fn module_for_file(&self, file: &File) -> Result<Option<Module>> {
        let raw = self.raw()?;
        crate::registry::check_owner(&file.tu, "file")?;
        let module = unsafe { clang_getModuleForFile(raw, file.raw) };
        Ok(Module::from_raw(module, self.owner()?))
    }
}
