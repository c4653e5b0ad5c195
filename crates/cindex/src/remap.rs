//! File remappings written by the ARC migrator.

use crate::error::{Error, Result};
use crate::registry::{Native, Registry};
use crate::string::cx_string_to_string;
use cindex_common::RawId;
use clang_sys::*;
use std::ffi::CString;
use std::os::raw::{c_char, c_uint};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A set of `(original, transformed)` file pairs.
#[derive(Debug)]
pub struct Remapping {
    registry: Rc<Registry>,
    id: RawId,
}

impl Remapping {
    /// Read the remapping file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let c_path = CString::new(path.to_string_lossy().as_bytes())?;
        let raw = unsafe { clang_getRemappings(c_path.as_ptr()) };
        Self::wrap(raw, path.display().to_string())
    }

    /// Read remappings from a list of remapping files.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let c_paths = paths
            .iter()
            .map(|p| CString::new(p.as_ref().to_string_lossy().as_bytes()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut ptrs: Vec<*const c_char> = c_paths.iter().map(|p| p.as_ptr()).collect();
        let raw = unsafe { clang_getRemappingsFromFileList(ptrs.as_mut_ptr(), ptrs.len() as c_uint) };
        let label = paths
            .iter()
            .map(|p| p.as_ref().display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::wrap(raw, label)
    }

    fn wrap(raw: CXRemapping, path: String) -> Result<Self> {
        if raw.is_null() {
            return Err(Error::Remapping { path });
        }
        let registry = Registry::new();
        let id = registry.wrap(Native::Remapping(raw));
        tracing::debug!(%path, "loaded remappings");
        Ok(Self { registry, id })
    }

    fn raw(&self) -> Result<CXRemapping> {
        Ok(self.registry.get(self.id)?.remapping())
    }

    pub fn len(&self) -> Result<usize> {
        let raw = self.raw()?;
        Ok(unsafe { clang_remap_getNumFiles(raw) } as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Every `(original, transformed)` pair.
    pub fn pairs(&self) -> Result<Vec<(PathBuf, PathBuf)>> {
        let raw = self.raw()?;
        let n = unsafe { clang_remap_getNumFiles(raw) };
        Ok((0..n)
            .map(|i| unsafe {
                let mut original: CXString = std::mem::zeroed();
                let mut transformed: CXString = std::mem::zeroed();
                clang_remap_getFilenames(raw, i, &mut original, &mut transformed);
                (
                    PathBuf::from(cx_string_to_string(original)),
                    PathBuf::from(cx_string_to_string(transformed)),
                )
            })
            .collect())
    }

    pub fn is_live(&self) -> bool {
        self.registry.is_live(self.id)
    }

    /// Release the remappings. Fails with `DoubleDispose` the second time.
    pub fn dispose(&self) -> Result<()> {
        Ok(self.registry.dispose(self.id)?)
    }
}

impl Drop for Remapping {
    fn drop(&mut self) {
        self.registry.dispose_on_drop(self.id);
    }
}
