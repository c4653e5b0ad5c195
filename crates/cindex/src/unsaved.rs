//! In-memory file contents that override what is on disk.

use crate::error::Result;
use clang_sys::CXUnsavedFile;
use std::ffi::CString;
use std::os::raw::{c_char, c_ulong};
use std::path::{Path, PathBuf};

/// A file whose contents libclang should read from memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsavedFile {
    path: PathBuf,
    filename: CString,
    contents: String,
}

impl UnsavedFile {
    pub fn new(path: impl AsRef<Path>, contents: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let filename = CString::new(path.to_string_lossy().as_bytes())?;
        Ok(Self {
            path,
            filename,
            contents: contents.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    fn to_native(&self) -> CXUnsavedFile {
        CXUnsavedFile {
            Filename: self.filename.as_ptr(),
            Contents: self.contents.as_ptr() as *const c_char,
            Length: self.contents.len() as c_ulong,
        }
    }
}

/// Native views of `files`, valid while `files` is borrowed.
pub(crate) fn to_native(files: &[UnsavedFile]) -> Vec<CXUnsavedFile> {
    files.iter().map(UnsavedFile::to_native).collect()
}

/// Pointer to pass alongside the count; NULL for an empty list.
pub(crate) fn as_native_ptr(native: &mut [CXUnsavedFile]) -> *mut CXUnsavedFile {
    if native.is_empty() {
        std::ptr::null_mut()
    } else {
        native.as_mut_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_view_points_at_contents() {
        let file = UnsavedFile::new("main.c", "int x;").unwrap();
        let native = to_native(std::slice::from_ref(&file));

        assert_eq!(native.len(), 1);
        assert_eq!(native[0].Length, 6);
        let name = unsafe { std::ffi::CStr::from_ptr(native[0].Filename) };
        assert_eq!(name.to_str().unwrap(), "main.c");
    }

    #[test]
    fn test_interior_nul_in_path_rejected() {
        assert!(UnsavedFile::new("ma\0in.c", "").is_err());
    }

    #[test]
    fn test_empty_list_passes_null() {
        let mut native = to_native(&[]);
        assert!(as_native_ptr(&mut native).is_null());
    }
}
