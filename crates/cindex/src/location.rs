//! Source locations, ranges and files.
//!
//! The native resolvers write file, line, column and offset through output
//! pointers. Here they return one [`Location`] record instead; an invalid or
//! null location resolves to the zero record.

use crate::error::Result;
use crate::registry::{check_owner, TuRef};
use crate::string::cx_string_to_string;
use clang_sys::*;
use std::os::raw::c_uint;
use std::path::PathBuf;
use std::ptr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point in the source of a translation unit.
#[derive(Debug, Clone)]
pub struct SourceLocation {
    pub(crate) raw: CXSourceLocation,
    pub(crate) tu: Option<TuRef>,
}

/// A resolved location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub file: Option<File>,
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// A location as adjusted by `#line` directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresumedLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

type Resolver = unsafe extern "C" fn(
    CXSourceLocation,
    *mut CXFile,
    *mut c_uint,
    *mut c_uint,
    *mut c_uint,
);

impl SourceLocation {
    pub(crate) fn from_raw(raw: CXSourceLocation, tu: Option<TuRef>) -> Self {
        Self { raw, tu }
    }

    /// The null location.
    pub fn null() -> Self {
        Self {
            raw: unsafe { clang_getNullLocation() },
            tu: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.raw.ptr_data.iter().all(|p| p.is_null()) && self.raw.int_data == 0
    }

    fn resolve(&self, resolver: Resolver) -> Result<Location> {
        check_owner(&self.tu, "source location")?;
        if self.is_null() {
            return Ok(Location::default());
        }

        let mut file: CXFile = ptr::null_mut();
        let mut line: c_uint = 0;
        let mut column: c_uint = 0;
        let mut offset: c_uint = 0;
        unsafe { resolver(self.raw, &mut file, &mut line, &mut column, &mut offset) };

        if file.is_null() && line == 0 {
            return Ok(Location::default());
        }
        Ok(Location {
            file: File::from_raw(file, self.tu.clone()),
            line,
            column,
            offset,
        })
    }

    /// Where the location ends up after macro expansion.
    pub fn expansion(&self) -> Result<Location> {
        self.resolve(clang_getExpansionLocation)
    }

    /// Where the spelling of the token at this location is written.
    pub fn spelling(&self) -> Result<Location> {
        self.resolve(clang_getSpellingLocation)
    }

    /// The file location, following macro arguments to where they were written.
    pub fn file_location(&self) -> Result<Location> {
        self.resolve(clang_getFileLocation)
    }

    /// The location as adjusted by `#line` directives.
    pub fn presumed(&self) -> Result<PresumedLocation> {
        check_owner(&self.tu, "source location")?;
        if self.is_null() {
            return Ok(PresumedLocation::default());
        }

        let mut filename: CXString = unsafe { std::mem::zeroed() };
        let mut line: c_uint = 0;
        let mut column: c_uint = 0;
        unsafe { clang_getPresumedLocation(self.raw, &mut filename, &mut line, &mut column) };
        Ok(PresumedLocation {
            filename: cx_string_to_string(filename),
            line,
            column,
        })
    }

    pub fn is_in_system_header(&self) -> Result<bool> {
        check_owner(&self.tu, "source location")?;
        Ok(unsafe { clang_Location_isInSystemHeader(self.raw) != 0 })
    }

    pub fn is_from_main_file(&self) -> Result<bool> {
        check_owner(&self.tu, "source location")?;
        Ok(unsafe { clang_Location_isFromMainFile(self.raw) != 0 })
    }
}

impl PartialEq for SourceLocation {
    fn eq(&self, other: &Self) -> bool {
        unsafe { clang_equalLocations(self.raw, other.raw) != 0 }
    }
}

/// A half-open span between two locations.
#[derive(Debug, Clone)]
pub struct SourceRange {
    pub(crate) raw: CXSourceRange,
    pub(crate) tu: Option<TuRef>,
}

impl SourceRange {
    pub(crate) fn from_raw(raw: CXSourceRange, tu: Option<TuRef>) -> Self {
        Self { raw, tu }
    }

    /// The null range.
    pub fn null() -> Self {
        Self {
            raw: unsafe { clang_getNullRange() },
            tu: None,
        }
    }

    /// The range between two locations of the same translation unit.
    pub fn new(begin: &SourceLocation, end: &SourceLocation) -> Result<Self> {
        check_owner(&begin.tu, "source location")?;
        check_owner(&end.tu, "source location")?;
        Ok(Self {
            raw: unsafe { clang_getRange(begin.raw, end.raw) },
            tu: begin.tu.clone().or_else(|| end.tu.clone()),
        })
    }

    pub fn is_null(&self) -> bool {
        unsafe { clang_Range_isNull(self.raw) != 0 }
    }

    pub fn start(&self) -> Result<SourceLocation> {
        check_owner(&self.tu, "source range")?;
        Ok(SourceLocation::from_raw(
            unsafe { clang_getRangeStart(self.raw) },
            self.tu.clone(),
        ))
    }

    pub fn end(&self) -> Result<SourceLocation> {
        check_owner(&self.tu, "source range")?;
        Ok(SourceLocation::from_raw(
            unsafe { clang_getRangeEnd(self.raw) },
            self.tu.clone(),
        ))
    }
}

impl PartialEq for SourceRange {
    fn eq(&self, other: &Self) -> bool {
        unsafe { clang_equalRanges(self.raw, other.raw) != 0 }
    }
}

/// A file included in a translation unit.
#[derive(Debug, Clone)]
pub struct File {
    pub(crate) raw: CXFile,
    pub(crate) tu: Option<TuRef>,
}

/// Identity of a file on disk (device and inode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileUniqueId(pub [u64; 3]);

impl File {
    pub(crate) fn from_raw(raw: CXFile, tu: Option<TuRef>) -> Option<Self> {
        (!raw.is_null()).then_some(Self { raw, tu })
    }

    /// The file name as given to the compiler.
    pub fn name(&self) -> Result<String> {
        check_owner(&self.tu, "file")?;
        Ok(cx_string_to_string(unsafe { clang_getFileName(self.raw) }))
    }

    pub fn path(&self) -> Result<PathBuf> {
        self.name().map(PathBuf::from)
    }

    /// The real path of the file, with symlinks resolved.
    pub fn real_path(&self) -> Result<PathBuf> {
        check_owner(&self.tu, "file")?;
        Ok(PathBuf::from(cx_string_to_string(unsafe {
            clang_File_tryGetRealPathName(self.raw)
        })))
    }

    /// Last modification time as seen at parse time.
    pub fn mod_time(&self) -> Result<SystemTime> {
        check_owner(&self.tu, "file")?;
        let secs = unsafe { clang_getFileTime(self.raw) };
        Ok(UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64))
    }

    /// Device and inode of the file, if libclang could determine them.
    pub fn unique_id(&self) -> Result<Option<FileUniqueId>> {
        check_owner(&self.tu, "file")?;
        let mut id = CXFileUniqueID { data: [0; 3] };
        let failed = unsafe { clang_getFileUniqueID(self.raw, &mut id) } != 0;
        Ok((!failed).then(|| FileUniqueId(id.data.map(|d| d as u64))))
    }

    /// Whether the file is guarded against multiple inclusion.
    pub fn is_multiple_include_guarded(&self) -> Result<bool> {
        let tu = check_owner(&self.tu, "file")?.unwrap_or(ptr::null_mut());
        Ok(unsafe { clang_isFileMultipleIncludeGuarded(tu, self.raw) } != 0)
    }

    /// Whether both handles name the same file. Fails if either one's
    /// translation unit is gone.
    pub fn same_as(&self, other: &File) -> Result<bool> {
        check_owner(&self.tu, "file")?;
        check_owner(&other.tu, "file")?;
        Ok(self.raw == other.raw || unsafe { clang_File_isEqual(self.raw, other.raw) } != 0)
    }

    /// The location at `line`/`column` (both 1-based) in this file.
    pub fn location(&self, line: u32, column: u32) -> Result<SourceLocation> {
        let tu = check_owner(&self.tu, "file")?.unwrap_or(ptr::null_mut());
        let raw = unsafe { clang_getLocation(tu, self.raw, line, column) };
        Ok(SourceLocation::from_raw(raw, self.tu.clone()))
    }

    /// The location at a byte `offset` in this file.
    pub fn location_at_offset(&self, offset: u32) -> Result<SourceLocation> {
        let tu = check_owner(&self.tu, "file")?.unwrap_or(ptr::null_mut());
        let raw = unsafe { clang_getLocationForOffset(tu, self.raw, offset) };
        Ok(SourceLocation::from_raw(raw, self.tu.clone()))
    }
}

/// Files from a unit that is gone only compare equal to the identical handle;
/// use [`File::same_as`] to tell that case apart.
impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        if self.raw == other.raw {
            return true;
        }
        self.same_as(other).unwrap_or(false)
    }
}
