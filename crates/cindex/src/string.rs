//! Strings owned by libclang.
//!
//! Most queries return a `CXString` that the caller must dispose. The usual
//! path is [`cx_string_to_string`], which copies the text out and releases the
//! native string at once. [`CxString`] keeps the native string around for
//! callers that want to decide when it is released.

use crate::error::Result;
use cindex_common::{HandleClass, Release, Tracked};
use clang_sys::*;
use std::borrow::Cow;
use std::ffi::CStr;

#[derive(Debug)]
pub(crate) struct NativeString(CXString);

impl Release for NativeString {
    const CLASS: HandleClass = HandleClass::String;

    fn release(&mut self) {
        unsafe { clang_disposeString(self.0) }
    }
}

/// A native string, released exactly once.
#[derive(Debug)]
pub struct CxString {
    inner: Tracked<NativeString>,
}

impl CxString {
    /// Take ownership of a string returned by libclang.
    ///
    /// # Safety
    /// `raw` must come from libclang and must not be disposed elsewhere.
    pub(crate) unsafe fn from_raw(raw: CXString) -> Self {
        Self {
            inner: Tracked::acquire(NativeString(raw)),
        }
    }

    /// Borrow the text. Fails once the string has been released.
    pub fn as_str(&self) -> Result<Cow<'_, str>> {
        let native = self.inner.get()?;
        Ok(unsafe { c_text(native.0) })
    }

    /// The raw value, for passing back into libclang while this owns it.
    pub(crate) fn raw(&self) -> Result<CXString> {
        Ok(self.inner.get()?.0)
    }

    /// Release the native storage now. Later releases do nothing.
    pub fn release(&mut self) {
        self.inner.release();
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_released()
    }
}

unsafe fn c_text<'a>(raw: CXString) -> Cow<'a, str> {
    let ptr = clang_getCString(raw);
    if ptr.is_null() {
        Cow::Borrowed("")
    } else {
        CStr::from_ptr(ptr).to_string_lossy()
    }
}

/// Copy a native string and dispose it.
pub(crate) fn cx_string_to_string(cx_string: CXString) -> String {
    let owned = unsafe { CxString::from_raw(cx_string) };
    owned
        .as_str()
        .map(Cow::into_owned)
        .unwrap_or_default()
}

/// Copy a borrowed C string; NULL becomes empty.
pub(crate) fn c_str_to_string(ptr: *const std::os::raw::c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Copy a native string without disposing it; for strings owned by a
/// larger structure that has its own dispose routine.
pub(crate) fn cx_string_peek(cx_string: &CXString) -> String {
    unsafe { c_text(*cx_string) }.into_owned()
}

#[derive(Debug)]
struct NativeStringSet(*mut CXStringSet);

impl Release for NativeStringSet {
    const CLASS: HandleClass = HandleClass::Derived("string set");

    fn release(&mut self) {
        if !self.0.is_null() {
            unsafe { clang_disposeStringSet(self.0) }
        }
    }
}

/// Copy a native string set and dispose it.
pub(crate) fn string_set_to_vec(set: *mut CXStringSet) -> Vec<String> {
    let guard = Tracked::acquire(NativeStringSet(set));
    let Ok(native) = guard.get() else {
        return Vec::new();
    };
    if native.0.is_null() {
        return Vec::new();
    }
    let set = unsafe { &*native.0 };
    if set.Strings.is_null() {
        return Vec::new();
    }
    let strings = unsafe { std::slice::from_raw_parts(set.Strings, set.Count as usize) };
    strings.iter().map(cx_string_peek).collect()
}
