//! USR construction for Objective-C entities, plus library-wide settings.
//!
//! The member constructors take the class USR as a [`CxString`] returned by
//! [`objc_class`], which is passed back to libclang without copying.

use crate::error::Result;
use crate::string::{cx_string_to_string, CxString};
use clang_sys::*;
use std::ffi::CString;
use std::os::raw::c_uint;

pub fn objc_class(name: &str) -> Result<CxString> {
    let name = CString::new(name)?;
    Ok(unsafe { CxString::from_raw(clang_constructUSR_ObjCClass(name.as_ptr())) })
}

pub fn objc_category(class: &str, category: &str) -> Result<CxString> {
    let class = CString::new(class)?;
    let category = CString::new(category)?;
    Ok(unsafe {
        CxString::from_raw(clang_constructUSR_ObjCCategory(
            class.as_ptr(),
            category.as_ptr(),
        ))
    })
}

pub fn objc_protocol(name: &str) -> Result<CxString> {
    let name = CString::new(name)?;
    Ok(unsafe { CxString::from_raw(clang_constructUSR_ObjCProtocol(name.as_ptr())) })
}

pub fn objc_ivar(name: &str, class_usr: &CxString) -> Result<CxString> {
    let name = CString::new(name)?;
    let class_usr = class_usr.raw()?;
    Ok(unsafe { CxString::from_raw(clang_constructUSR_ObjCIvar(name.as_ptr(), class_usr)) })
}

pub fn objc_method(name: &str, is_instance: bool, class_usr: &CxString) -> Result<CxString> {
    let name = CString::new(name)?;
    let class_usr = class_usr.raw()?;
    Ok(unsafe {
        CxString::from_raw(clang_constructUSR_ObjCMethod(
            name.as_ptr(),
            is_instance as c_uint,
            class_usr,
        ))
    })
}

pub fn objc_property(name: &str, class_usr: &CxString) -> Result<CxString> {
    let name = CString::new(name)?;
    let class_usr = class_usr.raw()?;
    Ok(unsafe {
        CxString::from_raw(clang_constructUSR_ObjCProperty(
            name.as_ptr(),
            class_usr,
        ))
    })
}

/// Version string of the loaded libclang, e.g. `clang version 17.0.6`.
pub fn clang_version() -> String {
    cx_string_to_string(unsafe { clang_getClangVersion() })
}

/// Enable or disable libclang's crash recovery for the whole process.
pub fn toggle_crash_recovery(enabled: bool) {
    unsafe { clang_toggleCrashRecovery(enabled as c_uint) };
    tracing::debug!(enabled, "toggled crash recovery");
}
