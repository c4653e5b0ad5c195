//! Callback bridge for libclang's visitor APIs.
//!
//! libclang drives traversal and calls back through a C function pointer
//! with an opaque client-data pointer. A [`Bridge`] is what that pointer
//! points at: the caller's closure, the translation unit handed to every
//! cursor it sees, and a slot for a panic raised by the closure.
//!
//! A panic must not unwind through native frames. The trampoline catches
//! it, asks libclang to stop, and the panic is resumed once the native call
//! has returned. After a panic the closure is never called again.
//!
//! A callback may call back into the adapter, but the translation unit being
//! walked is held in use until the native call returns: disposing,
//! reparsing or suspending it from inside the callback fails with `InUse`.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::location::{File, SourceLocation, SourceRange};
use crate::registry::TuRef;
use clang_sys::*;
use std::any::Any;
use std::os::raw::{c_uint, c_void};
use std::panic::{self, AssertUnwindSafe};

/// What a child visitor wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildVisit {
    /// Stop the whole traversal.
    Break,
    /// Go on with the next sibling without descending.
    Continue,
    /// Descend into the children of this cursor.
    Recurse,
}

impl ChildVisit {
    fn to_raw(self) -> CXChildVisitResult {
        match self {
            ChildVisit::Break => CXChildVisit_Break,
            ChildVisit::Continue => CXChildVisit_Continue,
            ChildVisit::Recurse => CXChildVisit_Recurse,
        }
    }
}

/// How a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitOutcome {
    /// Every node was offered to the visitor.
    Completed,
    /// The visitor stopped the traversal early.
    Terminated,
}

impl VisitOutcome {
    pub fn is_terminated(self) -> bool {
        self == VisitOutcome::Terminated
    }
}

/// Continue or stop, for the flat visitors (fields, references, includes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visit {
    Break,
    Continue,
}

impl Visit {
    fn to_raw(self) -> CXVisitorResult {
        match self {
            Visit::Break => CXVisit_Break,
            Visit::Continue => CXVisit_Continue,
        }
    }
}

/// Client data handed to a trampoline.
pub(crate) struct Bridge<F> {
    pub(crate) callback: F,
    pub(crate) tu: Option<TuRef>,
    panic: Option<Box<dyn Any + Send + 'static>>,
}

impl<F> Bridge<F> {
    pub(crate) fn new(callback: F, tu: Option<TuRef>) -> Self {
        Self {
            callback,
            tu,
            panic: None,
        }
    }

    pub(crate) fn client_data(&mut self) -> CXClientData {
        self as *mut Self as CXClientData
    }

    /// Recover the bridge from client data.
    ///
    /// # Safety
    /// `data` must come from [`Bridge::client_data`] on a bridge of the same
    /// type that is still alive.
    pub(crate) unsafe fn from_client_data<'a>(data: *mut c_void) -> &'a mut Self {
        &mut *(data as *mut Self)
    }

    /// Run the callback unless an earlier call panicked; a panic is stored
    /// and `stop` returned in place of the callback's answer.
    pub(crate) fn call<R>(&mut self, stop: R, f: impl FnOnce(&mut F, &Option<TuRef>) -> R) -> R {
        if self.panic.is_some() {
            return stop;
        }
        let callback = &mut self.callback;
        let tu = &self.tu;
        match panic::catch_unwind(AssertUnwindSafe(|| f(callback, tu))) {
            Ok(result) => result,
            Err(payload) => {
                tracing::debug!("visitor panicked; stopping traversal");
                self.panic = Some(payload);
                stop
            }
        }
    }

    /// Whether a callback panicked.
    pub(crate) fn panicked(&self) -> bool {
        self.panic.is_some()
    }

    /// Re-raise a stored panic now that native frames are gone.
    pub(crate) fn finish(self) -> F {
        if let Some(payload) = self.panic {
            panic::resume_unwind(payload);
        }
        self.callback
    }
}

extern "C" fn child_trampoline<F>(
    cursor: CXCursor,
    parent: CXCursor,
    data: CXClientData,
) -> CXChildVisitResult
where
    F: FnMut(Cursor, Cursor) -> ChildVisit,
{
    let bridge = unsafe { Bridge::<F>::from_client_data(data) };
    bridge
        .call(ChildVisit::Break, |visitor, tu| {
            visitor(
                Cursor::from_raw(cursor, tu.clone()),
                Cursor::from_raw(parent, tu.clone()),
            )
        })
        .to_raw()
}

impl Cursor {
    /// Visit the children of this cursor.
    ///
    /// The visitor receives each child and its parent and decides whether to
    /// stop, continue with the next sibling, or descend. Visiting a null
    /// cursor completes without calling the visitor.
    pub fn visit_children<F>(&self, visitor: F) -> Result<VisitOutcome>
    where
        F: FnMut(Cursor, Cursor) -> ChildVisit,
    {
        let raw = self.check()?;
        if self.is_null() {
            return Ok(VisitOutcome::Completed);
        }

        let _in_use = self.owner().map(|tu| tu.enter("cursor")).transpose()?;
        let mut bridge = Bridge::new(visitor, self.owner().cloned());
        let terminated = unsafe {
            clang_visitChildren(raw, child_trampoline::<F>, bridge.client_data())
        } != 0;
        bridge.finish();

        Ok(if terminated {
            VisitOutcome::Terminated
        } else {
            VisitOutcome::Completed
        })
    }

    /// The direct children of this cursor.
    pub fn children(&self) -> Result<Vec<Cursor>> {
        let mut children = Vec::new();
        self.visit_children(|child, _| {
            children.push(child);
            ChildVisit::Continue
        })?;
        Ok(children)
    }

    /// Every descendant, in pre-order.
    pub fn descendants(&self) -> Result<Vec<Cursor>> {
        let mut all = Vec::new();
        self.visit_children(|child, _| {
            all.push(child);
            ChildVisit::Recurse
        })?;
        Ok(all)
    }

    /// Visit every reference to this cursor's entity within `file`.
    pub fn find_references_in_file<F>(&self, file: &File, visitor: F) -> Result<VisitOutcome>
    where
        F: FnMut(Cursor, SourceRange) -> Visit,
    {
        let raw = self.check()?;
        crate::registry::check_owner(&file.tu, "file")?;

        let _in_use = self.owner().map(|tu| tu.enter("cursor")).transpose()?;
        let mut bridge = Bridge::new(visitor, self.owner().cloned());
        let callback = CXCursorAndRangeVisitor {
            context: bridge.client_data(),
            visit: Some(range_trampoline::<F>),
        };
        let result = unsafe { clang_findReferencesInFile(raw, file.raw, callback) };
        bridge.finish();
        range_result(result, "clang_findReferencesInFile")
    }
}

extern "C" fn range_trampoline<F>(
    context: *mut c_void,
    cursor: CXCursor,
    range: CXSourceRange,
) -> CXVisitorResult
where
    F: FnMut(Cursor, SourceRange) -> Visit,
{
    let bridge = unsafe { Bridge::<F>::from_client_data(context) };
    bridge
        .call(Visit::Break, |visitor, tu| {
            visitor(
                Cursor::from_raw(cursor, tu.clone()),
                SourceRange::from_raw(range, tu.clone()),
            )
        })
        .to_raw()
}

fn range_result(result: CXResult, what: &'static str) -> Result<VisitOutcome> {
    match result {
        CXResult_Success => Ok(VisitOutcome::Completed),
        CXResult_VisitBreak => Ok(VisitOutcome::Terminated),
        _ => Err(Error::InvalidArgument(what)),
    }
}

/// Visit every `#include` directive in `file`.
pub(crate) fn find_includes_in_file<F>(
    tu: CXTranslationUnit,
    owner: &TuRef,
    file: &File,
    visitor: F,
) -> Result<VisitOutcome>
where
    F: FnMut(Cursor, SourceRange) -> Visit,
{
    crate::registry::check_owner(&file.tu, "file")?;
    let _in_use = owner.enter("translation unit")?;
    let mut bridge = Bridge::new(visitor, Some(owner.clone()));
    let callback = CXCursorAndRangeVisitor {
        context: bridge.client_data(),
        visit: Some(range_trampoline::<F>),
    };
    let result = unsafe { clang_findIncludesInFile(tu, file.raw, callback) };
    bridge.finish();
    range_result(result, "clang_findIncludesInFile")
}

extern "C" fn inclusion_trampoline<F>(
    included: CXFile,
    stack: *mut CXSourceLocation,
    depth: c_uint,
    data: CXClientData,
) where
    F: FnMut(File, &[SourceLocation]),
{
    let bridge = unsafe { Bridge::<F>::from_client_data(data) };
    bridge.call((), |visitor, tu| {
        let Some(file) = File::from_raw(included, tu.clone()) else {
            return;
        };
        let raw_stack: &[CXSourceLocation] = if stack.is_null() || depth == 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(stack, depth as usize) }
        };
        let stack: Vec<SourceLocation> = raw_stack
            .iter()
            .map(|loc| SourceLocation::from_raw(*loc, tu.clone()))
            .collect();
        visitor(file, &stack);
    });
}

/// Visit every file included by a translation unit with its inclusion stack.
///
/// The stack is innermost first; it is empty for the main file.
pub(crate) fn visit_inclusions<F>(tu: CXTranslationUnit, owner: &TuRef, visitor: F) -> Result<()>
where
    F: FnMut(File, &[SourceLocation]),
{
    let _in_use = owner.enter("translation unit")?;
    let mut bridge = Bridge::new(visitor, Some(owner.clone()));
    unsafe { clang_getInclusions(tu, inclusion_trampoline::<F>, bridge.client_data()) };
    bridge.finish();
    Ok(())
}

extern "C" fn field_trampoline(cursor: CXCursor, data: CXClientData) -> CXVisitorResult {
    let bridge = unsafe { Bridge::<Vec<Cursor>>::from_client_data(data) };
    bridge
        .call(Visit::Break, |fields, tu| {
            fields.push(Cursor::from_raw(cursor, tu.clone()));
            Visit::Continue
        })
        .to_raw()
}

/// Collect the fields of a record type.
pub(crate) fn collect_fields(ty: CXType, tu: Option<TuRef>) -> Result<Vec<Cursor>> {
    let mut bridge = Bridge::new(Vec::new(), tu);
    unsafe { clang_Type_visitFields(ty, field_trampoline, bridge.client_data()) };
    Ok(bridge.finish())
}
