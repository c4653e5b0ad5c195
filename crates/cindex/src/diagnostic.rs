//! Compiler diagnostics.
//!
//! A [`DiagnosticSet`] is a disposable handle. The diagnostics in it borrow
//! the set, so the compiler keeps them from outliving it; a set taken from a
//! translation unit additionally goes stale when the unit is reparsed.
//!
//! Locations, ranges and fix-its read from a diagnostic are owned values.
//! They stay tied to whatever holds their storage: the translation unit, or
//! for a set loaded from disk the set itself, so using them after that owner
//! is gone fails instead of reading freed memory.
//!
//! [`DiagnosticRecord`] is an owned copy that survives both, and converts to
//! a [`DiagnosticReport`] for `miette` rendering.

use crate::error::{Error, Result};
use crate::flags::DiagnosticDisplayOptions;
use crate::location::{SourceLocation, SourceRange};
use crate::registry::{check_owner, Native, Registry, TuRef};
use crate::string::cx_string_to_string;
use crate::translation_unit::TranslationUnit;
use cindex_common::{DiagnosticReport, RawId};
use clang_sys::*;
use std::ffi::CString;
use std::os::raw::c_uint;
use std::path::{Path, PathBuf};
use std::ptr;
use std::rc::Rc;

pub use cindex_common::DiagnosticLevel as Severity;

fn severity_from_raw(raw: CXDiagnosticSeverity) -> Severity {
    match raw {
        CXDiagnostic_Note => Severity::Note,
        CXDiagnostic_Warning => Severity::Warning,
        CXDiagnostic_Error => Severity::Error,
        CXDiagnostic_Fatal => Severity::Fatal,
        _ => Severity::Ignored,
    }
}

/// A disposable set of diagnostics.
#[derive(Debug)]
pub struct DiagnosticSet {
    registry: Rc<Registry>,
    id: RawId,
    /// Owner of everything read from the set: the translation unit, or the
    /// set itself when it was loaded from disk.
    tu: Option<TuRef>,
}

impl DiagnosticSet {
    /// Load diagnostics serialized with `-serialize-diagnostics`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let c_path = CString::new(path.to_string_lossy().as_bytes())?;
        let mut error = 0;
        let mut message: CXString = unsafe { std::mem::zeroed() };

        let set = unsafe { clang_loadDiagnostics(c_path.as_ptr(), &mut error, &mut message) };
        let message = cx_string_to_string(message);
        if set.is_null() {
            return Err(Error::LoadDiagnostics {
                path: path.display().to_string(),
                message,
            });
        }

        let registry = Registry::new();
        let id = registry.wrap(Native::DiagnosticSet { set, owned: true });
        let owner = TuRef::new(registry.clone(), id)?;
        tracing::debug!(path = %path.display(), "loaded diagnostics");
        Ok(Self {
            registry,
            id,
            tu: Some(owner),
        })
    }

    fn raw(&self) -> Result<CXDiagnosticSet> {
        let set = self.registry.get(self.id)?.diagnostic_set();
        check_owner(&self.tu, "diagnostic set")?;
        Ok(set)
    }

    pub fn len(&self) -> Result<usize> {
        let raw = self.raw()?;
        Ok(unsafe { clang_getNumDiagnosticsInSet(raw) } as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, index: usize) -> Result<Diagnostic<'_>> {
        let len = self.len()?;
        if index >= len {
            return Err(Error::OutOfRange {
                what: "diagnostic",
                index,
                len,
            });
        }
        let raw = unsafe { clang_getDiagnosticInSet(self.raw()?, index as c_uint) };
        Ok(Diagnostic { set: self, raw })
    }

    /// Every top-level diagnostic in the set.
    pub fn diagnostics(&self) -> Result<Vec<Diagnostic<'_>>> {
        (0..self.len()?).map(|i| self.get(i)).collect()
    }

    /// Owned copies of every top-level diagnostic.
    pub fn records(&self) -> Result<Vec<DiagnosticRecord>> {
        self.diagnostics()?.iter().map(Diagnostic::record).collect()
    }

    pub fn is_live(&self) -> bool {
        self.registry.is_live(self.id)
    }

    /// Release the set. Fails with `DoubleDispose` the second time.
    pub fn dispose(&self) -> Result<()> {
        Ok(self.registry.dispose(self.id)?)
    }
}

impl Drop for DiagnosticSet {
    fn drop(&mut self) {
        self.registry.dispose_on_drop(self.id);
    }
}

/// One diagnostic in a [`DiagnosticSet`].
#[derive(Debug, Clone, Copy)]
pub struct Diagnostic<'a> {
    set: &'a DiagnosticSet,
    raw: CXDiagnostic,
}

/// A fix-it hint: replace `range` with `text`.
#[derive(Debug, Clone)]
pub struct FixIt {
    pub text: String,
    pub range: SourceRange,
}

impl<'a> Diagnostic<'a> {
    fn check(&self) -> Result<CXDiagnostic> {
        self.set.raw()?;
        Ok(self.raw)
    }

    pub fn severity(&self) -> Result<Severity> {
        let raw = self.check()?;
        Ok(severity_from_raw(unsafe { clang_getDiagnosticSeverity(raw) }))
    }

    pub fn spelling(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe { clang_getDiagnosticSpelling(raw) }))
    }

    /// The diagnostic formatted the way clang prints it.
    pub fn format(&self, options: DiagnosticDisplayOptions) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe {
            clang_formatDiagnostic(raw, options.bits() as _)
        }))
    }

    pub fn location(&self) -> Result<SourceLocation> {
        let raw = self.check()?;
        Ok(SourceLocation::from_raw(
            unsafe { clang_getDiagnosticLocation(raw) },
            self.set.tu.clone(),
        ))
    }

    /// The option that enables this diagnostic and the one that disables it,
    /// e.g. `("-Wunused-variable", "-Wno-unused-variable")`.
    pub fn option(&self) -> Result<(String, String)> {
        let raw = self.check()?;
        let mut disable: CXString = unsafe { std::mem::zeroed() };
        let enable = cx_string_to_string(unsafe { clang_getDiagnosticOption(raw, &mut disable) });
        Ok((enable, cx_string_to_string(disable)))
    }

    pub fn category(&self) -> Result<u32> {
        let raw = self.check()?;
        Ok(unsafe { clang_getDiagnosticCategory(raw) })
    }

    pub fn category_text(&self) -> Result<String> {
        let raw = self.check()?;
        Ok(cx_string_to_string(unsafe {
            clang_getDiagnosticCategoryText(raw)
        }))
    }

    pub fn ranges(&self) -> Result<Vec<SourceRange>> {
        let raw = self.check()?;
        let n = unsafe { clang_getDiagnosticNumRanges(raw) };
        Ok((0..n)
            .map(|i| {
                SourceRange::from_raw(
                    unsafe { clang_getDiagnosticRange(raw, i) },
                    self.set.tu.clone(),
                )
            })
            .collect())
    }

    pub fn fix_its(&self) -> Result<Vec<FixIt>> {
        let raw = self.check()?;
        let n = unsafe { clang_getDiagnosticNumFixIts(raw) };
        Ok((0..n)
            .map(|i| {
                let mut range: CXSourceRange = unsafe { clang_getNullRange() };
                let text = cx_string_to_string(unsafe { clang_getDiagnosticFixIt(raw, i, &mut range) });
                FixIt {
                    text,
                    range: SourceRange::from_raw(range, self.set.tu.clone()),
                }
            })
            .collect())
    }

    /// Notes attached to this diagnostic.
    pub fn children(&self) -> Result<Vec<Diagnostic<'a>>> {
        let raw = self.check()?;
        let children = unsafe { clang_getChildDiagnostics(raw) };
        if children.is_null() {
            return Ok(Vec::new());
        }
        let n = unsafe { clang_getNumDiagnosticsInSet(children) };
        Ok((0..n)
            .map(|i| Diagnostic {
                set: self.set,
                raw: unsafe { clang_getDiagnosticInSet(children, i) },
            })
            .collect())
    }

    /// An owned copy of the diagnostic and its notes.
    pub fn record(&self) -> Result<DiagnosticRecord> {
        let raw = self.check()?;
        Ok(unsafe { record_from_raw(raw) })
    }
}

/// Byte offsets of a range within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffsetSpan {
    pub start: u32,
    pub end: u32,
}

impl OffsetSpan {
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned copy of a fix-it hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixItRecord {
    pub text: String,
    pub span: OffsetSpan,
}

/// Owned copy of a diagnostic; valid after its set and unit are gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    pub message: String,
    /// The full text as clang prints it, with location and option.
    pub formatted: String,
    pub option: String,
    pub disable_option: String,
    pub category: u32,
    pub category_text: String,
    pub file: Option<PathBuf>,
    pub line: u32,
    pub column: u32,
    pub offset: u32,
    pub ranges: Vec<OffsetSpan>,
    pub fix_its: Vec<FixItRecord>,
    pub children: Vec<DiagnosticRecord>,
}

unsafe fn file_offset(location: CXSourceLocation) -> (Option<PathBuf>, u32, u32, u32) {
    let mut file: CXFile = ptr::null_mut();
    let mut line = 0;
    let mut column = 0;
    let mut offset = 0;
    clang_getSpellingLocation(location, &mut file, &mut line, &mut column, &mut offset);
    let path = (!file.is_null()).then(|| PathBuf::from(cx_string_to_string(clang_getFileName(file))));
    (path, line, column, offset)
}

unsafe fn span_of(range: CXSourceRange) -> OffsetSpan {
    let (_, _, _, start) = file_offset(clang_getRangeStart(range));
    let (_, _, _, end) = file_offset(clang_getRangeEnd(range));
    OffsetSpan { start, end }
}

/// Copy everything out of a diagnostic that is still alive.
///
/// # Safety
/// `diag` must be a live diagnostic.
pub(crate) unsafe fn record_from_raw(diag: CXDiagnostic) -> DiagnosticRecord {
    let (file, line, column, offset) = file_offset(clang_getDiagnosticLocation(diag));

    let mut disable: CXString = std::mem::zeroed();
    let option = cx_string_to_string(clang_getDiagnosticOption(diag, &mut disable));

    let ranges = (0..clang_getDiagnosticNumRanges(diag))
        .map(|i| span_of(clang_getDiagnosticRange(diag, i)))
        .collect();

    let fix_its = (0..clang_getDiagnosticNumFixIts(diag))
        .map(|i| {
            let mut range = clang_getNullRange();
            let text = cx_string_to_string(clang_getDiagnosticFixIt(diag, i, &mut range));
            FixItRecord {
                text,
                span: span_of(range),
            }
        })
        .collect();

    let mut children = Vec::new();
    let child_set = clang_getChildDiagnostics(diag);
    if !child_set.is_null() {
        for i in 0..clang_getNumDiagnosticsInSet(child_set) {
            children.push(record_from_raw(clang_getDiagnosticInSet(child_set, i)));
        }
    }

    DiagnosticRecord {
        severity: severity_from_raw(clang_getDiagnosticSeverity(diag)),
        message: cx_string_to_string(clang_getDiagnosticSpelling(diag)),
        formatted: cx_string_to_string(clang_formatDiagnostic(
            diag,
            clang_defaultDiagnosticDisplayOptions(),
        )),
        option,
        disable_option: cx_string_to_string(disable),
        category: clang_getDiagnosticCategory(diag),
        category_text: cx_string_to_string(clang_getDiagnosticCategoryText(diag)),
        file,
        line,
        column,
        offset,
        ranges,
        fix_its,
        children,
    }
}

impl DiagnosticRecord {
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    /// Build a report for `miette`, with `source` as the text of `file` if given.
    pub fn to_report(&self, source: Option<&str>) -> DiagnosticReport {
        let mut report = DiagnosticReport::new(self.severity, self.message.clone())
            .with_option(self.option.clone());

        if self.file.is_some() || !self.ranges.is_empty() {
            let span = self
                .ranges
                .iter()
                .find(|r| r.start <= self.offset && self.offset <= r.end)
                .copied()
                .unwrap_or(OffsetSpan {
                    start: self.offset,
                    end: self.offset,
                });
            report = report.with_span(span.start as usize, span.len() as usize);
        }

        if let (Some(file), Some(source)) = (&self.file, source) {
            report = report.with_source(file.display().to_string(), source.to_string());
        }

        if !self.fix_its.is_empty() {
            let hints: Vec<String> = self
                .fix_its
                .iter()
                .map(|f| {
                    if f.text.is_empty() {
                        "remove this code".to_string()
                    } else {
                        format!("replace with `{}`", f.text)
                    }
                })
                .collect();
            report = report.with_help(hints.join("; "));
        }

        for child in &self.children {
            report = report.with_note(child.to_report(source));
        }
        report
    }
}

impl TranslationUnit {
    /// The diagnostics produced while parsing this unit.
    pub fn diagnostics(&self) -> Result<DiagnosticSet> {
        let raw = self.raw()?;
        let set = unsafe { clang_getDiagnosticSetFromTU(raw) };
        let tu = self.owner()?;
        let id = self
            .registry()
            .wrap_child(self.id(), Native::DiagnosticSet { set, owned: false })?;
        Ok(DiagnosticSet {
            registry: self.registry().clone(),
            id,
            tu: Some(tu),
        })
    }

    pub fn num_diagnostics(&self) -> Result<usize> {
        let raw = self.raw()?;
        Ok(unsafe { clang_getNumDiagnostics(raw) } as usize)
    }

    /// Owned copies of every diagnostic.
    pub fn diagnostic_records(&self) -> Result<Vec<DiagnosticRecord>> {
        let set = self.diagnostics()?;
        let records = set.records()?;
        set.dispose()?;
        Ok(records)
    }

    /// Whether parsing produced an error or fatal diagnostic.
    pub fn has_errors(&self) -> Result<bool> {
        let raw = self.raw()?;
        let n = unsafe { clang_getNumDiagnostics(raw) };
        Ok((0..n).any(|i| unsafe {
            let diag = clang_getDiagnostic(raw, i);
            let severity = severity_from_raw(clang_getDiagnosticSeverity(diag));
            clang_disposeDiagnostic(diag);
            severity.is_error()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic as _;

    fn record() -> DiagnosticRecord {
        DiagnosticRecord {
            severity: Severity::Error,
            message: "use of undeclared identifier 'y'".to_string(),
            formatted: String::new(),
            option: String::new(),
            disable_option: String::new(),
            category: 2,
            category_text: "Semantic Issue".to_string(),
            file: Some(PathBuf::from("main.c")),
            line: 1,
            column: 20,
            offset: 19,
            ranges: vec![OffsetSpan { start: 19, end: 20 }],
            fix_its: vec![FixItRecord {
                text: "x".to_string(),
                span: OffsetSpan { start: 19, end: 20 },
            }],
            children: Vec::new(),
        }
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity_from_raw(CXDiagnostic_Ignored), Severity::Ignored);
        assert_eq!(severity_from_raw(CXDiagnostic_Warning), Severity::Warning);
        assert_eq!(severity_from_raw(CXDiagnostic_Fatal), Severity::Fatal);
    }

    #[test]
    fn test_record_to_report() {
        let source = "int main(){return y;}";
        let report = record().to_report(Some(source));

        assert_eq!(report.level, Severity::Error);
        assert!(report.option.is_none());
        assert_eq!(report.help.as_deref(), Some("replace with `x`"));
        assert_eq!(report.labels().map(|l| l.count()), Some(1));
        assert!(report.source_code().is_some());
    }

    #[test]
    fn test_record_notes_become_related() {
        let mut parent = record();
        let mut note = record();
        note.severity = Severity::Note;
        note.fix_its.clear();
        parent.children.push(note);

        let report = parent.to_report(None);
        assert_eq!(report.related().map(|r| r.count()), Some(1));
        assert!(report.source_code().is_none());
    }
}
