//! Code completion.
//!
//! Results are copied into an owned tree right away and the native result
//! block is released before `code_complete_at` returns, so nothing here
//! depends on the translation unit afterwards.

use crate::diagnostic::{record_from_raw, DiagnosticRecord};
use crate::error::{Error, Result};
use crate::flags::{CodeCompleteFlags, CompletionContexts};
use crate::kind::{closed_enum, AvailabilityKind, CursorKind};
use crate::string::cx_string_to_string;
use crate::translation_unit::TranslationUnit;
use crate::unsaved::{self, UnsavedFile};
use cindex_common::{HandleClass, Release, Tracked};
use clang_sys::*;
use std::ffi::CString;
use std::fmt;
use std::os::raw::c_uint;
use std::path::Path;

closed_enum! {
    /// Kind of a completion chunk (`CXCompletionChunkKind`).
    pub enum CompletionChunkKind: CXCompletionChunkKind {
        Optional = CXCompletionChunk_Optional,
        TypedText = CXCompletionChunk_TypedText,
        Text = CXCompletionChunk_Text,
        Placeholder = CXCompletionChunk_Placeholder,
        Informative = CXCompletionChunk_Informative,
        CurrentParameter = CXCompletionChunk_CurrentParameter,
        LeftParen = CXCompletionChunk_LeftParen,
        RightParen = CXCompletionChunk_RightParen,
        LeftBracket = CXCompletionChunk_LeftBracket,
        RightBracket = CXCompletionChunk_RightBracket,
        LeftBrace = CXCompletionChunk_LeftBrace,
        RightBrace = CXCompletionChunk_RightBrace,
        LeftAngle = CXCompletionChunk_LeftAngle,
        RightAngle = CXCompletionChunk_RightAngle,
        Comma = CXCompletionChunk_Comma,
        ResultType = CXCompletionChunk_ResultType,
        Colon = CXCompletionChunk_Colon,
        SemiColon = CXCompletionChunk_SemiColon,
        Equal = CXCompletionChunk_Equal,
        HorizontalSpace = CXCompletionChunk_HorizontalSpace,
        VerticalSpace = CXCompletionChunk_VerticalSpace,
    }
}

/// One piece of a completion string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionChunk {
    pub kind: CompletionChunkKind,
    pub text: String,
    /// For `Optional` chunks, the text that may be left out.
    pub optional: Option<CompletionString>,
}

/// How a completion would be inserted, plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionString {
    pub chunks: Vec<CompletionChunk>,
    /// Lower is more likely.
    pub priority: u32,
    pub availability: Option<AvailabilityKind>,
    pub annotations: Vec<String>,
    /// Name of the context the completion belongs to, e.g. a class name.
    pub parent: String,
    pub brief_comment: String,
}

impl CompletionString {
    /// The text the user is expected to type.
    pub fn typed_text(&self) -> Option<&str> {
        self.chunks
            .iter()
            .find(|c| c.kind == CompletionChunkKind::TypedText)
            .map(|c| c.text.as_str())
    }

    /// The result type chunk, if any.
    pub fn result_type(&self) -> Option<&str> {
        self.chunks
            .iter()
            .find(|c| c.kind == CompletionChunkKind::ResultType)
            .map(|c| c.text.as_str())
    }
}

impl fmt::Display for CompletionString {
    /// Required chunks in order; optional ones and the result type are left out.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in &self.chunks {
            match chunk.kind {
                CompletionChunkKind::Optional
                | CompletionChunkKind::ResultType
                | CompletionChunkKind::Informative => {}
                _ => f.write_str(&chunk.text)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    /// Kind of the entity the completion refers to.
    pub cursor_kind: CursorKind,
    pub string: CompletionString,
}

/// Everything returned by one completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionResults {
    pub results: Vec<CompletionResult>,
    pub contexts: CompletionContexts,
    pub diagnostics: Vec<DiagnosticRecord>,
    /// Kind of the entity whose members are completed (e.g. a struct).
    pub container_kind: Option<CursorKind>,
    /// Whether libclang knew only part of the container.
    pub container_incomplete: bool,
    pub container_usr: String,
    pub objc_selector: String,
}

impl CompletionResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results whose typed text starts with `prefix`.
    pub fn matching<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a CompletionResult> + 'a {
        self.results.iter().filter(move |r| {
            r.string
                .typed_text()
                .map(|t| t.starts_with(prefix))
                .unwrap_or(false)
        })
    }

    /// Order results by priority, then by typed text.
    pub fn sort_by_priority(&mut self) {
        self.results.sort_by(|a, b| {
            a.string
                .priority
                .cmp(&b.string.priority)
                .then_with(|| a.string.typed_text().cmp(&b.string.typed_text()))
        });
    }
}

#[derive(Debug)]
struct NativeCompletions(*mut CXCodeCompleteResults);

impl Release for NativeCompletions {
    const CLASS: HandleClass = HandleClass::Derived("completion results");

    fn release(&mut self) {
        if !self.0.is_null() {
            unsafe { clang_disposeCodeCompleteResults(self.0) }
        }
    }
}

unsafe fn copy_completion_string(cs: CXCompletionString) -> CompletionString {
    if cs.is_null() {
        return CompletionString::default();
    }

    let mut chunks = Vec::new();
    for i in 0..clang_getNumCompletionChunks(cs) {
        let raw_kind = clang_getCompletionChunkKind(cs, i);
        let Some(kind) = CompletionChunkKind::from_raw(raw_kind) else {
            tracing::trace!(raw_kind, "skipping unknown completion chunk");
            continue;
        };
        let optional = (kind == CompletionChunkKind::Optional)
            .then(|| copy_completion_string(clang_getCompletionChunkCompletionString(cs, i)));
        chunks.push(CompletionChunk {
            kind,
            text: cx_string_to_string(clang_getCompletionChunkText(cs, i)),
            optional,
        });
    }

    let annotations = (0..clang_getCompletionNumAnnotations(cs))
        .map(|i| cx_string_to_string(clang_getCompletionAnnotation(cs, i)))
        .collect();

    CompletionString {
        chunks,
        priority: clang_getCompletionPriority(cs),
        availability: AvailabilityKind::from_raw(clang_getCompletionAvailability(cs)),
        annotations,
        parent: cx_string_to_string(clang_getCompletionParent(cs, std::ptr::null_mut())),
        brief_comment: cx_string_to_string(clang_getCompletionBriefComment(cs)),
    }
}

impl TranslationUnit {
    /// Complete code at `line`/`column` (1-based) of `file`.
    ///
    /// `unsaved` should hold the current editor contents. Results are sorted
    /// by typed text.
    pub fn code_complete_at(
        &self,
        file: impl AsRef<Path>,
        line: u32,
        column: u32,
        unsaved: &[UnsavedFile],
        flags: CodeCompleteFlags,
    ) -> Result<CompletionResults> {
        let raw = self.raw()?;
        let file = file.as_ref();
        let c_file = CString::new(file.to_string_lossy().as_bytes())?;
        let mut native_unsaved = unsaved::to_native(unsaved);

        let native = unsafe {
            clang_codeCompleteAt(
                raw,
                c_file.as_ptr(),
                line as c_uint,
                column as c_uint,
                unsaved::as_native_ptr(&mut native_unsaved),
                native_unsaved.len() as c_uint,
                flags.bits() as _,
            )
        };
        let native = Tracked::acquire(NativeCompletions(native));
        let results = native.get()?.0;
        if results.is_null() {
            return Err(Error::InvalidArgument("code completion"));
        }

        let completions = unsafe {
            let block = &*results;
            if !block.Results.is_null() {
                clang_sortCodeCompletionResults(block.Results, block.NumResults);
            }
            let raw_results: &[CXCompletionResult] = if block.Results.is_null() {
                &[]
            } else {
                std::slice::from_raw_parts(block.Results, block.NumResults as usize)
            };

            let diagnostics = (0..clang_codeCompleteGetNumDiagnostics(results))
                .map(|i| {
                    let diag = clang_codeCompleteGetDiagnostic(results, i);
                    let record = record_from_raw(diag);
                    clang_disposeDiagnostic(diag);
                    record
                })
                .collect();

            let mut incomplete: c_uint = 0;
            let container = clang_codeCompleteGetContainerKind(results, &mut incomplete);

            CompletionResults {
                results: raw_results
                    .iter()
                    .map(|r| CompletionResult {
                        cursor_kind: CursorKind(r.CursorKind),
                        string: copy_completion_string(r.CompletionString),
                    })
                    .collect(),
                contexts: CompletionContexts::from_bits_retain(
                    clang_codeCompleteGetContexts(results) as u64,
                ),
                diagnostics,
                container_kind: (container != CXCursor_InvalidCode).then_some(CursorKind(container)),
                container_incomplete: incomplete != 0,
                container_usr: cx_string_to_string(clang_codeCompleteGetContainerUSR(results)),
                objc_selector: cx_string_to_string(clang_codeCompleteGetObjCSelector(results)),
            }
        };

        tracing::debug!(
            file = %file.display(),
            line,
            column,
            results = completions.len(),
            "code completion"
        );
        Ok(completions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(kind: CompletionChunkKind, text: &str) -> CompletionChunk {
        CompletionChunk {
            kind,
            text: text.to_string(),
            optional: None,
        }
    }

    fn function(name: &str, priority: u32) -> CompletionResult {
        CompletionResult {
            cursor_kind: CursorKind::FUNCTION_DECL,
            string: CompletionString {
                chunks: vec![
                    chunk(CompletionChunkKind::ResultType, "int"),
                    chunk(CompletionChunkKind::TypedText, name),
                    chunk(CompletionChunkKind::LeftParen, "("),
                    chunk(CompletionChunkKind::Placeholder, "int x"),
                    CompletionChunk {
                        kind: CompletionChunkKind::Optional,
                        text: String::new(),
                        optional: Some(CompletionString {
                            chunks: vec![
                                chunk(CompletionChunkKind::Comma, ", "),
                                chunk(CompletionChunkKind::Placeholder, "int y"),
                            ],
                            ..Default::default()
                        }),
                    },
                    chunk(CompletionChunkKind::RightParen, ")"),
                ],
                priority,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_chunk_kind_mapping() {
        assert_eq!(
            CompletionChunkKind::from_raw(CXCompletionChunk_TypedText),
            Some(CompletionChunkKind::TypedText)
        );
        assert_eq!(CompletionChunkKind::VerticalSpace.to_raw(), 20);
        assert_eq!(CompletionChunkKind::from_raw(99), None);
    }

    #[test]
    fn test_completion_string_text() {
        let result = function("add", 50);
        assert_eq!(result.string.typed_text(), Some("add"));
        assert_eq!(result.string.result_type(), Some("int"));
        assert_eq!(result.string.to_string(), "add(int x)");
    }

    #[test]
    fn test_matching_and_sorting() {
        let mut results = CompletionResults {
            results: vec![function("sub", 50), function("abs", 40), function("add", 50)],
            ..Default::default()
        };
        assert_eq!(results.matching("a").count(), 2);

        results.sort_by_priority();
        let order: Vec<_> = results
            .results
            .iter()
            .filter_map(|r| r.string.typed_text())
            .collect();
        assert_eq!(order, ["abs", "add", "sub"]);
    }
}
