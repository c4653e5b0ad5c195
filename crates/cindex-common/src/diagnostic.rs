//! Renderable compiler diagnostics.
//!
//! libclang diagnostics are surfaced verbatim; this module gives them a
//! `miette` face so callers can print them with source snippets, labels and
//! fix-it help the same way adapter errors are printed.

use miette::{Diagnostic, LabeledSpan, NamedSource, Severity, SourceCode, SourceSpan};
use std::fmt;
use thiserror::Error;

/// Severity of a compiler diagnostic, in libclang's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    Ignored,
    Note,
    Warning,
    Error,
    Fatal,
}

impl DiagnosticLevel {
    pub fn is_error(self) -> bool {
        self >= DiagnosticLevel::Error
    }
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticLevel::Ignored => "ignored",
            DiagnosticLevel::Note => "note",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Fatal => "fatal error",
        })
    }
}

/// A compiler diagnostic ready for display.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DiagnosticReport {
    pub level: DiagnosticLevel,
    pub message: String,
    /// Command-line option that enabled the diagnostic, e.g. `-Wunused-variable`.
    pub option: Option<String>,
    pub span: Option<SourceSpan>,
    pub label: String,
    pub help: Option<String>,
    pub notes: Vec<DiagnosticReport>,
    snippet: Option<NamedSource<String>>,
}

impl DiagnosticReport {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            option: None,
            span: None,
            label: String::new(),
            help: None,
            notes: Vec::new(),
            snippet: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, message)
    }

    /// Attach a byte range of the file the diagnostic points into.
    pub fn with_span(mut self, offset: usize, len: usize) -> Self {
        self.span = Some(SourceSpan::new(offset.into(), len));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        let option = option.into();
        if !option.is_empty() {
            self.option = Some(option);
        }
        self
    }

    pub fn with_source(mut self, name: impl AsRef<str>, text: String) -> Self {
        self.snippet = Some(NamedSource::new(name, text));
        self
    }

    pub fn with_note(mut self, note: DiagnosticReport) -> Self {
        self.notes.push(note);
        self
    }
}

impl Diagnostic for DiagnosticReport {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.option
            .as_ref()
            .map(|o| Box::new(o) as Box<dyn fmt::Display + 'a>)
    }

    fn severity(&self) -> Option<Severity> {
        Some(match self.level {
            DiagnosticLevel::Ignored | DiagnosticLevel::Note => Severity::Advice,
            DiagnosticLevel::Warning => Severity::Warning,
            DiagnosticLevel::Error | DiagnosticLevel::Fatal => Severity::Error,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.snippet.as_ref().map(|s| s as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        let label = (!self.label.is_empty()).then(|| self.label.clone());
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            label, span,
        ))))
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        if self.notes.is_empty() {
            return None;
        }
        Some(Box::new(self.notes.iter().map(|n| n as &dyn Diagnostic)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(DiagnosticLevel::Fatal.is_error());
        assert!(DiagnosticLevel::Error.is_error());
        assert!(!DiagnosticLevel::Warning.is_error());
        assert!(DiagnosticLevel::Note < DiagnosticLevel::Warning);
    }

    #[test]
    fn test_report_maps_to_miette() {
        let report = DiagnosticReport::warning("unused variable 'x'")
            .with_option("-Wunused-variable")
            .with_help("remove the declaration")
            .with_source("main.c", "int main(){int x;return 0;}".to_string())
            .with_span(15, 1)
            .with_note(DiagnosticReport::new(DiagnosticLevel::Note, "declared here"));

        assert_eq!(report.to_string(), "unused variable 'x'");
        assert_eq!(report.severity(), Some(Severity::Warning));
        assert_eq!(
            report.code().map(|c| c.to_string()),
            Some("-Wunused-variable".to_string())
        );
        assert_eq!(report.labels().map(|l| l.count()), Some(1));
        assert_eq!(report.related().map(|r| r.count()), Some(1));
        assert!(report.source_code().is_some());
    }

    #[test]
    fn test_empty_option_is_dropped() {
        let report = DiagnosticReport::error("expected ';'").with_option("");
        assert!(report.option.is_none());
        assert!(report.labels().is_none());
    }
}
