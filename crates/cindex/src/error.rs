//! Error types for the cindex adapter.
//!
//! Native failures keep libclang's own taxonomy (error codes, save errors,
//! layout sentinels) as distinct variants; adapter contract violations come
//! in through [`LifecycleError`].

use cindex_common::LifecycleError;
use miette::Diagnostic;
use std::ffi::NulError;
use std::fmt;
use thiserror::Error;

/// Result type for cindex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the adapter.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// A handle was used outside its lifecycle.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// libclang returned no translation unit.
    #[error("failed to create translation unit for {path}: {code}")]
    #[diagnostic(code(cindex::creation_failed))]
    Creation { path: String, code: ErrorCode },

    /// A factory returned NULL.
    #[error("libclang failed to create {what}")]
    #[diagnostic(code(cindex::null_handle))]
    NullHandle { what: &'static str },

    /// Reparsing failed; the translation unit may only be disposed now.
    #[error("reparse of {path} failed: {code}")]
    #[diagnostic(
        code(cindex::reparse_failed),
        help("the translation unit is poisoned; dispose it and parse again")
    )]
    ReparseFailed { path: String, code: ErrorCode },

    /// Saving a translation unit failed.
    #[error("failed to save translation unit to {path}: {error}")]
    #[diagnostic(code(cindex::save_failed))]
    Save { path: String, error: SaveError },

    /// Indexing a source file or translation unit failed.
    #[error("indexing {path} failed: {code}")]
    #[diagnostic(code(cindex::indexing_failed))]
    Indexing { path: String, code: ErrorCode },

    /// A size/alignment/offset query was answered with a layout sentinel.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A string passed to libclang contained a NUL byte.
    #[error("string passed to libclang contains an interior NUL byte")]
    InteriorNul(#[from] NulError),

    /// A translation unit flag name from configuration is not known.
    #[error("unknown translation unit flag '{0}'")]
    #[diagnostic(code(cindex::unknown_flag))]
    UnknownFlag(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] cindex_build::BuildError),

    /// Remapping information could not be loaded.
    #[error("failed to load remappings from {path}")]
    #[diagnostic(code(cindex::remapping))]
    Remapping { path: String },

    /// A serialized diagnostics file could not be read.
    #[error("failed to load diagnostics from {path}: {message}")]
    #[diagnostic(code(cindex::load_diagnostics))]
    LoadDiagnostics { path: String, message: String },

    /// libclang rejected the arguments of a query.
    #[error("invalid arguments to {0}")]
    InvalidArgument(&'static str),

    /// An index into a native sequence was out of bounds.
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

/// Failure codes of `CXErrorCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A generic error code, no further details are available.
    Failure,
    /// libclang crashed while performing the requested operation.
    Crashed,
    /// The function detected that the arguments violate its contract.
    InvalidArguments,
    /// An AST deserialization error occurred.
    AstReadError,
    /// A code this adapter does not know about.
    Other(i32),
}

impl ErrorCode {
    /// Map a native `CXErrorCode`; `None` means success.
    pub fn from_raw(code: i32) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(ErrorCode::Failure),
            2 => Some(ErrorCode::Crashed),
            3 => Some(ErrorCode::InvalidArguments),
            4 => Some(ErrorCode::AstReadError),
            other => Some(ErrorCode::Other(other)),
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            ErrorCode::Failure => 1,
            ErrorCode::Crashed => 2,
            ErrorCode::InvalidArguments => 3,
            ErrorCode::AstReadError => 4,
            ErrorCode::Other(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Failure => f.write_str("failure"),
            ErrorCode::Crashed => f.write_str("libclang crashed"),
            ErrorCode::InvalidArguments => f.write_str("invalid arguments"),
            ErrorCode::AstReadError => f.write_str("AST deserialization error"),
            ErrorCode::Other(code) => write!(f, "error code {}", code),
        }
    }
}

/// Failure results of `clang_saveTranslationUnit` (`CXSaveError`).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveError {
    /// File I/O failed while writing.
    #[error("unknown error (usually file I/O)")]
    Unknown,
    /// Errors during translation prevented saving.
    #[error("translation errors prevented saving")]
    TranslationErrors,
    /// The translation unit was invalid.
    #[error("invalid translation unit")]
    InvalidTranslationUnit,
}

impl SaveError {
    /// Map a native `CXSaveError`; `None` means the save succeeded.
    pub fn from_raw(code: i32) -> Option<Self> {
        match code {
            0 => None,
            2 => Some(SaveError::TranslationErrors),
            3 => Some(SaveError::InvalidTranslationUnit),
            _ => Some(SaveError::Unknown),
        }
    }
}

/// Sentinels returned by the type layout queries (`CXTypeLayoutError`).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum LayoutError {
    /// The type is of kind `Invalid`.
    #[error("type is invalid")]
    Invalid = -1,
    /// The type is incomplete.
    #[error("type is incomplete")]
    Incomplete = -2,
    /// The type is dependent.
    #[error("type is dependent")]
    Dependent = -3,
    /// The type is not a constant size type.
    #[error("type is not constant size")]
    NotConstantSize = -4,
    /// The field name is not valid for this record.
    #[error("field name is not valid for this record")]
    InvalidFieldName = -5,
    /// The type is undeduced.
    #[error("type is undeduced")]
    Undeduced = -6,
}

impl LayoutError {
    /// Split a layout query result into a value or its sentinel.
    pub fn check(value: i64) -> std::result::Result<u64, LayoutError> {
        match value {
            -1 => Err(LayoutError::Invalid),
            -2 => Err(LayoutError::Incomplete),
            -3 => Err(LayoutError::Dependent),
            -4 => Err(LayoutError::NotConstantSize),
            -5 => Err(LayoutError::InvalidFieldName),
            -6 => Err(LayoutError::Undeduced),
            v if v < 0 => Err(LayoutError::Invalid),
            v => Ok(v as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_round_trip() {
        assert_eq!(ErrorCode::from_raw(0), None);
        for raw in 1..=4 {
            assert_eq!(ErrorCode::from_raw(raw).map(ErrorCode::to_raw), Some(raw));
        }
        assert_eq!(ErrorCode::from_raw(42), Some(ErrorCode::Other(42)));
    }

    #[test]
    fn test_save_error_mapping() {
        assert_eq!(SaveError::from_raw(0), None);
        assert_eq!(SaveError::from_raw(1), Some(SaveError::Unknown));
        assert_eq!(SaveError::from_raw(2), Some(SaveError::TranslationErrors));
        assert_eq!(
            SaveError::from_raw(3),
            Some(SaveError::InvalidTranslationUnit)
        );
    }

    #[test]
    fn test_layout_sentinels_are_distinct() {
        assert_eq!(LayoutError::check(16), Ok(16));
        assert_eq!(LayoutError::check(0), Ok(0));
        assert_eq!(LayoutError::check(-1), Err(LayoutError::Invalid));
        assert_eq!(LayoutError::check(-2), Err(LayoutError::Incomplete));
        assert_eq!(LayoutError::check(-3), Err(LayoutError::Dependent));
        assert_eq!(LayoutError::check(-4), Err(LayoutError::NotConstantSize));
        assert_eq!(LayoutError::check(-5), Err(LayoutError::InvalidFieldName));
        assert_eq!(LayoutError::Incomplete as i64, -2);
    }
}
