//! Safe, lifecycle-checked adapter over the libclang C API.
//!
//! This crate provides:
//! - Opaque handles for every disposable libclang object ([`Index`],
//!   [`TranslationUnit`], [`DiagnosticSet`], [`TokenBatch`], ...) that detect
//!   use after dispose, double dispose and disposal of a container with live
//!   children instead of crashing
//! - Value types ([`Cursor`], [`Type`], [`SourceLocation`], [`File`]) that go
//!   stale when their translation unit is reparsed
//! - Output-parameter queries folded into plain return values
//! - Closure-based visitors for libclang's callback APIs
//! - Native strings and arrays released exactly once
//!
//! # Architecture
//!
//! ```text
//! Index ──┬── TranslationUnit ──┬── DiagnosticSet
//!         │                     ├── TokenBatch
//!         │                     └── ResourceUsage
//!         └── IndexAction
//! ```
//!
//! Every object under one index is registered in a shared table. Handles are
//! not `Send`; use one index per thread.
//!
//! # Example
//!
//! ```no_run
//! use cindex::{Index, IndexConfig, TranslationUnitFlags, UnsavedFile};
//!
//! # fn main() -> cindex::Result<()> {
//! let index = Index::new(&IndexConfig::default())?;
//! let main = UnsavedFile::new("main.c", "int main(){return 0;}")?;
//! let tu = index.parse("main.c", &[], &[main], TranslationUnitFlags::empty())?;
//! for child in tu.cursor()?.children()? {
//!     println!("{:?} {}", child.kind(), child.spelling()?);
//! }
//! tu.dispose()?;
//! index.dispose()?;
//! # Ok(())
//! # }
//! ```

mod comment;
mod completion;
mod cursor;
mod cursor_set;
mod diagnostic;
mod error;
mod flags;
mod index;
mod indexer;
mod kind;
mod location;
mod module;
mod registry;
mod remap;
mod resource;
mod string;
mod token;
mod translation_unit;
mod tree;
mod types;
mod unsaved;
mod visit;

pub mod usr;

pub use comment::{Comment, CommentKind, ParamDirection};
pub use completion::{
    CompletionChunk, CompletionChunkKind, CompletionResult, CompletionResults, CompletionString,
};
pub use cursor::{Availability, Cursor, EvalResult, PlatformAvailability, Version};
pub use cursor_set::CursorSet;
pub use diagnostic::{
    Diagnostic, DiagnosticRecord, DiagnosticSet, FixIt, FixItRecord, OffsetSpan, Severity,
};
pub use error::{Error, ErrorCode, LayoutError, Result, SaveError};
pub use flags::{
    CodeCompleteFlags, CompletionContexts, DiagnosticDisplayOptions, GlobalOptions, IndexOptions,
    ObjCDeclQualifiers, ObjCPropertyAttributes, SymbolRoles, TranslationUnitFlags,
};
pub use index::Index;
pub use indexer::{
    DeclInfo, EntityInfo, EntityKind, EntityLanguage, EntityRefInfo, EntityRefKind,
    EntityTemplateKind, ImportedAstFileInfo, IncludedFileInfo, IndexAction, IndexLocation,
    IndexRecorder, IndexerCallbacks,
};
pub use kind::{
    AccessSpecifier, AvailabilityKind, CallingConv, CursorKind, EvalResultKind,
    ExceptionSpecification, Language, Linkage, Nullability, RefQualifier, StorageClass,
    TemplateArgumentKind, TlsKind, TokenKind, TypeKind, Visibility,
};
pub use location::{File, FileUniqueId, Location, PresumedLocation, SourceLocation, SourceRange};
pub use module::Module;
pub use remap::Remapping;
pub use resource::{resource_usage_name, ResourceUsage, ResourceUsageEntry};
pub use string::CxString;
pub use token::{Token, TokenBatch};
pub use translation_unit::{TargetInfo, TranslationUnit};
pub use tree::{AstNode, NodeLocation};
pub use types::Type;
pub use unsaved::UnsavedFile;
pub use usr::{clang_version, toggle_crash_recovery};
pub use visit::{ChildVisit, Visit, VisitOutcome};

pub use cindex_build::{
    CindexConfig, CompileCommand, CompileCommands, IndexConfig, ParseSettings,
};
pub use cindex_common::{DiagnosticLevel, DiagnosticReport, HandleClass, LifecycleError};

use std::path::Path;

/// Parse one file with settings from `config` and copy out its main-file
/// declarations.
///
/// Every handle created on the way is disposed before returning.
pub fn snapshot_file(path: &Path, config: &CindexConfig) -> Result<AstNode> {
    let index = Index::from_config(config)?;
    let settings = config.settings_for(path);
    let tu = index.parse_with(&settings, &[])?;
    let tree = tu.snapshot(true)?;
    tu.dispose()?;
    index.dispose()?;
    Ok(tree)
}
