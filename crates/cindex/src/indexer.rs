//! The indexing API.
//!
//! An [`IndexAction`] runs libclang's indexer over a source file or an
//! already parsed translation unit and reports what it finds through an
//! [`IndexerCallbacks`] implementation. Every callback receives owned
//! records, so nothing handed to it dangles once indexing returns.
//!
//! libclang may run the indexer on a helper thread while the calling thread
//! waits for it; callbacks therefore never overlap with each other or with
//! the caller.

use crate::diagnostic::{record_from_raw, DiagnosticRecord};
use crate::error::{Error, ErrorCode, Result};
use crate::flags::{IndexOptions, SymbolRoles, TranslationUnitFlags};
use crate::index::Index;
use crate::kind::{closed_enum, CursorKind};
use crate::registry::{Native, Registry};
use crate::string::{c_str_to_string, cx_string_to_string};
use crate::translation_unit::TranslationUnit;
use crate::unsaved::{self, UnsavedFile};
use crate::visit::{Bridge, VisitOutcome};
use cindex_common::RawId;
use clang_sys::*;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::path::{Path, PathBuf};
use std::ptr;
use std::rc::Rc;

closed_enum! {
    /// Kind of an indexed entity (`CXIdxEntityKind`).
    pub enum EntityKind: CXIdxEntityKind {
        Unexposed = CXIdxEntity_Unexposed,
        Typedef = CXIdxEntity_Typedef,
        Function = CXIdxEntity_Function,
        Variable = CXIdxEntity_Variable,
        Field = CXIdxEntity_Field,
        EnumConstant = CXIdxEntity_EnumConstant,
        ObjCClass = CXIdxEntity_ObjCClass,
        ObjCProtocol = CXIdxEntity_ObjCProtocol,
        ObjCCategory = CXIdxEntity_ObjCCategory,
        ObjCInstanceMethod = CXIdxEntity_ObjCInstanceMethod,
        ObjCClassMethod = CXIdxEntity_ObjCClassMethod,
        ObjCProperty = CXIdxEntity_ObjCProperty,
        ObjCIvar = CXIdxEntity_ObjCIvar,
        Enum = CXIdxEntity_Enum,
        Struct = CXIdxEntity_Struct,
        Union = CXIdxEntity_Union,
        CxxClass = CXIdxEntity_CXXClass,
        CxxNamespace = CXIdxEntity_CXXNamespace,
        CxxNamespaceAlias = CXIdxEntity_CXXNamespaceAlias,
        CxxStaticVariable = CXIdxEntity_CXXStaticVariable,
        CxxStaticMethod = CXIdxEntity_CXXStaticMethod,
        CxxInstanceMethod = CXIdxEntity_CXXInstanceMethod,
        CxxConstructor = CXIdxEntity_CXXConstructor,
        CxxDestructor = CXIdxEntity_CXXDestructor,
        CxxConversionFunction = CXIdxEntity_CXXConversionFunction,
        CxxTypeAlias = CXIdxEntity_CXXTypeAlias,
        CxxInterface = CXIdxEntity_CXXInterface,
    }
}

closed_enum! {
    /// Template kind of an indexed C++ entity (`CXIdxEntityCXXTemplateKind`).
    pub enum EntityTemplateKind: CXIdxEntityCXXTemplateKind {
        NonTemplate = CXIdxEntity_NonTemplate,
        Template = CXIdxEntity_Template,
        PartialSpecialization = CXIdxEntity_TemplatePartialSpecialization,
        Specialization = CXIdxEntity_TemplateSpecialization,
    }
}

closed_enum! {
    /// Source language of an indexed entity (`CXIdxEntityLanguage`).
    pub enum EntityLanguage: CXIdxEntityLanguage {
        None = CXIdxEntityLang_None,
        C = CXIdxEntityLang_C,
        ObjC = CXIdxEntityLang_ObjC,
        Cxx = CXIdxEntityLang_CXX,
        Swift = CXIdxEntityLang_Swift,
    }
}

closed_enum! {
    /// Whether a reference is written in the source (`CXIdxEntityRefKind`).
    pub enum EntityRefKind: CXIdxEntityRefKind {
        Direct = CXIdxEntityRef_Direct,
        Implicit = CXIdxEntityRef_Implicit,
    }
}

/// A resolved indexer location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexLocation {
    pub file: Option<PathBuf>,
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// An entity seen by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    pub kind: Option<EntityKind>,
    pub template_kind: Option<EntityTemplateKind>,
    pub language: Option<EntityLanguage>,
    pub name: String,
    pub usr: String,
    pub cursor_kind: CursorKind,
}

/// A declaration seen by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclInfo {
    pub entity: Option<EntityInfo>,
    pub cursor_kind: CursorKind,
    pub location: IndexLocation,
    /// USR of the semantic container, e.g. the class of a method.
    pub semantic_container: String,
    pub lexical_container: String,
    pub is_redeclaration: bool,
    pub is_definition: bool,
    pub is_container: bool,
    pub is_implicit: bool,
}

/// A reference to an entity seen by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRefInfo {
    pub kind: Option<EntityRefKind>,
    pub cursor_kind: CursorKind,
    pub location: IndexLocation,
    pub referenced: Option<EntityInfo>,
    /// The entity the reference occurs in, e.g. the calling function.
    pub parent: Option<EntityInfo>,
    pub container: String,
    pub roles: SymbolRoles,
}

/// An `#include` or `#import` seen by the preprocessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFileInfo {
    /// The name as written, without quotes or angle brackets.
    pub filename: String,
    pub file: Option<PathBuf>,
    pub location: IndexLocation,
    pub is_import: bool,
    pub is_angled: bool,
    /// Whether the directive was turned into a module import.
    pub is_module_import: bool,
}

/// An AST file (PCH or module) read during indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedAstFileInfo {
    pub file: Option<PathBuf>,
    /// Full name of the module, if the file is one.
    pub module: Option<String>,
    pub location: IndexLocation,
    pub is_implicit: bool,
}

/// Receiver for indexer events. Every method defaults to doing nothing.
pub trait IndexerCallbacks {
    /// Polled periodically; return `true` to stop indexing.
    fn abort_query(&mut self) -> bool {
        false
    }

    fn diagnostic(&mut self, _diagnostics: Vec<DiagnosticRecord>) {}

    fn entered_main_file(&mut self, _file: PathBuf) {}

    fn included_file(&mut self, _info: IncludedFileInfo) {}

    fn imported_ast_file(&mut self, _info: ImportedAstFileInfo) {}

    fn started_translation_unit(&mut self) {}

    fn declaration(&mut self, _info: DeclInfo) {}

    fn entity_reference(&mut self, _info: EntityRefInfo) {}
}

/// Collects everything it is told. Mostly useful for tests and tooling.
#[derive(Debug, Default, Clone)]
pub struct IndexRecorder {
    pub diagnostics: Vec<DiagnosticRecord>,
    pub main_file: Option<PathBuf>,
    pub includes: Vec<IncludedFileInfo>,
    pub imported: Vec<ImportedAstFileInfo>,
    pub declarations: Vec<DeclInfo>,
    pub references: Vec<EntityRefInfo>,
}

impl IndexerCallbacks for IndexRecorder {
    fn diagnostic(&mut self, diagnostics: Vec<DiagnosticRecord>) {
        self.diagnostics.extend(diagnostics);
    }

    fn entered_main_file(&mut self, file: PathBuf) {
        self.main_file = Some(file);
    }

    fn included_file(&mut self, info: IncludedFileInfo) {
        self.includes.push(info);
    }

    fn imported_ast_file(&mut self, info: ImportedAstFileInfo) {
        self.imported.push(info);
    }

    fn declaration(&mut self, info: DeclInfo) {
        self.declarations.push(info);
    }

    fn entity_reference(&mut self, info: EntityRefInfo) {
        self.references.push(info);
    }
}

/// State behind the client-data pointer of one indexing run.
struct IndexSession<'c, C> {
    callbacks: &'c mut C,
    aborted: bool,
}

unsafe fn file_path(file: CXFile) -> Option<PathBuf> {
    (!file.is_null()).then(|| PathBuf::from(cx_string_to_string(clang_getFileName(file))))
}

unsafe fn copy_location(loc: CXIdxLoc) -> IndexLocation {
    let mut file: CXFile = ptr::null_mut();
    let mut line = 0;
    let mut column = 0;
    let mut offset = 0;
    clang_indexLoc_getFileLocation(
        loc,
        ptr::null_mut(),
        &mut file,
        &mut line,
        &mut column,
        &mut offset,
    );
    IndexLocation {
        file: file_path(file),
        line,
        column,
        offset,
    }
}

unsafe fn copy_entity(info: *const CXIdxEntityInfo) -> Option<EntityInfo> {
    let info = info.as_ref()?;
    Some(EntityInfo {
        kind: EntityKind::from_raw(info.kind),
        template_kind: EntityTemplateKind::from_raw(info.templateKind),
        language: EntityLanguage::from_raw(info.lang),
        name: c_str_to_string(info.name),
        usr: c_str_to_string(info.USR),
        cursor_kind: CursorKind(clang_getCursorKind(info.cursor)),
    })
}

unsafe fn container_usr(container: *const CXIdxContainerInfo) -> String {
    match container.as_ref() {
        Some(container) => cx_string_to_string(clang_getCursorUSR(container.cursor)),
        None => String::new(),
    }
}

unsafe fn copy_decl(info: &CXIdxDeclInfo) -> DeclInfo {
    DeclInfo {
        entity: copy_entity(info.entityInfo),
        cursor_kind: CursorKind(clang_getCursorKind(info.cursor)),
        location: copy_location(info.loc),
        semantic_container: container_usr(info.semanticContainer),
        lexical_container: container_usr(info.lexicalContainer),
        is_redeclaration: info.isRedeclaration != 0,
        is_definition: info.isDefinition != 0,
        is_container: info.isContainer != 0,
        is_implicit: info.isImplicit != 0,
    }
}

unsafe fn copy_ref(info: &CXIdxEntityRefInfo) -> EntityRefInfo {
    EntityRefInfo {
        kind: EntityRefKind::from_raw(info.kind),
        cursor_kind: CursorKind(clang_getCursorKind(info.cursor)),
        location: copy_location(info.loc),
        referenced: copy_entity(info.referencedEntity),
        parent: copy_entity(info.parentEntity),
        container: container_usr(info.container),
        roles: SymbolRoles::from_bits_retain(info.role as u32),
    }
}

unsafe fn session<'a, 'c, C>(data: CXClientData) -> &'a mut Bridge<IndexSession<'c, C>> {
    Bridge::from_client_data(data)
}

extern "C" fn abort_query_trampoline<C: IndexerCallbacks>(
    data: CXClientData,
    _reserved: *mut c_void,
) -> c_int {
    let bridge = unsafe { session::<C>(data) };
    let abort = bridge.call(true, |s, _| {
        if !s.aborted && s.callbacks.abort_query() {
            tracing::debug!("indexing aborted by callback");
            s.aborted = true;
        }
        s.aborted
    });
    abort as c_int
}

extern "C" fn diagnostic_trampoline<C: IndexerCallbacks>(
    data: CXClientData,
    set: CXDiagnosticSet,
    _reserved: *mut c_void,
) {
    let bridge = unsafe { session::<C>(data) };
    bridge.call((), |s, _| {
        let records = unsafe {
            (0..clang_getNumDiagnosticsInSet(set))
                .map(|i| record_from_raw(clang_getDiagnosticInSet(set, i)))
                .collect()
        };
        s.callbacks.diagnostic(records);
    });
}

extern "C" fn entered_main_file_trampoline<C: IndexerCallbacks>(
    data: CXClientData,
    file: CXFile,
    _reserved: *mut c_void,
) -> CXIdxClientFile {
    let bridge = unsafe { session::<C>(data) };
    bridge.call((), |s, _| {
        if let Some(path) = unsafe { file_path(file) } {
            s.callbacks.entered_main_file(path);
        }
    });
    ptr::null_mut()
}

extern "C" fn included_file_trampoline<C: IndexerCallbacks>(
    data: CXClientData,
    info: *const CXIdxIncludedFileInfo,
) -> CXIdxClientFile {
    let bridge = unsafe { session::<C>(data) };
    bridge.call((), |s, _| {
        let Some(info) = (unsafe { info.as_ref() }) else {
            return;
        };
        let record = unsafe {
            IncludedFileInfo {
                filename: c_str_to_string(info.filename),
                file: file_path(info.file),
                location: copy_location(info.hashLoc),
                is_import: info.isImport != 0,
                is_angled: info.isAngled != 0,
                is_module_import: info.isModuleImport != 0,
            }
        };
        s.callbacks.included_file(record);
    });
    ptr::null_mut()
}

extern "C" fn imported_ast_file_trampoline<C: IndexerCallbacks>(
    data: CXClientData,
    info: *const CXIdxImportedASTFileInfo,
) -> CXIdxClientASTFile {
    let bridge = unsafe { session::<C>(data) };
    bridge.call((), |s, _| {
        let Some(info) = (unsafe { info.as_ref() }) else {
            return;
        };
        let record = unsafe {
            ImportedAstFileInfo {
                file: file_path(info.file),
                module: (!info.module.is_null())
                    .then(|| cx_string_to_string(clang_Module_getFullName(info.module))),
                location: copy_location(info.loc),
                is_implicit: info.isImplicit != 0,
            }
        };
        s.callbacks.imported_ast_file(record);
    });
    ptr::null_mut()
}

extern "C" fn started_translation_unit_trampoline<C: IndexerCallbacks>(
    data: CXClientData,
    _reserved: *mut c_void,
) -> CXIdxClientContainer {
    let bridge = unsafe { session::<C>(data) };
    bridge.call((), |s, _| s.callbacks.started_translation_unit());
    ptr::null_mut()
}

extern "C" fn declaration_trampoline<C: IndexerCallbacks>(
    data: CXClientData,
    info: *const CXIdxDeclInfo,
) {
    let bridge = unsafe { session::<C>(data) };
    bridge.call((), |s, _| {
        if let Some(info) = unsafe { info.as_ref() } {
            let record = unsafe { copy_decl(info) };
            tracing::trace!(name = ?record.entity.as_ref().map(|e| &e.name), "indexed declaration");
            s.callbacks.declaration(record);
        }
    });
}

extern "C" fn entity_reference_trampoline<C: IndexerCallbacks>(
    data: CXClientData,
    info: *const CXIdxEntityRefInfo,
) {
    let bridge = unsafe { session::<C>(data) };
    bridge.call((), |s, _| {
        if let Some(info) = unsafe { info.as_ref() } {
            let record = unsafe { copy_ref(info) };
            s.callbacks.entity_reference(record);
        }
    });
}

fn native_callbacks<C: IndexerCallbacks>() -> clang_sys::IndexerCallbacks {
    clang_sys::IndexerCallbacks {
        abortQuery: Some(abort_query_trampoline::<C>),
        diagnostic: Some(diagnostic_trampoline::<C>),
        enteredMainFile: Some(entered_main_file_trampoline::<C>),
        ppIncludedFile: Some(included_file_trampoline::<C>),
        importedASTFile: Some(imported_ast_file_trampoline::<C>),
        startedTranslationUnit: Some(started_translation_unit_trampoline::<C>),
        indexDeclaration: Some(declaration_trampoline::<C>),
        indexEntityReference: Some(entity_reference_trampoline::<C>),
    }
}

/// An indexing session, reusable across files.
///
/// A disposable child of the [`Index`] it was created from.
#[derive(Debug)]
pub struct IndexAction {
    registry: Rc<Registry>,
    id: RawId,
}

impl IndexAction {
    pub fn new(index: &Index) -> Result<Self> {
        let raw = unsafe { clang_IndexAction_create(index.raw()?) };
        if raw.is_null() {
            return Err(Error::NullHandle {
                what: "index action",
            });
        }
        let registry = index.registry().clone();
        let id = registry.wrap_child(index.id(), Native::IndexAction(raw))?;
        tracing::debug!("created index action");
        Ok(Self { registry, id })
    }

    fn raw(&self) -> Result<CXIndexAction> {
        Ok(self.registry.get(self.id)?.index_action())
    }

    /// Parse and index a source file.
    ///
    /// Returns `Terminated` when [`IndexerCallbacks::abort_query`] stopped
    /// the run. A panic in a callback stops indexing and is resumed here.
    /// The action can't be disposed from inside its own callbacks.
    pub fn index_source_file<C: IndexerCallbacks>(
        &self,
        callbacks: &mut C,
        options: IndexOptions,
        path: impl AsRef<Path>,
        args: &[&str],
        unsaved: &[UnsavedFile],
        flags: TranslationUnitFlags,
    ) -> Result<VisitOutcome> {
        let path = path.as_ref();
        let raw = self.raw()?;
        let _in_use = Registry::enter(&self.registry, self.id)?;
        let c_path = CString::new(path.to_string_lossy().as_bytes())?;
        let c_args = args
            .iter()
            .map(|a| CString::new(*a))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let arg_ptrs: Vec<*const c_char> = c_args.iter().map(|a| a.as_ptr()).collect();
        let mut native_unsaved = unsaved::to_native(unsaved);
        let mut native_callbacks = native_callbacks::<C>();

        let mut bridge = Bridge::new(
            IndexSession {
                callbacks,
                aborted: false,
            },
            None,
        );
        let code = unsafe {
            clang_indexSourceFile(
                raw,
                bridge.client_data(),
                &mut native_callbacks,
                std::mem::size_of::<clang_sys::IndexerCallbacks>() as c_uint,
                options.bits() as _,
                c_path.as_ptr(),
                arg_ptrs.as_ptr(),
                arg_ptrs.len() as c_int,
                unsaved::as_native_ptr(&mut native_unsaved),
                native_unsaved.len() as c_uint,
                ptr::null_mut(),
                flags.bits() as _,
            )
        };
        let session = bridge.finish();

        finish_run(path, code, session.aborted)
    }

    /// Index a translation unit that is already parsed.
    pub fn index_translation_unit<C: IndexerCallbacks>(
        &self,
        callbacks: &mut C,
        options: IndexOptions,
        tu: &TranslationUnit,
    ) -> Result<VisitOutcome> {
        let raw = self.raw()?;
        let tu_raw = tu.raw()?;
        let owner = tu.owner()?;
        let _in_use = Registry::enter(&self.registry, self.id)?;
        let _tu_in_use = owner.enter("translation unit")?;
        let mut native_callbacks = native_callbacks::<C>();

        let mut bridge = Bridge::new(
            IndexSession {
                callbacks,
                aborted: false,
            },
            Some(owner),
        );
        let code = unsafe {
            clang_indexTranslationUnit(
                raw,
                bridge.client_data(),
                &mut native_callbacks,
                std::mem::size_of::<clang_sys::IndexerCallbacks>() as c_uint,
                options.bits() as _,
                tu_raw,
            )
        };
        let session = bridge.finish();

        finish_run(tu.path(), code, session.aborted)
    }

    pub fn is_live(&self) -> bool {
        self.registry.is_live(self.id)
    }

    /// Release the action. Fails with `DoubleDispose` the second time.
    pub fn dispose(&self) -> Result<()> {
        self.registry.dispose(self.id)?;
        tracing::debug!("disposed index action");
        Ok(())
    }
}

impl Drop for IndexAction {
    fn drop(&mut self) {
        self.registry.dispose_on_drop(self.id);
    }
}

fn finish_run(path: &Path, code: c_int, aborted: bool) -> Result<VisitOutcome> {
    if aborted {
        return Ok(VisitOutcome::Terminated);
    }
    if let Some(code) = ErrorCode::from_raw(code) {
        return Err(Error::Indexing {
            path: path.display().to_string(),
            code,
        });
    }
    tracing::debug!(path = %path.display(), "indexing finished");
    Ok(VisitOutcome::Completed)
}

impl Index {
    /// Start an indexing session under this index.
    pub fn create_action(&self) -> Result<IndexAction> {
        IndexAction::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_enums() {
        assert_eq!(EntityKind::from_raw(2), Some(EntityKind::Function));
        assert_eq!(EntityKind::CxxClass.to_raw(), 16);
        assert_eq!(EntityRefKind::from_raw(1), Some(EntityRefKind::Direct));
        assert_eq!(EntityRefKind::from_raw(0), None);
        assert_eq!(EntityLanguage::from_raw(1), Some(EntityLanguage::C));
    }

    #[test]
    fn test_aborted_run_is_terminated() {
        let path = Path::new("main.c");
        assert_eq!(
            finish_run(path, 1, true).unwrap(),
            VisitOutcome::Terminated
        );
        assert_eq!(finish_run(path, 0, false).unwrap(), VisitOutcome::Completed);
        let err = finish_run(path, 3, false).unwrap_err();
        assert!(matches!(
            err,
            Error::Indexing {
                code: ErrorCode::InvalidArguments,
                ..
            }
        ));
    }

    #[test]
    fn test_default_callbacks_never_abort() {
        let mut recorder = IndexRecorder::default();
        assert!(!recorder.abort_query());
        recorder.declaration(DeclInfo {
            entity: None,
            cursor_kind: CursorKind::FUNCTION_DECL,
            location: IndexLocation::default(),
            semantic_container: String::new(),
            lexical_container: String::new(),
            is_redeclaration: false,
            is_definition: true,
            is_container: true,
            is_implicit: false,
        });
        assert_eq!(recorder.declarations.len(), 1);
    }
}
