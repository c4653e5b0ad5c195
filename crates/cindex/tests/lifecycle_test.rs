//! Handle lifecycle tests: disposal, staleness and teardown.

use cindex::{
    ChildVisit, Cursor, CursorKind, DeclInfo, DiagnosticSet, Error, File, Index, IndexAction,
    IndexConfig, IndexOptions, IndexerCallbacks, LifecycleError, TranslationUnit,
    TranslationUnitFlags, UnsavedFile, VisitOutcome,
};
use std::process::Command;

fn parse(index: &Index, name: &str, source: &str) -> TranslationUnit {
    let file = UnsavedFile::new(name, source).expect("Failed to create unsaved file");
    index
        .parse(name, &[], &[file], TranslationUnitFlags::empty())
        .expect("Failed to parse")
}

fn new_index() -> Index {
    Index::new(&IndexConfig::default()).expect("Failed to create index")
}

/// Disposing a translation unit twice is reported, not a crash.
#[test]
fn test_double_dispose_translation_unit() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return 0;}");

    tu.dispose().expect("first dispose");
    let err = tu.dispose().unwrap_err();
    assert!(matches!(
        err,
        Error::Lifecycle(LifecycleError::DoubleDispose { .. })
    ));
    assert!(!tu.is_live());

    index.dispose().expect("Failed to dispose index");
}

/// Queries on a disposed translation unit fail with UseAfterDispose.
#[test]
fn test_use_after_dispose() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return 0;}");
    let root = tu.cursor().expect("Failed to get cursor");

    tu.dispose().expect("Failed to dispose");
    assert!(matches!(
        tu.cursor().unwrap_err(),
        Error::Lifecycle(LifecycleError::UseAfterDispose { .. })
    ));
    assert!(root.spelling().is_err());
    // Kind never touches the unit.
    assert_eq!(root.kind(), CursorKind::TRANSLATION_UNIT);
}

/// An index with a live translation unit can't be disposed.
#[test]
fn test_index_dispose_with_live_children() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return 0;}");

    let err = index.dispose().unwrap_err();
    assert!(matches!(
        err,
        Error::Lifecycle(LifecycleError::ChildrenStillLive { live: 1, .. })
    ));
    assert!(index.is_live());

    tu.dispose().expect("Failed to dispose translation unit");
    index.dispose().expect("Failed to dispose index");
}

/// A diagnostic set keeps its translation unit from being disposed.
#[test]
fn test_translation_unit_with_live_diagnostic_set() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return y;}");
    let diagnostics = tu.diagnostics().expect("Failed to get diagnostics");

    assert!(matches!(
        tu.dispose().unwrap_err(),
        Error::Lifecycle(LifecycleError::ChildrenStillLive { .. })
    ));

    diagnostics.dispose().expect("Failed to dispose diagnostics");
    tu.dispose().expect("Failed to dispose translation unit");
}

/// Cursors taken before a reparse are stale afterwards.
#[test]
fn test_cursor_stale_after_reparse() {
    let index = new_index();
    let source = "int main(){return 0;}";
    let tu = parse(&index, "main.c", source);
    let root = tu.cursor().expect("Failed to get cursor");
    let main = root.children().expect("Failed to get children")
        .into_iter()
        .find(|c| c.spelling().unwrap_or_default() == "main")
        .expect("main not found");

    let file = UnsavedFile::new("main.c", source).unwrap();
    tu.reparse(&[file]).expect("Failed to reparse");

    let err = main.spelling().unwrap_err();
    assert!(matches!(
        err,
        Error::Lifecycle(LifecycleError::StaleHandle {
            held: 0,
            current: 1,
            ..
        })
    ));

    // Fresh cursors work.
    let root = tu.cursor().expect("Failed to get cursor");
    assert!(root.children().unwrap().iter().any(|c| c.spelling().unwrap() == "main"));
}

/// Diagnostic sets taken from a unit go stale on reparse too.
#[test]
fn test_diagnostic_set_stale_after_reparse() {
    let index = new_index();
    let source = "int main(){return y;}";
    let tu = parse(&index, "main.c", source);
    let diagnostics = tu.diagnostics().expect("Failed to get diagnostics");
    assert!(diagnostics.len().unwrap() >= 1);

    let file = UnsavedFile::new("main.c", source).unwrap();
    tu.reparse(&[file]).expect("Failed to reparse");

    assert!(matches!(
        diagnostics.len().unwrap_err(),
        Error::Lifecycle(LifecycleError::StaleHandle { .. })
    ));
    diagnostics.dispose().expect("stale sets can still be disposed");
}

/// The null cursor answers with empty results instead of failing.
#[test]
fn test_null_cursor_is_fail_soft() {
    let null = Cursor::null();
    assert!(null.is_null());
    assert!(null.kind().is_invalid());
    assert_eq!(null.spelling().unwrap(), "");
    assert_eq!(null.usr().unwrap(), "");

    let ty = null.cursor_type().unwrap();
    assert!(!ty.is_valid());
    assert_eq!(ty.spelling().unwrap(), "");
    assert!(null.semantic_parent().unwrap().is_null());
}

/// A panicking visitor stops the traversal and the panic reaches the caller.
#[test]
fn test_visitor_panic_is_resumed() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int a; int b; int c;");
    let root = tu.cursor().unwrap();

    let mut calls = 0;
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        root.visit_children(|_, _| {
            calls += 1;
            panic!("visitor failed");
        })
    }));
    assert!(result.is_err());
    assert_eq!(calls, 1);

    // The unit is still usable afterwards.
    assert!(!root.children().unwrap().is_empty());
}

/// Dropping the index first defers its release until its units are gone.
#[test]
fn test_drop_index_before_translation_unit() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return 0;}");

    drop(index);
    let root = tu.cursor().expect("translation unit outlives its index handle");
    let outcome = root.visit_children(|_, _| ChildVisit::Continue).unwrap();
    assert!(!outcome.is_terminated());
}

fn main_file(tu: &TranslationUnit) -> File {
    let decl = tu.cursor().unwrap().children().unwrap().remove(0);
    decl.location()
        .and_then(|l| l.expansion())
        .expect("Failed to resolve location")
        .file
        .expect("declaration has no file")
}

/// A unit can't be disposed, reparsed or suspended while it is being visited.
#[test]
fn test_dispose_and_reparse_inside_visitor() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int a; int b;");
    let root = tu.cursor().expect("Failed to get cursor");

    let mut errors = Vec::new();
    let outcome = root
        .visit_children(|_, _| {
            errors.push(tu.dispose().unwrap_err());
            errors.push(tu.reparse(&[]).unwrap_err());
            errors.push(tu.suspend().unwrap_err());
            ChildVisit::Break
        })
        .expect("Failed to visit");

    assert!(outcome.is_terminated());
    assert_eq!(errors.len(), 3);
    assert!(errors
        .iter()
        .all(|e| matches!(e, Error::Lifecycle(LifecycleError::InUse { .. }))));

    // Nothing happened to the unit, and it is released once the visit is over.
    assert!(tu.is_live());
    assert!(!tu.is_poisoned());
    assert_eq!(root.children().unwrap().len(), 2);
    tu.dispose().expect("Failed to dispose after the visit");
}

struct DisposeOnDeclaration<'a> {
    action: &'a IndexAction,
    result: Option<cindex::Result<()>>,
}

impl IndexerCallbacks for DisposeOnDeclaration<'_> {
    fn declaration(&mut self, _info: DeclInfo) {
        if self.result.is_none() {
            self.result = Some(self.action.dispose());
        }
    }
}

/// An index action can't be disposed from inside its own callbacks.
#[test]
fn test_dispose_action_inside_callback() {
    let index = new_index();
    let action = index.create_action().expect("Failed to create action");
    let file = UnsavedFile::new("main.c", "int a; int b;").unwrap();

    let mut callbacks = DisposeOnDeclaration {
        action: &action,
        result: None,
    };
    let outcome = action
        .index_source_file(
            &mut callbacks,
            IndexOptions::empty(),
            "main.c",
            &[],
            &[file],
            TranslationUnitFlags::empty(),
        )
        .expect("Failed to index");

    assert_eq!(outcome, VisitOutcome::Completed);
    assert!(matches!(
        callbacks.result,
        Some(Err(Error::Lifecycle(LifecycleError::InUse { .. })))
    ));
    assert!(action.is_live());
    action.dispose().expect("Failed to dispose action");
}

/// A failed reparse poisons the unit; it can only be disposed afterwards.
#[test]
fn test_failed_reparse_poisons_unit() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let ast = dir.path().join("main.ast");
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return 0;}");
    tu.save(&ast).expect("Failed to save");
    tu.dispose().unwrap();

    // A unit loaded from an AST file has no invocation to reparse with.
    let loaded = index.load_ast(&ast).expect("Failed to load");
    let root = loaded.cursor().expect("Failed to get cursor");
    assert!(matches!(
        loaded.reparse(&[]).unwrap_err(),
        Error::ReparseFailed { .. }
    ));

    assert!(loaded.is_poisoned());
    assert!(matches!(
        loaded.cursor().unwrap_err(),
        Error::Lifecycle(LifecycleError::Poisoned { .. })
    ));
    assert!(root.spelling().is_err());
    loaded.dispose().expect("poisoned units can still be disposed");
    index.dispose().expect("Failed to dispose index");
}

/// File comparison never calls into a disposed unit.
#[test]
fn test_file_comparison_after_dispose() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int a;");
    let other_tu = parse(&index, "other.c", "int b;");
    let file = main_file(&tu);
    let copy = file.clone();
    let other = main_file(&other_tu);

    assert!(file.same_as(&copy).unwrap());
    assert!(!file.same_as(&other).unwrap());

    tu.dispose().expect("Failed to dispose");
    assert!(matches!(
        file.same_as(&other).unwrap_err(),
        Error::Lifecycle(LifecycleError::UseAfterDispose { .. })
    ));
    assert!(file == copy);
    assert!(file != other);

    other_tu.dispose().unwrap();
}

/// Locations from a loaded diagnostic set die with the set.
#[test]
fn test_loaded_diagnostic_location_after_dispose() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("main.c");
    let serialized = dir.path().join("main.dia");
    std::fs::write(&source, "int main(){return y;}\n").expect("Failed to write source");

    // Serialized diagnostics come from the clang driver; skip without one.
    let status = Command::new("clang")
        .arg("-fsyntax-only")
        .arg("--serialize-diagnostics")
        .arg(&serialized)
        .arg(&source)
        .status();
    if status.is_err() || !serialized.exists() {
        eprintln!("clang not available, skipping");
        return;
    }

    let set = DiagnosticSet::load(&serialized).expect("Failed to load diagnostics");
    assert!(set.len().unwrap() >= 1);
    let location = set
        .get(0)
        .and_then(|d| d.location())
        .expect("Failed to get location");
    assert_eq!(location.spelling().unwrap().line, 1);

    set.dispose().expect("Failed to dispose diagnostics");
    assert!(matches!(
        location.spelling().unwrap_err(),
        Error::Lifecycle(LifecycleError::UseAfterDispose { .. })
    ));
    assert!(location.presumed().is_err());
}
