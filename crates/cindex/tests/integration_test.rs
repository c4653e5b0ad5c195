//! Integration tests against a real libclang.

use cindex::{
    usr, CindexConfig, ChildVisit, CodeCompleteFlags, CompileCommands, CursorKind, CursorSet,
    Error, Index, IndexConfig, IndexOptions, IndexRecorder, IndexerCallbacks, LayoutError,
    LifecycleError, Severity, TokenKind, TranslationUnit, TranslationUnitFlags, UnsavedFile,
    VisitOutcome,
};
use std::path::Path;

fn parse(index: &Index, name: &str, source: &str) -> TranslationUnit {
    let file = UnsavedFile::new(name, source).expect("Failed to create unsaved file");
    index
        .parse(name, &[], &[file], TranslationUnitFlags::empty())
        .expect("Failed to parse")
}

fn new_index() -> Index {
    Index::new(&IndexConfig::default()).expect("Failed to create index")
}

/// Test parsing a file given only as an unsaved buffer.
#[test]
fn test_parse_main_from_unsaved() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return 0;}");

    let root = tu.cursor().expect("Failed to get cursor");
    assert_eq!(root.kind(), CursorKind::TRANSLATION_UNIT);
    assert_eq!(tu.spelling().unwrap(), "main.c");

    let children: Vec<_> = root
        .children()
        .unwrap()
        .into_iter()
        .filter(|c| c.is_from_main_file().unwrap())
        .collect();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].kind(), CursorKind::FUNCTION_DECL);
    assert_eq!(children[0].spelling().unwrap(), "main");
    assert!(children[0].is_definition().unwrap());

    let loc = children[0].location().unwrap().spelling().unwrap();
    assert_eq!((loc.line, loc.column), (1, 5));
    assert_eq!(loc.file.unwrap().name().unwrap(), "main.c");
}

/// Layout queries keep libclang's sentinels apart.
#[test]
fn test_layout_of_incomplete_struct() {
    let index = new_index();
    let tu = parse(&index, "main.c", "struct Opaque; struct Point { int x; int y; };");
    let decls = tu.cursor().unwrap().children().unwrap();

    let opaque = decls
        .iter()
        .find(|c| c.spelling().unwrap() == "Opaque")
        .expect("Opaque not found");
    let err = opaque.cursor_type().unwrap().size_of().unwrap_err();
    assert!(matches!(err, Error::Layout(LayoutError::Incomplete)));

    let point = decls
        .iter()
        .find(|c| c.spelling().unwrap() == "Point")
        .expect("Point not found");
    let ty = point.cursor_type().unwrap();
    assert_eq!(ty.size_of().unwrap(), 8);
    assert_eq!(ty.offset_of("y").unwrap(), 32);
    assert!(matches!(
        ty.offset_of("z").unwrap_err(),
        Error::Layout(LayoutError::InvalidFieldName)
    ));
    assert_eq!(ty.fields().unwrap().len(), 2);
}

/// Breaking out of a traversal stops it at once.
#[test]
fn test_visit_break_on_third_function() {
    let index = new_index();
    let tu = parse(
        &index,
        "main.c",
        "void a(void){} void b(void){} void c(void){} void d(void){} void e(void){}",
    );

    let mut seen = Vec::new();
    let outcome = tu
        .cursor()
        .unwrap()
        .visit_children(|cursor, _| {
            if !cursor.is_from_main_file().unwrap() {
                return ChildVisit::Continue;
            }
            seen.push(cursor.spelling().unwrap());
            if seen.len() == 3 {
                ChildVisit::Break
            } else {
                ChildVisit::Continue
            }
        })
        .unwrap();

    assert_eq!(outcome, VisitOutcome::Terminated);
    assert_eq!(seen, ["a", "b", "c"]);
}

/// Recursing reaches nested declarations.
#[test]
fn test_visit_recurse_into_struct() {
    let index = new_index();
    let tu = parse(&index, "main.c", "struct P { int x; int y; };");

    let mut fields = Vec::new();
    let outcome = tu
        .cursor()
        .unwrap()
        .visit_children(|cursor, parent| {
            if cursor.kind() == CursorKind::FIELD_DECL {
                assert_eq!(parent.spelling().unwrap(), "P");
                fields.push(cursor.spelling().unwrap());
            }
            ChildVisit::Recurse
        })
        .unwrap();

    assert_eq!(outcome, VisitOutcome::Completed);
    assert_eq!(fields, ["x", "y"]);
}

/// Diagnostics come back as owned records.
#[test]
fn test_diagnostic_records() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return y;}");

    assert!(tu.has_errors().unwrap());
    let records = tu.diagnostic_records().expect("Failed to get diagnostics");
    let first = records.first().expect("no diagnostics");
    assert_eq!(first.severity, Severity::Error);
    assert!(first.message.contains("undeclared identifier"));
    assert_eq!(first.line, 1);
    assert!(first.formatted.contains("main.c:1:"));

    let report = first.to_report(Some("int main(){return y;}"));
    assert_eq!(report.message, first.message);
}

/// Diagnostic sets are disposable handles.
#[test]
fn test_diagnostic_set_dispose() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return y;}");
    let set = tu.diagnostics().unwrap();
    let diag = set.get(0).unwrap();
    assert_eq!(diag.severity().unwrap(), Severity::Error);
    assert!(set.get(1000).is_err());

    set.dispose().unwrap();
    assert!(matches!(
        set.dispose().unwrap_err(),
        Error::Lifecycle(LifecycleError::DoubleDispose { .. })
    ));
}

/// Tokens of a declaration, and their annotations.
#[test]
fn test_tokenize_declaration() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int x = 42;");
    let decl = tu
        .cursor()
        .unwrap()
        .children()
        .unwrap()
        .into_iter()
        .find(|c| c.spelling().unwrap() == "x")
        .expect("x not found");

    let batch = tu.tokenize(&decl.extent().unwrap()).expect("Failed to tokenize");
    let tokens = batch.tokens().unwrap();
    let spellings: Vec<_> = tokens.iter().map(|t| t.spelling().unwrap()).collect();
    assert_eq!(&spellings[..4], ["int", "x", "=", "42"]);
    assert_eq!(tokens[0].kind().unwrap(), Some(TokenKind::Keyword));
    assert_eq!(tokens[1].kind().unwrap(), Some(TokenKind::Identifier));
    assert_eq!(tokens[3].kind().unwrap(), Some(TokenKind::Literal));

    let cursors = batch.annotate().unwrap();
    assert_eq!(cursors.len(), tokens.len());

    batch.dispose().unwrap();
    assert!(batch.tokens().is_err());
}

/// Member completion after `s.`.
#[test]
fn test_code_completion() {
    let source = "struct S { int alpha; int beta; };\nvoid f(struct S s) {\n  s.\n}\n";
    let index = new_index();
    let file = UnsavedFile::new("main.c", source).unwrap();
    let tu = index
        .parse("main.c", &[], std::slice::from_ref(&file), TranslationUnitFlags::empty())
        .unwrap();

    let results = tu
        .code_complete_at("main.c", 3, 5, &[file], CodeCompleteFlags::empty())
        .expect("Failed to complete");
    let names: Vec<_> = results
        .results
        .iter()
        .filter_map(|r| r.string.typed_text())
        .collect();
    assert!(names.contains(&"alpha"));
    assert!(names.contains(&"beta"));
}

/// Documentation comments are parsed into an owned tree.
#[test]
fn test_parsed_comment() {
    let index = new_index();
    let tu = parse(&index, "main.c", "/// Adds one.\nint inc(int x);");
    let inc = tu
        .cursor()
        .unwrap()
        .children()
        .unwrap()
        .into_iter()
        .find(|c| c.spelling().unwrap() == "inc")
        .expect("inc not found");

    assert_eq!(inc.brief_comment_text().unwrap(), "Adds one.");
    let comment = inc.parsed_comment().unwrap().expect("no comment");
    assert_eq!(comment.kind, cindex::CommentKind::FullComment);
    assert!(comment.plain_text().contains("Adds one."));
    assert!(inc.comment_xml().unwrap().unwrap().contains("inc"));
}

/// The indexer reports declarations and references.
#[test]
fn test_index_source_file() {
    let index = new_index();
    let action = index.create_action().expect("Failed to create action");
    let source = "int add(int a, int b) { return a + b; }\nint main(void) { return add(1, 2); }\n";
    let file = UnsavedFile::new("main.c", source).unwrap();

    let mut recorder = IndexRecorder::default();
    let outcome = action
        .index_source_file(
            &mut recorder,
            IndexOptions::empty(),
            "main.c",
            &[],
            &[file],
            TranslationUnitFlags::empty(),
        )
        .expect("Failed to index");

    assert_eq!(outcome, VisitOutcome::Completed);
    let names: Vec<_> = recorder
        .declarations
        .iter()
        .filter_map(|d| d.entity.as_ref().map(|e| e.name.as_str()))
        .collect();
    assert!(names.contains(&"add"));
    assert!(names.contains(&"main"));
    assert!(recorder
        .references
        .iter()
        .any(|r| r.referenced.as_ref().map(|e| e.name.as_str()) == Some("add")));

    action.dispose().unwrap();
    index.dispose().unwrap();
}

/// Cursor sets report whether a cursor was new.
#[test]
fn test_cursor_set() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int a; int b;");
    let decls = tu.cursor().unwrap().children().unwrap();
    let set = CursorSet::new().unwrap();

    assert!(set.insert(&decls[0]).unwrap());
    assert!(!set.insert(&decls[0]).unwrap());
    assert!(set.contains(&decls[0]).unwrap());
    assert!(!set.contains(&decls[1]).unwrap());
}

/// Resource usage reports are children of their unit.
#[test]
fn test_resource_usage() {
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return 0;}");
    let usage = tu.resource_usage().expect("Failed to get resource usage");

    let entries = usage.entries().unwrap();
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| !e.name.is_empty()));
    assert!(tu.dispose().is_err());

    usage.dispose().unwrap();
    tu.dispose().unwrap();
}

/// Saved AST files load back into an equivalent unit.
#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let ast = dir.path().join("main.ast");
    let index = new_index();
    let tu = parse(&index, "main.c", "int main(){return 0;}");
    tu.save(&ast).expect("Failed to save");

    let loaded = index.load_ast(&ast).expect("Failed to load");
    let names: Vec<_> = loaded
        .cursor()
        .unwrap()
        .children()
        .unwrap()
        .iter()
        .map(|c| c.spelling().unwrap())
        .collect();
    assert!(names.contains(&"main".to_string()));
}

/// Settings from cindex.toml drive parsing.
#[test]
fn test_parse_with_config() {
    let config = CindexConfig::from_str("[parse]\nlanguage = \"c\"\nstd = \"c99\"\n")
        .expect("Failed to load config");
    let index = Index::from_config(&config).unwrap();
    let settings = config.settings_for(Path::new("main.c"));
    let file = UnsavedFile::new("main.c", "int main(void){for(int i=0;i<1;i++);return 0;}").unwrap();

    let tu = index.parse_with(&settings, &[file]).expect("Failed to parse");
    assert!(!tu.has_errors().unwrap());
}

/// A compilation database supplies include paths and defines.
#[test]
fn test_parse_with_compile_commands() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::create_dir(dir.path().join("inc")).unwrap();
    std::fs::write(dir.path().join("inc/defs.h"), "#define DEFS 1\n").unwrap();
    let main = dir.path().join("main.c");
    std::fs::write(&main, "#include \"defs.h\"\nint value(void) { return VALUE + DEFS; }\n")
        .unwrap();
    let json = format!(
        r#"[{{"directory": "{}", "file": "main.c", "arguments": ["cc", "-Iinc", "-DVALUE=3", "-c", "main.c"]}}]"#,
        dir.path().display()
    );

    let commands = CompileCommands::from_str(&json).expect("Failed to parse database");
    let settings = commands.settings_for(&main).expect("Failed to find command");
    assert_eq!(settings.file, main);

    let index = new_index();
    let tu = index.parse_with(&settings, &[]).expect("Failed to parse");
    assert!(!tu.has_errors().unwrap());
}

/// Unknown flag names in configuration are rejected.
#[test]
fn test_parse_with_unknown_flag() {
    let config = CindexConfig::from_str("[parse]\nflags = [\"turbo\"]\n").unwrap();
    let index = new_index();
    let settings = config.settings_for(Path::new("main.c"));

    let err = index.parse_with(&settings, &[]).unwrap_err();
    assert!(matches!(err, Error::UnknownFlag(name) if name == "turbo"));
}

/// Tree snapshots survive the unit they were taken from.
#[test]
fn test_snapshot_outlives_unit() {
    let index = new_index();
    let tu = parse(&index, "main.c", "struct P { int x; }; int main(){return 0;}");
    let tree = tu.snapshot(true).unwrap();
    tu.dispose().unwrap();

    assert_eq!(tree.kind, CursorKind::TRANSLATION_UNIT);
    let p = tree.child("P").expect("P not found");
    assert_eq!(p.children[0].spelling, "x");
    assert_eq!(p.children[0].type_spelling, "int");
    assert_eq!(tree.find_all(CursorKind::FUNCTION_DECL).len(), 1);
}

/// Objective-C USRs, and class USRs passed back to libclang.
#[test]
fn test_objc_usrs() {
    let mut class = usr::objc_class("Foo").unwrap();
    assert_eq!(class.as_str().unwrap(), "c:objc(cs)Foo");

    let method = usr::objc_method("bar", true, &class).unwrap();
    assert_eq!(method.as_str().unwrap(), "c:objc(cs)Foo(im)bar");

    class.release();
    class.release();
    assert!(matches!(
        usr::objc_ivar("x", &class).unwrap_err(),
        Error::Lifecycle(LifecycleError::UseAfterDispose { .. })
    ));
}

#[test]
fn test_clang_version() {
    assert!(cindex::clang_version().contains("clang version"));
}

/// The three resolution modes differ only inside macro expansions.
#[test]
fn test_location_modes() {
    let index = new_index();
    let source = "#define ONE 1\nint x = ONE;\n#line 40 \"renamed.c\"\nint y;\n";
    let tu = parse(&index, "main.c", source);
    let decls = tu.cursor().unwrap().children().expect("Failed to get children");
    let x = decls
        .iter()
        .find(|c| c.spelling().unwrap() == "x")
        .expect("x not found");
    let y = decls
        .iter()
        .find(|c| c.spelling().unwrap() == "y")
        .expect("y not found");

    // A plain declaration resolves the same way in every mode.
    let at_x = x.location().unwrap();
    let expansion = at_x.expansion().unwrap();
    assert_eq!((expansion.line, expansion.column), (2, 5));
    assert_eq!(at_x.spelling().unwrap(), expansion);
    assert_eq!(at_x.file_location().unwrap(), expansion);
    assert_eq!(at_x.expansion().unwrap(), expansion);
    let name = expansion.file.as_ref().expect("x has no file").name().unwrap();
    assert_eq!(name, "main.c");

    let mut literal = None;
    x.visit_children(|c, _| {
        if c.kind() == CursorKind::INTEGER_LITERAL {
            literal = Some(c);
            return ChildVisit::Break;
        }
        ChildVisit::Recurse
    })
    .expect("Failed to visit");
    let at_literal = literal.expect("literal not found").location().unwrap();
    assert_eq!(at_literal.expansion().unwrap().line, 2);
    assert_eq!(at_literal.file_location().unwrap().line, 2);
    assert_eq!(at_literal.spelling().unwrap().line, 1);

    // Only the presumed location follows #line.
    let at_y = y.location().unwrap();
    let presumed = at_y.presumed().unwrap();
    assert_eq!(presumed.filename, "renamed.c");
    assert_eq!(presumed.line, 40);
    assert_eq!(at_y.presumed().unwrap(), presumed);
    assert_eq!(at_y.expansion().unwrap().line, 4);
    assert_eq!(x.location().unwrap().presumed().unwrap().filename, "main.c");
}

/// The inclusion visitor sees every file with its include stack.
#[test]
fn test_inclusions() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let main = dir.path().join("main.c");
    std::fs::write(dir.path().join("util.h"), "int util(void);\n").unwrap();
    std::fs::write(&main, "#include \"util.h\"\nint main(void) { return util(); }\n").unwrap();

    let index = new_index();
    let tu = index
        .parse(&main, &[], &[], TranslationUnitFlags::empty())
        .expect("Failed to parse");

    let mut seen = Vec::new();
    tu.inclusions(|file, stack| {
        let lines: Vec<u32> = stack.iter().map(|l| l.spelling().unwrap().line).collect();
        seen.push((file.name().unwrap(), lines));
    })
    .expect("Failed to visit inclusions");

    assert_eq!(seen.len(), 2);
    let (_, main_stack) = seen
        .iter()
        .find(|(name, _)| name.ends_with("main.c"))
        .expect("main.c not visited");
    assert!(main_stack.is_empty());
    let (_, util_stack) = seen
        .iter()
        .find(|(name, _)| name.ends_with("util.h"))
        .expect("util.h not visited");
    assert_eq!(util_stack, &vec![1]);
}

#[derive(Default)]
struct AbortImmediately {
    queries: usize,
}

impl IndexerCallbacks for AbortImmediately {
    fn abort_query(&mut self) -> bool {
        self.queries += 1;
        true
    }
}

/// Answering yes to the abort query ends indexing as terminated.
#[test]
fn test_index_abort_query() {
    let index = new_index();
    let action = index.create_action().expect("Failed to create action");
    let source = "int a(void);\nint b(void);\nint c(void) { return a() + b(); }\n";
    let file = UnsavedFile::new("main.c", source).unwrap();

    let mut callbacks = AbortImmediately::default();
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

    assert_eq!(outcome, VisitOutcome::Terminated);
    assert!(callbacks.queries >= 1);
    action.dispose().unwrap();
}
