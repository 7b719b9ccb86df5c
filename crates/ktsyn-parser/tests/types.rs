//! Type grammar through the type entry point and in declaration positions

use ktsyn_parser::{parse_file, parse_type, Parse, SyntaxKind, SyntaxNode};
use SyntaxKind::*;

fn messages(parse: &Parse) -> Vec<String> {
    parse.errors().iter().map(|e| e.message.clone()).collect()
}

fn count(root: &SyntaxNode, kind: SyntaxKind) -> usize {
    root.descendants().filter(|n| n.kind() == kind).count()
}

/// Kind of the outermost type element, skipping modifiers
fn element(source: &str) -> SyntaxKind {
    let parse = parse_type(source);
    assert!(parse.errors().is_empty(), "{source}: {:?}", parse.errors());
    assert_eq!(parse.syntax().text().to_string(), source);
    let root = parse.syntax();
    let type_ref = root.first_child().expect("TYPE_REFERENCE");
    type_ref
        .children()
        .find(|n| n.kind() != MODIFIER_LIST)
        .map(|n| n.kind())
        .expect("type element")
}

// =============================================================================
// TYPE ELEMENTS
// =============================================================================

#[test]
fn test_type_element_kinds() {
    let cases = [
        ("Int", USER_TYPE),
        ("kotlin.Int", USER_TYPE),
        ("Map<String, List<*>>", USER_TYPE),
        ("Int?", NULLABLE_TYPE),
        ("(Int)?", NULLABLE_TYPE),
        ("dynamic", DYNAMIC_TYPE),
        ("() -> Unit", FUNCTION_TYPE),
        ("(Int, b: String) -> Unit", FUNCTION_TYPE),
        ("Int.() -> Unit", FUNCTION_TYPE),
        ("suspend () -> Unit", FUNCTION_TYPE),
        ("fun (x: Int) -> Int", FUNCTION_TYPE),
        ("((Int) -> Unit)?", NULLABLE_TYPE),
        ("T & Any", INTERSECTION_TYPE),
    ];
    for (source, kind) in cases {
        assert_eq!(element(source), kind, "{source}");
    }
}

#[test]
fn test_function_type_returning_function_type() {
    let parse = parse_type("(Int) -> (String) -> Unit");
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    assert_eq!(count(&parse.syntax(), FUNCTION_TYPE), 2);
}

#[test]
fn test_projections() {
    let parse = parse_type("Pair<in A, out B>");
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    assert_eq!(count(&parse.syntax(), TYPE_PROJECTION), 2);
}

// =============================================================================
// ANNOTATIONS ON TYPES
// =============================================================================

#[test]
fn test_annotated_types() {
    assert_eq!(element("@Foo Int"), USER_TYPE);
    assert_eq!(element("@Foo (x) -> Unit"), FUNCTION_TYPE);
    assert_eq!(element("@Foo(1) Int"), USER_TYPE);

    let parse = parse_type("@Foo(1) Int");
    let root = parse.syntax();
    assert_eq!(count(&root, ANNOTATION_ENTRY), 1);
    assert_eq!(count(&root, VALUE_ARGUMENT_LIST), 1);
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_type_errors() {
    assert_eq!(messages(&parse_type("")), vec!["Type expected"]);
    assert_eq!(messages(&parse_type("List<Int")), vec!["Expecting a '>'"]);

    let parse = parse_type("Int Int");
    assert_eq!(messages(&parse), vec!["Unexpected symbol"]);
    assert_eq!(parse.errors()[0].range, 4..7);
}

// =============================================================================
// TYPES IN DECLARATIONS
// =============================================================================

#[test]
fn test_types_in_declarations() {
    let parse = parse_file(
        "val handler: suspend CoroutineScope.(Int) -> Unit = {}\nfun <T> id(x: T): T where T : Comparable<T> = x",
    );
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    let root = parse.syntax();
    assert_eq!(count(&root, FUNCTION_TYPE), 1);
    assert_eq!(count(&root, FUNCTION_TYPE_RECEIVER), 1);
    assert_eq!(count(&root, TYPE_CONSTRAINT), 1);
}
