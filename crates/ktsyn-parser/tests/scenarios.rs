//! End-to-end behaviour of the public entry points on small, known inputs
//!
//! Each test pins the tree shape and the diagnostics for one input that
//! exercises a distinct part of the grammar.

use ktsyn_parser::{
    parse_block, parse_expression, parse_file, parse_script, parse_type, Parse, SyntaxKind, SyntaxNode,
};
use SyntaxKind::*;

fn messages(parse: &Parse) -> Vec<String> {
    parse.errors().iter().map(|e| e.message.clone()).collect()
}

fn nodes(root: &SyntaxNode, kind: SyntaxKind) -> Vec<SyntaxNode> {
    root.descendants().filter(|n| n.kind() == kind).collect()
}

fn type_element(parse: &Parse) -> SyntaxKind {
    let root = parse.syntax();
    let type_ref = root.first_child().expect("type fragment has a TYPE_REFERENCE");
    assert_eq!(type_ref.kind(), TYPE_REFERENCE);
    type_ref
        .children()
        .find(|n| n.kind() != MODIFIER_LIST)
        .map(|n| n.kind())
        .expect("type reference has an element")
}

// =============================================================================
// DECLARATIONS
// =============================================================================

#[test]
fn test_bare_class_keyword_terminates_with_empty_body() {
    let parse = parse_file("class");
    assert_eq!(messages(&parse), vec!["Name expected"]);

    let root = parse.syntax();
    assert_eq!(root.text().to_string(), "class");
    let class = &nodes(&root, CLASS)[0];
    let body = class
        .children()
        .find(|n| n.kind() == CLASS_BODY)
        .expect("synthesized class body");
    assert_eq!(body.text().to_string(), "");
    assert_eq!(u32::from(body.text_range().start()), 5);
}

#[test]
fn test_top_level_destructuring_declaration() {
    let parse = parse_file("val (a, b) = p");
    assert_eq!(
        messages(&parse),
        vec!["Destructuring declarations are only allowed for local variables/values"]
    );
    let root = parse.syntax();
    assert_eq!(nodes(&root, DESTRUCTURING_DECLARATION).len(), 1);
    assert_eq!(nodes(&root, DESTRUCTURING_DECLARATION_ENTRY).len(), 2);
}

#[test]
fn test_local_destructuring_declaration_is_fine() {
    let parse = parse_block("val (a, b) = p\na + b");
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    assert_eq!(nodes(&parse.syntax(), DESTRUCTURING_DECLARATION).len(), 1);

    let parse = parse_script("val (a, b) = p");
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
}

// =============================================================================
// TYPES
// =============================================================================

#[test]
fn test_fun_keyword_function_type() {
    let parse = parse_type("fun (x: Int) -> Int");
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    assert_eq!(type_element(&parse), FUNCTION_TYPE);
}

#[test]
fn test_annotated_function_type_rolls_back() {
    let parse = parse_type("@Foo (x) -> Unit");
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    assert_eq!(type_element(&parse), FUNCTION_TYPE);

    let root = parse.syntax();
    let entries = nodes(&root, ANNOTATION_ENTRY);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text().to_string(), "@Foo");
    // `(x)` must not have been taken as the annotation's arguments
    assert!(nodes(&root, VALUE_ARGUMENT_LIST).is_empty());
}

// =============================================================================
// COMMENTS
// =============================================================================

#[test]
fn test_unclosed_comment_reported_once() {
    for source in ["/* never closed", "class A /* open", "/** doc", "fun f() {} /* a /* b */"] {
        let parse = parse_file(source);
        assert_eq!(messages(&parse), vec!["Unclosed comment"], "{source}");
        assert_eq!(parse.syntax().text().to_string(), source);
    }
}

#[test]
fn test_unclosed_comment_in_every_fragment() {
    assert_eq!(messages(&parse_type("Int /* x")), vec!["Unclosed comment"]);
    assert_eq!(messages(&parse_expression("a /* x")), vec!["Unclosed comment"]);
    assert_eq!(messages(&parse_block("a /* x")), vec!["Unclosed comment"]);
    assert_eq!(messages(&parse_script("a /* x")), vec!["Unclosed comment"]);
}

#[test]
fn test_closed_comments_are_silent() {
    let parse = parse_file("/* a /* nested */ still */ class A /** doc */");
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
}
