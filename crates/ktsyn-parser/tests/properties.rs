//! Whole-parser properties checked over generated token soup

use ktsyn_parser::parser::Parser;
use ktsyn_parser::token_set::TokenSet;
use ktsyn_parser::{parse_with, DefaultExpressions, EntryPoint, ParseOptions, SyntaxKind};
use proptest::prelude::*;
use SyntaxKind::*;

const FRAGMENTS: &[&str] = &[
    "class", "interface", "object", "fun", "val", "var", "typealias", "enum", "data", "get", "set",
    "by", "where", "init", "constructor", "companion", "private", "override", "suspend", "if",
    "else", "when", "try", "catch", "finally", "for", "while", "do", "return", "break", "this",
    "super", "in", "is", "as", "as?", "x", "Foo", "`when`", "1", "2.5", "'c'", "\"s\"",
    "\"${a}\"", "\"open", "(", ")", "{", "}", "[", "]", "<", ">", ",", ".", "?.", "?:", "::", ":",
    ";", "=", "==", "->", "+", "-", "*", "!!", "!", "?", "@", "@Ann", "&", "&&", "||", "..", "_",
    "\n", "\n\n", " ", "// c\n", "/* b */", "/** d */", "#",
];

/// Up to 40 fragments, some followed by a space
fn soup_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec((prop::sample::select(FRAGMENTS), any::<bool>()), 0..40).prop_map(|parts| {
        let mut text = String::new();
        for (fragment, space) in parts {
            text.push_str(fragment);
            if space {
                text.push(' ');
            }
        }
        text
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn test_tree_covers_input_for_every_entry_point(source in soup_strategy()) {
        for entry in EntryPoint::ALL {
            let parse = parse_with(&source, entry, &ParseOptions::default());
            let root = parse.syntax();
            prop_assert_eq!(root.text().to_string(), source.clone(), "{}", entry);
            prop_assert_eq!(u32::from(root.text_range().start()), 0);
        }
    }

    #[test]
    fn test_diagnostics_are_in_bounds_and_ordered(source in soup_strategy()) {
        for entry in EntryPoint::ALL {
            let parse = parse_with(&source, entry, &ParseOptions::default());
            let mut last_start = 0;
            for error in parse.errors() {
                prop_assert!(error.range.start <= error.range.end, "{:?}", error);
                prop_assert!(error.range.end <= source.len(), "{:?}", error);
                prop_assert!(error.range.start >= last_start, "unordered {:?}", error);
                last_start = error.range.start;
            }
        }
    }

    #[test]
    fn test_error_nodes_are_never_empty(source in soup_strategy()) {
        for entry in EntryPoint::ALL {
            let parse = parse_with(&source, entry, &ParseOptions::default());
            for node in parse.syntax().descendants().filter(|n| n.kind() == ERROR) {
                prop_assert!(!node.text_range().is_empty(), "{}: {:?}", entry, node);
            }
        }
    }

    #[test]
    fn test_error_until_stops_at_braces_or_end(source in soup_strategy()) {
        let exprs = DefaultExpressions;
        let mut p = Parser::new(&source, &exprs);
        p.error_until("skipped", TokenSet::EMPTY);
        prop_assert!(
            p.at_eof() || p.current() == LBRACE || p.current() == RBRACE,
            "stopped at {:?}",
            p.current()
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_parsing_is_deterministic(source in soup_strategy()) {
        let first = parse_with(&source, EntryPoint::File, &ParseOptions::default());
        let second = parse_with(&source, EntryPoint::File, &ParseOptions::default());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_collapsed_blocks_keep_text(source in soup_strategy()) {
        let options = ParseOptions {
            collapse_blocks: true,
            ..ParseOptions::default()
        };
        let parse = parse_with(&source, EntryPoint::File, &options);
        prop_assert_eq!(parse.syntax().text().to_string(), source);
    }
}

// =============================================================================
// PARSER STATE
// =============================================================================

#[test]
fn test_rollback_restores_cursor_and_remaps() {
    let exprs = DefaultExpressions;
    let mut p = Parser::new("get set by x", &exprs);
    let before_tokens = p.tokens().to_vec();
    let before_position = p.raw_position();

    let m = p.start();
    assert!(p.at(GET_KW));
    p.bump();
    assert!(p.at(SET_KW));
    p.bump();
    p.disable_newlines();
    assert!(p.at(BY_KW));
    p.bump();
    m.rollback(&mut p);

    assert_eq!(p.raw_position(), before_position);
    assert_eq!(p.tokens(), &before_tokens[..]);
    assert_eq!(p.current(), IDENTIFIER);
    assert_eq!(p.current_text(), "get");
    assert!(p.modes().newlines_enabled());
}

#[test]
fn test_soft_keyword_round_trip() {
    let exprs = DefaultExpressions;
    let mut p = Parser::new("constructor", &exprs);
    assert!(p.at(CONSTRUCTOR_KW));
    assert_eq!(p.current(), CONSTRUCTOR_KW);
    assert!(p.at(IDENTIFIER));
    assert_eq!(p.current(), IDENTIFIER);
    assert_eq!(p.tokens()[0].original, IDENTIFIER);
}

#[test]
fn test_soft_keywords_as_names() {
    let source = "class data(val get: Int) {\n    fun set(value: Int) = value\n    val by = get\n}";
    let parse = parse_with(source, EntryPoint::File, &ParseOptions::default());
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    assert_eq!(parse.syntax().text().to_string(), source);
}

#[test]
fn test_error_until_stops_at_braces() {
    let exprs = DefaultExpressions;
    for (source, stop) in [("a b } c", RBRACE), ("a b { c", LBRACE), ("a ; b", SEMICOLON)] {
        let mut p = Parser::new(source, &exprs);
        p.error_until("skipped", TokenSet::new(&[SEMICOLON]));
        assert_eq!(p.current(), stop, "{source}");
    }
}
