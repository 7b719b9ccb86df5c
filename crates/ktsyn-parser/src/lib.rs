//! ktsyn - an error-tolerant concrete syntax tree parser for Kotlin source
//!
//! This crate handles:
//! - Lexical analysis with trivia (whitespace and comments are kept)
//! - Recursive-descent parsing into a lossless rowan tree
//! - Error recovery: every input yields a tree, problems become diagnostics
//!
//! ```
//! use ktsyn_parser::{parse_file, SyntaxKind};
//!
//! let parse = parse_file("class A");
//! assert!(parse.errors().is_empty());
//! assert_eq!(parse.syntax().kind(), SyntaxKind::FILE);
//! assert_eq!(parse.syntax().text().to_string(), "class A");
//! ```

pub mod error;
pub mod grammar;
pub mod lexer;
pub mod options;
pub mod parser;
mod sink;
pub mod span;
pub mod syntax;
pub mod token_set;

pub use error::{KtsynError, ParseError, ParseErrorKind, Result};
pub use grammar::{DefaultExpressions, ExpressionGrammar};
pub use lexer::Lexer;
pub use options::{EntryPoint, ParseOptions};
pub use parser::Parser;
pub use span::{LineIndex, SourceSpan};
pub use syntax::{KtLanguage, SyntaxKind, SyntaxNode, SyntaxNodeExt, SyntaxToken};

use rowan::GreenNode;
use tracing::debug;

/// The result of parsing: a lossless green tree plus diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    pub(crate) fn new(green: GreenNode, errors: Vec<ParseError>) -> Self {
        Self { green, errors }
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// A fresh red root over the green tree
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Diagnostics, ordered by start offset
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Indented dump of every node and token, for tests and the CLI
    pub fn debug_tree(&self) -> String {
        format!("{:#?}", self.syntax())
    }
}

/// Parse a source file: preamble, then top-level declarations
pub fn parse_file(source: &str) -> Parse {
    parse_with(source, EntryPoint::File, &ParseOptions::default())
}

/// Parse a script: preamble, then statements
pub fn parse_script(source: &str) -> Parse {
    parse_with(source, EntryPoint::Script, &ParseOptions::default())
}

/// Parse a single type reference
pub fn parse_type(source: &str) -> Parse {
    parse_with(source, EntryPoint::Type, &ParseOptions::default())
}

/// Parse a single expression
pub fn parse_expression(source: &str) -> Parse {
    parse_with(source, EntryPoint::Expression, &ParseOptions::default())
}

/// Parse a block of statements without surrounding braces
pub fn parse_block(source: &str) -> Parse {
    parse_with(source, EntryPoint::Block, &ParseOptions::default())
}

/// Parse a lambda literal `{ params -> body }`
pub fn parse_lambda(source: &str) -> Parse {
    parse_with(source, EntryPoint::Lambda, &ParseOptions::default())
}

/// Parse `source` as `entry`. `options.entry` is ignored in favour of `entry`.
pub fn parse_with(source: &str, entry: EntryPoint, options: &ParseOptions) -> Parse {
    let exprs = DefaultExpressions;
    let mut p = Parser::new(source, &exprs);
    p.set_collapse_blocks(options.collapse_blocks);

    match entry {
        EntryPoint::File => p.parse_file(),
        EntryPoint::Script => p.parse_script(),
        EntryPoint::Type => p.parse_type_code_fragment(),
        EntryPoint::Expression => p.parse_expression_code_fragment(),
        EntryPoint::Block => p.parse_block_code_fragment(),
        EntryPoint::Lambda => p.parse_lambda_code_fragment(),
    }

    let token_count = p.tokens().len();
    let mut parse = p.into_parse();
    if let Some(max) = options.max_errors {
        parse.errors.truncate(max);
    }

    debug!(
        entry = %entry,
        tokens = token_count,
        errors = parse.errors.len(),
        "parsed {} bytes",
        source.len()
    );
    parse
}
