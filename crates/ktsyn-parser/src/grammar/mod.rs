//! Grammar productions
//!
//! Every production is a method on [`Parser`]: it reads tokens through the
//! cursor and shapes the tree through markers. Declarations, types, modifiers
//! and the file preamble live in this module tree. Expressions and statements
//! are reached through the [`ExpressionGrammar`] trait so that a different
//! expression grammar can be plugged in without touching the declarations.

mod declarations;
mod expressions;
mod modifiers;
mod parameters;
mod preamble;
mod types;

pub use declarations::{DeclarationMode, NameMode};
pub use expressions::DefaultExpressions;
pub use modifiers::{AnnotationMode, ModifierDetector};

use crate::parser::{CompletedMarker, LeadingTrivia, Marker, Parser, TrailingTrivia};
use crate::syntax::SyntaxKind::{self, *};

/// The expression and statement sub-grammar the declaration grammar calls into
pub trait ExpressionGrammar {
    /// One expression; reports "Expecting an expression" when none starts here
    fn expression(&self, p: &mut Parser<'_>);

    /// Statements up to a `}` or the end of input
    fn statements(&self, p: &mut Parser<'_>, script_top_level: bool);

    /// A `{ params -> body }` literal at the current `{`. With `prefer_block`,
    /// a literal without parameters becomes a plain BLOCK.
    fn function_literal(&self, p: &mut Parser<'_>, prefer_block: bool, collapse: bool);

    /// `( arg, name = arg, *spread )`
    fn value_argument_list(&self, p: &mut Parser<'_>);

    /// `contract [ effect, ... ]` at the current `contract`
    fn contract_description(&self, p: &mut Parser<'_>);

    /// Whether a label definition (`name@`) or a stray `@` starts here
    fn at_label_definition(&self, p: &mut Parser<'_>) -> bool;

    fn label_definition(&self, p: &mut Parser<'_>);
}

impl<'t> Parser<'t> {
    // === Expression seam ===

    pub(crate) fn expression(&mut self) {
        let exprs = self.expressions();
        exprs.expression(self);
    }

    pub(crate) fn statements(&mut self, script_top_level: bool) {
        let exprs = self.expressions();
        exprs.statements(self, script_top_level);
    }

    pub(crate) fn function_literal(&mut self, prefer_block: bool, collapse: bool) {
        let exprs = self.expressions();
        exprs.function_literal(self, prefer_block, collapse);
    }

    pub(crate) fn value_argument_list(&mut self) {
        let exprs = self.expressions();
        exprs.value_argument_list(self);
    }

    pub(crate) fn contract_description(&mut self) {
        let exprs = self.expressions();
        exprs.contract_description(self);
    }

    pub(crate) fn at_label_definition(&mut self) -> bool {
        let exprs = self.expressions();
        exprs.at_label_definition(self)
    }

    pub(crate) fn label_definition(&mut self) {
        let exprs = self.expressions();
        exprs.label_definition(self);
    }

    // === Shared helpers ===

    /// Commit a declaration so it owns its comments: preceding comments (or
    /// only doc comments) and comments trailing on its last line
    pub(crate) fn close_declaration(
        &mut self,
        m: Marker,
        kind: SyntaxKind,
        preceding_comments: bool,
    ) -> CompletedMarker {
        let leading = if preceding_comments {
            LeadingTrivia::Comments
        } else {
            LeadingTrivia::DocComment
        };
        m.commit_with(self, kind, leading, TrailingTrivia::SameLineComments)
    }

    pub(crate) fn done_or_drop(&mut self, m: Marker, kind: SyntaxKind, condition: bool) {
        if condition {
            m.commit(self, kind);
        } else {
            m.drop(self);
        }
    }

    /// End of a logical line: a line break before the current token, or end of input
    pub(crate) fn eol(&self) -> bool {
        self.newline_before_current() || self.at_eof()
    }

    fn check_for_unexpected_symbols(&mut self) {
        while !self.at_eof() {
            self.error_and_advance("Unexpected symbol", 1);
        }
    }

    // === Entry productions ===

    /// FILE: preamble, then top-level declarations
    pub(crate) fn parse_file(&mut self) {
        let file = self.start();
        self.parse_preamble();
        while !self.at_eof() {
            self.parse_top_level_declaration();
        }
        self.check_unclosed_comment();
        file.commit(self, FILE);
    }

    /// FILE > SCRIPT > BLOCK: preamble, then statements at script top level
    pub(crate) fn parse_script(&mut self) {
        let file = self.start();
        self.parse_preamble();

        let script = self.start();
        let block = self.start();
        self.statements(true);
        self.check_for_unexpected_symbols();
        self.check_unclosed_comment();
        block.commit_with(self, BLOCK, LeadingTrivia::All, TrailingTrivia::All);
        script.commit_with(self, SCRIPT, LeadingTrivia::All, TrailingTrivia::All);

        file.commit(self, FILE);
    }

    pub(crate) fn parse_type_code_fragment(&mut self) {
        let fragment = self.start();
        self.parse_type_ref();
        self.check_for_unexpected_symbols();
        self.check_unclosed_comment();
        fragment.commit(self, TYPE_CODE_FRAGMENT);
    }

    pub(crate) fn parse_expression_code_fragment(&mut self) {
        let fragment = self.start();
        self.expression();
        self.check_for_unexpected_symbols();
        self.check_unclosed_comment();
        fragment.commit(self, EXPRESSION_CODE_FRAGMENT);
    }

    pub(crate) fn parse_block_code_fragment(&mut self) {
        let fragment = self.start();
        let block = self.start();

        if self.at(PACKAGE_KW) || self.at(IMPORT_KW) {
            let err = self.start();
            self.parse_preamble();
            err.error(self, "Package directive and imports are forbidden in code fragments");
        }

        self.statements(false);
        self.check_for_unexpected_symbols();
        self.check_unclosed_comment();

        block.commit(self, BLOCK);
        fragment.commit(self, BLOCK_CODE_FRAGMENT);
    }

    /// A lambda literal, rooted in an expression fragment
    pub(crate) fn parse_lambda_code_fragment(&mut self) {
        let fragment = self.start();
        if self.at(LBRACE) {
            self.function_literal(false, false);
        } else {
            self.error("Expecting '{' to open a lambda");
        }
        self.check_for_unexpected_symbols();
        self.check_unclosed_comment();
        fragment.commit(self, EXPRESSION_CODE_FRAGMENT);
    }
}
